mod filter;
mod remote;
mod snapshot;
mod source;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::ExecutionGraph;

pub use filter::{filter_runs, RunFilter};
#[cfg(test)]
pub use snapshot::Snapshot;
pub use source::{HistorySource, RemoteOptions};

/// Final outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

/// A named build definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// One execution of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub number: u32,
    /// Set by the store; runs are always read through their job
    #[serde(skip)]
    pub job_name: String,
    #[serde(default)]
    pub building: bool,
    pub start_time: DateTime<Utc>,
    /// Absent while building
    #[serde(default)]
    pub duration_millis: Option<u64>,
    /// Absent while building
    #[serde(default)]
    pub result: Option<RunResult>,
    #[serde(default)]
    execution: Option<ExecutionGraph>,
    #[serde(default)]
    log: Option<String>,
}

#[cfg(test)]
impl Run {
    pub fn new(number: u32, start_time: DateTime<Utc>) -> Self {
        Self {
            number,
            job_name: String::new(),
            building: false,
            start_time,
            duration_millis: None,
            result: None,
            execution: None,
            log: None,
        }
    }

    pub fn finished(mut self, result: RunResult, duration_millis: u64) -> Self {
        self.building = false;
        self.result = Some(result);
        self.duration_millis = Some(duration_millis);
        self
    }

    pub fn in_progress(mut self) -> Self {
        self.building = true;
        self.result = None;
        self.duration_millis = None;
        self
    }

    pub fn with_execution(mut self, graph: ExecutionGraph) -> Self {
        self.execution = Some(graph);
        self
    }

    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }
}

/// Backward-linked build chronology of each job.
pub trait Chronology {
    fn job(&self, name: &str) -> Option<&Job>;

    fn most_recent_run(&self, job: &Job) -> Option<&Run>;

    fn previous_run(&self, run: &Run) -> Option<&Run>;

    /// Finds a run by number by walking the chronology backward.
    fn run(&self, job: &Job, number: u32) -> Option<&Run> {
        let mut cursor = self.most_recent_run(job);
        while let Some(run) = cursor {
            if run.number == number {
                return Some(run);
            }
            cursor = self.previous_run(run);
        }
        None
    }
}

/// Access to the execution graph recorded for a run.
pub trait GraphSource {
    fn execution_graph<'r>(&self, run: &'r Run) -> Option<&'r ExecutionGraph>;
}

/// Access to a run's console output.
pub trait LogSource {
    /// Returns at most `max_lines` lines, oldest first.
    fn log_lines(&self, run: &Run, max_lines: usize) -> Vec<String>;
}

/// Everything the record builders read from.
pub trait HistoryStore: Chronology + GraphSource + LogSource {}

impl<T: Chronology + GraphSource + LogSource + ?Sized> HistoryStore for T {}
