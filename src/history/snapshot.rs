use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

use super::{Chronology, GraphSource, Job, LogSource, Run};
use crate::error::{Result, StageLensError};
use crate::graph::ExecutionGraph;

/// Serialization format of a history export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
    Toml,
}

impl SnapshotFormat {
    /// Guesses the format from a file name or URL path.
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct SnapshotExport {
    #[serde(default)]
    jobs: Vec<Job>,
}

/// In-memory job history loaded from an export.
///
/// Runs of each job are kept most recent first, which is the chronology's
/// backward link order. The snapshot is read-only once built.
#[derive(Debug, Default)]
pub struct Snapshot {
    jobs: IndexMap<String, Job>,
}

impl Snapshot {
    pub fn from_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        let jobs = jobs
            .into_iter()
            .map(|mut job| {
                job.runs.sort_by(|a, b| b.number.cmp(&a.number));
                job.runs.dedup_by_key(|run| run.number);
                for run in &mut job.runs {
                    run.job_name.clone_from(&job.name);
                }
                (job.name.clone(), job)
            })
            .collect();

        Self { jobs }
    }

    /// Parses an export. Without a known format, JSON then YAML then TOML is tried.
    pub fn parse(contents: &str, format: Option<SnapshotFormat>) -> Result<Self> {
        let export: SnapshotExport = match format {
            Some(SnapshotFormat::Json) => serde_json::from_str(contents)?,
            Some(SnapshotFormat::Yaml) => serde_yaml::from_str(contents)?,
            Some(SnapshotFormat::Toml) => toml::from_str(contents)?,
            None => serde_json::from_str(contents)
                .or_else(|_| serde_yaml::from_str(contents))
                .or_else(|_| toml::from_str(contents))
                .map_err(|e: toml::de::Error| {
                    StageLensError::Source(format!("Unrecognized history export: {e}"))
                })?,
        };

        let snapshot = Self::from_jobs(export.jobs);
        debug!(
            "Parsed history export with {} jobs and {} runs",
            snapshot.jobs.len(),
            snapshot.jobs.values().map(|job| job.runs.len()).sum::<usize>()
        );
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            StageLensError::Source(format!("Failed to read {}: {e}", path.display()))
        })?;
        let format = path.to_str().and_then(SnapshotFormat::from_path);

        let snapshot = Self::parse(&contents, format)?;
        info!("Loaded history from: {}", path.display());
        Ok(snapshot)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

impl Chronology for Snapshot {
    fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    fn most_recent_run(&self, job: &Job) -> Option<&Run> {
        self.jobs.get(&job.name)?.runs.first()
    }

    fn previous_run(&self, run: &Run) -> Option<&Run> {
        let runs = &self.jobs.get(&run.job_name)?.runs;
        // Runs are sorted by descending number
        let position = runs
            .binary_search_by(|candidate| run.number.cmp(&candidate.number))
            .ok()?;
        runs.get(position + 1)
    }
}

impl GraphSource for Snapshot {
    fn execution_graph<'r>(&self, run: &'r Run) -> Option<&'r ExecutionGraph> {
        run.execution.as_ref()
    }
}

impl LogSource for Snapshot {
    fn log_lines(&self, run: &Run, max_lines: usize) -> Vec<String> {
        run.log
            .as_deref()
            .map(|text| text.lines().take(max_lines).map(str::to_string).collect())
            .unwrap_or_default()
    }
}
