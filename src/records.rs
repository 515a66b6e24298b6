use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::graph::{FlowNode, NodeId, NodeKind, NodeStatus};
use crate::history::RunResult;

/// A job and, depending on the operation, some of its builds.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub builds: Vec<BuildRecord>,
}

impl JobRecord {
    pub fn add_build(&mut self, build: BuildRecord) {
        self.builds.push(build);
    }
}

/// One run of a job, optionally with its reconstructed stages.
#[derive(Debug, Clone, Serialize)]
pub struct BuildRecord {
    pub job_name: String,
    pub number: u32,
    pub url: String,
    pub building: bool,
    pub result: Option<RunResult>,
    pub start_time: DateTime<Utc>,
    pub duration_millis: Option<u64>,
    pub stages: Vec<StageRecord>,
}

/// A stage reconstructed from a stage-start vertex and the vertices it encloses.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    /// Id of the opening vertex
    pub id: NodeId,
    pub name: String,
    pub status: NodeStatus,
    pub start_time: Option<DateTime<Utc>>,
    /// Absent until the stage has closed
    pub duration_millis: Option<u64>,
    pub children: Vec<NodeRecord>,
}

/// Summary of a single presentable execution vertex.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub status: NodeStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_millis: Option<u64>,
    pub parents: Vec<NodeId>,
}

impl From<FlowNode<'_>> for NodeRecord {
    fn from(node: FlowNode<'_>) -> Self {
        Self {
            id: node.id(),
            name: node.display_name().to_string(),
            kind: node.kind(),
            status: node.status().unwrap_or(NodeStatus::InProgress),
            start_time: node.start_time(),
            duration_millis: node.duration_millis(),
            parents: node.parents().to_vec(),
        }
    }
}

/// Build statistics for a job, derived from its whole chronology.
#[derive(Debug, Clone, Serialize)]
pub struct JobMetricsRecord {
    pub job_name: String,
    pub total_builds: usize,
    pub successful_builds: usize,
    pub unstable_builds: usize,
    pub failed_builds: usize,
    pub aborted_builds: usize,
    pub building: usize,
    /// Share of completed builds that succeeded, in percent
    pub success_rate: f64,
    /// Duration percentiles of completed builds, in seconds
    pub duration_p50: f64,
    pub duration_p95: f64,
    pub duration_p99: f64,
    pub last_build: Option<u32>,
    pub last_successful_build: Option<u32>,
    pub last_failed_build: Option<u32>,
}

/// Result of one operation, ready to be printed.
///
/// Absent jobs and runs serialize as `null`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Job(Option<JobRecord>),
    Build(Option<BuildRecord>),
    Nodes(Option<Vec<NodeRecord>>),
    Log(Option<Vec<String>>),
    Metrics(Option<JobMetricsRecord>),
}
