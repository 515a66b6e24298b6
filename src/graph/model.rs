use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Graph-local identity of an execution vertex.
///
/// Identities are assigned in execution order, so ordering by id recovers the
/// order in which vertices (and therefore stages) were started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a vertex, a stage, or a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Success,
    NotExecuted,
    Unstable,
    Aborted,
    Failure,
    InProgress,
}

impl NodeStatus {
    /// Rank used when several child outcomes collapse into one stage outcome.
    /// Higher is worse.
    pub fn severity(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::NotExecuted => 1,
            Self::Unstable => 2,
            Self::Aborted => 3,
            Self::Failure => 4,
            Self::InProgress => 5,
        }
    }
}

/// Raw vertex classification as recorded by the pipeline engine.
///
/// Block ends carry the id of the vertex that opened the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VertexKind {
    FlowStart,
    FlowEnd,
    Step,
    StageStart,
    StageEnd { start: NodeId },
    ParallelStart,
    ParallelEnd { start: NodeId },
    BranchStart,
    BranchEnd { start: NodeId },
}

impl VertexKind {
    /// Whether vertices whose first parent is this vertex live inside its block.
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            Self::StageStart | Self::ParallelStart | Self::BranchStart
        )
    }

    /// For block ends, the vertex that opened the block.
    pub fn block_start(&self) -> Option<NodeId> {
        match self {
            Self::StageEnd { start } | Self::ParallelEnd { start } | Self::BranchEnd { start } => {
                Some(*start)
            }
            _ => None,
        }
    }
}

/// One vertex of a run's execution graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub id: NodeId,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Step function that produced the vertex (e.g. `sh`, `echo`)
    #[serde(default)]
    pub function: Option<String>,
    /// Causal predecessors, first parent first
    #[serde(default)]
    pub parents: Vec<NodeId>,
    pub kind: VertexKind,
    /// Absent while the vertex is still running
    #[serde(default)]
    pub status: Option<NodeStatus>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_millis: Option<u64>,
}

/// Execution graph of one run, recorded tail-first.
///
/// Heads are the most recently executed vertices (several while parallel
/// branches are running); every vertex references the vertices that causally
/// precede it. Vertices live in an arena keyed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GraphExport", into = "GraphExport")]
pub struct ExecutionGraph {
    heads: Vec<NodeId>,
    vertices: IndexMap<NodeId, Vertex>,
}

impl ExecutionGraph {
    /// Builds a graph from its vertices.
    ///
    /// When `heads` is empty, the heads are inferred as the vertices no other
    /// vertex names as a parent, in arena order.
    pub fn new(heads: Vec<NodeId>, vertices: impl IntoIterator<Item = Vertex>) -> Self {
        let vertices: IndexMap<NodeId, Vertex> =
            vertices.into_iter().map(|vertex| (vertex.id, vertex)).collect();

        let heads = if heads.is_empty() {
            let referenced: HashSet<NodeId> = vertices
                .values()
                .flat_map(|vertex| vertex.parents.iter().copied())
                .collect();
            vertices
                .keys()
                .filter(|id| !referenced.contains(id))
                .copied()
                .collect()
        } else {
            heads
        };

        Self { heads, vertices }
    }

    pub fn heads(&self) -> &[NodeId] {
        &self.heads
    }

    pub fn get(&self, id: NodeId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }
}

/// Wire shape of an execution graph: a head list and a flat vertex list.
#[derive(Serialize, Deserialize)]
struct GraphExport {
    #[serde(default)]
    heads: Vec<NodeId>,
    #[serde(default)]
    nodes: Vec<Vertex>,
}

impl From<GraphExport> for ExecutionGraph {
    fn from(export: GraphExport) -> Self {
        Self::new(export.heads, export.nodes)
    }
}

impl From<ExecutionGraph> for GraphExport {
    fn from(graph: ExecutionGraph) -> Self {
        Self {
            heads: graph.heads,
            nodes: graph.vertices.into_values().collect(),
        }
    }
}
