use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{NodeId, NodeStatus, Vertex, VertexKind};

/// Presentable classification of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Step,
    StageStart,
    StageEnd,
    Branch,
}

/// Read-only view over one execution vertex that has a user-facing meaning.
///
/// Flow start/end markers, parallel fork/join vertices and branch ends are
/// bookkeeping for the engine and have no presentable form.
#[derive(Debug, Clone, Copy)]
pub struct FlowNode<'g> {
    vertex: &'g Vertex,
    kind: NodeKind,
}

impl<'g> FlowNode<'g> {
    /// Maps a vertex to a presentable node, or `None` for synthetic vertices.
    pub fn from_vertex(vertex: &'g Vertex) -> Option<Self> {
        let kind = match vertex.kind {
            VertexKind::Step => NodeKind::Step,
            VertexKind::StageStart => NodeKind::StageStart,
            VertexKind::StageEnd { .. } => NodeKind::StageEnd,
            VertexKind::BranchStart => NodeKind::Branch,
            VertexKind::FlowStart
            | VertexKind::FlowEnd
            | VertexKind::ParallelStart
            | VertexKind::ParallelEnd { .. }
            | VertexKind::BranchEnd { .. } => return None,
        };

        Some(Self { vertex, kind })
    }

    pub fn id(&self) -> NodeId {
        self.vertex.id
    }

    /// Display label, falling back to the step function name.
    pub fn display_name(&self) -> &'g str {
        self.vertex
            .display_name
            .as_deref()
            .or(self.vertex.function.as_deref())
            .unwrap_or("")
    }

    pub fn parents(&self) -> &'g [NodeId] {
        &self.vertex.parents
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn status(&self) -> Option<NodeStatus> {
        self.vertex.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.vertex.start_time
    }

    pub fn duration_millis(&self) -> Option<u64> {
        self.vertex.duration_millis
    }
}
