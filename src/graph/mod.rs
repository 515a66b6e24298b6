mod model;
mod node;
mod stages;
mod walker;

pub use model::{ExecutionGraph, NodeId, NodeStatus};
pub use node::{FlowNode, NodeKind};
pub use stages::reconstruct_stages;
pub use walker::sorted_nodes;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::model::{ExecutionGraph, NodeId, NodeStatus, Vertex, VertexKind};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    pub fn vertex(id: u64, name: Option<&str>, kind: VertexKind, parents: &[u64]) -> Vertex {
        Vertex {
            id: NodeId(id),
            display_name: name.map(str::to_string),
            function: None,
            parents: parents.iter().copied().map(NodeId).collect(),
            kind,
            status: Some(NodeStatus::Success),
            start_time: Some(base_time() + Duration::seconds(i64::try_from(id).unwrap())),
            duration_millis: Some(1_000),
        }
    }

    pub fn flow_start(id: u64) -> Vertex {
        vertex(id, None, VertexKind::FlowStart, &[])
    }

    pub fn flow_end(id: u64, parents: &[u64]) -> Vertex {
        vertex(id, None, VertexKind::FlowEnd, parents)
    }

    pub fn step(id: u64, name: &str, parents: &[u64]) -> Vertex {
        vertex(id, Some(name), VertexKind::Step, parents)
    }

    pub fn stage_start(id: u64, name: &str, parents: &[u64]) -> Vertex {
        vertex(id, Some(name), VertexKind::StageStart, parents)
    }

    pub fn stage_end(id: u64, start: u64, parents: &[u64]) -> Vertex {
        let start = NodeId(start);
        vertex(id, None, VertexKind::StageEnd { start }, parents)
    }

    pub fn parallel_start(id: u64, parents: &[u64]) -> Vertex {
        vertex(id, None, VertexKind::ParallelStart, parents)
    }

    pub fn parallel_end(id: u64, start: u64, parents: &[u64]) -> Vertex {
        let start = NodeId(start);
        vertex(id, None, VertexKind::ParallelEnd { start }, parents)
    }

    pub fn branch_start(id: u64, name: &str, parents: &[u64]) -> Vertex {
        vertex(id, Some(name), VertexKind::BranchStart, parents)
    }

    pub fn branch_end(id: u64, start: u64, parents: &[u64]) -> Vertex {
        let start = NodeId(start);
        vertex(id, None, VertexKind::BranchEnd { start }, parents)
    }

    /// Marks a vertex as still executing.
    pub fn running(mut vertex: Vertex) -> Vertex {
        vertex.status = None;
        vertex.duration_millis = None;
        vertex
    }

    pub fn graph(heads: &[u64], vertices: Vec<Vertex>) -> ExecutionGraph {
        ExecutionGraph::new(heads.iter().copied().map(NodeId).collect(), vertices)
    }

    /// A finished three-stage pipeline whose middle stage runs two branches.
    ///
    /// ```text
    /// 2 start
    /// 3 stage Build      4 make        5 end(3)
    /// 6 stage Test       7 parallel
    ///   8 branch unit         10 unit tests         12 end(8)
    ///   9 branch integration  11 integration tests  13 end(9)
    ///                    14 join(7) <- 12, 13      15 end(6)
    /// 16 stage Deploy    17 deploy     18 end(16)
    /// 19 end
    /// ```
    pub fn sample_pipeline() -> ExecutionGraph {
        graph(
            &[19],
            vec![
                flow_start(2),
                stage_start(3, "Build", &[2]),
                step(4, "make", &[3]),
                stage_end(5, 3, &[4]),
                stage_start(6, "Test", &[5]),
                parallel_start(7, &[6]),
                branch_start(8, "unit", &[7]),
                branch_start(9, "integration", &[7]),
                step(10, "unit tests", &[8]),
                step(11, "integration tests", &[9]),
                branch_end(12, 8, &[10]),
                branch_end(13, 9, &[11]),
                parallel_end(14, 7, &[12, 13]),
                stage_end(15, 6, &[14]),
                stage_start(16, "Deploy", &[15]),
                step(17, "deploy", &[16]),
                stage_end(18, 16, &[17]),
                flow_end(19, &[18]),
            ],
        )
    }
}
