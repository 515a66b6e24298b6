use std::collections::HashMap;

use log::{debug, trace};

use super::model::{ExecutionGraph, NodeId, NodeStatus, Vertex, VertexKind};
use super::node::{FlowNode, NodeKind};
use super::walker::walk;
use crate::records::{NodeRecord, StageRecord};

/// Groups execution vertices into the stages that enclose them.
///
/// Feed it every vertex of a walk (in any order) with [`visit`](Self::visit),
/// then call [`finish`](Self::finish). Stages come back in discovery order;
/// callers must apply [`sort_by_stage_id`] before presenting them.
///
/// A vertex belongs to its innermost enclosing stage. The enclosing block of a
/// vertex is found through its first parent: a block-start parent encloses it,
/// a block-end parent means it shares the enclosing block of that block's
/// start, and any other parent means it shares the parent's block. Parallel
/// and branch blocks are transparent when looking for the enclosing stage.
pub struct StageReconstructor<'g> {
    graph: &'g ExecutionGraph,
    building: bool,
    opened: Vec<FlowNode<'g>>,
    closed: HashMap<NodeId, FlowNode<'g>>,
    children: HashMap<NodeId, Vec<FlowNode<'g>>>,
    blocks: HashMap<NodeId, Option<NodeId>>,
    dropped: usize,
}

impl<'g> StageReconstructor<'g> {
    /// `building` tells whether the run owning the graph is still executing.
    pub fn new(graph: &'g ExecutionGraph, building: bool) -> Self {
        Self {
            graph,
            building,
            opened: Vec::new(),
            closed: HashMap::new(),
            children: HashMap::new(),
            blocks: HashMap::with_capacity(graph.len()),
            dropped: 0,
        }
    }

    pub fn visit(&mut self, vertex: &'g Vertex) {
        let Some(node) = FlowNode::from_vertex(vertex) else {
            return;
        };

        match node.kind() {
            NodeKind::StageStart => self.opened.push(node),
            NodeKind::StageEnd => {
                if let Some(start) = vertex.kind.block_start() {
                    self.closed.insert(start, node);
                }
            }
            NodeKind::Step | NodeKind::Branch => match self.enclosing_stage(vertex.id) {
                Some(stage_id) => self.children.entry(stage_id).or_default().push(node),
                None => {
                    trace!("Vertex {} is outside any stage", vertex.id);
                    self.dropped += 1;
                }
            },
        }
    }

    /// Builds one stage per stage-start vertex seen, in discovery order.
    pub fn finish(mut self) -> Vec<StageRecord> {
        debug!(
            "Reconstructed {} stages ({} vertices outside any stage)",
            self.opened.len(),
            self.dropped
        );

        let opened = std::mem::take(&mut self.opened);
        opened
            .into_iter()
            .map(|open| {
                let close = self.closed.get(&open.id()).copied();
                let children = self.children.remove(&open.id()).unwrap_or_default();
                build_stage(open, close, children, self.building)
            })
            .collect()
    }

    fn enclosing_stage(&mut self, id: NodeId) -> Option<NodeId> {
        let mut block = self.enclosing_block(id);
        while let Some(start) = block {
            match self.graph.get(start).map(|vertex| &vertex.kind) {
                Some(VertexKind::StageStart) => return Some(start),
                Some(_) => block = self.enclosing_block(start),
                None => return None,
            }
        }
        None
    }

    /// Resolves the start vertex of the innermost block enclosing `id`.
    ///
    /// Walks first-parent links iteratively and memoizes every vertex on the
    /// way, since all of them share the same answer.
    fn enclosing_block(&mut self, id: NodeId) -> Option<NodeId> {
        let mut pending = Vec::new();
        let mut cursor = id;

        let resolved = loop {
            if let Some(&known) = self.blocks.get(&cursor) {
                break known;
            }
            // Guards against malformed input with cycles
            if pending.len() > self.graph.len() {
                break None;
            }

            pending.push(cursor);

            let parent = self
                .graph
                .get(cursor)
                .and_then(|vertex| vertex.parents.first())
                .and_then(|&parent_id| self.graph.get(parent_id));
            let Some(parent) = parent else {
                break None;
            };

            if parent.kind.opens_block() {
                break Some(parent.id);
            }
            cursor = parent.kind.block_start().unwrap_or(parent.id);
        };

        for vertex_id in pending {
            self.blocks.insert(vertex_id, resolved);
        }
        resolved
    }
}

fn build_stage(
    open: FlowNode<'_>,
    close: Option<FlowNode<'_>>,
    mut children: Vec<FlowNode<'_>>,
    building: bool,
) -> StageRecord {
    children.sort_by_key(FlowNode::id);

    let duration_millis = close.and_then(|close| {
        let elapsed = close.start_time()? - open.start_time()?;
        u64::try_from(elapsed.num_milliseconds()).ok()
    });

    let status = match close {
        None if building => NodeStatus::InProgress,
        // The run ended without closing the stage
        None => children
            .iter()
            .filter_map(FlowNode::status)
            .filter(|status| *status != NodeStatus::InProgress)
            .max_by_key(|status| status.severity())
            .unwrap_or(NodeStatus::Aborted),
        Some(close) => children
            .iter()
            .filter_map(FlowNode::status)
            .max_by_key(|status| status.severity())
            .or(close.status())
            .unwrap_or(NodeStatus::Success),
    };

    StageRecord {
        id: open.id(),
        name: open.display_name().to_string(),
        status,
        start_time: open.start_time(),
        duration_millis,
        children: children.into_iter().map(NodeRecord::from).collect(),
    }
}

/// Orders stages by the id of their opening vertex, which is the order they
/// were opened during execution. The sort is stable.
pub fn sort_by_stage_id(stages: &mut [StageRecord]) {
    stages.sort_by_key(|stage| stage.id);
}

/// Walks a graph and returns its stages sorted by stage id.
///
/// Stages left open in a run that is no longer building take the worst
/// finished status of their children.
pub fn reconstruct_stages(graph: Option<&ExecutionGraph>, building: bool) -> Vec<StageRecord> {
    let Some(graph) = graph else {
        return Vec::new();
    };

    let mut reconstructor = StageReconstructor::new(graph, building);
    walk(Some(graph), |vertex| reconstructor.visit(vertex));

    let mut stages = reconstructor.finish();
    sort_by_stage_id(&mut stages);
    stages
}
