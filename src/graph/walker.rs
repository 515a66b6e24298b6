use std::collections::HashSet;

use log::debug;

use super::model::{ExecutionGraph, NodeId, Vertex};

/// Depth-first traversal of an execution graph from its heads along parent links.
///
/// Every vertex reachable from a head is yielded exactly once, however many
/// children reference it. Heads are explored in declared order and, for each
/// vertex, the first parent is explored first, so the order is fixed for a
/// fixed graph. This is encounter order, not execution order.
pub struct Walk<'g> {
    graph: Option<&'g ExecutionGraph>,
    stack: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl<'g> Walk<'g> {
    pub fn new(graph: Option<&'g ExecutionGraph>) -> Self {
        let stack = graph
            .map(|graph| graph.heads().iter().rev().copied().collect())
            .unwrap_or_default();
        let visited = HashSet::with_capacity(graph.map_or(0, ExecutionGraph::len));

        Self {
            graph,
            stack,
            visited,
        }
    }
}

impl<'g> Iterator for Walk<'g> {
    type Item = &'g Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph?;

        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id) {
                continue;
            }

            // Dangling parent references are ignored
            let Some(vertex) = graph.get(id) else {
                continue;
            };

            self.stack.extend(
                vertex
                    .parents
                    .iter()
                    .rev()
                    .filter(|parent| !self.visited.contains(*parent)),
            );

            return Some(vertex);
        }

        None
    }
}

/// Invokes `visitor` once per vertex reachable from the graph heads.
///
/// An absent graph is not an error: the visitor is simply never called.
pub fn walk<'g, F>(graph: Option<&'g ExecutionGraph>, mut visitor: F)
where
    F: FnMut(&'g Vertex),
{
    let mut visited = 0usize;
    for vertex in Walk::new(graph) {
        visitor(vertex);
        visited += 1;
    }
    debug!("Walked {visited} execution vertices");
}

/// Materializes the traversal in execution order (ascending vertex id).
pub fn sorted_nodes(graph: Option<&ExecutionGraph>) -> Vec<&Vertex> {
    let mut nodes: Vec<&Vertex> = Walk::new(graph).collect();
    nodes.sort_by_key(|vertex| vertex.id);
    nodes
}
