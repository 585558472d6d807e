//! petgraph-based index over a flow snapshot.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use super::types::{Flow, FlowEdge, FlowNode};

/// Borrowed view of a `Flow` with O(1) node lookup.
///
/// Node weights are positions in `flow.nodes`, edge weights positions in
/// `flow.edges`. Edges whose endpoints are missing are not indexed; the flow
/// stays usable while the user is mid-edit.
pub struct FlowGraph<'a> {
    pub flow: &'a Flow,
    pub graph: DiGraph<usize, usize>,
    pub node_indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> FlowGraph<'a> {
    pub fn build(flow: &'a Flow) -> Self {
        let mut graph = DiGraph::with_capacity(flow.nodes.len(), flow.edges.len());
        let mut node_indices = HashMap::with_capacity(flow.nodes.len());

        for (pos, node) in flow.nodes.iter().enumerate() {
            // First occurrence wins for duplicated ids.
            if !node_indices.contains_key(node.id.as_str()) {
                let idx = graph.add_node(pos);
                node_indices.insert(node.id.as_str(), idx);
            }
        }

        for (pos, edge) in flow.edges.iter().enumerate() {
            let source = node_indices.get(edge.source.as_str());
            let target = node_indices.get(edge.target.as_str());
            if let (Some(&s), Some(&t)) = (source, target) {
                graph.add_edge(s, t, pos);
            }
        }

        FlowGraph {
            flow,
            graph,
            node_indices,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'a FlowNode> {
        let idx = self.node_indices.get(id)?;
        self.flow.nodes.get(self.graph[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Distinct ids of nodes with an edge into `node_id`.
    pub fn predecessors(&self, node_id: &str) -> Vec<&'a str> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        let mut ids: Vec<&'a str> = Vec::new();
        for n in self.graph.neighbors_directed(idx, Direction::Incoming) {
            let id = self.flow.nodes[self.graph[n]].id.as_str();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn incoming_edges(&self, node_id: &str) -> Vec<&'a FlowEdge> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| &self.flow.edges[*e.weight()])
            .collect()
    }

    pub fn incoming_count(&self, node_id: &str) -> usize {
        self.incoming_edges(node_id).len()
    }
}
