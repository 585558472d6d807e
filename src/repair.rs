//! Consistency repair after node mutations.

use crate::parse::graph::FlowGraph;
use crate::parse::types::{Flow, FlowEdge};
use crate::validate::connection::check_handles;

/// Return `flow` without the edges whose stored handles no longer match
/// their endpoints. Retained edges are untouched; nothing is re-pointed.
///
/// Idempotent: a cleaned flow cleans to itself.
pub fn clean_edges(flow: &Flow) -> Flow {
    let edges = retained_edges(flow);
    Flow {
        nodes: flow.nodes.clone(),
        edges,
        extra: flow.extra.clone(),
    }
}

/// In-place variant for callers that own the flow.
pub fn clean_edges_in_place(flow: &mut Flow) {
    flow.edges = retained_edges(flow);
}

fn retained_edges(flow: &Flow) -> Vec<FlowEdge> {
    let graph = FlowGraph::build(flow);
    flow.edges
        .iter()
        .filter(|edge| match check_handles(edge, &graph) {
            Ok(_) => true,
            Err(reason) => {
                tracing::debug!(
                    edge = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    %reason,
                    "dropping edge"
                );
                false
            }
        })
        .cloned()
        .collect()
}
