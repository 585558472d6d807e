//! Flow validation.
//!
//! `connection` gates single edges while the user drags; `validate_flow`
//! reports every problem in a whole flow snapshot.

pub mod connection;
pub mod connectivity;
pub mod field_rules;
pub mod structural;

pub use connection::{check_handles, is_valid_connection};

use crate::config::EngineConfig;
use crate::error::FlowError;
use crate::parse::graph::FlowGraph;
use crate::parse::types::{Flow, FlowNode};

/// Validate the entire flow (edge rules, flow shape, node templates).
/// Advisory findings come back alongside errors; see `FlowError::severity`.
pub fn validate_flow(flow: &Flow, graph: &FlowGraph<'_>, config: &EngineConfig) -> Vec<FlowError> {
    let mut errors = structural::validate_structural(flow, graph, config);
    errors.extend(connectivity::validate_connectivity(flow, config));

    for node in &flow.nodes {
        errors.extend(validate_node(node, graph));
    }

    errors
}

/// Validate a single node's template against its incoming edges.
pub fn validate_node(node: &FlowNode, graph: &FlowGraph<'_>) -> Vec<FlowError> {
    field_rules::validate_node_fields(node, graph)
}
