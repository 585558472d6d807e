//! Edge-level flow rules (V001–V005).

use std::collections::HashSet;

use super::connection::{HandleMismatch, check_handles};
use crate::compat::handles_compatible;
use crate::config::EngineConfig;
use crate::error::FlowError;
use crate::parse::graph::FlowGraph;
use crate::parse::types::Flow;

/// Run all edge rules. Returns all errors found.
pub fn validate_structural(flow: &Flow, graph: &FlowGraph<'_>, config: &EngineConfig) -> Vec<FlowError> {
    let mut errors = Vec::new();

    v001_v003_edges_match_endpoints(flow, graph, config, &mut errors);
    v004_no_duplicate_edges(flow, &mut errors);
    v005_no_self_loops(flow, &mut errors);

    errors
}

fn v001_v003_edges_match_endpoints(
    flow: &Flow,
    graph: &FlowGraph<'_>,
    config: &EngineConfig,
    errors: &mut Vec<FlowError>,
) {
    for edge in &flow.edges {
        let edge_id = Some(edge.id.clone());
        match check_handles(edge, graph) {
            Ok((source, target)) => {
                if !handles_compatible(&source, &target, config) {
                    errors.push(FlowError::validate(
                        "V003",
                        format!(
                            "Type mismatch: '{}' offers {:?} but '{}'.{} accepts {:?}",
                            edge.source,
                            source.offered_types(),
                            edge.target,
                            target.field_name,
                            target.accepted.types()
                        ),
                        Some(edge.target.clone()),
                        edge_id,
                    ));
                }
            }
            Err(HandleMismatch::MissingSource) => errors.push(FlowError::validate(
                "V001",
                format!(
                    "Edge '{}' references unknown source node '{}'",
                    edge.id, edge.source
                ),
                None,
                edge_id,
            )),
            Err(HandleMismatch::MissingTarget) => errors.push(FlowError::validate(
                "V001",
                format!(
                    "Edge '{}' references unknown target node '{}'",
                    edge.id, edge.target
                ),
                None,
                edge_id,
            )),
            Err(reason) => errors.push(FlowError::validate(
                "V002",
                format!("Edge '{}' is stale: {}", edge.id, reason),
                Some(edge.target.clone()),
                edge_id,
            )),
        }
    }
}

fn v004_no_duplicate_edges(flow: &Flow, errors: &mut Vec<FlowError>) {
    let mut seen = HashSet::new();
    for edge in &flow.edges {
        let key = (
            edge.source.as_str(),
            edge.target.as_str(),
            edge.source_handle.as_str(),
            edge.target_handle.as_str(),
        );
        if !seen.insert(key) {
            errors.push(FlowError::validate(
                "V004",
                format!("Duplicate edge from '{}' to '{}'", edge.source, edge.target),
                None,
                Some(edge.id.clone()),
            ));
        }
    }
}

fn v005_no_self_loops(flow: &Flow, errors: &mut Vec<FlowError>) {
    for edge in &flow.edges {
        if edge.source == edge.target {
            errors.push(FlowError::validate(
                "V005",
                format!("Self-loop detected on node '{}'", edge.source),
                Some(edge.source.clone()),
                Some(edge.id.clone()),
            ));
        }
    }
}
