//! Flow-shape rules: empty flows and nodes cut off from the rest.
//!
//! Edge endpoints are read from the edge list as written, dangling ones
//! included. Note nodes are ignored.

use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::error::{FlowError, Severity};
use crate::parse::types::Flow;

/// W001 empty flow, N002 disconnected node, N003 no incoming edge,
/// N004 declared outputs but no outgoing edge. A node gets at most one of
/// N002..N004.
pub fn validate_connectivity(flow: &Flow, config: &EngineConfig) -> Vec<FlowError> {
    let mut errors = Vec::new();

    if flow.nodes.is_empty() {
        errors.push(
            FlowError::validate("W001", "Flow is empty", None, None).with_severity(Severity::Warning),
        );
        return errors;
    }

    let sources: HashSet<&str> = flow.edges.iter().map(|e| e.source.as_str()).collect();
    let targets: HashSet<&str> = flow.edges.iter().map(|e| e.target.as_str()).collect();

    for node in flow.nodes.iter().filter(|n| !n.is_note()) {
        let has_incoming = targets.contains(node.id.as_str());
        let has_outgoing = sources.contains(node.id.as_str());
        let component_type = node.component_type();

        if !has_incoming && !has_outgoing {
            errors.push(FlowError::validate(
                "N002",
                format!(
                    "Node '{}' ({}) is not connected to any other node",
                    node.display_name(),
                    component_type
                ),
                Some(node.id.clone()),
                None,
            ));
        } else if !has_incoming && !config.is_input_component(component_type) {
            errors.push(
                FlowError::validate(
                    "N003",
                    format!(
                        "Node '{}' ({}) has no incoming connections",
                        node.display_name(),
                        component_type
                    ),
                    Some(node.id.clone()),
                    None,
                )
                .with_severity(Severity::Warning),
            );
        } else if !has_outgoing
            && !config.is_output_component(component_type)
            && !node.definition().outputs.is_empty()
        {
            errors.push(
                FlowError::validate(
                    "N004",
                    format!(
                        "Node '{}' ({}) has outputs but is not connected downstream",
                        node.display_name(),
                        component_type
                    ),
                    Some(node.id.clone()),
                    None,
                )
                .with_severity(Severity::Info),
            );
        }
    }

    errors
}
