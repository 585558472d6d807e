//! Per-node template rules.

use crate::error::FlowError;
use crate::handle::StoredTargetHandle;
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowNode;

/// Field holding component source; filled by the component itself.
const CODE_FIELD: &str = "code";

/// N001: a shown, required field needs either a value or an incoming edge.
/// Internal fields (`_`-prefixed, `code`) are never reported.
pub fn validate_node_fields(node: &FlowNode, graph: &FlowGraph<'_>) -> Vec<FlowError> {
    let mut errors = Vec::new();
    if node.is_group() || node.is_note() {
        return errors;
    }

    let connected: Vec<String> = graph
        .incoming_edges(&node.id)
        .into_iter()
        .filter_map(|e| StoredTargetHandle::parse(&e.target_handle).ok())
        .map(|h| h.field_name().to_string())
        .collect();

    for (name, field) in node.definition().template.iter() {
        if name.starts_with('_') || name == CODE_FIELD {
            continue;
        }
        if !field.is_required() || !field.is_shown() || field.has_value() {
            continue;
        }
        if connected.iter().any(|c| c == name) {
            continue;
        }
        let label = field.display_name.as_deref().unwrap_or(name);
        errors.push(FlowError::validate(
            "N001",
            format!(
                "Required field '{}' on '{}' is empty and not connected",
                label,
                node.display_name()
            ),
            Some(node.id.clone()),
            None,
        ));
    }

    errors
}
