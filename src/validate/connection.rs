//! Point-of-use check for a candidate edge during a drag-to-connect gesture.

use crate::compat::handles_compatible;
use crate::config::EngineConfig;
use crate::handle::{
    SourceHandle, StoredSourceHandle, StoredTargetHandle, TargetHandle, source_handle, target_handle,
};
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowEdge;

/// Why a handle pair does not describe the current state of its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleMismatch {
    MissingSource,
    MissingTarget,
    MalformedSource,
    MalformedTarget,
    MissingField(String),
    StaleSource,
    StaleTarget,
}

impl std::fmt::Display for HandleMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleMismatch::MissingSource => write!(f, "source node no longer exists"),
            HandleMismatch::MissingTarget => write!(f, "target node no longer exists"),
            HandleMismatch::MalformedSource => write!(f, "source handle cannot be decoded"),
            HandleMismatch::MalformedTarget => write!(f, "target handle cannot be decoded"),
            HandleMismatch::MissingField(field) => {
                write!(f, "target field '{}' no longer exists", field)
            }
            HandleMismatch::StaleSource => write!(f, "source handle is stale"),
            HandleMismatch::StaleTarget => write!(f, "target handle is stale"),
        }
    }
}

/// Check that the edge's stored handles equal those recomputed from the
/// current endpoint nodes. Returns the current structured handles on success.
///
/// The target field is read from the stored target handle. Handles in the
/// editor backend's form are recomputed in that form.
pub fn check_handles(
    edge: &FlowEdge,
    graph: &FlowGraph<'_>,
) -> Result<(SourceHandle, TargetHandle), HandleMismatch> {
    let source = graph.node(&edge.source).ok_or(HandleMismatch::MissingSource)?;
    let target = graph.node(&edge.target).ok_or(HandleMismatch::MissingTarget)?;

    let stored_target = StoredTargetHandle::parse(&edge.target_handle)
        .map_err(|_| HandleMismatch::MalformedTarget)?;
    let field = stored_target.field_name();
    let current_target =
        target_handle(target, field).map_err(|_| HandleMismatch::MissingField(field.to_string()))?;
    if !stored_target.is_current(target) {
        return Err(HandleMismatch::StaleTarget);
    }

    let stored_source = StoredSourceHandle::parse(&edge.source_handle)
        .map_err(|_| HandleMismatch::MalformedSource)?;
    if !stored_source.is_current(source) {
        return Err(HandleMismatch::StaleSource);
    }
    let current_source = source_handle(source).map_err(|_| HandleMismatch::StaleSource)?;

    Ok((current_source, current_target))
}

/// Whether a candidate edge may be created on the current graph.
///
/// Only the two endpoint nodes are inspected.
pub fn is_valid_connection(edge: &FlowEdge, graph: &FlowGraph<'_>, config: &EngineConfig) -> bool {
    match check_handles(edge, graph) {
        Ok((source, target)) => handles_compatible(&source, &target, config),
        Err(reason) => {
            tracing::trace!(edge = %edge.id, %reason, "rejecting connection");
            false
        }
    }
}
