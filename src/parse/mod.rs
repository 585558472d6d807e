//! Parse phase: JSON → flow and catalog types + graph index.

pub mod catalog;
pub mod graph;
pub mod types;

pub use catalog::Catalog;
pub use graph::FlowGraph;
pub use types::*;

use crate::error::FlowError;

/// Deserialize a flow JSON string into a `Flow`.
pub fn parse(json: &str) -> Result<Flow, Vec<FlowError>> {
    serde_json::from_str::<Flow>(json)
        .map_err(|e| vec![FlowError::parse("P001", format!("Failed to parse flow JSON: {}", e))])
}

/// Deserialize and validate a catalog JSON string.
pub fn parse_catalog(json: &str) -> Result<Catalog, Vec<FlowError>> {
    Catalog::from_json(json).map_err(|e| vec![FlowError::from(e)])
}
