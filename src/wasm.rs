//! WASM entry points for the canvas.
//!
//! Every function takes JSON strings and returns a JS value. Parse failures
//! come back as a list of error DTOs instead of throwing.

use std::collections::HashMap;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::compat::{CategoryMatch, Direction, TypeQuery, resolve_compatible};
use crate::config::EngineConfig;
use crate::edit::FlowEdit;
use crate::error::FlowError;
use crate::parse::{self, FlowEdge, FlowGraph};
use crate::upstream::{UpstreamOutput, get_upstream_outputs};

/// Whether `edge_json` may be added to `flow_json`. Any parse failure is `false`.
#[wasm_bindgen]
pub fn is_valid_connection(edge_json: &str, flow_json: &str, config_json: Option<String>) -> bool {
    let Ok(edge) = serde_json::from_str::<FlowEdge>(edge_json) else {
        return false;
    };
    let Ok(flow) = parse::parse(flow_json) else {
        return false;
    };
    let Ok(config) = load_config(config_json.as_deref()) else {
        return false;
    };
    let graph = FlowGraph::build(&flow);
    crate::validate::is_valid_connection(&edge, &graph, &config)
}

/// Returns `{status: "success", result}` with stale edges removed, or `{status: "errors", errors}`.
#[wasm_bindgen]
pub fn clean_edges(flow_json: &str) -> JsValue {
    let result = match parse::parse(flow_json) {
        Ok(flow) => WasmResult::success(crate::repair::clean_edges(&flow)),
        Err(errors) => WasmResult::errors(errors),
    };
    to_js(&result)
}

/// Apply one `FlowEdit` (JSON, tagged by `op`) and return the edited flow.
#[wasm_bindgen]
pub fn apply_edit(flow_json: &str, edit_json: &str, config_json: Option<String>) -> JsValue {
    to_js(&apply_edit_inner(flow_json, edit_json, config_json.as_deref()))
}

fn apply_edit_inner(
    flow_json: &str,
    edit_json: &str,
    config_json: Option<&str>,
) -> WasmResult<parse::Flow> {
    let flow = match parse::parse(flow_json) {
        Ok(f) => f,
        Err(errors) => return WasmResult::errors(errors),
    };
    let edit = match serde_json::from_str::<FlowEdit>(edit_json) {
        Ok(e) => e,
        Err(e) => {
            return WasmResult::errors(vec![FlowError::parse(
                "P004",
                format!("Failed to parse edit: {}", e),
            )]);
        }
    };
    let config = match load_config(config_json) {
        Ok(c) => c,
        Err(e) => return WasmResult::errors(vec![e]),
    };

    match crate::edit::apply_edit(&flow, edit, &config) {
        Ok(next) => WasmResult::success(next),
        Err(e) => WasmResult::errors(vec![e.into()]),
    }
}

/// Palette highlighting for a dragged port.
///
/// `query` is the newline-delimited type list of the port; `direction` is
/// `"left"` to find sources and anything else to find targets. `explicit`
/// marks the query as an input's `input_types` list, which admits scalar
/// types the same way `is_valid_connection` does.
#[wasm_bindgen]
pub fn compatible_components(
    query: &str,
    direction: &str,
    explicit: bool,
    catalog_json: &str,
    flow_json: Option<String>,
    config_json: Option<String>,
) -> JsValue {
    to_js(&compatible_components_inner(
        query,
        direction,
        explicit,
        catalog_json,
        flow_json.as_deref(),
        config_json.as_deref(),
    ))
}

fn compatible_components_inner(
    query: &str,
    direction: &str,
    explicit: bool,
    catalog_json: &str,
    flow_json: Option<&str>,
    config_json: Option<&str>,
) -> WasmResult<Vec<PaletteEntryDto>> {
    let catalog = match parse::parse_catalog(catalog_json) {
        Ok(c) => c,
        Err(errors) => return WasmResult::errors(errors),
    };
    let flow = match flow_json.map(parse::parse).transpose() {
        Ok(f) => f,
        Err(errors) => return WasmResult::errors(errors),
    };
    let config = match load_config(config_json) {
        Ok(c) => c,
        Err(e) => return WasmResult::errors(vec![e]),
    };

    let direction = if direction == "left" {
        Direction::Left
    } else {
        Direction::Right
    };
    let mut query = TypeQuery::parse(query);
    if explicit {
        query = query.explicit();
    }
    let matches = resolve_compatible(
        &query,
        direction,
        &catalog,
        flow.as_ref(),
        &config,
    );
    WasmResult::success(matches.iter().map(PaletteEntryDto::from).collect())
}

/// Reference-picker entries for `node_id`. `slugs_json` maps node id → slug.
#[wasm_bindgen]
pub fn upstream_outputs(
    node_id: &str,
    flow_json: &str,
    slugs_json: Option<String>,
    config_json: Option<String>,
) -> JsValue {
    to_js(&upstream_outputs_inner(
        node_id,
        flow_json,
        slugs_json.as_deref(),
        config_json.as_deref(),
    ))
}

fn upstream_outputs_inner(
    node_id: &str,
    flow_json: &str,
    slugs_json: Option<&str>,
    config_json: Option<&str>,
) -> WasmResult<Vec<UpstreamOutput>> {
    let flow = match parse::parse(flow_json) {
        Ok(f) => f,
        Err(errors) => return WasmResult::errors(errors),
    };
    let parsed_slugs = slugs_json
        .map(serde_json::from_str::<HashMap<String, String>>)
        .transpose();
    let slugs = match parsed_slugs {
        Ok(s) => s.unwrap_or_default(),
        Err(e) => {
            return WasmResult::errors(vec![FlowError::parse(
                "P002",
                format!("Failed to parse slug map: {}", e),
            )]);
        }
    };
    let config = match load_config(config_json) {
        Ok(c) => c,
        Err(e) => return WasmResult::errors(vec![e]),
    };

    let graph = FlowGraph::build(&flow);
    WasmResult::success(get_upstream_outputs(node_id, &graph, &slugs, &config))
}

/// Full validation report: a JSON array of error DTOs.
#[wasm_bindgen]
pub fn validate_flow(flow_json: &str, config_json: Option<String>) -> JsValue {
    to_js(&validate_flow_inner(flow_json, config_json.as_deref()))
}

fn validate_flow_inner(flow_json: &str, config_json: Option<&str>) -> Vec<FlowError> {
    let flow = match parse::parse(flow_json) {
        Ok(f) => f,
        Err(errors) => return errors,
    };
    let config = match load_config(config_json) {
        Ok(c) => c,
        Err(e) => return vec![e],
    };
    let graph = FlowGraph::build(&flow);
    crate::validate::validate_flow(&flow, &graph, &config)
}

fn load_config(json: Option<&str>) -> Result<EngineConfig, FlowError> {
    match json {
        Some(json) => EngineConfig::from_json(json),
        None => Ok(EngineConfig::default()),
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum WasmResult<T> {
    Success { result: T },
    Errors { errors: Vec<FlowError> },
}

impl<T> WasmResult<T> {
    fn success(result: T) -> Self {
        WasmResult::Success { result }
    }

    fn errors(errors: Vec<FlowError>) -> Self {
        WasmResult::Errors { errors }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaletteEntryDto {
    category: String,
    /// Empty for a fully compatible category.
    types: String,
    display_names: Vec<String>,
    compatible: usize,
    total: usize,
}

impl From<&CategoryMatch> for PaletteEntryDto {
    fn from(m: &CategoryMatch) -> Self {
        PaletteEntryDto {
            category: m.category.clone(),
            types: m.types_field(),
            display_names: m.display_names.clone(),
            compatible: m.compatible_count(),
            total: m.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_flow_reports_parse_error() {
        let errors = validate_flow_inner("not json", None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "P001");
    }

    #[test]
    fn palette_for_empty_catalog_is_empty() {
        match compatible_components_inner("Message", "left", false, "{}", None, None) {
            WasmResult::Success { result } => assert!(result.is_empty()),
            WasmResult::Errors { errors } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn edit_errors_come_back_as_dtos() {
        let flow = r#"{"nodes":[],"edges":[]}"#;
        match apply_edit_inner(flow, r#"{"op":"removeNode","nodeId":"x"}"#, None) {
            WasmResult::Success { .. } => panic!("expected errors"),
            WasmResult::Errors { errors } => assert_eq!(errors[0].code, "E001"),
        }
        match apply_edit_inner(flow, r#"{"op":"explode"}"#, None) {
            WasmResult::Success { .. } => panic!("expected errors"),
            WasmResult::Errors { errors } => assert_eq!(errors[0].code, "P004"),
        }
    }

    #[test]
    fn explicit_scalar_query_agrees_with_validator() {
        let catalog = r#"{"numbers": {"Counter": {
            "template": {},
            "base_classes": ["int"],
            "outputs": [{"name": "count", "types": ["int"], "selected": "int"}]
        }}}"#;
        let flow = r#"{"nodes": [
            {"id": "A", "data": {"type": "Counter", "node": {"template": {}, "base_classes": ["int"],
                "outputs": [{"name": "count", "types": ["int"], "selected": "int"}]}}},
            {"id": "B", "data": {"type": "Sink", "node": {"template": {
                "n": {"type": "str", "input_types": ["int"]}}, "base_classes": []}}}
        ], "edges": []}"#;
        let edge = r#"{"id": "e", "source": "A", "target": "B",
            "sourceHandle": "{œoutputTypeœ:œintœ,œidœ:œAœ,œnameœ:œcountœ,œbaseClassesœ:[œintœ]}",
            "targetHandle": "{œinputTypesœ:[œintœ],œfieldNameœ:œnœ,œidœ:œBœ}"}"#;

        let edge: FlowEdge = serde_json::from_str(edge).unwrap();
        let flow = parse::parse(flow).unwrap();
        let graph = FlowGraph::build(&flow);
        assert!(crate::validate::is_valid_connection(&edge, &graph, &EngineConfig::default()));

        match compatible_components_inner("int", "left", true, catalog, None, None) {
            WasmResult::Success { result } => {
                assert_eq!(result.len(), 1);
                assert_eq!(result[0].category, "numbers");
                assert_eq!(result[0].compatible, 1);
            }
            WasmResult::Errors { errors } => panic!("unexpected errors: {:?}", errors),
        }
        match compatible_components_inner("int", "left", false, catalog, None, None) {
            WasmResult::Success { result } => assert!(result.is_empty()),
            WasmResult::Errors { errors } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn edge_without_handles_is_dropped_not_rejected() {
        let flow = r#"{"nodes": [], "edges": [
            {"id": "e", "source": "A", "target": "B", "sourceHandle": null}
        ]}"#;
        let errors = validate_flow_inner(flow, None);
        assert!(errors.iter().all(|e| e.code != "P001"));
        assert!(parse::parse(flow).is_ok());
    }

    #[test]
    fn bad_slug_map_is_reported() {
        match upstream_outputs_inner("a", r#"{"nodes":[],"edges":[]}"#, Some("[1]"), None) {
            WasmResult::Success { .. } => panic!("expected errors"),
            WasmResult::Errors { errors } => assert_eq!(errors[0].code, "P002"),
        }
    }
}
