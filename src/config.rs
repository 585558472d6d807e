//! Engine configuration: the fixed type lists the passes consult.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Primitive leaf types that never match generically.
pub const DEFAULT_SCALAR_TYPES: &[&str] = &["bool", "float", "code", "file", "int"];

/// Component types that start a flow and need no incoming edge (lowercase).
pub const DEFAULT_INPUT_COMPONENTS: &[&str] = &["chatinput", "textinput", "fileinput", "webhook"];

/// Component types that end a flow and need no outgoing edge (lowercase).
pub const DEFAULT_OUTPUT_COMPONENTS: &[&str] = &["chatoutput", "textoutput", "fileoutput"];

/// Output types that can be rendered as interpolated text.
pub const DEFAULT_REFERENCEABLE_TYPES: &[&str] = &[
    "Message", "Text", "str", "Data", "JSON", "DataFrame", "int", "float", "number", "bool",
    "boolean",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Types that only match when an input explicitly lists them in `input_types`.
    pub scalar_types: Vec<String>,
    /// Allow-list for the upstream reference picker.
    pub referenceable_types: Vec<String>,
    /// Slug used for upstream nodes the caller has no slug for.
    pub fallback_slug: String,
    pub input_components: Vec<String>,
    pub output_components: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            scalar_types: strings(DEFAULT_SCALAR_TYPES),
            referenceable_types: strings(DEFAULT_REFERENCEABLE_TYPES),
            fallback_slug: "node".into(),
            input_components: strings(DEFAULT_INPUT_COMPONENTS),
            output_components: strings(DEFAULT_OUTPUT_COMPONENTS),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        serde_json::from_str(json)
            .map_err(|e| FlowError::parse("P003", format!("Failed to parse engine config: {}", e)))
    }

    pub fn is_scalar(&self, ty: &str) -> bool {
        self.scalar_types.iter().any(|s| s == ty)
    }

    pub fn is_referenceable(&self, ty: &str) -> bool {
        self.referenceable_types.iter().any(|s| s == ty)
    }

    /// Case-insensitive.
    pub fn is_input_component(&self, component_type: &str) -> bool {
        self.input_components
            .iter()
            .any(|c| c.eq_ignore_ascii_case(component_type))
    }

    /// Case-insensitive.
    pub fn is_output_component(&self, component_type: &str) -> bool {
        self.output_components
            .iter()
            .any(|c| c.eq_ignore_ascii_case(component_type))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"fallbackSlug": "component"}"#).unwrap();
        assert_eq!(config.fallback_slug, "component");
        assert!(config.is_scalar("int"));
        assert!(config.is_referenceable("Message"));
        assert!(!config.is_referenceable("Tool"));
        assert!(config.is_input_component("ChatInput"));
        assert!(config.is_output_component("TextOutput"));
        assert!(!config.is_output_component("Prompt"));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = EngineConfig::from_json("{").unwrap_err();
        assert_eq!(err.code, "P003");
    }
}
