//! Port identity.
//!
//! A port is an immutable structured value derived from the current state of
//! its node. Edges store the string form; an edge is valid while the stored
//! value still equals the value recomputed from the node, so any change to a
//! node's type contract invalidates its edges without separate change tracking.
//!
//! String form: compact JSON of the handle with every `"` replaced by `œ`,
//! which the canvas can embed in DOM ids without escaping.
//!
//! Flows saved by the editor backend carry handles in its own key set
//! (`{dataType,id,name,output_types}` and `{fieldName,id,inputTypes,type}`).
//! Those are decoded as `Editor*` handles and checked by recomputing the
//! same form from the node.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::HandleError;
use crate::parse::types::{FlowNode, OutputSpec};

const QUOTE_SUBSTITUTE: char = 'œ';

/// Producing side of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHandle {
    /// Effective output type: the selected type of the exposed output, or the
    /// component type name when the node declares no outputs.
    pub output_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub base_classes: Vec<String>,
}

/// Consuming side of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHandle {
    #[serde(flatten)]
    pub accepted: AcceptedTypes,
    pub field_name: String,
    pub id: String,
}

/// Types a field accepts. `Explicit` lists are an opt-in that also admits
/// scalar types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcceptedTypes {
    #[serde(rename = "inputTypes")]
    Explicit(Vec<String>),
    #[serde(rename = "type")]
    Declared(String),
}

impl AcceptedTypes {
    pub fn types(&self) -> &[String] {
        match self {
            AcceptedTypes::Explicit(types) => types,
            AcceptedTypes::Declared(ty) => std::slice::from_ref(ty),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, AcceptedTypes::Explicit(_))
    }
}

impl SourceHandle {
    /// `{output_type} ∪ base_classes`, in that order, without duplicates.
    pub fn offered_types(&self) -> Vec<&str> {
        let mut types = vec![self.output_type.as_str()];
        for base in &self.base_classes {
            if !types.contains(&base.as_str()) {
                types.push(base);
            }
        }
        types
    }

    pub fn to_handle_string(&self) -> String {
        encode(self)
    }

    pub fn parse_handle_string(s: &str) -> Result<Self, HandleError> {
        decode(s)
    }
}

impl TargetHandle {
    pub fn to_handle_string(&self) -> String {
        encode(self)
    }

    pub fn parse_handle_string(s: &str) -> Result<Self, HandleError> {
        decode(s)
    }
}

/// Source handle in the editor backend's key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSourceHandle {
    #[serde(rename = "dataType")]
    pub data_type: String,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// All candidate types of the output, not only the selected one.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub output_types: Vec<String>,
}

/// Target handle in the editor backend's key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorTargetHandle {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub id: String,
    #[serde(rename = "inputTypes", default, deserialize_with = "null_as_empty")]
    pub input_types: Vec<String>,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// A source handle as stored on an edge, in either form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSourceHandle {
    Structured(SourceHandle),
    Editor(EditorSourceHandle),
}

impl StoredSourceHandle {
    pub fn parse(s: &str) -> Result<Self, HandleError> {
        let value: Value = decode(s)?;
        let parsed = if value.get("dataType").is_some() {
            serde_json::from_value(value).map(StoredSourceHandle::Editor)
        } else {
            serde_json::from_value(value).map(StoredSourceHandle::Structured)
        };
        parsed.map_err(|e| HandleError::Malformed(format!("{}: {}", s, e)))
    }

    /// Whether recomputing this handle's form from `node` gives it back.
    pub fn is_current(&self, node: &FlowNode) -> bool {
        match self {
            StoredSourceHandle::Structured(stored) => {
                source_handle(node).is_ok_and(|current| current == *stored)
            }
            StoredSourceHandle::Editor(stored) => {
                editor_source_handle(node, stored.name.as_deref()).is_ok_and(|current| current == *stored)
            }
        }
    }
}

/// A target handle as stored on an edge, in either form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredTargetHandle {
    Structured(TargetHandle),
    Editor(EditorTargetHandle),
}

impl StoredTargetHandle {
    /// The editor form always writes both `inputTypes` and `type`; the
    /// structured form writes exactly one of them.
    pub fn parse(s: &str) -> Result<Self, HandleError> {
        let value: Value = decode(s)?;
        let parsed = if value.get("inputTypes").is_some() && value.get("type").is_some() {
            serde_json::from_value(value).map(StoredTargetHandle::Editor)
        } else {
            serde_json::from_value(value).map(StoredTargetHandle::Structured)
        };
        parsed.map_err(|e| HandleError::Malformed(format!("{}: {}", s, e)))
    }

    pub fn field_name(&self) -> &str {
        match self {
            StoredTargetHandle::Structured(h) => &h.field_name,
            StoredTargetHandle::Editor(h) => &h.field_name,
        }
    }

    pub fn is_current(&self, node: &FlowNode) -> bool {
        match self {
            StoredTargetHandle::Structured(stored) => {
                target_handle(node, &stored.field_name).is_ok_and(|current| current == *stored)
            }
            StoredTargetHandle::Editor(stored) => {
                editor_target_handle(node, &stored.field_name).is_ok_and(|current| current == *stored)
            }
        }
    }
}

/// The output a node currently exposes: `selected_output` if set, else the
/// first declared output. `None` when the node declares no outputs.
pub fn effective_output(node: &FlowNode) -> Result<Option<&OutputSpec>, HandleError> {
    let def = node.definition();
    match &node.data.selected_output {
        Some(name) if !def.outputs.is_empty() => def
            .output(name)
            .map(Some)
            .ok_or_else(|| HandleError::MissingOutput {
                node_id: node.id.clone(),
                output: name.clone(),
            }),
        _ => Ok(def.outputs.first()),
    }
}

/// Recompute the source handle from the node's current state.
pub fn source_handle(node: &FlowNode) -> Result<SourceHandle, HandleError> {
    let output = effective_output(node)?;
    let output_type = output
        .and_then(|o| o.selected_type())
        .unwrap_or(node.component_type())
        .to_string();
    Ok(SourceHandle {
        output_type,
        id: node.id.clone(),
        name: output.map(|o| o.name.clone()),
        base_classes: node.definition().base_classes.to_vec(),
    })
}

/// Editor-form source handle for the node's exposed output. A node without
/// declared outputs has nothing to recompute the name from, so `name` is
/// carried over.
pub fn editor_source_handle(node: &FlowNode, name: Option<&str>) -> Result<EditorSourceHandle, HandleError> {
    let output = effective_output(node)?;
    Ok(EditorSourceHandle {
        data_type: node.component_type().to_string(),
        id: node.id.clone(),
        name: output.map(|o| o.name.as_str()).or(name).map(String::from),
        output_types: output.map(|o| o.types.to_vec()).unwrap_or_default(),
    })
}

/// Editor-form target handle for `field`.
pub fn editor_target_handle(node: &FlowNode, field: &str) -> Result<EditorTargetHandle, HandleError> {
    let spec = node
        .definition()
        .field(field)
        .ok_or_else(|| HandleError::MissingField {
            node_id: node.id.clone(),
            field: field.to_string(),
        })?;
    Ok(EditorTargetHandle {
        field_name: field.to_string(),
        id: node.id.clone(),
        input_types: spec.input_types.to_vec(),
        field_type: spec.field_type.clone(),
    })
}

/// Recompute the target handle for `field` from the node's current template.
pub fn target_handle(node: &FlowNode, field: &str) -> Result<TargetHandle, HandleError> {
    let spec = node
        .definition()
        .field(field)
        .ok_or_else(|| HandleError::MissingField {
            node_id: node.id.clone(),
            field: field.to_string(),
        })?;
    Ok(TargetHandle {
        accepted: spec.accepted(),
        field_name: field.to_string(),
        id: node.id.clone(),
    })
}

fn encode<T: Serialize>(handle: &T) -> String {
    // Handles are plain strings and lists; serialization cannot fail.
    serde_json::to_string(handle)
        .unwrap_or_default()
        .replace('"', &QUOTE_SUBSTITUTE.to_string())
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn decode<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, HandleError> {
    let json = s.replace(QUOTE_SUBSTITUTE, "\"");
    serde_json::from_str(&json).map_err(|e| HandleError::Malformed(format!("{}: {}", s, e)))
}
