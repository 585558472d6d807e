//! Serde types for the flow document and component definitions.
//!
//! These mirror the JSON the canvas persists. Keys the engine does not
//! interpret are kept in `extra` so a parsed document serializes back
//! without losing anything.

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::handle::AcceptedTypes;

// =============================================================================
// FLOW DOCUMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flow {
    pub fn new(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        Flow {
            nodes,
            edges,
            extra: Map::new(),
        }
    }

    /// Linear lookup. Use `FlowGraph` when doing repeated lookups.
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Empty while the canvas has not assigned a handle yet.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_handle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_handle: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    pub data: NodeData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(rename = "type")]
    pub component_type: String,
    pub node: ComponentDefinition,
    /// Output currently exposed on the canvas. Defaults to the first output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_output: Option<String>,
    /// Wraps a nested sub-flow; its template is a flattened view and is
    /// not scanned by the compatibility resolver.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_group: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>, definition: ComponentDefinition) -> Self {
        FlowNode {
            id: id.into(),
            data: NodeData {
                component_type: component_type.into(),
                node: definition,
                selected_output: None,
                is_group: false,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    pub fn component_type(&self) -> &str {
        &self.data.component_type
    }

    pub fn definition(&self) -> &ComponentDefinition {
        &self.data.node
    }

    pub fn definition_mut(&mut self) -> &mut ComponentDefinition {
        &mut self.data.node
    }

    pub fn is_group(&self) -> bool {
        self.data.is_group
    }

    /// Free-text annotation on the canvas; carries no ports.
    pub fn is_note(&self) -> bool {
        self.extra.get("type").and_then(Value::as_str) == Some("noteNode")
    }

    pub fn display_name(&self) -> &str {
        self.data
            .node
            .display_name
            .as_deref()
            .unwrap_or(&self.data.component_type)
    }
}

// =============================================================================
// COMPONENT DEFINITION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub template: Template,
    #[serde(default, skip_serializing_if = "JsonList::is_unset")]
    pub base_classes: JsonList<String>,
    #[serde(default, skip_serializing_if = "JsonList::is_unset")]
    pub outputs: JsonList<OutputSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ComponentDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.template.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn display_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.display_name.as_deref().unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "JsonList::is_unset")]
    pub input_types: JsonList<String>,
    /// Absent means not required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Absent means shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    /// `Some(Value::Null)` for an explicit `null`.
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldSpec {
    pub fn new(field_type: impl Into<String>) -> Self {
        FieldSpec {
            field_type: field_type.into(),
            input_types: JsonList::default(),
            required: None,
            show: None,
            value: None,
            display_name: None,
            extra: Map::new(),
        }
    }

    /// The type set this field accepts: `input_types` when declared, else the bare type.
    pub fn accepted(&self) -> AcceptedTypes {
        if self.input_types.is_empty() {
            AcceptedTypes::Declared(self.field_type.clone())
        } else {
            AcceptedTypes::Explicit(self.input_types.to_vec())
        }
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    pub fn is_shown(&self) -> bool {
        self.show.unwrap_or(true)
    }

    pub fn has_value(&self) -> bool {
        match &self.value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "JsonList::is_unset")]
    pub types: JsonList<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutputSpec {
    pub fn new(name: impl Into<String>, types: Vec<String>) -> Self {
        let selected = types.first().cloned();
        OutputSpec {
            name: name.into(),
            display_name: None,
            types: types.into(),
            selected,
            extra: Map::new(),
        }
    }

    /// The selected candidate type; falls back to the first candidate when
    /// `selected` is absent or not one of `types`.
    pub fn selected_type(&self) -> Option<&str> {
        match &self.selected {
            Some(sel) if self.types.iter().any(|t| t == sel) => Some(sel.as_str()),
            _ => self.types.first().map(String::as_str),
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

// =============================================================================
// TEMPLATE: ordered field map
// =============================================================================

/// Ordered mapping of field name to field spec.
///
/// Entries whose value is not a field (the `_type` marker the catalog emits,
/// for instance) are kept verbatim for serialization but never yielded as
/// fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    entries: Vec<(String, TemplateEntry)>,
}

#[derive(Debug, Clone, PartialEq)]
enum TemplateEntry {
    Field(FieldSpec),
    Raw(Value),
}

impl Template {
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldSpec> {
        self.entries.iter_mut().find_map(|(n, entry)| match entry {
            TemplateEntry::Field(f) if n == name => Some(f),
            _ => None,
        })
    }

    /// Replace an existing entry in place, or append a new field.
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, entry)) => *entry = TemplateEntry::Field(spec),
            None => self.entries.push((name, TemplateEntry::Field(spec))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.entries.iter().filter_map(|(n, entry)| match entry {
            TemplateEntry::Field(f) => Some((n.as_str(), f)),
            TemplateEntry::Raw(_) => None,
        })
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<(S, FieldSpec)> for Template {
    fn from_iter<I: IntoIterator<Item = (S, FieldSpec)>>(iter: I) -> Self {
        let mut template = Template::default();
        for (name, spec) in iter {
            template.insert(name, spec);
        }
        template
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            match entry {
                TemplateEntry::Field(spec) => map.serialize_entry(name, spec)?,
                TemplateEntry::Raw(raw) => map.serialize_entry(name, raw)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TemplateVisitor;

        impl<'de> Visitor<'de> for TemplateVisitor {
            type Value = Template;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of template fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Template, A::Error> {
                let mut template = Template::default();
                while let Some((name, raw)) = access.next_entry::<String, Value>()? {
                    let entry = if raw.is_object() {
                        match serde_json::from_value::<FieldSpec>(raw.clone()) {
                            Ok(spec) => TemplateEntry::Field(spec),
                            Err(e) => {
                                tracing::debug!(field = %name, error = %e, "keeping malformed template field as raw");
                                TemplateEntry::Raw(raw)
                            }
                        }
                    } else {
                        TemplateEntry::Raw(raw)
                    };
                    template.entries.push((name, entry));
                }
                Ok(template)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Template, E> {
                Ok(Template::default())
            }
        }

        deserializer.deserialize_any(TemplateVisitor)
    }
}

// =============================================================================
// JSON LIST: a list that remembers how the document wrote it
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ListShape {
    #[default]
    Absent,
    Null,
    Present,
}

/// A list-valued key that serializes back the way it was read: absent, `null`,
/// or a list. Once it holds items it is always written as a list.
///
/// Equality compares items only.
#[derive(Debug, Clone)]
pub struct JsonList<T> {
    items: Vec<T>,
    shape: ListShape,
}

impl<T> JsonList<T> {
    /// Absent from the document and still empty.
    pub fn is_unset(&self) -> bool {
        self.shape == ListShape::Absent && self.items.is_empty()
    }
}

impl<T> Default for JsonList<T> {
    fn default() -> Self {
        JsonList {
            items: Vec::new(),
            shape: ListShape::Absent,
        }
    }
}

impl<T> From<Vec<T>> for JsonList<T> {
    fn from(items: Vec<T>) -> Self {
        JsonList {
            items,
            shape: ListShape::Present,
        }
    }
}

impl<T> FromIterator<T> for JsonList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Vec::from_iter(iter).into()
    }
}

impl<T> Deref for JsonList<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.items
    }
}

impl<T> DerefMut for JsonList<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }
}

impl<T: PartialEq> PartialEq for JsonList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for JsonList<T> {}

impl<'a, T> IntoIterator for &'a JsonList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for JsonList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.items.is_empty() && self.shape == ListShape::Null {
            serializer.serialize_none()
        } else {
            self.items.serialize(serializer)
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for JsonList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Vec<T>>::deserialize(deserializer)? {
            Some(items) => items.into(),
            None => JsonList {
                items: Vec::new(),
                shape: ListShape::Null,
            },
        })
    }
}

fn keep_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_field_type() -> String {
    "str".into()
}

fn is_false(b: &bool) -> bool {
    !*b
}
