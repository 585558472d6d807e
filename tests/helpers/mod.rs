use std::collections::BTreeMap;

use flowgraph::handle::{source_handle, target_handle};
use flowgraph::parse::*;

// =============================================================================
// Field / definition builders
// =============================================================================

pub fn field(ty: &str) -> FieldSpec {
    FieldSpec::new(ty)
}

pub fn field_accepting(ty: &str, input_types: &[&str]) -> FieldSpec {
    let mut spec = FieldSpec::new(ty);
    spec.input_types = strings(input_types).into();
    spec
}

pub fn required(mut spec: FieldSpec) -> FieldSpec {
    spec.required = Some(true);
    spec
}

pub fn hidden(mut spec: FieldSpec) -> FieldSpec {
    spec.show = Some(false);
    spec
}

pub fn definition(base_classes: &[&str], fields: Vec<(&str, FieldSpec)>) -> ComponentDefinition {
    ComponentDefinition {
        template: fields.into_iter().collect(),
        base_classes: strings(base_classes).into(),
        ..Default::default()
    }
}

pub fn with_outputs(mut def: ComponentDefinition, outputs: &[(&str, &[&str])]) -> ComponentDefinition {
    def.outputs = outputs
        .iter()
        .map(|(name, types)| OutputSpec::new(*name, strings(types)))
        .collect();
    def
}

pub fn named(mut def: ComponentDefinition, display_name: &str) -> ComponentDefinition {
    def.display_name = Some(display_name.into());
    def
}

// =============================================================================
// Node builders
// =============================================================================

pub fn node(id: &str, component_type: &str, def: ComponentDefinition) -> FlowNode {
    FlowNode::new(id, component_type, def)
}

/// `TextInput`, base_classes = ["Message"], no declared outputs.
pub fn text_input(id: &str) -> FlowNode {
    node(id, "TextInput", definition(&["Message"], vec![("input_value", field("str"))]))
}

/// `Prompt` with a `prompt` field accepting Message and str.
pub fn prompt(id: &str) -> FlowNode {
    node(
        id,
        "Prompt",
        with_outputs(
            definition(&["Message"], vec![("prompt", field_accepting("str", &["Message", "str"]))]),
            &[("prompt", &["Message"])],
        ),
    )
}

/// A component with one declared output of the given type and no inputs.
pub fn producer(id: &str, component_type: &str, output: &str, output_type: &str) -> FlowNode {
    node(
        id,
        component_type,
        with_outputs(definition(&[output_type], vec![]), &[(output, &[output_type])]),
    )
}

/// A component with a single `input_value` field accepting the given types.
pub fn consumer(id: &str, component_type: &str, accepts: &[&str]) -> FlowNode {
    node(
        id,
        component_type,
        definition(&["Message"], vec![("input_value", field_accepting("str", accepts))]),
    )
}

// =============================================================================
// Edge / flow builders
// =============================================================================

/// An edge whose handles match the current state of both endpoints.
pub fn edge(source: &FlowNode, target: &FlowNode, field: &str) -> FlowEdge {
    FlowEdge {
        id: format!("{}->{}.{}", source.id, target.id, field),
        source: source.id.clone(),
        target: target.id.clone(),
        source_handle: source_handle(source).unwrap().to_handle_string(),
        target_handle: target_handle(target, field).unwrap().to_handle_string(),
        extra: Default::default(),
    }
}

pub fn flow(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Flow {
    Flow::new(nodes, edges)
}

/// A → B.prompt, the canonical TextInput-into-Prompt wiring.
pub fn text_into_prompt() -> Flow {
    let a = text_input("A");
    let b = prompt("B");
    let e = edge(&a, &b, "prompt");
    flow(vec![a, b], vec![e])
}

// =============================================================================
// Catalog builders
// =============================================================================

pub fn catalog(categories: Vec<(&str, Vec<(&str, ComponentDefinition)>)>) -> Catalog {
    let mut map = BTreeMap::new();
    for (category, members) in categories {
        let members: BTreeMap<String, ComponentDefinition> = members
            .into_iter()
            .map(|(name, def)| (name.to_string(), def))
            .collect();
        map.insert(category.to_string(), members);
    }
    Catalog::from_categories(map).expect("catalog builder must not declare duplicates")
}

pub fn fixture_catalog() -> Catalog {
    Catalog::from_json(include_str!("../fixtures/catalog.json")).expect("fixture catalog parses")
}

pub fn fixture_flow() -> Flow {
    parse(include_str!("../fixtures/chat_flow.json")).expect("fixture flow parses")
}

/// Chat in to chat out, saved with editor-form handles, plus a note.
pub fn editor_flow() -> Flow {
    parse(include_str!("../fixtures/editor_flow.json")).expect("editor flow parses")
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
