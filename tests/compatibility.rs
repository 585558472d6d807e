//! Integration tests for the compatibility resolver.

#[allow(dead_code)]
mod helpers;

use flowgraph::compat::*;
use flowgraph::config::EngineConfig;
use flowgraph::handle::{source_handle, target_handle};
use flowgraph::parse::FlowGraph;
use flowgraph::validate::is_valid_connection;
use helpers::*;

fn find<'a>(matches: &'a [CategoryMatch], category: &str) -> Option<&'a CategoryMatch> {
    matches.iter().find(|m| m.category == category)
}

// =============================================================================
// Family completeness
// =============================================================================

#[test]
fn full_categories_for_message_targets() {
    let catalog = fixture_catalog();
    let matches = resolve_compatible(
        &TypeQuery::parse("Message"),
        Direction::Right,
        &catalog,
        None,
        &EngineConfig::default(),
    );
    let names: Vec<&str> = matches.iter().map(|m| m.category.as_str()).collect();
    assert_eq!(names, vec!["models", "outputs", "prompts"]);
    assert!(matches.iter().all(|m| m.is_full()));
    assert_eq!(
        find(&matches, "outputs").unwrap().display_names,
        vec!["Chat Output", "Text Output"]
    );
}

#[test]
fn partial_category_lists_exactly_the_compatible_members() {
    let catalog = fixture_catalog();
    let matches = resolve_compatible(
        &TypeQuery::parse("Message"),
        Direction::Left,
        &catalog,
        None,
        &EngineConfig::default(),
    );
    let models = find(&matches, "models").expect("models present");
    assert_eq!(models.coverage, Coverage::Partial(vec!["OpenAIModel".into()]));
    assert_eq!(models.total, 2);
    assert_eq!(models.types_field(), "OpenAIModel");
    assert_eq!(models.display_names, vec!["OpenAI"]);

    assert!(find(&matches, "inputs").unwrap().is_full());
    assert!(find(&matches, "embeddings").is_none());
    assert!(find(&matches, "tools").is_none());
}

#[test]
fn removing_one_member_flips_full_to_partial() {
    let compatible = || consumer("x", "X", &["Message"]).data.node;
    let full = catalog(vec![(
        "outputs",
        vec![("A", compatible()), ("B", compatible()), ("C", compatible())],
    )]);
    let config = EngineConfig::default();
    let q = TypeQuery::parse("Message");

    let matches = resolve_compatible(&q, Direction::Right, &full, None, &config);
    assert_eq!(matches[0].coverage, Coverage::Full);
    assert_eq!(matches[0].types_field(), "");

    let broken = catalog(vec![(
        "outputs",
        vec![
            ("A", compatible()),
            ("B", consumer("x", "X", &["Data"]).data.node),
            ("C", compatible()),
        ],
    )]);
    let matches = resolve_compatible(&q, Direction::Right, &broken, None, &config);
    assert_eq!(
        matches[0].coverage,
        Coverage::Partial(vec!["A".into(), "C".into()])
    );
    assert_eq!(matches[0].types_field(), "A\nC");
}

#[test]
fn category_with_no_compatible_member_is_omitted() {
    let catalog = fixture_catalog();
    let matches = resolve_compatible(
        &TypeQuery::parse("Embeddings"),
        Direction::Right,
        &catalog,
        None,
        &EngineConfig::default(),
    );
    assert!(matches.is_empty());
}

// =============================================================================
// Live flow scanning
// =============================================================================

#[test]
fn edited_instance_in_flow_overrides_catalog() {
    let catalog = fixture_catalog();
    let mut edited = catalog.definition("TextOutput").unwrap().clone();
    edited.template.get_mut("input_value").unwrap().input_types = strings(&["Data"]).into();
    let live = flow(vec![node("t1", "TextOutput", edited)], vec![]);

    let matches = resolve_compatible(
        &TypeQuery::parse("Message"),
        Direction::Right,
        &catalog,
        Some(&live),
        &EngineConfig::default(),
    );
    let outputs = find(&matches, "outputs").unwrap();
    assert_eq!(outputs.coverage, Coverage::Partial(vec!["ChatOutput".into()]));
}

#[test]
fn group_nodes_are_not_scanned() {
    let catalog = fixture_catalog();
    let mut group = consumer("g1", "Calculator", &["Message"]);
    group.data.is_group = true;
    let live = flow(vec![group], vec![]);

    let matches = resolve_compatible(
        &TypeQuery::parse("Message"),
        Direction::Right,
        &catalog,
        Some(&live),
        &EngineConfig::default(),
    );
    assert!(find(&matches, "tools").is_none());
}

#[test]
fn each_type_is_evaluated_once() {
    let catalog = fixture_catalog();
    let def = catalog.definition("TextOutput").unwrap().clone();
    let nodes = (0..50)
        .map(|i| node(&format!("t{}", i), "TextOutput", def.clone()))
        .collect();
    let live = flow(nodes, vec![]);

    let index = CompatibilityIndex::build(
        &TypeQuery::parse("Message"),
        &catalog,
        Some(&live),
        &EngineConfig::default(),
    );
    assert_eq!(index.evaluated(), catalog.len());
    assert_eq!(
        index.lookup("TextOutput"),
        Some(TypeCompat {
            in_template: true,
            in_base_classes: true,
        })
    );
}

// =============================================================================
// Scalar exclusion
// =============================================================================

#[test]
fn scalar_types_need_explicit_input_types() {
    let config = EngineConfig::default();
    let cat = catalog(vec![(
        "numbers",
        vec![
            ("IntField", definition(&["Data"], vec![("n", field("int"))])),
            (
                "IntList",
                definition(&["Data"], vec![("n", field_accepting("str", &["int"]))]),
            ),
        ],
    )]);

    let matches = resolve_compatible(&TypeQuery::parse("int"), Direction::Right, &cat, None, &config);
    assert_eq!(matches[0].coverage, Coverage::Partial(vec!["IntList".into()]));
}

// =============================================================================
// Validator / resolver agreement
// =============================================================================

#[test]
fn validator_agrees_with_singleton_resolver() {
    let config = EngineConfig::default();
    let sources = vec![
        text_input("s1"),
        producer("s2", "Embedder", "embeddings", "Embeddings"),
        producer("s3", "Counter", "count", "int"),
        producer("s4", "Loader", "data", "Data"),
    ];
    let targets = vec![
        consumer("t1", "Sink", &["Message"]),
        consumer("t2", "DataSink", &["Data", "Message"]),
        consumer("t3", "IntSink", &["int"]),
        node("t4", "Plain", definition(&[], vec![("input_value", field("int"))])),
    ];

    for s in &sources {
        for t in &targets {
            let e = edge(s, t, "input_value");
            let f = flow(vec![s.clone(), t.clone()], vec![]);
            let graph = FlowGraph::build(&f);
            let valid = is_valid_connection(&e, &graph, &config);

            let target = target_handle(t, "input_value").unwrap();
            let index = CompatibilityIndex::build(
                &TypeQuery::from_target(&target),
                &catalog(vec![("c", vec![(s.component_type(), s.definition().clone())])]),
                None,
                &config,
            );
            let resolver_says = index.lookup(s.component_type()).unwrap().in_base_classes;
            assert_eq!(valid, resolver_says, "{} -> {}", s.id, t.id);

            let source = source_handle(s).unwrap();
            let index = CompatibilityIndex::build(
                &TypeQuery::from_source(&source),
                &catalog(vec![("c", vec![(t.component_type(), t.definition().clone())])]),
                None,
                &config,
            );
            let resolver_says = index.lookup(t.component_type()).unwrap().in_template;
            assert_eq!(valid, resolver_says, "{} -> {} (targets)", s.id, t.id);
        }
    }
}
