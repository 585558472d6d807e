//! Compatibility resolver: which catalog families can connect to a dragged port.
//!
//! Each distinct component type is evaluated once per query. Types placed in
//! the live flow are evaluated from their (possibly edited) instance first,
//! so the catalog copy of a type already seen on the canvas is ignored.

use std::collections::HashMap;

use serde::Serialize;

use super::{Direction, TypeQuery, port_types_match};
use crate::config::EngineConfig;
use crate::handle::source_handle;
use crate::parse::catalog::Catalog;
use crate::parse::types::{ComponentDefinition, Flow, FlowNode};

/// Memoized answer for one component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeCompat {
    /// A shown template field accepts the query.
    pub in_template: bool,
    /// The component's output offers the query.
    pub in_base_classes: bool,
}

impl TypeCompat {
    pub fn matches(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.in_base_classes,
            Direction::Right => self.in_template,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "types", rename_all = "lowercase")]
pub enum Coverage {
    /// Every member of the category is compatible.
    Full,
    /// Only these members are compatible.
    Partial(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMatch {
    pub category: String,
    pub coverage: Coverage,
    /// Member count of the category, for "N of M" rendering.
    pub total: usize,
    pub display_names: Vec<String>,
}

impl CategoryMatch {
    pub fn is_full(&self) -> bool {
        matches!(self.coverage, Coverage::Full)
    }

    pub fn compatible_count(&self) -> usize {
        match &self.coverage {
            Coverage::Full => self.total,
            Coverage::Partial(types) => types.len(),
        }
    }

    /// Palette wire form: empty for a full category, else newline-delimited types.
    pub fn types_field(&self) -> String {
        match &self.coverage {
            Coverage::Full => String::new(),
            Coverage::Partial(types) => types.join("\n"),
        }
    }
}

/// Per-query memo of type compatibility over the flow and the catalog.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityIndex {
    checked: HashMap<String, TypeCompat>,
}

impl CompatibilityIndex {
    pub fn build(
        query: &TypeQuery,
        catalog: &Catalog,
        flow: Option<&Flow>,
        config: &EngineConfig,
    ) -> Self {
        let mut index = CompatibilityIndex::default();

        if let Some(flow) = flow {
            for node in flow.nodes.iter().filter(|n| !n.is_group()) {
                if index.checked.contains_key(node.component_type()) {
                    continue;
                }
                let compat = check_node(node, query, config);
                index.checked.insert(node.component_type().to_string(), compat);
            }
        }

        for (_, members) in catalog.categories() {
            for (component_type, def) in members {
                if index.checked.contains_key(component_type) {
                    continue;
                }
                let compat = check_definition(component_type, def, query, config);
                index.checked.insert(component_type.clone(), compat);
            }
        }

        tracing::debug!(
            query = ?query.types(),
            evaluated = index.checked.len(),
            "built compatibility index"
        );
        index
    }

    pub fn lookup(&self, component_type: &str) -> Option<TypeCompat> {
        self.checked.get(component_type).copied()
    }

    /// Number of distinct component types evaluated.
    pub fn evaluated(&self) -> usize {
        self.checked.len()
    }

    /// Types bucketed as valid sources.
    pub fn valid_sources(&self) -> Vec<&str> {
        self.bucket(Direction::Left)
    }

    /// Types bucketed as valid targets.
    pub fn valid_targets(&self) -> Vec<&str> {
        self.bucket(Direction::Right)
    }

    fn bucket(&self, direction: Direction) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .checked
            .iter()
            .filter(|(_, c)| c.matches(direction))
            .map(|(t, _)| t.as_str())
            .collect();
        types.sort_unstable();
        types
    }

    pub fn categories(&self, direction: Direction, catalog: &Catalog) -> Vec<CategoryMatch> {
        let mut result = Vec::new();

        for (category, members) in catalog.categories() {
            let mut compatible = Vec::new();
            let mut display_names = Vec::new();
            for (component_type, def) in members {
                let hit = self
                    .lookup(component_type)
                    .is_some_and(|c| c.matches(direction));
                if hit {
                    compatible.push(component_type.clone());
                    display_names.push(def.display_name_or(component_type).to_string());
                }
            }

            if compatible.is_empty() {
                continue;
            }

            let total = members.len();
            let coverage = if compatible.len() == total {
                Coverage::Full
            } else {
                Coverage::Partial(compatible)
            };
            result.push(CategoryMatch {
                category: category.to_string(),
                coverage,
                total,
                display_names,
            });
        }

        result
    }
}

/// Resolve, per catalog category, the component types compatible with `query`.
pub fn resolve_compatible(
    query: &TypeQuery,
    direction: Direction,
    catalog: &Catalog,
    flow: Option<&Flow>,
    config: &EngineConfig,
) -> Vec<CategoryMatch> {
    CompatibilityIndex::build(query, catalog, flow, config).categories(direction, catalog)
}

fn check_node(node: &FlowNode, query: &TypeQuery, config: &EngineConfig) -> TypeCompat {
    let in_base_classes = match source_handle(node) {
        Ok(handle) => offers(&handle.offered_types(), query, config),
        Err(_) => false,
    };
    TypeCompat {
        in_template: template_accepts(node.definition(), query, config),
        in_base_classes,
    }
}

fn check_definition(
    component_type: &str,
    def: &ComponentDefinition,
    query: &TypeQuery,
    config: &EngineConfig,
) -> TypeCompat {
    let output_type = def
        .outputs
        .first()
        .and_then(|o| o.selected_type())
        .unwrap_or(component_type);
    let mut offered = vec![output_type];
    offered.extend(def.base_classes.iter().map(String::as_str));

    TypeCompat {
        in_template: template_accepts(def, query, config),
        in_base_classes: offers(&offered, query, config),
    }
}

fn offers(offered: &[&str], query: &TypeQuery, config: &EngineConfig) -> bool {
    port_types_match(offered, query.types(), query.is_explicit(), config)
}

fn template_accepts(def: &ComponentDefinition, query: &TypeQuery, config: &EngineConfig) -> bool {
    let offered: Vec<&str> = query.types().iter().map(String::as_str).collect();
    def.template
        .iter()
        .filter(|(_, field)| field.is_shown())
        .any(|(_, field)| {
            let accepted = field.accepted();
            port_types_match(&offered, accepted.types(), accepted.is_explicit(), config)
        })
}
