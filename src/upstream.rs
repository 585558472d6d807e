//! Upstream reference collection for the `@`-reference picker.
//!
//! Walks edges backwards from a node and lists every output of every
//! transitively upstream node that can be interpolated into text.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowNode;

/// Name of the implicit output of a node that declares none.
pub const IMPLICIT_OUTPUT: &str = "output";

/// Stable per-node slugs supplied by the caller.
pub trait SlugLookup {
    fn slug(&self, node_id: &str) -> Option<String>;
}

impl SlugLookup for HashMap<String, String> {
    fn slug(&self, node_id: &str) -> Option<String> {
        self.get(node_id).cloned()
    }
}

/// Adapts a closure to `SlugLookup`.
pub struct SlugFn<F>(pub F);

impl<F> SlugLookup for SlugFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn slug(&self, node_id: &str) -> Option<String> {
        (self.0)(node_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamOutput {
    pub node_id: String,
    pub node_slug: String,
    pub output_name: String,
    pub display_name: String,
    pub output_type: String,
}

impl UpstreamOutput {
    /// `{slug}.{output}` as rendered in the picker.
    pub fn reference(&self) -> String {
        format!("{}.{}", self.node_slug, self.output_name)
    }
}

/// Distinct ids of all nodes upstream of `node_id`, nearest first (breadth
/// first over incoming edges). `node_id` itself is never included, even when
/// it sits on a cycle.
pub fn upstream_node_ids<'a>(node_id: &str, graph: &FlowGraph<'a>) -> Vec<&'a str> {
    let mut visited: HashSet<&str> = HashSet::from([node_id]);
    let mut queue: VecDeque<&str> = VecDeque::from([node_id]);
    let mut found = Vec::new();

    while let Some(current) = queue.pop_front() {
        for source in graph.predecessors(current) {
            if visited.insert(source) {
                found.push(source);
                queue.push_back(source);
            }
        }
    }

    found
}

/// Referenceable outputs of every node upstream of `node_id`.
pub fn get_upstream_outputs(
    node_id: &str,
    graph: &FlowGraph<'_>,
    slugs: &dyn SlugLookup,
    config: &EngineConfig,
) -> Vec<UpstreamOutput> {
    let mut outputs = Vec::new();

    for upstream_id in upstream_node_ids(node_id, graph) {
        let Some(node) = graph.node(upstream_id) else {
            continue;
        };
        let slug = slugs
            .slug(upstream_id)
            .unwrap_or_else(|| config.fallback_slug.clone());
        outputs.extend(referenceable_outputs(node, &slug, config));
    }

    outputs
}

fn referenceable_outputs(node: &FlowNode, slug: &str, config: &EngineConfig) -> Vec<UpstreamOutput> {
    let def = node.definition();

    if def.outputs.is_empty() {
        // Implicit single output: the component type, then its base classes.
        let resolved = std::iter::once(node.component_type())
            .chain(def.base_classes.iter().map(String::as_str))
            .find(|t| config.is_referenceable(t));
        return resolved
            .map(|ty| UpstreamOutput {
                node_id: node.id.clone(),
                node_slug: slug.to_string(),
                output_name: IMPLICIT_OUTPUT.to_string(),
                display_name: node.display_name().to_string(),
                output_type: ty.to_string(),
            })
            .into_iter()
            .collect();
    }

    def.outputs
        .iter()
        .filter_map(|output| {
            let ty = output.selected_type()?;
            if !config.is_referenceable(ty) {
                return None;
            }
            Some(UpstreamOutput {
                node_id: node.id.clone(),
                node_slug: slug.to_string(),
                output_name: output.name.clone(),
                display_name: output.display_name().to_string(),
                output_type: ty.to_string(),
            })
        })
        .collect()
}
