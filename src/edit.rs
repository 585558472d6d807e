//! Pure flow edits.
//!
//! Each edit returns a new flow; the input is never modified. Any edit that
//! touches node state runs `clean_edges` on the result, so the returned flow
//! never carries stale wiring.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EditError, HandleError};
use crate::handle::{source_handle, target_handle};
use crate::parse::graph::FlowGraph;
use crate::parse::types::{FieldSpec, Flow, FlowEdge, FlowNode};
use crate::repair::clean_edges_in_place;
use crate::validate::is_valid_connection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FlowEdit {
    AddNode {
        node: FlowNode,
    },
    RemoveNode {
        node_id: String,
    },
    /// Draw an edge from `output` of `source` (the exposed output when
    /// absent) into `field` of `target`.
    Connect {
        source: String,
        #[serde(default)]
        output: Option<String>,
        target: String,
        field: String,
    },
    RemoveEdge {
        edge_id: String,
    },
    SetInputTypes {
        node_id: String,
        field: String,
        input_types: Vec<String>,
    },
    SetFieldType {
        node_id: String,
        field: String,
        field_type: String,
    },
    SetFieldShown {
        node_id: String,
        field: String,
        show: bool,
    },
    SelectOutput {
        node_id: String,
        output: String,
    },
    SelectOutputType {
        node_id: String,
        output: String,
        output_type: String,
    },
}

/// Edge id in the canvas' format.
pub fn edge_id(source: &str, source_handle: &str, target: &str, target_handle: &str) -> String {
    format!("xy-edge__{}{}-{}{}", source, source_handle, target, target_handle)
}

pub fn apply_edit(flow: &Flow, edit: FlowEdit, config: &EngineConfig) -> Result<Flow, EditError> {
    let mut next = flow.clone();

    match edit {
        FlowEdit::AddNode { node } => {
            if next.node(&node.id).is_some() {
                return Err(EditError::DuplicateNode(node.id));
            }
            next.nodes.push(node);
            return Ok(next);
        }
        FlowEdit::RemoveNode { node_id } => {
            let before = next.nodes.len();
            next.nodes.retain(|n| n.id != node_id);
            if next.nodes.len() == before {
                return Err(EditError::UnknownNode(node_id));
            }
        }
        FlowEdit::Connect {
            source,
            output,
            target,
            field,
        } => {
            connect(&mut next, &source, output, &target, &field, config)?;
        }
        FlowEdit::RemoveEdge { edge_id } => {
            let before = next.edges.len();
            next.edges.retain(|e| e.id != edge_id);
            if next.edges.len() == before {
                return Err(EditError::UnknownEdge(edge_id));
            }
            return Ok(next);
        }
        FlowEdit::SetInputTypes {
            node_id,
            field,
            input_types,
        } => {
            field_mut(&mut next, &node_id, &field)?.input_types = input_types.into();
        }
        FlowEdit::SetFieldType {
            node_id,
            field,
            field_type,
        } => {
            field_mut(&mut next, &node_id, &field)?.field_type = field_type;
        }
        FlowEdit::SetFieldShown {
            node_id,
            field,
            show,
        } => {
            field_mut(&mut next, &node_id, &field)?.show = Some(show);
        }
        FlowEdit::SelectOutput { node_id, output } => {
            select_output(&mut next, &node_id, &output)?;
        }
        FlowEdit::SelectOutputType {
            node_id,
            output,
            output_type,
        } => {
            let node = node_mut(&mut next, &node_id)?;
            let spec = node
                .definition_mut()
                .outputs
                .iter_mut()
                .find(|o| o.name == output)
                .ok_or_else(|| HandleError::MissingOutput {
                    node_id: node_id.clone(),
                    output: output.clone(),
                })?;
            if !spec.types.iter().any(|t| *t == output_type) {
                return Err(EditError::UnknownOutputType {
                    node_id,
                    output,
                    output_type,
                });
            }
            spec.selected = Some(output_type);
        }
    }

    clean_edges_in_place(&mut next);
    Ok(next)
}

fn connect(
    flow: &mut Flow,
    source: &str,
    output: Option<String>,
    target: &str,
    field: &str,
    config: &EngineConfig,
) -> Result<(), EditError> {
    if source == target {
        return Err(EditError::SelfLoop(source.to_string()));
    }
    if flow.node(target).is_none() {
        return Err(EditError::UnknownNode(target.to_string()));
    }
    if let Some(output) = output {
        select_output(flow, source, &output)?;
    }

    let source_node = flow
        .node(source)
        .ok_or_else(|| EditError::UnknownNode(source.to_string()))?;
    let target_node = flow
        .node(target)
        .ok_or_else(|| EditError::UnknownNode(target.to_string()))?;
    let source_str = source_handle(source_node)?.to_handle_string();
    let target_str = target_handle(target_node, field)?.to_handle_string();

    let edge = FlowEdge {
        id: edge_id(source, &source_str, target, &target_str),
        source: source.to_string(),
        target: target.to_string(),
        source_handle: source_str,
        target_handle: target_str,
        extra: Default::default(),
    };

    if flow.edges.iter().any(|e| {
        e.source == edge.source
            && e.target == edge.target
            && e.source_handle == edge.source_handle
            && e.target_handle == edge.target_handle
    }) {
        return Err(EditError::DuplicateEdge {
            source_id: source.to_string(),
            target_id: target.to_string(),
        });
    }

    let graph = FlowGraph::build(flow);
    if !is_valid_connection(&edge, &graph, config) {
        return Err(EditError::Incompatible {
            source_id: source.to_string(),
            target_id: target.to_string(),
            field: field.to_string(),
        });
    }

    flow.edges.push(edge);
    Ok(())
}

fn select_output(flow: &mut Flow, node_id: &str, output: &str) -> Result<(), EditError> {
    let node = node_mut(flow, node_id)?;
    if node.definition().output(output).is_none() {
        return Err(HandleError::MissingOutput {
            node_id: node_id.to_string(),
            output: output.to_string(),
        }
        .into());
    }
    node.data.selected_output = Some(output.to_string());
    Ok(())
}

fn node_mut<'a>(flow: &'a mut Flow, node_id: &str) -> Result<&'a mut FlowNode, EditError> {
    flow.node_mut(node_id)
        .ok_or_else(|| EditError::UnknownNode(node_id.to_string()))
}

fn field_mut<'a>(flow: &'a mut Flow, node_id: &str, field: &str) -> Result<&'a mut FieldSpec, EditError> {
    let node = node_mut(flow, node_id)?;
    node.definition_mut()
        .template
        .get_mut(field)
        .ok_or_else(|| {
            HandleError::MissingField {
                node_id: node_id.to_string(),
                field: field.to_string(),
            }
            .into()
        })
}
