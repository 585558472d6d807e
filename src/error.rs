//! Error types shared across the engine.
//!
//! Reports (`FlowError`) carry a stable code and the phase that produced them.
//! Typed errors (`HandleError`, `CatalogError`, `EditError`) are returned by
//! operations that can fail; the repair, resolver and upstream passes never
//! return them and instead treat missing data as absent.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Phase {
    Parse,
    Catalog,
    Validate,
    Edit,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Catalog => write!(f, "Catalog"),
            Phase::Validate => write!(f, "Validate"),
            Phase::Edit => write!(f, "Edit"),
        }
    }
}

/// Only `Error` blocks a run; the others are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowError {
    pub code: String,
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.phase, self.code, self.message)?;
        if let Some(id) = &self.node_id {
            write!(f, " (node '{}')", id)?;
        }
        if let Some(id) = &self.edge_id {
            write!(f, " (edge '{}')", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for FlowError {}

impl FlowError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        FlowError {
            code: code.into(),
            phase: Phase::Parse,
            severity: Severity::Error,
            message: message.into(),
            node_id: None,
            edge_id: None,
        }
    }

    pub fn validate(
        code: &str,
        message: impl Into<String>,
        node_id: Option<String>,
        edge_id: Option<String>,
    ) -> Self {
        FlowError {
            code: code.into(),
            phase: Phase::Validate,
            severity: Severity::Error,
            message: message.into(),
            node_id,
            edge_id,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<CatalogError> for FlowError {
    fn from(e: CatalogError) -> Self {
        let code = match &e {
            CatalogError::Parse(_) => "C001",
            CatalogError::DuplicateComponentType { .. } => "C002",
        };
        FlowError {
            code: code.into(),
            phase: Phase::Catalog,
            severity: Severity::Error,
            message: e.to_string(),
            node_id: None,
            edge_id: None,
        }
    }
}

impl From<EditError> for FlowError {
    fn from(e: EditError) -> Self {
        let (code, node_id) = match &e {
            EditError::UnknownNode(id) => ("E001", Some(id.clone())),
            EditError::UnknownEdge(_) => ("E002", None),
            EditError::DuplicateNode(id) => ("E003", Some(id.clone())),
            EditError::DuplicateEdge { target_id, .. } => ("E004", Some(target_id.clone())),
            EditError::SelfLoop(id) => ("E005", Some(id.clone())),
            EditError::Incompatible { target_id, .. } => ("E006", Some(target_id.clone())),
            EditError::UnknownOutputType { node_id, .. } => ("E007", Some(node_id.clone())),
            EditError::Handle(HandleError::MissingField { node_id, .. })
            | EditError::Handle(HandleError::MissingOutput { node_id, .. }) => {
                ("E008", Some(node_id.clone()))
            }
            EditError::Handle(HandleError::Malformed(_)) => ("E008", None),
        };
        let edge_id = match &e {
            EditError::UnknownEdge(id) => Some(id.clone()),
            _ => None,
        };
        FlowError {
            code: code.into(),
            phase: Phase::Edit,
            severity: Severity::Error,
            message: e.to_string(),
            node_id,
            edge_id,
        }
    }
}

/// Failure to derive or decode a port handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("node '{node_id}' has no template field '{field}'")]
    MissingField { node_id: String, field: String },
    #[error("node '{node_id}' has no output '{output}'")]
    MissingOutput { node_id: String, output: String },
    #[error("malformed handle string: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog JSON: {0}")]
    Parse(String),
    #[error("component type '{component_type}' is declared in both '{first}' and '{second}'")]
    DuplicateComponentType {
        component_type: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("unknown edge '{0}'")]
    UnknownEdge(String),
    #[error("node '{0}' already exists")]
    DuplicateNode(String),
    #[error("an identical edge from '{source_id}' to '{target_id}' already exists")]
    DuplicateEdge { source_id: String, target_id: String },
    #[error("cannot connect node '{0}' to itself")]
    SelfLoop(String),
    #[error("'{source_id}' cannot feed field '{field}' of '{target_id}': no shared type")]
    Incompatible {
        source_id: String,
        target_id: String,
        field: String,
    },
    #[error("output '{output}' on node '{node_id}' has no type '{output_type}'")]
    UnknownOutputType {
        node_id: String,
        output: String,
        output_type: String,
    },
    #[error(transparent)]
    Handle(#[from] HandleError),
}
