//! Type compatibility between ports.
//!
//! One rule decides every pairing: a producing side offering a type set can
//! feed a consuming side accepting a type set iff the two share a type, where
//! scalar types only count when the consuming side lists them explicitly.

pub mod resolver;

pub use resolver::{CategoryMatch, CompatibilityIndex, Coverage, TypeCompat, resolve_compatible};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::handle::{AcceptedTypes, SourceHandle, TargetHandle};

/// Which side of the dragged port the caller is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Dragging from an input: find components that can feed it.
    Left,
    /// Dragging from an output: find components that can consume it.
    Right,
}

/// The type set of the port being dragged from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeQuery {
    types: Vec<String>,
    explicit: bool,
}

impl TypeQuery {
    /// Build from a newline-delimited list. Blank lines and duplicates are dropped.
    pub fn parse(s: &str) -> Self {
        let mut types: Vec<String> = Vec::new();
        for line in s.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !types.iter().any(|t| t == line) {
                types.push(line.to_string());
            }
        }
        TypeQuery {
            types,
            explicit: false,
        }
    }

    /// Query for targets of an output port.
    pub fn from_source(handle: &SourceHandle) -> Self {
        TypeQuery {
            types: handle.offered_types().into_iter().map(String::from).collect(),
            explicit: false,
        }
    }

    /// Query for sources of an input port. Keeps the `input_types` opt-in.
    pub fn from_target(handle: &TargetHandle) -> Self {
        TypeQuery {
            types: handle.accepted.types().to_vec(),
            explicit: handle.accepted.is_explicit(),
        }
    }

    /// Mark the query as an explicit `input_types` list.
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

pub fn port_types_match(
    offered: &[&str],
    accepted: &[String],
    explicit: bool,
    config: &EngineConfig,
) -> bool {
    accepted
        .iter()
        .any(|t| offered.contains(&t.as_str()) && (explicit || !config.is_scalar(t)))
}

pub fn types_match(offered: &[&str], accepted: &AcceptedTypes, config: &EngineConfig) -> bool {
    port_types_match(offered, accepted.types(), accepted.is_explicit(), config)
}

/// Can `source` feed `target`?
pub fn handles_compatible(source: &SourceHandle, target: &TargetHandle, config: &EngineConfig) -> bool {
    types_match(&source.offered_types(), &target.accepted, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_dedups() {
        let q = TypeQuery::parse("Message\n\n Data \nMessage\n");
        assert_eq!(q.types(), &["Message".to_string(), "Data".to_string()]);
        assert!(!q.is_explicit());
    }

    #[test]
    fn scalars_need_explicit_opt_in() {
        let config = EngineConfig::default();
        let offered = ["int", "Message"];
        assert!(!types_match(&offered, &AcceptedTypes::Declared("int".into()), &config));
        assert!(types_match(
            &offered,
            &AcceptedTypes::Explicit(vec!["int".into()]),
            &config
        ));
        assert!(types_match(&offered, &AcceptedTypes::Declared("Message".into()), &config));
    }

    #[test]
    fn disjoint_sets_do_not_match() {
        let config = EngineConfig::default();
        assert!(!types_match(
            &["Embeddings"],
            &AcceptedTypes::Explicit(vec!["Message".into(), "str".into()]),
            &config
        ));
    }
}
