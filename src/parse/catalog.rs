//! Component catalog: category → component type → definition.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::types::ComponentDefinition;
use crate::error::CatalogError;

/// A validated catalog. Every component type name belongs to exactly one
/// category; construction fails otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    categories: BTreeMap<String, BTreeMap<String, ComponentDefinition>>,
    owners: HashMap<String, String>,
}

impl Catalog {
    /// Parse the catalog JSON. Entries without a `template` object, or that
    /// otherwise do not deserialize as a component definition, are skipped.
    /// Flow nodes may omit their template; catalog entries may not.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, BTreeMap<String, Value>> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let mut categories = BTreeMap::new();
        for (category, members) in raw {
            let mut defs = BTreeMap::new();
            for (component_type, value) in members {
                if !value.get("template").is_some_and(Value::is_object) {
                    tracing::warn!(%category, %component_type, "skipping catalog entry without a template");
                    continue;
                }
                match serde_json::from_value::<ComponentDefinition>(value) {
                    Ok(def) => {
                        defs.insert(component_type, def);
                    }
                    Err(e) => tracing::warn!(
                        %category,
                        %component_type,
                        error = %e,
                        "skipping malformed catalog entry"
                    ),
                }
            }
            categories.insert(category, defs);
        }

        Self::from_categories(categories)
    }

    pub fn from_categories(
        categories: BTreeMap<String, BTreeMap<String, ComponentDefinition>>,
    ) -> Result<Self, CatalogError> {
        let mut owners: HashMap<String, String> = HashMap::new();
        for (category, members) in &categories {
            for component_type in members.keys() {
                if let Some(first) = owners.get(component_type) {
                    return Err(CatalogError::DuplicateComponentType {
                        component_type: component_type.clone(),
                        first: first.clone(),
                        second: category.clone(),
                    });
                }
                owners.insert(component_type.clone(), category.clone());
            }
        }
        Ok(Catalog { categories, owners })
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, ComponentDefinition>)> {
        self.categories.iter().map(|(name, members)| (name.as_str(), members))
    }

    pub fn definition(&self, component_type: &str) -> Option<&ComponentDefinition> {
        let category = self.owners.get(component_type)?;
        self.categories.get(category)?.get(component_type)
    }

    pub fn category_of(&self, component_type: &str) -> Option<&str> {
        self.owners.get(component_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
