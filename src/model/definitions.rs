use crate::model::VariableSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDefinition {
    pub id: serde_json::Value,
    #[serde(default)]
    pub order: i64,
    pub name: String,
}

/// Catalog of variables and values offered by the selection widgets.
/// Both maps are keyed by the backend's variable id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationDefinitions {
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDefinition>,
    #[serde(default)]
    pub values: BTreeMap<String, Vec<ValueDefinition>>,
}

impl VariationDefinitions {
    /// Variables by `order`, each with its values by `order`
    pub fn ordered(&self) -> Vec<(&VariableDefinition, Vec<&ValueDefinition>)> {
        let mut variables: Vec<_> = self
            .variables
            .iter()
            .map(|(id, variable)| {
                let mut values: Vec<&ValueDefinition> = self
                    .values
                    .get(id)
                    .map(|values| values.iter().collect())
                    .unwrap_or_default();
                values.sort_by_key(|value| value.order);
                (variable, values)
            })
            .collect();
        variables.sort_by_key(|(variable, _)| variable.order);
        variables
    }

    /// Names of catalog variables the given set does not use yet
    pub fn available_variables(&self, used: &VariableSet) -> Vec<&str> {
        self.ordered()
            .into_iter()
            .map(|(variable, _)| variable.name.as_str())
            .filter(|name| !used.contains(name))
            .collect()
    }

    /// Catalog values of a variable, looked up by name
    pub fn values_for(&self, variable_name: &str) -> Vec<&str> {
        self.ordered()
            .into_iter()
            .find(|(variable, _)| variable.name == variable_name)
            .map(|(_, values)| values.into_iter().map(|v| v.name.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> VariationDefinitions {
        serde_json::from_str(
            r#"{
                "variables": {
                    "4": {"name": "Color", "order": 2},
                    "7": {"name": "Size", "order": 1}
                },
                "values": {
                    "4": [
                        {"id": 10, "order": 1, "name": "Red"},
                        {"id": 9, "order": 0, "name": "Blue"}
                    ],
                    "7": [{"id": 21, "order": 0, "name": "S"}]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ordered_catalog() {
        let catalog = catalog();
        let ordered = catalog.ordered();
        assert_eq!(ordered[0].0.name, "Size");
        assert_eq!(ordered[1].0.name, "Color");
        assert_eq!(catalog.values_for("Color"), vec!["Blue", "Red"]);
        assert!(catalog.values_for("Material").is_empty());
    }

    #[test]
    fn test_available_variables_excludes_used() {
        let used = VariableSet::from_entries([("Size", vec!["S"])]);
        assert_eq!(catalog().available_variables(&used), vec!["Color"]);
    }
}
