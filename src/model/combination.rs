use itertools::Itertools;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// One selected value per variable.
///
/// Keys keep their insertion order for display and serialization, but
/// equality and hashing compare the set of (variable, value) pairs only.
#[derive(Debug, Clone, Default)]
pub struct Combination {
    pairs: Vec<(String, String)>,
}

impl Combination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut combination = Self::new();
        for (variable, value) in pairs {
            combination.insert(variable, value);
        }
        combination
    }

    /// Set the value of a variable, keeping its position if already present
    pub fn insert(&mut self, variable: impl Into<String>, value: impl Into<String>) {
        let variable = variable.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(name, _)| *name == variable) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((variable, value)),
        }
    }

    /// A new combination extended with one more assignment
    pub fn with(&self, variable: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.insert(variable, value);
        next
    }

    pub fn get(&self, variable: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    /// Pairs sorted by variable name; the basis for equality and hashing
    pub fn canonical_pairs(&self) -> Vec<(&str, &str)> {
        self.iter().sorted_unstable().collect()
    }

    /// `"Size: S, Color: Red"`
    pub fn display_string(&self) -> String {
        self.iter().map(|(k, v)| format!("{}: {}", k, v)).join(", ")
    }

    /// SKU suffix for this combination: `size-s-color-dark-red`
    pub fn sku_part(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}-{}", k, v))
            .join("-")
            .to_lowercase()
            .split_whitespace()
            .join("-")
    }
}

impl PartialEq for Combination {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.canonical_pairs() == other.canonical_pairs()
    }
}

impl Eq for Combination {}

impl Hash for Combination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_pairs().hash(state);
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl Serialize for Combination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (variable, value) in &self.pairs {
            map.serialize_entry(variable, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Combination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CombinationVisitor;

        impl<'de> Visitor<'de> for CombinationVisitor {
            type Value = Combination;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of variable names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Combination, A::Error> {
                let mut combination = Combination::new();
                while let Some((variable, value)) = access.next_entry::<String, String>()? {
                    combination.insert(variable, value);
                }
                Ok(combination)
            }
        }

        deserializer.deserialize_map(CombinationVisitor)
    }
}

/// A named axis of variation and its admissible values, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub values: Vec<String>,
}

/// Ordered mapping of variable name to ordered value list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSet {
    variables: Vec<Variable>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, N, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<V>)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (name, values) in entries {
            set.insert(name, values.into_iter().map(Into::into).collect());
        }
        set
    }

    /// Collect variables and values in first-seen order
    pub fn from_combinations<'a, I>(combinations: I) -> Self
    where
        I: IntoIterator<Item = &'a Combination>,
    {
        let mut set = Self::new();
        for combination in combinations {
            for (variable, value) in combination.iter() {
                match set.variables.iter_mut().find(|v| v.name == variable) {
                    Some(existing) => {
                        if !existing.values.iter().any(|v| v == value) {
                            existing.values.push(value.to_string());
                        }
                    }
                    None => set.variables.push(Variable {
                        name: variable.to_string(),
                        values: vec![value.to_string()],
                    }),
                }
            }
        }
        set
    }

    /// Replace the values of a variable, or append it at the end
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(existing) => existing.values = values,
            None => self.variables.push(Variable { name, values }),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.variables.len();
        self.variables.retain(|v| v.name != name);
        self.variables.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Some variable has no values yet, so no combination can be formed
    pub fn is_incomplete(&self) -> bool {
        self.variables.iter().any(|v| v.values.is_empty())
    }

    /// Number of combinations the cross product yields
    pub fn combination_count(&self) -> usize {
        if self.variables.is_empty() {
            return 0;
        }
        self.variables.iter().map(|v| v.values.len()).product()
    }
}

impl Serialize for VariableSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.variables.len()))?;
        for variable in &self.variables {
            map.serialize_entry(&variable.name, &variable.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VariableSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VariableSetVisitor;

        impl<'de> Visitor<'de> for VariableSetVisitor {
            type Value = VariableSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of variable names to value lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<VariableSet, A::Error> {
                let mut set = VariableSet::new();
                while let Some((name, values)) = access.next_entry::<String, Vec<String>>()? {
                    set.insert(name, values);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(VariableSetVisitor)
    }
}
