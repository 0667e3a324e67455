use crate::model::{Combination, Variable, VariableSet};

/// Every combination of the set's values.
///
/// Variables vary slowest-first in set order, values in list order, so
/// `{Size: [S, M], Color: [Red]}` yields `S/Red, M/Red`. An empty set, or a
/// set where some variable has no values, yields nothing.
pub fn generate(variables: &VariableSet) -> Vec<Combination> {
    if variables.is_empty() || variables.is_incomplete() {
        return Vec::new();
    }
    combine(variables.variables(), &Combination::new())
}

fn combine(variables: &[Variable], prefix: &Combination) -> Vec<Combination> {
    let Some((variable, rest)) = variables.split_first() else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for value in &variable.values {
        let current = prefix.with(&variable.name, value);
        if rest.is_empty() {
            results.push(current);
        } else {
            results.extend(combine(rest, &current));
        }
    }
    results
}
