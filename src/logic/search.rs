use crate::model::Combination;

/// Above this many combinations nothing is listed until search terms are given
pub const COMBINATION_LIMIT: usize = 200;

/// Combinations to list for the given search terms.
///
/// A combination matches when its display string (`"k: v, k2: v2"`)
/// contains every term. Matching is case sensitive.
pub fn visible_combinations<'a, S: AsRef<str>>(
    combinations: &'a [Combination],
    terms: &[S],
) -> Vec<&'a Combination> {
    if terms.is_empty() {
        if combinations.len() > COMBINATION_LIMIT {
            return Vec::new();
        }
        return combinations.iter().collect();
    }

    combinations
        .iter()
        .filter(|combination| {
            let text = combination.display_string();
            terms.iter().all(|term| text.contains(term.as_ref()))
        })
        .collect()
}
