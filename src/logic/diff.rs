use crate::config::VariationDefaults;
use crate::logic::decimal::ensure_decimal_places;
use crate::logic::generate::generate;
use crate::logic::resolve::find_product_id;
use crate::model::{Combination, CombinationRecord, IdentityMap, VariableSet};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Attributes given to every newly synthesized record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefaults {
    pub sku_prefix: String,
    pub price: Decimal,
    /// `None` when the parent does not track stock
    pub stock_count: Option<Decimal>,
    pub currency_decimal_places: u32,
    pub stock_decimal_places: u32,
}

impl RecordDefaults {
    pub fn from_defaults(defaults: &VariationDefaults) -> Self {
        Self {
            sku_prefix: defaults.default_sku.clone(),
            price: defaults.default_price,
            stock_count: defaults
                .stock_managed
                .then(|| defaults.default_stock.unwrap_or(Decimal::ZERO)),
            currency_decimal_places: defaults.currency_decimal_places,
            stock_decimal_places: defaults.stock_decimal_places,
        }
    }

    pub fn sku_for(&self, combination: &Combination) -> String {
        format!("{}-{}", self.sku_prefix, combination.sku_part())
    }

    pub fn normalized_price(&self) -> Decimal {
        ensure_decimal_places(self.price, self.currency_decimal_places)
    }

    pub fn normalized_stock_count(&self) -> Option<Decimal> {
        self.stock_count
            .map(|stock| ensure_decimal_places(stock, self.stock_decimal_places))
    }

    pub fn record_for(&self, combination: Combination) -> CombinationRecord {
        CombinationRecord {
            sku: self.sku_for(&combination),
            price: self.normalized_price(),
            stock_count: self.normalized_stock_count(),
            combination,
            errors: Default::default(),
        }
    }
}

/// Child products to create and to delete for one pending edit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingDiff {
    pub to_create: Vec<CombinationRecord>,
    pub to_delete: Vec<Combination>,
}

impl PendingDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Records for every combination of `variables` that has no product yet
pub fn compute_missing(
    variables: &VariableSet,
    identity: &IdentityMap,
    defaults: &RecordDefaults,
) -> Vec<CombinationRecord> {
    generate(variables)
        .into_iter()
        .filter(|combination| find_product_id(identity, combination).is_none())
        .map(|combination| defaults.record_for(combination))
        .collect()
}

/// Persisted combinations of `old` that the `new` set no longer produces
pub fn compute_to_delete(
    old: &VariableSet,
    new: &VariableSet,
    identity: &IdentityMap,
) -> Vec<Combination> {
    let kept: HashSet<Combination> = generate(new).into_iter().collect();
    generate(old)
        .into_iter()
        .filter(|combination| {
            find_product_id(identity, combination).is_some() && !kept.contains(combination)
        })
        .collect()
}

pub fn compute_diff(
    persisted: &VariableSet,
    pending: &VariableSet,
    identity: &IdentityMap,
    defaults: &RecordDefaults,
) -> PendingDiff {
    PendingDiff {
        to_create: compute_missing(pending, identity, defaults),
        to_delete: compute_to_delete(persisted, pending, identity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductId;

    fn defaults() -> RecordDefaults {
        RecordDefaults {
            sku_prefix: "shirt".to_string(),
            price: Decimal::new(199999, 4),
            stock_count: Some(Decimal::new(55, 1)),
            currency_decimal_places: 2,
            stock_decimal_places: 0,
        }
    }

    fn persisted() -> (VariableSet, IdentityMap) {
        let set = VariableSet::from_entries([("Size", vec!["S", "M"]), ("Color", vec!["Red"])]);
        let identity = IdentityMap::from_entries(
            generate(&set)
                .into_iter()
                .enumerate()
                .map(|(i, c)| (ProductId::from(i as u64 + 1), c)),
        );
        (set, identity)
    }

    #[test]
    fn test_missing_records_get_defaults() {
        let (_, identity) = persisted();
        let edited = VariableSet::from_entries([
            ("Size", vec!["S", "M", "Extra Large"]),
            ("Color", vec!["Red"]),
        ]);
        let missing = compute_missing(&edited, &identity, &defaults());

        assert_eq!(missing.len(), 1);
        let record = &missing[0];
        assert_eq!(
            record.combination,
            Combination::from_pairs([("Size", "Extra Large"), ("Color", "Red")])
        );
        assert_eq!(record.sku, "shirt-size-extra-large-color-red");
        assert_eq!(record.price.to_string(), "20.00");
        assert_eq!(record.stock_count, Some(Decimal::from(6)));
    }

    #[test]
    fn test_missing_plus_matched_covers_all() {
        let (_, identity) = persisted();
        let edited = VariableSet::from_entries([
            ("Size", vec!["S", "M", "L"]),
            ("Color", vec!["Red", "Blue"]),
        ]);
        let all = generate(&edited);
        let missing = compute_missing(&edited, &identity, &defaults());
        let matched = all
            .iter()
            .filter(|c| find_product_id(&identity, c).is_some())
            .count();
        assert_eq!(missing.len() + matched, all.len());
        assert_eq!(missing.len(), 4);
    }

    #[test]
    fn test_stock_omitted_when_not_tracked() {
        let mut defaults = defaults();
        defaults.stock_count = None;
        let record = defaults.record_for(Combination::from_pairs([("Size", "S")]));
        assert_eq!(record.stock_count, None);
    }

    #[test]
    fn test_to_delete_against_self_is_empty() {
        let (set, identity) = persisted();
        assert!(compute_to_delete(&set, &set, &identity).is_empty());
        assert!(compute_diff(&set, &set, &identity, &defaults()).is_empty());
    }

    #[test]
    fn test_removed_value_is_deleted() {
        let (set, identity) = persisted();
        let edited = VariableSet::from_entries([("Size", vec!["S"]), ("Color", vec!["Red"])]);
        let diff = compute_diff(&set, &edited, &identity, &defaults());
        assert!(diff.to_create.is_empty());
        assert_eq!(
            diff.to_delete,
            vec![Combination::from_pairs([("Size", "M"), ("Color", "Red")])]
        );
    }

    #[test]
    fn test_reordered_variables_delete_nothing() {
        let (set, identity) = persisted();
        let reordered =
            VariableSet::from_entries([("Color", vec!["Red"]), ("Size", vec!["S", "M"])]);
        assert!(compute_diff(&set, &reordered, &identity, &defaults()).is_empty());
    }

    #[test]
    fn test_new_variable_replaces_every_combination() {
        let (set, identity) = persisted();
        let edited = VariableSet::from_entries([
            ("Size", vec!["S", "M"]),
            ("Color", vec!["Red"]),
            ("Material", vec!["Wool"]),
        ]);
        let diff = compute_diff(&set, &edited, &identity, &defaults());
        assert_eq!(diff.to_create.len(), 2);
        assert_eq!(diff.to_delete.len(), 2);
    }
}
