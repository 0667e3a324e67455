use crate::model::{Combination, ProductData};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Backend identifier of a child product. Arrives as a JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => ProductId(text),
            RawId::Number(number) => ProductId(number.to_string()),
        })
    }
}

/// One entry of the backend's combination list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCombination {
    /// Child product; missing or blank when the combination has no product
    #[serde(default)]
    pub product: Option<ProductId>,
    pub combination: Combination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku_part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Authoritative persisted state for one parent product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinationsResponse {
    #[serde(default)]
    pub combinations: Vec<PersistedCombination>,
    #[serde(default)]
    pub product_data: Vec<ProductData>,
}

/// Product id to combination, rebuilt wholesale from every fetch
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    products: BTreeMap<ProductId, Combination>,
    by_combination: HashMap<Combination, ProductId>,
}

impl IdentityMap {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ProductId, Combination)>,
    {
        let mut map = Self::default();
        for (id, combination) in entries {
            // persisted combinations without a product must never match
            if id.is_blank() {
                continue;
            }
            map.by_combination
                .entry(combination.clone())
                .or_insert_with(|| id.clone());
            map.products.insert(id, combination);
        }
        map
    }

    pub fn from_response(response: &CombinationsResponse) -> Self {
        Self::from_entries(response.combinations.iter().filter_map(|entry| {
            entry
                .product
                .clone()
                .map(|id| (id, entry.combination.clone()))
        }))
    }

    pub fn get(&self, id: &ProductId) -> Option<&Combination> {
        self.products.get(id)
    }

    pub(crate) fn lookup(&self, combination: &Combination) -> Option<&ProductId> {
        self.by_combination.get(combination)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, &Combination)> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_from_number_or_string() {
        let ids: Vec<ProductId> = serde_json::from_str(r#"[12, "34"]"#).unwrap();
        assert_eq!(ids, vec![ProductId::from(12), ProductId::new("34")]);
    }

    #[test]
    fn test_response_skips_products_without_id() {
        let json = r#"{
            "combinations": [
                {"product": 1, "combination": {"Size": "S"}},
                {"product": null, "combination": {"Size": "M"}},
                {"product": "", "combination": {"Size": "L"}},
                {"combination": {"Size": "XL"}}
            ],
            "product_data": [
                {"product_id": 1, "sku": "shirt-size-s", "price": "9.90", "stock_count": 3}
            ]
        }"#;
        let response: CombinationsResponse = serde_json::from_str(json).unwrap();
        let identity = IdentityMap::from_response(&response);

        assert_eq!(identity.len(), 1);
        assert_eq!(
            identity.get(&ProductId::from(1)),
            Some(&Combination::from_pairs([("Size", "S")]))
        );
        assert!(identity
            .lookup(&Combination::from_pairs([("Size", "L")]))
            .is_none());
        assert_eq!(response.product_data[0].sku, "shirt-size-s");
    }
}
