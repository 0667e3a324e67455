use crate::error::{Result, VariationError};
use crate::model::{
    Combination, CombinationRecord, CombinationsResponse, FieldErrors, PersistedCombination,
    ProductData, ProductId, VariationDefinitions,
};
use crate::store::traits::CombinationBackend;
use itertools::Itertools;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// Stable hash of a combination, independent of key order
pub fn combination_hash(combination: &Combination) -> String {
    let canonical = combination
        .canonical_pairs()
        .into_iter()
        .map(|(variable, value)| format!("{}={}", variable, value))
        .join(";");
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// A request received by the in-memory backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    FetchCombinations,
    Create(Vec<CombinationRecord>),
    Delete(Vec<Combination>),
    FetchDefinitions,
}

#[derive(Debug, Clone)]
struct StoredProduct {
    combination: Combination,
    sku: String,
    price: Decimal,
    stock_count: Option<Decimal>,
}

#[derive(Debug, Default)]
struct MemoryState {
    products: BTreeMap<u64, StoredProduct>,
    by_hash: HashMap<String, u64>,
    next_id: u64,
    definitions: VariationDefinitions,
    requests: Vec<BackendRequest>,
    fail_deletes: bool,
}

/// Backend kept in process memory.
///
/// Each create request is validated as a whole before anything is stored, so
/// a rejected request leaves the products untouched.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend already holding products for the given records
    pub fn with_products(records: impl IntoIterator<Item = CombinationRecord>) -> Self {
        let backend = Self::new();
        {
            let mut state = backend.state.lock();
            for record in records {
                state.upsert(record);
            }
        }
        backend
    }

    pub fn with_definitions(self, definitions: VariationDefinitions) -> Self {
        self.state.lock().definitions = definitions;
        self
    }

    /// Make every delete request fail until switched off again
    pub fn fail_deletes(&self, fail: bool) {
        self.state.lock().fail_deletes = fail;
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.state.lock().requests.clone()
    }

    pub fn create_requests(&self) -> Vec<Vec<CombinationRecord>> {
        self.requests()
            .into_iter()
            .filter_map(|request| match request {
                BackendRequest::Create(records) => Some(records),
                _ => None,
            })
            .collect()
    }

    pub fn product_count(&self) -> usize {
        self.state.lock().products.len()
    }

    pub fn product_for(&self, combination: &Combination) -> Option<ProductData> {
        let state = self.state.lock();
        let id = state.by_hash.get(&combination_hash(combination))?;
        state.products.get(id).map(|product| product.data(*id))
    }
}

impl StoredProduct {
    fn data(&self, id: u64) -> ProductData {
        ProductData {
            product_id: ProductId::from(id),
            sku: self.sku.clone(),
            price: Some(self.price),
            stock_count: self.stock_count,
        }
    }
}

impl MemoryState {
    fn upsert(&mut self, record: CombinationRecord) {
        let hash = combination_hash(&record.combination);
        let id = match self.by_hash.get(&hash).copied() {
            Some(id) => id,
            None => {
                self.next_id += 1;
                self.by_hash.insert(hash, self.next_id);
                self.next_id
            }
        };
        let product = self.products.entry(id).or_insert_with(|| StoredProduct {
            combination: record.combination.clone(),
            sku: String::new(),
            price: Decimal::ZERO,
            stock_count: None,
        });
        product.sku = record.sku;
        product.price = record.price;
        if record.stock_count.is_some() {
            product.stock_count = record.stock_count;
        }
    }

    fn sku_owner(&self, sku: &str) -> Option<&Combination> {
        self.products
            .values()
            .find(|product| product.sku == sku)
            .map(|product| &product.combination)
    }

    fn validate(&self, records: &[CombinationRecord]) -> Vec<FieldErrors> {
        let mut seen: HashMap<&str, &Combination> = HashMap::new();
        records
            .iter()
            .map(|record| {
                let mut errors = FieldErrors::default();
                let sku = record.sku.trim();
                if sku.is_empty() {
                    errors.sku = Some("This field is required.".to_string());
                } else {
                    let taken = self
                        .sku_owner(sku)
                        .into_iter()
                        .chain(seen.get(sku).copied())
                        .any(|owner| owner != &record.combination);
                    if taken {
                        errors.sku = Some(format!("The SKU '{}' is already being used.", sku));
                    }
                    seen.insert(sku, &record.combination);
                }
                if record.price.is_sign_negative() {
                    errors.price =
                        Some("Ensure this value is greater than or equal to 0.".to_string());
                }
                errors
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl CombinationBackend for MemoryBackend {
    async fn fetch_combinations(&self) -> Result<CombinationsResponse> {
        let mut state = self.state.lock();
        state.requests.push(BackendRequest::FetchCombinations);

        let combinations = state
            .products
            .iter()
            .map(|(id, product)| PersistedCombination {
                product: Some(ProductId::from(*id)),
                combination: product.combination.clone(),
                sku_part: Some(product.combination.sku_part()),
                hash: Some(combination_hash(&product.combination)),
            })
            .collect();
        let product_data = state
            .products
            .iter()
            .map(|(id, product)| product.data(*id))
            .collect();

        Ok(CombinationsResponse {
            combinations,
            product_data,
        })
    }

    async fn create_combinations(&self, records: &[CombinationRecord]) -> Result<()> {
        let mut state = self.state.lock();
        state.requests.push(BackendRequest::Create(records.to_vec()));

        let fields = state.validate(records);
        let message = fields
            .iter()
            .find_map(|f| f.sku.clone().or_else(|| f.price.clone()));
        if let Some(message) = message {
            return Err(VariationError::Validation {
                status: 400,
                code: Some("validation-fail".to_string()),
                message,
                fields,
            });
        }

        for record in records {
            state.upsert(record.clone());
        }
        Ok(())
    }

    async fn delete_combinations(&self, combinations: &[Combination]) -> Result<()> {
        let mut state = self.state.lock();
        state.requests.push(BackendRequest::Delete(combinations.to_vec()));

        if state.fail_deletes {
            return Err(VariationError::UnexpectedStatus {
                status: 503,
                body: "deletion unavailable".to_string(),
            });
        }

        for combination in combinations {
            if let Some(id) = state.by_hash.remove(&combination_hash(combination)) {
                state.products.remove(&id);
            }
        }
        Ok(())
    }

    async fn fetch_variation_definitions(&self) -> Result<VariationDefinitions> {
        let mut state = self.state.lock();
        state.requests.push(BackendRequest::FetchDefinitions);
        Ok(state.definitions.clone())
    }
}
