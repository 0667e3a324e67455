use crate::error::Result;
use crate::model::{Combination, CombinationRecord, CombinationsResponse, VariationDefinitions};

/// Persistence backend for the child products of one parent product
#[async_trait::async_trait]
pub trait CombinationBackend: Send + Sync {
    /// Authoritative list of persisted combinations and their product data
    async fn fetch_combinations(&self) -> Result<CombinationsResponse>;
    /// Create or update the child products of the given records in one request
    async fn create_combinations(&self, records: &[CombinationRecord]) -> Result<()>;
    /// Delete the child products of the given combinations in one request
    async fn delete_combinations(&self, combinations: &[Combination]) -> Result<()>;
    /// Catalog of variables and values available for selection
    async fn fetch_variation_definitions(&self) -> Result<VariationDefinitions>;
}

#[async_trait::async_trait]
impl<T: CombinationBackend + ?Sized> CombinationBackend for std::sync::Arc<T> {
    async fn fetch_combinations(&self) -> Result<CombinationsResponse> {
        (**self).fetch_combinations().await
    }

    async fn create_combinations(&self, records: &[CombinationRecord]) -> Result<()> {
        (**self).create_combinations(records).await
    }

    async fn delete_combinations(&self, combinations: &[Combination]) -> Result<()> {
        (**self).delete_combinations(combinations).await
    }

    async fn fetch_variation_definitions(&self) -> Result<VariationDefinitions> {
        (**self).fetch_variation_definitions().await
    }
}
