use crate::config::CommitPolicy;
use crate::error::{BatchError, BatchOperation, Result, VariationError};
use crate::model::{Combination, CombinationRecord};
use crate::store::traits::CombinationBackend;

/// Sends a pending diff to the backend.
///
/// Deletions go out first as one request. Creations follow, either as one
/// request or, from `chunk_threshold` records on, as sequential chunks of
/// `chunk_size`. A failed chunk is recorded and the remaining chunks still
/// run; nothing already committed is rolled back.
pub struct BatchCommitter<'a, B: CombinationBackend + ?Sized> {
    backend: &'a B,
    policy: &'a CommitPolicy,
}

impl<'a, B: CombinationBackend + ?Sized> BatchCommitter<'a, B> {
    pub fn new(backend: &'a B, policy: &'a CommitPolicy) -> Self {
        Self { backend, policy }
    }

    /// `on_progress` receives the share of creations done, in percent
    pub async fn commit<F>(
        &self,
        creations: &[CombinationRecord],
        deletions: &[Combination],
        mut on_progress: F,
    ) -> Result<()>
    where
        F: FnMut(f64) + Send,
    {
        let mut errors = Vec::new();

        if !deletions.is_empty() {
            log::info!("Deleting {} combinations", deletions.len());
            if let Err(error) = self.backend.delete_combinations(deletions).await {
                log::warn!("Deleting combinations failed: {}", error);
                let failure = BatchError {
                    operation: BatchOperation::Delete,
                    batch: 0,
                    combinations: deletions.to_vec(),
                    error,
                };
                if !self.policy.create_after_failed_delete {
                    let errors = vec![failure];
                    return Err(VariationError::BatchFailure {
                        message: failure_message(&errors),
                        errors,
                    });
                }
                errors.push(failure);
            }
        }

        if !creations.is_empty() {
            on_progress(0.0);
            if creations.len() >= self.policy.chunk_threshold {
                errors.extend(self.create_in_chunks(creations, &mut on_progress).await);
            } else {
                log::info!("Creating {} combinations", creations.len());
                match self.backend.create_combinations(creations).await {
                    Ok(()) => on_progress(100.0),
                    Err(error) => {
                        log::warn!("Creating combinations failed: {}", error);
                        errors.push(BatchError {
                            operation: BatchOperation::Create,
                            batch: 0,
                            combinations: combinations_of(creations),
                            error,
                        });
                    }
                }
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        let message = failure_message(&errors);
        Err(VariationError::BatchFailure { message, errors })
    }

    async fn create_in_chunks<F>(
        &self,
        creations: &[CombinationRecord],
        on_progress: &mut F,
    ) -> Vec<BatchError>
    where
        F: FnMut(f64) + Send,
    {
        let chunk_size = self.policy.chunk_size.max(1);
        let total = creations.len();
        let chunk_count = total.div_ceil(chunk_size);
        let mut processed = 0;
        let mut errors = Vec::new();

        log::info!(
            "Creating {} combinations in {} chunks of {}",
            total,
            chunk_count,
            chunk_size
        );

        for (batch, chunk) in creations.chunks(chunk_size).enumerate() {
            if let Err(error) = self.backend.create_combinations(chunk).await {
                log::warn!(
                    "Chunk {}/{} failed: {}",
                    batch + 1,
                    chunk_count,
                    error
                );
                errors.push(BatchError {
                    operation: BatchOperation::Create,
                    batch,
                    combinations: combinations_of(chunk),
                    error,
                });
            }
            processed += chunk.len();
            on_progress(processed as f64 / total as f64 * 100.0);
        }

        errors
    }
}

fn combinations_of(records: &[CombinationRecord]) -> Vec<Combination> {
    records.iter().map(|r| r.combination.clone()).collect()
}

fn failure_message(errors: &[BatchError]) -> String {
    let deletes = errors
        .iter()
        .any(|e| e.operation == BatchOperation::Delete);
    let creates = errors
        .iter()
        .any(|e| e.operation == BatchOperation::Create);
    match (deletes, creates) {
        (true, true) => "Failed to delete and create combinations".to_string(),
        (true, false) => "Failed to delete combinations".to_string(),
        _ => "Failed to create combinations".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::diff::RecordDefaults;
    use crate::logic::generate::generate;
    use crate::model::VariableSet;
    use crate::store::memory::{BackendRequest, MemoryBackend};
    use rust_decimal::Decimal;

    fn defaults() -> RecordDefaults {
        RecordDefaults {
            sku_prefix: "shirt".to_string(),
            price: Decimal::new(1500, 2),
            stock_count: None,
            currency_decimal_places: 2,
            stock_decimal_places: 0,
        }
    }

    fn records(sizes: usize, colors: usize) -> Vec<CombinationRecord> {
        let set = VariableSet::from_entries([
            (
                "Size",
                (0..sizes).map(|i| format!("S{}", i)).collect::<Vec<_>>(),
            ),
            (
                "Color",
                (0..colors).map(|i| format!("C{}", i)).collect::<Vec<_>>(),
            ),
        ]);
        let defaults = defaults();
        generate(&set)
            .into_iter()
            .map(|c| defaults.record_for(c))
            .collect()
    }

    #[tokio::test]
    async fn test_chunked_creation_reports_progress() {
        let backend = MemoryBackend::new();
        let policy = CommitPolicy::default();
        let creations = records(9, 5);
        let mut progress = Vec::new();

        BatchCommitter::new(&backend, &policy)
            .commit(&creations, &[], |p| progress.push(p.round() as u32))
            .await
            .unwrap();

        let chunks = backend.create_requests();
        assert_eq!(chunks.len(), 9);
        assert!(chunks.iter().all(|chunk| chunk.len() == 5));
        assert_eq!(chunks[0][0].combination, creations[0].combination);
        assert_eq!(progress, vec![0, 11, 22, 33, 44, 56, 67, 78, 89, 100]);
        assert_eq!(backend.product_count(), 45);
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_later_chunks() {
        let creations = records(9, 5);
        // taken SKU inside the third chunk
        let mut squatter = creations[12].clone();
        squatter.combination = crate::model::Combination::from_pairs([("Size", "other")]);
        let backend = MemoryBackend::with_products([squatter]);
        let policy = CommitPolicy::default();
        let mut progress = Vec::new();

        let error = BatchCommitter::new(&backend, &policy)
            .commit(&creations, &[], |p| progress.push(p))
            .await
            .unwrap_err();

        assert_eq!(backend.create_requests().len(), 9);
        assert_eq!(progress.len(), 10);
        assert_eq!(progress.last().copied(), Some(100.0));
        match error {
            VariationError::BatchFailure { message, errors } => {
                assert_eq!(message, "Failed to create combinations");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].batch, 2);
                assert_eq!(errors[0].combinations.len(), 5);
                assert!(errors[0].error.field_errors()[2].sku.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(backend.product_count(), 1 + 40);
    }

    #[tokio::test]
    async fn test_small_creation_is_one_request() {
        let backend = MemoryBackend::new();
        let policy = CommitPolicy::default();
        let creations = records(3, 2);
        let mut progress = Vec::new();

        BatchCommitter::new(&backend, &policy)
            .commit(&creations, &[], |p| progress.push(p))
            .await
            .unwrap();

        assert_eq!(backend.create_requests().len(), 1);
        assert_eq!(progress, vec![0.0, 100.0]);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let backend = MemoryBackend::new();
        let policy = CommitPolicy::default();
        let creations = records(5, 4);

        BatchCommitter::new(&backend, &policy)
            .commit(&creations, &[], |_| {})
            .await
            .unwrap();
        assert_eq!(backend.create_requests().len(), 4);
    }

    #[tokio::test]
    async fn test_deletes_run_before_creates() {
        let existing = records(1, 2);
        let backend = MemoryBackend::with_products(existing.clone());
        let policy = CommitPolicy::default();
        let deletions = vec![existing[0].combination.clone()];
        let creations = records(2, 1);

        BatchCommitter::new(&backend, &policy)
            .commit(&creations[1..], &deletions, |_| {})
            .await
            .unwrap();

        let requests = backend.requests();
        assert!(matches!(requests[0], BackendRequest::Delete(_)));
        assert!(matches!(requests[1], BackendRequest::Create(_)));
        assert_eq!(backend.product_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_delete_aborts_creation() {
        let backend = MemoryBackend::with_products(records(1, 1));
        backend.fail_deletes(true);
        let policy = CommitPolicy::default();
        let mut progress = Vec::new();

        let error = BatchCommitter::new(&backend, &policy)
            .commit(
                &records(2, 2)[1..],
                &[records(1, 1)[0].combination.clone()],
                |p| progress.push(p),
            )
            .await
            .unwrap_err();

        assert!(backend.create_requests().is_empty());
        assert!(progress.is_empty());
        match error {
            VariationError::BatchFailure { message, errors } => {
                assert_eq!(message, "Failed to delete combinations");
                assert_eq!(errors[0].operation, BatchOperation::Delete);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_policy_can_create_after_failed_delete() {
        let backend = MemoryBackend::with_products(records(1, 1));
        backend.fail_deletes(true);
        let policy = CommitPolicy {
            create_after_failed_delete: true,
            ..CommitPolicy::default()
        };

        let error = BatchCommitter::new(&backend, &policy)
            .commit(
                &records(2, 2)[2..],
                &[records(1, 1)[0].combination.clone()],
                |_| {},
            )
            .await
            .unwrap_err();

        assert_eq!(backend.create_requests().len(), 1);
        assert_eq!(backend.product_count(), 3);
        match error {
            VariationError::BatchFailure { errors, .. } => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let backend = MemoryBackend::new();
        let policy = CommitPolicy::default();
        let mut progress = Vec::new();
        BatchCommitter::new(&backend, &policy)
            .commit(&[], &[], |p| progress.push(p))
            .await
            .unwrap();
        assert!(backend.requests().is_empty());
        assert!(progress.is_empty());
    }
}
