use crate::config::{CommitPolicy, VariationDefaults};
use crate::error::{BatchOperation, Result, VariationError};
use crate::logic::commit::BatchCommitter;
use crate::logic::decimal::{ensure_decimal_places, parse_decimal};
use crate::logic::diff::{compute_diff, PendingDiff, RecordDefaults};
use crate::logic::generate::generate;
use crate::logic::resolve::{
    find_combination_record, find_combination_record_mut, find_product_data, find_product_id,
};
use crate::model::{
    Combination, CombinationRecord, CombinationsResponse, FieldErrors, IdentityMap, ProductData,
    ProductId, VariableSet, VariationDefinitions,
};
use crate::notify::{Notifier, Severity};
use crate::store::traits::CombinationBackend;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// What a listed combination currently stands for
#[derive(Debug, Clone, PartialEq)]
pub enum RowState<'a> {
    /// Already backed by a product
    Persisted {
        product_id: &'a ProductId,
        data: Option<&'a ProductData>,
    },
    /// Will be created on commit
    Pending(Option<&'a CombinationRecord>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinationRow<'a> {
    pub combination: Combination,
    pub state: RowState<'a>,
}

/// Editing session for the variations of one parent product.
///
/// Holds the persisted state as last fetched from the backend and at most one
/// pending edit of the variable set. Every edit recomputes the pending diff;
/// an edit that turns out to change nothing is dropped again.
pub struct VariationSession<B: CombinationBackend, N: Notifier> {
    backend: B,
    notifier: N,
    defaults: VariationDefaults,
    policy: CommitPolicy,
    record_defaults: RecordDefaults,
    persisted: VariableSet,
    identity: IdentityMap,
    product_data: Vec<ProductData>,
    pending: Option<VariableSet>,
    diff: PendingDiff,
}

impl<B: CombinationBackend, N: Notifier> VariationSession<B, N> {
    /// Fetch the persisted combinations and open a session on them
    pub async fn load(
        backend: B,
        notifier: N,
        defaults: VariationDefaults,
        policy: CommitPolicy,
    ) -> Result<Self> {
        let response = backend.fetch_combinations().await?;
        let mut session = Self {
            backend,
            notifier,
            record_defaults: RecordDefaults::from_defaults(&defaults),
            defaults,
            policy,
            persisted: VariableSet::new(),
            identity: IdentityMap::default(),
            product_data: Vec::new(),
            pending: None,
            diff: PendingDiff::default(),
        };
        session.apply_response(response);
        log::info!(
            "Loaded {} variables with {} persisted combinations",
            session.persisted.len(),
            session.identity.len()
        );
        Ok(session)
    }

    /// Refetch and rebuild the persisted state, keeping an open edit
    pub async fn refresh(&mut self) -> Result<()> {
        let response = self.backend.fetch_combinations().await?;
        self.apply_response(response);
        self.recompute();
        Ok(())
    }

    fn apply_response(&mut self, response: CombinationsResponse) {
        self.identity = IdentityMap::from_response(&response);
        self.persisted = VariableSet::from_combinations(
            response.combinations.iter().map(|entry| &entry.combination),
        );
        self.product_data = response
            .product_data
            .into_iter()
            .map(|mut data| {
                data.price = data
                    .price
                    .map(|p| ensure_decimal_places(p, self.defaults.currency_decimal_places));
                data.stock_count = data
                    .stock_count
                    .map(|s| ensure_decimal_places(s, self.defaults.stock_decimal_places));
                data
            })
            .collect();
    }

    pub fn persisted(&self) -> &VariableSet {
        &self.persisted
    }

    pub fn identity(&self) -> &IdentityMap {
        &self.identity
    }

    pub fn product_data(&self) -> &[ProductData] {
        &self.product_data
    }

    pub fn pending(&self) -> Option<&VariableSet> {
        self.pending.as_ref()
    }

    pub fn diff(&self) -> &PendingDiff {
        &self.diff
    }

    pub fn record_defaults(&self) -> &RecordDefaults {
        &self.record_defaults
    }

    /// The variable set currently shown: the open edit, else the persisted one
    pub fn variables(&self) -> &VariableSet {
        self.pending.as_ref().unwrap_or(&self.persisted)
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_incomplete(&self) -> bool {
        self.variables().is_incomplete()
    }

    pub fn can_add_variable(&self) -> bool {
        let variables = self.variables();
        !variables.is_incomplete() && variables.len() < self.defaults.max_variables
    }

    pub fn add_variable(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return self.reject(VariationError::EmptyVariableName);
        }
        if self.variables().contains(name) {
            return Ok(());
        }
        if self.variables().len() >= self.defaults.max_variables {
            return self.reject(VariationError::MaxVariables {
                max: self.defaults.max_variables,
            });
        }
        if self.is_incomplete() {
            return self.reject(VariationError::IncompleteVariables);
        }

        let mut edited = self.editable();
        edited.insert(name, Vec::new());
        self.set_pending(edited);
        Ok(())
    }

    /// Replace the values of a variable. An empty list removes the variable.
    pub fn set_values(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        let Some(current) = self.variables().get(name) else {
            return self.reject(VariationError::UnknownVariable(name.to_string()));
        };
        let growing = values.len() > current.len();

        if let Some(duplicate) = first_duplicate(&values) {
            return self.reject(VariationError::DuplicateValue {
                variable: name.to_string(),
                value: duplicate.to_string(),
            });
        }
        if growing && values.len() > self.defaults.max_values {
            return self.reject(VariationError::MaxValues {
                variable: name.to_string(),
                max: self.defaults.max_values,
            });
        }

        let mut edited = self.editable();
        if values.is_empty() {
            edited.remove(name);
        } else {
            edited.insert(name, values);
        }
        self.set_pending(edited);
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> Result<()> {
        let mut edited = self.editable();
        if !edited.remove(name) {
            return self.reject(VariationError::UnknownVariable(name.to_string()));
        }
        self.set_pending(edited);
        Ok(())
    }

    /// Open an edit with a whole variable set at once
    pub fn replace_variables(&mut self, variables: VariableSet) -> Result<()> {
        if variables.len() > self.defaults.max_variables {
            return self.reject(VariationError::MaxVariables {
                max: self.defaults.max_variables,
            });
        }
        for variable in variables.variables() {
            if variable.name.trim().is_empty() {
                return self.reject(VariationError::EmptyVariableName);
            }
            if let Some(duplicate) = first_duplicate(&variable.values) {
                return self.reject(VariationError::DuplicateValue {
                    variable: variable.name.clone(),
                    value: duplicate.to_string(),
                });
            }
            if variable.values.len() > self.defaults.max_values {
                return self.reject(VariationError::MaxValues {
                    variable: variable.name.clone(),
                    max: self.defaults.max_values,
                });
            }
        }
        self.set_pending(variables);
        Ok(())
    }

    /// Discard the open edit
    pub fn cancel(&mut self) {
        self.pending = None;
        self.diff = PendingDiff::default();
    }

    pub fn set_default_price(&mut self, input: &str) -> Result<Decimal> {
        let price = self.parse_amount(input, self.defaults.currency_decimal_places)?;
        self.record_defaults.price = price;
        for record in &mut self.diff.to_create {
            record.price = price;
        }
        Ok(price)
    }

    pub fn set_default_stock(&mut self, input: &str) -> Result<Decimal> {
        let stock = self.parse_amount(input, self.defaults.stock_decimal_places)?;
        self.record_defaults.stock_count = Some(stock);
        for record in &mut self.diff.to_create {
            record.stock_count = Some(stock);
        }
        Ok(stock)
    }

    /// Edit one record of the pending creations
    pub fn update_pending_record(
        &mut self,
        combination: &Combination,
        sku: &str,
        price: &str,
        stock_count: Option<&str>,
    ) -> Result<()> {
        let price = self.parse_amount(price, self.defaults.currency_decimal_places)?;
        let stock_count = stock_count
            .map(|input| self.parse_amount(input, self.defaults.stock_decimal_places))
            .transpose()?;

        match find_combination_record_mut(&mut self.diff.to_create, combination) {
            Some(record) => {
                record.sku = sku.trim().to_string();
                record.price = price;
                if stock_count.is_some() {
                    record.stock_count = stock_count;
                }
                record.errors = FieldErrors::default();
                Ok(())
            }
            None => self.reject(VariationError::UnknownCombination(combination.to_string())),
        }
    }

    /// Push one persisted combination's attributes to the backend
    pub async fn update_existing(&mut self, mut record: CombinationRecord) -> Result<()> {
        record.price = ensure_decimal_places(record.price, self.defaults.currency_decimal_places);
        record.stock_count = record
            .stock_count
            .map(|s| ensure_decimal_places(s, self.defaults.stock_decimal_places));

        if let Err(error) = self
            .backend
            .create_combinations(std::slice::from_ref(&record))
            .await
        {
            log::warn!("Updating {} failed: {}", record.combination, error);
            return Err(error);
        }
        self.refresh().await
    }

    /// Every combination of the current view in generation order
    pub fn rows(&self) -> Vec<CombinationRow<'_>> {
        generate(self.variables())
            .into_iter()
            .map(|combination| {
                let state = match find_product_id(&self.identity, &combination) {
                    Some(product_id) => RowState::Persisted {
                        product_id,
                        data: find_product_data(&self.product_data, product_id),
                    },
                    None => RowState::Pending(find_combination_record(
                        &self.diff.to_create,
                        &combination,
                    )),
                };
                CombinationRow { combination, state }
            })
            .collect()
    }

    /// Apply the open edit to the backend, then refetch
    pub async fn commit<F>(&mut self, on_progress: F) -> Result<()>
    where
        F: FnMut(f64) + Send,
    {
        if self.pending.is_none() {
            return self.reject(VariationError::NothingToCommit);
        }
        if self.is_incomplete() {
            return self.reject(VariationError::IncompleteVariables);
        }

        let result = BatchCommitter::new(&self.backend, &self.policy)
            .commit(&self.diff.to_create, &self.diff.to_delete, on_progress)
            .await;

        let mut rejected = Vec::new();
        match &result {
            Ok(()) => {
                self.notifier
                    .enqueue("Combinations updated.", Severity::Success);
                self.cancel();
            }
            Err(error) => {
                self.notifier.enqueue(&error.to_string(), Severity::Error);
                rejected = rejected_records(error);
            }
        }

        if let Err(refresh_error) = self.refresh().await {
            log::error!("Refetching combinations failed: {}", refresh_error);
            if result.is_ok() {
                return Err(refresh_error);
            }
        }

        for record in &mut self.diff.to_create {
            record.errors = FieldErrors::default();
        }
        for (combination, errors) in rejected {
            let pending = &mut self.diff.to_create;
            if let Some(record) = find_combination_record_mut(pending, &combination) {
                record.errors = errors;
            }
        }
        result
    }

    pub async fn definitions(&self) -> Result<VariationDefinitions> {
        self.backend.fetch_variation_definitions().await
    }

    fn editable(&self) -> VariableSet {
        self.variables().clone()
    }

    fn set_pending(&mut self, variables: VariableSet) {
        self.pending = Some(variables);
        self.recompute();
    }

    fn recompute(&mut self) {
        let Some(pending) = &self.pending else {
            self.diff = PendingDiff::default();
            return;
        };
        if pending.is_incomplete() {
            self.diff = PendingDiff::default();
            return;
        }

        let mut diff = compute_diff(
            &self.persisted,
            pending,
            &self.identity,
            &self.record_defaults,
        );
        // keep edits made to records that are still pending
        for record in &mut diff.to_create {
            let previous = find_combination_record(&self.diff.to_create, &record.combination);
            if let Some(previous) = previous {
                *record = previous.clone();
            }
        }

        if diff.is_empty() {
            log::debug!("Pending edit matches the persisted combinations, dropping it");
            self.pending = None;
        }
        self.diff = diff;
    }

    /// Parse user input and round it to `places`
    fn parse_amount(&self, input: &str, places: u32) -> Result<Decimal> {
        match parse_decimal(input) {
            Ok(value) => Ok(ensure_decimal_places(value, places)),
            Err(error) => self.reject(error),
        }
    }

    fn reject<T>(&self, error: VariationError) -> Result<T> {
        log::warn!("{}", error);
        self.notifier.enqueue(&error.to_string(), Severity::Warning);
        Err(error)
    }
}

fn first_duplicate(values: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(String::as_str)
        .find(|value| !seen.insert(*value))
}

/// Field errors of the creation batches that failed, keyed by combination
fn rejected_records(error: &VariationError) -> Vec<(Combination, FieldErrors)> {
    let VariationError::BatchFailure { errors, .. } = error else {
        return Vec::new();
    };

    let mut rejected = Vec::new();
    for batch in errors
        .iter()
        .filter(|batch| batch.operation == BatchOperation::Create)
    {
        let fields = batch.error.field_errors();
        // per-record errors only when they line up with the records sent
        let aligned = fields.len() == batch.combinations.len()
            && fields.iter().any(|errors| !errors.is_empty());
        if aligned {
            rejected.extend(
                batch
                    .combinations
                    .iter()
                    .zip(fields)
                    .filter(|(_, errors)| !errors.is_empty())
                    .map(|(combination, errors)| (combination.clone(), errors.clone())),
            );
            continue;
        }
        if let VariationError::Validation { message, .. } = &batch.error {
            rejected.extend(batch.combinations.iter().map(|combination| {
                let errors = FieldErrors {
                    general: Some(message.clone()),
                    ..Default::default()
                };
                (combination.clone(), errors)
            }));
        }
    }
    rejected
}
