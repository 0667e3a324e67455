use crate::model::{Combination, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inline errors for the inputs of one combination row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_count: Option<String>,
    /// Message that could not be tied to a single field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.sku.is_none()
            && self.price.is_none()
            && self.stock_count.is_none()
            && self.general.is_none()
    }
}

/// A combination plus the attributes of the child product that represents it.
///
/// This is also the create payload: the backend receives
/// `{combination, sku, price, stock_count}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationRecord {
    pub combination: Combination,
    pub sku: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_count: Option<Decimal>,
    /// Errors from the last failed attempt to persist this record
    #[serde(skip)]
    pub errors: FieldErrors,
}

impl CombinationRecord {
    pub fn new(combination: Combination, sku: impl Into<String>, price: Decimal) -> Self {
        Self {
            combination,
            sku: sku.into(),
            price,
            stock_count: None,
            errors: FieldErrors::default(),
        }
    }

    pub fn with_stock_count(mut self, stock_count: Decimal) -> Self {
        self.stock_count = Some(stock_count);
        self
    }
}

/// Attributes of a persisted child product as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    pub product_id: ProductId,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_count: Option<Decimal>,
}
