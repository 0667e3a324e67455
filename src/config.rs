use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub variations: VariationDefaults,
    pub commit: CommitPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Endpoint listing, creating and deleting combinations of one parent product
    pub combinations_url: String,
    /// Endpoint of the variable/value catalog
    pub variations_url: String,
    pub timeout_secs: u64,
    pub csrf_token: Option<String>,
}

/// Parent-scoped defaults, read-only for the lifetime of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationDefaults {
    /// SKU of the parent product; prefix of every generated child SKU
    pub default_sku: String,
    pub default_price: Decimal,
    pub default_stock: Option<Decimal>,
    pub currency_decimal_places: u32,
    pub stock_decimal_places: u32,
    pub max_variables: usize,
    pub max_values: usize,
    /// Child products carry a stock count
    pub stock_managed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitPolicy {
    /// Records per creation request once chunking kicks in
    pub chunk_size: usize,
    /// Creation counts at or above this are sent in chunks
    pub chunk_threshold: usize,
    /// Still run creations when the deletion request failed
    pub create_after_failed_delete: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            combinations_url: "http://127.0.0.1:8000/sa/shuup_product_variations/1/combinations/"
                .to_string(),
            variations_url: "http://127.0.0.1:8000/sa/shuup_product_variations/1/variations/"
                .to_string(),
            timeout_secs: 30,
            csrf_token: None,
        }
    }
}

impl Default for VariationDefaults {
    fn default() -> Self {
        Self {
            default_sku: String::new(),
            default_price: Decimal::ZERO,
            default_stock: None,
            currency_decimal_places: 2,
            stock_decimal_places: 0,
            max_variables: 3,
            max_values: 10,
            stock_managed: false,
        }
    }
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            chunk_threshold: 20,
            create_after_failed_delete: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("variations").required(false));

        // Environment variables, e.g. VARIATIONS_BACKEND__COMBINATIONS_URL
        config = config.add_source(
            config::Environment::with_prefix("VARIATIONS")
                .separator("__")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }
}
