//! REST backend for combination persistence

use crate::config::BackendConfig;
use crate::error::{Result, VariationError};
use crate::model::{
    Combination, CombinationRecord, CombinationsResponse, FieldErrors, VariationDefinitions,
};
use crate::store::traits::CombinationBackend;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{redirect, Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Backend reached over HTTP, one parent product per instance
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    combinations_url: String,
    variations_url: String,
}

#[derive(Serialize)]
struct DeleteEntry<'a> {
    combination: &'a Combination,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Some(token) = &config.csrf_token {
            let value = HeaderValue::from_str(token).map_err(|_| {
                VariationError::Config("csrf_token is not a valid header value".to_string())
            })?;
            headers.insert("X-CSRFToken", value);
        }

        // never follow redirects, session headers would not be passed along
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect::Policy::none())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            combinations_url: config.combinations_url.clone(),
            variations_url: config.variations_url.clone(),
        })
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await?;
        Err(decode_error(status.as_u16(), &body))
    }
}

#[async_trait::async_trait]
impl CombinationBackend for HttpBackend {
    async fn fetch_combinations(&self) -> Result<CombinationsResponse> {
        log::debug!("GET {}", self.combinations_url);
        let response = self.client.get(&self.combinations_url).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn create_combinations(&self, records: &[CombinationRecord]) -> Result<()> {
        log::debug!("POST {} ({} records)", self.combinations_url, records.len());
        let response = self
            .client
            .post(&self.combinations_url)
            .json(records)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_combinations(&self, combinations: &[Combination]) -> Result<()> {
        log::debug!(
            "DELETE {} ({} combinations)",
            self.combinations_url,
            combinations.len()
        );
        let entries: Vec<DeleteEntry> = combinations
            .iter()
            .map(|combination| DeleteEntry { combination })
            .collect();
        let response = self
            .client
            .delete(&self.combinations_url)
            .json(&entries)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_variation_definitions(&self) -> Result<VariationDefinitions> {
        log::debug!("GET {}", self.variations_url);
        let response = self.client.get(&self.variations_url).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}

/// Turn a non-2xx body into an error.
///
/// The backend answers `{"error": ..., "code": ...}` where `error` is either a
/// message or serializer errors with one entry per submitted record under
/// `combinations`.
pub(crate) fn decode_error(status: u16, body: &str) -> VariationError {
    let unexpected = || VariationError::UnexpectedStatus {
        status,
        body: body.to_string(),
    };

    let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(body) else {
        return unexpected();
    };
    let code = payload
        .get("code")
        .and_then(Value::as_str)
        .map(str::to_string);

    match payload.get("error") {
        Some(Value::String(message)) => VariationError::Validation {
            status,
            code,
            message: message.clone(),
            fields: Vec::new(),
        },
        Some(Value::Object(errors)) => {
            let fields = match errors.get("combinations") {
                Some(Value::Array(entries)) => entries.iter().map(field_errors).collect(),
                Some(other) => vec![FieldErrors {
                    general: first_message(other),
                    ..Default::default()
                }],
                None => Vec::new(),
            };
            let message = fields
                .iter()
                .find_map(|f| {
                    f.sku
                        .clone()
                        .or_else(|| f.price.clone())
                        .or_else(|| f.stock_count.clone())
                        .or_else(|| f.general.clone())
                })
                .or_else(|| errors.values().find_map(first_message))
                .unwrap_or_else(|| "invalid combination data".to_string());
            VariationError::Validation {
                status,
                code,
                message,
                fields,
            }
        }
        _ => unexpected(),
    }
}

fn field_errors(entry: &Value) -> FieldErrors {
    if !entry.is_object() {
        return FieldErrors {
            general: first_message(entry),
            ..Default::default()
        };
    }
    let field = |name: &str| entry.get(name).and_then(first_message);
    FieldErrors {
        sku: field("sku"),
        price: field("price"),
        stock_count: field("stock_count"),
        general: field("non_field_errors").or_else(|| field("combination")),
    }
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        Value::Object(entries) => entries.values().find_map(first_message),
        _ => None,
    }
}
