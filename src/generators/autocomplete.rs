//! Naver search autocomplete suggestions
//!
//! Suggestions are a best-effort enrichment: any failure is logged and
//! turned into an empty list so keyword expansion never fails because of it.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AutocompleteConfig;
use crate::utils::error::FetchError;

/// Source of search suggestions for a seed
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Suggestions for `seed`; empty when none or on failure
    async fn suggest(&self, seed: &str) -> Vec<String>;
}

/// Autocomplete collaborator, explicitly present or absent
#[derive(Clone, Default)]
pub enum Autocomplete {
    Available(Arc<dyn SuggestionSource>),
    #[default]
    Unavailable,
}

impl Autocomplete {
    pub fn available(source: impl SuggestionSource + 'static) -> Self {
        Self::Available(Arc::new(source))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Suggestions from the source, or nothing when unavailable
    pub async fn suggest(&self, seed: &str) -> Vec<String> {
        match self {
            Self::Available(source) => source.suggest(seed).await,
            Self::Unavailable => Vec::new(),
        }
    }
}

impl std::fmt::Debug for Autocomplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(_) => f.write_str("Autocomplete::Available"),
            Self::Unavailable => f.write_str("Autocomplete::Unavailable"),
        }
    }
}

/// Client for the Naver search autocomplete endpoint
pub struct NaverAutocomplete {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    endpoint: String,
    max_results: usize,
}

impl NaverAutocomplete {
    /// Requests per second sent to the endpoint
    const REQUESTS_PER_SECOND: u32 = 5;

    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &AutocompleteConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(Self::REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
            endpoint: config.endpoint.clone(),
            max_results: config.max_results,
        })
    }

    /// Create a client against a custom base URL for testing
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_base_url(base_url: &str, max_results: usize) -> Result<Self, FetchError> {
        Self::new(&AutocompleteConfig {
            endpoint: format!("{}/nx/ac", base_url.trim_end_matches('/')),
            max_results,
            ..AutocompleteConfig::default()
        })
    }

    async fn fetch(&self, seed: &str) -> Result<Vec<String>, FetchError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", seed),
                ("st", "100"),
                ("r_format", "json"),
                ("r_enc", "UTF-8"),
                ("r_unicode", "0"),
                ("t_koreng", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(if status.is_server_error() {
                FetchError::ServerError(status.as_u16())
            } else {
                FetchError::ClientError(status.as_u16())
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        Ok(Self::parse_items(&body, self.max_results))
    }

    /// Extract `items[0][i][0]` strings
    fn parse_items(body: &Value, max_results: usize) -> Vec<String> {
        body.get("items")
            .and_then(|items| items.get(0))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get(0).and_then(Value::as_str))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .take(max_results)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl SuggestionSource for NaverAutocomplete {
    async fn suggest(&self, seed: &str) -> Vec<String> {
        match self.fetch(seed).await {
            Ok(suggestions) => {
                tracing::debug!(seed = %seed, count = suggestions.len(), "Fetched autocomplete suggestions");
                suggestions
            }
            Err(e) => {
                tracing::warn!(seed = %seed, error = %e, "Autocomplete unavailable, using templates only");
                Vec::new()
            }
        }
    }
}
