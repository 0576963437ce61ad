//! Search trend retrieval
//!
//! The [`TrendFetcher`] trait is the boundary to the external trend provider.
//! [`DataLabClient`] talks to Naver DataLab over HTTP, [`UnavailableTrendFetcher`]
//! stands in when no credentials are configured, and [`BatchProcessor`]
//! drives a fetcher over many keywords with pacing and cancellation.

pub mod batch;
pub mod datalab;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::models::TrendSeries;
use crate::utils::error::FetchError;

pub use batch::{BatchProcessor, BatchReport, FailedKeyword};
pub use datalab::DataLabClient;

/// Keyword groups the provider accepts in a single request
pub const MAX_KEYWORDS_PER_REQUEST: usize = 5;

/// Per-keyword outcome of one fetch call
pub type FetchOutcome = HashMap<String, Result<TrendSeries, FetchError>>;

/// Source of trend series for up to [`MAX_KEYWORDS_PER_REQUEST`] keywords at a time
#[async_trait]
pub trait TrendFetcher: Send + Sync {
    /// Fetch series for `keywords`
    ///
    /// An `Err` means the whole request failed. Otherwise every requested
    /// keyword has an entry, failed keywords carrying their own error.
    async fn fetch(&self, keywords: &[String]) -> Result<FetchOutcome, FetchError>;
}

/// Fetcher used when the trend provider is not configured
///
/// Every keyword fails with [`FetchError::Unavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableTrendFetcher {
    reason: String,
}

impl UnavailableTrendFetcher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TrendFetcher for UnavailableTrendFetcher {
    async fn fetch(&self, keywords: &[String]) -> Result<FetchOutcome, FetchError> {
        Ok(keywords
            .iter()
            .map(|k| (k.clone(), Err(FetchError::Unavailable(self.reason.clone()))))
            .collect())
    }
}
