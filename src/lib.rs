//! blogmate - Keyword research for blog publishing
//!
//! Expands a seed keyword into long-tail candidates, fetches their search
//! trends in rate-limited batches, scores each candidate's publishing
//! opportunity and keeps the ones worth writing about.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`generators`] - Long-tail templates and autocomplete suggestions
//! - [`fetcher`] - Trend data sources and the batch processor
//! - [`analytics`] - Momentum, opportunity scoring and keyword comparison
//! - [`cache`] - File-backed result cache with TTL
//! - [`progress`] - Single and multi-stage progress tracking
//! - [`discovery`] - The end-to-end Smart Discovery pipeline
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use blogmate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = Arc::new(DataLabClient::new(&config.datalab)?);
//!     let batch = BatchProcessor::new(fetcher, config.discovery.batch_size, config.batch_delay());
//!     let cache = CacheManager::open(&config.cache.dir, config.cache_ttl())?;
//!     let mut service = SmartDiscoveryService::new(KeywordExpander::templates_only(30), batch, cache);
//!
//!     let result = service.discover("롱패딩", &DiscoveryOptions::default(), None).await?;
//!     println!("{}", result.to_summary());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod generators;
pub mod models;
pub mod progress;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{KeywordComparisonService, MomentumCalculator, OpportunityScorer};
    pub use crate::cache::CacheManager;
    pub use crate::config::Config;
    pub use crate::discovery::{DiscoveryOptions, DiscoveryStage, SmartDiscoveryService};
    pub use crate::error::{BlogmateErrorTrait, Error, ErrorCategory, Result};
    pub use crate::fetcher::{BatchProcessor, DataLabClient, TrendFetcher, UnavailableTrendFetcher};
    pub use crate::generators::{Autocomplete, KeywordExpander, NaverAutocomplete};
    pub use crate::models::{DiscoveryResult, Grade, OpportunityScore, TrendDirection, TrendSeries};
    pub use crate::progress::{MultiStageProgressTracker, ProgressTracker};
}

// Direct re-exports for convenience
pub use models::{DiscoveryResult, Grade, OpportunityScore, TrendSeries};
