pub mod cache;
pub mod compare;
pub mod discover;

// Re-export command functions for convenience
pub use cache::{cache_clear, cache_clear_expired, cache_stats};
pub use compare::compare;
pub use discover::{discover, DiscoverParams};

use std::sync::Arc;

use blogmate::config::Config;
use blogmate::error::BlogmateErrorTrait;
use blogmate::fetcher::{DataLabClient, TrendFetcher, UnavailableTrendFetcher};
use blogmate::generators::{Autocomplete, NaverAutocomplete};

/// DataLab client, or a fetcher that fails every keyword when not configured
pub(crate) fn build_fetcher(config: &Config) -> Arc<dyn TrendFetcher> {
    match DataLabClient::new(&config.datalab) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "DataLab client unavailable, trend analysis will yield no results");
            eprintln!("경고: DataLab API 자격 증명이 없습니다 (NAVER_DATALAB_CLIENT_ID / NAVER_DATALAB_CLIENT_SECRET).");
            Arc::new(UnavailableTrendFetcher::new(e.to_string()))
        }
    }
}

pub(crate) fn build_autocomplete(config: &Config) -> Autocomplete {
    if !config.autocomplete.enabled {
        return Autocomplete::Unavailable;
    }
    match NaverAutocomplete::new(&config.autocomplete) {
        Ok(client) => Autocomplete::available(client),
        Err(e) => {
            tracing::warn!(error = %e, "Autocomplete client unavailable");
            Autocomplete::Unavailable
        }
    }
}

/// User-facing line for the first blogmate error in `err`'s chain
pub(crate) fn describe_error(err: &anyhow::Error) -> Option<String> {
    let error = err.chain().find_map(|e| e.downcast_ref::<blogmate::error::Error>())?;

    let mut line = format!("[{}] {}", error.category().korean_desc(), error.korean_desc());
    if error.is_recoverable() {
        line.push_str(" (잠시 후 다시 시도해 주세요)");
    }
    Some(line)
}
