//! Sequential, paced batching of trend requests
//!
//! Keywords are split into contiguous groups no larger than the provider's
//! per-request limit. Groups are fetched one after another with a fixed pause
//! in between, and failures are recorded per keyword instead of aborting.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{TrendFetcher, MAX_KEYWORDS_PER_REQUEST};
use crate::error::{Error, Result};
use crate::models::TrendSeries;

/// Progress sink receiving `(processed_keywords, total_keywords)`
pub type BatchProgress<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// Keyword excluded from the results and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedKeyword {
    pub keyword: String,
    pub error: String,
}

/// Outcome of a batched run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Successful series in input order
    pub series: Vec<TrendSeries>,
    pub failed: Vec<FailedKeyword>,
    /// Number of fetch calls made
    pub batch_count: usize,
}

/// Drives a [`TrendFetcher`] over an arbitrary number of keywords
pub struct BatchProcessor {
    fetcher: Arc<dyn TrendFetcher>,
    batch_size: usize,
    delay: Duration,
}

impl BatchProcessor {
    pub const DEFAULT_BATCH_SIZE: usize = MAX_KEYWORDS_PER_REQUEST;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Create a processor; `batch_size` is clamped to `1..=5`
    pub fn new(fetcher: Arc<dyn TrendFetcher>, batch_size: usize, delay: Duration) -> Self {
        let clamped = batch_size.clamp(1, MAX_KEYWORDS_PER_REQUEST);
        if clamped != batch_size {
            tracing::warn!(
                requested = batch_size,
                using = clamped,
                "Batch size out of range, clamping"
            );
        }

        Self {
            fetcher,
            batch_size: clamped,
            delay,
        }
    }

    /// Processor with batch size 5 and a one second pause
    pub fn with_defaults(fetcher: Arc<dyn TrendFetcher>) -> Self {
        Self::new(fetcher, Self::DEFAULT_BATCH_SIZE, Self::DEFAULT_DELAY)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The underlying fetcher
    pub fn fetcher(&self) -> Arc<dyn TrendFetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Fetch series for every keyword
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `cancel` fires before or between batches.
    /// Fetch failures never fail the run; they end up in [`BatchReport::failed`].
    pub async fn process(
        &self,
        keywords: &[String],
        mut progress: Option<BatchProgress<'_>>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        let total = keywords.len();
        let mut report = BatchReport::default();

        if total == 0 {
            return Ok(report);
        }

        let batches = total.div_ceil(self.batch_size);
        tracing::info!(
            keywords = total,
            batches = batches,
            batch_size = self.batch_size,
            "Starting batched trend fetch"
        );

        let mut processed = 0;
        for (index, chunk) in keywords.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(batch = index + 1, "Batch run cancelled");
                return Err(Error::Cancelled);
            }

            if index > 0 && !self.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::info!(batch = index + 1, "Batch run cancelled during pause");
                        return Err(Error::Cancelled);
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }

            report.batch_count += 1;
            match self.fetcher.fetch(chunk).await {
                Ok(mut outcome) => {
                    for keyword in chunk {
                        match outcome.remove(keyword) {
                            Some(Ok(series)) => report.series.push(series),
                            Some(Err(e)) => {
                                tracing::debug!(keyword = %keyword, error = %e, "Keyword fetch failed");
                                report.failed.push(FailedKeyword {
                                    keyword: keyword.clone(),
                                    error: e.to_string(),
                                });
                            }
                            None => report.failed.push(FailedKeyword {
                                keyword: keyword.clone(),
                                error: "missing from response".to_string(),
                            }),
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        batch = index + 1,
                        size = chunk.len(),
                        error = %e,
                        "Batch request failed"
                    );
                    report.failed.extend(chunk.iter().map(|keyword| FailedKeyword {
                        keyword: keyword.clone(),
                        error: e.to_string(),
                    }));
                }
            }

            processed += chunk.len();
            if let Some(callback) = progress.as_mut() {
                callback(processed, total);
            }
        }

        tracing::info!(
            analyzed = report.series.len(),
            failed = report.failed.len(),
            "Batched trend fetch finished"
        );

        Ok(report)
    }
}
