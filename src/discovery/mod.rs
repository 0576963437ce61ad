//! Smart Discovery orchestration
//!
//! Runs a seed keyword through the full pipeline:
//! cache check, expansion, batched trend analysis, opportunity scoring,
//! grade filtering and persistence. Stages run strictly in order and report
//! through a [`MultiStageProgressTracker`].

use chrono::Utc;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::analytics::OpportunityScorer;
use crate::cache::{CacheManager, CacheStats};
use crate::error::{Error, Result};
use crate::fetcher::BatchProcessor;
use crate::generators::KeywordExpander;
use crate::models::{DiscoveryResult, Grade};
use crate::progress::{MultiStageProgressTracker, StageCallback};
use crate::utils::error::{CacheError, ValidationError};
use crate::utils::normalize_whitespace;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStage {
    CheckCache,
    GenerateKeywords,
    AnalyzeTrends,
    ScoreOpportunities,
    FilterAndFinalize,
}

impl DiscoveryStage {
    pub const ALL: [DiscoveryStage; 5] = [
        DiscoveryStage::CheckCache,
        DiscoveryStage::GenerateKeywords,
        DiscoveryStage::AnalyzeTrends,
        DiscoveryStage::ScoreOpportunities,
        DiscoveryStage::FilterAndFinalize,
    ];

    /// Label reported to progress observers
    pub fn label(&self) -> &'static str {
        match self {
            Self::CheckCache => "캐시 확인",
            Self::GenerateKeywords => "키워드 생성",
            Self::AnalyzeTrends => "트렌드 분석",
            Self::ScoreOpportunities => "기회 점수 계산",
            Self::FilterAndFinalize => "등급 필터링",
        }
    }

    /// Relative share of the overall progress
    pub fn weight(&self) -> f64 {
        match self {
            Self::CheckCache => 5.0,
            Self::GenerateKeywords => 10.0,
            Self::AnalyzeTrends => 60.0,
            Self::ScoreOpportunities => 15.0,
            Self::FilterAndFinalize => 10.0,
        }
    }

    /// Fresh tracker over all stages
    pub fn tracker() -> MultiStageProgressTracker {
        MultiStageProgressTracker::new(Self::ALL.iter().map(|s| (s.label(), s.weight())))
    }
}

/// Per-run options
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub use_autocomplete: bool,
    pub min_grade: Grade,
    pub use_cache: bool,
    pub cancellation: CancellationToken,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            use_autocomplete: true,
            min_grade: Grade::C,
            use_cache: true,
            cancellation: CancellationToken::new(),
        }
    }
}

/// Discovery pipeline over an expander, a batch processor and a cache
pub struct SmartDiscoveryService {
    expander: KeywordExpander,
    batch: BatchProcessor,
    cache: CacheManager,
}

impl SmartDiscoveryService {
    pub fn new(expander: KeywordExpander, batch: BatchProcessor, cache: CacheManager) -> Self {
        Self {
            expander,
            batch,
            cache,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Discover publishing opportunities around `seed`
    ///
    /// Collaborator failures only shrink the result; the run fails on invalid
    /// input or cancellation.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for an empty or whitespace-only seed
    /// - `Error::Cancelled` when `options.cancellation` fires; nothing is cached
    pub async fn discover(
        &mut self,
        seed: &str,
        options: &DiscoveryOptions,
        callback: Option<StageCallback>,
    ) -> Result<DiscoveryResult> {
        let seed = normalize_whitespace(seed);
        if seed.is_empty() {
            return Err(ValidationError::EmptyField("seed_keyword").into());
        }

        tracing::info!(
            seed = %seed,
            min_grade = %options.min_grade,
            use_cache = options.use_cache,
            use_autocomplete = options.use_autocomplete,
            "Starting smart discovery"
        );

        let mut tracker = DiscoveryStage::tracker().with_boxed_callback(callback);
        let mut progress = tracker.scope(format!("'{seed}' 분석 시작"));

        let outcome = self.run(&seed, options, &mut progress).await;
        if let Err(e) = &outcome {
            tracing::warn!(seed = %seed, error = %e, "Smart discovery aborted");
            progress.fail(e.to_string());
        }
        outcome
    }

    async fn run(
        &mut self,
        seed: &str,
        options: &DiscoveryOptions,
        progress: &mut MultiStageProgressTracker,
    ) -> Result<DiscoveryResult> {
        let started_at = Utc::now();
        let cancel = &options.cancellation;

        // Stage 1: cache
        checkpoint(cancel)?;
        if options.use_cache {
            if let Some(mut cached) = self.cache.load::<DiscoveryResult>(seed) {
                cached.cache_hit = true;
                cached.opportunities.retain(|o| o.grade() >= options.min_grade);
                progress.complete_all("캐시된 결과 사용");
                tracing::info!(
                    seed = %seed,
                    opportunities = cached.opportunities.len(),
                    "Returning cached discovery result"
                );
                return Ok(cached);
            }
        }

        // Stage 2: expansion
        progress.next_stage("키워드 생성 중");
        let keywords = self.expander.expand(seed, options.use_autocomplete).await?;
        let generated_count = keywords.len();

        // Stage 3: trend analysis
        checkpoint(cancel)?;
        progress.next_stage(format!("{generated_count}개 키워드 트렌드 분석 중"));
        let report = {
            let mut on_batch = |done: usize, total: usize| {
                let fraction = if total == 0 { 1.0 } else { done as f64 / total as f64 };
                progress.update_stage(fraction, format!("{done}/{total} 키워드 분석"));
            };
            self.batch.process(&keywords, Some(&mut on_batch), cancel).await?
        };
        let analyzed_count = report.series.len();
        if !report.failed.is_empty() {
            tracing::warn!(
                seed = %seed,
                failed = report.failed.len(),
                analyzed = analyzed_count,
                "Some keywords could not be analyzed"
            );
        }

        // Stage 4: scoring
        checkpoint(cancel)?;
        progress.next_stage("기회 점수 계산 중");
        let scores = OpportunityScorer::score_batch(&report.series);

        // Stage 5: filter, sort, persist
        checkpoint(cancel)?;
        progress.next_stage("등급 필터링 중");
        let mut opportunities = OpportunityScorer::filter_by_grade(scores, options.min_grade);
        OpportunityScorer::sort_descending(&mut opportunities);

        let result = DiscoveryResult {
            seed_keyword: seed.to_string(),
            generated_count,
            analyzed_count,
            opportunities,
            cache_hit: false,
            started_at,
            completed_at: Utc::now(),
        };

        if options.use_cache {
            let mut metadata = serde_json::Map::new();
            metadata.insert("processing_time".into(), json!(result.processing_time()));
            metadata.insert("success_rate".into(), json!(result.success_rate()));
            metadata.insert("average_score".into(), json!(result.average_score()));
            if let Err(e) = self.cache.save(seed, &result, metadata) {
                tracing::warn!(seed = %seed, error = %e, "Failed to cache discovery result");
            }
        }

        progress.next_stage("완료");
        tracing::info!(
            seed = %seed,
            generated = result.generated_count,
            analyzed = result.analyzed_count,
            opportunities = result.opportunities.len(),
            elapsed_secs = result.processing_time(),
            "Smart discovery completed"
        );

        Ok(result)
    }

    /// # Errors
    ///
    /// Returns `CacheError::Io` if the cache directory cannot be read
    pub fn cache_stats(&self) -> std::result::Result<CacheStats, CacheError> {
        self.cache.stats()
    }

    /// Remove every cache entry, returning the number of files deleted
    ///
    /// # Errors
    ///
    /// Returns `CacheError` on filesystem failure
    pub fn clear_cache(&mut self) -> std::result::Result<usize, CacheError> {
        self.cache.clear_all()
    }

    /// Remove expired cache entries, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns `CacheError` on filesystem failure
    pub fn clear_expired_cache(&mut self) -> std::result::Result<usize, CacheError> {
        self.cache.clear_expired()
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MomentumCalculator;
    use crate::fetcher::{FetchOutcome, TrendFetcher};
    use crate::models::TrendPoint;
    use crate::utils::error::FetchError;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Rising series for every keyword except review keywords
    struct RisingFetcher {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TrendFetcher for RisingFetcher {
        async fn fetch(&self, keywords: &[String]) -> std::result::Result<FetchOutcome, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(keywords
                .iter()
                .map(|k| {
                    if k.contains("후기") {
                        return (k.clone(), Err(FetchError::NoData(k.clone())));
                    }
                    let points = (0..14)
                        .map(|i| {
                            let ratio = if i < 7 { 40.0 } else { 80.0 };
                            TrendPoint::new(start + Duration::days(i), ratio)
                        })
                        .collect();
                    (k.clone(), Ok(MomentumCalculator::calculate(k.clone(), points)))
                })
                .collect())
        }
    }

    fn service(dir: &TempDir, calls: Arc<AtomicUsize>) -> SmartDiscoveryService {
        let batch = BatchProcessor::new(
            Arc::new(RisingFetcher { calls }),
            5,
            std::time::Duration::ZERO,
        );
        let cache = CacheManager::open(dir.path(), Duration::hours(24)).unwrap();
        SmartDiscoveryService::new(KeywordExpander::templates_only(30), batch, cache)
    }

    fn options(use_cache: bool) -> DiscoveryOptions {
        DiscoveryOptions {
            use_autocomplete: false,
            use_cache,
            ..DiscoveryOptions::default()
        }
    }

    #[test]
    fn test_stage_weights() {
        let total: f64 = DiscoveryStage::ALL.iter().map(|s| s.weight()).sum();
        assert_eq!(total, 100.0);
        assert_eq!(DiscoveryStage::AnalyzeTrends.label(), "트렌드 분석");
    }

    #[tokio::test]
    async fn test_discover_end_to_end() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = service(&dir, calls.clone());

        let events: Arc<Mutex<Vec<(String, usize, usize, f64)>>> = Arc::default();
        let sink = events.clone();
        let callback: StageCallback = Box::new(move |name, step, total, pct| {
            sink.lock().unwrap().push((name.to_string(), step, total, pct));
        });

        let result = service
            .discover("롱패딩", &options(true), Some(callback))
            .await
            .unwrap();

        assert_eq!(result.generated_count, 30);
        assert!(result.analyzed_count < 30);
        assert!(!result.cache_hit);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert!(result.opportunities.iter().all(|o| o.grade() >= Grade::C));
        assert!(result
            .opportunities
            .windows(2)
            .all(|w| w[0].total_score() >= w[1].total_score()));

        let events = events.lock().unwrap();
        assert_eq!(events.first().unwrap().0, "캐시 확인");
        assert_eq!(events.last().unwrap().3, 100.0);
        assert!(events.windows(2).all(|w| w[0].3 <= w[1].3));
        assert!(service.cache().is_cached("롱패딩"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetcher() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = service(&dir, calls.clone());

        let first = service.discover("롱패딩", &options(true), None).await.unwrap();
        let fetched = calls.load(Ordering::SeqCst);

        let events: Arc<Mutex<Vec<(String, f64)>>> = Arc::default();
        let sink = events.clone();
        let callback: StageCallback = Box::new(move |name, _, _, pct| {
            sink.lock().unwrap().push((name.to_string(), pct));
        });
        let second = service
            .discover(" 롱패딩 ", &options(true), Some(callback))
            .await
            .unwrap();

        assert!(second.cache_hit);
        assert_eq!(calls.load(Ordering::SeqCst), fetched);
        let keywords = |r: &DiscoveryResult| -> Vec<String> {
            r.opportunities.iter().map(|o| o.keyword.clone()).collect()
        };
        assert_eq!(keywords(&second), keywords(&first));
        let events = events.lock().unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.0, "캐시 확인");
        assert_eq!(last.1, 100.0);
        assert!(events.iter().all(|(name, _)| name == "캐시 확인"));
    }

    #[tokio::test]
    async fn test_no_cache_leaves_directory_untouched() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = service(&dir, calls);

        service.discover("롱패딩", &options(false), None).await.unwrap();

        assert!(!service.cache().is_cached("롱패딩"));
        assert_eq!(service.cache_stats().unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_empty_seed_rejected() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = service(&dir, calls.clone());

        let err = service.discover("   ", &options(true), None).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptyField("seed_keyword"))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = service(&dir, calls.clone());

        let opts = options(true);
        opts.cancellation.cancel();
        let err = service.discover("롱패딩", &opts, None).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!service.cache().is_cached("롱패딩"));
    }
}
