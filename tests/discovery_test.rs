//! End-to-end tests for the Smart Discovery pipeline with scripted fetchers

mod common;

use blogmate::cache::{CacheManager, INDEX_FILE};
use blogmate::discovery::{DiscoveryOptions, SmartDiscoveryService};
use blogmate::error::{Error, ValidationError};
use blogmate::fetcher::{BatchProcessor, TrendFetcher, UnavailableTrendFetcher};
use blogmate::generators::KeywordExpander;
use blogmate::models::Grade;
use blogmate::progress::StageCallback;
use common::ScriptedFetcher;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn service(dir: &TempDir, fetcher: Arc<dyn TrendFetcher>) -> SmartDiscoveryService {
    let batch = BatchProcessor::new(fetcher, 5, Duration::ZERO);
    let cache = CacheManager::open(dir.path(), chrono::Duration::hours(24)).unwrap();
    SmartDiscoveryService::new(KeywordExpander::templates_only(30), batch, cache)
}

fn options(use_cache: bool, min_grade: Grade) -> DiscoveryOptions {
    DiscoveryOptions {
        use_autocomplete: false,
        min_grade,
        use_cache,
        ..DiscoveryOptions::default()
    }
}

/// Reviews have no data, troubleshooting keywords are collapsing, the rest rise
fn mixed_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new(|keyword| {
        if keyword.contains("리뷰") {
            None
        } else if keyword.contains("오류") {
            Some((10.0, 2.0))
        } else {
            Some((40.0, 90.0))
        }
    })
}

#[tokio::test]
async fn test_discover_long_padding() {
    let dir = TempDir::new().unwrap();
    let fetcher = mixed_fetcher();
    let calls = fetcher.calls();
    let requests = fetcher.requests();
    let mut service = service(&dir, Arc::new(fetcher));

    let result = service
        .discover("롱패딩", &options(false, Grade::C), None)
        .await
        .unwrap();

    let candidates = KeywordExpander::templates_only(30)
        .expand("롱패딩", false)
        .await
        .unwrap();
    let missing = candidates.iter().filter(|k| k.contains("리뷰")).count();
    let collapsing = candidates.iter().filter(|k| k.contains("오류")).count();

    assert_eq!(result.seed_keyword, "롱패딩");
    assert_eq!(result.generated_count, candidates.len());
    assert!(result.generated_count <= 30);
    assert_eq!(result.analyzed_count, candidates.len() - missing);
    assert_eq!(result.opportunities.len(), candidates.len() - missing - collapsing);
    assert!(!result.cache_hit);

    assert!(result.opportunities.iter().all(|o| o.grade() >= Grade::C));
    assert!(result.opportunities.iter().all(|o| o.grade() != Grade::D));
    assert!(result
        .opportunities
        .windows(2)
        .all(|w| w[0].total_score() >= w[1].total_score()));

    assert_eq!(calls.load(Ordering::SeqCst), candidates.len().div_ceil(5));
    assert!(requests.lock().unwrap().iter().all(|r| r.len() <= 5));
}

#[tokio::test]
async fn test_stricter_grade_keeps_subset() {
    let dir = TempDir::new().unwrap();
    let mut service = service(&dir, Arc::new(mixed_fetcher()));

    let lenient = service
        .discover("롱패딩", &options(false, Grade::D), None)
        .await
        .unwrap();
    let strict = service
        .discover("롱패딩", &options(false, Grade::S), None)
        .await
        .unwrap();

    assert_eq!(lenient.opportunities.len(), lenient.analyzed_count);
    assert!(strict.opportunities.len() <= lenient.opportunities.len());
    assert!(strict.opportunities.iter().all(|o| o.grade() == Grade::S));
}

#[tokio::test]
async fn test_second_run_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::rising();
    let calls = fetcher.calls();
    let mut service = service(&dir, Arc::new(fetcher));

    let first = service
        .discover("롱패딩", &options(true, Grade::C), None)
        .await
        .unwrap();
    let fetched = calls.load(Ordering::SeqCst);
    assert!(fetched > 0);

    let second = service
        .discover("롱패딩", &options(true, Grade::C), None)
        .await
        .unwrap();

    assert!(second.cache_hit);
    assert_eq!(calls.load(Ordering::SeqCst), fetched);
    assert_eq!(second.generated_count, first.generated_count);
    assert_eq!(second.opportunities.len(), first.opportunities.len());

    let stats = service.cache_stats().unwrap();
    assert_eq!(stats.valid_entries, 1);
}

#[tokio::test]
async fn test_corrupt_entry_is_refetched_and_recached() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::rising();
    let calls = fetcher.calls();
    let mut service = service(&dir, Arc::new(fetcher));

    service
        .discover("롱패딩", &options(true, Grade::C), None)
        .await
        .unwrap();
    let fetched = calls.load(Ordering::SeqCst);
    assert!(fetched > 0);

    let index: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap()).unwrap();
    let entry_file = index["롱패딩"]["file"].as_str().unwrap();
    std::fs::write(dir.path().join(entry_file), "{ truncated").unwrap();

    let second = service
        .discover("롱패딩", &options(true, Grade::C), None)
        .await
        .unwrap();
    assert!(!second.cache_hit);
    let refetched = calls.load(Ordering::SeqCst);
    assert!(refetched > fetched);

    let third = service
        .discover("롱패딩", &options(true, Grade::C), None)
        .await
        .unwrap();
    assert!(third.cache_hit);
    assert_eq!(calls.load(Ordering::SeqCst), refetched);
    assert_eq!(third.opportunities.len(), second.opportunities.len());
}

#[tokio::test]
async fn test_cache_survives_service_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut service = service(&dir, Arc::new(ScriptedFetcher::rising()));
        service
            .discover("캠핑 의자", &options(true, Grade::C), None)
            .await
            .unwrap();
    }

    let fetcher = ScriptedFetcher::rising();
    let calls = fetcher.calls();
    let mut service = service(&dir, Arc::new(fetcher));
    let result = service
        .discover("캠핑  의자", &options(true, Grade::C), None)
        .await
        .unwrap();

    assert!(result.cache_hit);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_progress_reaches_hundred() {
    let dir = TempDir::new().unwrap();
    let mut service = service(&dir, Arc::new(ScriptedFetcher::rising()));

    let events: Arc<Mutex<Vec<(String, usize, usize, f64)>>> = Arc::default();
    let sink = events.clone();
    let callback: StageCallback = Box::new(move |stage, step, total, percent| {
        sink.lock().unwrap().push((stage.to_string(), step, total, percent));
    });

    service
        .discover("롱패딩", &options(false, Grade::C), Some(callback))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.first().unwrap().0, "캐시 확인");
    assert_eq!(events.first().unwrap().3, 0.0);
    assert!(events.iter().any(|e| e.0 == "트렌드 분석"));
    assert!(events.iter().all(|e| e.2 == 5));
    assert!(events.windows(2).all(|w| w[0].3 <= w[1].3));
    assert_eq!(events.last().unwrap().3, 100.0);
}

#[tokio::test]
async fn test_unavailable_fetcher_yields_empty_result() {
    let dir = TempDir::new().unwrap();
    let mut service = service(&dir, Arc::new(UnavailableTrendFetcher::new("no credentials")));

    let result = service
        .discover("롱패딩", &options(false, Grade::C), None)
        .await
        .unwrap();

    assert_eq!(result.generated_count, 30);
    assert_eq!(result.analyzed_count, 0);
    assert!(result.opportunities.is_empty());
    assert_eq!(result.success_rate(), 0.0);
    assert!(result.best_opportunity().is_none());
}

#[tokio::test]
async fn test_blank_seed_is_rejected() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::rising();
    let calls = fetcher.calls();
    let mut service = service(&dir, Arc::new(fetcher));

    let err = service
        .discover(" \t ", &options(true, Grade::C), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::EmptyField("seed_keyword"))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(service.cache_stats().unwrap().total_entries, 0);
}

#[tokio::test]
async fn test_cancelled_discovery_caches_nothing() {
    let dir = TempDir::new().unwrap();
    let mut service = service(&dir, Arc::new(ScriptedFetcher::rising()));

    let opts = options(true, Grade::C);
    opts.cancellation.cancel();

    let err = service.discover("롱패딩", &opts, None).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(service.cache_stats().unwrap().total_entries, 0);
}

#[test]
fn test_invalid_grade_names_field() {
    let err = "X".parse::<Grade>().unwrap_err();
    assert!(err.to_string().contains("min_grade"));
    assert_eq!(" b ".parse::<Grade>().unwrap(), Grade::B);
}
