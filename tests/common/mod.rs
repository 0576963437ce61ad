//! Common test utilities

use async_trait::async_trait;
use blogmate::analytics::MomentumCalculator;
use blogmate::error::FetchError;
use blogmate::fetcher::{FetchOutcome, TrendFetcher};
use blogmate::models::{TrendPoint, TrendSeries};
use chrono::{Duration, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Fourteen daily points: a week at `previous`, then a week at `recent`
#[allow(dead_code)]
pub fn two_week_series(keyword: &str, previous: f64, recent: f64) -> TrendSeries {
    let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
    let points = (0..14)
        .map(|i| {
            let ratio = if i < 7 { previous } else { recent };
            TrendPoint::new(start + Duration::days(i), ratio)
        })
        .collect();
    MomentumCalculator::calculate(keyword, points)
}

/// Fetcher answering from a rule, recording every request
#[allow(dead_code)]
pub struct ScriptedFetcher {
    rule: Box<dyn Fn(&str) -> Option<(f64, f64)> + Send + Sync>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    /// `rule(keyword)` gives `(previous, recent)` levels, or `None` for no data
    pub fn new(rule: impl Fn(&str) -> Option<(f64, f64)> + Send + Sync + 'static) -> Self {
        Self {
            rule: Box::new(rule),
            calls: Arc::default(),
            requests: Arc::default(),
        }
    }

    /// Strongly rising series for every keyword
    pub fn rising() -> Self {
        Self::new(|_| Some((40.0, 90.0)))
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl TrendFetcher for ScriptedFetcher {
    async fn fetch(&self, keywords: &[String]) -> Result<FetchOutcome, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(keywords.to_vec());

        if keywords.len() > blogmate::fetcher::MAX_KEYWORDS_PER_REQUEST {
            return Err(FetchError::TooManyKeywords(keywords.len()));
        }

        Ok(keywords
            .iter()
            .map(|k| {
                let result = match (self.rule)(k) {
                    Some((previous, recent)) => Ok(two_week_series(k, previous, recent)),
                    None => Err(FetchError::NoData(k.clone())),
                };
                (k.clone(), result)
            })
            .collect())
    }
}
