//! Naver DataLab search trend client
//!
//! This module provides the HTTP client for the DataLab search trend API
//! with features including:
//! - Rate limiting with governor
//! - Automatic retry with exponential backoff on 429/5xx
//! - One keyword group per keyword, at most five per request

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use super::{FetchOutcome, TrendFetcher, MAX_KEYWORDS_PER_REQUEST};
use crate::analytics::MomentumCalculator;
use crate::config::DataLabConfig;
use crate::models::TrendPoint;
use crate::utils::error::FetchError;

const DATALAB_PATH: &str = "/v1/datalab/search";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    start_date: String,
    end_date: String,
    time_unit: &'static str,
    keyword_groups: Vec<KeywordGroup<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordGroup<'a> {
    group_name: &'a str,
    keywords: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: String,
    #[serde(default)]
    data: Vec<DataEntry>,
}

#[derive(Debug, Deserialize)]
struct DataEntry {
    period: NaiveDate,
    ratio: f64,
}

/// DataLab search trend client
pub struct DataLabClient {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Full URL of the search trend endpoint
    endpoint: String,

    client_id: String,
    client_secret: String,

    /// Maximum number of retry attempts for failed requests
    max_retries: u32,

    /// Base delay for exponential backoff
    base_delay: Duration,

    /// Days of history requested, ending today
    period_days: i64,
}

impl DataLabClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unavailable` when credentials are missing and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &DataLabConfig) -> Result<Self, FetchError> {
        if !config.has_credentials() {
            return Err(FetchError::Unavailable(
                "DataLab client id/secret not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            endpoint: config.endpoint.clone(),
            client_id: config.client_id.clone().unwrap_or_default(),
            client_secret: config.client_secret.clone().unwrap_or_default(),
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(1),
            period_days: config.period_days,
        })
    }

    /// Create a client against a custom base URL for testing
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_base_url(base_url: &str, client_id: &str, client_secret: &str) -> Result<Self, FetchError> {
        let config = DataLabConfig {
            endpoint: format!("{}{DATALAB_PATH}", base_url.trim_end_matches('/')),
            client_id: Some(client_id.to_string()),
            client_secret: Some(client_secret.to_string()),
            requests_per_second: 100,
            ..DataLabConfig::default()
        };
        Self::new(&config)
    }

    /// Override the backoff base delay
    #[must_use]
    pub fn with_retry_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Override the retry count
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn build_request<'a>(&self, keywords: &'a [String], today: NaiveDate) -> SearchRequest<'a> {
        let start = today - ChronoDuration::days(self.period_days);
        SearchRequest {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: today.format("%Y-%m-%d").to_string(),
            time_unit: "date",
            keyword_groups: keywords
                .iter()
                .map(|k| KeywordGroup {
                    group_name: k.as_str(),
                    keywords: [k.as_str()],
                })
                .collect(),
        }
    }

    /// POST with exponential backoff retry logic
    async fn post_with_retry(&self, body: &SearchRequest<'_>) -> Result<SearchResponse, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay.saturating_mul(2_u32.saturating_pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            self.rate_limiter.until_ready().await;

            let request = self
                .client
                .post(&self.endpoint)
                .header("X-Naver-Client-Id", &self.client_id)
                .header("X-Naver-Client-Secret", &self.client_secret)
                .json(body);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .json::<SearchResponse>()
                            .await
                            .map_err(|e| FetchError::InvalidResponse(e.to_string()));
                    } else if Self::should_retry(status.as_u16()) {
                        tracing::warn!(status = %status, attempt = attempt, "DataLab request failed, retrying");
                        last_error = Some(if status.as_u16() == 429 {
                            FetchError::RateLimit
                        } else {
                            FetchError::ServerError(status.as_u16())
                        });
                    } else {
                        return Err(FetchError::ClientError(status.as_u16()));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt = attempt, "DataLab request error");
                    last_error = Some(if e.is_timeout() {
                        FetchError::Timeout
                    } else {
                        FetchError::Http(e)
                    });
                }
            }
        }

        if let Some(e) = last_error {
            tracing::error!(error = %e, "DataLab retries exhausted");
        }
        Err(FetchError::MaxRetriesExceeded)
    }

    /// Determine if a status code should trigger a retry
    fn should_retry(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    fn collect_outcome(keywords: &[String], response: SearchResponse) -> FetchOutcome {
        let mut by_title: HashMap<String, Vec<TrendPoint>> = response
            .results
            .into_iter()
            .map(|r| {
                let points = r
                    .data
                    .into_iter()
                    .map(|d| TrendPoint::new(d.period, d.ratio))
                    .collect();
                (r.title, points)
            })
            .collect();

        keywords
            .iter()
            .map(|keyword| {
                let result = match by_title.remove(keyword) {
                    Some(points) if !points.is_empty() => {
                        Ok(MomentumCalculator::calculate(keyword.clone(), points))
                    }
                    _ => Err(FetchError::NoData(keyword.clone())),
                };
                (keyword.clone(), result)
            })
            .collect()
    }
}

#[async_trait]
impl TrendFetcher for DataLabClient {
    async fn fetch(&self, keywords: &[String]) -> Result<FetchOutcome, FetchError> {
        if keywords.len() > MAX_KEYWORDS_PER_REQUEST {
            return Err(FetchError::TooManyKeywords(keywords.len()));
        }
        if keywords.is_empty() {
            return Ok(FetchOutcome::new());
        }

        let body = self.build_request(keywords, Utc::now().date_naive());
        tracing::debug!(count = keywords.len(), start = %body.start_date, end = %body.end_date, "Requesting DataLab trends");

        let response = self.post_with_retry(&body).await?;
        Ok(Self::collect_outcome(keywords, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DataLabClient {
        DataLabClient::with_base_url("http://localhost:8080", "id", "secret").unwrap()
    }

    #[test]
    fn test_should_retry() {
        assert!(DataLabClient::should_retry(429));
        assert!(DataLabClient::should_retry(500));
        assert!(DataLabClient::should_retry(503));
        assert!(!DataLabClient::should_retry(400));
        assert!(!DataLabClient::should_retry(401));
        assert!(!DataLabClient::should_retry(200));
    }

    #[test]
    fn test_missing_credentials() {
        let result = DataLabClient::new(&DataLabConfig::default());
        assert!(matches!(result, Err(FetchError::Unavailable(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let keywords = vec!["롱패딩".to_string(), "롱패딩 추천".to_string()];
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let body = client().build_request(&keywords, today);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["startDate"], "2024-10-02");
        assert_eq!(json["endDate"], "2024-12-31");
        assert_eq!(json["timeUnit"], "date");
        assert_eq!(json["keywordGroups"][1]["groupName"], "롱패딩 추천");
        assert_eq!(json["keywordGroups"][1]["keywords"][0], "롱패딩 추천");
    }

    #[test]
    fn test_collect_outcome_marks_missing_keywords() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"results":[
                {"title":"a","data":[{"period":"2024-01-01","ratio":10.0},{"period":"2024-01-02","ratio":20.0}]},
                {"title":"b","data":[]}
            ]}"#,
        )
        .unwrap();
        let keywords = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let outcome = DataLabClient::collect_outcome(&keywords, response);

        assert_eq!(outcome["a"].as_ref().unwrap().points().len(), 2);
        assert!(matches!(outcome["b"], Err(FetchError::NoData(_))));
        assert!(matches!(outcome["c"], Err(FetchError::NoData(_))));
    }

    #[tokio::test]
    async fn test_rejects_more_than_five_keywords() {
        let keywords: Vec<String> = (0..6).map(|i| format!("k{i}")).collect();
        let result = client().fetch(&keywords).await;
        assert!(matches!(result, Err(FetchError::TooManyKeywords(6))));
    }
}
