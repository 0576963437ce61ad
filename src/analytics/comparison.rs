//! Side-by-side trend comparison of a handful of keywords

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::fetcher::{FailedKeyword, TrendFetcher, MAX_KEYWORDS_PER_REQUEST};
use crate::models::TrendSeries;
use crate::utils::error::ValidationError;
use crate::utils::normalize_whitespace;

/// Outcome of comparing up to five keywords
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub input_keywords: Vec<String>,
    /// Sorted by series score, best first
    pub trends: Vec<TrendSeries>,
    pub failed: Vec<FailedKeyword>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ComparisonResult {
    pub fn best_keyword(&self) -> Option<&TrendSeries> {
        self.trends.first()
    }

    pub fn successful(&self) -> usize {
        self.trends.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.input_keywords.is_empty() {
            return 0.0;
        }
        self.trends.len() as f64 / self.input_keywords.len() as f64 * 100.0
    }

    pub fn processing_time(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// 1-based rank paired with each series
    pub fn ranking(&self) -> Vec<(usize, &TrendSeries)> {
        self.trends.iter().enumerate().map(|(i, t)| (i + 1, t)).collect()
    }

    pub fn to_summary(&self) -> String {
        let Some(best) = self.best_keyword() else {
            return "분석 결과가 없습니다.".to_string();
        };

        let rule = "=".repeat(60);
        [
            rule.clone(),
            "분석 결과 요약".to_string(),
            rule.clone(),
            String::new(),
            format!("분석 키워드: {}개", self.input_keywords.len()),
            format!("성공: {}개", self.successful()),
            format!("실패: {}개", self.failed.len()),
            format!("소요 시간: {:.1}초", self.processing_time()),
            String::new(),
            rule.clone(),
            "최고 키워드".to_string(),
            rule.clone(),
            String::new(),
            format!("키워드: {}", best.keyword()),
            format!("종합 점수: {:.1}/100 (등급: {})", best.total_score(), best.grade()),
            format!("전체 평균: {:.1}", best.average_ratio()),
            format!("최근 추세: {:.1}", best.recent_ratio()),
            format!("모멘텀: {:+.1}%", best.momentum()),
            format!("트렌드: {}", best.direction().korean_name()),
            format!("긴급도: {}", best.urgency().message()),
            String::new(),
            rule,
        ]
        .join("\n")
    }
}

/// Compares keywords with a single trend request
pub struct KeywordComparisonService {
    fetcher: Arc<dyn TrendFetcher>,
}

impl KeywordComparisonService {
    pub fn new(fetcher: Arc<dyn TrendFetcher>) -> Self {
        Self { fetcher }
    }

    /// Compare 1 to 5 keywords
    ///
    /// # Errors
    ///
    /// Validation errors for an empty list or more than five keywords, and
    /// `Error::Fetch` when the request as a whole fails.
    pub async fn compare(&self, keywords: &[String]) -> Result<ComparisonResult> {
        let input: Vec<String> = keywords
            .iter()
            .map(|k| normalize_whitespace(k))
            .filter(|k| !k.is_empty())
            .collect();

        if input.is_empty() {
            return Err(ValidationError::NoKeywords.into());
        }
        if input.len() > MAX_KEYWORDS_PER_REQUEST {
            return Err(ValidationError::TooManyKeywords {
                max: MAX_KEYWORDS_PER_REQUEST,
                got: input.len(),
            }
            .into());
        }

        tracing::info!(keywords = ?input, "Comparing keywords");
        let started_at = Utc::now();

        let mut outcome = self.fetcher.fetch(&input).await?;

        let mut trends = Vec::new();
        let mut failed = Vec::new();
        for keyword in &input {
            match outcome.remove(keyword) {
                Some(Ok(series)) => trends.push(series),
                Some(Err(e)) => failed.push(FailedKeyword {
                    keyword: keyword.clone(),
                    error: e.to_string(),
                }),
                None => failed.push(FailedKeyword {
                    keyword: keyword.clone(),
                    error: "missing from response".to_string(),
                }),
            }
        }
        trends.sort_by(|a, b| b.total_score().total_cmp(&a.total_score()));

        let result = ComparisonResult {
            input_keywords: input,
            trends,
            failed,
            started_at,
            completed_at: Utc::now(),
        };

        if let Some(best) = result.best_keyword() {
            tracing::info!(
                best = %best.keyword(),
                score = best.total_score(),
                success_rate = result.success_rate(),
                "Comparison finished"
            );
        }

        Ok(result)
    }
}
