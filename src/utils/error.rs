//! Error types for blogmate
//!
//! This module defines the domain error types used throughout the application.

use thiserror::Error;

/// Input validation errors
///
/// Every variant names the offending field so callers can report it verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty or whitespace-only
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Grade literal is not one of S, A, B, C, D
    #[error("min_grade: invalid grade '{0}' (expected one of S, A, B, C, D)")]
    InvalidGrade(String),

    /// Too many keywords in a single request
    #[error("keywords: at most {max} keywords allowed, got {got}")]
    TooManyKeywords { max: usize, got: usize },

    /// No keywords supplied
    #[error("keywords: at least one keyword is required")]
    NoKeywords,
}

impl ValidationError {
    /// Korean description for user-facing messages
    pub fn korean_desc(&self) -> String {
        match self {
            Self::EmptyField(field) => format!("{field} 값이 비어 있습니다"),
            Self::InvalidGrade(value) => format!("잘못된 등급입니다: {value}"),
            Self::TooManyKeywords { max, got } => {
                format!("키워드는 최대 {max}개까지 가능합니다 (입력: {got}개)")
            }
            Self::NoKeywords => "키워드를 하나 이상 입력하세요".to_string(),
        }
    }
}

/// Errors that can occur while fetching trend data or suggestions
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Client error with status code (bad credentials, malformed request)
    #[error("Request rejected with status {0}")]
    ClientError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// More keywords than the provider accepts in one request
    #[error("Too many keywords in one request: {0} (max 5)")]
    TooManyKeywords(usize),

    /// Provider returned no data points for the keyword
    #[error("No trend data for keyword: {0}")]
    NoData(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Collaborator is not configured
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    /// Check if retrying the same request may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::RateLimit | Self::ServerError(_) | Self::Timeout
        )
    }

    /// Korean description for user-facing messages
    pub fn korean_desc(&self) -> String {
        match self {
            Self::Http(e) => format!("HTTP 요청 실패: {e}"),
            Self::RateLimit => "요청 한도 초과".to_string(),
            Self::ServerError(code) => format!("서버 오류 ({code})"),
            Self::ClientError(code) => format!("요청 거부 ({code})"),
            Self::Timeout => "요청 시간 초과".to_string(),
            Self::MaxRetriesExceeded => "최대 재시도 횟수 초과".to_string(),
            Self::TooManyKeywords(n) => format!("한 번에 요청 가능한 키워드 수 초과 ({n}개)"),
            Self::NoData(keyword) => format!("트렌드 데이터 없음: {keyword}"),
            Self::InvalidResponse(msg) => format!("잘못된 응답: {msg}"),
            Self::Unavailable(msg) => format!("서비스 사용 불가: {msg}"),
        }
    }
}

/// Errors raised by the file cache on write paths
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure
    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key is empty after normalization
    #[error("cache key must not be empty")]
    EmptyKey,
}

impl CacheError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Korean description for user-facing messages
    pub fn korean_desc(&self) -> String {
        match self {
            Self::Io { path, source } => format!("캐시 파일 오류 ({path}): {source}"),
            Self::Serialize(e) => format!("캐시 직렬화 오류: {e}"),
            Self::EmptyKey => "캐시 키가 비어 있습니다".to_string(),
        }
    }
}
