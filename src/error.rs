//! Unified error handling for the blogmate crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`BlogmateErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use blogmate::error::{Error, ErrorCategory, BlogmateErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.korean_desc());
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::utils::error::{CacheError, FetchError, ValidationError};

/// Common trait for all blogmate error types
pub trait BlogmateErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get Korean description for user-facing messages
    fn korean_desc(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid user input
    Validation,
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Cache and I/O errors
    Storage,
    /// Configuration errors
    Config,
    /// Run was cancelled by the caller
    Cancelled,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get Korean description for the category
    pub fn korean_desc(&self) -> &'static str {
        match self {
            Self::Validation => "입력 오류",
            Self::Network => "네트워크 오류",
            Self::Storage => "저장소 오류",
            Self::Config => "설정 오류",
            Self::Cancelled => "작업 취소",
            Self::Other => "기타 오류",
        }
    }
}

/// Unified error type for the blogmate crate
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid caller input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Trend or suggestion fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Cache write errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Cooperative cancellation was requested
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BlogmateErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Fetch(e) => e.is_recoverable(),
            Self::Cache(_) => true,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Http(_) => true, // HTTP errors are often transient
            Self::Config(_) => false,
            Self::Cancelled => false,
            Self::Other { .. } => false,
        }
    }

    fn korean_desc(&self) -> String {
        match self {
            Self::Validation(e) => e.korean_desc(),
            Self::Fetch(e) => e.korean_desc(),
            Self::Cache(e) => e.korean_desc(),
            Self::Io(e) => format!("입출력 오류: {e}"),
            Self::Json(e) => format!("JSON 오류: {e}"),
            Self::Http(e) => format!("HTTP 오류: {e}"),
            Self::Config(msg) => format!("설정 오류: {msg}"),
            Self::Cancelled => "작업이 취소되었습니다".to_string(),
            Self::Other { context, .. } => context.clone(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Fetch(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Cache(_) | Self::Io(_) | Self::Json(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
