//! HTTP plumbing for remote bibliographic services.
//!
//! Requests run on async reqwest inside a shared tokio runtime, but callers
//! see a blocking interface: the pipelines are sequential and only ever have
//! one request in flight.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from one call to a remote service
#[derive(Debug)]
pub enum ServiceError {
    /// Transport failure or non-success status
    Http {
        status: Option<u16>,
        message: String,
    },
    /// The request exceeded its deadline
    Timeout,
    /// The service answered, but the body could not be understood
    Malformed(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped so API keys in query strings never reach the logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    /// Rate-limit rejection (HTTP 429)
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: Some(429),
                ..
            }
        )
    }
}

/// Build an HTTP client with a whole-request timeout.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .pool_max_idle_per_host(2)
        .build()
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> ServiceError {
        ServiceError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn http_429_is_rate_limited() {
        assert!(http_err(429).is_rate_limited());
    }

    #[test]
    fn http_500_not_rate_limited() {
        assert!(!http_err(500).is_rate_limited());
        assert!(!ServiceError::Timeout.is_rate_limited());
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(format!("{}", http_err(404)), "HTTP 404: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = ServiceError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: connection refused");
    }

    #[test]
    fn display_malformed() {
        let err = ServiceError::Malformed("missing count".to_string());
        assert_eq!(format!("{err}"), "malformed response: missing count");
    }

    #[test]
    fn client_builds() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }
}
