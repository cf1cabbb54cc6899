//! Provider error types and retry classification.

use reqwest::StatusCode;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Rate limit, connection failure, 5xx — worth retrying with backoff.
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Auth, permission, not-found — retrying will not help.
    #[error("permanent provider error: {0}")]
    Permanent(String),

    /// The provider replied but the body was not what we expected.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::Permanent(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify an HTTP error status.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => {
                Self::Permanent("authentication failed, check the API key".to_string())
            }
            StatusCode::FORBIDDEN => {
                Self::Permanent("permission denied by the provider".to_string())
            }
            StatusCode::NOT_FOUND => Self::Permanent("provider resource not found".to_string()),
            StatusCode::TOO_MANY_REQUESTS => {
                Self::Transient("provider rate limit exceeded".to_string())
            }
            s if s.is_server_error() => {
                Self::Transient(format!("provider returned {}: {}", s, truncate(body)))
            }
            s => Self::Permanent(format!("provider returned {}: {}", s, truncate(body))),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, ProviderError::Permanent(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Transient(format!("request failed: {err}"))
        } else if err.is_decode() {
            Self::InvalidResponse(format!("undecodable response: {err}"))
        } else {
            Self::Transient(format!("{err}"))
        }
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        body.to_string()
    } else {
        // Back off to a char boundary so multi-byte bodies cannot panic.
        let mut end = LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(ProviderError::from_status(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(ProviderError::from_status(StatusCode::UNAUTHORIZED, "").is_permanent());
        assert!(ProviderError::from_status(StatusCode::FORBIDDEN, "").is_permanent());
        assert!(ProviderError::from_status(StatusCode::NOT_FOUND, "").is_permanent());
        assert!(ProviderError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "").is_permanent());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let err = ProviderError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(err.to_string().len() < 300);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // A multi-byte char straddling the cut point must not panic.
        let body = format!("{}é{}", "x".repeat(199), "y".repeat(100));
        let err = ProviderError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(err.to_string().len() < 300);

        let body = format!("{}🎬🎬🎬", "x".repeat(198));
        let err = ProviderError::from_status(StatusCode::BAD_GATEWAY, &body);
        assert!(err.is_transient());
    }
}
