use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Failure of one upstream fetch. Stored as the cache's last error, so it
/// carries owned strings rather than the underlying client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("influx request failed: {0}")]
    Transport(String),

    #[error("influx returned HTTP {status_code}: {body_excerpt}")]
    UpstreamHttp {
        status_code: u16,
        body_excerpt: String,
    },

    #[error("influx response was not valid JSON: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "TransportError",
            FetchError::UpstreamHttp { .. } => "UpstreamHTTPError",
            FetchError::Decode(_) => "DecodeError",
        }
    }

    pub fn summary(&self) -> FetchErrorSummary {
        FetchErrorSummary {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchErrorSummary {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_error_taxonomy() {
        assert_eq!(
            FetchError::Transport("refused".into()).kind(),
            "TransportError"
        );
        assert_eq!(
            FetchError::UpstreamHttp {
                status_code: 401,
                body_excerpt: "unauthorized".into()
            }
            .kind(),
            "UpstreamHTTPError"
        );
        assert_eq!(FetchError::Decode("eof".into()).kind(), "DecodeError");
    }

    #[test]
    fn upstream_message_includes_status_and_body() {
        let err = FetchError::UpstreamHttp {
            status_code: 400,
            body_excerpt: r#"{"error":"database not found"}"#.into(),
        };
        let summary = err.summary();
        assert_eq!(summary.kind, "UpstreamHTTPError");
        assert!(summary.message.contains("400"));
        assert!(summary.message.contains("database not found"));
    }

    #[test]
    fn app_error_keeps_status() {
        let response = AppError::not_found("Not Found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
