//! Error types
//!
//! Two classes are kept apart: [`AnalysisError`] for queries whose range
//! bounds cannot be resolved, and [`ApiError`] for transport and availability
//! failures of the remote services. [`WindowError`] joins them for the
//! end-to-end window resolution.

use serde::Deserialize;
use thiserror::Error;

/// Failure to resolve the range bounds of an AST
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("range call is missing the required `start` argument")]
    MissingStart,

    #[error("range call must take a single object argument")]
    MalformedRange,

    #[error("unable to resolve identifier \"{0}\"")]
    UnresolvedIdentifier(String),

    #[error("cannot resolve identifier \"{0}\" with duplicate declarations")]
    DuplicateDeclaration(String),

    #[error("cannot resolve object expression {object}.{property}")]
    UnresolvedMember { object: String, property: String },

    #[error("identifier \"{0}\" is not bound to an object expression")]
    NotAnObject(String),

    #[error("invalid date-time literal \"{0}\"")]
    InvalidDateTime(String),

    #[error("unsupported {0} in range bound")]
    UnsupportedExpression(&'static str),

    #[error("unsupported operator \"{0}\" in range bound")]
    UnsupportedOperator(String),

    #[error("\"{0}\" is defined in terms of itself")]
    CyclicDefinition(String),

    #[error("range bound does not resolve to a finite instant")]
    NonFinite,
}

/// Failure talking to the AST parsing service or the task API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("server responded with status {status}{}", detail(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl ApiError {
    /// True for a 404, which callers treat as "feature unavailable"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    /// Message supplied by the server in the error body, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Error bodies come as `{"message": ...}` from the console backend and as
/// `{"error": ...}` from Kapacitor
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Pass successful responses through; turn anything else into [`ApiError::Status`]
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: server_message(&body),
    })
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.is_empty())
}

/// Error from [`crate::ast_client::WindowResolver::resolve_min_window`]
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("failed to fetch query AST: {0}")]
    Fetch(#[from] ApiError),

    #[error("failed to analyze query: {0}")]
    Analysis(#[from] AnalysisError),
}
