//! Error handling for registry API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Common error type for registry API operations.
#[derive(Debug, Error)]
pub enum RegistryClientError {
    #[error("invalid registry url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{}", fmt_error_response(.status, .detail.as_deref()))]
    ErrorResponse {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("invalid response payload: {0}")]
    InvalidResponsePayload(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

impl RegistryClientError {
    /// The message the registry attached to an error response, if any,
    /// otherwise the formatted error.
    pub fn detail(&self) -> String {
        match self {
            RegistryClientError::ErrorResponse {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// The status of an error response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RegistryClientError::ErrorResponse { status, .. } => Some(*status),
            RegistryClientError::Request(e) | RegistryClientError::InvalidResponsePayload(e) => {
                e.status()
            },
            _ => None,
        }
    }
}

/// Error body returned by the registry,
/// either `{ "error": "..." }` or `{ "message": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Consume a non-success response and turn it into a [RegistryClientError].
///
/// The body is only kept if it carries a message in one of the known
/// fields, anything else (e.g. an HTML error page) is dropped.
pub(crate) async fn parse_error_response(resp: reqwest::Response) -> RegistryClientError {
    let status = resp.status();
    let detail = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error.or(body.message),
        Err(_) => None,
    };
    RegistryClientError::ErrorResponse { status, detail }
}

fn fmt_error_response(status: &StatusCode, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{status}: {detail}"),
        None => format!("{status}"),
    }
}
