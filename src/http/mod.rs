//! Helpers for processing responses from the HTTP collaborators.

use reqwest::Response;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failure talking to a remote service.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request never produced a response
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{service} {reason} ({status}): {body}")]
    Status {
        service: &'static str,
        status: u16,
        reason: &'static str,
        body: String,
    },

    /// The body could not be decoded
    #[error("{service} response parse failed: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
}

impl HttpError {
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        HttpError::Transport { service, source }
    }
}

/// Reject non-success responses, keeping the body for the error message.
pub async fn check_status(
    response: Response,
    service: &'static str,
) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let code = status.as_u16();
    let reason = match code {
        401 | 403 => "authentication failed",
        429 => "rate limit exceeded",
        500..=599 => "server error",
        _ => "request failed",
    };

    Err(HttpError::Status {
        service,
        status: code,
        reason,
        body,
    })
}

/// Check the status and decode a JSON body.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    service: &'static str,
) -> Result<T, HttpError> {
    let response = check_status(response, service).await?;
    response.json::<T>().await.map_err(|e| HttpError::Decode {
        service,
        detail: e.to_string(),
    })
}

/// Check the status and read the body as text.
pub async fn read_text(response: Response, service: &'static str) -> Result<String, HttpError> {
    let response = check_status(response, service).await?;
    response
        .text()
        .await
        .map_err(|e| HttpError::transport(service, e))
}
