use http::StatusCode;
use reqwest::Response;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single upstream call, before it is turned into a field
/// error, an omission, or a [`GatewayError`](super::GatewayError).
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream responded with {status}")]
    Status { status: StatusCode, body: Option<Value> },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected upstream payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("image store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot build upstream URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            UpstreamError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            UpstreamError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            UpstreamError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED => "unauthorized",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Transport(err) if err.is_timeout() => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Decode(_) => "decode",
            UpstreamError::Io(_) => "io",
            UpstreamError::InvalidUrl(_) => "url",
        }
    }
}

/// Passes 2xx responses through, consumes anything else into [`UpstreamError::Status`].
pub async fn ensure_success(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        status,
        body: parse_error_body(&text),
    })
}

/// JSON bodies are kept structured, anything else as a plain string.
fn parse_error_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str(text)
        .ok()
        .or_else(|| Some(Value::String(text.to_owned())))
}
