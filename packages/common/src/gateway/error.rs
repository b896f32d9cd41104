use thiserror::Error;

/// Classified failure from the inference gateway.
///
/// Messages never contain the API credential; service response bodies are
/// truncated before being carried here.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure, including timeouts.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service rejected our credential (401/403).
    #[error("authentication rejected by the inference service")]
    Auth,

    /// Non-2xx response from the service.
    #[error("inference service error (status {status}): {detail}")]
    Service { status: u16, detail: String },

    /// The service returned 2xx but no usable report text.
    #[error("empty or malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Short label used in diagnostic logs.
    pub fn classification(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Auth => "auth",
            Self::Service { .. } => "service",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// Whether a retry could plausibly succeed. Auth failures and malformed
    /// responses are not retried; each attempt is billable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Service { status, .. } => *status == 429 || *status >= 500,
            Self::Auth | Self::MalformedResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport("request timed out".to_string())
        } else {
            // reqwest redacts sensitive URL parts itself.
            Self::Transport(err.without_url().to_string())
        }
    }
}
