use serde::Deserialize;
use thiserror::Error;

/// Normalized failure taxonomy for backend calls.
///
/// Transport- and HTTP-level failures are mapped here at the gateway
/// boundary; callers never inspect raw status codes.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend rejected the request and supplied a human-readable
    /// detail (bad credentials on login, duplicate username on register).
    #[error("{message}")]
    Rejected { message: String },

    /// An authenticated call came back 401. Reported uniformly whatever
    /// the cause (expired token, revoked token); the only recovery is a
    /// forced re-login.
    #[error("session expired or token invalid")]
    Unauthorized,

    /// Any other non-success response from the backend.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Network-level failure (DNS, connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Whether a retry could plausibly change the outcome.
    ///
    /// Rejections and invalid tokens are deterministic; only transport and
    /// server-side failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Transport(_) | GatewayError::Backend { .. }
        )
    }
}

/// Error body shape used by the backend: `{"detail": "..."}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) detail: Option<String>,
}

/// Extract the backend's `detail` message from a raw error body, if any.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.is_empty())
}
