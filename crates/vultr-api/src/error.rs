use thiserror::Error;

use crate::response::RawResponse;

/// Top-level error type for the `vultr-api` crate.
///
/// Covers every failure mode of a single request/response cycle: local
/// request construction, transport, remote API rejection, and decoding.
/// No variant is retried by the client.
#[derive(Debug, Error)]
pub enum Error {
    // ── Request construction ────────────────────────────────────────
    /// A required ID was empty or not a single URL path segment
    /// (e.g. a blank load balancer ID, or one containing `/` or `..`).
    #[error("Invalid argument: {0} must be a non-empty path segment")]
    InvalidArgument(&'static str),

    /// The request body, query or headers could not be encoded.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The API key cannot be sent as an HTTP header value.
    #[error("Invalid API key: {message}")]
    InvalidApiKey { message: String },

    /// The HTTP client could not be built (bad CA file, bad header value).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // ── Remote API ──────────────────────────────────────────────────
    /// Non-2xx response. The raw response is kept for inspection.
    #[error("Vultr API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        response: Box<RawResponse>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// The client never retries on its own; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status of a remote API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().as_ref().map(reqwest::StatusCode::as_u16),
            _ => None,
        }
    }

    /// The raw HTTP response behind a remote API error.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::Api { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }
}
