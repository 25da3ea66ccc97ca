use thiserror::Error;

/// Characters of a response body kept for error messages.
pub const SNIPPET_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("session credentials rejected (HTTP {status}); copy fresh ASP.NETSessionId and hallticket cookies from your browser")]
    Unauthorized { status: u16 },

    #[error("portal returned an HTML page instead of JSON; the session has probably expired\n{snippet}")]
    SessionExpired { snippet: String },

    #[error("portal request failed with HTTP {status}\n{snippet}")]
    Status { status: u16, snippet: String },

    #[error("failed to decode portal response: {source}\n{snippet}")]
    Decode {
        #[source]
        source: serde_json::Error,
        snippet: String,
    },

    #[error("unexpected response format ({reason})\n{snippet}")]
    UnexpectedFormat { reason: String, snippet: String },

    #[error("request to portal failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl PortalError {
    /// Whether another attempt at the same page could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PortalError::Status { .. } | PortalError::Decode { .. } | PortalError::Transport(_)
        )
    }
}

/// First `SNIPPET_CHARS` characters of a body, on a char boundary.
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect()
}
