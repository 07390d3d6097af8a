use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid bot token (401 Unauthorized)")]
    Unauthorized,

    #[error("Missing access (403 Forbidden)")]
    Forbidden,

    #[error("Unknown resource (404 Not Found)")]
    NotFound,

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
