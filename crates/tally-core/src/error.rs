use thiserror::Error;

use crate::board::ChatError;

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("system or activity not found: {activity} in {system}")]
    NotFound { system: String, activity: String },

    #[error("{activity} in {system} is already complete ({hecho}/{total})")]
    AlreadyComplete {
        system: String,
        activity: String,
        hecho: u32,
        total: u32,
    },

    #[error("invalid amount {0}: must be >= 1")]
    InvalidAmount(i64),

    #[error("malformed data file: {0}")]
    MalformedDocument(String),

    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TallyError {
    /// Storage and parse failures leave the in-memory document out of step
    /// with disk; the process must stop rather than keep serving commands.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TallyError::Io(_) | TallyError::Json(_) | TallyError::MalformedDocument(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;
