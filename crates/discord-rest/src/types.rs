use serde::{Deserialize, Serialize};

// ─── Resources ────────────────────────────────────────────────────────────

/// Subset of the Discord user object.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Absent for regular users.
    #[serde(default)]
    pub bot: bool,
}

/// Subset of the Discord message object.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    /// Empty when the bot lacks the message-content intent.
    #[serde(default)]
    pub content: String,
    pub author: User,
}

impl Message {
    /// Snowflake ids are numeric strings that grow over time.
    pub fn snowflake(&self) -> u64 {
        self.id.parse().unwrap_or(0)
    }
}

// ─── Request bodies ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MessageBody<'a> {
    pub content: &'a str,
}

// ─── Error bodies ─────────────────────────────────────────────────────────

/// Body of a `429 Too Many Requests` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitBody {
    /// Seconds to wait before the next request.
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
}
