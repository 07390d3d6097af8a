use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::types::{Message, MessageBody, RateLimitBody, User};
use crate::{DiscordError, Result};

/// Versioned REST root used when no override is configured.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Largest page `GET /channels/{id}/messages` accepts.
pub const MAX_PAGE: u8 = 100;

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/tally-board/tally, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

// ─── DiscordClient ────────────────────────────────────────────────────────

/// Bot-token client for the channel-message endpoints.
///
/// Cheap to clone; clones share the underlying connection pool. Requests
/// are never retried: a `429` surfaces as [`DiscordError::RateLimited`] and
/// the caller decides when to try again.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    auth: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("api_base", &self.api_base)
            .field("auth", &"Bot <redacted>")
            .finish()
    }
}

impl DiscordClient {
    pub fn new(token: &str, api_base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth: format!("Bot {}", token.trim()),
        })
    }

    /// `GET /users/@me`: the account the token belongs to.
    pub async fn current_user(&self) -> Result<User> {
        self.execute(self.http.get(self.url("/users/@me"))).await
    }

    /// `POST /channels/{channel}/messages`
    pub async fn create_message(&self, channel: &str, content: &str) -> Result<Message> {
        let req = self
            .http
            .post(self.url(&format!("/channels/{channel}/messages")))
            .json(&MessageBody { content });
        self.execute(req).await
    }

    /// `GET /channels/{channel}/messages/{message}`
    pub async fn get_message(&self, channel: &str, message: &str) -> Result<Message> {
        let req = self
            .http
            .get(self.url(&format!("/channels/{channel}/messages/{message}")));
        self.execute(req).await
    }

    /// `PATCH /channels/{channel}/messages/{message}`
    pub async fn edit_message(&self, channel: &str, message: &str, content: &str) -> Result<Message> {
        let req = self
            .http
            .patch(self.url(&format!("/channels/{channel}/messages/{message}")))
            .json(&MessageBody { content });
        self.execute(req).await
    }

    /// Messages posted after `after`, oldest first.
    pub async fn messages_after(&self, channel: &str, after: &str, limit: u8) -> Result<Vec<Message>> {
        let limit = limit.clamp(1, MAX_PAGE).to_string();
        let req = self
            .http
            .get(self.url(&format!("/channels/{channel}/messages")))
            .query(&[("after", after), ("limit", limit.as_str())]);
        let mut messages: Vec<Message> = self.execute(req).await?;
        messages.sort_by_key(Message::snowflake);
        Ok(messages)
    }

    /// The most recent message in `channel`, if any.
    pub async fn latest_message(&self, channel: &str) -> Result<Option<Message>> {
        let req = self
            .http
            .get(self.url(&format!("/channels/{channel}/messages")))
            .query(&[("limit", "1")]);
        let messages: Vec<Message> = self.execute(req).await?;
        Ok(messages.into_iter().max_by_key(Message::snowflake))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.header("Authorization", &self.auth).send().await?;
        let status = resp.status();
        if status.is_success() {
            let body = resp.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), %body, "discord request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED => DiscordError::Unauthorized,
            StatusCode::FORBIDDEN => DiscordError::Forbidden,
            StatusCode::NOT_FOUND => DiscordError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = serde_json::from_str::<RateLimitBody>(&body)
                    .map(|b| b.retry_after)
                    .unwrap_or(1.0);
                DiscordError::RateLimited {
                    retry_after: Duration::from_secs_f64(retry_after.max(0.0)),
                }
            }
            _ => DiscordError::Status {
                status: status.as_u16(),
                body,
            },
        })
    }
}
