//! Keeps one live board message per channel in step with the document.

use crate::error::Result;
use crate::render::render;
use crate::tracker::Tracker;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message not found")]
    NotFound,

    #[error("missing permission for this channel")]
    Forbidden,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Outbound side of a chat channel.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Stable identifier used as the board registration key.
    fn id(&self) -> &str;

    /// Post a new message and return its identifier.
    async fn send(&self, content: &str) -> std::result::Result<String, ChatError>;

    /// Check that `message` still exists and is reachable.
    async fn fetch(&self, message: &str) -> std::result::Result<(), ChatError>;

    /// Replace the content of `message`.
    async fn edit(&self, message: &str, content: &str) -> std::result::Result<(), ChatError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The registered board was edited in place.
    Edited(String),
    /// A new board message was posted and registered.
    Created(String),
}

/// Bring the board in `channel` up to date.
///
/// Edits the registered message when it is still reachable. Otherwise posts
/// a replacement, registers it, and persists the registration. Failures on
/// the old message are never reported; only a failure to post the
/// replacement is returned.
pub async fn sync_board(tracker: &mut Tracker, channel: &dyn ChatChannel) -> Result<SyncOutcome> {
    let content = render(tracker.document());
    let channel_id = channel.id().to_string();

    if let Some(message) = tracker.board_for(&channel_id).map(str::to_string) {
        match edit_existing(channel, &message, &content).await {
            Ok(()) => {
                tracing::debug!(channel = %channel_id, %message, "board edited");
                return Ok(SyncOutcome::Edited(message));
            }
            Err(e) => {
                tracing::warn!(
                    channel = %channel_id,
                    %message,
                    error = %e,
                    "board message unavailable, posting a new one"
                );
            }
        }
    }

    let message = channel.send(&content).await?;
    tracker.register_board(&channel_id, &message)?;
    tracing::info!(channel = %channel_id, %message, "board created");
    Ok(SyncOutcome::Created(message))
}

async fn edit_existing(
    channel: &dyn ChatChannel,
    message: &str,
    content: &str,
) -> std::result::Result<(), ChatError> {
    channel.fetch(message).await?;
    channel.edit(message, content).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
