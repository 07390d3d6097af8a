use async_trait::async_trait;
use discord_rest::{DiscordClient, DiscordError};
use tally_core::{ChatChannel, ChatError};

/// A Discord text channel seen through the board's [`ChatChannel`] seam.
pub struct DiscordChannel {
    client: DiscordClient,
    id: String,
}

impl DiscordChannel {
    pub fn new(client: DiscordClient, id: impl Into<String>) -> Self {
        Self {
            client,
            id: id.into(),
        }
    }
}

fn chat_error(err: DiscordError) -> ChatError {
    match err {
        DiscordError::NotFound => ChatError::NotFound,
        DiscordError::Forbidden => ChatError::Forbidden,
        other => ChatError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, content: &str) -> Result<String, ChatError> {
        self.client
            .create_message(&self.id, content)
            .await
            .map(|m| m.id)
            .map_err(chat_error)
    }

    async fn fetch(&self, message: &str) -> Result<(), ChatError> {
        self.client
            .get_message(&self.id, message)
            .await
            .map(|_| ())
            .map_err(chat_error)
    }

    async fn edit(&self, message: &str, content: &str) -> Result<(), ChatError> {
        self.client
            .edit_message(&self.id, message, content)
            .await
            .map(|_| ())
            .map_err(chat_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;
    use std::time::Duration;
    use tally_core::{sync_board, SyncOutcome, Tracker};
    use tempfile::TempDir;

    #[test]
    fn maps_discord_errors() {
        assert_eq!(chat_error(DiscordError::NotFound), ChatError::NotFound);
        assert_eq!(chat_error(DiscordError::Forbidden), ChatError::Forbidden);
        let limited = chat_error(DiscordError::RateLimited {
            retry_after: Duration::from_secs(2),
        });
        assert!(matches!(limited, ChatError::Transport(_)));
    }

    #[tokio::test]
    async fn deleted_board_is_reposted_through_the_api() {
        let mut server = Server::new_async().await;
        let gone = server
            .mock("GET", "/channels/42/messages/500")
            .with_status(404)
            .with_body(r#"{"message": "Unknown Message", "code": 10008}"#)
            .create_async()
            .await;
        let posted = server
            .mock("POST", "/channels/42/messages")
            .with_status(200)
            .with_body(
                json!({
                    "id": "501",
                    "channel_id": "42",
                    "content": "board",
                    "author": { "id": "9", "username": "tally", "bot": true }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let mut tracker = Tracker::open(dir.path().join("sistemas.json")).unwrap();
        tracker.register_board("42", "500").unwrap();

        let client = DiscordClient::new("tok", &server.url()).unwrap();
        let channel = DiscordChannel::new(client, "42");
        let outcome = sync_board(&mut tracker, &channel).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Created("501".into()));
        assert_eq!(tracker.board_for("42"), Some("501"));
        gone.assert_async().await;
        posted.assert_async().await;
    }
}
