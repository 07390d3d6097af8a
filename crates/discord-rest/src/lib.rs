//! `discord-rest`: the handful of Discord REST calls the tally bot needs.
//!
//! Only the channel-message surface is covered: identify the bot user,
//! post, fetch and edit a message, and page through a channel's recent
//! messages. There is no gateway connection; inbound commands are found by
//! polling [`DiscordClient::messages_after`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! use discord_rest::{DiscordClient, DEFAULT_API_BASE};
//!
//! let client = DiscordClient::new(&token, DEFAULT_API_BASE)?;
//! let me = client.current_user().await?;
//! let msg = client.create_message("123456789", "hello").await?;
//! client.edit_message("123456789", &msg.id, "hello again").await?;
//! ```

pub mod client;
pub mod error;
pub mod types;


pub use client::{DiscordClient, DEFAULT_API_BASE, MAX_PAGE};
pub use error::DiscordError;
pub use types::{Message, User};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, DiscordError>;
