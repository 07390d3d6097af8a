use crate::config::RunConfig;
use crate::discord::DiscordChannel;
use anyhow::Context;
use discord_rest::{DiscordClient, DiscordError, Message, MAX_PAGE};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tally_core::{ChatChannel, Handler, Tracker};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

pub fn run(data_file: &Path, prefix: &str, cfg: RunConfig) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        tokio::select! {
            res = serve(data_file, prefix, cfg) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}

async fn serve(data_file: &Path, prefix: &str, cfg: RunConfig) -> anyhow::Result<()> {
    let client = DiscordClient::new(&cfg.token, &cfg.api_base)
        .context("failed to build the Discord client")?;
    let me = client
        .current_user()
        .await
        .context("failed to identify the bot user")?;
    tracing::info!(user = %me.username, id = %me.id, "connected");

    let tracker = Tracker::open(data_file)
        .with_context(|| format!("failed to open {}", data_file.display()))?;
    tracing::info!(
        path = %data_file.display(),
        activities = tracker.document().activity_count(),
        "loaded data file"
    );
    let handler = Arc::new(Handler::new(tracker, prefix));

    let mut tasks = JoinSet::new();
    for id in &cfg.channels {
        let chan = DiscordChannel::new(client.clone(), id.clone());
        tasks.spawn(poll_channel(
            client.clone(),
            chan,
            Arc::clone(&handler),
            me.id.clone(),
            cfg.poll_interval,
        ));
    }
    tracing::info!(channels = cfg.channels.len(), "watching channels");

    // Pollers only return on a fatal error; the first one stops the bot.
    while let Some(joined) = tasks.join_next().await {
        joined.context("channel poller panicked")??;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

async fn poll_channel(
    client: DiscordClient,
    chan: DiscordChannel,
    handler: Arc<Handler>,
    self_id: String,
    every: Duration,
) -> anyhow::Result<()> {
    let mut cursor = start_cursor(&client, chan.id(), every).await;
    tracing::debug!(channel = chan.id(), %cursor, "polling from");

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let batch = match client.messages_after(chan.id(), &cursor, MAX_PAGE).await {
            Ok(batch) => batch,
            Err(DiscordError::RateLimited { retry_after }) => {
                tracing::warn!(channel = chan.id(), ?retry_after, "rate limited");
                tokio::time::sleep(retry_after).await;
                continue;
            }
            Err(e) => {
                tracing::error!(channel = chan.id(), error = %e, "poll failed");
                continue;
            }
        };

        for msg in batch {
            cursor = msg.id.clone();
            dispatch(&handler, &chan, &self_id, &msg).await?;
        }
    }
}

/// Id of the newest message in the channel, so history is never replayed.
async fn start_cursor(client: &DiscordClient, channel: &str, every: Duration) -> String {
    loop {
        match client.latest_message(channel).await {
            Ok(Some(msg)) => return msg.id,
            Ok(None) => return "0".to_string(),
            Err(DiscordError::RateLimited { retry_after }) => {
                tokio::time::sleep(retry_after).await;
            }
            Err(e) => {
                tracing::warn!(channel, error = %e, "could not read latest message, retrying");
                tokio::time::sleep(every).await;
            }
        }
    }
}

/// Run one inbound message through the handler.
///
/// Messages from bots (this one included) are skipped. Only fatal errors
/// are returned; anything else is logged and the loop keeps going.
async fn dispatch(
    handler: &Handler,
    chan: &dyn ChatChannel,
    self_id: &str,
    msg: &Message,
) -> anyhow::Result<()> {
    if msg.author.bot || msg.author.id == self_id {
        return Ok(());
    }
    match handler.handle_message(chan, &msg.content).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => Err(anyhow::Error::new(e)
            .context(format!("message {} in channel {}", msg.id, chan.id()))),
        Err(e) => {
            tracing::error!(channel = chan.id(), message = %msg.id, error = %e, "command failed");
            Ok(())
        }
    }
}
