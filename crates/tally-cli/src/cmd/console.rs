use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use tally_core::memory::MemoryChannel;
use tally_core::{ChatChannel, ChatError, Handler, Tracker};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Local channel that echoes every send and edit to stdout.
struct ConsoleChannel {
    inner: MemoryChannel,
}

#[async_trait]
impl ChatChannel for ConsoleChannel {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn send(&self, content: &str) -> Result<String, ChatError> {
        let id = self.inner.send(content).await?;
        println!("[#{id}] {content}");
        Ok(id)
    }

    async fn fetch(&self, message: &str) -> Result<(), ChatError> {
        self.inner.fetch(message).await
    }

    async fn edit(&self, message: &str, content: &str) -> Result<(), ChatError> {
        self.inner.edit(message, content).await?;
        println!("[#{message} edited] {content}");
        Ok(())
    }
}

pub fn run(data_file: &Path, prefix: &str, channel: &str) -> anyhow::Result<()> {
    let tracker = Tracker::open(data_file)
        .with_context(|| format!("failed to open {}", data_file.display()))?;

    // Ids continue past the stored board id; boards from earlier sessions
    // are never live here.
    let first_id = tracker
        .board_for(channel)
        .and_then(|id| id.parse::<u64>().ok())
        .map_or(1, |id| id.saturating_add(1));
    let chan = ConsoleChannel {
        inner: MemoryChannel::starting_at(channel, first_id),
    };
    let handler = Handler::new(tracker, prefix);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if let Err(e) = handler.handle_message(&chan, &line).await {
                if e.is_fatal() {
                    return Err(anyhow::Error::new(e).context("command failed"));
                }
                eprintln!("warning: {e}");
            }
        }
        Ok(())
    })
}
