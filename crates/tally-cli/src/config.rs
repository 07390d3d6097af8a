use anyhow::{bail, Result};
use std::time::Duration;

/// Settings for `tally run`, validated before anything touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub token: String,
    pub channels: Vec<String>,
    pub poll_interval: Duration,
    pub api_base: String,
}

impl RunConfig {
    /// Build the config from raw CLI/env values.
    ///
    /// `channels` entries may themselves be comma-separated lists, so
    /// `TALLY_CHANNELS=1,2` and `--channel 1 --channel 2` are equivalent.
    pub fn resolve(
        token: Option<String>,
        channels: &[String],
        poll_interval_ms: u64,
        api_base: &str,
    ) -> Result<Self> {
        let token = match token.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => t,
            _ => bail!("missing DISCORD_TOKEN: set it in the environment or pass --token"),
        };

        let mut resolved: Vec<String> = Vec::new();
        for id in channels.iter().flat_map(|c| c.split(',')) {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            if !id.chars().all(|c| c.is_ascii_digit()) {
                bail!("invalid channel id '{id}': expected a numeric Discord id");
            }
            if !resolved.iter().any(|c| c == id) {
                resolved.push(id.to_string());
            }
        }
        if resolved.is_empty() {
            bail!("no channels to watch: set TALLY_CHANNELS or pass --channel");
        }

        if poll_interval_ms == 0 {
            bail!("poll interval must be greater than zero");
        }

        Ok(Self {
            token,
            channels: resolved,
            poll_interval: Duration::from_millis(poll_interval_ms),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}
