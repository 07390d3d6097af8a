mod cmd;
mod config;
mod discord;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_core::store::DEFAULT_DATA_FILE;

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Track activity progress per system and keep a live board in chat",
    version,
    propagate_version = true
)]
struct Cli {
    /// JSON file holding systems, activities and board ids
    #[arg(long, global = true, env = "DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Prefix that marks a chat message as a command
    #[arg(long, global = true, env = "TALLY_PREFIX", default_value = "!")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and answer commands in the given channels
    Run {
        /// Bot token
        #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Channel id to watch (repeat or comma-separate for several)
        #[arg(long = "channel", env = "TALLY_CHANNELS", value_delimiter = ',')]
        channels: Vec<String>,

        /// Milliseconds between polls of each channel
        #[arg(long, env = "TALLY_POLL_INTERVAL_MS", default_value_t = 2000)]
        poll_interval_ms: u64,

        /// REST API root
        #[arg(long, env = "DISCORD_API_BASE", default_value = discord_rest::DEFAULT_API_BASE)]
        api_base: String,
    },

    /// Read commands from stdin and print replies and board edits to stdout
    Console {
        /// Channel id the board is registered under
        #[arg(long, default_value = "console")]
        channel: String,
    },

    /// Print the current board without touching any chat
    Show {
        /// Print the stored document instead of the rendered board
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            token,
            channels,
            poll_interval_ms,
            api_base,
        } => config::RunConfig::resolve(token, &channels, poll_interval_ms, &api_base)
            .and_then(|cfg| cmd::run::run(&cli.data_file, &cli.prefix, cfg)),
        Commands::Console { channel } => cmd::console::run(&cli.data_file, &cli.prefix, &channel),
        Commands::Show { json } => cmd::show::run(&cli.data_file, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
