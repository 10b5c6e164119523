use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "songbridge",
    about = "Migrate a music library between streaming services by driving a browser"
)]
pub struct Cli {
    /// Path to a RON config file; defaults apply when absent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run the browser headless regardless of the config.
    #[arg(long, global = true)]
    pub headless: bool,

    /// Where log output goes.
    #[arg(long, global = true, value_enum, default_value = "terminal")]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape liked songs and playlists from the source service.
    Scrape {
        /// Only scrape liked songs.
        #[arg(long, conflicts_with = "playlists_only")]
        likes_only: bool,
        /// Only scrape playlists.
        #[arg(long)]
        playlists_only: bool,
    },
    /// Like every scraped song on the destination service.
    PushLikes {
        /// Resume from this index of the scraped song list.
        #[arg(long)]
        start_index: Option<usize>,
        /// Process at most this many songs.
        #[arg(long)]
        max_items: Option<usize>,
        /// Gap between songs in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Run the interactive login for a target and persist its session.
    Login {
        #[arg(value_enum)]
        target: Target,
    },
    /// Delete a target's persisted session.
    ClearSession {
        #[arg(value_enum)]
        target: Target,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Source,
    Destination,
}
