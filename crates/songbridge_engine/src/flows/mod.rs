//! Multi-step migration flows built from the resilience primitives.
//!
//! Every flow takes its selector strings and URLs as a plan struct supplied
//! by the caller; the flows themselves only know the choreography.
mod like_all;
mod like_song;
mod login;
mod rows;
mod scrape_likes;
mod scrape_playlists;

pub use like_all::add_all_songs_to_likes;
pub use like_song::{add_song_to_likes, title_matches, LikePlan};
pub use login::{ensure_session, interactive_login, LoginPlan, SessionHandoff};
pub use rows::RowSelectors;
pub use scrape_likes::{scrape_likes, LikesOutcome, LikesPlan};
pub use scrape_playlists::{scrape_playlists, PlaylistsPlan};

use flow_logging::flow_info;
use songbridge_core::{BatchProgress, ProgressSink};

/// Progress sink that narrates batch counters to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, progress: BatchProgress) {
        flow_info!(
            "Progress: {}/{} | Added: {} | Skipped: {} | Failed: {}",
            progress.processed,
            progress.window_len,
            progress.added,
            progress.skipped,
            progress.failed
        );
    }
}
