use flow_logging::{flow_error, flow_info, flow_step, flow_success};
use songbridge_core::{run_batch, BatchOptions, BatchReport, Pacer, RetryPolicy, SongCard};

use crate::actions::ActionTimeouts;
use crate::flows::like_song::{add_song_to_likes, LikePlan};
use crate::flows::LogProgressSink;
use crate::page::PageEngine;

/// Likes every song in the given window on the destination service.
///
/// One song failing never stops the batch; the returned report carries the
/// per-song errors for the caller to surface.
pub async fn add_all_songs_to_likes(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &LikePlan,
    songs: &[SongCard],
    options: &BatchOptions,
) -> BatchReport {
    let total = 3;

    flow_step!(1, total, "Preparing the song window...");
    if songs.is_empty() {
        flow_success!("no songs to process");
        return BatchReport::default();
    }

    let start = options.start_index.min(songs.len());
    let end = match options.max_items {
        Some(max) => songs.len().min(start.saturating_add(max)),
        None => songs.len(),
    };
    let window_len = end - start;
    flow_info!("processing {window_len} songs (indices {start}..{end})");

    flow_step!(2, total, "Adding each song to likes...");
    let report = run_batch(
        songs,
        options,
        pacer,
        &LogProgressSink,
        |song| format!("{} - {}", song.title, song.artist),
        move |index, song| async move {
            flow_info!(
                "[{}/{}] {} - {}",
                index + 1 - start,
                window_len,
                song.title,
                song.artist
            );
            add_song_to_likes(engine, pacer, retry, timeouts, plan, &song).await
        },
    )
    .await;

    flow_step!(3, total, "Summary");
    flow_success!("completed: {report}");
    for (i, item) in report.errors.iter().enumerate() {
        flow_error!("  {}. {}: {}", i + 1, item.label, item.error);
    }

    report
}
