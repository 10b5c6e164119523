use flow_logging::{flow_info, flow_step, flow_success, flow_warn};
use songbridge_core::{FlowError, FlowResult, Library, Pacer, RetryPolicy};

use crate::actions::{click_element, wait_for_element, ActionTimeouts};
use crate::flows::rows::{extract_song, RowSelectors};
use crate::page::{PageEngine, WaitState};
use crate::scroll::{load_all_items, LoadAllPlan};

/// Site data for the liked-songs scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikesPlan {
    /// Library tab that shows the liked songs.
    pub tab_selector: String,
    pub rows: RowSelectors,
    pub scroll: LoadAllPlan,
    /// Log a progress line every this many extracted songs.
    pub extract_progress_every: usize,
}

/// What the scraper found versus what it managed to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikesOutcome {
    pub found: usize,
    pub extracted: usize,
}

/// Scrapes every liked song on the library page into `library`.
///
/// Rows that fail to yield a title and artist are logged and skipped; an
/// entirely empty likes table is a flow failure.
pub async fn scrape_likes(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &LikesPlan,
    library: &mut Library,
    added_at: &str,
) -> FlowResult<LikesOutcome> {
    let total = 5;

    flow_step!(1, total, "Selecting the likes tab...");
    click_element(engine, pacer, retry, &plan.tab_selector, timeouts.click)
        .await
        .map_err(|err| err.with_context("failed to click the likes tab"))?;
    flow_success!("likes tab selected");

    flow_step!(2, total, "Waiting for liked songs to load...");
    wait_for_element(
        engine,
        pacer,
        retry,
        &plan.rows.row,
        WaitState::Visible,
        timeouts.element,
    )
    .await
    .map_err(|err| err.with_context("liked songs never appeared"))?;
    flow_success!("initial songs loaded");

    flow_step!(3, total, "Scrolling to load all songs...");
    load_all_items(engine, pacer, &plan.scroll).await?;

    flow_step!(4, total, "Extracting song rows...");
    let rows = engine.locate(&plan.rows.row).await.map_err(FlowError::from)?;
    if rows.is_empty() {
        return Err(FlowError::new("no liked songs found"));
    }
    flow_success!("found {} liked songs", rows.len());

    flow_step!(5, total, "Extracting song details...");
    let mut extracted = 0usize;
    let progress_every = plan.extract_progress_every.max(1);

    for row in &rows {
        match extract_song(engine, row, &plan.rows, added_at).await {
            Ok(song) if song.is_valid() => {
                library.add_liked_song(song);
                extracted += 1;
                if extracted % progress_every == 0 {
                    flow_info!("extracted {}/{} songs...", extracted, rows.len());
                }
            }
            Ok(song) => {
                flow_warn!("dropping incomplete row: {song}");
            }
            Err(err) => {
                flow_warn!("failed to extract song: {err}");
            }
        }
    }
    flow_success!("extracted {extracted} songs");

    Ok(LikesOutcome {
        found: rows.len(),
        extracted,
    })
}
