use std::cell::RefCell;
use std::time::Duration;

use flow_logging::{flow_error, flow_info, flow_step, flow_success, flow_warn};
use songbridge_core::{
    run_batch, BatchOptions, BatchReport, FlowError, FlowResult, ItemDisposition, Library, Pacer,
    PauseKind, PlaylistCard, RetryPolicy,
};
use url::Url;

use crate::actions::{click_element, first_attribute, first_text, goto, wait_for_element, ActionTimeouts};
use crate::flows::rows::{extract_song, RowSelectors};
use crate::flows::LogProgressSink;
use crate::page::{ElementHandle, PageEngine, PageWait, WaitState};
use crate::scroll::{load_all_items, LoadAllPlan};

/// Site data for the playlist scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistsPlan {
    /// Library tab that shows the playlist cards.
    pub tab_selector: String,
    /// Element proving the library content pane rendered.
    pub content_probe: String,
    /// One playlist card in the grid.
    pub card_selector: String,
    /// Link inside a card, carrying the playlist URL.
    pub card_link_selector: String,
    /// Card element carrying the playlist name.
    pub card_title_selector: String,
    /// Base used to absolutize relative card links.
    pub base_url: String,
    /// Library page to return to between playlists.
    pub library_url: String,
    /// Element proving an individual playlist page rendered.
    pub page_probe: String,
    /// Playlist title element on the playlist page.
    pub name_selector: String,
    /// URL path segment preceding the numeric playlist id.
    pub id_prefix: String,
    pub rows: RowSelectors,
    pub card_scroll: LoadAllPlan,
    pub song_scroll: LoadAllPlan,
    /// Settle pause after opening a playlist page.
    pub page_settle: Duration,
    /// Settle pause after returning to the library tab.
    pub return_settle: Duration,
}

/// A playlist link harvested from the library grid.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlaylistLink {
    name: String,
    url: String,
}

/// Discovers every playlist card, then scrapes each playlist's songs through
/// the batch orchestrator: one playlist failing never stops the rest.
pub async fn scrape_playlists(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &PlaylistsPlan,
    options: &BatchOptions,
    library: &mut Library,
    scraped_at: &str,
) -> FlowResult<BatchReport> {
    let total = 6;

    flow_step!(1, total, "Selecting the playlists tab...");
    click_element(engine, pacer, retry, &plan.tab_selector, timeouts.click)
        .await
        .map_err(|err| err.with_context("failed to click the playlists tab"))?;
    wait_for_element(
        engine,
        pacer,
        retry,
        &plan.content_probe,
        WaitState::Visible,
        timeouts.element,
    )
    .await
    .map_err(|err| err.with_context("library content never appeared"))?;
    flow_success!("playlists tab selected");

    flow_step!(2, total, "Scrolling to load all playlist cards...");
    load_all_items(engine, pacer, &plan.card_scroll).await?;

    flow_step!(3, total, "Extracting playlist cards...");
    let cards = engine
        .locate(&plan.card_selector)
        .await
        .map_err(FlowError::from)?;
    if cards.is_empty() {
        flow_warn!("no playlists found");
        return Ok(BatchReport::default());
    }
    flow_success!("found {} playlist cards", cards.len());

    flow_step!(4, total, "Extracting playlist links from cards...");
    let mut links = Vec::new();
    for card in &cards {
        match extract_link(engine, plan, card).await {
            Ok(link) => links.push(link),
            Err(err) => flow_error!("failed to extract playlist card: {err}"),
        }
    }
    flow_success!("extracted {} playlist links", links.len());

    flow_step!(5, total, "Scraping each playlist...");
    let collected = RefCell::new(Vec::<PlaylistCard>::new());
    let collected_ref = &collected;
    let report = run_batch(
        &links,
        options,
        pacer,
        &LogProgressSink,
        |link| link.name.clone(),
        move |index, link| async move {
            flow_info!("[{}] scraping: {}", index + 1, link.name);

            goto(engine, pacer, retry, &link.url, PageWait::DomReady).await?;
            pacer.pause(PauseKind::FlowSettle, plan.page_settle).await;

            let card =
                scrape_playlist_songs(engine, pacer, retry, timeouts, plan, &link.url, scraped_at)
                    .await?;
            flow_success!("{card}");
            collected_ref.borrow_mut().push(card);

            return_to_library(engine, pacer, retry, timeouts, plan).await?;
            Ok(ItemDisposition::Added)
        },
    )
    .await;

    for card in collected.into_inner() {
        library.add_playlist(card);
    }

    flow_step!(6, total, "Summary");
    let total_songs: usize = library.playlists.iter().map(|p| p.song_count).sum();
    flow_success!(
        "scraped {}/{} playlists ({} songs total): {report}",
        report.added,
        links.len(),
        total_songs
    );

    Ok(report)
}

async fn extract_link(
    engine: &dyn PageEngine,
    plan: &PlaylistsPlan,
    card: &ElementHandle,
) -> FlowResult<PlaylistLink> {
    let href = first_attribute(engine, Some(card), &plan.card_link_selector, "href")
        .await?
        .ok_or_else(|| FlowError::new("playlist card link has no href"))?;
    let url = absolutize(&plan.base_url, &href)?;
    let name = first_text(engine, Some(card), &plan.card_title_selector).await?;
    Ok(PlaylistLink { name, url })
}

fn absolutize(base: &str, href: &str) -> FlowResult<String> {
    if href.starts_with("http") {
        return Ok(href.to_string());
    }
    let base = Url::parse(base)
        .map_err(|err| FlowError::caused_by("invalid base url", err))?;
    let joined = base
        .join(href)
        .map_err(|err| FlowError::caused_by("unresolvable playlist link", err))?;
    Ok(joined.to_string())
}

/// Scrapes one open playlist page into a card. An empty playlist is a valid
/// outcome, not an error.
async fn scrape_playlist_songs(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &PlaylistsPlan,
    expected_url: &str,
    scraped_at: &str,
) -> FlowResult<PlaylistCard> {
    let current = engine.current_url().await.map_err(FlowError::from)?;
    if !current.contains(&plan.id_prefix) {
        return Err(FlowError::new("not on a playlist page"));
    }

    wait_for_element(
        engine,
        pacer,
        retry,
        &plan.page_probe,
        WaitState::Visible,
        timeouts.element,
    )
    .await
    .map_err(|err| err.with_context(format!("playlist page never rendered ({expected_url})")))?;

    let id = playlist_id(&current, &plan.id_prefix)
        .ok_or_else(|| FlowError::new("failed to extract playlist id from url"))?;

    let name = match first_text(engine, None, &plan.name_selector).await {
        Ok(name) if !name.is_empty() => name,
        _ => {
            flow_warn!("could not extract playlist name, using default");
            "Unknown Playlist".to_string()
        }
    };

    let mut card = PlaylistCard::new(id, name, current.clone(), scraped_at);
    if !card.is_valid() {
        return Err(FlowError::new("playlist metadata is incomplete"));
    }
    flow_info!("playlist: {card}");

    // Empty playlists never render a song row; that is a success.
    if engine
        .wait_for(&plan.rows.row, WaitState::Visible, timeouts.element)
        .await
        .is_err()
    {
        flow_info!("empty playlist");
        return Ok(card);
    }

    load_all_items(engine, pacer, &plan.song_scroll).await?;

    let rows = engine.locate(&plan.rows.row).await.map_err(FlowError::from)?;
    for row in &rows {
        match extract_song(engine, row, &plan.rows, scraped_at).await {
            Ok(song) if song.is_valid() => card.add_song(song),
            Ok(song) => flow_warn!("dropping incomplete row: {song}"),
            Err(err) => flow_warn!("failed to extract song: {err}"),
        }
    }

    Ok(card)
}

async fn return_to_library(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &PlaylistsPlan,
) -> FlowResult<()> {
    flow_info!("returning to the playlists page...");
    goto(engine, pacer, retry, &plan.library_url, PageWait::DomReady).await?;
    wait_for_element(
        engine,
        pacer,
        retry,
        &plan.content_probe,
        WaitState::Visible,
        timeouts.element,
    )
    .await?;
    click_element(engine, pacer, retry, &plan.tab_selector, timeouts.click).await?;
    pacer.pause(PauseKind::FlowSettle, plan.return_settle).await;
    Ok(())
}

fn playlist_id(url: &str, prefix: &str) -> Option<String> {
    let start = url.find(prefix)? + prefix.len();
    let id: String = url[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
