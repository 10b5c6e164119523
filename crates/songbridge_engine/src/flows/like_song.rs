use std::time::Duration;

use flow_logging::{flow_step, flow_success};
use songbridge_core::{FlowError, FlowResult, ItemDisposition, Pacer, PauseKind, RetryPolicy, SongCard};

use crate::actions::{first_attribute, first_text, goto, wait_for_element, ActionTimeouts};
use crate::page::{PageEngine, PageWait, WaitState};
use url::Url;

/// Site data for the like-a-song flow on the destination service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePlan {
    /// Search results URL prefix; the encoded query is appended.
    pub search_url: String,
    /// Element proving the result list rendered.
    pub results_probe: String,
    /// Link of the first result.
    pub first_result_link: String,
    /// Base used to absolutize relative result links.
    pub base_url: String,
    /// Title element on the watch page.
    pub title_selector: String,
    /// The like toggle.
    pub like_button: String,
    /// Attribute holding the toggle state, usually `aria-pressed`.
    pub pressed_attribute: String,
    pub button_timeout: Duration,
    /// Settle pause after opening the watch page.
    pub page_settle: Duration,
    /// Settle pause after clicking the like button.
    pub click_settle: Duration,
}

/// Finds `song` on the destination service and likes it.
///
/// A song whose like toggle is already pressed reports
/// [`ItemDisposition::Skipped`]; a result page that does not match the song's
/// identity is a failure, so a wrong video is never liked.
pub async fn add_song_to_likes(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &LikePlan,
    song: &SongCard,
) -> FlowResult<ItemDisposition> {
    let total = 4;

    flow_step!(1, total, "Searching for the song...");
    let query = format!("{} {}", song.title, song.artist);
    let search_url = format!("{}{}", plan.search_url, encode_query(&query));
    goto(engine, pacer, retry, &search_url, PageWait::DomReady)
        .await
        .map_err(|err| err.with_context(format!("search failed for \"{}\"", song.title)))?;
    wait_for_element(
        engine,
        pacer,
        retry,
        &plan.results_probe,
        WaitState::Visible,
        timeouts.element,
    )
    .await
    .map_err(|err| err.with_context("search results did not load"))?;
    flow_success!("search completed");

    flow_step!(2, total, "Opening the first result...");
    let href = first_attribute(engine, None, &plan.first_result_link, "href")
        .await
        .map_err(|err| err.with_context(format!("no results for \"{}\"", song.title)))?
        .ok_or_else(|| FlowError::new("first result link not found"))?;
    let watch_url = absolutize(&plan.base_url, &href)?;
    goto(engine, pacer, retry, &watch_url, PageWait::DomReady)
        .await
        .map_err(|err| err.with_context("failed to navigate to the watch page"))?;
    pacer.pause(PauseKind::FlowSettle, plan.page_settle).await;
    flow_success!("watch page loaded");

    flow_step!(3, total, "Validating the title...");
    wait_for_element(
        engine,
        pacer,
        retry,
        &plan.title_selector,
        WaitState::Visible,
        timeouts.element,
    )
    .await
    .map_err(|err| err.with_context("watch page title not found"))?;
    let watch_title = first_text(engine, None, &plan.title_selector).await?;

    if !title_matches(&song.title, &song.artist, &watch_title) {
        return Err(FlowError::new(format!(
            "title mismatch: expected \"{}\" in \"{watch_title}\"",
            song.title
        )));
    }
    flow_success!("title matches: {}", song.title);

    flow_step!(4, total, "Toggling the like button...");
    let button = engine
        .wait_for(&plan.like_button, WaitState::Visible, plan.button_timeout)
        .await
        .map_err(|err| FlowError::caused_by("like button not found", err))?;

    let pressed = engine
        .attribute(&button, &plan.pressed_attribute)
        .await
        .map_err(FlowError::from)?;
    if pressed.as_deref() == Some("true") {
        flow_success!("already liked, skipping");
        return Ok(ItemDisposition::Skipped);
    }

    engine.click(&button).await.map_err(FlowError::from)?;
    pacer.pause(PauseKind::FlowSettle, plan.click_settle).await;
    flow_success!("song added to likes");

    Ok(ItemDisposition::Added)
}

/// The watch-page title is accepted when it contains the full song title, the
/// song title up to its first parenthetical, or the artist name.
pub fn title_matches(song_title: &str, artist: &str, watch_title: &str) -> bool {
    let watch = watch_title.to_lowercase();
    let full_match = watch.contains(&song_title.to_lowercase());

    let main_title = song_title
        .split(['(', '['])
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    let title_match = !main_title.is_empty() && watch.contains(&main_title);

    let artist = artist.trim().to_lowercase();
    let artist_match = !artist.is_empty() && watch.contains(&artist);

    full_match || title_match || artist_match
}

fn encode_query(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

fn absolutize(base: &str, href: &str) -> FlowResult<String> {
    if href.starts_with("http") {
        return Ok(href.to_string());
    }
    let base = Url::parse(base).map_err(|err| FlowError::caused_by("invalid base url", err))?;
    let joined = base
        .join(href)
        .map_err(|err| FlowError::caused_by("unresolvable result link", err))?;
    Ok(joined.to_string())
}
