mod common;

use std::time::Duration;

use common::{FakeElement, FakeEngine, RecordingPacer};
use songbridge_core::{BatchOptions, ItemDisposition, PauseKind, RetryPolicy, SongCard};
use songbridge_engine::flows::{
    add_all_songs_to_likes, add_song_to_likes, ensure_session, title_matches, LikePlan, LoginPlan,
    SessionHandoff,
};
use songbridge_engine::{save_session, ActionTimeouts, Cookie};

const STAMP: &str = "2024-05-01T10:00:00Z";

fn like_plan() -> LikePlan {
    LikePlan {
        search_url: "https://tube.example/results?search_query=".to_string(),
        results_probe: "#results".to_string(),
        first_result_link: "a.first-video".to_string(),
        base_url: "https://tube.example/".to_string(),
        title_selector: "#title h1".to_string(),
        like_button: "button.like".to_string(),
        pressed_attribute: "aria-pressed".to_string(),
        button_timeout: Duration::from_secs(15),
        page_settle: Duration::from_millis(1500),
        click_settle: Duration::from_millis(1000),
    }
}

fn song(title: &str, artist: &str) -> SongCard {
    SongCard::new(title, artist, STAMP)
}

/// Registers a search-results page whose first hit is `watch_title`.
fn seed_watch_page(engine: &FakeEngine, watch_title: &str, pressed: &str) {
    engine.register("#results", FakeElement::new("results"));
    engine.register(
        "a.first-video",
        FakeElement::new("video-link").with_attr("href", "/watch?v=abc123"),
    );
    engine.register("#title h1", FakeElement::new("title").with_text(watch_title));
    engine.register(
        "button.like",
        FakeElement::new("like-btn").with_attr("aria-pressed", pressed),
    );
}

#[tokio::test]
async fn likes_a_song_that_is_not_yet_liked() {
    let engine = FakeEngine::new();
    let pacer = RecordingPacer::default();
    seed_watch_page(&engine, "Alpha - ArtistX (Official Video)", "false");

    let outcome = add_song_to_likes(
        &engine,
        &pacer,
        &RetryPolicy::no_retries(),
        &ActionTimeouts::default(),
        &like_plan(),
        &song("Alpha", "ArtistX"),
    )
    .await
    .expect("flow succeeds");

    assert_eq!(outcome, ItemDisposition::Added);
    assert_eq!(*engine.clicks.lock().unwrap(), vec!["like-btn".to_string()]);

    let navigations = engine.navigations.lock().unwrap();
    assert_eq!(
        navigations[0],
        "https://tube.example/results?search_query=Alpha+ArtistX"
    );
    assert_eq!(navigations[1], "https://tube.example/watch?v=abc123");
}

#[tokio::test]
async fn skips_a_song_that_is_already_liked() {
    let engine = FakeEngine::new();
    let pacer = RecordingPacer::default();
    seed_watch_page(&engine, "Alpha - ArtistX", "true");

    let outcome = add_song_to_likes(
        &engine,
        &pacer,
        &RetryPolicy::no_retries(),
        &ActionTimeouts::default(),
        &like_plan(),
        &song("Alpha", "ArtistX"),
    )
    .await
    .expect("already liked is a success");

    assert_eq!(outcome, ItemDisposition::Skipped);
    assert!(engine.clicks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn refuses_to_like_a_mismatched_video() {
    let engine = FakeEngine::new();
    let pacer = RecordingPacer::default();
    seed_watch_page(&engine, "Completely Unrelated Upload", "false");

    let err = add_song_to_likes(
        &engine,
        &pacer,
        &RetryPolicy::no_retries(),
        &ActionTimeouts::default(),
        &like_plan(),
        &song("Alpha", "ArtistX"),
    )
    .await
    .unwrap_err();

    assert!(err.message().starts_with("title mismatch"));
    assert!(engine.clicks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_results_fail_the_flow() {
    let engine = FakeEngine::new();
    let pacer = RecordingPacer::default();

    let err = add_song_to_likes(
        &engine,
        &pacer,
        &RetryPolicy::no_retries(),
        &ActionTimeouts::default(),
        &like_plan(),
        &song("Alpha", "ArtistX"),
    )
    .await
    .unwrap_err();

    assert_eq!(err.message(), "search results did not load");
}

#[tokio::test]
async fn batch_records_the_mismatching_song_and_continues() {
    let engine = FakeEngine::new();
    let pacer = RecordingPacer::default();
    // The fake always serves the same watch page, so the second song fails
    // its identity check while the first one is added.
    seed_watch_page(&engine, "Alpha - ArtistX", "false");

    let songs = vec![song("Alpha", "ArtistX"), song("Beta", "ArtistY")];
    let report = add_all_songs_to_likes(
        &engine,
        &pacer,
        &RetryPolicy::no_retries(),
        &ActionTimeouts::default(),
        &like_plan(),
        &songs,
        &BatchOptions::default(),
    )
    .await;

    assert_eq!(report.added, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 0);
    assert!(!report.is_success());
    assert_eq!(report.errors[0].label, "Beta - ArtistY");

    let gaps = pacer
        .pauses
        .lock()
        .unwrap()
        .iter()
        .filter(|(kind, _)| *kind == PauseKind::ItemGap)
        .count();
    assert_eq!(gaps, 1);
}

#[tokio::test]
async fn valid_saved_session_is_restored_without_login() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookies.json");
    let cookies = vec![Cookie {
        name: "sid".to_string(),
        value: "abc".to_string(),
        domain: None,
        path: None,
        secure: None,
        http_only: None,
        expiry: None,
        same_site: None,
    }];
    save_session(&path, &cookies).unwrap();

    let engine = FakeEngine::new();
    let pacer = RecordingPacer::default();
    engine.register("#avatar-btn", FakeElement::new("avatar"));

    let plan = LoginPlan {
        start_url: "https://tube.example/".to_string(),
        reveal_steps: vec![vec!["a.sign-in".to_string()]],
        logged_in_probe: "#avatar-btn".to_string(),
        completion_timeout: Duration::from_secs(120),
        step_settle: Duration::from_millis(1000),
        session_path: path,
    };

    let handoff = ensure_session(
        &engine,
        &pacer,
        &RetryPolicy::no_retries(),
        &ActionTimeouts::default(),
        &plan,
    )
    .await
    .expect("session restores");

    assert_eq!(handoff, SessionHandoff::Restored);
    assert_eq!(engine.cookie_jar.lock().unwrap().len(), 1);
    // Restore never clicks the sign-in cascade.
    assert!(engine.clicks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_session_falls_back_to_interactive_login() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cookies.json");

    let engine = FakeEngine::new();
    let pacer = RecordingPacer::default();
    engine.register("a.sign-in", FakeElement::new("sign-in"));
    engine.register("#avatar-btn", FakeElement::new("avatar"));

    let plan = LoginPlan {
        start_url: "https://tube.example/".to_string(),
        reveal_steps: vec![vec![
            "a.missing-variant".to_string(),
            "a.sign-in".to_string(),
        ]],
        logged_in_probe: "#avatar-btn".to_string(),
        completion_timeout: Duration::from_secs(120),
        step_settle: Duration::from_millis(1000),
        session_path: path.clone(),
    };

    let handoff = ensure_session(
        &engine,
        &pacer,
        &RetryPolicy::no_retries(),
        &ActionTimeouts::default(),
        &plan,
    )
    .await
    .expect("interactive login succeeds");

    assert_eq!(handoff, SessionHandoff::FreshLogin);
    // The second alternative clicked after the first one failed.
    assert_eq!(*engine.clicks.lock().unwrap(), vec!["sign-in".to_string()]);
    // The fresh (empty) cookie bundle was persisted.
    assert!(path.exists());
}

#[test]
fn title_matching_ports_the_containment_rules() {
    // Full title match.
    assert!(title_matches("Alpha", "ArtistX", "alpha (official video)"));
    // Parenthetical stripped from the song title.
    assert!(title_matches(
        "Alpha (Remastered 2020)",
        "Nobody",
        "Alpha - lyric video"
    ));
    // Artist-only match.
    assert!(title_matches("Unrelated", "ArtistX", "ArtistX live set"));
    // No overlap at all.
    assert!(!title_matches("Alpha", "ArtistX", "totally different"));
}
