use chrono::{SecondsFormat, Utc};
use flow_logging::{flow_info, flow_success, flow_warn};
use songbridge_core::{FlowError, FlowResult, Library};
use songbridge_engine::flows::{
    add_all_songs_to_likes, ensure_session, scrape_likes, scrape_playlists,
};
use songbridge_engine::{
    clear_session, goto, load_library, save_library, wait_for_element, ClearOutcome, PageWait,
    TokioPacer, WaitState, WebDriverEngine,
};

use crate::cli::{Command, Target};
use crate::config::AppConfig;

pub async fn run(command: Command, mut config: AppConfig) -> FlowResult<()> {
    match command {
        Command::Scrape {
            likes_only,
            playlists_only,
        } => scrape(&config, likes_only, playlists_only).await,
        Command::PushLikes {
            start_index,
            max_items,
            delay_ms,
        } => {
            if let Some(value) = start_index {
                config.batch.start_index = value;
            }
            if let Some(value) = max_items {
                config.batch.max_items = Some(value);
            }
            if let Some(value) = delay_ms {
                config.batch.delay_between_items_ms = value;
            }
            push_likes(&config).await
        }
        Command::Login { target } => login(&config, target).await,
        Command::ClearSession { target } => clear(&config, target),
    }
}

async fn connect(config: &AppConfig) -> FlowResult<WebDriverEngine> {
    WebDriverEngine::connect(config.webdriver_settings())
        .await
        .map_err(|err| {
            FlowError::caused_by(
                format!(
                    "failed to open a browser session via {}",
                    config.webdriver.endpoint
                ),
                err,
            )
        })
}

async fn scrape(config: &AppConfig, likes_only: bool, playlists_only: bool) -> FlowResult<()> {
    let engine = connect(config).await?;
    let pacer = TokioPacer;
    let retry = config.retry_policy();
    let timeouts = config.action_timeouts();

    flow_info!("=== Checking the source session ===");
    ensure_session(&engine, &pacer, &retry, &timeouts, &config.source_login_plan()).await?;

    let mut library = Library::new(now_iso());

    open_library_page(config, &engine, &pacer).await?;

    if !playlists_only {
        flow_info!("=== Scraping liked songs ===");
        let outcome = scrape_likes(
            &engine,
            &pacer,
            &retry,
            &timeouts,
            &config.likes_plan(),
            &mut library,
            &now_iso(),
        )
        .await?;
        flow_success!("liked songs scraped: {}", outcome.extracted);
    }

    if !likes_only {
        flow_info!("=== Scraping playlists ===");
        open_library_page(config, &engine, &pacer).await?;
        let report = scrape_playlists(
            &engine,
            &pacer,
            &retry,
            &timeouts,
            &config.playlists_plan(),
            &config.batch_options(),
            &mut library,
            &now_iso(),
        )
        .await?;
        if !report.is_success() {
            flow_warn!("{} playlists failed to scrape", report.failed);
        }
    }

    save_library(&config.paths.output, &library)
        .map_err(|err| FlowError::caused_by("failed to write the output file", err))?;
    flow_success!(
        "saved {} songs and {} playlists to {:?}",
        library.metadata.total_songs,
        library.metadata.total_playlists,
        config.paths.output
    );

    quit(engine).await;
    Ok(())
}

async fn push_likes(config: &AppConfig) -> FlowResult<()> {
    let library = load_library(&config.paths.output).map_err(|err| {
        FlowError::caused_by(
            format!("failed to load the scraped library {:?}", config.paths.output),
            err,
        )
    })?;
    flow_success!(
        "loaded {} songs from {:?}",
        library.liked_songs.len(),
        config.paths.output
    );

    let engine = connect(config).await?;
    let pacer = TokioPacer;
    let retry = config.retry_policy();
    let timeouts = config.action_timeouts();

    flow_info!("=== Checking the destination session ===");
    ensure_session(
        &engine,
        &pacer,
        &retry,
        &timeouts,
        &config.destination_login_plan(),
    )
    .await?;

    flow_info!("=== Adding songs to likes ===");
    let report = add_all_songs_to_likes(
        &engine,
        &pacer,
        &retry,
        &timeouts,
        &config.like_plan(),
        &library.liked_songs,
        &config.batch_options(),
    )
    .await;

    flow_info!("=== Final summary ===");
    flow_info!("total processed: {}", report.total_processed());
    flow_info!("added: {}", report.added);
    flow_info!("skipped (already liked): {}", report.skipped);
    flow_info!("failed: {}", report.failed);

    quit(engine).await;

    if !report.is_success() {
        return Err(FlowError::new(format!(
            "{} of {} songs failed",
            report.failed,
            report.total_processed()
        )));
    }
    Ok(())
}

async fn login(config: &AppConfig, target: Target) -> FlowResult<()> {
    let engine = connect(config).await?;
    let pacer = TokioPacer;
    let retry = config.retry_policy();
    let timeouts = config.action_timeouts();

    let plan = match target {
        Target::Source => config.source_login_plan(),
        Target::Destination => config.destination_login_plan(),
    };
    let handoff = ensure_session(&engine, &pacer, &retry, &timeouts, &plan).await?;
    flow_success!("session ready ({handoff:?})");

    quit(engine).await;
    Ok(())
}

fn clear(config: &AppConfig, target: Target) -> FlowResult<()> {
    let path = match target {
        Target::Source => &config.paths.source_session,
        Target::Destination => &config.paths.destination_session,
    };
    match clear_session(path) {
        Ok(ClearOutcome::Removed) => {
            flow_success!("session removed: {:?}", path);
            Ok(())
        }
        Ok(ClearOutcome::NotFound) => {
            flow_info!("no session to remove at {:?}", path);
            Ok(())
        }
        Err(err) => Err(FlowError::caused_by("failed to clear the session", err)),
    }
}

async fn open_library_page(
    config: &AppConfig,
    engine: &WebDriverEngine,
    pacer: &TokioPacer,
) -> FlowResult<()> {
    let retry = config.retry_policy();
    goto(
        engine,
        pacer,
        &retry,
        &config.urls.source_library,
        PageWait::DomReady,
    )
    .await?;
    wait_for_element(
        engine,
        pacer,
        &retry,
        &config.selectors.source_content,
        WaitState::Visible,
        config.action_timeouts().element,
    )
    .await
    .map_err(|err| err.with_context("library page never rendered"))?;
    Ok(())
}

async fn quit(engine: WebDriverEngine) {
    if let Err(err) = engine.quit().await {
        flow_warn!("failed to close the browser session: {err}");
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
