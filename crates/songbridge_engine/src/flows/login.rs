use std::path::PathBuf;
use std::time::Duration;

use flow_logging::{flow_info, flow_step, flow_success, flow_warn};
use songbridge_core::{FlowError, FlowResult, Pacer, PauseKind, RetryPolicy};

use crate::actions::{click_element, goto, ActionTimeouts};
use crate::page::{PageEngine, PageWait, WaitState};
use crate::session::{self, SessionError};

/// Everything needed to restore or establish one target system's session.
#[derive(Debug, Clone)]
pub struct LoginPlan {
    pub start_url: String,
    /// Click cascade revealing the login UI. Each step lists alternative
    /// selectors; the first one that clicks wins.
    pub reveal_steps: Vec<Vec<String>>,
    /// Element whose presence proves an authenticated session.
    pub logged_in_probe: String,
    /// How long to wait for the user to finish the manual part
    /// (QR scan, account picker).
    pub completion_timeout: Duration,
    /// Settle pause between reveal clicks.
    pub step_settle: Duration,
    /// Where this target system's cookie bundle lives.
    pub session_path: PathBuf,
}

/// How a valid session came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionHandoff {
    /// The persisted bundle was still accepted by the site.
    Restored,
    /// The user completed an interactive login; a fresh bundle was saved.
    FreshLogin,
}

/// Restores the persisted session when possible, otherwise runs the
/// interactive login.
pub async fn ensure_session(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &LoginPlan,
) -> FlowResult<SessionHandoff> {
    match session::load_session(&plan.session_path) {
        Ok(cookies) => {
            flow_info!("session cookies loaded, verifying validity...");
            goto(engine, pacer, retry, &plan.start_url, PageWait::DomReady).await?;
            engine.add_cookies(&cookies).await?;
            goto(engine, pacer, retry, &plan.start_url, PageWait::DomReady).await?;

            if session::is_session_valid(engine, &plan.logged_in_probe).await {
                flow_success!("existing session is valid, skipping login");
                return Ok(SessionHandoff::Restored);
            }
            flow_info!("session expired, login required");
        }
        Err(SessionError::NotFound(_)) => {
            flow_info!("no existing session found, login required");
        }
        Err(err) => {
            flow_warn!("could not read saved session ({err}), login required");
        }
    }

    interactive_login(engine, pacer, retry, timeouts, plan).await?;
    Ok(SessionHandoff::FreshLogin)
}

/// Walks the user through a fresh login and persists the resulting cookies.
pub async fn interactive_login(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    plan: &LoginPlan,
) -> FlowResult<()> {
    let total = 4;

    flow_step!(1, total, "Navigating to {}...", plan.start_url);
    goto(engine, pacer, retry, &plan.start_url, PageWait::Loaded)
        .await
        .map_err(|err| err.with_context("failed to open the login page"))?;
    flow_success!("login page loaded");

    flow_step!(2, total, "Revealing the login UI...");
    for alternatives in &plan.reveal_steps {
        click_first_alternative(engine, pacer, retry, timeouts, alternatives).await?;
        pacer.pause(PauseKind::FlowSettle, plan.step_settle).await;
    }
    flow_success!("login UI revealed");

    flow_step!(3, total, "Waiting for login completion...");
    flow_info!("complete the sign-in in the browser window");
    engine
        .wait_for(
            &plan.logged_in_probe,
            WaitState::Visible,
            plan.completion_timeout,
        )
        .await
        .map_err(|err| {
            FlowError::caused_by("login timeout - sign-in was not completed", err)
        })?;
    flow_success!("login successful");

    flow_step!(4, total, "Saving session cookies...");
    match engine.cookies().await {
        Ok(cookies) => {
            if let Err(err) = session::save_session(&plan.session_path, &cookies) {
                flow_warn!("failed to save session, next run will log in again: {err}");
            } else {
                flow_success!("session saved");
            }
        }
        Err(err) => {
            flow_warn!("could not read cookies from the engine: {err}");
        }
    }

    if !session::is_session_valid(engine, &plan.logged_in_probe).await {
        return Err(FlowError::new("login verification failed"));
    }
    flow_success!("login verified");

    Ok(())
}

async fn click_first_alternative(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    timeouts: &ActionTimeouts,
    alternatives: &[String],
) -> FlowResult<()> {
    let mut last_error = FlowError::new("reveal step lists no selectors");
    for selector in alternatives {
        match click_element(engine, pacer, retry, selector, timeouts.click).await {
            Ok(()) => return Ok(()),
            Err(err) => last_error = err,
        }
    }
    Err(last_error.with_context("failed to click through to the login UI"))
}
