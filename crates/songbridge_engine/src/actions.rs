use std::time::Duration;

use songbridge_core::{run_with_retry, FlowError, FlowResult, Pacer, RetryPolicy};

use crate::page::{ElementHandle, PageEngine, PageWait, WaitState};

/// Per-action timeout bounds; each primitive owns its own, the retry
/// executor adds none of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTimeouts {
    pub navigation: Duration,
    pub element: Duration,
    pub click: Duration,
}

impl Default for ActionTimeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            element: Duration::from_secs(10),
            click: Duration::from_secs(5),
        }
    }
}

/// Navigates with retries; the engine enforces the page-ready bound.
pub async fn goto(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    url: &str,
    wait: PageWait,
) -> FlowResult<()> {
    run_with_retry(retry, pacer, move || async move {
        engine.navigate(url, wait).await?;
        Ok(())
    })
    .await
}

/// Waits for `selector` to reach `state`, with retries around the wait.
pub async fn wait_for_element(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    selector: &str,
    state: WaitState,
    timeout: Duration,
) -> FlowResult<ElementHandle> {
    run_with_retry(retry, pacer, move || async move {
        let handle = engine.wait_for(selector, state, timeout).await?;
        Ok(handle)
    })
    .await
}

/// Locates the first match of `selector` and clicks it, with retries.
pub async fn click_element(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    retry: &RetryPolicy,
    selector: &str,
    timeout: Duration,
) -> FlowResult<()> {
    run_with_retry(retry, pacer, move || async move {
        let handle = engine.wait_for(selector, WaitState::Visible, timeout).await?;
        engine.click(&handle).await?;
        Ok(())
    })
    .await
}

/// Text of the first element matching `selector`, optionally scoped.
///
/// Extraction reads are not retried; callers tolerate individual misses.
pub async fn first_text(
    engine: &dyn PageEngine,
    scope: Option<&ElementHandle>,
    selector: &str,
) -> FlowResult<String> {
    let handle = first_handle(engine, scope, selector).await?;
    let text = engine.text(&handle).await?;
    Ok(text.trim().to_string())
}

/// Attribute of the first element matching `selector`, optionally scoped.
pub async fn first_attribute(
    engine: &dyn PageEngine,
    scope: Option<&ElementHandle>,
    selector: &str,
    name: &str,
) -> FlowResult<Option<String>> {
    let handle = first_handle(engine, scope, selector).await?;
    let value = engine.attribute(&handle, name).await?;
    Ok(value)
}

async fn first_handle(
    engine: &dyn PageEngine,
    scope: Option<&ElementHandle>,
    selector: &str,
) -> FlowResult<ElementHandle> {
    let found = match scope {
        Some(scope) => engine.locate_within(scope, selector).await?,
        None => engine.locate(selector).await?,
    };
    found
        .into_iter()
        .next()
        .ok_or_else(|| FlowError::new(format!("no element matching {selector}")))
}
