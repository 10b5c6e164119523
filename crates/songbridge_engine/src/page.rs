use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use songbridge_core::FlowError;

/// Opaque reference to a located element, as minted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What `wait_for` requires of the matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Present in the DOM, visible or not.
    Present,
    /// Present and displayed.
    Visible,
}

/// Readiness to require after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWait {
    /// DOM parsed; subresources may still be loading.
    DomReady,
    /// Full load event fired.
    Loaded,
}

/// One browser cookie as persisted in a session bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

/// Failures surfaced by a page engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("no element matching {0}")]
    NoSuchElement(String),
    #[error("stale element handle")]
    StaleElement,
    #[error("timed out after {timeout:?} waiting for {selector}")]
    WaitTimeout { selector: String, timeout: Duration },
    #[error("webdriver error {error}: {message}")]
    Protocol { error: String, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("script error: {0}")]
    Script(String),
}

impl From<EngineError> for FlowError {
    fn from(err: EngineError) -> Self {
        FlowError::new(err.to_string())
    }
}

/// The narrow automation capability the resilience layer is written against.
///
/// Production uses the WebDriver adapter; tests substitute a scripted fake.
/// Implementations surface expected conditions (missing element, timeout) as
/// `EngineError` values, never panics.
#[async_trait]
pub trait PageEngine: Send + Sync {
    /// All elements currently matching `selector`, in document order.
    async fn locate(&self, selector: &str) -> Result<Vec<ElementHandle>, EngineError>;

    /// Elements matching `selector` beneath `scope`.
    async fn locate_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, EngineError>;

    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, EngineError> {
        Ok(self.locate(selector).await?.len())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), EngineError>;

    /// Clears the element and types `text` into it.
    async fn fill(&self, handle: &ElementHandle, text: &str) -> Result<(), EngineError>;

    async fn text(&self, handle: &ElementHandle) -> Result<String, EngineError>;

    /// The attribute's value, or `None` when the attribute is absent.
    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError>;

    async fn navigate(&self, url: &str, wait: PageWait) -> Result<(), EngineError>;

    /// Polls until `selector` matches an element in `state`, or fails with
    /// `EngineError::WaitTimeout` once `timeout` has elapsed.
    async fn wait_for(
        &self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> Result<ElementHandle, EngineError>;

    /// Scrolls `container` (or the window when `None`) to its bottom.
    async fn scroll_to_bottom(&self, container: Option<&ElementHandle>)
        -> Result<(), EngineError>;

    async fn scroll_into_view(&self, handle: &ElementHandle) -> Result<(), EngineError>;

    async fn current_url(&self) -> Result<String, EngineError>;

    async fn cookies(&self) -> Result<Vec<Cookie>, EngineError>;

    async fn add_cookies(&self, cookies: &[Cookie]) -> Result<(), EngineError>;
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
