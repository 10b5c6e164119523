//! Scripted fakes shared by the engine integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use songbridge_core::{Pacer, PauseKind};
use songbridge_engine::{Cookie, ElementHandle, EngineError, PageEngine, PageWait, WaitState};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub id: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
}

impl FakeElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }
}

/// A `PageEngine` whose DOM is a selector registry filled by the test.
#[derive(Default)]
pub struct FakeEngine {
    by_id: Mutex<HashMap<String, FakeElement>>,
    by_selector: Mutex<HashMap<String, Vec<String>>>,
    scoped: Mutex<HashMap<(String, String), Vec<String>>>,
    count_scripts: Mutex<HashMap<String, Vec<usize>>>,
    pub clicks: Mutex<Vec<String>>,
    pub navigations: Mutex<Vec<String>>,
    pub scrolls: Mutex<u32>,
    pub cookie_jar: Mutex<Vec<Cookie>>,
    current: Mutex<String>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, selector: &str, element: FakeElement) {
        self.by_selector
            .lock()
            .unwrap()
            .entry(selector.to_string())
            .or_default()
            .push(element.id.clone());
        self.by_id.lock().unwrap().insert(element.id.clone(), element);
    }

    pub fn register_within(&self, parent_id: &str, selector: &str, element: FakeElement) {
        self.scoped
            .lock()
            .unwrap()
            .entry((parent_id.to_string(), selector.to_string()))
            .or_default()
            .push(element.id.clone());
        self.by_id.lock().unwrap().insert(element.id.clone(), element);
    }

    /// Scripts successive `count()` results for a selector; the last value
    /// repeats once the script runs dry.
    pub fn script_counts(&self, selector: &str, counts: &[usize]) {
        let mut script = counts.to_vec();
        script.reverse();
        self.count_scripts
            .lock()
            .unwrap()
            .insert(selector.to_string(), script);
    }

    pub fn set_attr(&self, id: &str, name: &str, value: &str) {
        if let Some(element) = self.by_id.lock().unwrap().get_mut(id) {
            element.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn ids_for(&self, selector: &str) -> Vec<String> {
        self.by_selector
            .lock()
            .unwrap()
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageEngine for FakeEngine {
    async fn locate(&self, selector: &str) -> Result<Vec<ElementHandle>, EngineError> {
        Ok(self.ids_for(selector).into_iter().map(ElementHandle).collect())
    }

    async fn locate_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, EngineError> {
        let key = (scope.as_str().to_string(), selector.to_string());
        let ids = self
            .scoped
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default();
        Ok(ids.into_iter().map(ElementHandle).collect())
    }

    async fn count(&self, selector: &str) -> Result<usize, EngineError> {
        let mut scripts = self.count_scripts.lock().unwrap();
        if let Some(script) = scripts.get_mut(selector) {
            let count = if script.len() > 1 {
                script.pop().unwrap()
            } else {
                *script.last().expect("count script is empty")
            };
            return Ok(count);
        }
        drop(scripts);
        Ok(self.ids_for(selector).len())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), EngineError> {
        self.clicks.lock().unwrap().push(handle.as_str().to_string());
        Ok(())
    }

    async fn fill(&self, _handle: &ElementHandle, _text: &str) -> Result<(), EngineError> {
        Ok(())
    }

    async fn text(&self, handle: &ElementHandle) -> Result<String, EngineError> {
        self.by_id
            .lock()
            .unwrap()
            .get(handle.as_str())
            .map(|element| element.text.clone())
            .ok_or(EngineError::StaleElement)
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        self.by_id
            .lock()
            .unwrap()
            .get(handle.as_str())
            .map(|element| element.attrs.get(name).cloned())
            .ok_or(EngineError::StaleElement)
    }

    async fn navigate(&self, url: &str, _wait: PageWait) -> Result<(), EngineError> {
        self.navigations.lock().unwrap().push(url.to_string());
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        _state: WaitState,
        timeout: Duration,
    ) -> Result<ElementHandle, EngineError> {
        self.ids_for(selector)
            .into_iter()
            .next()
            .map(ElementHandle)
            .ok_or(EngineError::WaitTimeout {
                selector: selector.to_string(),
                timeout,
            })
    }

    async fn scroll_to_bottom(
        &self,
        _container: Option<&ElementHandle>,
    ) -> Result<(), EngineError> {
        *self.scrolls.lock().unwrap() += 1;
        Ok(())
    }

    async fn scroll_into_view(&self, _handle: &ElementHandle) -> Result<(), EngineError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, EngineError> {
        Ok(self.cookie_jar.lock().unwrap().clone())
    }

    async fn add_cookies(&self, cookies: &[Cookie]) -> Result<(), EngineError> {
        self.cookie_jar.lock().unwrap().extend_from_slice(cookies);
        Ok(())
    }
}

/// Records pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingPacer {
    pub pauses: Mutex<Vec<(PauseKind, Duration)>>,
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        self.pauses.lock().unwrap().push((kind, duration));
    }
}
