use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::{json, Value};
use url::Url;

use crate::page::{
    Cookie, ElementHandle, EngineError, PageEngine, PageWait, WaitState,
};

/// W3C element identifier key in WebDriver payloads.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone)]
pub struct WebDriverSettings {
    /// Base URL of the driver's remote end (chromedriver, geckodriver, ...).
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Polling interval used by `wait_for` and the post-navigation
    /// readiness check.
    pub poll_interval: Duration,
    /// Upper bound on the post-navigation readiness poll.
    pub page_ready_timeout: Duration,
    pub headless: bool,
    pub window: (u32, u32),
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            page_ready_timeout: Duration::from_secs(30),
            headless: false,
            window: (1280, 720),
        }
    }
}

/// A minimal W3C WebDriver client backed by `reqwest`.
///
/// One engine owns one driver session; dropping it leaks the session, so
/// callers that care should `quit()` explicitly.
#[derive(Debug)]
pub struct WebDriverEngine {
    http: reqwest::Client,
    base: Url,
    session_id: String,
    settings: WebDriverSettings,
}

impl WebDriverEngine {
    /// Opens a new driver session against `settings.endpoint`.
    pub async fn connect(settings: WebDriverSettings) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| EngineError::Transport(err.to_string()))?;

        let base = Url::parse(&settings.endpoint)
            .map_err(|err| EngineError::Transport(format!("invalid endpoint: {err}")))?;

        let mut args = vec![format!(
            "--window-size={},{}",
            settings.window.0, settings.window.1
        )];
        if settings.headless {
            args.push("--headless=new".to_string());
        }

        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let value = raw_request(&http, &base, reqwest::Method::POST, "session", Some(&body)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::Decode("session response without sessionId".into()))?
            .to_string();

        Ok(Self {
            http,
            base,
            session_id,
            settings,
        })
    }

    /// Ends the driver session.
    pub async fn quit(self) -> Result<(), EngineError> {
        self.request(reqwest::Method::DELETE, "", None).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, EngineError> {
        let path = if path.is_empty() {
            format!("session/{}", self.session_id)
        } else {
            format!("session/{}/{}", self.session_id, path)
        };
        raw_request(&self.http, &self.base, method, &path, body).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, EngineError> {
        let body = json!({ "script": script, "args": args });
        self.request(reqwest::Method::POST, "execute/sync", Some(&body))
            .await
            .map_err(|err| match err {
                EngineError::Protocol { error, message } if error == "javascript error" => {
                    EngineError::Script(message)
                }
                other => other,
            })
    }

    async fn find_all(
        &self,
        scope: Option<&ElementHandle>,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, EngineError> {
        let path = match scope {
            Some(scope) => format!("element/{}/elements", scope.as_str()),
            None => "elements".to_string(),
        };
        let body = json!({ "using": "css selector", "value": selector });
        let value = self.request(reqwest::Method::POST, &path, Some(&body)).await?;

        let list = value
            .as_array()
            .ok_or_else(|| EngineError::Decode("elements response is not a list".into()))?;
        list.iter()
            .map(|entry| {
                entry
                    .get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .map(|id| ElementHandle(id.to_string()))
                    .ok_or_else(|| EngineError::Decode("element entry without id".into()))
            })
            .collect()
    }

    async fn is_displayed(&self, handle: &ElementHandle) -> Result<bool, EngineError> {
        let path = format!("element/{}/displayed", handle.as_str());
        let value = self.request(reqwest::Method::GET, &path, None).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn element_arg(handle: &ElementHandle) -> Value {
        json!({ ELEMENT_KEY: handle.as_str() })
    }

    async fn ready_state(&self) -> Result<String, EngineError> {
        let value = self.execute("return document.readyState;", Vec::new()).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

async fn raw_request(
    http: &reqwest::Client,
    base: &Url,
    method: reqwest::Method,
    path: &str,
    body: Option<&Value>,
) -> Result<Value, EngineError> {
    let url = base
        .join(path)
        .map_err(|err| EngineError::Transport(err.to_string()))?;

    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    } else {
        // Some drivers insist on a JSON body for every POST.
        request = request.header(reqwest::header::CONTENT_TYPE, "application/json");
    }

    let response = request.send().await.map_err(map_reqwest_error)?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|err| EngineError::Decode(err.to_string()))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(map_protocol_error(status, &value));
    }
    Ok(value)
}

fn map_reqwest_error(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        return EngineError::Timeout;
    }
    EngineError::Transport(err.to_string())
}

fn map_protocol_error(status: StatusCode, value: &Value) -> EngineError {
    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match error.as_str() {
        "no such element" => EngineError::NoSuchElement(message),
        "stale element reference" => EngineError::StaleElement,
        "timeout" | "script timeout" => EngineError::Timeout,
        _ => {
            let message = if message.is_empty() {
                status.to_string()
            } else {
                message
            };
            EngineError::Protocol { error, message }
        }
    }
}

#[async_trait::async_trait]
impl PageEngine for WebDriverEngine {
    async fn locate(&self, selector: &str) -> Result<Vec<ElementHandle>, EngineError> {
        self.find_all(None, selector).await
    }

    async fn locate_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, EngineError> {
        self.find_all(Some(scope), selector).await
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), EngineError> {
        let path = format!("element/{}/click", handle.as_str());
        self.request(reqwest::Method::POST, &path, Some(&json!({})))
            .await?;
        Ok(())
    }

    async fn fill(&self, handle: &ElementHandle, text: &str) -> Result<(), EngineError> {
        let clear = format!("element/{}/clear", handle.as_str());
        self.request(reqwest::Method::POST, &clear, Some(&json!({})))
            .await?;
        let value = format!("element/{}/value", handle.as_str());
        self.request(reqwest::Method::POST, &value, Some(&json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn text(&self, handle: &ElementHandle) -> Result<String, EngineError> {
        let path = format!("element/{}/text", handle.as_str());
        let value = self.request(reqwest::Method::GET, &path, None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        let path = format!("element/{}/attribute/{}", handle.as_str(), name);
        let value = self.request(reqwest::Method::GET, &path, None).await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn navigate(&self, url: &str, wait: PageWait) -> Result<(), EngineError> {
        self.request(reqwest::Method::POST, "url", Some(&json!({ "url": url })))
            .await?;

        // The driver blocks per its session load strategy; the per-call wait
        // policy is honored with a client-side readiness poll.
        let deadline = Instant::now() + self.settings.page_ready_timeout;
        loop {
            let state = self.ready_state().await?;
            let ready = match wait {
                PageWait::DomReady => state == "interactive" || state == "complete",
                PageWait::Loaded => state == "complete",
            };
            if ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(EngineError::Timeout);
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn wait_for(
        &self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> Result<ElementHandle, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.find_all(None, selector).await?;
            if let Some(handle) = found.into_iter().next() {
                match state {
                    WaitState::Present => return Ok(handle),
                    WaitState::Visible => {
                        // A handle can go stale between lookup and the
                        // displayed probe; treat that as not-yet-visible.
                        match self.is_displayed(&handle).await {
                            Ok(true) => return Ok(handle),
                            Ok(false) | Err(EngineError::StaleElement) => {}
                            Err(err) => return Err(err),
                        }
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(EngineError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn scroll_to_bottom(
        &self,
        container: Option<&ElementHandle>,
    ) -> Result<(), EngineError> {
        match container {
            Some(handle) => {
                self.execute(
                    "arguments[0].scrollTo(0, arguments[0].scrollHeight);",
                    vec![Self::element_arg(handle)],
                )
                .await?;
            }
            None => {
                self.execute(
                    "window.scrollTo(0, document.body.scrollHeight);",
                    Vec::new(),
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn scroll_into_view(&self, handle: &ElementHandle) -> Result<(), EngineError> {
        self.execute(
            "arguments[0].scrollIntoView({block: 'end'});",
            vec![Self::element_arg(handle)],
        )
        .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        let value = self.request(reqwest::Method::GET, "url", None).await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| EngineError::Decode("url response is not a string".into()))
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, EngineError> {
        let value = self.request(reqwest::Method::GET, "cookie", None).await?;
        serde_json::from_value(value).map_err(|err| EngineError::Decode(err.to_string()))
    }

    async fn add_cookies(&self, cookies: &[Cookie]) -> Result<(), EngineError> {
        for cookie in cookies {
            let body = json!({ "cookie": cookie });
            self.request(reqwest::Method::POST, "cookie", Some(&body))
                .await?;
        }
        Ok(())
    }
}
