use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flow_logging::{flow_info, flow_warn};
use serde::{Deserialize, Serialize};
use songbridge_core::{BatchOptions, RetryPolicy};
use songbridge_engine::flows::{LikePlan, LikesPlan, LoginPlan, PlaylistsPlan, RowSelectors};
use songbridge_engine::{ActionTimeouts, LoadAllPlan, WebDriverSettings};

/// Whole-app configuration: defaults in code, optionally overridden by a RON
/// file and `SONGBRIDGE_*` environment variables. Nothing here is global
/// state; every component receives its slice explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub webdriver: WebDriverConfig,
    pub urls: UrlsConfig,
    pub retry: RetryConfig,
    pub timeouts: TimeoutsConfig,
    pub scraping: ScrapingConfig,
    pub batch: BatchConfig,
    pub paths: PathsConfig,
    pub selectors: SelectorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    pub endpoint: String,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".to_string(),
            headless: false,
            window_width: 1280,
            window_height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlsConfig {
    pub source_home: String,
    pub source_library: String,
    pub destination_home: String,
    pub destination_search: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            source_home: "https://play.anghami.com/".to_string(),
            source_library: "https://play.anghami.com/mymusic".to_string(),
            destination_home: "https://www.youtube.com/".to_string(),
            destination_search: "https://www.youtube.com/results?search_query=".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub navigation_ms: u64,
    pub element_ms: u64,
    pub click_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            element_ms: 10_000,
            click_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub scroll_delay_ms: u64,
    pub max_scrolls: u32,
    /// Log a progress line every this many extracted songs.
    pub progress_interval: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            scroll_delay_ms: 2000,
            max_scrolls: 100,
            progress_interval: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub start_index: usize,
    pub max_items: Option<usize>,
    pub delay_between_items_ms: u64,
    pub progress_every: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            start_index: 0,
            max_items: None,
            delay_between_items_ms: 2500,
            progress_every: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Session files are keyed per target system to avoid cross-contamination.
    pub source_session: PathBuf,
    pub destination_session: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_session: PathBuf::from("data/session/cookies.json"),
            destination_session: PathBuf::from("data/session/youtube_cookies.json"),
            output: PathBuf::from("data/output/songs.json"),
        }
    }
}

/// Every site-specific selector string. These are application data fed into
/// the generic flows, never baked into them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorsConfig {
    pub source_likes_tab: String,
    pub source_playlists_tab: String,
    pub source_content: String,
    pub source_row: String,
    pub source_row_title: String,
    pub source_row_artist: String,
    pub source_row_album: String,
    pub source_scroll_containers: Vec<String>,
    pub source_playlist_card: String,
    pub source_card_link: String,
    pub source_card_title: String,
    pub source_playlist_probe: String,
    pub source_playlist_name: String,
    pub source_logged_in: String,
    pub source_login_steps: Vec<Vec<String>>,
    pub destination_results: String,
    pub destination_first_result: String,
    pub destination_title: String,
    pub destination_like_button: String,
    pub destination_logged_in: String,
    pub destination_login_steps: Vec<Vec<String>>,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            source_likes_tab: "div.menu-tab-item[data-tab=\"likes\"]".to_string(),
            source_playlists_tab: "div.menu-tab-item[data-tab=\"playlists\"]".to_string(),
            source_content: ".mymusic-displayed-content".to_string(),
            source_row: "a.table-row".to_string(),
            source_row_title: "div.cell-title span".to_string(),
            source_row_artist: "div.cell-artist a".to_string(),
            source_row_album: "div.cell-album a".to_string(),
            source_scroll_containers: vec![
                "#scroll_window".to_string(),
                "#base_content".to_string(),
            ],
            source_playlist_card:
                "div.position-relative:has(a.card-item-image-container[href*=\"/playlist/\"])"
                    .to_string(),
            source_card_link: "a.card-item-image-container[href*=\"/playlist/\"]".to_string(),
            source_card_title: "a.card-item-title".to_string(),
            source_playlist_probe: "button.anghami-default-btn-new.primary.texted".to_string(),
            source_playlist_name: "div.collection-title h1".to_string(),
            source_logged_in: "a[href*=\"/logout\"]".to_string(),
            source_login_steps: vec![
                vec!["#header_login_button".to_string()],
                vec![".qr-login-button".to_string()],
            ],
            destination_results: "ytd-video-renderer, #contents".to_string(),
            destination_first_result: "ytd-video-renderer a#video-title".to_string(),
            destination_title: "#title h1, ytd-watch-metadata h1".to_string(),
            destination_like_button: concat!(
                "#top-level-buttons-computed button[aria-label^=\"like this video\"], ",
                "#top-level-buttons-computed button[aria-label^=\"Unlike this video\"], ",
                "button[aria-label^=\"like this video\"], ",
                "button[aria-label^=\"Unlike this video\"]"
            )
            .to_string(),
            destination_logged_in: "#avatar-btn".to_string(),
            destination_login_steps: vec![vec![
                "a[href*=\"accounts.google.com\"]".to_string(),
                "#sign-in-button".to_string(),
            ]],
        }
    }
}

impl AppConfig {
    /// Loads the RON file when one is given and readable; falls back to
    /// defaults (with a warning) otherwise.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                flow_warn!("failed to read config from {:?}: {}", path, err);
                return Self::default();
            }
        };
        match ron::from_str(&content) {
            Ok(config) => {
                flow_info!("loaded config from {:?}", path);
                config
            }
            Err(err) => {
                flow_warn!("failed to parse config from {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    /// Applies `SONGBRIDGE_*` environment overrides on top of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = parse_env::<usize>("SONGBRIDGE_START_INDEX") {
            self.batch.start_index = value;
        }
        if let Some(value) = parse_env::<usize>("SONGBRIDGE_MAX_ITEMS") {
            self.batch.max_items = Some(value);
        }
        if let Some(value) = parse_env::<u64>("SONGBRIDGE_DELAY_MS") {
            self.batch.delay_between_items_ms = value;
        }
        if let Ok(value) = env::var("SONGBRIDGE_WEBDRIVER_URL") {
            self.webdriver.endpoint = value;
        }
        if let Some(value) = parse_env::<bool>("SONGBRIDGE_HEADLESS") {
            self.webdriver.headless = value;
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            backoff_multiplier: self.retry.backoff_multiplier,
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn action_timeouts(&self) -> ActionTimeouts {
        ActionTimeouts {
            navigation: Duration::from_millis(self.timeouts.navigation_ms),
            element: Duration::from_millis(self.timeouts.element_ms),
            click: Duration::from_millis(self.timeouts.click_ms),
        }
    }

    pub fn webdriver_settings(&self) -> WebDriverSettings {
        WebDriverSettings {
            endpoint: self.webdriver.endpoint.clone(),
            headless: self.webdriver.headless,
            window: (self.webdriver.window_width, self.webdriver.window_height),
            page_ready_timeout: Duration::from_millis(self.timeouts.navigation_ms),
            ..WebDriverSettings::default()
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            start_index: self.batch.start_index,
            max_items: self.batch.max_items,
            item_gap: Duration::from_millis(self.batch.delay_between_items_ms),
            progress_every: self.batch.progress_every,
        }
    }

    fn row_selectors(&self) -> RowSelectors {
        RowSelectors {
            row: self.selectors.source_row.clone(),
            title: self.selectors.source_row_title.clone(),
            artist: self.selectors.source_row_artist.clone(),
            album: self.selectors.source_row_album.clone(),
            url_attribute: "href".to_string(),
        }
    }

    fn scroll_plan(&self, item_selector: &str, item_name: &str) -> LoadAllPlan {
        LoadAllPlan {
            item_selector: item_selector.to_string(),
            container_selectors: self.selectors.source_scroll_containers.clone(),
            item_name: item_name.to_string(),
            max_rounds: self.scraping.max_scrolls,
            round_delay: Duration::from_millis(self.scraping.scroll_delay_ms),
        }
    }

    pub fn likes_plan(&self) -> LikesPlan {
        LikesPlan {
            tab_selector: self.selectors.source_likes_tab.clone(),
            rows: self.row_selectors(),
            scroll: self.scroll_plan(&self.selectors.source_row, "songs"),
            extract_progress_every: self.scraping.progress_interval,
        }
    }

    pub fn playlists_plan(&self) -> PlaylistsPlan {
        PlaylistsPlan {
            tab_selector: self.selectors.source_playlists_tab.clone(),
            content_probe: self.selectors.source_content.clone(),
            card_selector: self.selectors.source_playlist_card.clone(),
            card_link_selector: self.selectors.source_card_link.clone(),
            card_title_selector: self.selectors.source_card_title.clone(),
            base_url: self.urls.source_home.clone(),
            library_url: self.urls.source_library.clone(),
            page_probe: self.selectors.source_playlist_probe.clone(),
            name_selector: self.selectors.source_playlist_name.clone(),
            id_prefix: "/playlist/".to_string(),
            rows: self.row_selectors(),
            card_scroll: self.scroll_plan(&self.selectors.source_playlist_card, "playlists"),
            song_scroll: self.scroll_plan(&self.selectors.source_row, "songs"),
            page_settle: Duration::from_millis(2000),
            return_settle: Duration::from_millis(1000),
        }
    }

    pub fn like_plan(&self) -> LikePlan {
        LikePlan {
            search_url: self.urls.destination_search.clone(),
            results_probe: self.selectors.destination_results.clone(),
            first_result_link: self.selectors.destination_first_result.clone(),
            base_url: self.urls.destination_home.clone(),
            title_selector: self.selectors.destination_title.clone(),
            like_button: self.selectors.destination_like_button.clone(),
            pressed_attribute: "aria-pressed".to_string(),
            button_timeout: Duration::from_secs(15),
            page_settle: Duration::from_millis(1500),
            click_settle: Duration::from_millis(1000),
        }
    }

    pub fn source_login_plan(&self) -> LoginPlan {
        LoginPlan {
            start_url: self.urls.source_home.clone(),
            reveal_steps: self.selectors.source_login_steps.clone(),
            logged_in_probe: self.selectors.source_logged_in.clone(),
            completion_timeout: Duration::from_secs(120),
            step_settle: Duration::from_millis(1000),
            session_path: self.paths.source_session.clone(),
        }
    }

    pub fn destination_login_plan(&self) -> LoginPlan {
        LoginPlan {
            start_url: self.urls.destination_home.clone(),
            reveal_steps: self.selectors.destination_login_steps.clone(),
            logged_in_probe: self.selectors.destination_logged_in.clone(),
            completion_timeout: Duration::from_secs(120),
            step_settle: Duration::from_millis(1000),
            session_path: self.paths.destination_session.clone(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            flow_warn!("ignoring unparsable {name}={raw}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.retry.max_delay_ms, 10_000);
        assert_eq!(config.scraping.max_scrolls, 100);
        assert_eq!(config.scraping.scroll_delay_ms, 2000);
        assert_eq!(config.batch.delay_between_items_ms, 2500);
    }

    #[test]
    fn partial_ron_files_keep_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(retry: (max_attempts: 5))").unwrap();

        let config = AppConfig::load(Some(&path));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.batch.progress_every, 10);
    }

    #[test]
    fn unreadable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ron");
        let config = AppConfig::load(Some(&path));
        assert_eq!(config.retry.max_attempts, 3);
    }
}
