//! Songbridge engine: browser I/O, persistence and the migration flows.
mod actions;
pub mod flows;
mod pace;
mod page;
mod persist;
mod scroll;
mod session;
mod webdriver;

pub use actions::{
    click_element, first_attribute, first_text, goto, wait_for_element, ActionTimeouts,
};
pub use pace::TokioPacer;
pub use page::{
    Cookie, ElementHandle, EngineError, PageEngine, PageWait, WaitState,
};
pub use persist::{ensure_parent_dir, load_library, save_library, write_atomic, PersistError};
pub use scroll::{load_all_items, LoadAllPlan};
pub use session::{
    clear_session, is_session_valid, load_session, save_session, ClearOutcome, SessionError,
};
pub use webdriver::{WebDriverEngine, WebDriverSettings};
