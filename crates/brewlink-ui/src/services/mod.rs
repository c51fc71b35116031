//! Browser bindings for the client core.
//!
//! # Design
//! - Create exactly one [`AppContext`] per page and pass it to consumers.
//! - Browser failures are logged to the console and never panic.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::console;
use gloo::storage::{LocalStorage, Storage};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::bootstrap::{BuildMode, resolve_root_url};
use crate::error::{StorageError, StorageResult};
use crate::locale::{LocaleOptions, detect_locale};
use crate::preferences::{LocalPreferenceStore, PreferenceStorage};
use crate::store::RemoteStateStore;

/// `window.localStorage` preference backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl PreferenceStorage for BrowserStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        LocalStorage::raw()
            .get_item(key)
            .map_err(|err| storage_error("get", key, &err))
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| storage_error("set", key, &err))
    }
}

fn storage_error(operation: &'static str, key: &str, err: &JsValue) -> StorageError {
    let detail = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    console::error!("storage operation failed", operation, key, detail.clone());
    StorageError::Unavailable { detail }
}

/// Languages from `navigator.languages`, falling back to `navigator.language`.
#[must_use]
pub fn browser_languages() -> Vec<String> {
    let Some(window) = web_sys::window() else {
        return Vec::new();
    };
    let navigator = window.navigator();
    let languages: Vec<String> = navigator
        .languages()
        .iter()
        .filter_map(|value| value.as_string())
        .collect();
    if languages.is_empty() {
        navigator.language().into_iter().collect()
    } else {
        languages
    }
}

/// Controller root URL for this page, `None` without a window.
#[must_use]
pub fn browser_root_url() -> Option<String> {
    let origin = web_sys::window()?.location().origin().ok()?;
    Some(resolve_root_url(&origin, BuildMode::current()))
}

/// Detected browser locale, exported to JavaScript.
#[wasm_bindgen]
#[must_use]
pub fn detected_locale(country_code_only: bool) -> Option<String> {
    detect_locale(&browser_languages(), LocaleOptions { country_code_only })
}

/// Per-page stores shared with every consumer.
#[derive(Clone, Debug)]
pub struct AppContext {
    /// Controller settings and schedules cache.
    pub remote: Rc<RemoteStateStore>,
    /// Local-only preferences.
    pub preferences: Rc<RefCell<LocalPreferenceStore<BrowserStorage>>>,
    /// Locale reported by the browser at boot.
    pub locale: Option<String>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext {
    /// Build the stores and bind the remote store to this page's controller.
    #[must_use]
    pub fn new() -> Self {
        let remote = RemoteStateStore::new();
        match browser_root_url() {
            Some(root_url) => {
                if let Err(err) = remote.set_root_url(root_url) {
                    console::error!("controller root URL rejected", err.to_string());
                }
            }
            None => console::error!("window location unavailable; controller unreachable"),
        }
        Self {
            remote: Rc::new(remote),
            preferences: Rc::new(RefCell::new(LocalPreferenceStore::new(BrowserStorage))),
            locale: detect_locale(&browser_languages(), LocaleOptions::default()),
        }
    }

    /// Start the initial settings load (and its schedules cascade).
    pub fn boot(&self) {
        let remote = Rc::clone(&self.remote);
        spawn_local(async move {
            if let Err(err) = remote.get_system_settings().await {
                console::error!("initial settings load failed", err.to_string());
            }
        });
    }
}

impl PartialEq for AppContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.remote, &other.remote) && Rc::ptr_eq(&self.preferences, &other.preferences)
    }
}
