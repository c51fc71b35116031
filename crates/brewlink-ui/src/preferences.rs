//! Local-only client preferences and their storage backends.
//!
//! # Design
//! - One storage key holds the whole JSON document; there is no schema version.
//! - `load` never fails: absent, unreadable or corrupt data yields fresh defaults.
//! - Storage is written only by an explicit `save`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Storage key holding the serialised [`ClientSettings`].
pub const CLIENT_SETTINGS_KEY: &str = "clientSettings";

/// Audio, speech and theme preferences kept on this client only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Play a beep on schedule notifications.
    pub beep_enabled: bool,
    /// Beep volume in `0.0..=1.0`.
    pub beep_volume: f64,
    /// Speak notification messages.
    pub speech_enabled: bool,
    /// Speech volume in `0.0..=1.0`.
    pub speech_volume: f64,
    /// Speech rate multiplier.
    pub speech_rate: f64,
    /// Selected speech voice, `None` for the platform default.
    pub voice_uri: Option<String>,
    /// Dark mode override, `None` to follow the system.
    pub dark_mode: Option<bool>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            beep_enabled: true,
            beep_volume: 0.5,
            speech_enabled: false,
            speech_volume: 0.5,
            speech_rate: 0.7,
            voice_uri: None,
            dark_mode: None,
        }
    }
}

/// Key/value string storage backing the preference store.
pub trait PreferenceStorage {
    /// Read the value stored under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot be read.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with `key = value`.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::PreferenceStorage;
    use crate::error::{StorageError, StorageResult};

    /// Directory-backed storage writing one `<key>.json` file per key.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        /// Store preferences under `dir`, created on first write.
        #[must_use]
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        /// Directory holding the preference files.
        #[must_use]
        pub fn dir(&self) -> &Path {
            &self.dir
        }

        /// Path of the file backing `key`.
        #[must_use]
        pub fn path_for(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl PreferenceStorage for FileStorage {
        fn read(&self, key: &str) -> StorageResult<Option<String>> {
            match fs::read_to_string(self.path_for(key)) {
                Ok(raw) => Ok(Some(raw)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(StorageError::Io {
                    operation: "preferences.read",
                    source,
                }),
            }
        }

        fn write(&self, key: &str, value: &str) -> StorageResult<()> {
            fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
                operation: "preferences.create_dir",
                source,
            })?;
            fs::write(self.path_for(key), value).map_err(|source| StorageError::Io {
                operation: "preferences.write",
                source,
            })
        }
    }
}

/// Owner of the in-memory [`ClientSettings`] and sole writer of its storage key.
#[derive(Debug)]
pub struct LocalPreferenceStore<S> {
    storage: S,
    settings: ClientSettings,
    client_settings_loaded: bool,
}

impl<S: PreferenceStorage> LocalPreferenceStore<S> {
    /// Create a store over `storage` and load it immediately.
    #[must_use]
    pub fn new(storage: S) -> Self {
        let mut store = Self {
            storage,
            settings: ClientSettings::default(),
            client_settings_loaded: false,
        };
        store.load();
        store
    }

    /// Reload settings from storage, falling back to defaults.
    ///
    /// Always marks the store loaded, even when defaults were substituted.
    pub fn load(&mut self) {
        self.settings = match self.storage.read(CLIENT_SETTINGS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "stored client settings are corrupt; using defaults");
                ClientSettings::default()
            }),
            Ok(None) => ClientSettings::default(),
            Err(err) => {
                tracing::warn!(error = %err, "client settings unavailable; using defaults");
                ClientSettings::default()
            }
        };
        self.client_settings_loaded = true;
    }

    /// Persist the in-memory settings.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when encoding or the backend write fails.
    pub fn save(&self) -> StorageResult<()> {
        let raw = serde_json::to_string(&self.settings)
            .map_err(|source| StorageError::Encode { source })?;
        self.storage.write(CLIENT_SETTINGS_KEY, &raw)?;
        tracing::debug!("client settings saved");
        Ok(())
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Mutate settings in memory; call [`Self::save`] to persist.
    pub fn update(&mut self, edit: impl FnOnce(&mut ClientSettings)) {
        edit(&mut self.settings);
    }

    /// Restore defaults in memory.
    pub fn reset(&mut self) {
        self.settings = ClientSettings::default();
    }

    /// Whether a load has been attempted.
    #[must_use]
    pub const fn client_settings_loaded(&self) -> bool {
        self.client_settings_loaded
    }

    /// Underlying storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
