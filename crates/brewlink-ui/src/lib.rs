#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]
//! Brewlink client core.
//!
//! Mirrors a brewing controller's configuration and schedules into a
//! process-wide cache, derives display values from it and keeps a separate
//! layer of local-only preferences. Everything here is DOM-free except the
//! `services` module, which binds the core to the browser on wasm32.

pub mod bootstrap;
pub mod error;
pub mod grouping;
pub mod imported;
pub mod locale;
pub mod preferences;
pub mod store;
pub mod transport;

#[cfg(target_arch = "wasm32")]
pub mod services;

pub use error::{StorageError, StorageResult, StoreError, StoreResult, TransportError, TransportResult};
pub use grouping::{Groups, group_by};
pub use imported::{ImportError, ImportedBeer, NotificationGroup, Phase, group_notifications};
pub use locale::{LocaleOptions, detect_locale};
pub use preferences::{
    CLIENT_SETTINGS_KEY, ClientSettings, LocalPreferenceStore, MemoryStorage, PreferenceStorage,
};
pub use store::{LoadState, MAX_SCHEDULES, RemoteState, RemoteStateStore};
pub use transport::{Transport, WebConn};

#[cfg(not(target_arch = "wasm32"))]
pub use preferences::FileStorage;
