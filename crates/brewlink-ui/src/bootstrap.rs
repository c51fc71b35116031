//! Controller root URL selection at app boot.

/// Root URL used by development builds.
pub const DEV_ROOT_URL: &str = "http://brewengine/";

/// Build flavour deciding where the controller lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// The client is served by the controller itself.
    Production,
    /// The client is served separately and talks to a fixed controller.
    Development,
}

impl BuildMode {
    /// Mode of the running build, keyed on debug assertions.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Root URL for a client served from `origin`.
#[must_use]
pub fn resolve_root_url(origin: &str, mode: BuildMode) -> String {
    match mode {
        BuildMode::Production => format!("{}/", origin.trim_end_matches('/')),
        BuildMode::Development => DEV_ROOT_URL.to_string(),
    }
}
