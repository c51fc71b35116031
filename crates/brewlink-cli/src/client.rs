//! Shared client utilities and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use std::time::Duration;

use anyhow::anyhow;
use brewlink_ui::{RemoteStateStore, StoreError, WebConn};
use reqwest::Client;
use url::Url;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::failure(err)
    }
}

/// Parse the controller root URL, ensuring it ends with a slash.
pub(crate) fn parse_root_url(input: &str) -> Result<String, String> {
    let url = input
        .trim()
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported URL scheme '{}'", url.scheme()));
    }
    let mut root = url.to_string();
    if !root.ends_with('/') {
        root.push('/');
    }
    Ok(root)
}

/// Build the HTTP client used for controller requests.
pub(crate) fn build_http_client(timeout_secs: u64) -> CliResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Remote store bound to the controller at `root_url`.
pub(crate) fn connect(root_url: &str, timeout_secs: u64) -> CliResult<RemoteStateStore> {
    let client = build_http_client(timeout_secs)?;
    let conn = WebConn::with_client(root_url, client);
    tracing::debug!(endpoint = %conn.endpoint(), "controller connection configured");
    Ok(RemoteStateStore::with_transport(Rc::new(conn)))
}
