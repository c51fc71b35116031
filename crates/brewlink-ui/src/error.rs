//! Error types for transport, store and preference operations.

use std::io;

use brewlink_api_models::{ApiResult, Command};
use thiserror::Error;

/// Failure to complete a request/response exchange with the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a response (connection, DNS, CORS, timeout).
    #[error("controller request failed: {detail}")]
    Network {
        /// Command being sent.
        command: Command,
        /// Underlying client error text.
        detail: String,
    },
    /// The response body was not a valid result envelope.
    #[error("controller response could not be decoded: {detail}")]
    Decode {
        /// Command being sent.
        command: Command,
        /// Underlying decoder error text.
        detail: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {detail}")]
    Client {
        /// Underlying client error text.
        detail: String,
    },
}

impl TransportError {
    /// Command whose exchange failed, if a request was attempted.
    #[must_use]
    pub const fn command(&self) -> Option<Command> {
        match self {
            Self::Network { command, .. } | Self::Decode { command, .. } => Some(*command),
            Self::Client { .. } => None,
        }
    }

    /// Raw error detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Network { detail, .. } | Self::Decode { detail, .. } | Self::Client { detail } => {
                detail
            }
        }
    }

    /// Synthetic `{success: false, data: null, message}` envelope for callers
    /// that handle every failure through the result shape.
    #[must_use]
    pub fn envelope(&self) -> ApiResult {
        ApiResult::failure(self.to_string())
    }
}

/// Convenience alias for transport results.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failure of a remote store operation. The cache is never modified when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A fetch was attempted before the controller root URL was configured.
    #[error("controller root URL is not set")]
    RootUrlUnset,
    /// The root URL is set once per store.
    #[error("controller root URL is already set to {current}")]
    RootUrlAlreadySet {
        /// Root URL already in use.
        current: String,
    },
    /// Network or decode failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The controller answered with `success: false`.
    #[error("controller rejected {command}: {message}")]
    Rejected {
        /// Rejected command.
        command: Command,
        /// Controller message, or a placeholder when none was sent.
        message: String,
    },
    /// The reply payload did not match the command's schema.
    #[error("malformed {command} payload: {detail}")]
    MalformedPayload {
        /// Command whose payload failed validation.
        command: Command,
        /// Decoder error text.
        detail: String,
    },
}

/// Convenience alias for remote store results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a preference storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached (browser storage disabled, quota exceeded).
    #[error("preference storage unavailable: {detail}")]
    Unavailable {
        /// Backend error text.
        detail: String,
    },
    /// A filesystem operation failed.
    #[error("preference storage {operation} failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
    /// Preferences could not be serialised.
    #[error("failed to encode preferences")]
    Encode {
        /// Source serialisation error.
        source: serde_json::Error,
    },
}

/// Convenience alias for preference storage results.
pub type StorageResult<T> = Result<T, StorageError>;
