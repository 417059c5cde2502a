//! Error types used by the polling runtime and its collaborators.
//!
//! This module defines four enums:
//!
//! - [`FetchError`]: a single remote fetch for one target failed.
//! - [`StoreError`]: the persistent config store could not be read or written.
//! - [`SettingsError`]: the settings collaborator could not be queried.
//! - [`ContextError`]: a handle talked to a context that already stopped.
//!
//! None of them is fatal to a context: failures are contained to
//! "this target, this tick" and heal on the next pass. All types provide
//! `as_label` / `as_message` helpers for logs.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while fetching a target from the remote service.
///
/// Every variant is transient: the scheduler logs it, still advances the
/// target's next poll time, and leaves the target's state untouched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The soft receive-timeout expired before the remote answered.
    #[error("fetch timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The remote answered with a non-success HTTP status.
    #[error("remote returned status {code}")]
    Status {
        /// HTTP status code.
        code: u16,
    },

    /// Network level failure (connect, reset, TLS, ...).
    #[error("transport failed: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The body could not be decoded at all.
    #[error("malformed response: {error}")]
    Decode {
        /// The underlying error message.
        error: String,
    },
}

impl FetchError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use seekvisor::FetchError;
    ///
    /// let err = FetchError::Status { code: 429 };
    /// assert_eq!(err.as_label(), "fetch_status");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "fetch_timeout",
            FetchError::Status { .. } => "fetch_status",
            FetchError::Transport { .. } => "fetch_transport",
            FetchError::Decode { .. } => "fetch_decode",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FetchError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            FetchError::Status { code } => format!("status: {code}"),
            FetchError::Transport { error } => format!("transport: {error}"),
            FetchError::Decode { error } => format!("decode: {error}"),
        }
    }

    /// Indicates whether the failure should simply be retried on the next schedule.
    ///
    /// Always `true` today; kept as a method so callers don't match on variants.
    pub fn is_transient(&self) -> bool {
        true
    }
}

/// # Errors produced by the persistent config store.
///
/// A failed write is retried after the next scheduling pass and never blocks
/// the in-memory scheduler.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("store i/o failed: {error}")]
    Io {
        /// The underlying error message.
        error: String,
    },

    /// The stored record exists but could not be decoded or encoded.
    #[error("store record malformed: {error}")]
    Decode {
        /// The underlying error message.
        error: String,
    },

    /// The store refused the operation (e.g. temporarily read-only).
    #[error("store unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use seekvisor::StoreError;
    ///
    /// let err = StoreError::Io { error: "disk full".into() };
    /// assert_eq!(err.as_label(), "store_io");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "store_io",
            StoreError::Decode { .. } => "store_decode",
            StoreError::Unavailable { .. } => "store_unavailable",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StoreError::Io { error } => format!("io: {error}"),
            StoreError::Decode { error } => format!("decode: {error}"),
            StoreError::Unavailable { error } => format!("unavailable: {error}"),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            error: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode {
            error: err.to_string(),
        }
    }
}

/// # Errors produced by the settings collaborator.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The settings source did not answer.
    #[error("settings unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },
}

impl SettingsError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SettingsError::Unavailable { .. } => "settings_unavailable",
        }
    }
}

/// # Errors returned by a `ContextHandle`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context's run loop has exited.
    #[error("context stopped")]
    Stopped,
}

impl ContextError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ContextError::Stopped => "context_stopped",
        }
    }
}
