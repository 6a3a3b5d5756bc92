//! Error type for setup-time operations.
//!
//! Intercepted file operations never return this type: they report native
//! [`NtStatus`](crate::NtStatus) codes exactly as the real primitives do.

use thiserror::Error;

/// Errors from configuring and activating a [`FileAccessServer`](crate::FileAccessServer).
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Installing the OS intercepts failed.
    #[error("failed to install hooks: {message}")]
    HookInstall {
        /// Message from the installer.
        message: String,
    },

    /// The server already has a live hook session.
    #[error("file access server is already active")]
    AlreadyActive,
}

impl Error {
    /// Create a hook installation error.
    pub fn hook_install(message: impl Into<String>) -> Self {
        Self::HookInstall {
            message: message.into(),
        }
    }
}

/// Result alias for setup-time operations.
pub type Result<T> = std::result::Result<T, Error>;
