//! Wallet error types

use std::io;
use thiserror::Error;

/// Result alias used throughout the wallet library.
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors surfaced by the wallet core.
///
/// Every variant is recoverable at the command level: the dispatcher reports
/// it and returns to the prompt. Only the startup handshake treats
/// [`WalletError::Connection`] as fatal.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The RPC transport is unreachable or misconfigured.
    #[error("connection error: {0}")]
    Connection(String),

    /// An RPC call was issued before `connect` succeeded.
    #[error("not connected to a node")]
    NotConnected,

    /// The wallet password did not decrypt the wallet file.
    #[error("failed to unlock wallet - wrong password?")]
    Auth,

    /// Key material was requested from a wallet that is still locked.
    #[error("wallet is locked")]
    WalletLocked,

    /// Unknown account name or index.
    #[error("account not found: {0}")]
    NotFound(String),

    /// No current account has been selected yet.
    #[error("no current account selected")]
    NoCurrentAccount,

    /// An account with this display name already exists.
    #[error("an account named `{0}` already exists")]
    DuplicateAlias(String),

    /// Canonical transaction encoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// The node answered with a non-zero status.
    #[error("node returned status {code}: {message}")]
    Remote { code: i32, message: String },

    /// The node answered with something that is not a valid response.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// A user-entered value could not be parsed.
    #[error("invalid input: {0}")]
    Input(String),

    /// The wallet file is malformed or could not be encrypted/decrypted.
    #[error("wallet storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WalletError {
    /// Shorthand for [`WalletError::Input`].
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }
}
