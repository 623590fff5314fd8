//! Spacemesh Interactive Wallet
//!
//! A command-line wallet that keeps its keys in a local encrypted file,
//! signs transfers locally and talks to a single node over JSON-RPC.
//!
//! ## Layout
//!
//! - [`storage`]: encrypted wallet file ([`storage::KeyStore`])
//! - [`accounts`]: named accounts and the current selection
//! - [`transaction`]: canonical transfer encoding and signing
//! - [`rpc`]: the [`rpc::NodeApi`] surface and its JSON-RPC client
//! - [`backend`]: accounts composed with a node client
//! - [`commands`]: the interactive dispatcher

pub mod accounts;
pub mod backend;
pub mod commands;
pub mod config;
pub mod error;
pub mod keys;
pub mod rpc;
pub mod session;
pub mod storage;
pub mod terminal;
pub mod transaction;

pub use accounts::{Account, AccountManager};
pub use backend::WalletBackend;
pub use commands::{Dispatcher, DispatcherState};
pub use error::{Result, WalletError};
pub use keys::{Address, WalletKeys};
pub use rpc::{NodeApi, RpcClient};
pub use storage::KeyStore;
