// Request and response types for node RPC calls

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, WalletError};
use crate::keys::Address;

/// Balance and counter of an account in the global state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: u64,
    pub nonce: u64,
}

/// Lifecycle state of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    Unspecified,
    Rejected,
    InsufficientFunds,
    Conflicting,
    Mempool,
    Mesh,
    Processed,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxState::Unspecified => "unspecified",
            TxState::Rejected => "rejected",
            TxState::InsufficientFunds => "insufficient funds",
            TxState::Conflicting => "conflicting",
            TxState::Mempool => "mempool",
            TxState::Mesh => "mesh",
            TxState::Processed => "processed",
        };
        f.write_str(name)
    }
}

/// Node answer to a transaction submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    /// Transaction id (hex)
    #[serde(with = "hex::serde")]
    pub id: Vec<u8>,
    pub state: TxState,
}

/// Operation status returned by node mutations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Status {
    pub fn ok() -> Self {
        Self::default()
    }

    /// Turn a non-zero status code into [`WalletError::Remote`]
    pub fn check(self) -> Result<()> {
        if self.code == 0 {
            Ok(())
        } else {
            Err(WalletError::Remote {
                code: self.code,
                message: self.message,
            })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub is_synced: bool,
    pub synced_layer: u32,
    pub top_layer: u32,
    pub verified_layer: u32,
    pub connected_peers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub version: String,
    pub build: String,
}

/// A reward credited to a smesher for a layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub layer: u32,
    /// Layer reward plus fees
    pub total: u64,
    pub layer_reward: u64,
    pub coinbase: Address,
    #[serde(with = "hex::serde")]
    pub smesher: Vec<u8>,
}

/// A transaction as recorded in the mesh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTransaction {
    #[serde(with = "hex::serde")]
    pub id: Vec<u8>,
    pub sender: Address,
    pub receiver: Address,
    pub amount: u64,
    pub counter: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// Layer the transaction was included in, if any
    #[serde(default)]
    pub layer: Option<u32>,
}

/// An activation transaction published by a smesher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    #[serde(with = "hex::serde")]
    pub id: Vec<u8>,
    pub layer: u32,
    #[serde(with = "hex::serde")]
    pub smesher_id: Vec<u8>,
    pub coinbase: Address,
    pub num_units: u32,
}

/// Account entry of the debug global-state listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugAccount {
    pub address: Address,
    pub balance: u64,
    pub nonce: u64,
}

/// One page of an offset/limit listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items available on the node, across all pages
    pub total: u32,
}

impl<T> Page<T> {
    pub fn into_parts(self) -> (Vec<T>, u32) {
        (self.items, self.total)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EchoMessage {
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoinbaseResult {
    pub address: Address,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SmeshingResult {
    pub is_smeshing: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SmesherIdResult {
    #[serde(with = "hex::serde")]
    pub id: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_check() {
        assert!(Status::ok().check().is_ok());

        let err = Status {
            code: 9,
            message: "failed precondition".into(),
        }
        .check()
        .unwrap_err();
        assert!(matches!(err, WalletError::Remote { code: 9, .. }));
    }

    #[test]
    fn test_transaction_state_json() {
        let state: TransactionState =
            serde_json::from_value(json!({ "id": "0a0b", "state": "insufficient_funds" })).unwrap();

        assert_eq!(state.id, vec![0x0a, 0x0b]);
        assert_eq!(state.state, TxState::InsufficientFunds);
        assert_eq!(state.state.to_string(), "insufficient funds");
    }

    #[test]
    fn test_page_json() {
        let page: Page<DebugAccount> = serde_json::from_value(json!({
            "items": [{
                "address": format!("0x{}", "11".repeat(20)),
                "balance": 5,
                "nonce": 1
            }],
            "total": 7
        }))
        .unwrap();

        let (items, total) = page.into_parts();
        assert_eq!(total, 7);
        assert_eq!(items[0].address, Address::new([0x11; 20]));
        assert_eq!(items[0].balance, 5);
    }

    #[test]
    fn test_mesh_transaction_layer_is_optional() {
        let tx: MeshTransaction = serde_json::from_value(json!({
            "id": "ff",
            "sender": format!("0x{}", "01".repeat(20)),
            "receiver": format!("0x{}", "02".repeat(20)),
            "amount": 10,
            "counter": 0,
            "gas_price": 1,
            "gas_limit": 100
        }))
        .unwrap();
        assert_eq!(tx.layer, None);
    }
}
