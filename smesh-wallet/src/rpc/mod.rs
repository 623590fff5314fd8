//! Node RPC Client
//!
//! [`NodeApi`] is the request/response surface the wallet needs from a
//! node. [`RpcClient`] implements it as JSON-RPC 2.0 over HTTP, or HTTPS in
//! secure mode. Every call is a single attempt: no retries, no failover.

mod types;

pub use types::{
    AccountState, Activation, DebugAccount, MeshTransaction, NodeInfo, NodeStatus, Page, Reward,
    Status, TransactionState, TxState,
};

use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{debug, warn};

use crate::config::NodeConfig;
use crate::error::{Result, WalletError};
use crate::keys::Address;
use types::{CoinbaseResult, EchoMessage, SmesherIdResult, SmeshingResult};

/// Message echoed back by the node during the startup handshake
const SANITY_MESSAGE: &str = "sanity check";

/// JSON-RPC request ID counter
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Calls the wallet issues against a node.
///
/// Paged listings are plain offset/limit pass-throughs and return the page
/// together with the total number of items the node holds.
#[allow(async_fn_in_trait)]
pub trait NodeApi {
    /// Endpoint this client talks to
    fn server_url(&self) -> &str;

    /// One-time echo handshake
    async fn sanity(&self) -> Result<()>;

    async fn account_info(&self, address: &Address) -> Result<AccountState>;

    /// Submit canonical signed transaction bytes
    async fn submit_transaction(&self, signed_tx: &[u8]) -> Result<TransactionState>;

    async fn node_status(&self) -> Result<NodeStatus>;

    async fn node_info(&self) -> Result<NodeInfo>;

    async fn set_coinbase(&self, address: &Address) -> Result<Status>;

    async fn get_coinbase(&self) -> Result<Address>;

    async fn start_smeshing(
        &self,
        coinbase: &Address,
        data_dir: &str,
        commitment_size: u64,
    ) -> Result<Status>;

    async fn stop_smeshing(&self, delete_files: bool) -> Result<Status>;

    async fn is_smeshing(&self) -> Result<bool>;

    async fn get_smesher_id(&self) -> Result<Vec<u8>>;

    async fn smesher_rewards(
        &self,
        smesher_id: &[u8],
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Reward>, u32)>;

    async fn mesh_transactions(
        &self,
        address: &Address,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<MeshTransaction>, u32)>;

    async fn mesh_activations(
        &self,
        address: &Address,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Activation>, u32)>;

    /// Every account in the node's global state
    async fn debug_all_accounts(&self) -> Result<Vec<DebugAccount>>;
}

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

/// JSON-RPC 2.0 response.
///
/// `jsonrpc` and `id` are not read: error responses to unparseable
/// requests carry `"id": null`.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Decode a JSON-RPC response body into its result.
fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let response: JsonRpcResponse<T> =
        serde_json::from_slice(body).map_err(|e| WalletError::Protocol(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(WalletError::Remote {
            code: error.code,
            message: error.message,
        });
    }

    response
        .result
        .ok_or_else(|| WalletError::Protocol("missing result in RPC response".to_string()))
}

/// JSON-RPC client bound to a single node endpoint.
#[derive(Debug)]
pub struct RpcClient {
    url: String,
    secure: bool,
    timeout: Duration,
    client: Option<reqwest::Client>,
}

impl RpcClient {
    /// Create an unconnected client for `endpoint` (`host:port`)
    pub fn new(endpoint: &str, secure: bool, timeout: Duration) -> Self {
        let scheme = if secure { "https" } else { "http" };
        Self {
            url: format!("{}://{}/", scheme, endpoint),
            secure,
            timeout,
            client: None,
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(
            &config.endpoint(),
            config.secure,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Prepare the transport. Must succeed before any [`NodeApi`] call.
    pub fn connect(&mut self) -> Result<()> {
        Url::parse(&self.url)
            .map_err(|e| WalletError::Connection(format!("invalid endpoint {}: {}", self.url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .https_only(self.secure)
            .build()
            .map_err(|e| WalletError::Connection(e.to_string()))?;

        debug!("Using node endpoint {}", self.url);
        self.client = Some(client);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let client = self.client.as_ref().ok_or(WalletError::NotConnected)?;

        let id = REQUEST_ID.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC {} (id {})", method, id);

        let response = client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("RPC {} to {} failed: {}", method, self.url, e);
                WalletError::Connection(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WalletError::Remote {
                code: i32::from(status.as_u16()),
                message: status.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| WalletError::Connection(e.to_string()))?;

        decode_response(&body)
    }

    async fn page<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<(Vec<T>, u32)> {
        let page: Page<T> = self.call(method, params).await?;
        Ok(page.into_parts())
    }
}

impl NodeApi for RpcClient {
    fn server_url(&self) -> &str {
        &self.url
    }

    async fn sanity(&self) -> Result<()> {
        let echo: EchoMessage = self
            .call("node_echo", json!({ "msg": SANITY_MESSAGE }))
            .await?;

        if echo.msg != SANITY_MESSAGE {
            return Err(WalletError::Protocol(format!(
                "node echoed `{}` instead of `{}`",
                echo.msg, SANITY_MESSAGE
            )));
        }
        Ok(())
    }

    async fn account_info(&self, address: &Address) -> Result<AccountState> {
        self.call("globalstate_account", json!({ "address": address }))
            .await
    }

    async fn submit_transaction(&self, signed_tx: &[u8]) -> Result<TransactionState> {
        self.call(
            "tx_submit",
            json!({ "transaction": hex::encode(signed_tx) }),
        )
        .await
    }

    async fn node_status(&self) -> Result<NodeStatus> {
        self.call("node_status", json!({})).await
    }

    async fn node_info(&self) -> Result<NodeInfo> {
        self.call("node_info", json!({})).await
    }

    async fn set_coinbase(&self, address: &Address) -> Result<Status> {
        self.call("smesher_setCoinbase", json!({ "address": address }))
            .await
    }

    async fn get_coinbase(&self) -> Result<Address> {
        let result: CoinbaseResult = self.call("smesher_coinbase", json!({})).await?;
        Ok(result.address)
    }

    async fn start_smeshing(
        &self,
        coinbase: &Address,
        data_dir: &str,
        commitment_size: u64,
    ) -> Result<Status> {
        self.call(
            "smesher_startSmeshing",
            json!({
                "coinbase": coinbase,
                "data_dir": data_dir,
                "commitment_size": commitment_size
            }),
        )
        .await
    }

    async fn stop_smeshing(&self, delete_files: bool) -> Result<Status> {
        self.call(
            "smesher_stopSmeshing",
            json!({ "delete_files": delete_files }),
        )
        .await
    }

    async fn is_smeshing(&self) -> Result<bool> {
        let result: SmeshingResult = self.call("smesher_isSmeshing", json!({})).await?;
        Ok(result.is_smeshing)
    }

    async fn get_smesher_id(&self) -> Result<Vec<u8>> {
        let result: SmesherIdResult = self.call("smesher_smesherId", json!({})).await?;
        Ok(result.id)
    }

    async fn smesher_rewards(
        &self,
        smesher_id: &[u8],
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Reward>, u32)> {
        self.page(
            "globalstate_smesherRewards",
            json!({
                "smesher_id": hex::encode(smesher_id),
                "offset": offset,
                "limit": limit
            }),
        )
        .await
    }

    async fn mesh_transactions(
        &self,
        address: &Address,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<MeshTransaction>, u32)> {
        self.page(
            "mesh_accountTransactions",
            json!({ "address": address, "offset": offset, "limit": limit }),
        )
        .await
    }

    async fn mesh_activations(
        &self,
        address: &Address,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Activation>, u32)> {
        self.page(
            "mesh_accountActivations",
            json!({ "address": address, "offset": offset, "limit": limit }),
        )
        .await
    }

    async fn debug_all_accounts(&self) -> Result<Vec<DebugAccount>> {
        self.call("debug_accounts", json!({})).await
    }
}
