//! Wallet Backend
//!
//! Composes the open wallet ([`AccountManager`]) with a node client. Every
//! node call is forwarded explicitly; calls that act on "my account" take
//! the current account from the manager.

use tracing::{debug, info};

use crate::accounts::{Account, AccountManager};
use crate::config::WalletConfig;
use crate::error::{Result, WalletError};
use crate::keys::{sign_message, Address, SIGNATURE_LENGTH};
use crate::rpc::{
    AccountState, Activation, DebugAccount, MeshTransaction, NodeApi, NodeInfo, NodeStatus, Reward,
    TransactionState,
};
use crate::transaction::build_and_submit;

/// Bytes per GiB of smeshing commitment
const GIB: u64 = 1 << 30;

/// Convert a commitment size entered in GiB to bytes
pub fn commitment_size(gib: u64) -> Result<u64> {
    gib.checked_mul(GIB)
        .ok_or_else(|| WalletError::input(format!("{} GiB is too large", gib)))
}

pub struct WalletBackend<C: NodeApi> {
    accounts: AccountManager,
    client: C,
    default_gas_price: u64,
    gas_limit: u64,
}

impl<C: NodeApi> WalletBackend<C> {
    pub fn new(accounts: AccountManager, client: C, settings: &WalletConfig) -> Self {
        Self {
            accounts,
            client,
            default_gas_price: settings.default_gas_price,
            gas_limit: settings.gas_limit,
        }
    }

    pub fn accounts(&self) -> &AccountManager {
        &self.accounts
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn default_gas_price(&self) -> u64 {
        self.default_gas_price
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Create an account, persist the wallet and make the account current.
    ///
    /// A duplicate name leaves both the wallet and the selection unchanged.
    pub fn create_account(&mut self, display_name: &str) -> Result<Account> {
        let position = self.accounts.create_account(display_name)?.position();
        self.accounts.store_accounts()?;
        self.accounts.set_current(position)?;
        info!("Account `{}` saved and selected", display_name);
        self.accounts.current_account().cloned()
    }

    pub fn set_current(&mut self, index: usize) -> Result<()> {
        self.accounts.set_current(index)
    }

    pub fn current_account(&self) -> Result<&Account> {
        self.accounts.current_account()
    }

    pub fn list_accounts(&self) -> Vec<String> {
        self.accounts.list_accounts()
    }

    /// Sign an arbitrary message with the current account key
    pub fn sign(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LENGTH]> {
        let account = self.accounts.current_account()?;
        Ok(sign_message(account.signing_key(), message))
    }

    // ------------------------------------------------------------------
    // Global state and transactions
    // ------------------------------------------------------------------

    pub async fn sanity(&self) -> Result<()> {
        self.client.sanity().await
    }

    pub fn server_url(&self) -> &str {
        self.client.server_url()
    }

    pub async fn account_state(&self, address: &Address) -> Result<AccountState> {
        self.client.account_info(address).await
    }

    /// Sign and submit a transfer from the current account.
    ///
    /// `nonce` is used as given; it is not re-read from the node.
    pub async fn transfer(
        &self,
        recipient: Address,
        nonce: u64,
        amount: u64,
        gas_price: u64,
    ) -> Result<TransactionState> {
        let account = self.accounts.current_account()?;
        debug!("Transfer from `{}` ({})", account.display_name(), account.address());

        build_and_submit(
            &self.client,
            recipient,
            nonce,
            amount,
            gas_price,
            self.gas_limit,
            account.signing_key(),
        )
        .await
    }

    pub async fn transactions(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<MeshTransaction>, u32)> {
        let address = self.accounts.current_account()?.address();
        self.client.mesh_transactions(&address, offset, limit).await
    }

    pub async fn activations(&self, offset: u32, limit: u32) -> Result<(Vec<Activation>, u32)> {
        let address = self.accounts.current_account()?.address();
        self.client.mesh_activations(&address, offset, limit).await
    }

    pub async fn debug_all_accounts(&self) -> Result<Vec<DebugAccount>> {
        self.client.debug_all_accounts().await
    }

    // ------------------------------------------------------------------
    // Node
    // ------------------------------------------------------------------

    pub async fn node_status(&self) -> Result<NodeStatus> {
        self.client.node_status().await
    }

    pub async fn node_info(&self) -> Result<NodeInfo> {
        self.client.node_info().await
    }

    // ------------------------------------------------------------------
    // Smeshing
    // ------------------------------------------------------------------

    /// Use the current account as the node's rewards account
    pub async fn set_rewards_account(&self) -> Result<Address> {
        let address = self.accounts.current_account()?.address();
        self.client.set_coinbase(&address).await?.check()?;
        Ok(address)
    }

    pub async fn rewards_account(&self) -> Result<Address> {
        self.client.get_coinbase().await
    }

    /// Start smeshing into `data_dir` with the current account as coinbase
    pub async fn start_smeshing(&self, data_dir: &str, size_gib: u64) -> Result<()> {
        let coinbase = self.accounts.current_account()?.address();
        let size = commitment_size(size_gib)?;
        info!(
            "Starting smeshing: coinbase {}, data dir {}, {} bytes",
            coinbase, data_dir, size
        );
        self.client
            .start_smeshing(&coinbase, data_dir, size)
            .await?
            .check()
    }

    pub async fn stop_smeshing(&self, delete_files: bool) -> Result<()> {
        self.client.stop_smeshing(delete_files).await?.check()
    }

    pub async fn is_smeshing(&self) -> Result<bool> {
        self.client.is_smeshing().await
    }

    pub async fn smesher_id(&self) -> Result<Vec<u8>> {
        self.client.get_smesher_id().await
    }

    pub async fn smesher_rewards(
        &self,
        smesher_id: &[u8],
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Reward>, u32)> {
        self.client.smesher_rewards(smesher_id, offset, limit).await
    }
}
