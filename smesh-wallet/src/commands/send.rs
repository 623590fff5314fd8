//! Transfers and global-state listings

use std::io::{BufRead, Write};
use tracing::info;

use super::{Dispatcher, COIN_UNIT};
use crate::error::{Result, WalletError};
use crate::keys::Address;
use crate::rpc::{Activation, MeshTransaction, NodeApi};

/// Page size for account transaction and activation listings
const LISTING_LIMIT: u32 = 100;

impl<C: NodeApi, R: BufRead, W: Write> Dispatcher<C, R, W> {
    /// Interactive coin transfer from the current account.
    ///
    /// The nonce is read once, before the user confirms.
    pub(super) async fn send_coin(&mut self) -> Result<()> {
        self.say("Transfer coins from local account to another account.")?;
        let account = self.require_current_account()?;
        let source = account.address();

        let state = self.backend.account_state(&source).await?;

        let destination: Address = self
            .prompt_not_blank("Enter or paste destination address:")?
            .parse()?;

        let amount_input =
            self.prompt_not_blank(&format!("Enter amount to transfer in {}:", COIN_UNIT))?;
        let amount: u64 = amount_input
            .parse()
            .map_err(|_| WalletError::input(format!("`{}` is not a valid amount", amount_input)))?;

        let default_fee = self.backend.default_gas_price();
        let use_default = self.prompt_yes_no(&format!(
            "Use default transaction fee of {} {}?",
            default_fee, COIN_UNIT
        ))?;
        let gas_price = if use_default {
            default_fee
        } else {
            self.prompt_u64(&format!("Enter transaction fee ({}):", COIN_UNIT))?
        };

        self.say("Transaction summary:")?;
        self.say(&format!("From:   {}", source))?;
        self.say(&format!("To:     {}", destination))?;
        self.say(&format!("Amount: {} {}", amount, COIN_UNIT))?;
        self.say(&format!("Fee:    {} {}", gas_price, COIN_UNIT))?;
        self.say(&format!("Nonce:  {}", state.nonce))?;

        if !self.prompt_yes_no("Confirm transaction")? {
            return self.say("Transaction canceled.");
        }

        let tx_state = self
            .backend
            .transfer(destination, state.nonce, amount, gas_price)
            .await?;

        info!(
            "Submitted transfer of {} to {}: {}",
            amount, destination, tx_state.state
        );
        self.say("Transaction submitted.")?;
        self.say(&format!("Transaction id: 0x{}", hex::encode(&tx_state.id)))?;
        self.say(&format!("Transaction state: {}", tx_state.state))
    }

    pub(super) async fn mesh_transactions(&mut self) -> Result<()> {
        self.require_current_account()?;
        let (txs, total) = self.backend.transactions(0, LISTING_LIMIT).await?;

        self.say(&format!("Total mesh transactions: {}", total))?;
        for tx in &txs {
            self.print_transaction(tx)?;
        }
        Ok(())
    }

    fn print_transaction(&mut self, tx: &MeshTransaction) -> Result<()> {
        let layer = tx
            .layer
            .map(|l| l.to_string())
            .unwrap_or_else(|| "pending".to_string());

        self.say(&format!("Id: 0x{}", hex::encode(&tx.id)))?;
        self.say(&format!("From: {}", tx.sender))?;
        self.say(&format!("To: {}", tx.receiver))?;
        self.say(&format!("Amount: {} {}", tx.amount, COIN_UNIT))?;
        self.say(&format!("Fee: {} {}", tx.gas_price, COIN_UNIT))?;
        self.say(&format!("Nonce: {}", tx.counter))?;
        self.say(&format!("Layer: {}", layer))?;
        self.say("-----")
    }

    pub(super) async fn activations(&mut self) -> Result<()> {
        self.require_current_account()?;
        let (activations, total) = self.backend.activations(0, LISTING_LIMIT).await?;

        self.say(&format!("Total activations: {}", total))?;
        for activation in &activations {
            self.print_activation(activation)?;
        }
        Ok(())
    }

    fn print_activation(&mut self, activation: &Activation) -> Result<()> {
        self.say(&format!("Id: 0x{}", hex::encode(&activation.id)))?;
        self.say(&format!("Layer: {}", activation.layer))?;
        self.say(&format!("Smesher id: 0x{}", hex::encode(&activation.smesher_id)))?;
        self.say(&format!("Coinbase: {}", activation.coinbase))?;
        self.say(&format!("Space units: {}", activation.num_units))?;
        self.say("-----")
    }

    pub(super) async fn debug_all_accounts(&mut self) -> Result<()> {
        let accounts = self.backend.debug_all_accounts().await?;

        for account in &accounts {
            self.say(&format!("Address: {}", account.address))?;
            self.say(&format!("Balance: {} {}", account.balance, COIN_UNIT))?;
            self.say(&format!("Nonce: {}", account.nonce))?;
            self.say("-----")?;
        }
        Ok(())
    }
}
