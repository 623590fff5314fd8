//! Account commands: create, select, info and message signing

use std::io::{BufRead, Write};
use tracing::error;
use zeroize::Zeroizing;

use super::{decode_hex, Dispatcher, COIN_UNIT};
use crate::accounts::Account;
use crate::error::{Result, WalletError};
use crate::rpc::{AccountState, NodeApi};

impl<C: NodeApi, R: BufRead, W: Write> Dispatcher<C, R, W> {
    /// Current account, running the selection flow first if none is set
    pub(super) fn require_current_account(&mut self) -> Result<Account> {
        match self.backend.current_account() {
            Ok(account) => return Ok(account.clone()),
            Err(WalletError::NoCurrentAccount) => {}
            Err(e) => return Err(e),
        }

        self.choose_account()?;
        self.backend.current_account().cloned()
    }

    /// Pick an existing account as current, or create one if there are none
    pub(super) fn choose_account(&mut self) -> Result<()> {
        let names = self.backend.list_accounts();
        if names.is_empty() {
            return self.create_account().map(|_| ());
        }

        self.say("Choose an account to load:")?;
        for (i, name) in names.iter().enumerate() {
            self.say(&format!("{}) {}", i + 1, name))?;
        }

        let index = loop {
            let answer = self.prompt_not_blank("Enter account number:")?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=names.len()).contains(&n) => break n - 1,
                _ => self.say(&format!("Choose a number between 1 and {}", names.len()))?,
            }
        };

        self.backend.set_current(index)?;
        let account = self.backend.current_account()?;
        let line = format!(
            "Loaded account alias: `{}`, address: {}",
            account.display_name(),
            account.address()
        );
        self.say(&line)
    }

    /// Create, persist and select a new account
    pub(super) fn create_account(&mut self) -> Result<Account> {
        self.say("Create a new account")?;
        let alias = self.prompt_not_blank("Account alias (name):")?;

        let account = self.backend.create_account(&alias)?;
        self.say(&format!(
            "Created account alias: `{}`, address: {}",
            account.display_name(),
            account.address()
        ))?;
        Ok(account)
    }

    pub(super) async fn account_info(&mut self) -> Result<()> {
        let account = self.require_current_account()?;
        let address = account.address();

        let state = match self.backend.account_state(&address).await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to get account info for {}: {}", address, e);
                AccountState::default()
            }
        };

        let public_key = hex::encode(account.public_key().as_bytes());
        let private_key = Zeroizing::new(hex::encode(account.signing_key().to_keypair_bytes()));

        self.say(&format!("Local alias: {}", account.display_name()))?;
        self.say(&format!("Address: {}", address))?;
        self.say(&format!("Balance: {} {}", state.balance, COIN_UNIT))?;
        self.say(&format!("Nonce: {}", state.nonce))?;
        self.say(&format!("Public key: 0x{}", public_key))?;
        self.say(&format!("Private key: 0x{}", private_key.as_str()))
    }

    pub(super) fn sign_hex(&mut self) -> Result<()> {
        self.require_current_account()?;
        let input = self.prompt_not_blank("Enter message to sign (in hex):")?;
        let message = decode_hex(&input)?;

        let signature = self.backend.sign(&message)?;
        self.say(&format!("signature (in hex): {}", hex::encode(signature)))
    }

    pub(super) fn sign_text(&mut self) -> Result<()> {
        self.require_current_account()?;
        let message = self.prompt_not_blank("Enter text message to sign:")?;

        let signature = self.backend.sign(message.as_bytes())?;
        self.say(&format!("signature (in hex): {}", hex::encode(signature)))
    }
}
