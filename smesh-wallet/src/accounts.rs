//! Account Management
//!
//! [`AccountManager`] owns the unlocked [`KeyStore`], an in-memory copy of
//! its accounts and the session's current account selection.

use ed25519_dalek::{SigningKey, VerifyingKey};
use std::fmt;
use tracing::{debug, info};

use crate::error::{Result, WalletError};
use crate::keys::Address;
use crate::storage::KeyStore;

/// A named key pair under wallet control
#[derive(Clone)]
pub struct Account {
    display_name: String,
    position: usize,
    signing_key: SigningKey,
}

impl Account {
    fn new(display_name: &str, position: usize, signing_key: SigningKey) -> Self {
        Self {
            display_name: display_name.to_string(),
            position,
            signing_key,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Creation-order position within the wallet
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("display_name", &self.display_name)
            .field("position", &self.position)
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// In-memory account set of the open wallet plus the current selection.
pub struct AccountManager {
    store: KeyStore,
    accounts: Vec<Account>,
    current: Option<usize>,
}

impl AccountManager {
    /// Build the account set from an unlocked store.
    ///
    /// No account is current until one is created or selected.
    pub fn open(store: KeyStore) -> Result<Self> {
        let count = store.account_count()?;
        let mut accounts = Vec::with_capacity(count);

        for position in 0..count {
            let display_name = store.account_display_name(position)?;
            let signing_key = store.private_key(position)?;
            accounts.push(Account::new(display_name, position, signing_key));
        }

        debug!(
            "Opened wallet `{}` with {} accounts",
            store.meta().display_name,
            accounts.len()
        );

        Ok(Self {
            store,
            accounts,
            current: None,
        })
    }

    /// Display name of the wallet
    pub fn wallet_name(&self) -> &str {
        &self.store.meta().display_name
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Derive a fresh key pair at the next position and append it.
    ///
    /// Fails with [`WalletError::DuplicateAlias`] without touching the
    /// wallet if the name is taken. The new account is not persisted until
    /// [`AccountManager::store_accounts`] and does not become current.
    pub fn create_account(&mut self, display_name: &str) -> Result<&Account> {
        if self.accounts.iter().any(|a| a.display_name == display_name) {
            return Err(WalletError::DuplicateAlias(display_name.to_string()));
        }

        let position = self.store.derive_new_pair(display_name)?;
        let signing_key = self.store.private_key(position)?;
        self.accounts
            .push(Account::new(display_name, position, signing_key));

        let account = &self.accounts[position];
        info!(
            "Created account `{}` at position {} ({})",
            display_name,
            position,
            account.address()
        );
        Ok(account)
    }

    /// Select the account at `index` as current
    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if index >= self.accounts.len() {
            return Err(WalletError::NotFound(format!("no account at index {}", index)));
        }
        self.current = Some(index);
        Ok(())
    }

    /// The currently selected account
    pub fn current_account(&self) -> Result<&Account> {
        self.current
            .map(|index| &self.accounts[index])
            .ok_or(WalletError::NoCurrentAccount)
    }

    /// Account display names in creation order
    pub fn list_accounts(&self) -> Vec<String> {
        self.accounts
            .iter()
            .map(|a| a.display_name.clone())
            .collect()
    }

    /// Find an account by exact display name
    pub fn account_by_name(&self, name: &str) -> Result<&Account> {
        self.accounts
            .iter()
            .find(|a| a.display_name == name)
            .ok_or_else(|| WalletError::NotFound(name.to_string()))
    }

    /// Persist the full wallet state
    pub fn store_accounts(&mut self) -> Result<()> {
        self.store.save()
    }
}
