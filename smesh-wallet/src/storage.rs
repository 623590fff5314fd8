//! Encrypted Wallet Storage
//!
//! The wallet file keeps its display name in clear text and everything
//! secret (the mnemonic and the account list) encrypted with:
//! - Argon2id for password-based key derivation
//! - ChaCha20-Poly1305 for authenticated encryption
//!
//! Account private keys are never written to disk. They are re-derived from
//! the mnemonic when the store is unlocked.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use ed25519_dalek::SigningKey;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};
use crate::keys::WalletKeys;

/// Current wallet file format version
const WALLET_VERSION: u32 = 1;

/// Argon2 parameters (tuned for security vs. usability)
const ARGON2_MEMORY_KB: u32 = 65536; // 64 MB
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

/// Clear-text wallet metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMeta {
    pub display_name: String,
    /// RFC 3339 creation time
    pub created: String,
}

/// On-disk wallet file structure
#[derive(Serialize, Deserialize)]
struct WalletFile {
    /// File format version
    version: u32,

    meta: WalletMeta,

    /// Argon2 salt (base64 encoded)
    salt: String,

    /// ChaCha20-Poly1305 nonce (12 bytes, hex encoded)
    nonce: String,

    /// Encrypted [`WalletSecrets`] (hex encoded)
    ciphertext: String,
}

/// The encrypted part of the wallet file
#[derive(Serialize, Deserialize)]
struct WalletSecrets {
    mnemonic: Zeroizing<String>,
    accounts: Vec<StoredAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAccount {
    display_name: String,
    created: String,
    path_index: u32,
}

/// State held only while the store is unlocked
struct Unlocked {
    password: Zeroizing<String>,
    keys: WalletKeys,
    accounts: Vec<StoredAccount>,
}

/// Password-protected key store backed by a single wallet file.
pub struct KeyStore {
    path: PathBuf,
    file: WalletFile,
    unlocked: Option<Unlocked>,
}

impl KeyStore {
    /// Create a new wallet with a fresh mnemonic and write it to `path`.
    ///
    /// The returned store is already unlocked.
    pub fn create(path: &Path, display_name: &str, password: &str) -> Result<Self> {
        let keys = WalletKeys::generate();
        let meta = WalletMeta {
            display_name: display_name.to_string(),
            created: chrono::Utc::now().to_rfc3339(),
        };

        let unlocked = Unlocked {
            password: Zeroizing::new(password.to_string()),
            keys,
            accounts: Vec::new(),
        };
        let file = encrypt(meta, &unlocked)?;

        let store = Self {
            path: path.to_path_buf(),
            file,
            unlocked: Some(unlocked),
        };
        store.write()?;

        info!("Created wallet `{}` at {}", display_name, path.display());
        Ok(store)
    }

    /// Load a (locked) wallet from a file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            WalletError::Storage(format!("failed to read {}: {}", path.display(), e))
        })?;

        let file: WalletFile = serde_json::from_str(&json).map_err(|e| {
            WalletError::Storage(format!("failed to parse {}: {}", path.display(), e))
        })?;

        if file.version != WALLET_VERSION {
            return Err(WalletError::Storage(format!(
                "unsupported wallet version: {} (expected {})",
                file.version, WALLET_VERSION
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            unlocked: None,
        })
    }

    /// Check if a wallet file exists
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Decrypt the wallet with `password`.
    ///
    /// A failed authentication tag means the password is wrong and yields
    /// [`WalletError::Auth`]; the store stays locked.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        let key = derive_key(password, &self.file.salt)?;

        let nonce_bytes = hex::decode(&self.file.nonce)
            .map_err(|_| WalletError::Storage("invalid nonce format".into()))?;
        let ciphertext = hex::decode(&self.file.ciphertext)
            .map_err(|_| WalletError::Storage("invalid ciphertext format".into()))?;

        if nonce_bytes.len() != 12 {
            return Err(WalletError::Storage("invalid nonce length".into()));
        }

        let cipher = ChaCha20Poly1305::new_from_slice(key.as_slice())
            .map_err(|_| WalletError::Storage("failed to create cipher".into()))?;

        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
                .map_err(|_| WalletError::Auth)?,
        );

        let secrets: WalletSecrets = serde_json::from_slice(&plaintext)?;

        self.unlocked = Some(Unlocked {
            password: Zeroizing::new(password.to_string()),
            keys: WalletKeys::from_mnemonic(&secrets.mnemonic)?,
            accounts: secrets.accounts,
        });

        debug!("Unlocked wallet `{}`", self.file.meta.display_name);
        Ok(())
    }

    /// Whether [`KeyStore::unlock`] has succeeded
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.is_some()
    }

    /// Path of the backing wallet file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed keys of an unlocked wallet
    pub fn keys(&self) -> Result<&WalletKeys> {
        Ok(&self.secrets()?.keys)
    }

    /// Clear-text wallet metadata
    pub fn meta(&self) -> &WalletMeta {
        &self.file.meta
    }

    /// Number of accounts in the wallet
    pub fn account_count(&self) -> Result<usize> {
        Ok(self.secrets()?.accounts.len())
    }

    /// Display name of the account at `index`
    pub fn account_display_name(&self, index: usize) -> Result<&str> {
        self.stored_account(index)
            .map(|account| account.display_name.as_str())
    }

    /// Private key of the account at `index`
    pub fn private_key(&self, index: usize) -> Result<SigningKey> {
        let unlocked = self.secrets()?;
        let account = self.stored_account(index)?;
        Ok(unlocked.keys.derive_signing_key(account.path_index))
    }

    /// Append a new account derived at the next position and return that
    /// position. The change is in memory until [`KeyStore::save`].
    pub fn derive_new_pair(&mut self, display_name: &str) -> Result<usize> {
        let unlocked = self.unlocked.as_mut().ok_or(WalletError::WalletLocked)?;

        let position = unlocked.accounts.len();
        let path_index = u32::try_from(position)
            .map_err(|_| WalletError::Storage("account limit reached".into()))?;

        unlocked.accounts.push(StoredAccount {
            display_name: display_name.to_string(),
            created: chrono::Utc::now().to_rfc3339(),
            path_index,
        });

        Ok(position)
    }

    /// Re-encrypt the wallet with a fresh salt and nonce and write it to
    /// its file
    pub fn save(&mut self) -> Result<()> {
        let file = encrypt(self.file.meta.clone(), self.secrets()?)?;
        self.file = file;
        self.write()?;

        debug!("Saved wallet to {}", self.path.display());
        Ok(())
    }

    fn secrets(&self) -> Result<&Unlocked> {
        self.unlocked.as_ref().ok_or(WalletError::WalletLocked)
    }

    fn stored_account(&self, index: usize) -> Result<&StoredAccount> {
        self.secrets()?
            .accounts
            .get(index)
            .ok_or_else(|| WalletError::NotFound(format!("no account at index {}", index)))
    }

    fn write(&self) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.file)?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(json.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, json)?;
        }

        Ok(())
    }
}

fn encrypt(meta: WalletMeta, unlocked: &Unlocked) -> Result<WalletFile> {
    let secrets = WalletSecrets {
        mnemonic: Zeroizing::new(unlocked.keys.mnemonic_phrase().to_string()),
        accounts: unlocked.accounts.clone(),
    };
    let plaintext = Zeroizing::new(serde_json::to_vec(&secrets)?);

    // Generate random salt for Argon2
    let salt = SaltString::generate(&mut OsRng);
    let key = derive_key(&unlocked.password, salt.as_str())?;

    let mut nonce_bytes = [0u8; 12];
    rand::thread_rng().fill(&mut nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_slice())
        .map_err(|_| WalletError::Storage("failed to create cipher".into()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|_| WalletError::Storage("encryption failed".into()))?;

    Ok(WalletFile {
        version: WALLET_VERSION,
        meta,
        salt: salt.to_string(),
        nonce: hex::encode(nonce_bytes),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Derive a 32-byte encryption key from password using Argon2id
fn derive_key(password: &str, salt: &str) -> Result<Zeroizing<[u8; 32]>> {
    let salt =
        SaltString::from_b64(salt).map_err(|_| WalletError::Storage("invalid salt format".into()))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(
            ARGON2_MEMORY_KB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(32),
        )
        .map_err(|_| WalletError::Storage("invalid Argon2 parameters".into()))?,
    );

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| WalletError::Storage("key derivation failed".into()))?;

    let hash_output = hash
        .hash
        .ok_or_else(|| WalletError::Storage("no hash output".into()))?;

    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&hash_output.as_bytes()[..32]);

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_PASSWORD: &str = "test-password-123";

    #[test]
    fn test_create_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");

        let mut store = KeyStore::create(&wallet_path, "My Wallet", TEST_PASSWORD).unwrap();
        assert!(store.is_unlocked());
        assert_eq!(store.account_count().unwrap(), 0);

        let position = store.derive_new_pair("alice").unwrap();
        assert_eq!(position, 0);
        let key = store.private_key(0).unwrap();
        store.save().unwrap();

        let mut loaded = KeyStore::load(&wallet_path).unwrap();
        assert!(!loaded.is_unlocked());
        assert_eq!(loaded.meta().display_name, "My Wallet");

        loaded.unlock(TEST_PASSWORD).unwrap();
        assert_eq!(loaded.account_count().unwrap(), 1);
        assert_eq!(loaded.account_display_name(0).unwrap(), "alice");
        assert_eq!(loaded.private_key(0).unwrap().to_bytes(), key.to_bytes());
    }

    #[test]
    fn test_wrong_password() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");
        KeyStore::create(&wallet_path, "w", TEST_PASSWORD).unwrap();

        let mut loaded = KeyStore::load(&wallet_path).unwrap();
        assert!(matches!(
            loaded.unlock("wrong-password"),
            Err(WalletError::Auth)
        ));
        assert!(!loaded.is_unlocked());
    }

    #[test]
    fn test_locked_store_rejects_key_access() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");
        KeyStore::create(&wallet_path, "w", TEST_PASSWORD).unwrap();

        let mut loaded = KeyStore::load(&wallet_path).unwrap();
        assert!(matches!(
            loaded.account_count(),
            Err(WalletError::WalletLocked)
        ));
        assert!(matches!(
            loaded.derive_new_pair("bob"),
            Err(WalletError::WalletLocked)
        ));
    }

    #[test]
    fn test_unknown_index() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");
        let store = KeyStore::create(&wallet_path, "w", TEST_PASSWORD).unwrap();

        assert!(matches!(
            store.private_key(5),
            Err(WalletError::NotFound(_))
        ));
    }

    #[test]
    fn test_unsaved_accounts_are_not_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");
        let mut store = KeyStore::create(&wallet_path, "w", TEST_PASSWORD).unwrap();
        store.derive_new_pair("ephemeral").unwrap();

        let mut loaded = KeyStore::load(&wallet_path).unwrap();
        loaded.unlock(TEST_PASSWORD).unwrap();
        assert_eq!(loaded.account_count().unwrap(), 0);
    }

    #[test]
    fn test_file_keeps_no_plaintext_secrets() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");
        let mut store = KeyStore::create(&wallet_path, "visible-name", TEST_PASSWORD).unwrap();
        store.derive_new_pair("hidden-alias").unwrap();
        store.save().unwrap();

        let contents = fs::read_to_string(&wallet_path).unwrap();
        assert!(contents.contains("visible-name"));
        assert!(!contents.contains("hidden-alias"));
    }

    #[test]
    fn test_unsupported_version() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");
        KeyStore::create(&wallet_path, "w", TEST_PASSWORD).unwrap();

        let contents = fs::read_to_string(&wallet_path).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        value["version"] = serde_json::json!(99);
        fs::write(&wallet_path, value.to_string()).unwrap();

        assert!(matches!(
            KeyStore::load(&wallet_path),
            Err(WalletError::Storage(_))
        ));
    }

    #[test]
    fn test_exists() {
        let temp_dir = TempDir::new().unwrap();
        let wallet_path = temp_dir.path().join("wallet.json");

        assert!(!KeyStore::exists(&wallet_path));
        KeyStore::create(&wallet_path, "w", TEST_PASSWORD).unwrap();
        assert!(KeyStore::exists(&wallet_path));
    }
}
