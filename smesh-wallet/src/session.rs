//! Wallet open/create flows run once at session start.
//!
//! Password input is injected so the flows run unchanged against a
//! terminal or a scripted source.

use std::io;
use std::path::Path;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};
use crate::keys::WalletKeys;
use crate::storage::KeyStore;

/// Password attempts allowed when opening an existing wallet
pub const MAX_UNLOCK_ATTEMPTS: usize = 3;

const PASSWORD_PROMPT: &str = "Enter wallet password: ";
const RETRY_PROMPT: &str = "Wrong password, try again: ";

/// Load the wallet at `path` and unlock it.
///
/// A wrong password is retried up to [`MAX_UNLOCK_ATTEMPTS`] times in
/// total, with the retry noted in the next prompt; any other failure ends
/// the flow at once.
pub fn open_wallet<F>(path: &Path, mut read_password: F) -> Result<KeyStore>
where
    F: FnMut(&str) -> io::Result<Zeroizing<String>>,
{
    let mut store = KeyStore::load(path)?;

    for attempt in 1..=MAX_UNLOCK_ATTEMPTS {
        let prompt = if attempt == 1 {
            PASSWORD_PROMPT
        } else {
            RETRY_PROMPT
        };
        let password = read_password(prompt)?;
        match store.unlock(&password) {
            Ok(()) => {
                info!(
                    "Opened wallet `{}` from {}",
                    store.meta().display_name,
                    path.display()
                );
                return Ok(store);
            }
            Err(WalletError::Auth) => {
                warn!(
                    "Wrong password for {} (attempt {} of {})",
                    path.display(),
                    attempt,
                    MAX_UNLOCK_ATTEMPTS
                );
            }
            Err(e) => return Err(e),
        }
    }

    Err(WalletError::Auth)
}

/// Create a new wallet file at `path`, asking for the password twice.
pub fn create_wallet<F>(path: &Path, display_name: &str, mut read_password: F) -> Result<KeyStore>
where
    F: FnMut(&str) -> io::Result<Zeroizing<String>>,
{
    if display_name.trim().is_empty() {
        return Err(WalletError::input("wallet name must not be empty"));
    }

    let password = read_password("Choose a wallet password: ")?;
    if password.is_empty() {
        return Err(WalletError::input("password must not be empty"));
    }

    let confirm = read_password("Confirm password: ")?;
    if *password != *confirm {
        return Err(WalletError::input("passwords do not match"));
    }

    KeyStore::create(path, display_name.trim(), &password)
}

/// Recovery phrase laid out as numbered words, four per row
pub fn recovery_phrase_rows(keys: &WalletKeys) -> Vec<String> {
    keys.mnemonic_words()
        .chunks(4)
        .enumerate()
        .map(|(row, words)| {
            words
                .iter()
                .enumerate()
                .map(|(i, word)| format!("{:>2}. {:<12}", row * 4 + i + 1, word))
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Password source answering from a fixed list
    fn scripted(answers: &[&str]) -> impl FnMut(&str) -> io::Result<Zeroizing<String>> {
        let mut answers: VecDeque<String> = answers.iter().map(|s| s.to_string()).collect();
        move |_prompt: &str| {
            answers
                .pop_front()
                .map(Zeroizing::new)
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"))
        }
    }

    #[test]
    fn test_create_then_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("wallet.json");

        let store = create_wallet(&path, "main", scripted(&["secret", "secret"])).unwrap();
        assert!(store.is_unlocked());
        assert!(path.exists());

        let store = open_wallet(&path, scripted(&["secret"])).unwrap();
        assert_eq!(store.meta().display_name, "main");
    }

    #[test]
    fn test_create_rejects_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.json");

        let result = create_wallet(&path, "main", scripted(&["secret", "secrte"]));
        assert!(matches!(result, Err(WalletError::Input(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_retries_wrong_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.json");
        create_wallet(&path, "main", scripted(&["pw", "pw"])).unwrap();

        let mut prompts = Vec::new();
        let mut answers = scripted(&["nope", "still nope", "pw"]);
        let store = open_wallet(&path, |prompt: &str| {
            prompts.push(prompt.to_string());
            answers(prompt)
        })
        .unwrap();

        assert!(store.is_unlocked());
        assert_eq!(prompts, vec![PASSWORD_PROMPT, RETRY_PROMPT, RETRY_PROMPT]);
    }

    #[test]
    fn test_open_gives_up_after_max_attempts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.json");
        create_wallet(&path, "main", scripted(&["pw", "pw"])).unwrap();

        let result = open_wallet(&path, scripted(&["a", "b", "c", "pw"]));
        assert!(matches!(result, Err(WalletError::Auth)));
    }

    #[test]
    fn test_recovery_phrase_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.json");
        let store = create_wallet(&path, "main", scripted(&["pw", "pw"])).unwrap();

        let keys = store.keys().unwrap();
        let words = keys.mnemonic_words();
        let rows = recovery_phrase_rows(keys);

        assert_eq!(rows.len(), 6);
        assert!(rows[0].starts_with(&format!(" 1. {}", words[0])));
        assert!(rows[5].ends_with(&format!("24. {}", words[23])));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = open_wallet(&dir.path().join("absent.json"), scripted(&["pw"]));
        assert!(matches!(result, Err(WalletError::Storage(_))));
    }
}
