//! Key Management
//!
//! Handles BIP39 mnemonic generation and SLIP-0010 Ed25519 key derivation
//! for wallet accounts, and the 20-byte account address derived from an
//! account's public key.
//!
//! Every account of a wallet is derived from the same mnemonic at its
//! creation-order position, so the wallet file only has to keep the mnemonic
//! and the account names.

use bip39::{Language, Mnemonic, MnemonicType, Seed};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

/// Number of words in the mnemonic phrase
const MNEMONIC_WORDS: usize = 24;

/// SLIP-0044 coin type of the network
const COIN_TYPE: u32 = 540;

/// Length of an account address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Length of an Ed25519 signature in bytes
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Wallet master keys derived from a BIP39 mnemonic.
///
/// Both the phrase and the derived seed are wrapped in `Zeroizing` so they
/// are overwritten when the wallet is dropped.
pub struct WalletKeys {
    mnemonic_phrase: Zeroizing<String>,
    seed: Zeroizing<Vec<u8>>,
}

impl WalletKeys {
    /// Generate new wallet keys with a random 24-word mnemonic
    pub fn generate() -> Self {
        let mnemonic = Mnemonic::new(MnemonicType::Words24, Language::English);
        Self::from_validated(mnemonic)
    }

    /// Restore wallet keys from a mnemonic phrase
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        let word_count = phrase.split_whitespace().count();
        if word_count != MNEMONIC_WORDS {
            return Err(WalletError::Storage(format!(
                "expected {} word mnemonic, got {} words",
                MNEMONIC_WORDS, word_count
            )));
        }

        let mnemonic = Mnemonic::from_phrase(phrase, Language::English)
            .map_err(|e| WalletError::Storage(format!("invalid mnemonic phrase: {}", e)))?;

        Ok(Self::from_validated(mnemonic))
    }

    fn from_validated(mnemonic: Mnemonic) -> Self {
        // No BIP39 passphrase: the wallet password only protects the file.
        let seed = Seed::new(&mnemonic, "");
        Self {
            mnemonic_phrase: Zeroizing::new(mnemonic.phrase().to_string()),
            seed: Zeroizing::new(seed.as_bytes().to_vec()),
        }
    }

    /// Get the mnemonic phrase as a string
    pub fn mnemonic_phrase(&self) -> &str {
        &self.mnemonic_phrase
    }

    /// Get the mnemonic words as a vector
    pub fn mnemonic_words(&self) -> Vec<&str> {
        self.mnemonic_phrase.split_whitespace().collect()
    }

    /// Derive the signing key of the account at `index`.
    ///
    /// Path: `m/44'/540'/0'/0'/<index>'`. SLIP-0010 only defines hardened
    /// derivation for Ed25519, so every component is hardened.
    pub fn derive_signing_key(&self, index: u32) -> SigningKey {
        let path = [44, COIN_TYPE, 0, 0, index];
        let secret = Zeroizing::new(slip10_ed25519::derive_ed25519_private_key(
            &self.seed, &path,
        ));
        SigningKey::from_bytes(&secret)
    }
}

/// Sign an arbitrary message with an account key
pub fn sign_message(key: &SigningKey, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
    key.sign(message).to_bytes()
}

/// An account address: the trailing 20 bytes of the Ed25519 public key.
///
/// Displayed and parsed as `0x`-prefixed lowercase hex. Serializes as a hex
/// string in human-readable formats (JSON) and as 20 raw bytes otherwise, so
/// the same type is used on the wire and inside the canonical transaction
/// encoding.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a public key
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        let bytes = public_key.as_bytes();
        let mut address = [0u8; ADDRESS_LENGTH];
        address.copy_from_slice(&bytes[bytes.len() - ADDRESS_LENGTH..]);
        Self(address)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let bytes = hex::decode(digits)
            .map_err(|e| WalletError::input(format!("invalid address `{}`: {}", s, e)))?;

        let address: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            WalletError::input(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LENGTH,
                b.len()
            ))
        })?;

        Ok(Self(address))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            <[u8; ADDRESS_LENGTH]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    // Standard BIP39 test vector (24 words)
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn test_generate_wallet() {
        let keys = WalletKeys::generate();
        assert_eq!(keys.mnemonic_words().len(), 24);

        let restored = WalletKeys::from_mnemonic(keys.mnemonic_phrase()).unwrap();
        assert_eq!(
            keys.derive_signing_key(0).verifying_key(),
            restored.derive_signing_key(0).verifying_key()
        );
    }

    #[test]
    fn test_deterministic_derivation() {
        let keys1 = WalletKeys::from_mnemonic(TEST_MNEMONIC).unwrap();
        let keys2 = WalletKeys::from_mnemonic(TEST_MNEMONIC).unwrap();

        assert_eq!(
            keys1.derive_signing_key(3).to_bytes(),
            keys2.derive_signing_key(3).to_bytes()
        );
    }

    #[test]
    fn test_positions_derive_distinct_keys() {
        let keys = WalletKeys::from_mnemonic(TEST_MNEMONIC).unwrap();
        let first = keys.derive_signing_key(0).verifying_key();
        let second = keys.derive_signing_key(1).verifying_key();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_mnemonic() {
        assert!(WalletKeys::from_mnemonic("abandon abandon abandon").is_err());

        let bad_word = TEST_MNEMONIC.replace("art", "notaword");
        assert!(WalletKeys::from_mnemonic(&bad_word).is_err());
    }

    #[test]
    fn test_address_is_public_key_suffix() {
        let keys = WalletKeys::from_mnemonic(TEST_MNEMONIC).unwrap();
        let public = keys.derive_signing_key(0).verifying_key();
        let address = Address::from_public_key(&public);

        assert_eq!(&address.as_bytes()[..], &public.as_bytes()[12..]);
    }

    #[test]
    fn test_address_display_and_parse() {
        let address = Address::new([0xab; ADDRESS_LENGTH]);
        let text = address.to_string();

        assert_eq!(text, format!("0x{}", "ab".repeat(ADDRESS_LENGTH)));
        assert_eq!(text.parse::<Address>().unwrap(), address);
        assert_eq!("AB".repeat(20).parse::<Address>().unwrap(), address);
    }

    #[test]
    fn test_address_parse_errors() {
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(WalletError::Input(_))
        ));
        assert!(matches!(
            "0x0102".parse::<Address>(),
            Err(WalletError::Input(_))
        ));
    }

    #[test]
    fn test_address_json_is_hex_string() {
        let address = Address::new([1; ADDRESS_LENGTH]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(20)));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn test_address_binary_is_raw_bytes() {
        let address = Address::new([7; ADDRESS_LENGTH]);
        let bytes = bincode::serialize(&address).unwrap();
        assert_eq!(bytes, vec![7u8; ADDRESS_LENGTH]);
    }

    #[test]
    fn test_sign_message() {
        let keys = WalletKeys::from_mnemonic(TEST_MNEMONIC).unwrap();
        let key = keys.derive_signing_key(0);
        let signature = sign_message(&key, b"hello");

        assert!(key
            .verifying_key()
            .verify(b"hello", &Signature::from_bytes(&signature))
            .is_ok());
    }
}
