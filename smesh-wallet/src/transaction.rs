//! Transaction Building and Signing
//!
//! Coin transfers are signed locally over a canonical byte encoding of the
//! transaction fields and submitted as raw signed bytes. The node verifies
//! the signature against the exact same encoding, so the encoding must not
//! admit any ambiguity: fixed-width integers, big-endian, fields in a fixed
//! order, no length prefixes.

use bincode::Options;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use tracing::{debug, warn};

use crate::error::Result;
use crate::keys::{Address, ADDRESS_LENGTH, SIGNATURE_LENGTH};
use crate::rpc::{NodeApi, TransactionState};

/// Encoded size of an [`UnsignedTransaction`]
pub const UNSIGNED_TX_LENGTH: usize = 4 * 8 + ADDRESS_LENGTH;

/// Encoded size of a [`SignedTransaction`]
pub const SIGNED_TX_LENGTH: usize = UNSIGNED_TX_LENGTH + SIGNATURE_LENGTH;

/// Gas price used unless the user picks another one
pub const DEFAULT_GAS_PRICE: u64 = 1;

/// Gas limit attached to coin transfers
pub const DEFAULT_GAS_LIMIT: u64 = 100;

/// The canonical codec: fixed-width integers, big-endian, no trailing bytes.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .reject_trailing_bytes()
}

/// Transfer fields covered by the signature, in signing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub amount: u64,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub recipient: Address,
}

impl UnsignedTransaction {
    /// Canonical encoding (the signed message)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(codec().serialize(self)?)
    }

    /// Sign the canonical encoding with `key`
    pub fn sign(self, key: &SigningKey) -> Result<SignedTransaction> {
        let message = self.to_bytes()?;
        let signature = key.sign(&message).to_bytes();
        Ok(SignedTransaction {
            inner: self,
            signature,
        })
    }
}

/// An unsigned transaction followed by its detached Ed25519 signature.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub inner: UnsignedTransaction,
    #[serde_as(as = "[_; 64]")]
    pub signature: [u8; SIGNATURE_LENGTH],
}

impl SignedTransaction {
    /// Canonical encoding (what is submitted to the node)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(codec().serialize(self)?)
    }

    /// Decode a signed transaction from its canonical encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(codec().deserialize(bytes)?)
    }

    /// Check the signature against `public_key`
    pub fn verify(&self, public_key: &VerifyingKey) -> bool {
        match self.inner.to_bytes() {
            Ok(message) => public_key
                .verify_strict(&message, &Signature::from_bytes(&self.signature))
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Build, sign and submit a coin transfer.
///
/// The nonce is used as given; it must equal the sender's counter on the
/// node or the node rejects the transaction. Nothing is submitted if
/// encoding fails, and a failed submission is not retried.
pub async fn build_and_submit<C: NodeApi>(
    client: &C,
    recipient: Address,
    nonce: u64,
    amount: u64,
    gas_price: u64,
    gas_limit: u64,
    key: &SigningKey,
) -> Result<TransactionState> {
    let tx = UnsignedTransaction {
        nonce,
        amount,
        gas_limit,
        gas_price,
        recipient,
    }
    .sign(key)?;
    let bytes = tx.to_bytes()?;

    debug!(
        "Submitting transfer of {} to {} (nonce {}, {} bytes)",
        amount,
        recipient,
        nonce,
        bytes.len()
    );

    client.submit_transaction(&bytes).await.map_err(|e| {
        warn!("Transaction to {} was not delivered: {}", recipient, e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn sample(
        nonce: u64,
        amount: u64,
        recipient: u8,
        gas_price: u64,
        gas_limit: u64,
    ) -> UnsignedTransaction {
        UnsignedTransaction {
            nonce,
            amount,
            gas_limit,
            gas_price,
            recipient: Address::new([recipient; ADDRESS_LENGTH]),
        }
    }

    #[test]
    fn test_encoding_layout() {
        let tx = sample(1, 2, 0xaa, 4, 3);
        let bytes = tx.to_bytes().unwrap();

        assert_eq!(bytes.len(), UNSIGNED_TX_LENGTH);
        assert_eq!(&bytes[0..8], &1u64.to_be_bytes());
        assert_eq!(&bytes[8..16], &2u64.to_be_bytes());
        assert_eq!(&bytes[16..24], &3u64.to_be_bytes());
        assert_eq!(&bytes[24..32], &4u64.to_be_bytes());
        assert_eq!(&bytes[32..], &[0xaa; ADDRESS_LENGTH]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = sample(7, 1_000, 3, 1, 100).to_bytes().unwrap();
        let b = sample(7, 1_000, 3, 1, 100).to_bytes().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signed_layout() {
        let key = test_key(1);
        let tx = sample(0, 5, 9, 1, 100).sign(&key).unwrap();
        let bytes = tx.to_bytes().unwrap();

        assert_eq!(bytes.len(), SIGNED_TX_LENGTH);
        assert_eq!(&bytes[..UNSIGNED_TX_LENGTH], &tx.inner.to_bytes().unwrap()[..]);
        assert_eq!(&bytes[UNSIGNED_TX_LENGTH..], &tx.signature[..]);
        assert_eq!(SignedTransaction::from_bytes(&bytes).unwrap(), tx);
    }

    #[test]
    fn test_sign_then_verify() {
        let key = test_key(2);
        let cases = [
            sample(0, 0, 0, 0, 0),
            sample(1, 1, 1, 1, 1),
            sample(u64::MAX, u64::MAX, 0xff, u64::MAX, u64::MAX),
            sample(42, 1_000_000, 0x10, 3, 100),
        ];

        for tx in cases {
            let signed = tx.sign(&key).unwrap();
            assert!(signed.verify(&key.verifying_key()));
        }
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let signed = sample(1, 2, 3, 4, 5).sign(&test_key(3)).unwrap();
        assert!(!signed.verify(&test_key(4).verifying_key()));
    }

    #[test]
    fn test_any_byte_mutation_invalidates_signature() {
        let key = test_key(5);
        let signed = sample(12, 3_400, 0x5a, 2, 100).sign(&key).unwrap();
        let bytes = signed.to_bytes().unwrap();

        for i in 0..bytes.len() {
            let mut mutated = bytes.clone();
            mutated[i] ^= 0x01;
            let decoded = SignedTransaction::from_bytes(&mutated).unwrap();
            assert!(
                !decoded.verify(&key.verifying_key()),
                "mutation at byte {} still verifies",
                i
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let signed = sample(1, 1, 1, 1, 1).sign(&test_key(6)).unwrap();
        let mut bytes = signed.to_bytes().unwrap();
        bytes.push(0);
        assert!(SignedTransaction::from_bytes(&bytes).is_err());
    }
}
