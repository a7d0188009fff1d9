//! Ed25519 wallets.
//!
//! A wallet's payment credential is the hash of its verification key; its
//! address is the enterprise address of that credential.

use std::fmt;

use bazaar_core::{Address, Credential, KeyHash, Network, StakeCredential};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

const KEY_HASH_CONTEXT: &str = "bazaar 2024-05 verification key hash";

/// Hash a verification key into a payment credential hash.
#[must_use]
pub fn key_hash_of(public_key: &VerifyingKey) -> KeyHash {
    KeyHash::derive(KEY_HASH_CONTEXT, &[public_key.as_bytes()])
}

/// A verification key with its signature over a transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Verification key bytes.
    pub public_key: [u8; 32],
    /// Signature bytes.
    pub signature: Vec<u8>,
}

impl Witness {
    /// Check the signature over `message`, returning the signer's key hash.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingSignature`] if the key or signature is invalid.
    pub fn verify(&self, message: &[u8]) -> Result<KeyHash> {
        let invalid = || LedgerError::MissingSignature {
            key_hash: hex_prefix(&self.public_key),
        };
        let key = VerifyingKey::from_bytes(&self.public_key).map_err(|_| invalid())?;
        let signature = Signature::from_slice(&self.signature).map_err(|_| invalid())?;
        key.verify_strict(message, &signature).map_err(|_| invalid())?;
        Ok(key_hash_of(&key))
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// A signing wallet, optionally delegating stake to a key.
pub struct Wallet {
    signing_key: SigningKey,
    stake: Option<KeyHash>,
}

impl Wallet {
    /// Generate a new random wallet from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut secret_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut secret_bytes);
        Self {
            signing_key: SigningKey::from_bytes(&secret_bytes),
            stake: None,
        }
    }

    /// Create a wallet from a 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not 32 bytes.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self> {
        let secret: [u8; 32] = secret.try_into().map_err(|_| {
            LedgerError::Wallet {
                message: format!("secret key must be 32 bytes, got {}", secret.len()),
            }
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret),
            stake: None,
        })
    }

    /// Delegate stake to `stake_key`, producing a base address.
    #[must_use]
    pub fn with_stake(mut self, stake_key: KeyHash) -> Self {
        self.stake = Some(stake_key);
        self
    }

    /// Verification key.
    #[must_use]
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Payment key hash.
    #[must_use]
    pub fn key_hash(&self) -> KeyHash {
        key_hash_of(&self.public_key())
    }

    /// Structured address.
    #[must_use]
    pub fn address(&self) -> Address {
        let payment = Credential::VerificationKey(self.key_hash());
        let stake = self
            .stake
            .map(|hash| StakeCredential::Inline(Credential::VerificationKey(hash)));
        Address::new(payment, stake)
    }

    /// Bech32 address on `network`.
    ///
    /// # Errors
    ///
    /// Propagates codec errors.
    pub fn bech32_address(&self, network: Network) -> Result<String> {
        Ok(self.address().to_bech32(network)?)
    }

    /// Sign a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Produce a witness over `message`.
    #[must_use]
    pub fn witness(&self, message: &[u8]) -> Witness {
        Witness {
            public_key: self.public_key().to_bytes(),
            signature: self.sign(message).to_bytes().to_vec(),
        }
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("key_hash", &self.key_hash())
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_wallets_differ() {
        let a = Wallet::generate();
        let b = Wallet::generate();
        assert_ne!(a.key_hash(), b.key_hash());
    }

    #[test]
    fn test_address_is_enterprise_key_address() {
        let wallet = Wallet::generate();
        let bech = wallet.bech32_address(Network::Testnet).unwrap();
        assert!(bech.starts_with("addr_test1v"));
        assert_eq!(Address::from_bech32(&bech).unwrap().payment_key_hash(), Some(wallet.key_hash()));
    }

    #[test]
    fn test_staked_wallet_has_base_address() {
        let wallet = Wallet::generate().with_stake(KeyHash::new([7; 28]));
        assert_eq!(wallet.address().kind(), "base");
        assert!(wallet.bech32_address(Network::Mainnet).unwrap().starts_with("addr1q"));
    }

    #[test]
    fn test_bad_secret_length() {
        assert!(Wallet::from_secret_key(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_witness_verifies_to_key_hash() {
        let wallet = Wallet::generate();
        let witness = wallet.witness(b"tx body");
        assert_eq!(witness.verify(b"tx body").unwrap(), wallet.key_hash());
        assert!(witness.verify(b"other body").is_err());
    }

    #[test]
    fn test_forged_witness_rejected() {
        let signer = Wallet::generate();
        let other = Wallet::generate();
        let mut witness = signer.witness(b"tx");
        witness.public_key = other.public_key().to_bytes();
        assert!(matches!(witness.verify(b"tx"), Err(LedgerError::MissingSignature { .. })));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", Wallet::generate());
        assert!(debug.contains("REDACTED"));
    }
}
