//! Fixed-length digests used for keys, scripts, policies, and transactions.
//!
//! All digests are produced by BLAKE3 in key-derivation mode so that every
//! kind of hash lives in its own domain.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// A fixed-length digest, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest<const N: usize>([u8; N]);

/// Hash of a verification key (28 bytes).
pub type KeyHash = Digest<28>;

/// Hash of a script (28 bytes).
pub type ScriptHash = Digest<28>;

/// Minting policy identifier; the hash of the minting script.
pub type PolicyId = ScriptHash;

/// Transaction identifier (32 bytes).
pub type TxHash = Digest<32>;

impl<const N: usize> Digest<N> {
    /// Byte length of this digest.
    pub const LEN: usize = N;

    /// Wrap raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, checking the length.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly `N` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        <[u8; N]>::try_from(bytes).map(Self).map_err(|_| {
            CoreError::invalid_hex(format!("expected {N} bytes, got {}", bytes.len()))
        })
    }

    /// Parse from a hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not hex or has the wrong length.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::invalid_hex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Derive a digest from length-prefixed parts under a domain context.
    #[must_use]
    pub fn derive(context: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(context);
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let mut out = [0u8; N];
        hasher.finalize_xof().fill(&mut out);
        Self(out)
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl<const N: usize> fmt::Display for Digest<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl<const N: usize> fmt::Debug for Digest<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl<const N: usize> FromStr for Digest<N> {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl<const N: usize> Serialize for Digest<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de, const N: usize> Deserialize<'de> for Digest<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
