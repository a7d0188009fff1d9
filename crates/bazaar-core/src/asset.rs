//! Asset identifiers and multi-asset values.
//!
//! An asset is either the ledger's native unit (`lovelace`) or a token named
//! by a minting policy id and an asset name. Units are written the way wallets
//! write them: `lovelace`, or the policy hex immediately followed by the name
//! hex.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::hash::PolicyId;

/// Unit string of the native asset.
pub const LOVELACE: &str = "lovelace";

/// Maximum asset name length in bytes.
pub const MAX_ASSET_NAME_LEN: usize = 32;

/// Token name under a minting policy (0–32 raw bytes).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    /// Create from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if longer than 32 bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(CoreError::invalid_asset(format!(
                "asset name is {} bytes, maximum is {MAX_ASSET_NAME_LEN}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Create from UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is longer than 32 bytes.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(text.as_bytes())
    }

    /// Parse from hex.
    ///
    /// # Errors
    ///
    /// Returns an error on bad hex or excess length.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::invalid_hex(e.to_string()))?;
        Self::new(bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// True for the empty name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) if text.chars().all(|c| !c.is_control()) => write!(f, "AssetName({text:?})"),
            _ => write!(f, "AssetName(0x{})", self.to_hex()),
        }
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for AssetName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AssetName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Identifies one fungible or non-fungible asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetId {
    /// The ledger's native unit.
    Lovelace,
    /// A token under a minting policy.
    Token {
        /// Minting policy.
        policy: PolicyId,
        /// Asset name under the policy.
        name: AssetName,
    },
}

impl AssetId {
    /// A token id.
    #[must_use]
    pub const fn token(policy: PolicyId, name: AssetName) -> Self {
        Self::Token { policy, name }
    }

    /// Interpret a `(policy hex, name hex)` pair, where `("", "")` is the native unit.
    ///
    /// # Errors
    ///
    /// Returns an error if either half is malformed, or if only one half is empty.
    pub fn from_pair(policy: &str, name: &str) -> Result<Self> {
        if policy.is_empty() {
            if name.is_empty() {
                return Ok(Self::Lovelace);
            }
            return Err(CoreError::invalid_asset("asset name given without a policy"));
        }
        Ok(Self::Token {
            policy: PolicyId::from_hex(policy)?,
            name: AssetName::from_hex(name)?,
        })
    }

    /// The `(policy hex, name hex)` pair; `("", "")` for the native unit.
    #[must_use]
    pub fn to_pair(&self) -> (String, String) {
        match self {
            Self::Lovelace => (String::new(), String::new()),
            Self::Token { policy, name } => (policy.to_hex(), name.to_hex()),
        }
    }

    /// Wallet-style unit string.
    #[must_use]
    pub fn unit(&self) -> String {
        match self {
            Self::Lovelace => LOVELACE.to_string(),
            Self::Token { policy, name } => format!("{}{}", policy.to_hex(), name.to_hex()),
        }
    }

    /// True for the native unit.
    #[must_use]
    pub const fn is_lovelace(&self) -> bool {
        matches!(self, Self::Lovelace)
    }

    /// Minting policy, if a token.
    #[must_use]
    pub const fn policy(&self) -> Option<&PolicyId> {
        match self {
            Self::Lovelace => None,
            Self::Token { policy, .. } => Some(policy),
        }
    }

    /// Asset name, if a token.
    #[must_use]
    pub const fn name(&self) -> Option<&AssetName> {
        match self {
            Self::Lovelace => None,
            Self::Token { name, .. } => Some(name),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unit())
    }
}

impl FromStr for AssetId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s == LOVELACE {
            return Ok(Self::Lovelace);
        }
        let policy_len = PolicyId::LEN * 2;
        if s.len() < policy_len || !s.is_char_boundary(policy_len) {
            return Err(CoreError::invalid_asset(format!("unit '{s}' is shorter than a policy id")));
        }
        let (policy, name) = s.split_at(policy_len);
        Self::from_pair(policy, name)
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.unit())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A bundle of asset quantities. Zero entries are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(BTreeMap<AssetId, u64>);

impl Value {
    /// The empty value.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A value holding only native units.
    #[must_use]
    pub fn lovelace(quantity: u64) -> Self {
        Self::singleton(AssetId::Lovelace, quantity)
    }

    /// A value holding a single asset.
    #[must_use]
    pub fn singleton(asset: AssetId, quantity: u64) -> Self {
        let mut value = Self::new();
        if quantity > 0 {
            value.0.insert(asset, quantity);
        }
        value
    }

    /// Builder-style insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity overflows.
    pub fn with(mut self, asset: AssetId, quantity: u64) -> Result<Self> {
        self.add(asset, quantity)?;
        Ok(self)
    }

    /// Quantity of `asset` (zero if absent).
    #[must_use]
    pub fn quantity_of(&self, asset: &AssetId) -> u64 {
        self.0.get(asset).copied().unwrap_or(0)
    }

    /// Native units held.
    #[must_use]
    pub fn coin(&self) -> u64 {
        self.quantity_of(&AssetId::Lovelace)
    }

    /// Add `quantity` of `asset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity overflows.
    pub fn add(&mut self, asset: AssetId, quantity: u64) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }
        let entry = self.0.entry(asset).or_insert(0);
        *entry = entry
            .checked_add(quantity)
            .ok_or_else(|| CoreError::overflow("adding asset quantities"))?;
        Ok(())
    }

    /// Add every asset of `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if any quantity overflows.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        for (asset, quantity) in &other.0 {
            self.add(asset.clone(), *quantity)?;
        }
        Ok(())
    }

    /// Remove `quantity` of `asset`, returning `None` if not enough is held.
    #[must_use]
    pub fn checked_remove(&self, asset: &AssetId, quantity: u64) -> Option<Self> {
        let held = self.quantity_of(asset);
        let remaining = held.checked_sub(quantity)?;
        let mut out = self.clone();
        if remaining == 0 {
            out.0.remove(asset);
        } else {
            out.0.insert(asset.clone(), remaining);
        }
        Some(out)
    }

    /// True if `self` holds at least every quantity in `other`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.0.iter().all(|(asset, q)| self.quantity_of(asset) >= *q)
    }

    /// True if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(asset, quantity)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, u64)> {
        self.0.iter().map(|(a, q)| (a, *q))
    }

    /// Non-native assets held.
    pub fn tokens(&self) -> impl Iterator<Item = (&AssetId, u64)> {
        self.iter().filter(|(a, _)| !a.is_lovelace())
    }
}

impl FromIterator<(AssetId, u64)> for Value {
    fn from_iter<I: IntoIterator<Item = (AssetId, u64)>>(iter: I) -> Self {
        let mut value = Self::new();
        for (asset, quantity) in iter {
            let entry = value.0.entry(asset).or_insert(0);
            *entry = entry.saturating_add(quantity);
        }
        value.0.retain(|_, q| *q > 0);
        value
    }
}
