//! Marketplace instance identity and everything derived from it.
//!
//! An instance is named by the seed output its control policy consumed plus a
//! human-readable name. Given the id, every script hash, address, and control
//! token unit is recomputed locally.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::address::{Address, Network};
use crate::asset::{AssetId, AssetName};
use crate::error::{CoreError, Result};
use crate::hash::{PolicyId, ScriptHash, TxHash};
use crate::script::{OutRef, Script};

/// Asset name of the token marking the config output.
pub const CONFIG_TOKEN_NAME: &str = "MarketplaceConfig";

/// Asset name of the token authorizing config changes and shutdown.
pub const OWNERSHIP_TOKEN_NAME: &str = "Ownership";

/// Identity of one marketplace deployment.
///
/// Text form: `<seed tx hash hex>-<seed index>-<hex(utf8 name)>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId {
    /// Output consumed by the control policy at initialization.
    pub seed: OutRef,
    /// Human-readable marketplace name.
    pub name: String,
}

impl InstanceId {
    /// Create an instance id.
    #[must_use]
    pub fn new(seed: OutRef, name: impl Into<String>) -> Self {
        Self {
            seed,
            name: name.into(),
        }
    }

    /// Derive every script, address, and unit of this instance.
    #[must_use]
    pub fn scripts(&self) -> InstanceScripts {
        InstanceScripts::derive(self.seed)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.seed.tx_hash,
            self.seed.index,
            hex::encode(self.name.as_bytes())
        )
    }
}

impl FromStr for InstanceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: String| CoreError::InvalidInstanceId { message };

        let mut parts = s.splitn(3, '-');
        let (Some(hash), Some(index), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid(format!("'{s}' is not of the form <tx hash>-<index>-<name hex>")));
        };
        let tx_hash = TxHash::from_hex(hash).map_err(|e| invalid(e.to_string()))?;
        let index = index
            .parse::<u32>()
            .map_err(|_| invalid(format!("bad seed index '{index}'")))?;
        let name_bytes = hex::decode(name).map_err(|e| invalid(format!("name is not hex: {e}")))?;
        let name = String::from_utf8(name_bytes).map_err(|_| invalid("name is not UTF-8".to_string()))?;

        Ok(Self::new(OutRef::new(tx_hash, index), name))
    }
}

impl Serialize for InstanceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Scripts, hashes, and token units of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceScripts {
    /// One-shot minting policy for the control tokens.
    pub control_policy: Script,
    /// Validator holding the config output.
    pub config_validator: Script,
    /// Validator holding listings.
    pub marketplace_validator: Script,
    /// Id of the control policy.
    pub policy_id: PolicyId,
    /// Hash of the config validator.
    pub config_hash: ScriptHash,
    /// Hash of the marketplace validator.
    pub marketplace_hash: ScriptHash,
}

impl InstanceScripts {
    /// Apply parameters starting from the seed output.
    #[must_use]
    pub fn derive(seed: OutRef) -> Self {
        let control_policy = Script::ControlPolicy { seed };
        let policy_id = control_policy.hash();
        let config_validator = Script::ConfigValidator {
            control_policy: policy_id,
        };
        let marketplace_validator = Script::MarketplaceValidator {
            control_policy: policy_id,
        };
        Self {
            config_hash: config_validator.hash(),
            marketplace_hash: marketplace_validator.hash(),
            control_policy,
            config_validator,
            marketplace_validator,
            policy_id,
        }
    }

    /// The Config control token.
    #[must_use]
    pub fn config_token(&self) -> AssetId {
        AssetId::token(self.policy_id, control_name(CONFIG_TOKEN_NAME))
    }

    /// The Ownership control token.
    #[must_use]
    pub fn ownership_token(&self) -> AssetId {
        AssetId::token(self.policy_id, control_name(OWNERSHIP_TOKEN_NAME))
    }

    /// Structured address of the config validator.
    #[must_use]
    pub const fn config_address(&self) -> Address {
        Address::script(self.config_hash)
    }

    /// Structured address of the marketplace validator.
    #[must_use]
    pub const fn marketplace_address(&self) -> Address {
        Address::script(self.marketplace_hash)
    }

    /// Bech32 config address on `network`.
    ///
    /// # Errors
    ///
    /// Propagates codec errors.
    pub fn config_address_bech32(&self, network: Network) -> Result<String> {
        self.config_address().to_bech32(network)
    }

    /// Bech32 marketplace address on `network`.
    ///
    /// # Errors
    ///
    /// Propagates codec errors.
    pub fn marketplace_address_bech32(&self, network: Network) -> Result<String> {
        self.marketplace_address().to_bech32(network)
    }
}

fn control_name(text: &'static str) -> AssetName {
    // Both control names are well under the 32-byte limit.
    AssetName::from_text(text).unwrap_or_default()
}
