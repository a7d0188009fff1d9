//! Output references and the three parameterized marketplace scripts.
//!
//! Script identity is a pure function of the script kind and its parameter:
//! the control policy is parameterized by the seed output it must consume,
//! the config and marketplace validators by the control policy id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::hash::{PolicyId, ScriptHash, TxHash};

const CONTROL_POLICY_CONTEXT: &str = "bazaar 2024-05 control policy";
const CONFIG_VALIDATOR_CONTEXT: &str = "bazaar 2024-05 config validator";
const MARKETPLACE_VALIDATOR_CONTEXT: &str = "bazaar 2024-05 marketplace validator";

/// Reference to a transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutRef {
    /// Producing transaction.
    pub tx_hash: TxHash,
    /// Output position within that transaction.
    pub index: u32,
}

impl OutRef {
    /// Create an output reference.
    #[must_use]
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for OutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

impl FromStr for OutRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let (hash, index) = s
            .split_once('#')
            .ok_or_else(|| CoreError::invalid_hex(format!("output reference '{s}' is missing '#'")))?;
        let index = index
            .parse()
            .map_err(|_| CoreError::invalid_hex(format!("bad output index '{index}'")))?;
        Ok(Self::new(TxHash::from_hex(hash)?, index))
    }
}

/// A marketplace script together with the parameter applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Script {
    /// One-shot minting policy for the Config and Ownership tokens.
    ControlPolicy {
        /// Output the policy requires to be spent when minting.
        seed: OutRef,
    },
    /// Validator guarding the config output.
    ConfigValidator {
        /// Policy whose tokens mark this instance.
        control_policy: PolicyId,
    },
    /// Validator guarding listings.
    MarketplaceValidator {
        /// Policy whose tokens mark this instance.
        control_policy: PolicyId,
    },
}

impl Script {
    /// Hash of the applied script. For the control policy this is the policy id.
    #[must_use]
    pub fn hash(&self) -> ScriptHash {
        match self {
            Self::ControlPolicy { seed } => ScriptHash::derive(
                CONTROL_POLICY_CONTEXT,
                &[seed.tx_hash.as_bytes(), &seed.index.to_be_bytes()],
            ),
            Self::ConfigValidator { control_policy } => {
                ScriptHash::derive(CONFIG_VALIDATOR_CONTEXT, &[control_policy.as_bytes()])
            }
            Self::MarketplaceValidator { control_policy } => {
                ScriptHash::derive(MARKETPLACE_VALIDATOR_CONTEXT, &[control_policy.as_bytes()])
            }
        }
    }

    /// Short name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ControlPolicy { .. } => "control policy",
            Self::ConfigValidator { .. } => "config validator",
            Self::MarketplaceValidator { .. } => "marketplace validator",
        }
    }
}
