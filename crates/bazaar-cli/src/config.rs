//! CLI configuration.
//!
//! A JSON file selecting the network, an optional existing instance, and the
//! fee schedule used when initializing a marketplace:
//!
//! ```json
//! {
//!   "network": "testnet",
//!   "fee_address": "addr_test1...",
//!   "fees": [{ "unit": "lovelace", "fee_bps": 700 }]
//! }
//! ```

use std::path::Path;

use bazaar_core::{validate_rate, Address, AssetId, InstanceId, Network, TokenFee};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Fee charged on sales priced in one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeRule {
    /// Asset unit: `lovelace` or `<policy hex><name hex>`.
    pub unit: String,
    /// Fee rate in basis points.
    pub fee_bps: u64,
}

/// Main CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    /// Network addresses are encoded for.
    #[serde(default)]
    pub network: Network,
    /// Existing marketplace instance.
    #[serde(default)]
    pub instance_id: Option<InstanceId>,
    /// Fee recipient; the simulator generates one when unset.
    #[serde(default)]
    pub fee_address: Option<String>,
    /// Fee schedule for new instances.
    #[serde(default = "default_fees")]
    pub fees: Vec<FeeRule>,
}

fn default_fees() -> Vec<FeeRule> {
    vec![FeeRule {
        unit: bazaar_core::LOVELACE.to_string(),
        fee_bps: 700,
    }]
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            instance_id: None,
            fee_address: None,
            fees: default_fees(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| CliError::Config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the effective configuration: the file if given, else
    /// defaults, with `network` taking precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unusable or the result is invalid.
    pub fn load(path: Option<&Path>, network: Option<Network>) -> Result<Self, CliError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(network) = network {
            config.network = network;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for bad units, out-of-range or duplicate fee rules,
    /// or a fee address on another network.
    pub fn validate(&self) -> Result<(), CliError> {
        let fees = self.token_fees()?;
        for (i, rule) in fees.iter().enumerate() {
            if fees[..i].iter().any(|earlier| earlier.matches(&rule.policy, &rule.name)) {
                return Err(CliError::Config(format!(
                    "duplicate fee rule for unit '{}'",
                    self.fees[i].unit
                )));
            }
        }
        self.fee_address()?;
        Ok(())
    }

    /// Fee schedule as config-datum rows.
    ///
    /// # Errors
    ///
    /// Returns an error for an unparseable unit or out-of-range rate.
    pub fn token_fees(&self) -> Result<Vec<TokenFee>, CliError> {
        self.fees
            .iter()
            .map(|rule| {
                let asset: AssetId = rule
                    .unit
                    .parse()
                    .map_err(|e| CliError::Config(format!("fee rule unit '{}': {e}", rule.unit)))?;
                validate_rate(rule.fee_bps)
                    .map_err(|e| CliError::Config(format!("fee rule for '{}': {e}", rule.unit)))?;
                Ok(TokenFee::new(&asset, rule.fee_bps))
            })
            .collect()
    }

    /// Decoded fee address, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if it does not decode or belongs to another network.
    pub fn fee_address(&self) -> Result<Option<Address>, CliError> {
        let Some(text) = &self.fee_address else {
            return Ok(None);
        };
        let (network, address) =
            Address::decode_with_network(text).map_err(|e| CliError::Config(format!("fee_address: {e}")))?;
        if network != self.network {
            return Err(CliError::Config(format!(
                "fee_address is a {network} address but the configured network is {}",
                self.network
            )));
        }
        Ok(Some(address))
    }
}
