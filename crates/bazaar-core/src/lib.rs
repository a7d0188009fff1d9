//! # bazaar-core
//!
//! Primitives for the Bazaar UTXO NFT marketplace.
//!
//! This crate provides:
//!
//! - [`compute_split`]: Integer-exact fee/seller split in basis points
//! - [`Address`]: Bech32 address codec with structured credentials
//! - [`AssetId`] and [`Value`]: Native unit, tokens, and multi-asset bundles
//! - [`ListingDatum`] and [`ConfigDatum`]: On-chain records and redeemers
//! - [`InstanceId`]: Instance identity and derived scripts/addresses
//!
//! Nothing here touches the network; every function is pure.
//!
//! ## Example
//!
//! ```rust
//! use bazaar_core::{compute_split, InstanceId};
//!
//! let split = compute_split(10_000_000, 700).unwrap();
//! assert_eq!(split.fee, 700_000);
//!
//! let id: InstanceId = format!("{}-0-4d41524b4554", "00".repeat(32)).parse().unwrap();
//! assert_eq!(id.name, "MARKET");
//! let scripts = id.scripts();
//! assert_eq!(scripts.config_token().policy(), Some(&scripts.policy_id));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod asset;
pub mod datum;
pub mod error;
pub mod fee;
pub mod hash;
pub mod instance;
pub mod script;

pub use address::{Address, Credential, Network, Pointer, StakeCredential};
pub use asset::{AssetId, AssetName, Value, LOVELACE};
pub use datum::{ConfigAction, ConfigDatum, ControlAction, ListingDatum, MarketplaceAction, TokenFee};
pub use error::{CoreError, Result};
pub use fee::{compute_split, validate_rate, FeeSplit, BPS_DENOMINATOR};
pub use hash::{Digest, KeyHash, PolicyId, ScriptHash, TxHash};
pub use instance::{InstanceId, InstanceScripts, CONFIG_TOKEN_NAME, OWNERSHIP_TOKEN_NAME};
pub use script::{OutRef, Script};
