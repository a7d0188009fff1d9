//! # bazaar-market
//!
//! Transaction protocol for the Bazaar NFT marketplace.
//!
//! This crate provides:
//! - [`Marketplace`]: Lifecycle orchestrator (initialize, list, edit, buy,
//!   delist, update config, shutdown)
//! - [`resolver`]: Config and listing lookup against fresh ledger state
//! - [`Probe`]: Deliberately invalid transactions for validator testing
//! - [`MarketError`]: Typed failures with an [`ErrorClass`]
//!
//! ## Example
//!
//! ```rust
//! use bazaar_core::{AssetId, ConfigDatum, Network, TokenFee, Value};
//! use bazaar_ledger::{Emulator, LedgerClient, Wallet};
//! use bazaar_market::Marketplace;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let emulator = Emulator::new(Network::Testnet);
//! let operator = emulator.connect(Wallet::generate())?;
//! emulator.fund(&operator.wallet_address(), Value::lovelace(20_000_000)).await?;
//!
//! let fee_address = Wallet::generate().address();
//! let config = ConfigDatum::new(fee_address, vec![TokenFee::new(&AssetId::Lovelace, 700)])?;
//!
//! let mut market = Marketplace::new(operator);
//! let init = market.initialize("bazaar", config).await?;
//! market.await_tx(&init.tx_hash).await?;
//! println!("instance {}", init.instance_id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod marketplace;
pub mod probe;
pub mod resolver;

pub use error::{ErrorClass, MarketError, Result};
pub use marketplace::{Initialized, MarketStatus, Marketplace, Quote};
pub use probe::Probe;
pub use resolver::{ConfigState, Listing};
