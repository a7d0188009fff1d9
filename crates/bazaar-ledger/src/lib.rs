//! # bazaar-ledger
//!
//! The ledger-client collaborator for the Bazaar marketplace.
//!
//! This crate provides:
//! - [`LedgerClient`]: UTXO queries, submission, and confirmation
//! - [`TxDraft`]: Builder for transaction descriptions
//! - [`Utxo`] and [`InlineData`]: Outputs and their attached data
//! - [`Wallet`]: Ed25519 signing wallets
//! - [`Emulator`]: In-memory ledger enforcing the marketplace validators
//!
//! ## Example
//!
//! ```rust
//! use bazaar_core::{Network, Value};
//! use bazaar_ledger::{Emulator, LedgerClient, TxDraft, Wallet};
//!
//! # async fn example() -> bazaar_ledger::Result<()> {
//! let emulator = Emulator::new(Network::Testnet);
//! let alice = emulator.connect(Wallet::generate())?;
//! let bob = emulator.connect(Wallet::generate())?;
//! emulator.fund(&alice.wallet_address(), Value::lovelace(10_000_000)).await?;
//!
//! let draft = TxDraft::new("pay").pay_to(bob.wallet_address(), Value::lovelace(2_000_000));
//! let hash = alice.submit(draft).await?;
//! alice.await_tx(&hash).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod emulator;
pub mod error;
pub mod tx;
pub mod utxo;
pub mod wallet;

pub use client::LedgerClient;
pub use emulator::{
    AcceptAll, BlockSummary, Emulator, EmulatorClient, MarketplaceScripts, ScriptEvaluator, ScriptPurpose,
    DEFAULT_FEE,
};
pub use error::{LedgerError, Result};
pub use tx::{Mint, ResolvedInput, Transaction, TxDraft, TxInput, TxOutput, TxRecord, TxStatus};
pub use utxo::{InlineData, Utxo};
pub use wallet::{Wallet, Witness};
