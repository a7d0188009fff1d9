//! The ledger-client collaborator.
//!
//! Everything the marketplace needs from a chain provider and wallet:
//! UTXO queries, submission, and confirmation. Implemented by the in-memory
//! [`crate::emulator::EmulatorClient`]; a node-backed provider implements the
//! same trait.

use bazaar_core::{AssetId, Network, OutRef, TxHash};

use crate::error::Result;
use crate::tx::TxDraft;
use crate::utxo::Utxo;

/// Chain provider plus connected wallet.
pub trait LedgerClient: Send + Sync {
    /// Network the client is connected to.
    fn network(&self) -> Network;

    /// Bech32 address of the connected wallet.
    fn wallet_address(&self) -> String;

    /// Spendable outputs of the connected wallet.
    fn wallet_utxos(&self) -> impl std::future::Future<Output = Result<Vec<Utxo>>> + Send;

    /// All outputs at `address`.
    fn utxos_at(&self, address: &str) -> impl std::future::Future<Output = Result<Vec<Utxo>>> + Send;

    /// Outputs at `address` holding at least one `unit`.
    fn utxos_at_with_unit(
        &self,
        address: &str,
        unit: &AssetId,
    ) -> impl std::future::Future<Output = Result<Vec<Utxo>>> + Send;

    /// The unspent output at `out_ref`, if it exists and is unspent.
    fn utxo_by_ref(&self, out_ref: &OutRef) -> impl std::future::Future<Output = Result<Option<Utxo>>> + Send;

    /// Balance, sign, and submit. Returns once the network has accepted the
    /// transaction, not once it is confirmed.
    fn submit(&self, draft: TxDraft) -> impl std::future::Future<Output = Result<TxHash>> + Send;

    /// Wait until `hash` is confirmed, or report why it was rejected.
    fn await_tx(&self, hash: &TxHash) -> impl std::future::Future<Output = Result<()>> + Send;
}
