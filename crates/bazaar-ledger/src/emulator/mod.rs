//! In-memory development ledger.
//!
//! The emulator keeps a UTXO set, a mempool, and per-transaction records
//! behind a single async mutex. Wallets [`Emulator::connect`] to obtain an
//! [`EmulatorClient`] implementing [`LedgerClient`].
//!
//! Submission resolves inputs against ledger truth, balances the draft from
//! the connected wallet, checks witnesses, and runs every script through a
//! pluggable [`ScriptEvaluator`]. Accepted transactions wait in the mempool
//! until [`Emulator::await_block`] applies them in submission order; that is
//! where two transactions racing for one output are arbitrated.

mod validators;

pub use validators::MarketplaceScripts;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use bazaar_core::{Address, AssetId, KeyHash, Network, OutRef, Script, ScriptHash, TxHash, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::LedgerClient;
use crate::error::{LedgerError, Result};
use crate::tx::{Mint, ResolvedInput, Transaction, TxDraft, TxOutput, TxRecord};
use crate::utxo::Utxo;
use crate::wallet::Wallet;

/// Fee charged per transaction, in the native unit.
pub const DEFAULT_FEE: u64 = 200_000;

const TX_HASH_CONTEXT: &str = "bazaar 2024-05 emulator transaction";
const GENESIS_CONTEXT: &str = "bazaar 2024-05 emulator genesis";

/// Why a script is being run.
#[derive(Debug, Clone, Copy)]
pub enum ScriptPurpose<'a> {
    /// Spending an output locked by the script.
    Spend(&'a ResolvedInput),
    /// Minting or burning under the script's policy.
    Mint(&'a Mint),
}

/// Black-box validator: given a script, its purpose, and the whole
/// transaction, accept or reject with a reason.
pub trait ScriptEvaluator: Send + Sync {
    /// Run `script`.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason.
    fn evaluate(&self, script: &Script, purpose: ScriptPurpose<'_>, tx: &Transaction) -> std::result::Result<(), String>;
}

/// Evaluator that accepts every script.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ScriptEvaluator for AcceptAll {
    fn evaluate(&self, _script: &Script, _purpose: ScriptPurpose<'_>, _tx: &Transaction) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Outcome of applying one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSummary {
    /// Height of the new block.
    pub height: u64,
    /// Transactions included.
    pub confirmed: Vec<TxHash>,
    /// Transactions rejected at confirmation.
    pub failed: Vec<(TxHash, LedgerError)>,
}

#[derive(Debug, Default)]
struct LedgerState {
    utxos: BTreeMap<OutRef, Utxo>,
    spent: HashSet<OutRef>,
    mempool: Vec<Transaction>,
    records: HashMap<TxHash, TxRecord>,
    nonce: u64,
    height: u64,
}

impl LedgerState {
    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }

    fn resolve_input(&self, out_ref: &OutRef) -> Result<Utxo> {
        if let Some(utxo) = self.utxos.get(out_ref) {
            return Ok(utxo.clone());
        }
        if self.spent.contains(out_ref) {
            return Err(LedgerError::InputAlreadySpent {
                out_ref: out_ref.to_string(),
            });
        }
        Err(LedgerError::UnknownInput {
            out_ref: out_ref.to_string(),
        })
    }

    fn resolve_reference(&self, out_ref: &OutRef) -> Result<Utxo> {
        self.utxos
            .get(out_ref)
            .cloned()
            .ok_or_else(|| LedgerError::MissingReferenceInput {
                out_ref: out_ref.to_string(),
            })
    }

    /// Outputs already claimed by mempool transactions.
    fn pending_inputs(&self) -> HashSet<OutRef> {
        self.mempool
            .iter()
            .flat_map(|tx| tx.inputs.iter().map(|i| i.utxo.out_ref))
            .collect()
    }

    fn apply(&mut self, tx: &Transaction) -> Result<()> {
        for input in &tx.inputs {
            self.resolve_input(&input.utxo.out_ref)?;
        }
        for reference in &tx.reference_inputs {
            self.resolve_reference(&reference.out_ref)?;
        }

        for input in &tx.inputs {
            self.utxos.remove(&input.utxo.out_ref);
            self.spent.insert(input.utxo.out_ref);
        }
        for (index, output) in (0u32..).zip(&tx.outputs) {
            let out_ref = OutRef::new(tx.hash, index);
            self.utxos.insert(
                out_ref,
                Utxo {
                    out_ref,
                    address: output.address.clone(),
                    value: output.value.clone(),
                    datum: output.datum.clone(),
                    script_ref: output.script_ref,
                },
            );
        }
        Ok(())
    }
}

/// Signed running balance of a transaction under construction.
#[derive(Debug, Default)]
struct Balance(BTreeMap<AssetId, i128>);

impl Balance {
    fn credit(&mut self, value: &Value) {
        for (asset, quantity) in value.iter() {
            *self.0.entry(asset.clone()).or_insert(0) += i128::from(quantity);
        }
    }

    fn debit(&mut self, value: &Value) {
        for (asset, quantity) in value.iter() {
            *self.0.entry(asset.clone()).or_insert(0) -= i128::from(quantity);
        }
    }

    fn apply_mint(&mut self, mint: &Mint) {
        for (name, quantity) in &mint.assets {
            let asset = AssetId::token(mint.policy, name.clone());
            *self.0.entry(asset).or_insert(0) += i128::from(*quantity);
        }
    }

    fn first_deficit(&self) -> Option<(AssetId, u64)> {
        self.0
            .iter()
            .find(|(_, q)| **q < 0)
            .map(|(asset, q)| (asset.clone(), u64::try_from(-*q).unwrap_or(u64::MAX)))
    }

    fn surplus(&self) -> Value {
        self.0
            .iter()
            .filter(|(_, q)| **q > 0)
            .map(|(asset, q)| (asset.clone(), u64::try_from(*q).unwrap_or(u64::MAX)))
            .collect()
    }
}

/// The in-memory ledger. Cloning shares state.
#[derive(Clone)]
pub struct Emulator {
    network: Network,
    fee: u64,
    evaluator: Arc<dyn ScriptEvaluator>,
    state: Arc<Mutex<LedgerState>>,
}

impl Emulator {
    /// A ledger enforcing the marketplace validator contract.
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self::with_evaluator(network, MarketplaceScripts)
    }

    /// A ledger with a custom script evaluator.
    #[must_use]
    pub fn with_evaluator(network: Network, evaluator: impl ScriptEvaluator + 'static) -> Self {
        Self {
            network,
            fee: DEFAULT_FEE,
            evaluator: Arc::new(evaluator),
            state: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    /// Override the flat transaction fee.
    #[must_use]
    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Network this ledger pretends to be.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Flat fee per transaction.
    #[must_use]
    pub const fn fee(&self) -> u64 {
        self.fee
    }

    /// Create a genesis output holding `value` at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if `address` is not a valid address for this network.
    pub async fn fund(&self, address: &str, value: Value) -> Result<OutRef> {
        let (network, _) = Address::decode_with_network(address)?;
        if network != self.network {
            return Err(LedgerError::network(format!(
                "cannot fund a {network} address on a {} ledger",
                self.network
            )));
        }

        let mut state = self.state.lock().await;
        let nonce = state.next_nonce();
        let out_ref = OutRef::new(TxHash::derive(GENESIS_CONTEXT, &[&nonce.to_le_bytes()]), 0);
        state.utxos.insert(
            out_ref,
            Utxo {
                out_ref,
                address: address.to_string(),
                value: value.clone(),
                datum: None,
                script_ref: None,
            },
        );

        info!(address = %address, out_ref = %out_ref, lovelace = value.coin(), "genesis output created");
        Ok(out_ref)
    }

    /// Connect a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet address cannot be encoded.
    pub fn connect(&self, wallet: Wallet) -> Result<EmulatorClient> {
        let address = wallet.bech32_address(self.network)?;
        Ok(EmulatorClient {
            emulator: self.clone(),
            wallet: Arc::new(wallet),
            address,
        })
    }

    /// Confirmed outputs at `address`.
    pub async fn utxos_at(&self, address: &str) -> Vec<Utxo> {
        let state = self.state.lock().await;
        state
            .utxos
            .values()
            .filter(|u| u.address == address)
            .cloned()
            .collect()
    }

    /// Every confirmed output.
    pub async fn all_utxos(&self) -> Vec<Utxo> {
        let state = self.state.lock().await;
        state.utxos.values().cloned().collect()
    }

    /// A confirmed output by reference.
    pub async fn utxo(&self, out_ref: &OutRef) -> Option<Utxo> {
        let state = self.state.lock().await;
        state.utxos.get(out_ref).cloned()
    }

    /// Sum of confirmed outputs at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the total overflows.
    pub async fn balance(&self, address: &str) -> Result<Value> {
        let mut total = Value::new();
        for utxo in self.utxos_at(address).await {
            total.merge(&utxo.value)?;
        }
        Ok(total)
    }

    /// Number of transactions waiting for a block.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.mempool.len()
    }

    /// Current block height.
    pub async fn height(&self) -> u64 {
        self.state.lock().await.height
    }

    /// Record of a submitted transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TxNotFound`] for unknown hashes.
    pub async fn tx_record(&self, hash: &TxHash) -> Result<TxRecord> {
        let state = self.state.lock().await;
        state.records.get(hash).cloned().ok_or_else(|| LedgerError::TxNotFound {
            hash: hash.to_string(),
        })
    }

    /// Apply every mempool transaction in submission order.
    pub async fn await_block(&self) -> BlockSummary {
        let mut state = self.state.lock().await;
        state.height += 1;
        let height = state.height;
        let pending = std::mem::take(&mut state.mempool);

        let mut summary = BlockSummary {
            height,
            ..BlockSummary::default()
        };
        for tx in pending {
            let outcome = state.apply(&tx);
            let Some(record) = state.records.get_mut(&tx.hash) else {
                continue;
            };
            match outcome {
                Ok(()) => {
                    record.mark_confirmed(height);
                    debug!(tx_hash = %tx.hash, label = %tx.label, height, "transaction confirmed");
                    summary.confirmed.push(tx.hash);
                }
                Err(err) => {
                    warn!(tx_hash = %tx.hash, label = %tx.label, error = %err, "transaction failed at confirmation");
                    record.mark_failed(err.clone());
                    summary.failed.push((tx.hash, err));
                }
            }
        }

        info!(
            height,
            confirmed = summary.confirmed.len(),
            failed = summary.failed.len(),
            "block applied"
        );
        summary
    }

    async fn submit_from(&self, wallet: &Wallet, wallet_address: &str, draft: TxDraft) -> Result<TxHash> {
        let mut state = self.state.lock().await;
        let label = draft.label.clone();

        match self.build(&mut state, wallet, wallet_address, draft) {
            Ok(tx) => {
                let hash = tx.hash;
                state.records.insert(hash, TxRecord::pending(hash, label.clone()));
                info!(
                    tx_hash = %hash,
                    label = %label,
                    inputs = tx.inputs.len(),
                    outputs = tx.outputs.len(),
                    "transaction accepted into mempool"
                );
                state.mempool.push(tx);
                Ok(hash)
            }
            Err(err) => {
                warn!(label = %label, error = %err, "transaction rejected at submission");
                Err(err)
            }
        }
    }

    fn build(&self, state: &mut LedgerState, wallet: &Wallet, wallet_address: &str, draft: TxDraft) -> Result<Transaction> {
        let nonce = state.next_nonce();

        let mut inputs = draft
            .inputs
            .iter()
            .map(|input| {
                Ok(ResolvedInput {
                    utxo: state.resolve_input(&input.out_ref)?,
                    redeemer: input.redeemer.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let reference_inputs = draft
            .reference_inputs
            .iter()
            .map(|out_ref| state.resolve_reference(out_ref))
            .collect::<Result<Vec<_>>>()?;

        let mut balance = Balance::default();
        for input in &inputs {
            balance.credit(&input.utxo.value);
        }
        for mint in &draft.mints {
            balance.apply_mint(mint);
        }
        for output in &draft.outputs {
            balance.debit(&output.value);
        }
        balance.debit(&Value::lovelace(self.fee));

        let locked = state.pending_inputs();
        let mut candidates: Vec<&Utxo> = state
            .utxos
            .values()
            .filter(|u| u.address == wallet_address)
            .filter(|u| !locked.contains(&u.out_ref))
            .filter(|u| !inputs.iter().any(|i| i.utxo.out_ref == u.out_ref))
            .collect();
        while let Some((asset, missing)) = balance.first_deficit() {
            let Some(position) = candidates.iter().position(|u| u.holds(&asset)) else {
                return Err(LedgerError::InsufficientFunds {
                    asset: asset.unit(),
                    missing,
                });
            };
            let utxo = candidates.remove(position).clone();
            balance.credit(&utxo.value);
            inputs.push(ResolvedInput { utxo, redeemer: None });
        }

        let mut outputs = draft.outputs;
        let change = balance.surplus();
        if !change.is_empty() {
            outputs.push(TxOutput {
                address: wallet_address.to_string(),
                value: change,
                datum: None,
                script_ref: None,
            });
        }

        let input_refs: Vec<OutRef> = inputs.iter().map(|i| i.utxo.out_ref).collect();
        let body = serde_json::to_vec(&(&input_refs, &draft.reference_inputs, &outputs, &draft.mints))?;
        let hash = TxHash::derive(TX_HASH_CONTEXT, &[&body, &nonce.to_le_bytes()]);

        let witness = wallet.witness(hash.as_bytes());
        let signatories = vec![witness.verify(hash.as_bytes())?];

        let tx = Transaction {
            hash,
            label: draft.label,
            inputs,
            reference_inputs,
            outputs,
            mints: draft.mints,
            scripts: draft.scripts,
            signatories,
            fee: self.fee,
        };

        check_witnesses(&tx, &draft.required_signers)?;
        self.run_scripts(&tx)?;
        Ok(tx)
    }

    fn run_scripts(&self, tx: &Transaction) -> Result<()> {
        let available: Vec<Script> = tx
            .scripts
            .iter()
            .copied()
            .chain(tx.reference_inputs.iter().filter_map(|u| u.script_ref))
            .chain(tx.inputs.iter().filter_map(|i| i.utxo.script_ref))
            .collect();
        let find = |hash: &ScriptHash| {
            available
                .iter()
                .find(|s| &s.hash() == hash)
                .copied()
                .ok_or_else(|| LedgerError::MissingScript { hash: hash.to_hex() })
        };

        for input in &tx.inputs {
            let Some(hash) = input.utxo.structured_address()?.payment.script_hash() else {
                continue;
            };
            let script = find(&hash)?;
            self.evaluator
                .evaluate(&script, ScriptPurpose::Spend(input), tx)
                .map_err(|reason| LedgerError::script_failure(script.name(), reason))?;
        }
        for mint in &tx.mints {
            let script = find(&mint.policy)?;
            self.evaluator
                .evaluate(&script, ScriptPurpose::Mint(mint), tx)
                .map_err(|reason| LedgerError::script_failure(script.name(), reason))?;
        }
        Ok(())
    }
}

fn check_witnesses(tx: &Transaction, required: &[KeyHash]) -> Result<()> {
    let missing = |key_hash: &KeyHash| LedgerError::MissingSignature {
        key_hash: key_hash.to_hex(),
    };
    if let Some(key_hash) = required.iter().find(|k| !tx.signed_by(k)) {
        return Err(missing(key_hash));
    }
    for input in &tx.inputs {
        if let Some(key_hash) = input.utxo.structured_address()?.payment_key_hash() {
            if !tx.signed_by(&key_hash) {
                return Err(missing(&key_hash));
            }
        }
    }
    Ok(())
}

/// A wallet connected to an [`Emulator`].
#[derive(Clone)]
pub struct EmulatorClient {
    emulator: Emulator,
    wallet: Arc<Wallet>,
    address: String,
}

impl EmulatorClient {
    /// The ledger behind this client.
    #[must_use]
    pub const fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    /// The connected wallet.
    #[must_use]
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }
}

impl LedgerClient for EmulatorClient {
    fn network(&self) -> Network {
        self.emulator.network
    }

    fn wallet_address(&self) -> String {
        self.address.clone()
    }

    async fn wallet_utxos(&self) -> Result<Vec<Utxo>> {
        Ok(self.emulator.utxos_at(&self.address).await)
    }

    async fn utxos_at(&self, address: &str) -> Result<Vec<Utxo>> {
        Ok(self.emulator.utxos_at(address).await)
    }

    async fn utxos_at_with_unit(&self, address: &str, unit: &AssetId) -> Result<Vec<Utxo>> {
        let mut utxos = self.emulator.utxos_at(address).await;
        utxos.retain(|u| u.holds(unit));
        Ok(utxos)
    }

    async fn utxo_by_ref(&self, out_ref: &OutRef) -> Result<Option<Utxo>> {
        Ok(self.emulator.utxo(out_ref).await)
    }

    async fn submit(&self, draft: TxDraft) -> Result<TxHash> {
        self.emulator.submit_from(&self.wallet, &self.address, draft).await
    }

    async fn await_tx(&self, hash: &TxHash) -> Result<()> {
        if let Some(outcome) = self.emulator.tx_record(hash).await?.outcome() {
            return outcome;
        }
        self.emulator.await_block().await;
        self.emulator
            .tx_record(hash)
            .await?
            .outcome()
            .unwrap_or_else(|| Err(LedgerError::network(format!("transaction {hash} still pending"))))
    }
}
