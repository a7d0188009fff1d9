//! Transaction descriptions, balanced transactions, and submission records.
//!
//! Callers describe intent with a [`TxDraft`]. The ledger client resolves the
//! draft's inputs against ledger truth, balances it from the connected wallet,
//! signs it, and produces a [`Transaction`].

use std::collections::BTreeMap;
use std::fmt;

use bazaar_core::{Address, AssetId, AssetName, KeyHash, OutRef, PolicyId, Script, ScriptHash, TxHash, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::utxo::{InlineData, Utxo};

/// Input chosen by the caller, optionally with a redeemer for script spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Output to consume.
    pub out_ref: OutRef,
    /// Redeemer handed to the guarding script.
    pub redeemer: Option<InlineData>,
}

/// Output to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Bech32 destination address.
    pub address: String,
    /// Assets sent.
    pub value: Value,
    /// Inline datum, if any.
    pub datum: Option<InlineData>,
    /// Script stored for use by reference, if any.
    pub script_ref: Option<Script>,
}

impl TxOutput {
    /// Structured destination address.
    ///
    /// # Errors
    ///
    /// Propagates codec errors.
    pub fn structured_address(&self) -> Result<Address> {
        Ok(Address::from_bech32(&self.address)?)
    }
}

/// Mint (positive) or burn (negative) of assets under one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    /// Minting policy.
    pub policy: PolicyId,
    /// Quantity change per asset name.
    pub assets: BTreeMap<AssetName, i64>,
    /// Redeemer for the policy script.
    pub redeemer: InlineData,
}

/// A transaction description prior to balancing and signing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDraft {
    /// Short label used in logs and records.
    pub label: String,
    /// Inputs chosen by the caller.
    pub inputs: Vec<TxInput>,
    /// Outputs cited for validation without being consumed.
    pub reference_inputs: Vec<OutRef>,
    /// Outputs to create.
    pub outputs: Vec<TxOutput>,
    /// Mints and burns.
    pub mints: Vec<Mint>,
    /// Scripts attached directly to the transaction.
    pub scripts: Vec<Script>,
    /// Keys that must witness the transaction.
    pub required_signers: Vec<KeyHash>,
}

impl TxDraft {
    /// Start an empty draft.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Consume `utxos`, all spent with the same redeemer.
    #[must_use]
    pub fn collect_from<'a>(
        mut self,
        utxos: impl IntoIterator<Item = &'a Utxo>,
        redeemer: Option<&InlineData>,
    ) -> Self {
        for utxo in utxos {
            if self.inputs.iter().any(|i| i.out_ref == utxo.out_ref) {
                continue;
            }
            self.inputs.push(TxInput {
                out_ref: utxo.out_ref,
                redeemer: redeemer.cloned(),
            });
        }
        self
    }

    /// Cite `utxo` as a reference input.
    #[must_use]
    pub fn read_from(mut self, utxo: &Utxo) -> Self {
        if !self.reference_inputs.contains(&utxo.out_ref) {
            self.reference_inputs.push(utxo.out_ref);
        }
        self
    }

    /// Pay `value` to a plain address.
    #[must_use]
    pub fn pay_to(mut self, address: impl Into<String>, value: Value) -> Self {
        self.outputs.push(TxOutput {
            address: address.into(),
            value,
            datum: None,
            script_ref: None,
        });
        self
    }

    /// Pay `value` to a script address with an inline datum.
    #[must_use]
    pub fn pay_to_contract(mut self, address: impl Into<String>, datum: InlineData, value: Value) -> Self {
        self.outputs.push(TxOutput {
            address: address.into(),
            value,
            datum: Some(datum),
            script_ref: None,
        });
        self
    }

    /// Like [`TxDraft::pay_to_contract`], also storing `script` for reference use.
    #[must_use]
    pub fn pay_to_contract_with_script(
        mut self,
        address: impl Into<String>,
        datum: InlineData,
        value: Value,
        script: Script,
    ) -> Self {
        self.outputs.push(TxOutput {
            address: address.into(),
            value,
            datum: Some(datum),
            script_ref: Some(script),
        });
        self
    }

    /// Mint or burn assets under `policy`.
    #[must_use]
    pub fn mint(mut self, policy: PolicyId, assets: impl IntoIterator<Item = (AssetName, i64)>, redeemer: InlineData) -> Self {
        self.mints.push(Mint {
            policy,
            assets: assets.into_iter().collect(),
            redeemer,
        });
        self
    }

    /// Attach a script the transaction runs.
    #[must_use]
    pub fn attach_script(mut self, script: Script) -> Self {
        if !self.scripts.contains(&script) {
            self.scripts.push(script);
        }
        self
    }

    /// Require a signature from `key_hash`.
    #[must_use]
    pub fn add_signer(mut self, key_hash: KeyHash) -> Self {
        if !self.required_signers.contains(&key_hash) {
            self.required_signers.push(key_hash);
        }
        self
    }
}

/// An input resolved against ledger truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInput {
    /// The consumed output.
    pub utxo: Utxo,
    /// Redeemer supplied for it.
    pub redeemer: Option<InlineData>,
}

/// A balanced, signed transaction as validators see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id.
    pub hash: TxHash,
    /// Label copied from the draft.
    pub label: String,
    /// All consumed outputs, including wallet inputs added by balancing.
    pub inputs: Vec<ResolvedInput>,
    /// Outputs cited without being consumed.
    pub reference_inputs: Vec<Utxo>,
    /// Created outputs, including change.
    pub outputs: Vec<TxOutput>,
    /// Mints and burns.
    pub mints: Vec<Mint>,
    /// Scripts attached directly.
    pub scripts: Vec<Script>,
    /// Keys whose signatures verified.
    pub signatories: Vec<KeyHash>,
    /// Fee paid in the native unit.
    pub fee: u64,
}

impl Transaction {
    /// Net quantity minted under `policy` per asset name.
    #[must_use]
    pub fn minted(&self, policy: &PolicyId) -> BTreeMap<AssetName, i64> {
        let mut out = BTreeMap::new();
        for mint in self.mints.iter().filter(|m| &m.policy == policy) {
            for (name, qty) in &mint.assets {
                *out.entry(name.clone()).or_insert(0) += qty;
            }
        }
        out.retain(|_, qty| *qty != 0);
        out
    }

    /// True if `key_hash` witnessed the transaction.
    #[must_use]
    pub fn signed_by(&self, key_hash: &KeyHash) -> bool {
        self.signatories.contains(key_hash)
    }

    /// Inputs whose payment credential is the script `hash`.
    pub fn inputs_locked_by<'a>(&'a self, hash: &'a ScriptHash) -> impl Iterator<Item = &'a ResolvedInput> + 'a {
        self.inputs.iter().filter(move |input| {
            input
                .utxo
                .structured_address()
                .is_ok_and(|a| a.payment.script_hash().as_ref() == Some(hash))
        })
    }

    /// Outputs paid to exactly `address`.
    pub fn outputs_to<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a TxOutput> + 'a {
        self.outputs
            .iter()
            .filter(move |output| output.structured_address().is_ok_and(|a| &a == address))
    }

    /// Total of `asset` paid to exactly `address`.
    #[must_use]
    pub fn paid_to(&self, address: &Address, asset: &AssetId) -> u64 {
        self.outputs_to(address)
            .map(|output| output.value.quantity_of(asset))
            .fold(0u64, u64::saturating_add)
    }

    /// Reference inputs holding `asset`.
    pub fn reference_inputs_holding<'a>(&'a self, asset: &'a AssetId) -> impl Iterator<Item = &'a Utxo> + 'a {
        self.reference_inputs.iter().filter(move |u| u.holds(asset))
    }
}

/// Lifecycle of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Accepted into the mempool, not yet in a block.
    Pending,
    /// Included in a block.
    Confirmed,
    /// Rejected at confirmation time.
    Failed,
}

impl TxStatus {
    /// Check if the transaction is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What the ledger remembers about a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
    /// Transaction id.
    pub hash: TxHash,
    /// Draft label.
    pub label: String,
    /// Current status.
    pub status: TxStatus,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Block height it landed in, once confirmed.
    pub block: Option<u64>,
    /// Rejection reason, once failed.
    pub error: Option<LedgerError>,
}

impl TxRecord {
    /// A freshly submitted record.
    #[must_use]
    pub fn pending(hash: TxHash, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            hash,
            label: label.into(),
            status: TxStatus::Pending,
            submitted_at: now,
            updated_at: now,
            block: None,
            error: None,
        }
    }

    /// Mark as included in `block`.
    pub fn mark_confirmed(&mut self, block: u64) {
        self.status = TxStatus::Confirmed;
        self.block = Some(block);
        self.updated_at = Utc::now();
    }

    /// Mark as rejected at confirmation.
    pub fn mark_failed(&mut self, error: LedgerError) {
        self.status = TxStatus::Failed;
        self.error = Some(error);
        self.updated_at = Utc::now();
    }

    /// The outcome, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Result<()>> {
        match self.status {
            TxStatus::Pending => None,
            TxStatus::Confirmed => Some(Ok(())),
            TxStatus::Failed => Some(Err(self
                .error
                .clone()
                .unwrap_or_else(|| LedgerError::network("transaction failed without a recorded reason")))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{ControlAction, Credential, Network};

    fn utxo(index: u32) -> Utxo {
        Utxo {
            out_ref: OutRef::new(TxHash::new([2; 32]), index),
            address: Address::enterprise(Credential::VerificationKey(KeyHash::new([1; 28])))
                .to_bech32(Network::Testnet)
                .unwrap(),
            value: Value::lovelace(10),
            datum: None,
            script_ref: None,
        }
    }

    #[test]
    fn test_draft_builder_deduplicates() {
        let a = utxo(0);
        let signer = KeyHash::new([9; 28]);
        let script = Script::ConfigValidator {
            control_policy: PolicyId::new([3; 28]),
        };
        let draft = TxDraft::new("test")
            .collect_from([&a, &a], None)
            .read_from(&a)
            .read_from(&a)
            .attach_script(script)
            .attach_script(script)
            .add_signer(signer)
            .add_signer(signer);

        assert_eq!(draft.inputs.len(), 1);
        assert_eq!(draft.reference_inputs.len(), 1);
        assert_eq!(draft.scripts.len(), 1);
        assert_eq!(draft.required_signers, vec![signer]);
    }

    #[test]
    fn test_minted_nets_per_policy() {
        let policy = PolicyId::new([5; 28]);
        let name = AssetName::from_text("Ownership").unwrap();
        let redeemer = InlineData::encode(&ControlAction::Initialize).unwrap();
        let draft = TxDraft::new("mint")
            .mint(policy, [(name.clone(), 2)], redeemer.clone())
            .mint(policy, [(name.clone(), -1)], redeemer.clone())
            .mint(PolicyId::new([6; 28]), [(name.clone(), 7)], redeemer);
        let tx = Transaction {
            hash: TxHash::new([0; 32]),
            label: draft.label,
            inputs: vec![],
            reference_inputs: vec![],
            outputs: draft.outputs,
            mints: draft.mints,
            scripts: vec![],
            signatories: vec![],
            fee: 0,
        };
        let minted = tx.minted(&policy);
        assert_eq!(minted.get(&name), Some(&1));
        assert_eq!(minted.len(), 1);
    }

    #[test]
    fn test_paid_to_sums_outputs() {
        let address = Address::enterprise(Credential::VerificationKey(KeyHash::new([8; 28])));
        let bech = address.to_bech32(Network::Testnet).unwrap();
        let draft = TxDraft::new("pay")
            .pay_to(bech.clone(), Value::lovelace(3))
            .pay_to(bech, Value::lovelace(4));
        let tx = Transaction {
            hash: TxHash::new([0; 32]),
            label: draft.label,
            inputs: vec![],
            reference_inputs: vec![],
            outputs: draft.outputs,
            mints: vec![],
            scripts: vec![],
            signatories: vec![],
            fee: 0,
        };
        assert_eq!(tx.paid_to(&address, &AssetId::Lovelace), 7);
    }

    #[test]
    fn test_record_transitions() {
        let mut record = TxRecord::pending(TxHash::new([1; 32]), "buy");
        assert!(record.outcome().is_none());
        assert!(!record.status.is_terminal());

        record.mark_failed(LedgerError::InputAlreadySpent { out_ref: "x#0".into() });
        assert_eq!(record.status, TxStatus::Failed);
        assert!(matches!(record.outcome(), Some(Err(LedgerError::InputAlreadySpent { .. }))));

        let mut ok = TxRecord::pending(TxHash::new([2; 32]), "list");
        ok.mark_confirmed(3);
        assert_eq!(ok.block, Some(3));
        assert!(matches!(ok.outcome(), Some(Ok(()))));
    }
}
