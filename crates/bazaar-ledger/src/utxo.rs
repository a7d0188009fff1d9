//! Unspent outputs and inline data.

use bazaar_core::{Address, AssetId, OutRef, Script, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Structured data attached to an output or passed as a redeemer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineData(serde_json::Value);

impl InlineData {
    /// Encode a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Datum`] if the record cannot be serialized.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self(serde_json::to_value(value)?))
    }

    /// Decode against a schema.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Datum`] if the data does not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.0.clone())?)
    }

    /// Wrap an arbitrary document.
    #[must_use]
    pub const fn raw(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The underlying document.
    #[must_use]
    pub const fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// An unspent transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Where this output lives on the ledger.
    pub out_ref: OutRef,
    /// Bech32 address holding the output.
    pub address: String,
    /// Assets held.
    pub value: Value,
    /// Inline datum, if any.
    pub datum: Option<InlineData>,
    /// Script stored for use by reference, if any.
    pub script_ref: Option<Script>,
}

impl Utxo {
    /// Decode the inline datum against a schema.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Datum`] if there is no datum or it does not fit `T`.
    pub fn inline_datum<T: DeserializeOwned>(&self) -> Result<T> {
        self.datum
            .as_ref()
            .ok_or_else(|| LedgerError::datum(format!("output {} carries no inline datum", self.out_ref)))?
            .decode()
    }

    /// Structured form of the holding address.
    ///
    /// # Errors
    ///
    /// Propagates codec errors.
    pub fn structured_address(&self) -> Result<Address> {
        Ok(Address::from_bech32(&self.address)?)
    }

    /// True if this output holds at least one unit of `asset`.
    #[must_use]
    pub fn holds(&self, asset: &AssetId) -> bool {
        self.value.quantity_of(asset) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{ConfigDatum, Credential, KeyHash, Network, TxHash};

    fn utxo(datum: Option<InlineData>) -> Utxo {
        let address = Address::enterprise(Credential::VerificationKey(KeyHash::new([4; 28])));
        Utxo {
            out_ref: OutRef::new(TxHash::new([1; 32]), 0),
            address: address.to_bech32(Network::Testnet).unwrap(),
            value: Value::lovelace(5),
            datum,
            script_ref: None,
        }
    }

    #[test]
    fn test_inline_datum_roundtrip() {
        let fee_address = Address::enterprise(Credential::VerificationKey(KeyHash::new([2; 28])));
        let config = ConfigDatum::new(fee_address, vec![]).unwrap();
        let out = utxo(Some(InlineData::encode(&config).unwrap()));
        assert_eq!(out.inline_datum::<ConfigDatum>().unwrap(), config);
    }

    #[test]
    fn test_missing_datum() {
        let err = utxo(None).inline_datum::<ConfigDatum>().unwrap_err();
        assert!(matches!(err, LedgerError::Datum { .. }));
    }

    #[test]
    fn test_schema_mismatch() {
        let out = utxo(Some(InlineData::raw(serde_json::json!({ "garbage": true }))));
        assert!(out.inline_datum::<ConfigDatum>().is_err());
    }

    #[test]
    fn test_holds_and_address() {
        let out = utxo(None);
        assert!(out.holds(&AssetId::Lovelace));
        assert_eq!(out.structured_address().unwrap().payment_key_hash(), Some(KeyHash::new([4; 28])));
    }
}
