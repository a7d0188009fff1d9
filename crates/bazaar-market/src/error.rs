//! Error types for bazaar-market.

use bazaar_core::CoreError;
use bazaar_ledger::LedgerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Broad class of a failure, deciding how callers react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Detected before submission; fix the request.
    Precondition,
    /// The ledger refused a submitted transaction.
    LedgerRejection,
    /// Ledger state violates a marketplace invariant. Fatal.
    Consistency,
}

/// Errors that can occur in marketplace operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Primitive validation failed (invalid rate, unsupported address, bad asset).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No config output exists; expected after shutdown.
    #[error("marketplace config not found")]
    ConfigMissing,

    /// More than one output holds the Config token.
    #[error("found {count} config outputs, expected exactly one")]
    MultipleConfigUtxos {
        /// How many were found.
        count: usize,
    },

    /// No listing holds the asset.
    #[error("listing not found for {unit}")]
    ListingNotFound {
        /// Unit of the listed asset.
        unit: String,
    },

    /// A listing's inline datum did not decode.
    #[error("malformed datum at {out_ref}: {message}")]
    MalformedDatum {
        /// Output carrying the datum.
        out_ref: String,
        /// Decoder complaint.
        message: String,
    },

    /// A listing datum names an asset its output does not hold exactly once.
    #[error("listing at {out_ref} does not hold {unit}")]
    UnbackedListing {
        /// Output carrying the datum.
        out_ref: String,
        /// Unit the datum names.
        unit: String,
    },

    /// The config has no fee rule for the listing's price asset.
    #[error("no fee rule for asset {unit}")]
    NoFeeRuleForAsset {
        /// Unit of the price asset.
        unit: String,
    },

    /// The client has no instance to act on.
    #[error("marketplace not initialized")]
    NotInitialized,

    /// The client already manages an instance.
    #[error("marketplace already initialized as {instance_id}")]
    AlreadyInitialized {
        /// Existing instance id.
        instance_id: String,
    },

    /// The wallet has no output to seed the control policy.
    #[error("wallet has no spendable output")]
    NoSpendableUtxo,

    /// The wallet does not hold the asset it tried to list.
    #[error("wallet does not hold {unit}")]
    NftNotInWallet {
        /// Unit of the missing asset.
        unit: String,
    },

    /// The wallet does not hold the Ownership token.
    #[error("ownership token not held by wallet")]
    OwnershipTokenMissing,

    /// The signer's payment credential is a script, which cannot sign.
    #[error("address {address} has no key credential to sign with")]
    SignerNotKeyCredential {
        /// The offending address.
        address: String,
    },

    /// The wallet is not the listing's seller.
    #[error("wallet is not the seller of {unit}")]
    WrongSigner {
        /// Unit of the listed asset.
        unit: String,
    },

    /// Ledger client or ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MarketError {
    /// Create a malformed datum error.
    #[must_use]
    pub fn malformed_datum(out_ref: impl ToString, message: impl Into<String>) -> Self {
        Self::MalformedDatum {
            out_ref: out_ref.to_string(),
            message: message.into(),
        }
    }

    /// Class of this failure.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MultipleConfigUtxos { .. } => ErrorClass::Consistency,
            Self::Ledger(err) if err.is_rejection() => ErrorClass::LedgerRejection,
            _ => ErrorClass::Precondition,
        }
    }

    /// True when the failure stems from the config output being absent,
    /// whether noticed locally or by the ledger.
    #[must_use]
    pub const fn is_missing_reference_input(&self) -> bool {
        matches!(
            self,
            Self::ConfigMissing | Self::Ledger(LedgerError::MissingReferenceInput { .. })
        )
    }
}
