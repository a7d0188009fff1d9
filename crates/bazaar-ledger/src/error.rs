//! Error types for ledger operations.

use bazaar_core::CoreError;
use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors reported by the ledger client or the ledger itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// An input refers to an output the ledger has never seen.
    #[error("unknown input: {out_ref}")]
    UnknownInput {
        /// The unresolved output reference.
        out_ref: String,
    },

    /// An input was consumed by an earlier transaction.
    #[error("input already spent: {out_ref}")]
    InputAlreadySpent {
        /// The consumed output reference.
        out_ref: String,
    },

    /// A reference input no longer exists.
    #[error("missing reference input: {out_ref}")]
    MissingReferenceInput {
        /// The vanished output reference.
        out_ref: String,
    },

    /// A script rejected the transaction.
    #[error("failed script execution: {script}: {reason}")]
    ScriptFailure {
        /// Which script failed.
        script: String,
        /// What the script objected to.
        reason: String,
    },

    /// A script-locked input or mint had no script available.
    #[error("missing script: {hash}")]
    MissingScript {
        /// Hash of the script that was needed.
        hash: String,
    },

    /// A required signer did not witness the transaction.
    #[error("missing signature: {key_hash}")]
    MissingSignature {
        /// Key hash whose signature is missing.
        key_hash: String,
    },

    /// The wallet cannot cover outputs and fee.
    #[error("insufficient funds: missing {missing} of {asset}")]
    InsufficientFunds {
        /// Unit of the short asset.
        asset: String,
        /// Amount short.
        missing: u64,
    },

    /// An inline datum or redeemer could not be encoded or decoded.
    #[error("datum error: {message}")]
    Datum {
        /// Description of the datum error.
        message: String,
    },

    /// Transaction hash not known to the ledger.
    #[error("transaction not found: {hash}")]
    TxNotFound {
        /// The unknown hash.
        hash: String,
    },

    /// Network or provider failure.
    #[error("network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Wallet key material is invalid.
    #[error("wallet error: {message}")]
    Wallet {
        /// Description of the wallet error.
        message: String,
    },

    /// Primitive codec error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl LedgerError {
    /// Create a script failure error.
    #[must_use]
    pub fn script_failure(script: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ScriptFailure {
            script: script.into(),
            reason: reason.into(),
        }
    }

    /// Create a datum error.
    #[must_use]
    pub fn datum(message: impl Into<String>) -> Self {
        Self::Datum {
            message: message.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// True if the ledger refused a submitted transaction.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnknownInput { .. }
                | Self::InputAlreadySpent { .. }
                | Self::MissingReferenceInput { .. }
                | Self::ScriptFailure { .. }
                | Self::MissingScript { .. }
                | Self::MissingSignature { .. }
                | Self::InsufficientFunds { .. }
        )
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::datum(err.to_string())
    }
}
