//! Error types for bazaar-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors produced by the marketplace primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Fee rate outside `[0, 10000]` basis points.
    #[error("invalid fee rate: {rate_bps} bps (must be within 0..=10000)")]
    InvalidRate {
        /// The rejected rate.
        rate_bps: u64,
    },

    /// The address is well-formed but of a kind the codec does not handle.
    #[error("unsupported address form: {kind}")]
    UnsupportedAddressForm {
        /// Human-readable address kind (e.g. `bootstrap`, `reward`).
        kind: String,
    },

    /// The address could not be parsed at all.
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Description of the address error.
        message: String,
    },

    /// A hex-encoded value was malformed or had the wrong length.
    #[error("invalid hex: {message}")]
    InvalidHex {
        /// Description of the hex error.
        message: String,
    },

    /// An asset unit or asset name could not be parsed.
    #[error("invalid asset: {message}")]
    InvalidAsset {
        /// Description of the asset error.
        message: String,
    },

    /// A marketplace configuration violated its construction rules.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of the config error.
        message: String,
    },

    /// An instance identifier could not be parsed.
    #[error("invalid instance id: {message}")]
    InvalidInstanceId {
        /// Description of the instance id error.
        message: String,
    },

    /// Quantity arithmetic overflowed.
    #[error("quantity overflow while {context}")]
    Overflow {
        /// What was being computed.
        context: String,
    },
}

impl CoreError {
    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }

    /// Create an unsupported address form error.
    #[must_use]
    pub fn unsupported_address(kind: impl Into<String>) -> Self {
        Self::UnsupportedAddressForm { kind: kind.into() }
    }

    /// Create an invalid hex error.
    #[must_use]
    pub fn invalid_hex(message: impl Into<String>) -> Self {
        Self::InvalidHex {
            message: message.into(),
        }
    }

    /// Create an invalid asset error.
    #[must_use]
    pub fn invalid_asset(message: impl Into<String>) -> Self {
        Self::InvalidAsset {
            message: message.into(),
        }
    }

    /// Create an invalid config error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an overflow error.
    #[must_use]
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::Overflow {
            context: context.into(),
        }
    }
}
