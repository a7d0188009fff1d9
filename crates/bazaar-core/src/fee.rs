//! Marketplace fee arithmetic.
//!
//! Splits a listing price into the marketplace fee and the seller's share.
//!
//! # Precision Guarantees
//!
//! - **No floating-point**: integer arithmetic only
//! - **No overflow**: the product `price × rate` is computed in `u128`, which
//!   holds `u64::MAX × 10_000` with room to spare
//! - **Truncating division**: `fee = floor(price × rate_bps / 10_000)`, the same
//!   result the on-chain validator derives
//!
//! The seller's share is always `price - fee`, so `fee + seller_amount == price`
//! holds for every valid input.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// The result of splitting a price between the fee recipient and the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Amount paid to the marketplace fee address.
    pub fee: u64,
    /// Amount paid to the seller.
    pub seller_amount: u64,
}

impl FeeSplit {
    /// The original price (`fee + seller_amount`), saturating at `u64::MAX`
    /// for splits not produced by [`compute_split`].
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.fee.saturating_add(self.seller_amount)
    }
}

/// Checks that a rate is within `[0, 10000]` basis points.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRate`] for rates above [`BPS_DENOMINATOR`].
pub fn validate_rate(rate_bps: u64) -> Result<u64> {
    if rate_bps > BPS_DENOMINATOR {
        return Err(CoreError::InvalidRate { rate_bps });
    }
    Ok(rate_bps)
}

/// Splits `price` into fee and seller amount at `rate_bps`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRate`] if `rate_bps` exceeds 10000.
///
/// # Examples
/// ```
/// use bazaar_core::fee::compute_split;
///
/// // 5% of 10,000 MANE-units
/// let split = compute_split(10_000_000_000, 500).unwrap();
/// assert_eq!(split.fee, 500_000_000);
/// assert_eq!(split.seller_amount, 9_500_000_000);
///
/// // 7% of 10 ADA in lovelace
/// let split = compute_split(10_000_000, 700).unwrap();
/// assert_eq!(split.fee, 700_000);
/// assert_eq!(split.seller_amount, 9_300_000);
/// ```
pub fn compute_split(price: u64, rate_bps: u64) -> Result<FeeSplit> {
    let rate_bps = validate_rate(rate_bps)?;

    let fee_u128 = u128::from(price) * u128::from(rate_bps) / u128::from(BPS_DENOMINATOR);
    // rate_bps <= 10_000 means fee <= price, so this never fails.
    let fee = u64::try_from(fee_u128).map_err(|_| CoreError::overflow("computing the fee"))?;

    Ok(FeeSplit {
        fee,
        seller_amount: price - fee,
    })
}
