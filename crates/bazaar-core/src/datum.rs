//! On-chain records: the Listing and Config datums, and the redeemers each
//! script accepts.
//!
//! Field names and shapes are the canonical persisted layout. They carry no
//! version tag; a layout change requires a new marketplace instance.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::asset::{AssetId, AssetName};
use crate::error::{CoreError, Result};
use crate::fee::{compute_split, validate_rate, FeeSplit};
use crate::hash::PolicyId;

/// Inline datum of a listing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDatum {
    /// Who receives the sale proceeds and may edit or delist.
    pub seller: Address,
    /// Price asset policy hex; empty for the native unit.
    pub price_policy: String,
    /// Price asset name hex; empty for the native unit.
    pub price_name: String,
    /// Asking price in the price asset's smallest unit.
    pub price_amount: u64,
    /// Policy of the listed NFT.
    pub nft_policy: PolicyId,
    /// Asset name of the listed NFT.
    pub nft_name: AssetName,
}

impl ListingDatum {
    /// Build a listing datum for `nft` priced at `price_amount` of `price_asset`.
    ///
    /// # Errors
    ///
    /// Returns an error if `nft` is the native unit.
    pub fn new(seller: Address, price_asset: &AssetId, price_amount: u64, nft: &AssetId) -> Result<Self> {
        let AssetId::Token { policy, name } = nft else {
            return Err(CoreError::invalid_asset("the native unit cannot be listed"));
        };
        let (price_policy, price_name) = price_asset.to_pair();
        Ok(Self {
            seller,
            price_policy,
            price_name,
            price_amount,
            nft_policy: *policy,
            nft_name: name.clone(),
        })
    }

    /// The asset the listing is priced in.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored pair is malformed.
    pub fn price_asset(&self) -> Result<AssetId> {
        AssetId::from_pair(&self.price_policy, &self.price_name)
    }

    /// The listed NFT.
    #[must_use]
    pub fn nft(&self) -> AssetId {
        AssetId::token(self.nft_policy, self.nft_name.clone())
    }

    /// Same listing at a different price.
    #[must_use]
    pub fn with_price(&self, price_amount: u64) -> Self {
        Self {
            price_amount,
            ..self.clone()
        }
    }
}

/// One row of the fee table: the rate charged on sales priced in an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFee {
    /// Price asset policy hex; empty for the native unit.
    pub policy: String,
    /// Price asset name hex; empty for the native unit.
    pub name: String,
    /// Fee rate in basis points.
    pub fee_bps: u64,
}

impl TokenFee {
    /// A fee row for `asset`.
    #[must_use]
    pub fn new(asset: &AssetId, fee_bps: u64) -> Self {
        let (policy, name) = asset.to_pair();
        Self { policy, name, fee_bps }
    }

    /// True if this row prices exactly the `(policy, name)` pair.
    #[must_use]
    pub fn matches(&self, policy: &str, name: &str) -> bool {
        self.policy == policy && self.name == name
    }
}

/// Inline datum of the config output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDatum {
    /// Recipient of marketplace fees.
    pub fee_address: Address,
    /// Ordered fee table, at most one row per price asset.
    pub token_fees: Vec<TokenFee>,
}

impl ConfigDatum {
    /// Build a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRate`] for a rate above 10000 bps and
    /// [`CoreError::InvalidConfig`] for duplicate or malformed price assets.
    pub fn new(fee_address: Address, token_fees: Vec<TokenFee>) -> Result<Self> {
        let config = Self { fee_address, token_fees };
        config.validate()?;
        Ok(config)
    }

    /// Check rates and uniqueness of the fee table.
    ///
    /// # Errors
    ///
    /// See [`ConfigDatum::new`].
    pub fn validate(&self) -> Result<()> {
        for (i, row) in self.token_fees.iter().enumerate() {
            validate_rate(row.fee_bps)?;
            AssetId::from_pair(&row.policy, &row.name)?;
            if self.token_fees[..i].iter().any(|earlier| earlier.matches(&row.policy, &row.name)) {
                return Err(CoreError::invalid_config(format!(
                    "duplicate fee rule for asset ({:?}, {:?})",
                    row.policy, row.name
                )));
            }
        }
        Ok(())
    }

    /// Rate for sales priced in `(policy, name)`. Exact match only.
    #[must_use]
    pub fn fee_rate(&self, policy: &str, name: &str) -> Option<u64> {
        self.token_fees
            .iter()
            .find(|row| row.matches(policy, name))
            .map(|row| row.fee_bps)
    }

    /// Fee split for a listing, or `None` if its price asset has no rule.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRate`] if the stored rate is out of range.
    pub fn split_for(&self, listing: &ListingDatum) -> Result<Option<FeeSplit>> {
        self.fee_rate(&listing.price_policy, &listing.price_name)
            .map(|rate| compute_split(listing.price_amount, rate))
            .transpose()
    }
}

/// Redeemer for spending a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketplaceAction {
    /// Purchase the listed NFT.
    Buy,
    /// Withdraw the listing.
    Delist,
    /// Change the asking price.
    Edit {
        /// Replacement price.
        new_price: u64,
    },
}

/// Redeemer for spending the config output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigAction {
    /// Replace the config datum.
    Updating,
    /// Destroy the config as part of shutdown.
    Burning,
}

/// Redeemer for the control-token minting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Mint the Config and Ownership tokens.
    Initialize,
    /// Burn the Config and Ownership tokens.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Credential;
    use crate::hash::KeyHash;

    fn seller() -> Address {
        Address::enterprise(Credential::VerificationKey(KeyHash::new([1; 28])))
    }

    fn mane() -> AssetId {
        AssetId::token(
            PolicyId::from_hex("a90d1702625ee4ebcee3b3649708cbcbb163f50db9663308acc9650e").unwrap(),
            AssetName::from_text("MANE").unwrap(),
        )
    }

    fn nft() -> AssetId {
        AssetId::token(PolicyId::new([3; 28]), AssetName::from_text("MyNFT1").unwrap())
    }

    #[test]
    fn test_listing_roundtrip_assets() {
        let datum = ListingDatum::new(seller(), &mane(), 10_000_000_000, &nft()).unwrap();
        assert_eq!(datum.price_asset().unwrap(), mane());
        assert_eq!(datum.nft(), nft());

        let ada = ListingDatum::new(seller(), &AssetId::Lovelace, 10_000_000, &nft()).unwrap();
        assert_eq!(ada.price_policy, "");
        assert_eq!(ada.price_name, "");
        assert_eq!(ada.price_asset().unwrap(), AssetId::Lovelace);
    }

    #[test]
    fn test_cannot_list_lovelace() {
        assert!(ListingDatum::new(seller(), &mane(), 1, &AssetId::Lovelace).is_err());
    }

    #[test]
    fn test_with_price_only_changes_price() {
        let datum = ListingDatum::new(seller(), &mane(), 10, &nft()).unwrap();
        let edited = datum.with_price(25);
        assert_eq!(edited.price_amount, 25);
        assert_eq!(edited.with_price(10), datum);
    }

    #[test]
    fn test_fee_lookup_exact_match() {
        let config = ConfigDatum::new(
            seller(),
            vec![TokenFee::new(&mane(), 500), TokenFee::new(&AssetId::Lovelace, 700)],
        )
        .unwrap();
        let (p, n) = mane().to_pair();
        assert_eq!(config.fee_rate(&p, &n), Some(500));
        assert_eq!(config.fee_rate("", ""), Some(700));
        assert_eq!(config.fee_rate(&p, ""), None);
    }

    #[test]
    fn test_split_for_listing() {
        let config = ConfigDatum::new(seller(), vec![TokenFee::new(&mane(), 500)]).unwrap();
        let listing = ListingDatum::new(seller(), &mane(), 10_000_000_000, &nft()).unwrap();
        let split = config.split_for(&listing).unwrap().unwrap();
        assert_eq!(split.fee, 500_000_000);

        let unpriced = ListingDatum::new(seller(), &AssetId::Lovelace, 10, &nft()).unwrap();
        assert!(config.split_for(&unpriced).unwrap().is_none());
    }

    #[test]
    fn test_config_rejects_bad_rate() {
        let err = ConfigDatum::new(seller(), vec![TokenFee::new(&mane(), 10_001)]).unwrap_err();
        assert_eq!(err, CoreError::InvalidRate { rate_bps: 10_001 });
    }

    #[test]
    fn test_config_rejects_duplicate_asset() {
        let err = ConfigDatum::new(
            seller(),
            vec![TokenFee::new(&AssetId::Lovelace, 100), TokenFee::new(&AssetId::Lovelace, 200)],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_redeemer_encoding() {
        assert_eq!(serde_json::to_value(MarketplaceAction::Buy).unwrap(), serde_json::json!("buy"));
        assert_eq!(
            serde_json::to_value(MarketplaceAction::Edit { new_price: 5 }).unwrap(),
            serde_json::json!({ "edit": { "new_price": 5 } })
        );
        assert_eq!(serde_json::to_value(ConfigAction::Burning).unwrap(), serde_json::json!("burning"));
        assert_eq!(serde_json::to_value(ControlAction::Initialize).unwrap(), serde_json::json!("initialize"));
    }
}
