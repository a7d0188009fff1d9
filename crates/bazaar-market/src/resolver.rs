//! Locating the config output and listings on the ledger.
//!
//! Resolution always reads fresh ledger state; nothing is cached between
//! operations, so a listing bought by someone else simply disappears.

use bazaar_core::{AssetId, ConfigDatum, InstanceScripts, ListingDatum};
use bazaar_ledger::{LedgerClient, Utxo};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MarketError, Result};

/// The live config output and its decoded datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigState {
    /// Output holding the Config token.
    pub utxo: Utxo,
    /// Decoded fee table and fee address.
    pub datum: ConfigDatum,
}

/// A live listing and its decoded datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// Output at the marketplace address.
    pub utxo: Utxo,
    /// Decoded listing terms.
    pub datum: ListingDatum,
}

impl Listing {
    /// The listed NFT.
    #[must_use]
    pub fn nft(&self) -> AssetId {
        self.datum.nft()
    }
}

/// Find the unique output holding the instance's Config token.
///
/// # Errors
///
/// - [`MarketError::ConfigMissing`] if none exists (the instance was shut down
///   or never initialized).
/// - [`MarketError::MultipleConfigUtxos`] if more than one exists.
/// - [`MarketError::MalformedDatum`] if its datum does not decode.
pub async fn find_config<L: LedgerClient>(client: &L, scripts: &InstanceScripts) -> Result<ConfigState> {
    let address = scripts.config_address_bech32(client.network())?;
    let mut found = client.utxos_at_with_unit(&address, &scripts.config_token()).await?;

    match found.len() {
        0 => Err(MarketError::ConfigMissing),
        1 => {
            let utxo = found.remove(0);
            let datum = utxo
                .inline_datum::<ConfigDatum>()
                .map_err(|e| MarketError::malformed_datum(utxo.out_ref, e.to_string()))?;
            debug!(out_ref = %utxo.out_ref, rules = datum.token_fees.len(), "resolved config");
            Ok(ConfigState { utxo, datum })
        }
        count => Err(MarketError::MultipleConfigUtxos { count }),
    }
}

/// Decode an output at the marketplace address as a listing.
///
/// # Errors
///
/// Returns [`MarketError::MalformedDatum`] if the datum is absent or does not
/// match the listing layout, and [`MarketError::UnbackedListing`] if the
/// output does not hold exactly one of the NFT its datum names.
pub fn decode_listing(utxo: Utxo) -> Result<Listing> {
    let datum = utxo
        .inline_datum::<ListingDatum>()
        .map_err(|e| MarketError::malformed_datum(utxo.out_ref, e.to_string()))?;
    let nft = datum.nft();
    if utxo.value.quantity_of(&nft) != 1 {
        return Err(MarketError::UnbackedListing {
            out_ref: utxo.out_ref.to_string(),
            unit: nft.unit(),
        });
    }
    Ok(Listing { utxo, datum })
}

/// Find the listing holding `nft` at `marketplace_address`.
///
/// Outputs that hold `nft` but list something else are passed over.
///
/// # Errors
///
/// Returns [`MarketError::ListingNotFound`] if no output there holds the
/// asset, or the decode error of the last holder if none of them is a usable
/// listing of it.
pub async fn find_listing<L: LedgerClient>(client: &L, marketplace_address: &str, nft: &AssetId) -> Result<Listing> {
    let found = client.utxos_at_with_unit(marketplace_address, nft).await?;
    let mut rejected = None;
    for utxo in found {
        let out_ref = utxo.out_ref;
        match decode_listing(utxo) {
            Ok(listing) if listing.nft() == *nft => return Ok(listing),
            Ok(listing) => {
                rejected = Some(MarketError::malformed_datum(
                    out_ref,
                    format!("datum lists {} instead", listing.nft().unit()),
                ));
            }
            Err(err) => rejected = Some(err),
        }
    }
    Err(rejected.unwrap_or_else(|| MarketError::ListingNotFound { unit: nft.unit() }))
}

/// Every decodable listing at `marketplace_address`.
///
/// Outputs with unusable datums, or that do not hold the NFT their datum
/// names, are skipped and logged; anyone can send arbitrary outputs to a
/// script address.
///
/// # Errors
///
/// Propagates ledger query failures.
pub async fn listings<L: LedgerClient>(client: &L, marketplace_address: &str) -> Result<Vec<Listing>> {
    let utxos = client.utxos_at(marketplace_address).await?;
    let mut out = Vec::with_capacity(utxos.len());
    for utxo in utxos {
        let out_ref = utxo.out_ref;
        match decode_listing(utxo) {
            Ok(listing) => out.push(listing),
            Err(err) => warn!(%out_ref, error = %err, "skipping unreadable listing"),
        }
    }
    Ok(out)
}
