//! Deliberately invalid transactions for validator conformance testing.
//!
//! Each probe builds a Buy that a conformant validator must refuse and
//! submits it as-is. The probes skip every client-side guard that would stop
//! them early; the point is to see the ledger reject them.

use bazaar_core::{compute_split, Address, AssetId, ListingDatum, TxHash, Value};
use bazaar_ledger::{InlineData, LedgerClient, TxDraft, Utxo};
use tracing::info;

use crate::error::{MarketError, Result};
use crate::marketplace::Marketplace;
use crate::resolver::Listing;

/// Builder of invalid transactions against one marketplace instance.
#[derive(Debug)]
pub struct Probe<'a, L: LedgerClient> {
    market: &'a Marketplace<L>,
}

impl<'a, L: LedgerClient> Probe<'a, L> {
    pub(crate) const fn new(market: &'a Marketplace<L>) -> Self {
        Self { market }
    }

    /// Buy `nft` paying only `paid` in total, split at the listed rate.
    ///
    /// # Errors
    ///
    /// Resolution errors, or the ledger's rejection.
    pub async fn underpay(&self, nft: &AssetId, paid: u64) -> Result<TxHash> {
        let ctx = self.market.buy_context(nft).await?;
        let rate = ctx
            .config
            .datum
            .fee_rate(&ctx.listing.datum.price_policy, &ctx.listing.datum.price_name)
            .unwrap_or_default();
        let short = compute_split(paid, rate)?;

        let draft = ctx.base_draft("probe: underpay");
        let draft = ctx
            .pay_split(draft, &ctx.price_asset, short.seller_amount, short.fee)
            .pay_to(ctx.buyer_address.clone(), Value::singleton(nft.clone(), 1));
        self.submit("underpay", draft).await
    }

    /// Create a listing whose datum names `nft` but which does not hold it.
    ///
    /// Paying to a script address runs no script, so the ledger accepts this.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotInitialized`] without an instance, or a
    /// ledger error.
    pub async fn list_without_nft(&self, nft: &AssetId, price_asset: &AssetId, price: u64) -> Result<TxHash> {
        let seller = Address::from_bech32(&self.market.client().wallet_address())?;
        let datum = ListingDatum::new(seller, price_asset, price, nft)?;
        let draft = TxDraft::new("probe: list without nft").pay_to_contract(
            self.market.marketplace_address()?,
            InlineData::encode(&datum)?,
            Value::lovelace(2_000_000),
        );
        self.submit("list_without_nft", draft).await
    }

    /// Buy a listing whose datum names `nft` but which does not hold it.
    ///
    /// # Errors
    ///
    /// [`MarketError::ListingNotFound`] if there is no such listing, or the
    /// ledger's rejection.
    pub async fn buy_unbacked_listing(&self, nft: &AssetId) -> Result<TxHash> {
        let scripts = self.market.require_scripts()?;
        let listing = self
            .market
            .client()
            .utxos_at(&self.market.marketplace_address()?)
            .await?
            .into_iter()
            .filter(|utxo| !utxo.holds(nft))
            .find_map(|utxo| {
                let datum = utxo.inline_datum::<ListingDatum>().ok()?;
                (datum.nft() == *nft).then_some(Listing { utxo, datum })
            })
            .ok_or_else(|| MarketError::ListingNotFound { unit: nft.unit() })?;
        let ctx = self.market.buy_context_for(scripts, listing).await?;

        let draft = ctx.base_draft("probe: buy unbacked listing");
        let draft = ctx.pay_split(draft, &ctx.price_asset, ctx.split.seller_amount, ctx.split.fee);
        self.submit("buy_unbacked_listing", draft).await
    }

    /// Pay correctly but send the NFT to `recipient`, who does not sign.
    ///
    /// # Errors
    ///
    /// Resolution errors, or the ledger's rejection.
    pub async fn misdirect_nft(&self, nft: &AssetId, recipient: &str) -> Result<TxHash> {
        let ctx = self.market.buy_context(nft).await?;
        let draft = ctx.base_draft("probe: misdirect nft");
        let draft = ctx
            .pay_split(draft, &ctx.price_asset, ctx.split.seller_amount, ctx.split.fee)
            .pay_to(recipient, Value::singleton(nft.clone(), 1));
        self.submit("misdirect_nft", draft).await
    }

    /// Spend two listings in one transaction but pay for the first only.
    ///
    /// # Errors
    ///
    /// Resolution errors, or the ledger's rejection.
    pub async fn double_satisfaction(&self, first: &AssetId, second: &AssetId) -> Result<TxHash> {
        let one = self.market.buy_context(first).await?;
        let two = self.market.buy_context(second).await?;

        let draft = one
            .base_draft("probe: double satisfaction")
            .collect_from([&two.listing.utxo], Some(&two.redeemer));
        let draft = one
            .pay_split(draft, &one.price_asset, one.split.seller_amount, one.split.fee)
            .pay_to(one.buyer_address.clone(), Value::singleton(first.clone(), 1))
            .pay_to(one.buyer_address.clone(), Value::singleton(second.clone(), 1));
        self.submit("double_satisfaction", draft).await
    }

    /// Pay the listed amounts in `fake` instead of the listing's price asset.
    ///
    /// # Errors
    ///
    /// Resolution errors, or the ledger's rejection.
    pub async fn wrong_token(&self, nft: &AssetId, fake: &AssetId) -> Result<TxHash> {
        let ctx = self.market.buy_context(nft).await?;
        let draft = ctx.base_draft("probe: wrong token");
        let draft = ctx
            .pay_split(draft, fake, ctx.split.seller_amount, ctx.split.fee)
            .pay_to(ctx.buyer_address.clone(), Value::singleton(nft.clone(), 1));
        self.submit("wrong_token", draft).await
    }

    /// Buy `nft` citing `config`, an output that may no longer exist.
    ///
    /// # Errors
    ///
    /// Resolution errors, or the ledger's rejection.
    pub async fn stale_config(&self, nft: &AssetId, config: &Utxo) -> Result<TxHash> {
        let mut ctx = self.market.buy_context(nft).await?;
        ctx.config.utxo = config.clone();

        let draft = ctx.base_draft("probe: stale config");
        let draft = ctx
            .pay_split(draft, &ctx.price_asset, ctx.split.seller_amount, ctx.split.fee)
            .pay_to(ctx.buyer_address.clone(), Value::singleton(nft.clone(), 1));
        self.submit("stale_config", draft).await
    }

    async fn submit(&self, probe: &'static str, draft: TxDraft) -> Result<TxHash> {
        let tx_hash = self.market.client().submit(draft).await?;
        info!(tx_hash = %tx_hash, probe, "probe transaction accepted");
        Ok(tx_hash)
    }
}
