//! The lifecycle orchestrator.
//!
//! One [`Marketplace`] drives one instance through its lifecycle. Every
//! operation re-resolves the UTXOs it needs, assembles a single
//! [`TxDraft`], and hands it to the ledger client. Operations return as soon
//! as the network accepts the transaction; use [`Marketplace::await_tx`] to
//! wait for confirmation before building on its outputs.
//!
//! # Instance States
//!
//! ```text
//! Uninitialized --initialize--> Active --shutdown--> ShutDown
//! ```
//!
//! `ShutDown` is not tracked locally. It is the absence of the config output
//! and is observed through [`Marketplace::status`]. Listings left behind can
//! still be delisted after shutdown.

use bazaar_core::{
    Address, AssetId, ConfigAction, ConfigDatum, ControlAction, FeeSplit, InstanceId, InstanceScripts, KeyHash,
    ListingDatum, MarketplaceAction, TxHash, Value,
};
use bazaar_ledger::{InlineData, LedgerClient, TxDraft, Utxo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MarketError, Result};
use crate::probe::Probe;
use crate::resolver::{self, ConfigState, Listing};

/// Lifecycle state of an instance as seen on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    /// The client has no instance.
    Uninitialized,
    /// The config output exists.
    Active,
    /// The config output is gone.
    ShutDown,
}

/// Result of a successful initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Initialized {
    /// The minting transaction.
    pub tx_hash: TxHash,
    /// Identity of the new instance.
    pub instance_id: InstanceId,
}

/// What a purchase of a listing would pay, resolved without submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// The listed NFT.
    pub nft: AssetId,
    /// Asset the listing is priced in.
    pub price_asset: AssetId,
    /// Asking price.
    pub price: u64,
    /// Rate applied, in basis points.
    pub fee_bps: u64,
    /// Fee and seller proceeds.
    pub split: FeeSplit,
}

/// Everything a Buy transaction is assembled from.
#[derive(Debug, Clone)]
pub(crate) struct BuyContext {
    pub listing: Listing,
    pub config: ConfigState,
    pub price_asset: AssetId,
    pub split: FeeSplit,
    pub seller_address: String,
    pub fee_address: String,
    pub buyer_address: String,
    pub buyer: KeyHash,
    pub redeemer: InlineData,
}

impl BuyContext {
    /// Spend the listing with `Buy` and cite the config.
    pub fn base_draft(&self, label: &str) -> TxDraft {
        TxDraft::new(label)
            .collect_from([&self.listing.utxo], Some(&self.redeemer))
            .read_from(&self.config.utxo)
            .add_signer(self.buyer)
    }

    /// Pay `seller_amount` and `fee` of `asset`, skipping zero amounts.
    pub fn pay_split(&self, mut draft: TxDraft, asset: &AssetId, seller_amount: u64, fee: u64) -> TxDraft {
        if seller_amount > 0 {
            draft = draft.pay_to(self.seller_address.clone(), Value::singleton(asset.clone(), seller_amount));
        }
        if fee > 0 {
            draft = draft.pay_to(self.fee_address.clone(), Value::singleton(asset.clone(), fee));
        }
        draft
    }
}

/// Client for one marketplace instance.
#[derive(Debug)]
pub struct Marketplace<L: LedgerClient> {
    client: L,
    instance: Option<(InstanceId, InstanceScripts)>,
}

impl<L: LedgerClient> Marketplace<L> {
    /// A client with no instance; call [`Marketplace::initialize`] next.
    #[must_use]
    pub const fn new(client: L) -> Self {
        Self { client, instance: None }
    }

    /// A client for an existing instance. Scripts and addresses are
    /// re-derived from the id without touching the ledger.
    #[must_use]
    pub fn with_instance(client: L, instance_id: InstanceId) -> Self {
        let scripts = instance_id.scripts();
        Self {
            client,
            instance: Some((instance_id, scripts)),
        }
    }

    /// The ledger client.
    pub const fn client(&self) -> &L {
        &self.client
    }

    /// The managed instance, if any.
    pub fn instance_id(&self) -> Option<&InstanceId> {
        self.instance.as_ref().map(|(id, _)| id)
    }

    /// Scripts of the managed instance, if any.
    pub fn scripts(&self) -> Option<&InstanceScripts> {
        self.instance.as_ref().map(|(_, scripts)| scripts)
    }

    /// Bech32 marketplace address of the instance.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotInitialized`] without an instance.
    pub fn marketplace_address(&self) -> Result<String> {
        Ok(self.require_scripts()?.marketplace_address_bech32(self.client.network())?)
    }

    /// Bech32 config address of the instance.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotInitialized`] without an instance.
    pub fn config_address(&self) -> Result<String> {
        Ok(self.require_scripts()?.config_address_bech32(self.client.network())?)
    }

    /// Wait until `hash` is confirmed.
    ///
    /// # Errors
    ///
    /// Returns the ledger's rejection reason if it failed at confirmation.
    pub async fn await_tx(&self, hash: &TxHash) -> Result<()> {
        Ok(self.client.await_tx(hash).await?)
    }

    /// Deploy a new instance seeded by one of the wallet's outputs.
    ///
    /// Consumes the seed, mints the Config and Ownership tokens, places the
    /// Config token with `config` at the config address, and returns the
    /// Ownership token to the wallet.
    ///
    /// # Errors
    ///
    /// - [`MarketError::AlreadyInitialized`] if this client has an instance.
    /// - [`MarketError::NoSpendableUtxo`] if the wallet is empty.
    /// - Validation errors for `config`, and ledger rejections.
    pub async fn initialize(&mut self, name: &str, config: ConfigDatum) -> Result<Initialized> {
        if let Some((id, _)) = &self.instance {
            return Err(MarketError::AlreadyInitialized {
                instance_id: id.to_string(),
            });
        }
        config.validate()?;

        let wallet_address = self.client.wallet_address();
        let seed = self
            .client
            .wallet_utxos()
            .await?
            .into_iter()
            .next()
            .ok_or(MarketError::NoSpendableUtxo)?;

        let instance_id = InstanceId::new(seed.out_ref, name);
        let scripts = instance_id.scripts();
        let config_token = scripts.config_token();
        let ownership_token = scripts.ownership_token();
        let mint = [config_token.clone(), ownership_token.clone()]
            .into_iter()
            .filter_map(|token| token.name().cloned())
            .map(|name| (name, 1));

        let draft = TxDraft::new("initialize")
            .collect_from([&seed], None)
            .mint(scripts.policy_id, mint, InlineData::encode(&ControlAction::Initialize)?)
            .pay_to_contract_with_script(
                scripts.config_address_bech32(self.client.network())?,
                InlineData::encode(&config)?,
                Value::singleton(config_token, 1),
                scripts.marketplace_validator,
            )
            .pay_to(wallet_address, Value::singleton(ownership_token, 1))
            .attach_script(scripts.control_policy);

        let tx_hash = self.client.submit(draft).await?;
        info!(
            tx_hash = %tx_hash,
            action = "initialize",
            instance_id = %instance_id,
            policy_id = %scripts.policy_id,
            "marketplace initialized"
        );
        self.instance = Some((instance_id.clone(), scripts));
        Ok(Initialized { tx_hash, instance_id })
    }

    /// List `nft` for `price` of `price_asset`.
    ///
    /// A price asset without a fee rule is accepted here; it only blocks Buy.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotInitialized`] / [`MarketError::ConfigMissing`] unless active.
    /// - [`MarketError::NftNotInWallet`] if the wallet lacks the NFT.
    /// - A core error if `nft` is the native unit.
    pub async fn list(&self, nft: &AssetId, price_asset: &AssetId, price: u64) -> Result<TxHash> {
        let scripts = self.require_scripts()?;
        resolver::find_config(&self.client, scripts).await?;

        let wallet_address = self.client.wallet_address();
        let seller = Address::from_bech32(&wallet_address)?;
        let datum = ListingDatum::new(seller, price_asset, price, nft)?;

        let held = self.client.wallet_utxos().await?.iter().any(|u| u.holds(nft));
        if !held {
            return Err(MarketError::NftNotInWallet { unit: nft.unit() });
        }

        let draft = TxDraft::new("list").pay_to_contract(
            self.marketplace_address()?,
            InlineData::encode(&datum)?,
            Value::singleton(nft.clone(), 1),
        );
        let tx_hash = self.client.submit(draft).await?;
        info!(tx_hash = %tx_hash, action = "list", nft = %nft, price_asset = %price_asset, price, "listing created");
        Ok(tx_hash)
    }

    /// Change the asking price of the wallet's listing of `nft`.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ListingNotFound`] if `nft` is not listed.
    /// - [`MarketError::WrongSigner`] unless the wallet is the seller.
    pub async fn edit(&self, nft: &AssetId, new_price: u64) -> Result<TxHash> {
        let scripts = self.require_scripts()?;
        let listing = resolver::find_listing(&self.client, &self.marketplace_address()?, nft).await?;
        let seller = self.require_seller(&listing)?;

        let redeemer = InlineData::encode(&MarketplaceAction::Edit { new_price })?;
        let draft = TxDraft::new("edit")
            .collect_from([&listing.utxo], Some(&redeemer))
            .pay_to_contract(
                listing.utxo.address.clone(),
                InlineData::encode(&listing.datum.with_price(new_price))?,
                listing.utxo.value.clone(),
            )
            .add_signer(seller)
            .attach_script(scripts.marketplace_validator);

        let tx_hash = self.client.submit(draft).await?;
        info!(
            tx_hash = %tx_hash,
            action = "edit",
            nft = %nft,
            old_price = listing.datum.price_amount,
            new_price,
            "listing repriced"
        );
        Ok(tx_hash)
    }

    /// Buy the listing of `nft`, paying the seller and the fee recipient.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ListingNotFound`] if `nft` is not listed.
    /// - [`MarketError::ConfigMissing`] after shutdown.
    /// - [`MarketError::NoFeeRuleForAsset`] if the price asset has no rule.
    /// - Ledger rejections, including losing a race for the listing.
    pub async fn buy(&self, nft: &AssetId) -> Result<TxHash> {
        let ctx = self.buy_context(nft).await?;
        let draft = ctx.base_draft("buy");
        let draft = ctx
            .pay_split(draft, &ctx.price_asset, ctx.split.seller_amount, ctx.split.fee)
            .pay_to(ctx.buyer_address.clone(), Value::singleton(nft.clone(), 1));

        let tx_hash = self.client.submit(draft).await?;
        info!(
            tx_hash = %tx_hash,
            action = "buy",
            nft = %nft,
            price_asset = %ctx.price_asset,
            fee = ctx.split.fee,
            seller_amount = ctx.split.seller_amount,
            "listing bought"
        );
        Ok(tx_hash)
    }

    /// Withdraw the wallet's listing of `nft`. Works after shutdown.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ListingNotFound`] if `nft` is not listed.
    /// - [`MarketError::WrongSigner`] unless the wallet is the seller.
    pub async fn delist(&self, nft: &AssetId) -> Result<TxHash> {
        let scripts = self.require_scripts()?;
        let listing = resolver::find_listing(&self.client, &self.marketplace_address()?, nft).await?;
        let seller = self.require_seller(&listing)?;

        let draft = TxDraft::new("delist")
            .collect_from([&listing.utxo], Some(&InlineData::encode(&MarketplaceAction::Delist)?))
            .pay_to(
                listing.datum.seller.to_bech32(self.client.network())?,
                listing.utxo.value.clone(),
            )
            .add_signer(seller)
            .attach_script(scripts.marketplace_validator);

        let tx_hash = self.client.submit(draft).await?;
        info!(tx_hash = %tx_hash, action = "delist", nft = %nft, "listing withdrawn");
        Ok(tx_hash)
    }

    /// Replace the fee table and fee recipient.
    ///
    /// # Errors
    ///
    /// - Validation errors for `config`.
    /// - [`MarketError::ConfigMissing`] after shutdown.
    /// - [`MarketError::OwnershipTokenMissing`] unless the wallet holds Ownership.
    pub async fn update_config(&self, config: ConfigDatum) -> Result<TxHash> {
        config.validate()?;
        let scripts = self.require_scripts()?;
        let current = resolver::find_config(&self.client, scripts).await?;
        let ownership = self.ownership_utxo(scripts).await?;

        let draft = TxDraft::new("update config")
            .collect_from([&current.utxo], Some(&InlineData::encode(&ConfigAction::Updating)?))
            .collect_from([&ownership], None)
            .pay_to_contract_with_script(
                current.utxo.address.clone(),
                InlineData::encode(&config)?,
                current.utxo.value.clone(),
                scripts.marketplace_validator,
            )
            .pay_to(self.client.wallet_address(), Value::singleton(scripts.ownership_token(), 1))
            .attach_script(scripts.config_validator);

        let tx_hash = self.client.submit(draft).await?;
        info!(
            tx_hash = %tx_hash,
            action = "update_config",
            rules = config.token_fees.len(),
            "config updated"
        );
        Ok(tx_hash)
    }

    /// Consume the config and burn both control tokens.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ConfigMissing`] if already shut down.
    /// - [`MarketError::OwnershipTokenMissing`] unless the wallet holds Ownership.
    pub async fn shutdown(&self) -> Result<TxHash> {
        let scripts = self.require_scripts()?;
        let current = resolver::find_config(&self.client, scripts).await?;
        let ownership = self.ownership_utxo(scripts).await?;
        let burn = [scripts.config_token(), scripts.ownership_token()]
            .into_iter()
            .filter_map(|token| token.name().cloned())
            .map(|name| (name, -1));

        let draft = TxDraft::new("shutdown")
            .collect_from([&current.utxo], Some(&InlineData::encode(&ConfigAction::Burning)?))
            .collect_from([&ownership], None)
            .mint(scripts.policy_id, burn, InlineData::encode(&ControlAction::Shutdown)?)
            .attach_script(scripts.config_validator)
            .attach_script(scripts.control_policy);

        let tx_hash = self.client.submit(draft).await?;
        info!(tx_hash = %tx_hash, action = "shutdown", policy_id = %scripts.policy_id, "marketplace shut down");
        Ok(tx_hash)
    }

    /// Price and split a Buy of `nft` would pay.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Marketplace::buy`].
    pub async fn quote(&self, nft: &AssetId) -> Result<Quote> {
        let ctx = self.buy_context(nft).await?;
        let fee_bps = ctx
            .config
            .datum
            .fee_rate(&ctx.listing.datum.price_policy, &ctx.listing.datum.price_name)
            .unwrap_or_default();
        Ok(Quote {
            nft: nft.clone(),
            price_asset: ctx.price_asset,
            price: ctx.listing.datum.price_amount,
            fee_bps,
            split: ctx.split,
        })
    }

    /// Current lifecycle state, by ledger query.
    ///
    /// Without a config output, the instance is `Uninitialized` while its
    /// seed output is still unspent (the Initialize transaction has not
    /// confirmed yet) and `ShutDown` once the seed is gone. An id whose seed
    /// never existed on this ledger also reads as `ShutDown`.
    ///
    /// # Errors
    ///
    /// Propagates query failures and [`MarketError::MultipleConfigUtxos`].
    pub async fn status(&self) -> Result<MarketStatus> {
        let Some((instance_id, scripts)) = &self.instance else {
            return Ok(MarketStatus::Uninitialized);
        };
        match resolver::find_config(&self.client, scripts).await {
            Ok(_) => Ok(MarketStatus::Active),
            Err(MarketError::ConfigMissing) => {
                if self.client.utxo_by_ref(&instance_id.seed).await?.is_some() {
                    Ok(MarketStatus::Uninitialized)
                } else {
                    Ok(MarketStatus::ShutDown)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// The live config.
    ///
    /// # Errors
    ///
    /// See [`resolver::find_config`].
    pub async fn config(&self) -> Result<ConfigState> {
        resolver::find_config(&self.client, self.require_scripts()?).await
    }

    /// The live listing of `nft`.
    ///
    /// # Errors
    ///
    /// See [`resolver::find_listing`].
    pub async fn listing(&self, nft: &AssetId) -> Result<Listing> {
        resolver::find_listing(&self.client, &self.marketplace_address()?, nft).await
    }

    /// Every readable listing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotInitialized`] without an instance.
    pub async fn listings(&self) -> Result<Vec<Listing>> {
        resolver::listings(&self.client, &self.marketplace_address()?).await
    }

    /// Builder of deliberately invalid transactions.
    pub const fn probe(&self) -> Probe<'_, L> {
        Probe::new(self)
    }

    pub(crate) fn require_scripts(&self) -> Result<&InstanceScripts> {
        self.scripts().ok_or(MarketError::NotInitialized)
    }

    /// The wallet's address and payment key.
    pub(crate) fn wallet_key(&self) -> Result<(String, KeyHash)> {
        let address = self.client.wallet_address();
        let key = Address::from_bech32(&address)?
            .payment_key_hash()
            .ok_or_else(|| MarketError::SignerNotKeyCredential {
                address: address.clone(),
            })?;
        Ok((address, key))
    }

    pub(crate) async fn buy_context(&self, nft: &AssetId) -> Result<BuyContext> {
        let scripts = self.require_scripts()?;
        let listing = resolver::find_listing(&self.client, &self.marketplace_address()?, nft).await?;
        self.buy_context_for(scripts, listing).await
    }

    pub(crate) async fn buy_context_for(&self, scripts: &InstanceScripts, listing: Listing) -> Result<BuyContext> {
        let config = resolver::find_config(&self.client, scripts).await?;
        let price_asset = listing.datum.price_asset()?;
        let split = config
            .datum
            .split_for(&listing.datum)?
            .ok_or_else(|| MarketError::NoFeeRuleForAsset {
                unit: price_asset.unit(),
            })?;
        let network = self.client.network();
        let (buyer_address, buyer) = self.wallet_key()?;
        debug!(
            listing = %listing.utxo.out_ref,
            config = %config.utxo.out_ref,
            fee = split.fee,
            "resolved buy"
        );
        Ok(BuyContext {
            seller_address: listing.datum.seller.to_bech32(network)?,
            fee_address: config.datum.fee_address.to_bech32(network)?,
            redeemer: InlineData::encode(&MarketplaceAction::Buy)?,
            listing,
            config,
            price_asset,
            split,
            buyer_address,
            buyer,
        })
    }

    fn require_seller(&self, listing: &Listing) -> Result<KeyHash> {
        let seller = listing.datum.seller.payment_key_hash().ok_or_else(|| {
            MarketError::SignerNotKeyCredential {
                address: listing
                    .datum
                    .seller
                    .to_bech32(self.client.network())
                    .unwrap_or_default(),
            }
        })?;
        let (_, wallet) = self.wallet_key()?;
        if wallet != seller {
            return Err(MarketError::WrongSigner {
                unit: listing.nft().unit(),
            });
        }
        Ok(seller)
    }

    async fn ownership_utxo(&self, scripts: &InstanceScripts) -> Result<Utxo> {
        let token = scripts.ownership_token();
        self.client
            .wallet_utxos()
            .await?
            .into_iter()
            .find(|u| u.holds(&token))
            .ok_or(MarketError::OwnershipTokenMissing)
    }
}
