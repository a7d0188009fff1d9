//! End-to-end marketplace lifecycle against the emulated ledger.
//!
//! Walks one instance through every operation:
//! 1. Initialize with a two-asset fee table
//! 2. List, edit and buy a token-priced listing
//! 3. List and buy a lovelace-priced listing, also from a staked seller
//! 4. Update the config and see new rates apply to old listings
//! 5. Shut down, after which delisting still works and buying does not

mod common;

use bazaar_core::{Address, AssetId, ConfigDatum, KeyHash, TokenFee, Value};
use bazaar_ledger::{LedgerClient, Wallet};
use bazaar_market::{ErrorClass, MarketError, MarketStatus};
use common::{mane, nft, Market, ADA};

// ============================================================================
// Initialize
// ============================================================================

#[tokio::test]
async fn initialize_publishes_config() {
    let market = Market::launch().await;
    assert_eq!(market.operator.status().await.unwrap(), MarketStatus::Active);

    let config = market.operator.config().await.unwrap();
    assert_eq!(config.datum.fee_rate("", ""), Some(700));
    let (policy, name) = mane().to_pair();
    assert_eq!(config.datum.fee_rate(&policy, &name), Some(500));

    let scripts = market.operator.scripts().unwrap();
    assert_eq!(market.balance_of(&market.operator, &scripts.ownership_token()).await, 1);
    assert!(config.utxo.holds(&scripts.config_token()));
}

#[tokio::test]
async fn reconnecting_by_id_reaches_the_same_instance() {
    let market = Market::launch().await;
    let other = market.join(Value::lovelace(ADA)).await;
    assert_eq!(other.config_address().unwrap(), market.operator.config_address().unwrap());
    assert_eq!(other.status().await.unwrap(), MarketStatus::Active);
}

// ============================================================================
// Token-priced listing
// ============================================================================

#[tokio::test]
async fn token_listing_edit_and_buy() {
    let market = Market::launch().await;
    let item = nft("Mane #1");
    let seller = market.join(Value::lovelace(10 * ADA).with(item.clone(), 1).unwrap()).await;
    let buyer = market
        .join(Value::lovelace(10 * ADA).with(mane(), 30_000_000_000).unwrap())
        .await;

    let hash = seller.list(&item, &mane(), 10_000_000_000).await.unwrap();
    seller.await_tx(&hash).await.unwrap();
    assert_eq!(seller.listing(&item).await.unwrap().datum.price_amount, 10_000_000_000);
    assert_eq!(market.balance_of(&seller, &item).await, 0);

    let hash = seller.edit(&item, 25_000_000_000).await.unwrap();
    seller.await_tx(&hash).await.unwrap();
    let listings = seller.listings().await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].datum.price_amount, 25_000_000_000);
    assert!(listings[0].utxo.holds(&item));

    let quote = buyer.quote(&item).await.unwrap();
    assert_eq!(quote.price_asset, mane());
    assert_eq!(quote.fee_bps, 500);
    assert_eq!(quote.split.fee, 1_250_000_000);
    assert_eq!(quote.split.seller_amount, 23_750_000_000);

    let hash = buyer.buy(&item).await.unwrap();
    buyer.await_tx(&hash).await.unwrap();

    assert_eq!(market.balance_of(&seller, &mane()).await, 23_750_000_000);
    assert_eq!(market.balance_at(&market.fee_address, &mane()).await, 1_250_000_000);
    assert_eq!(market.balance_of(&buyer, &mane()).await, 5_000_000_000);
    assert_eq!(market.balance_of(&buyer, &item).await, 1);
    assert!(buyer.listings().await.unwrap().is_empty());
}

#[tokio::test]
async fn only_the_seller_may_edit_or_delist() {
    let market = Market::launch().await;
    let item = nft("Mane #2");
    let seller = market.join(Value::lovelace(10 * ADA).with(item.clone(), 1).unwrap()).await;
    let stranger = market.join(Value::lovelace(10 * ADA)).await;

    let hash = seller.list(&item, &mane(), 10_000_000_000).await.unwrap();
    seller.await_tx(&hash).await.unwrap();

    let err = stranger.edit(&item, 1).await.unwrap_err();
    assert!(matches!(err, MarketError::WrongSigner { .. }));
    let err = stranger.delist(&item).await.unwrap_err();
    assert!(matches!(err, MarketError::WrongSigner { .. }));

    let hash = seller.delist(&item).await.unwrap();
    seller.await_tx(&hash).await.unwrap();
    assert_eq!(market.balance_of(&seller, &item).await, 1);
}

// ============================================================================
// Lovelace-priced listing
// ============================================================================

#[tokio::test]
async fn lovelace_listing_pays_exact_split() {
    let market = Market::launch().await;
    let item = nft("Ada #1");
    let seller = market.join(Value::lovelace(10 * ADA).with(item.clone(), 1).unwrap()).await;
    let buyer = market.join(Value::lovelace(30 * ADA)).await;

    let hash = seller.list(&item, &AssetId::Lovelace, 10 * ADA).await.unwrap();
    seller.await_tx(&hash).await.unwrap();

    let seller_before = market.balance_of(&seller, &AssetId::Lovelace).await;
    let hash = buyer.buy(&item).await.unwrap();
    buyer.await_tx(&hash).await.unwrap();

    let seller_after = market.balance_of(&seller, &AssetId::Lovelace).await;
    assert_eq!(seller_after - seller_before, 9_300_000);
    assert_eq!(market.balance_at(&market.fee_address, &AssetId::Lovelace).await, 700_000);
    assert_eq!(market.balance_of(&buyer, &item).await, 1);
}

#[tokio::test]
async fn staked_seller_is_paid_at_base_address() {
    let market = Market::launch().await;
    let item = nft("Ada #3");
    let wallet = Wallet::generate().with_stake(KeyHash::new([9; 28]));
    let seller = market.join_as(wallet, Value::lovelace(10 * ADA).with(item.clone(), 1).unwrap()).await;
    let buyer = market.join(Value::lovelace(30 * ADA)).await;
    let seller_address = seller.client().wallet_address();
    assert_eq!(Address::from_bech32(&seller_address).unwrap().kind(), "base");

    let hash = seller.list(&item, &AssetId::Lovelace, 10 * ADA).await.unwrap();
    seller.await_tx(&hash).await.unwrap();
    assert_eq!(seller.listing(&item).await.unwrap().datum.seller.kind(), "base");

    let before = market.balance_at(&seller_address, &AssetId::Lovelace).await;
    let hash = buyer.buy(&item).await.unwrap();
    buyer.await_tx(&hash).await.unwrap();
    assert_eq!(market.balance_at(&seller_address, &AssetId::Lovelace).await - before, 9_300_000);
    assert_eq!(market.balance_of(&buyer, &item).await, 1);
}

#[tokio::test]
async fn listing_requires_the_nft() {
    let market = Market::launch().await;
    let seller = market.join(Value::lovelace(10 * ADA)).await;
    let err = seller.list(&nft("absent"), &AssetId::Lovelace, ADA).await.unwrap_err();
    assert!(matches!(err, MarketError::NftNotInWallet { .. }));
    assert_eq!(err.class(), ErrorClass::Precondition);
}

#[tokio::test]
async fn buying_in_an_unpriced_asset_fails_locally() {
    let market = Market::launch().await;
    let item = nft("Odd #1");
    let odd = nft("ODD");
    let seller = market.join(Value::lovelace(10 * ADA).with(item.clone(), 1).unwrap()).await;
    let buyer = market.join(Value::lovelace(10 * ADA).with(odd.clone(), 5).unwrap()).await;

    let hash = seller.list(&item, &odd, 5).await.unwrap();
    seller.await_tx(&hash).await.unwrap();

    let err = buyer.buy(&item).await.unwrap_err();
    assert!(matches!(err, MarketError::NoFeeRuleForAsset { .. }));
}

// ============================================================================
// Config updates
// ============================================================================

#[tokio::test]
async fn updated_rates_apply_to_existing_listings() {
    let market = Market::launch().await;
    let item = nft("Ada #2");
    let seller = market.join(Value::lovelace(10 * ADA).with(item.clone(), 1).unwrap()).await;
    let buyer = market.join(Value::lovelace(30 * ADA)).await;

    let hash = seller.list(&item, &AssetId::Lovelace, 10 * ADA).await.unwrap();
    seller.await_tx(&hash).await.unwrap();
    assert_eq!(buyer.quote(&item).await.unwrap().split.fee, 700_000);

    let config = ConfigDatum::new(market.fee_wallet.address(), vec![TokenFee::new(&AssetId::Lovelace, 0)]).unwrap();
    let hash = market.operator.update_config(config).await.unwrap();
    market.operator.await_tx(&hash).await.unwrap();

    let quote = buyer.quote(&item).await.unwrap();
    assert_eq!(quote.fee_bps, 0);
    assert_eq!(quote.split.fee, 0);
    assert_eq!(quote.split.seller_amount, 10 * ADA);

    let seller_before = market.balance_of(&seller, &AssetId::Lovelace).await;
    let hash = buyer.buy(&item).await.unwrap();
    buyer.await_tx(&hash).await.unwrap();
    assert_eq!(market.balance_of(&seller, &AssetId::Lovelace).await - seller_before, 10 * ADA);
    assert_eq!(market.balance_at(&market.fee_address, &AssetId::Lovelace).await, 0);
}

#[tokio::test]
async fn update_config_requires_ownership() {
    let market = Market::launch().await;
    let intruder = market.join(Value::lovelace(10 * ADA)).await;
    let config = ConfigDatum::new(market.fee_wallet.address(), vec![TokenFee::new(&AssetId::Lovelace, 1)]).unwrap();
    let err = intruder.update_config(config).await.unwrap_err();
    assert_eq!(err, MarketError::OwnershipTokenMissing);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn shutdown_leaves_listings_withdrawable_but_not_buyable() {
    let market = Market::launch().await;
    let first = nft("Late #1");
    let second = nft("Late #2");
    let seller = market
        .join(
            Value::lovelace(10 * ADA)
                .with(first.clone(), 1)
                .unwrap()
                .with(second.clone(), 1)
                .unwrap(),
        )
        .await;
    let buyer = market.join(Value::lovelace(30 * ADA)).await;
    for item in [&first, &second] {
        let hash = seller.list(item, &AssetId::Lovelace, 10 * ADA).await.unwrap();
        seller.await_tx(&hash).await.unwrap();
    }

    let scripts = market.operator.scripts().unwrap().clone();
    let hash = market.operator.shutdown().await.unwrap();
    market.operator.await_tx(&hash).await.unwrap();

    assert_eq!(market.operator.status().await.unwrap(), MarketStatus::ShutDown);
    assert_eq!(market.balance_of(&market.operator, &scripts.ownership_token()).await, 0);
    assert!(market.emulator.utxos_at(&market.operator.config_address().unwrap()).await.is_empty());

    let hash = seller.delist(&first).await.unwrap();
    seller.await_tx(&hash).await.unwrap();
    assert_eq!(market.balance_of(&seller, &first).await, 1);

    let err = buyer.buy(&second).await.unwrap_err();
    assert!(err.is_missing_reference_input());

    let err = market.operator.shutdown().await.unwrap_err();
    assert_eq!(err, MarketError::ConfigMissing);
}
