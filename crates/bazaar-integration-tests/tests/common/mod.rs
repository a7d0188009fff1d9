//! Shared fixture: one emulated ledger with a live marketplace instance.

#![allow(dead_code)]

use bazaar_core::{AssetId, AssetName, ConfigDatum, InstanceId, Network, PolicyId, TokenFee, Value};
use bazaar_ledger::{Emulator, EmulatorClient, LedgerClient, Wallet};
use bazaar_market::Marketplace;

pub const ADA: u64 = 1_000_000;
pub const MANE_POLICY: &str = "a90d1702625ee4ebcee3b3649708cbcbb163f50db9663308acc9650e";
pub const LOVELACE_FEE_BPS: u64 = 700;
pub const MANE_FEE_BPS: u64 = 500;

pub fn mane() -> AssetId {
    AssetId::token(PolicyId::from_hex(MANE_POLICY).unwrap(), AssetName::from_text("MANE").unwrap())
}

pub fn nft(name: &str) -> AssetId {
    AssetId::token(PolicyId::new([0x42; 28]), AssetName::from_text(name).unwrap())
}

pub fn fee_schedule() -> Vec<TokenFee> {
    vec![
        TokenFee::new(&AssetId::Lovelace, LOVELACE_FEE_BPS),
        TokenFee::new(&mane(), MANE_FEE_BPS),
    ]
}

pub async fn client(emulator: &Emulator, value: Value) -> EmulatorClient {
    client_for(emulator, Wallet::generate(), value).await
}

pub async fn client_for(emulator: &Emulator, wallet: Wallet, value: Value) -> EmulatorClient {
    let client = emulator.connect(wallet).unwrap();
    emulator.fund(&client.wallet_address(), value).await.unwrap();
    client
}

pub struct Market {
    pub emulator: Emulator,
    pub operator: Marketplace<EmulatorClient>,
    pub instance_id: InstanceId,
    pub fee_wallet: Wallet,
    pub fee_address: String,
}

impl Market {
    /// Initialize an instance charging 7% on lovelace and 5% on MANE.
    pub async fn launch() -> Self {
        let emulator = Emulator::new(Network::Testnet);
        let fee_wallet = Wallet::generate();
        let fee_address = fee_wallet.bech32_address(Network::Testnet).unwrap();
        let config = ConfigDatum::new(fee_wallet.address(), fee_schedule()).unwrap();

        let mut operator = Marketplace::new(client(&emulator, Value::lovelace(20 * ADA)).await);
        let init = operator.initialize("integration", config).await.unwrap();
        operator.await_tx(&init.tx_hash).await.unwrap();

        Self {
            emulator,
            operator,
            instance_id: init.instance_id,
            fee_wallet,
            fee_address,
        }
    }

    /// A funded wallet bound to this instance.
    pub async fn join(&self, value: Value) -> Marketplace<EmulatorClient> {
        self.join_as(Wallet::generate(), value).await
    }

    /// A funded client for `wallet` bound to this instance.
    pub async fn join_as(&self, wallet: Wallet, value: Value) -> Marketplace<EmulatorClient> {
        Marketplace::with_instance(client_for(&self.emulator, wallet, value).await, self.instance_id.clone())
    }

    pub async fn balance_of(&self, market: &Marketplace<EmulatorClient>, asset: &AssetId) -> u64 {
        self.balance_at(&market.client().wallet_address(), asset).await
    }

    pub async fn balance_at(&self, address: &str, asset: &AssetId) -> u64 {
        self.emulator.balance(address).await.unwrap().quantity_of(asset)
    }
}
