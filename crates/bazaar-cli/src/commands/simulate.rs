//! Lifecycle simulation command implementation.
//!
//! Spins up an in-memory ledger with three funded wallets (operator, seller,
//! buyer) and drives one instance through initialize, list, buy, and
//! optionally shutdown, reporting what each party actually received.

use std::io::Write;

use bazaar_core::{AssetId, AssetName, ConfigDatum, PolicyId, TxHash, Value};
use bazaar_ledger::{Emulator, EmulatorClient, LedgerClient, Wallet};
use bazaar_market::Marketplace;
use tracing::info;

use crate::cli::SimulateArgs;
use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::{OutputFormat, SimulationReport, StepView};

const NFT_POLICY_CONTEXT: &str = "bazaar 2024-05 simulated nft policy";
const WALLET_FUNDS: u64 = 50_000_000;

/// Simulate command executor.
pub struct SimulateCommand {
    config: CliConfig,
}

impl SimulateCommand {
    /// Create a new simulate command using the fee schedule in `config`.
    #[must_use]
    pub const fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// Run the simulation and print its report.
    ///
    /// # Errors
    ///
    /// Returns the first failing lifecycle step.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &SimulateArgs,
    ) -> Result<(), CliError> {
        let report = self.run(args).await?;
        format.write(writer, &report)
    }

    /// Run the simulation.
    ///
    /// # Errors
    ///
    /// Returns the first failing lifecycle step, e.g.
    /// `NoFeeRuleForAsset` if the schedule has no lovelace rule.
    pub async fn run(&self, args: &SimulateArgs) -> Result<SimulationReport, CliError> {
        let network = self.config.network;
        let emulator = Emulator::new(network);

        let fee_address = match self.config.fee_address()? {
            Some(address) => address,
            None => Wallet::generate().address(),
        };
        let fee_bech32 = fee_address.to_bech32(network)?;
        let config = ConfigDatum::new(fee_address, self.config.token_fees()?)?;

        let nft = AssetId::token(
            PolicyId::derive(NFT_POLICY_CONTEXT, &[args.name.as_bytes()]),
            AssetName::from_text("Bazaar #1")?,
        );
        let operator = connect(&emulator, Value::lovelace(WALLET_FUNDS)).await?;
        let seller = connect(&emulator, Value::lovelace(WALLET_FUNDS).with(nft.clone(), 1)?).await?;
        let buyer = connect(&emulator, Value::lovelace(args.price.saturating_add(WALLET_FUNDS))).await?;
        let seller_address = seller.wallet_address();
        let buyer_address = buyer.wallet_address();

        let mut steps = Vec::new();
        let mut operator = Marketplace::new(operator);
        let init = operator.initialize(&args.name, config).await?;
        operator.await_tx(&init.tx_hash).await?;
        steps.push(step("initialize", init.tx_hash));

        let seller = Marketplace::with_instance(seller, init.instance_id.clone());
        let buyer = Marketplace::with_instance(buyer, init.instance_id.clone());

        let hash = seller.list(&nft, &AssetId::Lovelace, args.price).await?;
        seller.await_tx(&hash).await?;
        steps.push(step("list", hash));

        let seller_before = emulator.balance(&seller_address).await?.coin();
        let fee_before = emulator.balance(&fee_bech32).await?.coin();
        let quote = buyer.quote(&nft).await?;

        let hash = buyer.buy(&nft).await?;
        buyer.await_tx(&hash).await?;
        steps.push(step("buy", hash));

        let seller_received = emulator.balance(&seller_address).await?.coin().saturating_sub(seller_before);
        let fee_received = emulator.balance(&fee_bech32).await?.coin().saturating_sub(fee_before);
        let buyer_holds_nft = emulator.balance(&buyer_address).await?.quantity_of(&nft) == 1;

        if args.shutdown {
            let hash = operator.shutdown().await?;
            operator.await_tx(&hash).await?;
            steps.push(step("shutdown", hash));
        }
        let status = operator.status().await?;

        info!(
            instance_id = %init.instance_id,
            steps = steps.len(),
            seller_received,
            fee_received,
            "simulation complete"
        );
        Ok(SimulationReport {
            instance_id: init.instance_id.to_string(),
            network,
            steps,
            price: args.price,
            fee: quote.split.fee,
            seller_amount: quote.split.seller_amount,
            seller_received,
            fee_received,
            buyer_holds_nft,
            status,
        })
    }
}

async fn connect(emulator: &Emulator, funds: Value) -> Result<EmulatorClient, CliError> {
    let client = emulator.connect(Wallet::generate())?;
    emulator.fund(&client.wallet_address(), funds).await?;
    Ok(client)
}

fn step(action: &str, tx_hash: TxHash) -> StepView {
    StepView {
        action: action.to_string(),
        tx_hash: tx_hash.to_hex(),
    }
}
