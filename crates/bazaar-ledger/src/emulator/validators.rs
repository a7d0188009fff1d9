//! Validator contract for the three marketplace scripts.
//!
//! These rules are what the deployed scripts enforce; the emulator runs them
//! so that transactions the orchestrator builds, and deliberately broken
//! ones, meet the same accept/reject decisions they would on chain.

use bazaar_core::{
    Address, AssetId, AssetName, ConfigAction, ConfigDatum, ControlAction, InstanceScripts, ListingDatum,
    MarketplaceAction, OutRef, PolicyId, Script, CONFIG_TOKEN_NAME, OWNERSHIP_TOKEN_NAME,
};
use serde::de::DeserializeOwned;

use super::{ScriptEvaluator, ScriptPurpose};
use crate::tx::{ResolvedInput, Transaction, TxOutput};
use crate::utxo::InlineData;

type Check = std::result::Result<(), String>;

/// Evaluator enforcing the control policy, config validator, and
/// marketplace validator rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketplaceScripts;

impl ScriptEvaluator for MarketplaceScripts {
    fn evaluate(&self, script: &Script, purpose: ScriptPurpose<'_>, tx: &Transaction) -> Check {
        match (script, purpose) {
            (Script::ControlPolicy { seed }, ScriptPurpose::Mint(mint)) => {
                control_policy(seed, &redeemer(Some(&mint.redeemer))?, tx)
            }
            (Script::ConfigValidator { control_policy }, ScriptPurpose::Spend(input)) => {
                config_validator(control_policy, &redeemer(input.redeemer.as_ref())?, tx)
            }
            (Script::MarketplaceValidator { control_policy }, ScriptPurpose::Spend(input)) => {
                marketplace_validator(control_policy, input, &redeemer(input.redeemer.as_ref())?, tx)
            }
            (script, _) => Err(format!("{} cannot be run for this purpose", script.name())),
        }
    }
}

fn ensure(condition: bool, reason: &str) -> Check {
    if condition { Ok(()) } else { Err(reason.to_string()) }
}

fn redeemer<T: DeserializeOwned>(data: Option<&InlineData>) -> std::result::Result<T, String> {
    data.ok_or_else(|| "missing redeemer".to_string())?
        .decode()
        .map_err(|e| format!("malformed redeemer: {e}"))
}

fn control_token(policy: PolicyId, name: &str) -> std::result::Result<AssetId, String> {
    let name = AssetName::from_text(name).map_err(|e| e.to_string())?;
    Ok(AssetId::token(policy, name))
}

/// True if exactly `quantity` of each token (and nothing else) is minted under `policy`.
fn mints_exactly(tx: &Transaction, policy: &PolicyId, tokens: &[&AssetId], quantity: i64) -> bool {
    let minted = tx.minted(policy);
    minted.len() == tokens.len()
        && tokens
            .iter()
            .all(|token| token.name().and_then(|name| minted.get(name)) == Some(&quantity))
}

/// The config output must hold the Config token, carry a valid config, and
/// store the marketplace validator for reference use.
fn check_config_output(output: &TxOutput, control_policy: PolicyId) -> Check {
    let datum = output
        .datum
        .as_ref()
        .ok_or_else(|| "config output has no inline datum".to_string())?;
    let config: ConfigDatum = datum.decode().map_err(|e| format!("malformed config datum: {e}"))?;
    config.validate().map_err(|e| e.to_string())?;
    ensure(
        output.script_ref == Some(Script::MarketplaceValidator { control_policy }),
        "config output must carry the marketplace validator",
    )
}

fn control_policy(seed: &OutRef, action: &ControlAction, tx: &Transaction) -> Check {
    let scripts = InstanceScripts::derive(*seed);
    let config = scripts.config_token();
    let ownership = scripts.ownership_token();

    match action {
        ControlAction::Initialize => {
            ensure(
                tx.inputs.iter().any(|i| i.utxo.out_ref == *seed),
                "seed output not consumed",
            )?;
            ensure(
                mints_exactly(tx, &scripts.policy_id, &[&config, &ownership], 1),
                "must mint exactly one Config and one Ownership token",
            )?;
            let config_address = scripts.config_address();
            let output = tx
                .outputs_to(&config_address)
                .find(|o| o.value.quantity_of(&config) == 1)
                .ok_or_else(|| "config token not sent to the config address".to_string())?;
            check_config_output(output, scripts.policy_id)
        }
        ControlAction::Shutdown => ensure(
            mints_exactly(tx, &scripts.policy_id, &[&config, &ownership], -1),
            "must burn exactly one Config and one Ownership token",
        ),
    }
}

fn config_validator(control_policy: &PolicyId, action: &ConfigAction, tx: &Transaction) -> Check {
    let config = control_token(*control_policy, CONFIG_TOKEN_NAME)?;
    let ownership = control_token(*control_policy, OWNERSHIP_TOKEN_NAME)?;

    match action {
        ConfigAction::Updating => {
            ensure(
                tx.inputs.iter().any(|i| i.utxo.holds(&ownership)),
                "ownership token not spent",
            )?;
            let own_address = Address::script(
                Script::ConfigValidator {
                    control_policy: *control_policy,
                }
                .hash(),
            );
            let output = tx
                .outputs_to(&own_address)
                .find(|o| o.value.quantity_of(&config) == 1)
                .ok_or_else(|| "config token must stay at the config address".to_string())?;
            check_config_output(output, *control_policy)
        }
        ConfigAction::Burning => ensure(
            config
                .name()
                .and_then(|name| tx.minted(control_policy).get(name).copied())
                == Some(-1),
            "config token must be burned",
        ),
    }
}

fn marketplace_validator(
    control_policy: &PolicyId,
    input: &ResolvedInput,
    action: &MarketplaceAction,
    tx: &Transaction,
) -> Check {
    let own_hash = Script::MarketplaceValidator {
        control_policy: *control_policy,
    }
    .hash();
    let listing: ListingDatum = input
        .utxo
        .inline_datum()
        .map_err(|e| format!("malformed listing datum: {e}"))?;
    let nft = listing.nft();
    ensure(
        input.utxo.value.quantity_of(&nft) == 1,
        "listing does not hold the listed NFT",
    )?;

    match action {
        MarketplaceAction::Buy => {
            ensure(
                tx.inputs_locked_by(&own_hash).count() == 1,
                "only one listing may be bought per transaction",
            )?;
            buy(control_policy, &listing, &nft, tx)
        }
        MarketplaceAction::Delist => seller_signed(&listing, tx),
        MarketplaceAction::Edit { new_price } => {
            seller_signed(&listing, tx)?;
            let expected = listing.with_price(*new_price);
            let relisted = tx.outputs_to(&Address::script(own_hash)).any(|o| {
                o.value == input.utxo.value
                    && o.datum
                        .as_ref()
                        .and_then(|d| d.decode::<ListingDatum>().ok())
                        .is_some_and(|d| d == expected)
            });
            ensure(relisted, "edit must re-list the same value with only the price changed")
        }
    }
}

fn buy(control_policy: &PolicyId, listing: &ListingDatum, nft: &AssetId, tx: &Transaction) -> Check {
    let config_token = control_token(*control_policy, CONFIG_TOKEN_NAME)?;
    let config: ConfigDatum = tx
        .reference_inputs_holding(&config_token)
        .next()
        .ok_or_else(|| "config not provided as a reference input".to_string())?
        .inline_datum()
        .map_err(|e| format!("malformed config datum: {e}"))?;

    let split = config
        .split_for(listing)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "no fee rule for the price asset".to_string())?;
    let price_asset = listing.price_asset().map_err(|e| e.to_string())?;

    let seller_paid = tx.paid_to(&listing.seller, &price_asset);
    if listing.seller == config.fee_address {
        ensure(seller_paid >= split.total(), "seller and fee recipient underpaid")?;
    } else {
        ensure(seller_paid >= split.seller_amount, "seller underpaid")?;
        ensure(
            tx.paid_to(&config.fee_address, &price_asset) >= split.fee,
            "marketplace fee underpaid",
        )?;
    }

    let delivered = tx.outputs.iter().any(|o| {
        o.value.quantity_of(nft) >= 1
            && o.structured_address()
                .ok()
                .and_then(|a| a.payment_key_hash())
                .is_some_and(|buyer| tx.signed_by(&buyer))
    });
    ensure(delivered, "NFT not delivered to a signing buyer")
}

fn seller_signed(listing: &ListingDatum, tx: &Transaction) -> Check {
    let seller = listing
        .seller
        .payment_key_hash()
        .ok_or_else(|| "seller is not a key credential".to_string())?;
    ensure(tx.signed_by(&seller), "seller did not sign")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{Mint, TxOutput};
    use crate::utxo::Utxo;
    use bazaar_core::{Credential, KeyHash, Network, TokenFee, TxHash, Value};

    struct Fixture {
        scripts: InstanceScripts,
        seller: Address,
        buyer: KeyHash,
        fee_address: Address,
        nft: AssetId,
    }

    fn key_address(byte: u8) -> Address {
        Address::enterprise(Credential::VerificationKey(KeyHash::new([byte; 28])))
    }

    fn bech(address: &Address) -> String {
        address.to_bech32(Network::Testnet).unwrap()
    }

    fn fixture() -> Fixture {
        Fixture {
            scripts: InstanceScripts::derive(OutRef::new(TxHash::new([1; 32]), 0)),
            seller: key_address(2),
            buyer: KeyHash::new([3; 28]),
            fee_address: key_address(4),
            nft: AssetId::token(PolicyId::new([5; 28]), AssetName::from_text("MyNFT").unwrap()),
        }
    }

    fn output(address: &Address, value: Value) -> TxOutput {
        TxOutput {
            address: bech(address),
            value,
            datum: None,
            script_ref: None,
        }
    }

    fn utxo(index: u32, address: &Address, value: Value, datum: Option<InlineData>) -> Utxo {
        Utxo {
            out_ref: OutRef::new(TxHash::new([9; 32]), index),
            address: bech(address),
            value,
            datum,
            script_ref: None,
        }
    }

    fn tx(inputs: Vec<ResolvedInput>, reference_inputs: Vec<Utxo>, outputs: Vec<TxOutput>, signer: KeyHash) -> Transaction {
        Transaction {
            hash: TxHash::new([0; 32]),
            label: "test".into(),
            inputs,
            reference_inputs,
            outputs,
            mints: vec![],
            scripts: vec![],
            signatories: vec![signer],
            fee: 0,
        }
    }

    fn listing_input(f: &Fixture, index: u32, price: u64, action: MarketplaceAction) -> ResolvedInput {
        let datum = ListingDatum::new(f.seller, &AssetId::Lovelace, price, &f.nft).unwrap();
        ResolvedInput {
            utxo: utxo(
                index,
                &f.scripts.marketplace_address(),
                Value::singleton(f.nft.clone(), 1),
                Some(InlineData::encode(&datum).unwrap()),
            ),
            redeemer: Some(InlineData::encode(&action).unwrap()),
        }
    }

    fn config_ref(f: &Fixture, rate: u64) -> Utxo {
        let config = ConfigDatum::new(f.fee_address, vec![TokenFee::new(&AssetId::Lovelace, rate)]).unwrap();
        let mut out = utxo(
            100,
            &f.scripts.config_address(),
            Value::singleton(f.scripts.config_token(), 1),
            Some(InlineData::encode(&config).unwrap()),
        );
        out.script_ref = Some(f.scripts.marketplace_validator);
        out
    }

    fn buyer_address(f: &Fixture) -> Address {
        Address::enterprise(Credential::VerificationKey(f.buyer))
    }

    fn run(f: &Fixture, input: &ResolvedInput, tx: &Transaction) -> Check {
        MarketplaceScripts.evaluate(&f.scripts.marketplace_validator, ScriptPurpose::Spend(input), tx)
    }

    #[test]
    fn test_buy_accepts_exact_split() {
        let f = fixture();
        let input = listing_input(&f, 0, 10_000_000, MarketplaceAction::Buy);
        let tx = tx(
            vec![input.clone()],
            vec![config_ref(&f, 700)],
            vec![
                output(&f.seller, Value::lovelace(9_300_000)),
                output(&f.fee_address, Value::lovelace(700_000)),
                output(&buyer_address(&f), Value::singleton(f.nft.clone(), 1)),
            ],
            f.buyer,
        );
        assert_eq!(run(&f, &input, &tx), Ok(()));
    }

    #[test]
    fn test_buy_rejects_underpaid_fee() {
        let f = fixture();
        let input = listing_input(&f, 0, 10_000_000, MarketplaceAction::Buy);
        let tx = tx(
            vec![input.clone()],
            vec![config_ref(&f, 700)],
            vec![
                output(&f.seller, Value::lovelace(9_300_000)),
                output(&f.fee_address, Value::lovelace(699_999)),
                output(&buyer_address(&f), Value::singleton(f.nft.clone(), 1)),
            ],
            f.buyer,
        );
        assert_eq!(run(&f, &input, &tx), Err("marketplace fee underpaid".to_string()));
    }

    #[test]
    fn test_buy_requires_config_reference() {
        let f = fixture();
        let input = listing_input(&f, 0, 10, MarketplaceAction::Buy);
        let tx = tx(vec![input.clone()], vec![], vec![], f.buyer);
        assert_eq!(run(&f, &input, &tx), Err("config not provided as a reference input".to_string()));
    }

    #[test]
    fn test_buy_rejects_two_listings() {
        let f = fixture();
        let first = listing_input(&f, 0, 0, MarketplaceAction::Buy);
        let second = listing_input(&f, 1, 0, MarketplaceAction::Buy);
        let tx = tx(vec![first.clone(), second], vec![config_ref(&f, 0)], vec![], f.buyer);
        assert_eq!(
            run(&f, &first, &tx),
            Err("only one listing may be bought per transaction".to_string())
        );
    }

    #[test]
    fn test_buy_rejects_nft_to_non_signer() {
        let f = fixture();
        let input = listing_input(&f, 0, 0, MarketplaceAction::Buy);
        let tx = tx(
            vec![input.clone()],
            vec![config_ref(&f, 0)],
            vec![output(&key_address(8), Value::singleton(f.nft.clone(), 1))],
            f.buyer,
        );
        assert_eq!(run(&f, &input, &tx), Err("NFT not delivered to a signing buyer".to_string()));
    }

    #[test]
    fn test_delist_needs_seller_signature() {
        let f = fixture();
        let input = listing_input(&f, 0, 10, MarketplaceAction::Delist);
        let by_buyer = tx(vec![input.clone()], vec![], vec![], f.buyer);
        assert_eq!(run(&f, &input, &by_buyer), Err("seller did not sign".to_string()));

        let seller_key = f.seller.payment_key_hash().unwrap();
        let by_seller = tx(vec![input.clone()], vec![], vec![], seller_key);
        assert_eq!(run(&f, &input, &by_seller), Ok(()));
    }

    #[test]
    fn test_edit_must_preserve_everything_but_price() {
        let f = fixture();
        let input = listing_input(&f, 0, 10, MarketplaceAction::Edit { new_price: 25 });
        let seller_key = f.seller.payment_key_hash().unwrap();
        let market = f.scripts.marketplace_address();
        let original: ListingDatum = input.utxo.inline_datum().unwrap();

        let mut good = output(&market, input.utxo.value.clone());
        good.datum = Some(InlineData::encode(&original.with_price(25)).unwrap());
        let ok_tx = tx(vec![input.clone()], vec![], vec![good], seller_key);
        assert_eq!(run(&f, &input, &ok_tx), Ok(()));

        let mut hijacked = original.with_price(25);
        hijacked.seller = key_address(7);
        let mut bad = output(&market, input.utxo.value.clone());
        bad.datum = Some(InlineData::encode(&hijacked).unwrap());
        let bad_tx = tx(vec![input.clone()], vec![], vec![bad], seller_key);
        assert!(run(&f, &input, &bad_tx).is_err());
    }

    #[test]
    fn test_listing_without_nft_rejected() {
        let f = fixture();
        let mut input = listing_input(&f, 0, 10, MarketplaceAction::Delist);
        input.utxo.value = Value::lovelace(2_000_000);
        let tx = tx(vec![input.clone()], vec![], vec![], f.seller.payment_key_hash().unwrap());
        assert_eq!(run(&f, &input, &tx), Err("listing does not hold the listed NFT".to_string()));
    }

    #[test]
    fn test_control_policy_initialize_places_config() {
        let f = fixture();
        let config = f.scripts.config_token();
        let ownership = f.scripts.ownership_token();
        let mint = Mint {
            policy: f.scripts.policy_id,
            assets: [(config.name().unwrap().clone(), 1), (ownership.name().unwrap().clone(), 1)]
                .into_iter()
                .collect(),
            redeemer: InlineData::encode(&ControlAction::Initialize).unwrap(),
        };
        let mut seed = utxo(0, &key_address(6), Value::lovelace(5_000_000), None);
        seed.out_ref = OutRef::new(TxHash::new([1; 32]), 0);
        let datum = ConfigDatum::new(f.fee_address, vec![TokenFee::new(&AssetId::Lovelace, 700)]).unwrap();
        let mut config_out = output(&f.scripts.config_address(), Value::singleton(config.clone(), 1));
        config_out.datum = Some(InlineData::encode(&datum).unwrap());
        config_out.script_ref = Some(f.scripts.marketplace_validator);

        let seed_input = ResolvedInput {
            utxo: seed,
            redeemer: None,
        };
        let mut init = tx(vec![seed_input.clone()], vec![], vec![config_out.clone()], f.buyer);
        init.mints = vec![mint.clone()];
        let evaluate = |tx: &Transaction| {
            MarketplaceScripts.evaluate(&f.scripts.control_policy, ScriptPurpose::Mint(&mint), tx)
        };
        assert_eq!(evaluate(&init), Ok(()));

        let mut misplaced = config_out;
        misplaced.address = bech(&key_address(7));
        let mut stray = tx(vec![seed_input], vec![], vec![misplaced], f.buyer);
        stray.mints = vec![mint.clone()];
        assert_eq!(
            evaluate(&stray),
            Err("config token not sent to the config address".to_string())
        );

        let mut unseeded = init.clone();
        unseeded.inputs.clear();
        assert_eq!(evaluate(&unseeded), Err("seed output not consumed".to_string()));
    }

    #[test]
    fn test_control_policy_shutdown_burns_both() {
        let f = fixture();
        let config = f.scripts.config_token();
        let ownership = f.scripts.ownership_token();
        let mint = Mint {
            policy: f.scripts.policy_id,
            assets: [(config.name().unwrap().clone(), -1), (ownership.name().unwrap().clone(), -1)]
                .into_iter()
                .collect(),
            redeemer: InlineData::encode(&ControlAction::Shutdown).unwrap(),
        };
        let mut burn = tx(vec![], vec![], vec![], f.buyer);
        burn.mints = vec![mint.clone()];
        assert_eq!(
            MarketplaceScripts.evaluate(&f.scripts.control_policy, ScriptPurpose::Mint(&mint), &burn),
            Ok(())
        );

        let partial = Mint {
            assets: [(config.name().unwrap().clone(), -1)].into_iter().collect(),
            ..mint
        };
        burn.mints = vec![partial.clone()];
        assert!(MarketplaceScripts
            .evaluate(&f.scripts.control_policy, ScriptPurpose::Mint(&partial), &burn)
            .is_err());
    }

    #[test]
    fn test_wrong_purpose_rejected() {
        let f = fixture();
        let input = listing_input(&f, 0, 10, MarketplaceAction::Delist);
        let tx = tx(vec![input.clone()], vec![], vec![], f.buyer);
        assert!(MarketplaceScripts
            .evaluate(&f.scripts.control_policy, ScriptPurpose::Spend(&input), &tx)
            .is_err());
    }
}
