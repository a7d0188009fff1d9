//! Address command implementation.
//!
//! Provides subcommands for:
//! - Decoding a bech32 address into its credentials
//! - Building an address from credential hashes

use std::io::Write;

use bazaar_core::{Address, Credential, KeyHash, Network, StakeCredential};

use crate::cli::AddressCommands;
use crate::error::CliError;
use crate::output::{AddressView, OutputFormat};

/// Address command executor.
pub struct AddressCommand {
    network: Network,
}

impl AddressCommand {
    /// Create a new address command building for `network`.
    #[must_use]
    pub const fn new(network: Network) -> Self {
        Self { network }
    }

    /// Execute an address subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error for undecodable addresses or malformed hashes.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &AddressCommands,
    ) -> Result<(), CliError> {
        let view = match command {
            AddressCommands::Inspect { address } => Self::inspect(address)?,
            AddressCommands::Build {
                key,
                script,
                stake_key,
                stake_script,
            } => {
                let payment = credential(key.as_deref(), script.as_deref())?
                    .ok_or_else(|| CliError::InvalidArgument("one of --key or --script is required".into()))?;
                let stake = credential(stake_key.as_deref(), stake_script.as_deref())?.map(StakeCredential::Inline);
                self.build(Address::new(payment, stake))?
            }
        };
        format.write(writer, &view)
    }

    /// Decode `address`, keeping the network it was encoded for.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported or malformed addresses.
    pub fn inspect(address: &str) -> Result<AddressView, CliError> {
        let (network, decoded) = Address::decode_with_network(address)?;
        Ok(AddressView::new(address.to_string(), network, &decoded))
    }

    /// Encode `address` on the configured network.
    ///
    /// # Errors
    ///
    /// Propagates encoding failures.
    pub fn build(&self, address: Address) -> Result<AddressView, CliError> {
        let text = address.to_bech32(self.network)?;
        Ok(AddressView::new(text, self.network, &address))
    }
}

fn credential(key: Option<&str>, script: Option<&str>) -> Result<Option<Credential>, CliError> {
    let parse = |hex: &str| {
        KeyHash::from_hex(hex).map_err(|e| CliError::InvalidArgument(format!("credential hash '{hex}': {e}")))
    };
    match (key, script) {
        (Some(key), None) => Ok(Some(Credential::VerificationKey(parse(key)?))),
        (None, Some(script)) => Ok(Some(Credential::Script(parse(script)?))),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Err(CliError::InvalidArgument(
            "a credential is either a key or a script, not both".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> String {
        "01".repeat(28)
    }

    fn script() -> String {
        "02".repeat(28)
    }

    #[test]
    fn build_then_inspect_round_trips() {
        let cmd = AddressCommand::new(Network::Mainnet);
        let payment = credential(None, Some(&script())).unwrap().unwrap();
        let stake = credential(Some(&key()), None).unwrap().map(StakeCredential::Inline);
        let built = cmd.build(Address::new(payment, stake)).unwrap();
        assert!(built.address.starts_with("addr1"));
        assert_eq!(built.kind, "base");

        let inspected = AddressCommand::inspect(&built.address).unwrap();
        assert_eq!(inspected.network, Network::Mainnet);
        assert_eq!(inspected.payment.kind, "script");
        assert_eq!(inspected.stake.map(|s| s.value), Some(key()));
    }

    #[test]
    fn rejects_short_hash() {
        assert!(matches!(credential(Some("abcd"), None), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_garbage_address() {
        assert!(AddressCommand::inspect("not an address").is_err());
    }
}
