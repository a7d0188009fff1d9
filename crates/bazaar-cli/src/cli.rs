//! Command-line argument parsing with clap.

use std::path::PathBuf;

use bazaar_core::Network;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Bazaar - NFT marketplace transaction protocol tooling.
#[derive(Parser, Debug, Clone)]
#[command(name = "bazaar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(short, long, env = "BAZAAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Network, overriding the configuration file.
    #[arg(short, long, value_enum, env = "BAZAAR_NETWORK")]
    pub network: Option<NetworkArg>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NetworkArg {
    /// Production network.
    Mainnet,
    /// Test network.
    Testnet,
}

impl From<NetworkArg> for Network {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Mainnet => Self::Mainnet,
            NetworkArg::Testnet => Self::Testnet,
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Split a price into marketplace fee and seller proceeds.
    Split {
        /// Price in the asset's smallest unit.
        price: u64,
        /// Fee rate in basis points (0-10000).
        rate_bps: u64,
    },

    /// Decode or build addresses.
    Address {
        /// Address subcommand to execute.
        #[command(subcommand)]
        command: AddressCommands,
    },

    /// Inspect a marketplace instance.
    Instance {
        /// Instance subcommand to execute.
        #[command(subcommand)]
        command: InstanceCommands,
    },

    /// Run initialize, list, buy, and shutdown on the in-memory emulator.
    Simulate(SimulateArgs),
}

/// Address subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AddressCommands {
    /// Decode a bech32 address into its credentials.
    Inspect {
        /// Bech32 address.
        address: String,
    },

    /// Build a bech32 address from credential hashes.
    Build {
        /// Payment verification-key hash (hex).
        #[arg(long, conflicts_with = "script", required_unless_present = "script")]
        key: Option<String>,

        /// Payment script hash (hex).
        #[arg(long)]
        script: Option<String>,

        /// Stake verification-key hash (hex).
        #[arg(long, conflicts_with = "stake_script")]
        stake_key: Option<String>,

        /// Stake script hash (hex).
        #[arg(long)]
        stake_script: Option<String>,
    },
}

/// Instance subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum InstanceCommands {
    /// Show the scripts, addresses, and control tokens derived from an id.
    Show {
        /// Instance id (`<seed tx hash>-<seed index>-<name hex>`); defaults
        /// to the configured instance.
        instance_id: Option<String>,
    },
}

/// Arguments for the simulate command.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Marketplace name.
    #[arg(long, default_value = "bazaar")]
    pub name: String,

    /// Listing price in lovelace.
    #[arg(long, default_value_t = 10_000_000)]
    pub price: u64,

    /// Shut the marketplace down at the end.
    #[arg(long)]
    pub shutdown: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_split() {
        let cli = Cli::parse_from(["bazaar", "split", "10000000", "700"]);
        assert!(matches!(
            cli.command,
            Commands::Split {
                price: 10_000_000,
                rate_bps: 700
            }
        ));
        assert_eq!(cli.format, Format::Table);
    }

    #[test]
    fn parses_global_flags() {
        let cli = Cli::parse_from(["bazaar", "--network", "mainnet", "-f", "json", "split", "1", "2"]);
        assert_eq!(cli.network, Some(NetworkArg::Mainnet));
        assert_eq!(cli.format, Format::Json);
        assert_eq!(Network::from(NetworkArg::Mainnet), Network::Mainnet);
    }

    #[test]
    fn address_build_requires_payment() {
        assert!(Cli::try_parse_from(["bazaar", "address", "build"]).is_err());
        assert!(Cli::try_parse_from(["bazaar", "address", "build", "--key", "aa", "--script", "bb"]).is_err());
        assert!(Cli::try_parse_from(["bazaar", "address", "build", "--script", "bb"]).is_ok());
    }

    #[test]
    fn instance_show_id_is_optional() {
        let cli = Cli::parse_from(["bazaar", "instance", "show"]);
        assert!(matches!(
            cli.command,
            Commands::Instance {
                command: InstanceCommands::Show { instance_id: None }
            }
        ));
    }

    #[test]
    fn simulate_defaults() {
        let cli = Cli::parse_from(["bazaar", "simulate"]);
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.name, "bazaar");
        assert_eq!(args.price, 10_000_000);
        assert!(!args.shutdown);
    }
}
