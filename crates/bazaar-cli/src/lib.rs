//! # bazaar-cli
//!
//! Operator command-line interface for the Bazaar marketplace.
//!
//! Provides commands for:
//! - Fee split arithmetic
//! - Address decoding and construction
//! - Inspecting the scripts and addresses of an instance
//! - Running a full marketplace lifecycle on the in-memory emulator

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{AddressCommands, Cli, Commands, Format, InstanceCommands, NetworkArg, SimulateArgs};
pub use config::{CliConfig, FeeRule};
pub use error::CliError;
pub use output::OutputFormat;
