//! Bazaar CLI binary entrypoint.
//!
//! This is the main entry point for the `bazaar` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bazaar_cli::cli::{Cli, Commands};
use bazaar_cli::commands::{AddressCommand, InstanceCommand, SimulateCommand, SplitCommand};
use bazaar_cli::config::CliConfig;
use bazaar_cli::output::OutputFormat;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), bazaar_cli::CliError> {
    let config = CliConfig::load(cli.config.as_deref(), cli.network.map(Into::into))?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Split { price, rate_bps } => {
            SplitCommand::execute(&mut stdout, &format, price, rate_bps)?;
        }
        Commands::Address { command } => {
            let cmd = AddressCommand::new(config.network);
            cmd.execute(&mut stdout, &format, &command)?;
        }
        Commands::Instance { command } => {
            let cmd = InstanceCommand::new(config.network, config.instance_id.clone());
            cmd.execute(&mut stdout, &format, &command)?;
        }
        Commands::Simulate(args) => {
            let cmd = SimulateCommand::new(config);
            cmd.execute(&mut stdout, &format, &args).await?;
        }
    }

    Ok(())
}
