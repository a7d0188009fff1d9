//! Instance inspection command implementation.

use std::io::Write;

use bazaar_core::{InstanceId, Network};

use crate::cli::InstanceCommands;
use crate::error::CliError;
use crate::output::{InstanceView, OutputFormat};

/// Instance command executor.
pub struct InstanceCommand {
    network: Network,
    configured: Option<InstanceId>,
}

impl InstanceCommand {
    /// Create a new instance command for `network`, falling back to the
    /// `configured` instance when none is given.
    #[must_use]
    pub const fn new(network: Network, configured: Option<InstanceId>) -> Self {
        Self { network, configured }
    }

    /// Execute an instance subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance id does not parse or none is
    /// given or configured.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &InstanceCommands,
    ) -> Result<(), CliError> {
        match command {
            InstanceCommands::Show { instance_id } => {
                let id = match instance_id {
                    Some(text) => text
                        .parse::<InstanceId>()
                        .map_err(|e| CliError::InvalidArgument(e.to_string()))?,
                    None => self.configured.clone().ok_or_else(|| {
                        CliError::InvalidArgument("no instance id given and none configured".into())
                    })?,
                };
                format.write(writer, &self.describe(&id)?)
            }
        }
    }

    /// Derive the view of `id` without touching any ledger.
    ///
    /// # Errors
    ///
    /// Propagates address encoding failures.
    pub fn describe(&self, id: &InstanceId) -> Result<InstanceView, CliError> {
        let scripts = id.scripts();
        Ok(InstanceView {
            instance_id: id.to_string(),
            name: id.name.clone(),
            seed: id.seed.to_string(),
            network: self.network,
            policy_id: scripts.policy_id.to_hex(),
            config_hash: scripts.config_hash.to_hex(),
            marketplace_hash: scripts.marketplace_hash.to_hex(),
            config_address: scripts.config_address_bech32(self.network)?,
            marketplace_address: scripts.marketplace_address_bech32(self.network)?,
            config_token: scripts.config_token().unit(),
            ownership_token: scripts.ownership_token().unit(),
        })
    }
}
