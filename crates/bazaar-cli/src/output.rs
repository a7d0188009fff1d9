//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use bazaar_core::{Address, Credential, Network, StakeCredential};
use bazaar_market::MarketStatus;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A price split between fee recipient and seller.
#[derive(Debug, Clone, Serialize)]
pub struct SplitView {
    /// Asking price.
    pub price: u64,
    /// Fee rate in basis points.
    pub rate_bps: u64,
    /// Amount to the fee recipient.
    pub fee: u64,
    /// Amount to the seller.
    pub seller_amount: u64,
}

impl TableDisplay for SplitView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Price:          {}", self.price)?;
        writeln!(writer, "Rate:           {} bps", self.rate_bps)?;
        writeln!(writer, "Fee:            {}", self.fee)?;
        writeln!(writer, "Seller amount:  {}", self.seller_amount)?;
        Ok(())
    }
}

/// One credential of an address.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialView {
    /// `key`, `script`, or `pointer`.
    pub kind: String,
    /// Hash hex, or `slot/tx/cert` for pointers.
    pub value: String,
}

impl From<&Credential> for CredentialView {
    fn from(credential: &Credential) -> Self {
        let kind = match credential {
            Credential::VerificationKey(_) => "key",
            Credential::Script(_) => "script",
        };
        Self {
            kind: kind.to_string(),
            value: credential.hash().to_hex(),
        }
    }
}

impl From<&StakeCredential> for CredentialView {
    fn from(stake: &StakeCredential) -> Self {
        match stake {
            StakeCredential::Inline(credential) => credential.into(),
            StakeCredential::Pointer(pointer) => Self {
                kind: "pointer".to_string(),
                value: format!("{}/{}/{}", pointer.slot, pointer.tx_index, pointer.cert_index),
            },
        }
    }
}

/// A decoded address.
#[derive(Debug, Clone, Serialize)]
pub struct AddressView {
    /// Bech32 text.
    pub address: String,
    /// Network it belongs to.
    pub network: Network,
    /// `base`, `pointer`, or `enterprise`.
    pub kind: String,
    /// Payment credential.
    pub payment: CredentialView,
    /// Stake credential, if any.
    pub stake: Option<CredentialView>,
}

impl AddressView {
    /// View of `address` encoded as `text` on `network`.
    #[must_use]
    pub fn new(text: String, network: Network, address: &Address) -> Self {
        Self {
            address: text,
            network,
            kind: address.kind().to_string(),
            payment: (&address.payment).into(),
            stake: address.stake.as_ref().map(Into::into),
        }
    }
}

impl TableDisplay for AddressView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Address:  {}", self.address)?;
        writeln!(writer, "Network:  {}", self.network)?;
        writeln!(writer, "Kind:     {}", self.kind)?;
        writeln!(writer, "Payment:  {} {}", self.payment.kind, self.payment.value)?;
        match &self.stake {
            Some(stake) => writeln!(writer, "Stake:    {} {}", stake.kind, stake.value)?,
            None => writeln!(writer, "Stake:    none")?,
        }
        Ok(())
    }
}

/// Everything derived from an instance id.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceView {
    /// Instance id text.
    pub instance_id: String,
    /// Human-readable name.
    pub name: String,
    /// Seed output reference.
    pub seed: String,
    /// Network the addresses are encoded for.
    pub network: Network,
    /// Control policy id.
    pub policy_id: String,
    /// Config validator hash.
    pub config_hash: String,
    /// Marketplace validator hash.
    pub marketplace_hash: String,
    /// Config validator address.
    pub config_address: String,
    /// Marketplace validator address.
    pub marketplace_address: String,
    /// Config token unit.
    pub config_token: String,
    /// Ownership token unit.
    pub ownership_token: String,
}

impl TableDisplay for InstanceView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Instance {}", self.name)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Id:                   {}", self.instance_id)?;
        writeln!(writer, "Seed:                 {}", self.seed)?;
        writeln!(writer, "Network:              {}", self.network)?;
        writeln!(writer)?;
        writeln!(writer, "Scripts")?;
        writeln!(writer, "  Policy id:          {}", self.policy_id)?;
        writeln!(writer, "  Config validator:   {}", self.config_hash)?;
        writeln!(writer, "  Market validator:   {}", self.marketplace_hash)?;
        writeln!(writer)?;
        writeln!(writer, "Addresses")?;
        writeln!(writer, "  Config:             {}", self.config_address)?;
        writeln!(writer, "  Marketplace:        {}", self.marketplace_address)?;
        writeln!(writer)?;
        writeln!(writer, "Control tokens")?;
        writeln!(writer, "  Config:             {}", self.config_token)?;
        writeln!(writer, "  Ownership:          {}", self.ownership_token)?;
        Ok(())
    }
}

/// A submitted lifecycle transaction.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    /// Lifecycle action.
    pub action: String,
    /// Transaction id.
    pub tx_hash: String,
}

/// Outcome of a simulated lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Instance created.
    pub instance_id: String,
    /// Network simulated.
    pub network: Network,
    /// Transactions in order.
    pub steps: Vec<StepView>,
    /// Listing price in lovelace.
    pub price: u64,
    /// Fee the config charged.
    pub fee: u64,
    /// Seller proceeds the config allowed.
    pub seller_amount: u64,
    /// Lovelace the seller actually gained.
    pub seller_received: u64,
    /// Lovelace the fee address actually gained.
    pub fee_received: u64,
    /// Whether the buyer ended up with the NFT.
    pub buyer_holds_nft: bool,
    /// Final instance state.
    pub status: MarketStatus,
}

impl TableDisplay for SimulationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Simulation on {}", self.network)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Instance:  {}", self.instance_id)?;
        writeln!(writer)?;
        writeln!(writer, "{:<16}  TX HASH", "ACTION")?;
        writeln!(writer, "{}", "─".repeat(82))?;
        for step in &self.steps {
            writeln!(writer, "{:<16}  {}", step.action, step.tx_hash)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Price:            {}", self.price)?;
        writeln!(writer, "Fee:              {}", self.fee)?;
        writeln!(writer, "Seller amount:    {}", self.seller_amount)?;
        writeln!(writer, "Seller received:  {}", self.seller_received)?;
        writeln!(writer, "Fee received:     {}", self.fee_received)?;
        writeln!(writer, "Buyer holds NFT:  {}", if self.buyer_holds_nft { "yes" } else { "no" })?;
        writeln!(writer, "Status:           {}", status_label(self.status))?;
        Ok(())
    }
}

const fn status_label(status: MarketStatus) -> &'static str {
    match status {
        MarketStatus::Uninitialized => "uninitialized",
        MarketStatus::Active => "active",
        MarketStatus::ShutDown => "shut down",
    }
}
