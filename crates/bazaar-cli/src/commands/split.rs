//! Fee split command implementation.

use std::io::Write;

use bazaar_core::compute_split;

use crate::error::CliError;
use crate::output::{OutputFormat, SplitView};

/// Split command executor.
pub struct SplitCommand;

impl SplitCommand {
    /// Compute and print the split of `price` at `rate_bps`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is outside `[0, 10000]`.
    pub fn execute<W: Write>(writer: &mut W, format: &OutputFormat, price: u64, rate_bps: u64) -> Result<(), CliError> {
        let split = compute_split(price, rate_bps)?;
        let view = SplitView {
            price,
            rate_bps,
            fee: split.fee,
            seller_amount: split.seller_amount,
        };
        format.write(writer, &view)
    }
}
