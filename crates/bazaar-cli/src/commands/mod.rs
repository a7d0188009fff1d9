//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`split`] - Fee split arithmetic
//! - [`address`] - Address decoding and construction
//! - [`instance`] - Instance inspection
//! - [`simulate`] - Lifecycle simulation on the emulator

pub mod address;
pub mod instance;
pub mod simulate;
pub mod split;

pub use address::AddressCommand;
pub use instance::InstanceCommand;
pub use simulate::SimulateCommand;
pub use split::SplitCommand;
