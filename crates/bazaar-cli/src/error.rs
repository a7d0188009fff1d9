//! CLI error types.

use std::fmt;

use bazaar_core::CoreError;
use bazaar_ledger::LedgerError;
use bazaar_market::MarketError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// Output formatting error.
    Format(String),
    /// Codec or arithmetic failure.
    Core(CoreError),
    /// Ledger or emulator failure.
    Ledger(LedgerError),
    /// Marketplace operation failure.
    Market(MarketError),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Core(e) => write!(f, "{e}"),
            Self::Ledger(e) => write!(f, "ledger error: {e}"),
            Self::Market(e) => write!(f, "marketplace error: {e}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(e) => Some(e),
            Self::Ledger(e) => Some(e),
            Self::Market(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<LedgerError> for CliError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<MarketError> for CliError {
    fn from(err: MarketError) -> Self {
        Self::Market(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_config() {
        let err = CliError::Config("missing fee rule".into());
        assert_eq!(err.to_string(), "configuration error: missing fee rule");
    }

    #[test]
    fn cli_error_display_core() {
        let err = CliError::from(CoreError::InvalidRate { rate_bps: 10_001 });
        assert!(err.to_string().contains("10001"));
    }

    #[test]
    fn cli_error_from_market_error() {
        let err = CliError::from(MarketError::ConfigMissing);
        assert!(matches!(err, CliError::Market(MarketError::ConfigMissing)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
