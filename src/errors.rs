//! Error types for the casino session ledger
//!
//! Every failure is reported to the caller as a structured value; nothing here
//! is fatal to the process.

use crate::games::types::Chips;

/// Root error type for all ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Session active/inactive mismatch or an action the round cannot take
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Non-positive or malformed numeric input
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: need ₹{required}, have ₹{available}")]
    InsufficientBalance { required: Chips, available: Chips },

    /// Cash-out request larger than the stake on the table
    #[error("Cannot cash out ₹{requested} from a ₹{bet} bet")]
    ExceedsBet { requested: Chips, bet: Chips },

    #[error("No games played in this session")]
    EmptyLog,

    #[error("Unknown side bet: {0}")]
    UnknownSideBet(String),

    #[error("Chart error: {0}")]
    Render(#[from] ChartError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Chart generation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("Cannot render a chart for an empty game log")]
    EmptyLog,

    #[error("Chart rendering disabled")]
    Disabled,

    #[error("Chart area {width}x{height} is too small")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to write chart: {0}")]
    WriteFailed(String),
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

/// Failures of the text command host
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help' for the command list")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{0}' is not a valid amount")]
    InvalidNumber(String),

    #[error("Side bet '{0}' must look like name=amount")]
    MalformedSideBet(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl LedgerError {
    /// Short machine-readable code for hosts that map errors to replies
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidState(_) => "INVALID_STATE",
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::ExceedsBet { .. } => "EXCEEDS_BET",
            LedgerError::EmptyLog => "EMPTY_LOG",
            LedgerError::UnknownSideBet(_) => "UNKNOWN_SIDE_BET",
            LedgerError::Render(_) => "RENDER_ERROR",
            LedgerError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        LedgerError::InvalidState(msg.into())
    }

    pub(crate) fn invalid_amount(msg: impl Into<String>) -> Self {
        LedgerError::InvalidAmount(msg.into())
    }
}

impl From<std::io::Error> for ChartError {
    fn from(e: std::io::Error) -> Self {
        ChartError::WriteFailed(e.to_string())
    }
}

impl From<std::fmt::Error> for ChartError {
    fn from(e: std::fmt::Error) -> Self {
        ChartError::WriteFailed(e.to_string())
    }
}

// Convenience type alias for Results
pub type LedgerResult<T> = Result<T, LedgerError>;
pub type CommandResult<T> = Result<T, CommandError>;
