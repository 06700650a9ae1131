//! UCI protocol errors.

use thiserror::Error;

/// Failure to parse or execute a UCI command.
#[derive(Debug, Error)]
pub enum UciError {
    #[error("malformed position command")]
    MalformedPosition,

    #[error("invalid FEN: {fen}")]
    InvalidFen { fen: String },

    #[error("invalid or illegal move: {uci_move}")]
    InvalidMove { uci_move: String },

    #[error("missing value for '{token}'")]
    MissingValue { token: String },

    #[error("invalid value for '{token}'")]
    InvalidValue { token: String },

    #[error("stdin closed: {0}")]
    Io(#[from] std::io::Error),
}
