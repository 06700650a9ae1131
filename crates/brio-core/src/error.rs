//! Error types for position parsing.

use thiserror::Error;

/// Failure to parse a FEN string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN must have at least 4 fields, got {0}")]
    FieldCount(usize),

    #[error("piece placement must describe 8 ranks, got {0}")]
    RankCount(usize),

    #[error("rank '{0}' does not describe exactly 8 files")]
    RankWidth(String),

    #[error("invalid piece character '{0}'")]
    InvalidPiece(char),

    #[error("invalid side to move '{0}'")]
    InvalidSideToMove(String),

    #[error("invalid castling field '{0}'")]
    InvalidCastling(String),

    #[error("invalid en passant square '{0}'")]
    InvalidEnPassant(String),

    #[error("invalid clock field '{0}'")]
    InvalidClock(String),

    #[error("each side must have exactly one king")]
    KingCount,
}
