//! JSON opening book.
//!
//! The book maps a position's FEN key to candidate replies. Styles that
//! prefer gambits filter the candidates: capturing replies (accepting a
//! gambit) come first, then moves flagged as gambit offers, then the
//! full list. The final pick is uniform over the surviving candidates.

use std::collections::HashMap;
use std::path::Path;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use brio_core::{Board, Move, is_legal};

use crate::personality::Personality;

/// Failure to load a book file.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("cannot read book file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse book file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One candidate reply in a book line.
#[derive(Debug, Clone, Deserialize)]
pub struct BookMove {
    /// The move in UCI notation.
    pub uci: String,
    /// Human note shown when the move is played.
    #[serde(default)]
    pub comment: String,
    /// Whether this move offers a gambit.
    #[serde(default)]
    pub is_gambit: bool,
}

/// Opening lines keyed by [`Board::fen_key`].
#[derive(Debug, Default)]
pub struct OpeningBook {
    entries: HashMap<String, Vec<BookMove>>,
}

impl OpeningBook {
    /// A book with no lines; every lookup misses.
    pub fn empty() -> OpeningBook {
        OpeningBook::default()
    }

    /// Build a book from already-parsed entries.
    pub fn from_entries(entries: HashMap<String, Vec<BookMove>>) -> OpeningBook {
        OpeningBook { entries }
    }

    /// Load a JSON book file.
    pub fn load(path: &Path) -> Result<OpeningBook, BookError> {
        let json = std::fs::read_to_string(path)?;
        let entries = serde_json::from_str(&json)?;
        Ok(OpeningBook { entries })
    }

    /// Load from `path` if present; an absent or broken file yields an
    /// empty book and a log line, never an error.
    pub fn load_or_empty(path: &Path) -> OpeningBook {
        if !path.exists() {
            return OpeningBook::empty();
        }
        match OpeningBook::load(path) {
            Ok(book) => {
                info!(path = %path.display(), "opening book loaded");
                book
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "opening book rejected");
                OpeningBook::empty()
            }
        }
    }

    /// Whether the book has any lines at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick a book reply for this position, if one exists.
    ///
    /// Unparseable or illegal entries are skipped. Consulted before any
    /// search is started; on a hit the driver plays the move directly.
    pub fn try_get_move(
        &self,
        board: &Board,
        personality: &Personality,
        rng: &mut impl Rng,
    ) -> Option<Move> {
        let candidates = self.entries.get(&board.fen_key())?;

        let playable: Vec<(Move, &BookMove)> = candidates
            .iter()
            .filter_map(|bm| {
                Move::from_uci(&bm.uci, board)
                    .filter(|mv| is_legal(board, *mv))
                    .map(|mv| (mv, bm))
            })
            .collect();
        if playable.is_empty() {
            return None;
        }

        let pool: Vec<&(Move, &BookMove)> = if personality.prefers_gambits {
            let accepting: Vec<_> = playable
                .iter()
                .filter(|(mv, _)| board.is_capture(*mv))
                .collect();
            if !accepting.is_empty() {
                info!(style = %personality.name, "book: accepting the gambit");
                accepting
            } else {
                let offers: Vec<_> = playable.iter().filter(|(_, bm)| bm.is_gambit).collect();
                if offers.is_empty() {
                    playable.iter().collect()
                } else {
                    info!(style = %personality.name, "book: offering a gambit");
                    offers
                }
            }
        } else {
            playable.iter().collect()
        };

        let (mv, bm) = pool[rng.gen_range(0..pool.len())];
        info!(mv = %mv, comment = %bm.comment, "book move");
        Some(*mv)
    }
}
