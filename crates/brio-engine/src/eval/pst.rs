//! Piece-square tables.
//!
//! Tables are written from White's perspective in LERF order (index 0 =
//! A1, 63 = H8); Black lookups mirror the square vertically. Pawns and
//! the king have separate endgame tables selected by [`GamePhase`];
//! minor and major pieces use one table for both phases.

use brio_core::{Board, Color, PieceKind, Square};

use crate::eval::phase::GamePhase;

#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
    // Rank 1: pawns never stand here
      0,   0,   0,   0,   0,   0,   0,   0,
    // Rank 2
      5,  10,  10, -20, -20,  10,  10,   5,
    // Rank 3
      5,  -5, -10,   0,   0, -10,  -5,   5,
    // Rank 4
      0,   0,   0,  20,  20,   0,   0,   0,
    // Rank 5
      5,   5,  10,  25,  25,  10,   5,   5,
    // Rank 6
     10,  10,  20,  30,  30,  20,  10,  10,
    // Rank 7
     50,  50,  50,  50,  50,  50,  50,  50,
    // Rank 8: promotion resolves first
      0,   0,   0,   0,   0,   0,   0,   0,
];

/// Endgame pawns: the closer to promotion the better, files even out.
#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,
      5,   5,   5,   5,   5,   5,   5,   5,
     15,  15,  15,  15,  15,  15,  15,  15,
     30,  30,  30,  30,  30,  30,  30,  30,
     50,  50,  50,  50,  50,  50,  50,  50,
     90,  90,  90,  90,  90,  90,  90,  90,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -10,   5,   5,   5,   5,   5,   0, -10,
      0,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

/// Middlegame king: hide in a castled corner.
#[rustfmt::skip]
const KING_MG: [i32; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

/// Endgame king: centralize.
#[rustfmt::skip]
const KING_EG: [i32; 64] = [
    -50, -30, -30, -30, -30, -30, -30, -50,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -50, -40, -30, -20, -20, -30, -40, -50,
];

/// Table value for a piece of `color` on `sq` in the given phase.
#[inline]
fn table_value(kind: PieceKind, color: Color, sq: Square, phase: GamePhase) -> i32 {
    // Vertical mirror for Black: A1 <-> A8 within the same file.
    let idx = match color {
        Color::White => sq.index(),
        Color::Black => sq.index() ^ 56,
    };
    match (kind, phase) {
        (PieceKind::Pawn, GamePhase::Midgame) => PAWN_MG[idx],
        (PieceKind::Pawn, GamePhase::Endgame) => PAWN_EG[idx],
        (PieceKind::Knight, _) => KNIGHT[idx],
        (PieceKind::Bishop, _) => BISHOP[idx],
        (PieceKind::Rook, _) => ROOK[idx],
        (PieceKind::Queen, _) => QUEEN[idx],
        (PieceKind::King, GamePhase::Midgame) => KING_MG[idx],
        (PieceKind::King, GamePhase::Endgame) => KING_EG[idx],
    }
}

/// Summed piece-square score, White's perspective.
pub fn positional(board: &Board, phase: GamePhase) -> i32 {
    let mut score = 0;
    for sq in Square::all() {
        if let Some(piece) = board.piece_at(sq) {
            score += piece.color.sign() * table_value(piece.kind, piece.color, sq, phase);
        }
    }
    score
}
