//! Pawn-structure terms: doubled, isolated, and rook-blockaded pawns.

use brio_core::{Board, Color, PieceKind, Square};

/// Penalty per extra pawn stacked on a file.
const DOUBLED_PAWN_PENALTY: i32 = 12;

/// Penalty for a pawn with no friendly pawn on either adjacent file.
const ISOLATED_PAWN_PENALTY: i32 = 15;

/// Penalty for a pawn with an enemy rook ahead of it on its file.
const ROOK_BLOCKADE_PENALTY: i32 = 8;

/// Pawn-structure score, White's perspective.
pub fn structure(board: &Board) -> i32 {
    score_for(board, Color::White) - score_for(board, Color::Black)
}

/// Negative sum of this side's structural penalties.
fn score_for(board: &Board, color: Color) -> i32 {
    // Pawns per file, for the doubled and isolated terms.
    let mut per_file = [0i32; 8];
    for sq in Square::all() {
        if board.piece_at(sq) == Some(brio_core::Piece::new(color, PieceKind::Pawn)) {
            per_file[sq.file() as usize] += 1;
        }
    }

    let mut penalty = 0;

    for file in 0..8usize {
        let count = per_file[file];
        if count > 1 {
            penalty += (count - 1) * DOUBLED_PAWN_PENALTY;
        }
        if count > 0 {
            let left = if file > 0 { per_file[file - 1] } else { 0 };
            let right = if file < 7 { per_file[file + 1] } else { 0 };
            if left == 0 && right == 0 {
                penalty += count * ISOLATED_PAWN_PENALTY;
            }
        }
    }

    // Rook blockades, checked per pawn along its advance direction.
    for sq in Square::all() {
        if board.piece_at(sq) != Some(brio_core::Piece::new(color, PieceKind::Pawn)) {
            continue;
        }
        let mut current = sq;
        while let Some(ahead) = current.offset(0, color.forward()) {
            if let Some(piece) = board.piece_at(ahead) {
                if piece.color != color && piece.kind == PieceKind::Rook {
                    penalty += ROOK_BLOCKADE_PENALTY;
                }
                break;
            }
            current = ahead;
        }
    }

    -penalty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn starting_position_has_no_penalties() {
        assert_eq!(structure(&Board::starting_position()), 0);
    }

    #[test]
    fn doubled_pawns_penalised() {
        // White pawns e2+e3 (doubled, not isolated thanks to d2/f2).
        let b = board("4k3/8/8/8/8/4P3/3PPP2/4K3 w - - 0 1");
        let healthy = board("4k3/8/8/8/8/8/3PPP2/4K3 w - - 0 1");
        assert_eq!(
            structure(&b),
            structure(&healthy) - DOUBLED_PAWN_PENALTY,
        );
    }

    #[test]
    fn isolated_pawn_penalised() {
        // Single a-pawn has no neighbors.
        let isolated = board("4k3/8/8/8/8/8/P7/4K3 w - - 0 1");
        let connected = board("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1");
        assert_eq!(structure(&isolated), -ISOLATED_PAWN_PENALTY);
        assert_eq!(structure(&connected), 0);
    }

    #[test]
    fn rook_ahead_blockades() {
        // Black rook e7 eyes the white e-pawn from ahead.
        let blockaded = board("4k3/4r3/8/8/8/8/3PPP2/4K3 w - - 0 1");
        let free = board("4k3/8/8/8/8/8/3PPP2/4K3 w - - 0 1");
        assert_eq!(structure(&blockaded), structure(&free) - ROOK_BLOCKADE_PENALTY);
        // A rook behind the pawn is no blockade.
        let behind = board("4k3/8/8/8/8/3PP3/8/3r3K w - - 0 1");
        assert_eq!(structure(&behind), 0);
    }

    #[test]
    fn black_penalties_raise_the_score() {
        // Doubled black pawns help White.
        let b = board("4k3/3ppp2/4p3/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(structure(&b), DOUBLED_PAWN_PENALTY);
    }
}
