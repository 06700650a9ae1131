//! Pseudo-legal move generation.
//!
//! Generators visit moves through a callback and do not test whether the
//! mover's own king ends up attacked; the search applies that filter after
//! making each move. Castling is the one exception: the king's current and
//! crossing squares are checked here because no later filter sees them.

use crate::board::{BISHOP_DIRS, Board, KING_STEPS, KNIGHT_STEPS, ROOK_DIRS};
use crate::chess_move::{Move, PromotionPiece};
use crate::color::Color;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Visit every pseudo-legal move for the side to move.
pub fn collect_moves<F: FnMut(Move)>(board: &Board, mut visit: F) {
    for from in Square::all() {
        if let Some(piece) = board.piece_at(from)
            && piece.color == board.side_to_move()
        {
            piece_moves(board, from, piece, false, &mut visit);
        }
    }
}

/// Visit every pseudo-legal capture (including en passant) for the side to move.
pub fn collect_captures<F: FnMut(Move)>(board: &Board, mut visit: F) {
    for from in Square::all() {
        if let Some(piece) = board.piece_at(from)
            && piece.color == board.side_to_move()
        {
            piece_moves(board, from, piece, true, &mut visit);
        }
    }
}

/// Visit the pseudo-legal moves of the single piece on `from`, if it
/// belongs to the side to move.
pub fn collect_moves_from<F: FnMut(Move)>(board: &Board, from: Square, mut visit: F) {
    if let Some(piece) = board.piece_at(from)
        && piece.color == board.side_to_move()
    {
        piece_moves(board, from, piece, false, &mut visit);
    }
}

/// All strictly legal moves: pseudo-legal minus own-king-in-check.
pub fn generate_legal_moves(board: &Board) -> Vec<Move> {
    let mover = board.side_to_move();
    let mut moves = Vec::with_capacity(48);
    collect_moves(board, |mv| moves.push(mv));
    moves.retain(|&mv| !board.make_move(mv).is_in_check(mover));
    moves
}

/// Whether `mv` is a legal move in this position.
pub fn is_legal(board: &Board, mv: Move) -> bool {
    generate_legal_moves(board).contains(&mv)
}

fn piece_moves<F: FnMut(Move)>(
    board: &Board,
    from: Square,
    piece: Piece,
    captures_only: bool,
    visit: &mut F,
) {
    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, piece.color, captures_only, visit),
        PieceKind::Knight => step_moves(board, from, piece.color, &KNIGHT_STEPS, captures_only, visit),
        PieceKind::Bishop => ray_moves(board, from, piece.color, &BISHOP_DIRS, captures_only, visit),
        PieceKind::Rook => ray_moves(board, from, piece.color, &ROOK_DIRS, captures_only, visit),
        PieceKind::Queen => {
            ray_moves(board, from, piece.color, &BISHOP_DIRS, captures_only, visit);
            ray_moves(board, from, piece.color, &ROOK_DIRS, captures_only, visit);
        }
        PieceKind::King => {
            step_moves(board, from, piece.color, &KING_STEPS, captures_only, visit);
            if !captures_only {
                castle_moves(board, from, piece.color, visit);
            }
        }
    }
}

/// Knight and king moves: fixed steps onto empty or enemy squares.
fn step_moves<F: FnMut(Move)>(
    board: &Board,
    from: Square,
    color: Color,
    steps: &[(i8, i8); 8],
    captures_only: bool,
    visit: &mut F,
) {
    for &(df, dr) in steps {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match board.piece_at(to) {
            None if !captures_only => visit(Move::normal(from, to)),
            Some(target) if target.color != color => visit(Move::normal(from, to)),
            _ => {}
        }
    }
}

/// Slider moves: walk each ray until the first occupied square.
fn ray_moves<F: FnMut(Move)>(
    board: &Board,
    from: Square,
    color: Color,
    dirs: &[(i8, i8); 4],
    captures_only: bool,
    visit: &mut F,
) {
    for &(df, dr) in dirs {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            match board.piece_at(to) {
                None => {
                    if !captures_only {
                        visit(Move::normal(from, to));
                    }
                    current = to;
                }
                Some(target) => {
                    if target.color != color {
                        visit(Move::normal(from, to));
                    }
                    break;
                }
            }
        }
    }
}

fn pawn_moves<F: FnMut(Move)>(
    board: &Board,
    from: Square,
    color: Color,
    captures_only: bool,
    visit: &mut F,
) {
    let forward = color.forward();
    let promotion_rank = match color {
        Color::White => 7,
        Color::Black => 0,
    };
    let start_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };

    // Diagonal captures, capture-promotions, en passant.
    for df in [-1i8, 1] {
        let Some(to) = from.offset(df, forward) else {
            continue;
        };
        let is_enemy = board.piece_at(to).is_some_and(|p| p.color != color);
        if is_enemy {
            if to.rank() == promotion_rank {
                for promo in PromotionPiece::ALL {
                    visit(Move::promotion(from, to, promo));
                }
            } else {
                visit(Move::normal(from, to));
            }
        } else if board.en_passant() == Some(to) {
            visit(Move::en_passant(from, to));
        }
    }

    if captures_only {
        return;
    }

    // Single push; promotions replace the quiet push on the last rank.
    let Some(one) = from.offset(0, forward) else {
        return;
    };
    if board.piece_at(one).is_none() {
        if one.rank() == promotion_rank {
            for promo in PromotionPiece::ALL {
                visit(Move::promotion(from, one, promo));
            }
        } else {
            visit(Move::normal(from, one));

            // Double push from the starting rank.
            if from.rank() == start_rank
                && let Some(two) = one.offset(0, forward)
                && board.piece_at(two).is_none()
            {
                visit(Move::normal(from, two));
            }
        }
    }
}

fn castle_moves<F: FnMut(Move)>(board: &Board, from: Square, color: Color, visit: &mut F) {
    let home = match color {
        Color::White => Square::E1,
        Color::Black => Square::E8,
    };
    if from != home || board.is_square_attacked(home, !color) {
        return;
    }
    let rank = home.rank();

    // Kingside: f and g empty, f not attacked (g is covered by the
    // post-move legality filter).
    if board.castling().allows(color, true) {
        let f_sq = Square::new(5, rank);
        let g_sq = Square::new(6, rank);
        if board.piece_at(f_sq).is_none()
            && board.piece_at(g_sq).is_none()
            && !board.is_square_attacked(f_sq, !color)
        {
            visit(Move::castle(from, g_sq));
        }
    }

    // Queenside: b, c, d empty, d not attacked.
    if board.castling().allows(color, false) {
        let b_sq = Square::new(1, rank);
        let c_sq = Square::new(2, rank);
        let d_sq = Square::new(3, rank);
        if board.piece_at(b_sq).is_none()
            && board.piece_at(c_sq).is_none()
            && board.piece_at(d_sq).is_none()
            && !board.is_square_attacked(d_sq, !color)
        {
            visit(Move::castle(from, c_sq));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    /// Count legal leaf nodes to the given depth.
    fn perft(board: &Board, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        generate_legal_moves(board)
            .iter()
            .map(|&mv| perft(&board.make_move(mv), depth - 1))
            .sum()
    }

    #[test]
    fn starting_position_has_twenty_moves() {
        let b = Board::starting_position();
        assert_eq!(generate_legal_moves(&b).len(), 20);
    }

    #[test]
    fn perft_starting_position() {
        let b = Board::starting_position();
        assert_eq!(perft(&b, 1), 20);
        assert_eq!(perft(&b, 2), 400);
        assert_eq!(perft(&b, 3), 8_902);
    }

    #[test]
    fn perft_kiwipete_depth_two() {
        // The classic movegen stress position.
        let b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(perft(&b, 1), 48);
        assert_eq!(perft(&b, 2), 2_039);
    }

    #[test]
    fn captures_are_a_subset_of_moves() {
        let b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let mut all = Vec::new();
        collect_moves(&b, |mv| all.push(mv));
        let mut captures = Vec::new();
        collect_captures(&b, |mv| captures.push(mv));
        assert!(!captures.is_empty());
        for mv in &captures {
            assert!(all.contains(mv), "{mv} missing from full generation");
            assert!(b.is_capture(*mv), "{mv} generated as capture but quiet");
        }
    }

    #[test]
    fn no_castling_through_check(){
        // Black rook on f8 covers f1; kingside castling must not appear.
        let b = board("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = generate_legal_moves(&b);
        assert!(!moves.contains(&Move::castle(Square::E1, Square::G1)));
        assert!(moves.contains(&Move::castle(Square::E1, Square::C1)));
    }

    #[test]
    fn no_castling_while_in_check() {
        let b = board("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1");
        let moves = generate_legal_moves(&b);
        assert!(!moves.iter().any(|m| m.kind() == crate::chess_move::MoveKind::Castle));
    }

    #[test]
    fn en_passant_generated() {
        let b = board("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
        let mut captures = Vec::new();
        collect_captures(&b, |mv| captures.push(mv));
        let from = Square::from_algebraic("e5").unwrap();
        let to = Square::from_algebraic("d6").unwrap();
        assert!(captures.contains(&Move::en_passant(from, to)));
    }

    #[test]
    fn promotions_generate_all_four_pieces() {
        let b = board("8/4P3/8/8/8/8/2k5/4K3 w - - 0 1");
        let moves = generate_legal_moves(&b);
        let promos: Vec<_> = moves
            .iter()
            .filter(|m| m.kind() == crate::chess_move::MoveKind::Promotion)
            .collect();
        assert_eq!(promos.len(), 4);
    }

    #[test]
    fn single_square_generation_matches_piece() {
        let b = Board::starting_position();
        let mut moves = Vec::new();
        collect_moves_from(&b, Square::from_algebraic("g1").unwrap(), |mv| {
            moves.push(mv)
        });
        assert_eq!(moves.len(), 2); // Nf3, Nh3
        // Squares owned by the opponent yield nothing.
        let mut none = Vec::new();
        collect_moves_from(&b, Square::E8, |mv| none.push(mv));
        assert!(none.is_empty());
    }

    #[test]
    fn pinned_piece_moves_filtered_as_illegal() {
        // Knight on d2 is pinned against the white king by the d8 rook.
        let b = board("3rk3/8/8/8/8/8/3N4/3K4 w - - 0 1");
        let moves = generate_legal_moves(&b);
        let d2 = Square::from_algebraic("d2").unwrap();
        assert!(moves.iter().all(|m| m.from() != d2));
    }
}
