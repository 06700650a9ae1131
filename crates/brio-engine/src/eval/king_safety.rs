//! Personality-driven king attack terms.
//!
//! Only styles with a non-zero king attack bonus pay for these scans;
//! the default evaluation skips this module entirely.

use brio_core::{Board, Color, collect_moves_from};

/// King-zone attack score, White's perspective.
///
/// For each square in the 8-neighborhood of a king attacked by the other
/// side, the attacker collects `bonus`; a king with zero legal escape
/// squares concedes another `bonus / 2`.
pub fn king_attack_term(board: &Board, bonus: i32) -> i32 {
    let mut score = 0;

    // White attacking the black king raises the score...
    score += zone_attack_count(board, Color::Black) * bonus;
    if king_is_trapped(board, Color::Black) {
        score += bonus / 2;
    }

    // ...and Black attacking the white king lowers it.
    score -= zone_attack_count(board, Color::White) * bonus;
    if king_is_trapped(board, Color::White) {
        score -= bonus / 2;
    }

    score
}

/// Number of squares around `king_color`'s king attacked by the enemy.
fn zone_attack_count(board: &Board, king_color: Color) -> i32 {
    let king_sq = board.king_square(king_color);
    let mut count = 0;
    for df in -1i8..=1 {
        for dr in -1i8..=1 {
            if df == 0 && dr == 0 {
                continue;
            }
            if let Some(zone_sq) = king_sq.offset(df, dr)
                && board.is_square_attacked(zone_sq, !king_color)
            {
                count += 1;
            }
        }
    }
    count
}

/// Whether `color`'s king has no legal move at all.
///
/// A mini legality pass restricted to king moves: generate from the king
/// square with the side to move overridden, then apply the usual
/// own-king-in-check filter.
fn king_is_trapped(board: &Board, color: Color) -> bool {
    let analysis = board.with_side_to_move(color);
    let king_sq = analysis.king_square(color);
    let mut escapes = 0;
    collect_moves_from(&analysis, king_sq, |mv| {
        if !analysis.make_move(mv).is_in_check(color) {
            escapes += 1;
        }
    });
    escapes == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn starting_position_is_symmetric() {
        assert_eq!(king_attack_term(&Board::starting_position(), 12), 0);
    }

    #[test]
    fn queen_next_to_king_scores_zone_attacks() {
        // White queen on e6 blankets the black king's zone.
        let b = board("4k3/8/4Q3/8/8/8/8/4K3 w - - 0 1");
        assert!(king_attack_term(&b, 10) > 0);
    }

    #[test]
    fn trapped_king_concedes_extra() {
        // Cornered king, queen covering every flight square.
        let trapped = board("k7/2Q5/8/8/8/8/8/6K1 b - - 0 1");
        assert!(king_is_trapped(&trapped, Color::Black));
        let open = board("k7/8/2Q5/8/8/8/8/6K1 b - - 0 1");
        assert!(!king_is_trapped(&open, Color::Black));
    }

    #[test]
    fn term_is_antisymmetric() {
        // The same attack pattern flipped in color flips the sign.
        let white_attacks = board("4k3/4Q3/8/8/8/8/8/4K3 w - - 0 1");
        let black_attacks = board("4k3/8/8/8/8/8/4q3/4K3 w - - 0 1");
        assert_eq!(
            king_attack_term(&white_attacks, 10),
            -king_attack_term(&black_attacks, 10),
        );
    }
}
