//! Static evaluation.
//!
//! [`evaluate`] is a pure function of (position, personality) returning
//! centipawns from the **mover's** perspective: positive means the side
//! to move is better off.

pub mod king_safety;
pub mod material;
pub mod pawns;
pub mod phase;
pub mod pst;

use brio_core::{Board, Color};

use crate::personality::Personality;

/// Evaluate a position for the side to move.
pub fn evaluate(board: &Board, personality: &Personality) -> i32 {
    let game_phase = phase::classify(board);

    let mut score = material::balance(board)
        + pst::positional(board, game_phase)
        + pawns::structure(board);

    if personality.shapes_evaluation() {
        // Material-weight multiplier: with weight < 1 each side's material
        // counts for less, so shedding material costs less on the sheet.
        if (personality.material_weight - 1.0).abs() > f64::EPSILON {
            let discount = 1.0 - personality.material_weight;
            let white_penalty =
                (discount * material::side_material(board, Color::White) as f64) as i32;
            let black_penalty =
                (discount * material::side_material(board, Color::Black) as f64) as i32;
            score -= white_penalty;
            score += black_penalty;
        }

        if personality.king_attack_bonus != 0 {
            score += king_safety::king_attack_term(board, personality.king_attack_bonus);
        }
    }

    board.side_to_move().sign() * score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::Catalog;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    #[test]
    fn evaluation_is_idempotent() {
        let b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let normal = Personality::default();
        let first = evaluate(&b, &normal);
        assert_eq!(first, evaluate(&b, &normal));
        let gambiteer = Catalog::builtin().get("Gambiteer");
        assert_eq!(evaluate(&b, &gambiteer), evaluate(&b, &gambiteer));
    }

    #[test]
    fn starting_position_is_level() {
        assert_eq!(evaluate(&Board::starting_position(), &Personality::default()), 0);
    }

    #[test]
    fn score_is_mover_relative() {
        // White up a queen: great for White on move, terrible for Black.
        let white_to_move = board("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1");
        let black_to_move = board("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1");
        let normal = Personality::default();
        let white_view = evaluate(&white_to_move, &normal);
        let black_view = evaluate(&black_to_move, &normal);
        assert!(white_view > 0);
        assert_eq!(white_view, -black_view);
    }

    #[test]
    fn material_discount_softens_deficit() {
        // Black to move, down a rook. A gambit-minded personality
        // discounts material, so the deficit looks smaller.
        let b = board("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        let normal = evaluate(&b, &Personality::default());
        let discounted = evaluate(
            &b,
            &Personality {
                material_weight: 0.8,
                ..Personality::default()
            },
        );
        assert!(normal < 0);
        assert!(discounted > normal);
    }

    #[test]
    fn king_attack_bonus_rewards_pressure() {
        // White queen camped next to the black king, white to move.
        let b = board("4k3/8/4Q3/8/8/8/8/4K3 w - - 0 1");
        let normal = evaluate(&b, &Personality::default());
        let aggressive = evaluate(
            &b,
            &Personality {
                king_attack_bonus: 12,
                ..Personality::default()
            },
        );
        assert!(aggressive > normal);
    }
}
