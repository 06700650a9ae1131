//! The recursive alpha-beta procedure and its quiescence tail.

use brio_core::{Board, Move};

use crate::eval::evaluate;
use crate::search::Search;
use crate::search::ordering::MovePicker;
use crate::search::tt::SearchWindow;

/// Unreachable bound for search windows.
pub const INF: i32 = 30_000;

/// Base checkmate score; the ply of detection is subtracted so nearer
/// mates score higher.
pub const MATE_SCORE: i32 = 29_000;

/// Scores beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = 28_000;

/// Hard ply ceiling, independent of any requested depth: recursion never
/// exceeds it, check extensions included.
pub const MAX_PLY: usize = 64;

/// Cancellation is polled whenever the node count hits a multiple of this.
const CANCEL_MASK: u64 = 2047;

/// Null-move depth reduction.
const NULL_MOVE_REDUCTION: i32 = 2;

/// Quiet moves after this many at a node are candidates for reduction.
const LMR_FULL_MOVES: u32 = 4;

impl Search {
    /// Recursive negamax with alpha-beta pruning.
    ///
    /// `depth` is the remaining full-width depth and may go negative under
    /// reductions; `ply` is the distance from the root. Returns a score
    /// from the mover's perspective. When `self.aborted` is set the
    /// returned value is meaningless and must be discarded by every
    /// caller on the way up.
    pub(super) fn alpha_beta(
        &mut self,
        position: &Board,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
        mut depth: i32,
        cancel: &dyn Fn() -> bool,
    ) -> i32 {
        if ply >= MAX_PLY - 1 {
            return evaluate(position, &self.personality);
        }

        if ply > 0 {
            if self.nodes & CANCEL_MASK == 0 && (cancel() || self.nodes >= self.max_nodes) {
                self.aborted = true;
                return 0;
            }

            // Mate-distance narrowing: a mate from here can score at best
            // MATE_SCORE - ply - 1 and at worst -(MATE_SCORE - ply), so a
            // shorter forced mate found elsewhere already beats anything
            // this subtree can produce.
            alpha = alpha.max(-(MATE_SCORE - ply as i32));
            beta = beta.min(MATE_SCORE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        self.pv_table.clear_ply(ply);

        let window = SearchWindow::new(alpha, beta);
        if ply > 0
            && self.tt_probes_enabled
            && let Some(score) =
                self.tt
                    .probe(position.hash(), depth.clamp(0, 255) as u8, ply as u8, window)
        {
            return score;
        }

        let mover = position.side_to_move();
        let in_check = position.is_in_check(mover);
        if in_check {
            // Check extension: forced sequences are not cut short.
            depth += 1;
        }

        if depth <= 0 {
            return self.quiescence(position, ply, alpha, beta, cancel);
        }

        // Null-move pruning: if passing the turn still reaches beta, the
        // position is good enough to cut. Skipped in check and without
        // piece material, where zugzwang would make the bet unsound.
        if !in_check
            && depth >= 3
            && position.has_piece_material(mover)
            && evaluate(position, &self.personality) >= beta
        {
            let null_child = position.make_null_move();
            let null_score = -self.alpha_beta(
                &null_child,
                ply + 1,
                -beta,
                -beta + 1,
                depth - 1 - NULL_MOVE_REDUCTION,
                cancel,
            );
            if self.aborted {
                return 0;
            }
            if null_score >= beta {
                return beta;
            }
        }

        self.nodes += 1;

        let tt_move = if self.tt_probes_enabled {
            self.tt.best_move(position.hash()).unwrap_or(Move::NULL)
        } else {
            Move::NULL
        };

        let forced = if ply == 0 { self.forced_root_move } else { None };
        let mut picker = match forced {
            Some(_) => None,
            None => Some(MovePicker::main(position, tt_move, &self.killers, ply)),
        };
        let mut forced_iter = forced.into_iter();
        let mut next_move = move || -> Option<Move> {
            match picker.as_mut() {
                Some(p) => p.pick_next(),
                None => forced_iter.next(),
            }
        };

        let mut cutoff = false;
        let mut best_move = Move::NULL;
        let mut legal_moves = 0u32;
        let mut searched = 0u32;

        while let Some(mv) = next_move() {
            searched += 1;
            let child = position.make_move(mv);
            if child.is_in_check(mover) {
                continue;
            }
            legal_moves += 1;

            let is_quiet = position.piece_at(mv.to()).is_none();

            // Late-move reduction: unpromising quiet moves get a reduced
            // null-window look first and a full re-search only when they
            // land inside the window.
            let score = if depth >= 3 && searched > LMR_FULL_MOVES && !in_check && is_quiet {
                let reduced =
                    -self.alpha_beta(&child, ply + 1, -alpha - 1, -alpha, depth - 2, cancel);
                if reduced > alpha && reduced < beta {
                    -self.alpha_beta(&child, ply + 1, -beta, -alpha, depth - 1, cancel)
                } else {
                    reduced
                }
            } else {
                -self.alpha_beta(&child, ply + 1, -beta, -alpha, depth - 1, cancel)
            };

            if self.aborted {
                return 0;
            }

            if score > alpha {
                alpha = score;
                best_move = mv;
                self.pv_table.record(ply, mv);

                if alpha >= beta {
                    cutoff = true;
                    if is_quiet {
                        self.killers.store(ply, mv);
                    }
                    break;
                }
            }
        }

        if legal_moves == 0 {
            // Checkmate encodes distance so nearer mates dominate;
            // stalemate is simply the drawn score.
            return if in_check { -(MATE_SCORE - ply as i32) } else { 0 };
        }

        let score = if cutoff { beta } else { alpha };
        self.tt.store(
            position.hash(),
            depth.clamp(0, 255) as u8,
            ply as u8,
            window,
            score,
            best_move,
        );
        score
    }

    /// Captures-and-evasions-only search below the depth horizon.
    ///
    /// Stand-pat seeds alpha: the mover is never forced into a losing
    /// capture, so the static score is a floor.
    pub(super) fn quiescence(
        &mut self,
        position: &Board,
        ply: usize,
        mut alpha: i32,
        beta: i32,
        cancel: &dyn Fn() -> bool,
    ) -> i32 {
        if ply >= MAX_PLY - 1 {
            return evaluate(position, &self.personality);
        }

        self.nodes += 1;
        if self.nodes & CANCEL_MASK == 0 && (cancel() || self.nodes >= self.max_nodes) {
            self.aborted = true;
            return 0;
        }

        let stand_pat = evaluate(position, &self.personality);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mover = position.side_to_move();
        let in_check = position.is_in_check(mover);
        let mut picker = MovePicker::quiescence(position, in_check);

        while let Some(mv) = picker.pick_next() {
            let child = position.make_move(mv);
            if child.is_in_check(mover) {
                continue;
            }
            let score = -self.quiescence(&child, ply + 1, -beta, -alpha, cancel);
            if self.aborted {
                return 0;
            }
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

/// Triangular principal-variation table.
///
/// Row `ply` holds the best line found from that ply; recording a move at
/// `ply` splices in the continuation already collected at `ply + 1`, so
/// each row stays consistent with the row above it.
pub struct PvTable {
    lines: [[Move; MAX_PLY]; MAX_PLY],
    lens: [usize; MAX_PLY],
}

impl PvTable {
    pub fn new() -> PvTable {
        PvTable {
            lines: [[Move::NULL; MAX_PLY]; MAX_PLY],
            lens: [0; MAX_PLY],
        }
    }

    /// Reset the line collected at `ply`; called on node entry.
    pub fn clear_ply(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.lens[ply] = 0;
        }
    }

    /// Set `mv` as the best move at `ply` and append the child line.
    pub fn record(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        self.lines[ply][0] = mv;

        let child = ply + 1;
        if child < MAX_PLY {
            let child_len = self.lens[child].min(MAX_PLY - 1);
            let (rows_up_to_child, rest) = self.lines.split_at_mut(child);
            rows_up_to_child[ply][1..=child_len].copy_from_slice(&rest[0][..child_len]);
            self.lens[ply] = 1 + child_len;
        } else {
            self.lens[ply] = 1;
        }
    }

    /// The line collected at `ply`.
    pub fn line(&self, ply: usize) -> &[Move] {
        if ply < MAX_PLY {
            &self.lines[ply][..self.lens[ply]]
        } else {
            &[]
        }
    }
}

impl Default for PvTable {
    fn default() -> PvTable {
        PvTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brio_core::Square;

    #[test]
    fn pv_record_splices_child_line() {
        let mut pv = PvTable::new();
        let reply = Move::normal(Square::E8, Square::D8);
        let first = Move::normal(Square::E1, Square::G1);

        pv.record(1, reply);
        pv.record(0, first);
        assert_eq!(pv.line(0), &[first, reply]);
        assert_eq!(pv.line(1), &[reply]);
    }

    #[test]
    fn clear_ply_truncates() {
        let mut pv = PvTable::new();
        pv.record(0, Move::normal(Square::E1, Square::G1));
        assert_eq!(pv.line(0).len(), 1);
        pv.clear_ply(0);
        assert!(pv.line(0).is_empty());
    }

    #[test]
    fn lines_stay_consistent_per_ply() {
        let mut pv = PvTable::new();
        let deep = Move::normal(Square::A1, Square::A8);
        let mid = Move::normal(Square::E8, Square::D8);
        let top = Move::normal(Square::E1, Square::G1);
        pv.record(2, deep);
        pv.record(1, mid);
        pv.record(0, top);
        // Each row is its move followed by the row below.
        assert_eq!(pv.line(0), &[top, mid, deep]);
        assert_eq!(pv.line(0)[1..], *pv.line(1));
    }
}
