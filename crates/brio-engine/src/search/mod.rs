//! The search subsystem: session state, the recursive engine, move
//! ordering, killer bookkeeping, and the transposition table.

pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod tt;

use std::sync::Arc;

use brio_core::{Board, Move};

use crate::personality::Personality;
use heuristics::KillerTable;
use negamax::PvTable;
use tt::TranspositionTable;

pub use negamax::{INF, MATE_SCORE, MATE_THRESHOLD, MAX_PLY};
pub use tt::SearchWindow;

/// Snapshot of one completed (or aborted) deepening iteration.
///
/// The last snapshot with `aborted == false` is the authoritative result
/// of a search request; an aborted iteration's score and line are partial
/// and must never be reported.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Deepest iteration attempted so far.
    pub depth: u8,
    /// Score in centipawns from the mover's perspective.
    pub score: i32,
    /// Nodes visited by the latest iteration alone.
    pub nodes: u64,
    /// Best line from the root.
    pub pv: Vec<Move>,
    /// Whether the latest iteration was cut short.
    pub aborted: bool,
}

/// A search session: one move request's worth of mutable search state.
///
/// Constructed fresh per request and discarded afterwards; the PV and
/// killer tables are reused across [`search_deeper`](Search::search_deeper)
/// calls within the session, never across sessions. The session owns a
/// handle to the shared transposition table so it can migrate onto the
/// driver's worker thread.
pub struct Search {
    pub(super) tt: Arc<TranspositionTable>,
    pub(super) personality: Personality,
    pub(super) max_nodes: u64,
    pub(super) tt_probes_enabled: bool,
    pub(super) forced_root_move: Option<Move>,

    pub(super) depth: u8,
    pub(super) score: i32,
    pub(super) nodes: u64,
    pub(super) aborted: bool,
    pub(super) pv: Vec<Move>,
    pub(super) pv_table: PvTable,
    pub(super) killers: KillerTable,
}

impl Search {
    /// Create a session against a shared transposition table.
    pub fn new(tt: Arc<TranspositionTable>, personality: Personality, max_nodes: u64) -> Search {
        Search {
            tt,
            personality,
            max_nodes,
            tt_probes_enabled: true,
            forced_root_move: None,
            depth: 0,
            score: 0,
            nodes: 0,
            aborted: false,
            pv: Vec::new(),
            pv_table: PvTable::new(),
            killers: KillerTable::new(),
        }
    }

    /// Restrict the root to a single move for this session.
    ///
    /// Used by the boredom-forced sacrifice: the move is still searched,
    /// so the session reports a genuine score and line for it.
    pub fn force_root_move(&mut self, mv: Move) {
        self.forced_root_move = Some(mv);
    }

    /// Treat every cache probe as a miss.
    ///
    /// Diagnostic knob: the cache is a hint, and disabling reads must not
    /// change which move a completed depth selects, only the node count.
    pub fn disable_tt_probes(&mut self) {
        self.tt_probes_enabled = false;
    }

    /// Deepen the search by exactly one ply.
    ///
    /// Must be called with depth 1 first; each subsequent call extends
    /// from where the previous one left off. On a completed (non-aborted)
    /// iteration the session's score and principal variation are updated;
    /// an aborted iteration leaves them untouched.
    pub fn search_deeper(&mut self, root: &Board, cancel: &dyn Fn() -> bool) {
        self.depth += 1;
        self.nodes = 0;
        self.aborted = false;

        let score = self.alpha_beta(root, 0, -INF, INF, self.depth as i32, cancel);

        if !self.aborted {
            self.score = score;
            self.pv = self.pv_table.line(0).to_vec();
        }
    }

    /// Deepest iteration attempted (1-based).
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Score of the last completed iteration, mover's perspective.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Nodes visited by the latest iteration.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Whether the latest iteration aborted.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Best line of the last completed iteration.
    pub fn pv(&self) -> &[Move] {
        &self.pv
    }

    /// First move of the best line, if any iteration completed.
    pub fn best_move(&self) -> Option<Move> {
        self.pv.first().copied().filter(|mv| !mv.is_null())
    }

    /// Snapshot the session state.
    pub fn result(&self) -> SearchResult {
        SearchResult {
            depth: self.depth,
            score: self.score,
            nodes: self.nodes,
            pv: self.pv.clone(),
            aborted: self.aborted,
        }
    }
}
