//! The search driver: opening-book consult, personality time policy,
//! history seeding, a synchronous first pass, and the background worker.

use std::sync::Arc;
use std::thread::JoinHandle;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use brio_core::{Board, Move, MoveKind, generate_legal_moves, is_legal};

use crate::book::OpeningBook;
use crate::eval::material::piece_value;
use crate::personality::Personality;
use crate::search::tt::TranspositionTable;
use crate::search::{MAX_PLY, Search};
use crate::time::TimeControl;

/// Node budget for the panic-detection scout pass.
const SCOUT_NODE_BUDGET: u64 = 1_000;

/// Floor for the panic-mode time override.
const PANIC_MIN_BUDGET_MS: u64 = 10_000;

/// Moves-to-go assumed when the host supplies none.
const ASSUMED_MOVES_TO_GO: u32 = 30;

/// Extra assumed moves when playing conservatively to bank panic time.
const CONSERVATIVE_MOVE_PADDING: u32 = 10;

/// Remaining clock under which the scramble override kicks in, matching
/// the allocation logic in [`TimeControl::allocate`].
const SCRAMBLE_THRESHOLD_MS: u64 = 1_500;

/// Time constraints for one `go` request.
#[derive(Debug, Clone, Copy)]
pub enum GoLimits {
    /// Search until stopped.
    Infinite,
    /// Spend exactly this many milliseconds.
    MoveTime(u64),
    /// Allocate from the game clock.
    Clock {
        remaining_ms: u64,
        increment_ms: u64,
        moves_to_go: Option<u32>,
    },
}

/// Progress record for one completed deepening iteration.
#[derive(Debug, Clone)]
pub struct IterationReport {
    pub depth: u8,
    /// Centipawns from the mover's perspective.
    pub score: i32,
    pub nodes: u64,
    pub elapsed_ms: u64,
    /// Best line; extended from the cache for display when the raw line
    /// is shorter than the depth reached.
    pub pv: Vec<Move>,
}

/// Sink for everything the driver must tell the host.
pub trait Reporter: Send + Sync {
    /// A deepening iteration completed.
    fn iteration(&self, report: &IterationReport);
    /// The search settled on a move.
    fn best_move(&self, mv: Move);
    /// Even the first shallow pass produced nothing.
    fn no_move_found(&self);
}

/// Owns the game state, the shared cache, and the single search worker.
///
/// Worker lifecycle is a join-handle state machine: `None` is idle,
/// `Some` is running, and [`stop`](Driver::stop) transitions through
/// stopping back to idle. Starting a new search implicitly stops any
/// in-flight one; the two never overlap.
pub struct Driver {
    board: Board,
    /// Fingerprints of every real game position, current included.
    history: Vec<u64>,
    /// Consecutive non-capturing, non-checking real moves.
    boredom_counter: u32,
    personality: Personality,
    tt: Arc<TranspositionTable>,
    book: OpeningBook,
    rng: StdRng,
    reporter: Arc<dyn Reporter>,
    time: Option<Arc<TimeControl>>,
    worker: Option<JoinHandle<()>>,
}

impl Driver {
    /// A driver at the starting position with the default personality.
    pub fn new(reporter: Arc<dyn Reporter>) -> Driver {
        let board = Board::starting_position();
        Driver {
            board,
            history: vec![board.hash()],
            boredom_counter: 0,
            personality: Personality::default(),
            tt: Arc::new(TranspositionTable::new(16)),
            book: OpeningBook::empty(),
            rng: StdRng::from_entropy(),
            reporter,
            time: None,
            worker: None,
        }
    }

    /// Reseed the driver's random source, for reproducible runs.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Select the personality used by subsequent requests.
    pub fn set_personality(&mut self, personality: Personality) {
        info!(style = %personality.name, "personality selected");
        self.personality = personality;
    }

    /// Install an opening book.
    pub fn set_book(&mut self, book: OpeningBook) {
        self.book = book;
    }

    /// Replace the transposition cache (`Hash` option).
    pub fn resize_tt(&mut self, mb: usize) {
        self.stop();
        self.tt = Arc::new(TranspositionTable::new(mb));
    }

    /// Drop all cached search state (`ucinewgame`).
    pub fn clear_tt(&mut self) {
        self.stop();
        self.tt.clear();
    }

    /// Current position.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Start a fresh game state from `board`.
    pub fn set_position(&mut self, board: Board) {
        self.stop();
        self.board = board;
        self.history = vec![board.hash()];
        self.boredom_counter = 0;
    }

    /// Apply a real game move, tracking history and the boredom counter.
    pub fn play(&mut self, mv: Move) {
        self.stop();
        let child = self.board.make_move(mv);
        let gives_check = child.is_in_check(child.side_to_move());
        if self.board.is_capture(mv) || gives_check {
            self.boredom_counter = 0;
        } else {
            self.boredom_counter += 1;
        }
        self.board = child;
        self.history.push(child.hash());
    }

    /// Signal the current search to end and wait for the worker to exit.
    ///
    /// Idempotent and safe to call with no search running. Blocks until
    /// the worker has observed cancellation, which is bounded by the
    /// engine's node-count polling cadence.
    pub fn stop(&mut self) {
        if let Some(time) = &self.time {
            time.stop();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("search worker panicked");
            }
        }
        self.time = None;
    }

    /// Answer a move request.
    ///
    /// Consults the book first; otherwise applies the personality time
    /// policy, seeds the cache with game history, runs a synchronous
    /// depth-1 pass so *some* move exists under any budget, then hands
    /// deepening to the worker thread.
    pub fn go(&mut self, limits: GoLimits, depth_hint: u8, node_budget: u64) {
        self.stop();

        if let Some(mv) = self
            .book
            .try_get_move(&self.board, &self.personality, &mut self.rng)
        {
            self.reporter.best_move(mv);
            return;
        }

        let (time, panic_lift) = self.resolve_time_policy(limits);
        let time = Arc::new(time);

        let sentinel = MAX_PLY as u8;
        let effective_depth = if panic_lift {
            sentinel
        } else if depth_hint >= sentinel {
            self.personality.max_depth.min(sentinel)
        } else {
            depth_hint
        };
        info!(
            style = %self.personality.name,
            depth = effective_depth,
            budget_ms = time.per_move_ms_with_margin(),
            "search scheduled"
        );

        self.tt.new_generation();
        for &hash in &self.history {
            self.tt.store_history_marker(hash);
        }

        let mut session = Search::new(
            Arc::clone(&self.tt),
            self.personality.clone(),
            node_budget,
        );
        if let Some(mv) = self.find_boredom_sacrifice() {
            info!(mv = %mv, "boredom limit reached, forcing a sacrifice");
            session.force_root_move(mv);
        }

        // Synchronous first pass: guarantees a move under any budget.
        time.start_interval();
        session.search_deeper(&self.board, &|| false);

        let Some(mut best) = session.best_move().filter(|_| !session.aborted()) else {
            // An aborted first pass never commits a line, so there is
            // nothing defensible to announce.
            warn!("no move found in the initial pass");
            self.reporter.no_move_found();
            return;
        };
        self.reporter
            .iteration(&build_report(&self.tt, &self.board, &session, &time));

        // Hand deepening to the single worker. The original design ran
        // this thread at raised OS priority; std exposes no portable
        // equivalent, so it is a dedicated named thread instead.
        let board = self.board;
        let tt = Arc::clone(&self.tt);
        let reporter = Arc::clone(&self.reporter);
        let worker_time = Arc::clone(&time);
        let worker = std::thread::Builder::new()
            .name("brio-search".to_string())
            .spawn(move || {
                while session.depth() < effective_depth && worker_time.can_go_deeper() {
                    worker_time.start_interval();
                    let cancel = || worker_time.is_budget_exceeded();
                    session.search_deeper(&board, &cancel);
                    if session.aborted() {
                        break;
                    }
                    if let Some(mv) = session.best_move() {
                        best = mv;
                    }
                    reporter.iteration(&build_report(&tt, &board, &session, &worker_time));
                }
                reporter.best_move(best);
            })
            .expect("failed to spawn search worker");

        self.worker = Some(worker);
        self.time = Some(time);
    }

    /// Apply the personality time policy for this request.
    ///
    /// Returns the time control plus whether panic mode lifted the depth
    /// cap for this move.
    fn resolve_time_policy(&mut self, limits: GoLimits) -> (TimeControl, bool) {
        match limits {
            GoLimits::Infinite => (TimeControl::infinite(), false),
            GoLimits::MoveTime(ms) => (TimeControl::fixed(ms), false),
            GoLimits::Clock {
                remaining_ms,
                increment_ms,
                moves_to_go,
            } => {
                // A time scramble pre-empts every other policy.
                let scrambling =
                    remaining_ms.saturating_sub(50) < SCRAMBLE_THRESHOLD_MS;
                if !scrambling && self.personality.panics() {
                    let scout = self.scout_score();
                    info!(score = scout, "panic scout finished");
                    if scout < self.personality.panic_threshold {
                        let odds = self.personality.panic_probability.clamp(0.0, 1.0);
                        if self.rng.gen_bool(odds) {
                            let budget = (remaining_ms.saturating_sub(50) / 2)
                                .max(PANIC_MIN_BUDGET_MS);
                            info!(budget_ms = budget, "panicking: spending a big slice of the clock");
                            return (TimeControl::overridden(budget, remaining_ms), true);
                        }
                        // Not panicking this time: play conservatively to
                        // keep time in the bank for a future panic.
                        let padded = moves_to_go.unwrap_or(ASSUMED_MOVES_TO_GO)
                            + CONSERVATIVE_MOVE_PADDING;
                        return (
                            TimeControl::allocate(remaining_ms, increment_ms, Some(padded)),
                            false,
                        );
                    }
                }
                (
                    TimeControl::allocate(remaining_ms, increment_ms, moves_to_go),
                    false,
                )
            }
        }
    }

    /// Cheap bounded estimate of the current score for panic detection.
    ///
    /// Runs against a small private cache so its shallow entries never
    /// pollute the table the real search is about to use. A starved scout
    /// simply yields its partial score; that is accepted behavior.
    fn scout_score(&self) -> i32 {
        let scout_tt = Arc::new(TranspositionTable::new(1));
        let mut scout = Search::new(scout_tt, self.personality.clone(), SCOUT_NODE_BUDGET);
        scout.search_deeper(&self.board, &|| false);
        scout.score()
    }

    /// The boredom-forced sacrifice, when the personality and counter call
    /// for one: the highest-value piece move onto an empty, enemy-attacked
    /// square. Evaluated once per request, before normal move generation.
    fn find_boredom_sacrifice(&self) -> Option<Move> {
        let limit = self.personality.boredom_limit;
        if limit == 0 || self.boredom_counter < limit {
            return None;
        }
        if self.board.is_in_check(self.board.side_to_move()) {
            return None;
        }
        find_sacrifice(&self.board)
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Highest-value legal move onto an empty square the enemy attacks.
fn find_sacrifice(board: &Board) -> Option<Move> {
    let enemy = !board.side_to_move();
    let mut best: Option<(Move, i32)> = None;
    for mv in generate_legal_moves(board) {
        if mv.kind() == MoveKind::EnPassant || board.piece_at(mv.to()).is_some() {
            continue;
        }
        if !board.is_square_attacked(mv.to(), enemy) {
            continue;
        }
        let Some(piece) = board.piece_at(mv.from()) else {
            continue;
        };
        let value = piece_value(piece.kind);
        if best.is_none_or(|(_, v)| value > v) {
            best = Some((mv, value));
        }
    }
    best.map(|(mv, _)| mv)
}

/// Assemble the progress record for a completed iteration.
fn build_report(
    tt: &TranspositionTable,
    board: &Board,
    session: &Search,
    time: &TimeControl,
) -> IterationReport {
    IterationReport {
        depth: session.depth(),
        score: session.score(),
        nodes: session.nodes(),
        elapsed_ms: time.elapsed_ms(),
        pv: extend_pv(tt, board, session.pv(), session.depth() as usize),
    }
}

/// Extend a short line for display by walking cache best moves.
///
/// Near mate or stalemate the engine's line can be shorter than the depth
/// reached; each cache suggestion is validated for legality and the walk
/// stops at the first missing or illegal entry.
fn extend_pv(tt: &TranspositionTable, board: &Board, pv: &[Move], target_len: usize) -> Vec<Move> {
    let mut line = pv.to_vec();
    let mut position = *board;
    for mv in &line {
        position = position.make_move(*mv);
    }
    while line.len() < target_len {
        let Some(mv) = tt.best_move(position.hash()) else {
            break;
        };
        if !is_legal(&position, mv) {
            break;
        }
        position = position.make_move(mv);
        line.push(mv);
    }
    line
}
