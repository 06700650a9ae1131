//! Per-move time budgeting.
//!
//! A [`TimeControl`] is constructed fresh for each move request, shared
//! with the worker thread through an `Arc`. The worker polls
//! [`is_budget_exceeded`](TimeControl::is_budget_exceeded) as its
//! cancellation predicate and consults
//! [`can_go_deeper`](TimeControl::can_go_deeper) between iterations;
//! the driver calls [`stop`](TimeControl::stop) to end the move.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::info;

/// Reserve kept back from every limit to cover move transmission.
const SAFETY_MARGIN_MS: u64 = 50;

/// Below this much remaining clock the normal allocation is abandoned.
const SCRAMBLE_THRESHOLD_MS: u64 = 1_500;

/// Flat emergency budget used in a time scramble.
const SCRAMBLE_BUDGET_MS: u64 = 100;

/// Assumed expected moves remaining when the GUI does not say.
const DEFAULT_MOVES_TO_GO: u32 = 30;

/// Each iteration is projected to cost this multiple of the previous one.
const NEXT_ITERATION_FACTOR: u64 = 3;

struct IntervalState {
    started: Instant,
    last_interval_ms: u64,
}

/// Wall-clock budget bookkeeping for one move request.
pub struct TimeControl {
    /// Budget for this move in milliseconds.
    budget_ms: u64,
    /// Clock remaining for the whole game at move start.
    remaining_ms: u64,
    move_start: Instant,
    interval: Mutex<IntervalState>,
    stopped: AtomicBool,
}

impl TimeControl {
    fn with_budget(budget_ms: u64, remaining_ms: u64) -> TimeControl {
        let now = Instant::now();
        TimeControl {
            budget_ms,
            remaining_ms,
            move_start: now,
            interval: Mutex::new(IntervalState {
                started: now,
                last_interval_ms: 0,
            }),
            stopped: AtomicBool::new(false),
        }
    }

    /// No time pressure at all; only [`stop`](Self::stop) ends the search.
    pub fn infinite() -> TimeControl {
        TimeControl::with_budget(u64::MAX, u64::MAX)
    }

    /// Spend exactly `budget_ms` on this move (UCI `movetime`).
    pub fn fixed(budget_ms: u64) -> TimeControl {
        TimeControl::with_budget(budget_ms, u64::MAX)
    }

    /// Divide the remaining clock across the expected moves left.
    ///
    /// Budget = `(remaining + (mtg - 1) * increment) / mtg`. When the
    /// clock has already run down past the scramble threshold the formula
    /// is discarded for a flat [`SCRAMBLE_BUDGET_MS`].
    pub fn allocate(
        remaining_ms: u64,
        increment_ms: u64,
        moves_to_go: Option<u32>,
    ) -> TimeControl {
        if remaining_ms.saturating_sub(SAFETY_MARGIN_MS) < SCRAMBLE_THRESHOLD_MS {
            info!(remaining_ms, "time scramble: minimal fixed budget");
            return TimeControl::with_budget(SCRAMBLE_BUDGET_MS, remaining_ms);
        }

        let mtg = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1) as u64;
        let budget = (remaining_ms + (mtg - 1) * increment_ms) / mtg;
        TimeControl::with_budget(budget.min(remaining_ms), remaining_ms)
    }

    /// Override the allocation entirely (panic mode).
    pub fn overridden(budget_ms: u64, remaining_ms: u64) -> TimeControl {
        TimeControl::with_budget(budget_ms.min(remaining_ms), remaining_ms)
    }

    /// Milliseconds since the move started.
    pub fn elapsed_ms(&self) -> u64 {
        self.move_start.elapsed().as_millis() as u64
    }

    /// This move's budget, net of the safety margin.
    pub fn per_move_ms_with_margin(&self) -> u64 {
        self.budget_ms.saturating_sub(SAFETY_MARGIN_MS)
    }

    /// Game clock remaining at move start, net of the safety margin.
    pub fn remaining_ms_with_margin(&self) -> u64 {
        self.remaining_ms.saturating_sub(SAFETY_MARGIN_MS)
    }

    /// Open a new deepening interval, recording the previous one's length
    /// for the next-iteration projection.
    pub fn start_interval(&self) {
        let mut interval = self.interval.lock().expect("interval mutex poisoned");
        interval.last_interval_ms = interval.started.elapsed().as_millis() as u64;
        interval.started = Instant::now();
    }

    /// The cancellation predicate polled inside the search.
    ///
    /// True once the stop flag is set, the per-move budget is spent, or
    /// the game clock itself is nearly gone.
    pub fn is_budget_exceeded(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        let elapsed = self.elapsed_ms();
        elapsed >= self.per_move_ms_with_margin() || elapsed >= self.remaining_ms_with_margin()
    }

    /// Whether another full iteration plausibly fits in the budget.
    ///
    /// The next iteration is projected from the last completed interval;
    /// before any interval completes the projection is zero and deepening
    /// always proceeds.
    pub fn can_go_deeper(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return false;
        }
        let last = self
            .interval
            .lock()
            .expect("interval mutex poisoned")
            .last_interval_ms;
        let projected = last.saturating_mul(NEXT_ITERATION_FACTOR);
        self.elapsed_ms().saturating_add(projected) < self.per_move_ms_with_margin()
    }

    /// End the current move. Idempotent; safe to call when nothing runs.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_divides_the_clock() {
        // 60s, no increment, 30 moves to go: 2s per move.
        let tc = TimeControl::allocate(60_000, 0, Some(30));
        assert_eq!(tc.per_move_ms_with_margin(), 2_000 - SAFETY_MARGIN_MS);
    }

    #[test]
    fn increment_raises_the_budget() {
        let flat = TimeControl::allocate(60_000, 0, Some(30));
        let inc = TimeControl::allocate(60_000, 2_000, Some(30));
        assert!(inc.per_move_ms_with_margin() > flat.per_move_ms_with_margin());
    }

    #[test]
    fn more_moves_to_go_is_more_conservative() {
        let normal = TimeControl::allocate(60_000, 0, Some(30));
        let padded = TimeControl::allocate(60_000, 0, Some(40));
        assert!(padded.per_move_ms_with_margin() < normal.per_move_ms_with_margin());
    }

    #[test]
    fn scramble_overrides_the_formula() {
        let tc = TimeControl::allocate(1_200, 1_000, Some(2));
        assert_eq!(
            tc.per_move_ms_with_margin(),
            SCRAMBLE_BUDGET_MS - SAFETY_MARGIN_MS
        );
    }

    #[test]
    fn budget_never_exceeds_remaining() {
        let tc = TimeControl::allocate(5_000, 60_000, Some(1));
        assert!(tc.per_move_ms_with_margin() <= 5_000);
        let panic = TimeControl::overridden(99_000, 5_000);
        assert!(panic.per_move_ms_with_margin() <= 5_000);
    }

    #[test]
    fn stop_trips_both_predicates_immediately() {
        let tc = TimeControl::infinite();
        assert!(!tc.is_budget_exceeded());
        assert!(tc.can_go_deeper());
        tc.stop();
        assert!(tc.is_budget_exceeded());
        assert!(!tc.can_go_deeper());
        // Idempotent.
        tc.stop();
        assert!(tc.is_stopped());
    }

    #[test]
    fn zero_budget_is_exceeded_at_once() {
        let tc = TimeControl::fixed(0);
        assert!(tc.is_budget_exceeded());
    }

    #[test]
    fn infinite_never_runs_out() {
        let tc = TimeControl::infinite();
        tc.start_interval();
        assert!(!tc.is_budget_exceeded());
        assert!(tc.can_go_deeper());
    }
}
