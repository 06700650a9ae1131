//! Lockless transposition table.
//!
//! Each slot is two `AtomicU64` words with an XOR check word, so a torn
//! write from a racing thread is detected and the entry discarded rather
//! than used. Only one thread writes in this engine's design, but the
//! table stays sound if that ever changes.
//!
//! ## Bit layout
//!
//! ```text
//! word0:
//!   bits 63-32  key        (upper 32 bits of the position fingerprint)
//!   bits 31-16  best move  (raw 16-bit encoding)
//!   bits 15-8   depth      (255 = reserved HISTORY marker)
//!   bits  7-3   generation (5 bits, wraps at 32)
//!   bits  2-0   bound      (0 none, 1 exact, 2 lower, 3 upper)
//!
//! word1:
//!   bits 63-32  check = key XOR (word0 & 0xFFFF_FFFF)
//!   bits 31-0   score      (i32 as u32)
//! ```
//!
//! Mate scores are stored as distance-from-node rather than
//! distance-from-root so entries stay valid wherever the position recurs.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use brio_core::Move;

/// Scores above this magnitude encode a forced mate.
const MATE_THRESHOLD: i32 = 28_000;

/// Reserved depth tagging a game-history entry as valid at any depth.
pub const HISTORY_DEPTH: u8 = u8::MAX;

/// An (alpha, beta) bound pair: the pruning window and TT probe key.
///
/// Invariant while narrowing: `alpha < beta`; `alpha >= beta` signals a
/// cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub alpha: i32,
    pub beta: i32,
}

impl SearchWindow {
    /// The unbounded window.
    pub const INFINITE: SearchWindow = SearchWindow {
        alpha: -30_000,
        beta: 30_000,
    };

    pub const fn new(alpha: i32, beta: i32) -> SearchWindow {
        SearchWindow { alpha, beta }
    }
}

/// How a stored score bounds the true score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    None = 0,
    /// Score is exact: some move improved alpha without a cutoff.
    Exact = 1,
    /// Score is a lower bound: the node failed high (beta cutoff).
    Lower = 2,
    /// Score is an upper bound: no move improved alpha.
    Upper = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Bound {
        match bits & 0b111 {
            1 => Bound::Exact,
            2 => Bound::Lower,
            3 => Bound::Upper,
            _ => Bound::None,
        }
    }

    /// Derive the bound kind for a finished node.
    fn classify(score: i32, window: SearchWindow) -> Bound {
        if score >= window.beta {
            Bound::Lower
        } else if score <= window.alpha {
            Bound::Upper
        } else {
            Bound::Exact
        }
    }
}

/// Shift a score into ply-independent form for storage.
fn score_to_tt(score: i32, ply: u8) -> i32 {
    if score > MATE_THRESHOLD {
        score + ply as i32
    } else if score < -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Undo [`score_to_tt`] for the probing node's ply.
fn score_from_tt(score: i32, ply: u8) -> i32 {
    if score > MATE_THRESHOLD {
        score - ply as i32
    } else if score < -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

struct Slot {
    word0: AtomicU64,
    word1: AtomicU64,
}

struct DecodedSlot {
    mv: Move,
    depth: u8,
    bound: Bound,
    score: i32,
}

impl Slot {
    const fn empty() -> Slot {
        Slot {
            word0: AtomicU64::new(0),
            word1: AtomicU64::new(0),
        }
    }

    /// Load and verify; `None` on key mismatch or torn write.
    fn load(&self, hash: u64) -> Option<DecodedSlot> {
        let w0 = self.word0.load(Ordering::Relaxed);
        let w1 = self.word1.load(Ordering::Relaxed);

        let key = (w0 >> 32) as u32;
        let check_expected = key ^ (w0 & 0xFFFF_FFFF) as u32;
        if check_expected != (w1 >> 32) as u32 {
            return None;
        }
        if key != (hash >> 32) as u32 {
            return None;
        }

        Some(DecodedSlot {
            mv: mv_from_raw(((w0 >> 16) & 0xFFFF) as u16),
            depth: ((w0 >> 8) & 0xFF) as u8,
            bound: Bound::from_bits(w0),
            score: (w1 & 0xFFFF_FFFF) as u32 as i32,
        })
    }

    /// Peek without the key check, for the replacement policy.
    fn peek(&self) -> (u8, u8, Bound) {
        let w0 = self.word0.load(Ordering::Relaxed);
        (
            ((w0 >> 8) & 0xFF) as u8,
            ((w0 >> 3) & 0x1F) as u8,
            Bound::from_bits(w0),
        )
    }
}

/// Re-encode a [`Move`] into 16 raw bits for storage.
///
/// The core crate keeps its bit layout private; the accessors recover
/// every field, so the round-trip through [`mv_from_raw`] is lossless.
fn mv_raw(mv: Move) -> u16 {
    use brio_core::MoveKind;
    let base = mv.from().index() as u16 | ((mv.to().index() as u16) << 6);
    match mv.kind() {
        MoveKind::Normal => base,
        MoveKind::Promotion => base | ((mv.promotion_piece() as u16) << 12) | (1 << 14),
        MoveKind::EnPassant => base | (2 << 14),
        MoveKind::Castle => base | (3 << 14),
    }
}

fn mv_from_raw(raw: u16) -> Move {
    use brio_core::{PromotionPiece, Square};
    if raw == 0 {
        return Move::NULL;
    }
    let from = Square::from_index((raw & 0x3F) as u8).unwrap_or(Square::A1);
    let to = Square::from_index(((raw >> 6) & 0x3F) as u8).unwrap_or(Square::A1);
    match raw >> 14 {
        1 => {
            let promo = match (raw >> 12) & 0b11 {
                0 => PromotionPiece::Knight,
                1 => PromotionPiece::Bishop,
                2 => PromotionPiece::Rook,
                _ => PromotionPiece::Queen,
            };
            Move::promotion(from, to, promo)
        }
        2 => Move::en_passant(from, to),
        3 => Move::castle(from, to),
        _ => Move::normal(from, to),
    }
}

/// Lockless transposition cache keyed by position fingerprint.
///
/// The cache is a hint, never a correctness requirement: any entry may be
/// ignored and the node re-expanded without changing which move the
/// search selects, only how many nodes it visits.
pub struct TranspositionTable {
    slots: Box<[Slot]>,
    mask: u64,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Create a table of the given size in megabytes (rounded down to a
    /// power of two of slots).
    pub fn new(mb: usize) -> TranspositionTable {
        let bytes = mb.max(1) * 1024 * 1024;
        let count = (bytes / std::mem::size_of::<Slot>())
            .next_power_of_two()
            >> 1;
        let count = count.max(1);
        TranspositionTable {
            slots: (0..count).map(|_| Slot::empty()).collect(),
            mask: (count - 1) as u64,
            generation: AtomicU8::new(0),
        }
    }

    /// Wipe every slot and reset the generation counter.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.word0.store(0, Ordering::Relaxed);
            slot.word1.store(0, Ordering::Relaxed);
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Advance the generation. Called once per search request.
    pub fn new_generation(&self) {
        let current = self.generation.load(Ordering::Relaxed);
        self.generation
            .store(current.wrapping_add(1) & 0x1F, Ordering::Relaxed);
    }

    fn slot(&self, hash: u64) -> &Slot {
        &self.slots[(hash & self.mask) as usize]
    }

    /// Probe for a usable score.
    ///
    /// Answers only when the stored entry is deep enough (or carries the
    /// HISTORY marker) *and* its bound kind is decisive against `window`:
    /// exact always, a lower bound when it already meets beta, an upper
    /// bound when it cannot reach alpha.
    pub fn probe(&self, hash: u64, depth: u8, ply: u8, window: SearchWindow) -> Option<i32> {
        let entry = self.slot(hash).load(hash)?;
        if entry.bound == Bound::None {
            return None;
        }
        if entry.depth < depth && entry.depth != HISTORY_DEPTH {
            return None;
        }
        let score = score_from_tt(entry.score, ply);
        match entry.bound {
            Bound::Exact => Some(score),
            Bound::Lower if score >= window.beta => Some(score),
            Bound::Upper if score <= window.alpha => Some(score),
            _ => None,
        }
    }

    /// The stored best move for a position, if any.
    pub fn best_move(&self, hash: u64) -> Option<Move> {
        let entry = self.slot(hash).load(hash)?;
        if entry.bound == Bound::None || entry.mv.is_null() {
            None
        } else {
            Some(entry.mv)
        }
    }

    /// Store a finished node.
    ///
    /// The bound kind is derived from `score` against the window the node
    /// was entered with: at or above beta is a lower bound, at or below
    /// the entry alpha an upper bound, anything between is exact.
    pub fn store(
        &self,
        hash: u64,
        depth: u8,
        ply: u8,
        window: SearchWindow,
        score: i32,
        best_move: Move,
    ) {
        let bound = Bound::classify(score, window);
        self.store_bound(hash, depth, ply, bound, score, best_move);
    }

    /// Tag a real game position as an always-valid drawn score, so the
    /// search treats any repetition of it as a draw without dedicated
    /// repetition logic.
    pub fn store_history_marker(&self, hash: u64) {
        self.store_bound(hash, HISTORY_DEPTH, 0, Bound::Exact, 0, Move::NULL);
    }

    fn store_bound(&self, hash: u64, depth: u8, ply: u8, bound: Bound, score: i32, mv: Move) {
        let slot = self.slot(hash);
        let generation = self.generation.load(Ordering::Relaxed);

        let (existing_depth, existing_generation, existing_bound) = slot.peek();
        if existing_bound != Bound::None && existing_generation == generation {
            // History markers for the current request are load-bearing;
            // only another marker may take the slot.
            if existing_depth == HISTORY_DEPTH && depth != HISTORY_DEPTH {
                return;
            }
            if depth < existing_depth && bound != Bound::Exact {
                return;
            }
        }

        let key = hash >> 32;
        let w0 = (key << 32)
            | ((mv_raw(mv) as u64) << 16)
            | ((depth as u64) << 8)
            | (((generation & 0x1F) as u64) << 3)
            | bound as u64;
        let check = (key as u32) ^ (w0 & 0xFFFF_FFFF) as u32;
        let w1 = ((check as u64) << 32) | (score_to_tt(score, ply) as u32 as u64);

        slot.word0.store(w0, Ordering::Relaxed);
        slot.word1.store(w1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("slots", &self.slots.len())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brio_core::Square;

    const HASH: u64 = 0xDEAD_BEEF_1234_5678;

    fn mv() -> Move {
        Move::normal(Square::E1, Square::G1)
    }

    #[test]
    fn slot_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<Slot>(), 16);
    }

    #[test]
    fn exact_entry_roundtrips() {
        let tt = TranspositionTable::new(1);
        let window = SearchWindow::new(-100, 100);
        tt.store(HASH, 5, 0, window, 42, mv());
        assert_eq!(tt.probe(HASH, 5, 0, window), Some(42));
        assert_eq!(tt.best_move(HASH), Some(mv()));
    }

    #[test]
    fn shallow_entry_refused_for_deeper_probe() {
        let tt = TranspositionTable::new(1);
        let window = SearchWindow::new(-100, 100);
        tt.store(HASH, 3, 0, window, 42, mv());
        assert_eq!(tt.probe(HASH, 5, 0, window), None);
        assert_eq!(tt.probe(HASH, 3, 0, window), Some(42));
        // The best-move hint survives a depth refusal.
        assert_eq!(tt.best_move(HASH), Some(mv()));
    }

    #[test]
    fn lower_bound_needs_beta() {
        let tt = TranspositionTable::new(1);
        // Score hit beta: lower bound.
        tt.store(HASH, 4, 0, SearchWindow::new(-50, 60), 60, mv());
        // Usable when the bound already answers the new window...
        assert_eq!(tt.probe(HASH, 4, 0, SearchWindow::new(-50, 55)), Some(60));
        // ...but not when beta moved above the stored score.
        assert_eq!(tt.probe(HASH, 4, 0, SearchWindow::new(-50, 100)), None);
    }

    #[test]
    fn upper_bound_needs_alpha() {
        let tt = TranspositionTable::new(1);
        // Score stuck at alpha: upper bound.
        tt.store(HASH, 4, 0, SearchWindow::new(-50, 60), -50, mv());
        assert_eq!(tt.probe(HASH, 4, 0, SearchWindow::new(-40, 60)), Some(-50));
        assert_eq!(tt.probe(HASH, 4, 0, SearchWindow::new(-90, 60)), None);
    }

    #[test]
    fn probe_miss_and_collision() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.probe(HASH, 1, 0, SearchWindow::INFINITE), None);
        tt.store(HASH, 5, 0, SearchWindow::new(-100, 100), 42, mv());
        // A different upper key mapping to another slot misses cleanly.
        assert_eq!(
            tt.probe(0x1111_2222_3333_4444, 1, 0, SearchWindow::INFINITE),
            None
        );
    }

    #[test]
    fn history_marker_valid_at_any_depth() {
        let tt = TranspositionTable::new(1);
        tt.store_history_marker(HASH);
        for depth in [0u8, 1, 10, 60] {
            assert_eq!(tt.probe(HASH, depth, 3, SearchWindow::INFINITE), Some(0));
        }
    }

    #[test]
    fn history_marker_not_evicted_within_generation() {
        let tt = TranspositionTable::new(1);
        tt.store_history_marker(HASH);
        tt.store(HASH, 10, 0, SearchWindow::new(-100, 100), 42, mv());
        assert_eq!(tt.probe(HASH, 64, 0, SearchWindow::INFINITE), Some(0));
        // A new generation may reclaim the slot.
        tt.new_generation();
        tt.store(HASH, 10, 0, SearchWindow::new(-100, 100), 42, mv());
        assert_eq!(tt.probe(HASH, 10, 0, SearchWindow::new(-100, 100)), Some(42));
    }

    #[test]
    fn mate_scores_are_ply_adjusted() {
        let tt = TranspositionTable::new(1);
        // Mate-in-2 seen at ply 4: stored relative to the node.
        let score_at_node = 29_000 - 6;
        tt.store(HASH, 8, 4, SearchWindow::new(-30_000, 30_000), score_at_node, mv());
        // Probing the same position at ply 2 sees the mate two plies closer
        // to its own root distance.
        let probed = tt.probe(HASH, 8, 2, SearchWindow::new(-30_000, 30_000));
        assert_eq!(probed, Some(score_at_node + 2));
    }

    #[test]
    fn shallower_store_does_not_evict_deeper() {
        let tt = TranspositionTable::new(1);
        let window = SearchWindow::new(-100, 100);
        tt.store(HASH, 8, 0, window, 42, mv());
        // A shallower lower-bound store is refused within the generation.
        tt.store(HASH, 2, 0, window, 99, Move::normal(Square::A1, Square::A8));
        assert_eq!(tt.probe(HASH, 8, 0, window), Some(42));
    }

    #[test]
    fn torn_write_is_discarded() {
        let tt = TranspositionTable::new(1);
        tt.store(HASH, 5, 0, SearchWindow::new(-100, 100), 42, mv());
        let slot = tt.slot(HASH);
        let w1 = slot.word1.load(Ordering::Relaxed);
        slot.word1
            .store(w1 ^ 0xFFFF_FFFF_0000_0000, Ordering::Relaxed);
        assert_eq!(tt.probe(HASH, 5, 0, SearchWindow::new(-100, 100)), None);
    }

    #[test]
    fn move_encoding_roundtrips() {
        use brio_core::PromotionPiece;
        let e7 = Square::from_algebraic("e7").unwrap();
        let d4 = Square::from_algebraic("d4").unwrap();
        let c3 = Square::from_algebraic("c3").unwrap();
        for mv in [
            Move::normal(Square::E1, Square::G1),
            Move::promotion(e7, Square::E8, PromotionPiece::Queen),
            Move::en_passant(d4, c3),
            Move::castle(Square::E8, Square::C8),
        ] {
            assert_eq!(mv_from_raw(mv_raw(mv)), mv);
        }
    }
}
