//! The mailbox board: a 64-slot piece array with copy-make semantics.

use std::fmt;

use crate::castle_rights::CastleRights;
use crate::chess_move::{Move, MoveKind};
use crate::color::Color;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::square::Square;
use crate::zobrist;

// Step tables shared with move generation.
pub(crate) const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
pub(crate) const KING_STEPS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];
pub(crate) const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
pub(crate) const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// A chess position.
///
/// `Board` is a value type: [`make_move`](Board::make_move) returns a fresh
/// child and never mutates its receiver, so every ply of a search line owns
/// its own position. The Zobrist fingerprint is maintained incrementally.
#[derive(Clone, Copy)]
pub struct Board {
    pub(crate) squares: [Option<Piece>; 64],
    pub(crate) kings: [Square; 2],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastleRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u8,
    pub(crate) fullmove_number: u16,
    pub(crate) hash: u64,
}

impl Board {
    /// The standard starting position.
    pub fn starting_position() -> Board {
        crate::fen::STARTING_FEN
            .parse()
            .expect("starting FEN is valid")
    }

    /// The piece on `sq`, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// The side to move.
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Current castling rights.
    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    /// The en-passant target square, if the last move was a double push.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Halfmoves since the last capture or pawn move (fifty-move rule).
    #[inline]
    pub fn halfmove_clock(&self) -> u8 {
        self.halfmove_clock
    }

    /// Fullmove number, starting at 1.
    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// The position fingerprint.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The square of `color`'s king.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    /// Whether `color`'s king is attacked.
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), !color)
    }

    /// Whether any piece of `by` attacks `sq`.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        // Pawns attack from one rank behind their advance direction.
        let pawn_origin_rank = -by.forward();
        for df in [-1i8, 1] {
            if let Some(origin) = sq.offset(df, pawn_origin_rank)
                && self.piece_at(origin) == Some(Piece::new(by, PieceKind::Pawn))
            {
                return true;
            }
        }

        for (df, dr) in KNIGHT_STEPS {
            if let Some(origin) = sq.offset(df, dr)
                && self.piece_at(origin) == Some(Piece::new(by, PieceKind::Knight))
            {
                return true;
            }
        }

        for (df, dr) in KING_STEPS {
            if let Some(origin) = sq.offset(df, dr)
                && self.piece_at(origin) == Some(Piece::new(by, PieceKind::King))
            {
                return true;
            }
        }

        self.ray_attacked(sq, by, &ROOK_DIRS, PieceKind::Rook)
            || self.ray_attacked(sq, by, &BISHOP_DIRS, PieceKind::Bishop)
    }

    /// Scan rays from `sq` for an attacking `slider` or queen of `by`.
    fn ray_attacked(&self, sq: Square, by: Color, dirs: &[(i8, i8); 4], slider: PieceKind) -> bool {
        for &(df, dr) in dirs {
            let mut current = sq;
            while let Some(next) = current.offset(df, dr) {
                match self.piece_at(next) {
                    None => current = next,
                    Some(piece) => {
                        if piece.color == by
                            && (piece.kind == slider || piece.kind == PieceKind::Queen)
                        {
                            return true;
                        }
                        break;
                    }
                }
            }
        }
        false
    }

    /// Whether `color` still owns a knight, bishop, rook, or queen.
    ///
    /// Null-move pruning is disabled without such material (zugzwang guard).
    pub fn has_piece_material(&self, color: Color) -> bool {
        self.squares.iter().flatten().any(|p| {
            p.color == color && p.kind != PieceKind::Pawn && p.kind != PieceKind::King
        })
    }

    /// Whether `mv` captures a piece (including en passant).
    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        mv.kind() == MoveKind::EnPassant || self.piece_at(mv.to()).is_some()
    }

    /// Derive the child position after `mv`.
    ///
    /// `mv` must come from move generation on this position; the move is
    /// applied without legality checks (callers filter own-king-in-check
    /// afterwards).
    pub fn make_move(&self, mv: Move) -> Board {
        let from = mv.from();
        let to = mv.to();
        let piece = self.squares[from.index()].expect("make_move: empty origin square");

        let mut next = *self;
        next.hash ^= zobrist::castling_key(self.castling);
        if let Some(ep) = self.en_passant {
            next.hash ^= zobrist::ep_key(ep);
        }
        next.en_passant = None;

        let mut resets_clock = piece.kind == PieceKind::Pawn;

        if let Some(victim) = self.squares[to.index()] {
            next.hash ^= zobrist::piece_key(victim, to);
            revoke_rook_rights(&mut next.castling, to);
            resets_clock = true;
        }

        next.squares[from.index()] = None;
        next.hash ^= zobrist::piece_key(piece, from);

        match mv.kind() {
            MoveKind::Normal => {
                next.squares[to.index()] = Some(piece);
                next.hash ^= zobrist::piece_key(piece, to);
                if piece.kind == PieceKind::Pawn && from.rank().abs_diff(to.rank()) == 2 {
                    let ep = Square::new(from.file(), (from.rank() + to.rank()) / 2);
                    next.en_passant = Some(ep);
                    next.hash ^= zobrist::ep_key(ep);
                }
            }
            MoveKind::Promotion => {
                let promoted = Piece::new(piece.color, mv.promotion_piece().kind());
                next.squares[to.index()] = Some(promoted);
                next.hash ^= zobrist::piece_key(promoted, to);
            }
            MoveKind::EnPassant => {
                next.squares[to.index()] = Some(piece);
                next.hash ^= zobrist::piece_key(piece, to);
                // The captured pawn sits beside the origin, not on `to`.
                let captured_sq = Square::new(to.file(), from.rank());
                if let Some(victim) = self.squares[captured_sq.index()] {
                    next.squares[captured_sq.index()] = None;
                    next.hash ^= zobrist::piece_key(victim, captured_sq);
                }
            }
            MoveKind::Castle => {
                next.squares[to.index()] = Some(piece);
                next.hash ^= zobrist::piece_key(piece, to);
                let rank = from.rank();
                let (rook_from, rook_to) = if to.file() == 6 {
                    (Square::new(7, rank), Square::new(5, rank))
                } else {
                    (Square::new(0, rank), Square::new(3, rank))
                };
                if let Some(rook) = self.squares[rook_from.index()] {
                    next.squares[rook_from.index()] = None;
                    next.squares[rook_to.index()] = Some(rook);
                    next.hash ^=
                        zobrist::piece_key(rook, rook_from) ^ zobrist::piece_key(rook, rook_to);
                }
            }
        }

        if piece.kind == PieceKind::King {
            next.kings[piece.color.index()] = to;
            next.castling.revoke_all(piece.color);
        } else if piece.kind == PieceKind::Rook {
            revoke_rook_rights(&mut next.castling, from);
        }
        next.hash ^= zobrist::castling_key(next.castling);

        next.halfmove_clock = if resets_clock {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        if self.side_to_move == Color::Black {
            next.fullmove_number += 1;
        }
        next.side_to_move = !self.side_to_move;
        next.hash ^= zobrist::side_key();
        next
    }

    /// Pass the turn without moving (null-move pruning).
    pub fn make_null_move(&self) -> Board {
        let mut next = *self;
        if let Some(ep) = self.en_passant {
            next.hash ^= zobrist::ep_key(ep);
            next.en_passant = None;
        }
        next.halfmove_clock = self.halfmove_clock.saturating_add(1);
        next.side_to_move = !self.side_to_move;
        next.hash ^= zobrist::side_key();
        next
    }

    /// A copy with the side to move overridden.
    ///
    /// Analysis helper for evaluation passes that need to generate moves
    /// for the side not on turn (e.g. king escape squares). Not a game
    /// transition: clocks and castling are untouched.
    pub fn with_side_to_move(&self, color: Color) -> Board {
        let mut next = *self;
        if next.side_to_move != color {
            next.side_to_move = color;
            next.hash ^= zobrist::side_key();
        }
        next
    }
}

/// Drop the castling right anchored on a rook home square.
fn revoke_rook_rights(rights: &mut CastleRights, sq: Square) {
    match sq {
        Square::A1 => rights.revoke(Color::White, false),
        Square::H1 => rights.revoke(Color::White, true),
        Square::A8 => rights.revoke(Color::Black, false),
        Square::H8 => rights.revoke(Color::Black, true),
        _ => {}
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({})", crate::fen::to_fen(self))
    }
}
