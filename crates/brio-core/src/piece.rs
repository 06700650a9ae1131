//! A colored piece occupying a board square.

use std::fmt;

use crate::color::Color;
use crate::piece_kind::PieceKind;

/// A piece: a [`PieceKind`] owned by a [`Color`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    /// Create a piece.
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Piece {
        Piece { color, kind }
    }

    /// Index into 12-entry piece tables: `color * 6 + kind`.
    #[inline]
    pub const fn index(self) -> usize {
        self.color.index() * PieceKind::COUNT + self.kind.index()
    }

    /// Parse a FEN piece character (uppercase = White, lowercase = Black).
    pub const fn from_fen_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Piece { color, kind })
    }

    /// FEN character for this piece (uppercase = White).
    pub const fn fen_char(self) -> char {
        let c = self.kind.fen_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_char_roundtrip() {
        for c in ['P', 'n', 'K', 'q', 'R', 'b'] {
            let piece = Piece::from_fen_char(c).unwrap();
            assert_eq!(piece.fen_char(), c);
        }
        assert!(Piece::from_fen_char('x').is_none());
    }

    #[test]
    fn table_indices_are_distinct() {
        let mut seen = [false; 12];
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let idx = Piece::new(color, kind).index();
                assert!(!seen[idx]);
                seen[idx] = true;
            }
        }
    }
}
