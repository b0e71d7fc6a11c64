use super::{CastlingRights, Color, Piece, Square};

/// State needed to take a move back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnmakeInfo {
    pub(crate) moved_piece: Piece,
    pub(crate) captured: Option<(Square, Piece)>,
    pub(crate) previous_en_passant: Option<Square>,
    pub(crate) previous_castling: CastlingRights,
}

/// State needed to take a null move back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NullMoveInfo {
    pub(crate) previous_en_passant: Option<Square>,
}

/// Mailbox board: the occupancy view the evaluation needs, plus enough game
/// state (castling, en passant) to produce feature diffs for every move kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub(crate) squares: [Option<(Color, Piece)>; 64],
    pub(crate) kings: [Square; 2],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
}

impl Position {
    /// Standard starting position
    #[must_use]
    pub fn startpos() -> Self {
        let mut pos = Position::empty();
        let back_rank = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, &piece) in back_rank.iter().enumerate() {
            let file = file as u8;
            pos.put(sq(0, file), Color::White, piece);
            pos.put(sq(1, file), Color::White, Piece::Pawn);
            pos.put(sq(6, file), Color::Black, Piece::Pawn);
            pos.put(sq(7, file), Color::Black, piece);
        }
        pos.castling = CastlingRights::all();
        pos
    }

    /// Board with nothing on it; kings default to e1/e8 until placed.
    pub(crate) fn empty() -> Self {
        Position {
            squares: [None; 64],
            kings: [sq(0, 4), sq(7, 4)],
            side_to_move: Color::White,
            castling: CastlingRights::none(),
            en_passant: None,
        }
    }

    /// Place a piece, replacing anything on the square.
    pub(crate) fn put(&mut self, square: Square, color: Color, piece: Piece) {
        self.squares[square.index()] = Some((color, piece));
        if piece == Piece::King {
            self.kings[color.index()] = square;
        }
    }

    pub(crate) fn take(&mut self, square: Square) -> Option<(Color, Piece)> {
        self.squares[square.index()].take()
    }

    /// Piece and color on a square
    #[inline]
    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<(Color, Piece)> {
        self.squares[square.index()]
    }

    /// King square of `color`; the anchor of that perspective's features
    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    #[must_use]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Every occupied square with its piece, in square order
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Color, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.map(|(color, piece)| (Square::from_index(idx), color, piece)))
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

#[inline]
pub(crate) const fn sq(rank: u8, file: u8) -> Square {
    Square::from_index((rank * 8 + file) as usize)
}
