//! Pseudo-legal move generation on the mailbox.
//!
//! Moves obey piece movement, castling and en passant rules but ignore
//! checks; a king is never captured. That is enough to walk realistic move
//! sequences through every kind of feature diff.

use super::state::sq;
use super::{Color, Move, MoveList, Piece, Position, Square, PROMOTION_PIECES};

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

impl Position {
    /// All pseudo-legal moves for the side to move.
    #[must_use]
    pub fn generate_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        let us = self.side_to_move;
        for (from, color, piece) in self.occupied() {
            if color != us {
                continue;
            }
            match piece {
                Piece::Pawn => self.pawn_moves(from, us, &mut moves),
                Piece::Knight => self.step_moves(from, &KNIGHT_STEPS, &mut moves),
                Piece::Bishop => self.slider_moves(from, &BISHOP_DIRS, &mut moves),
                Piece::Rook => self.slider_moves(from, &ROOK_DIRS, &mut moves),
                Piece::Queen => {
                    self.slider_moves(from, &BISHOP_DIRS, &mut moves);
                    self.slider_moves(from, &ROOK_DIRS, &mut moves);
                }
                Piece::King => {
                    self.step_moves(from, &KING_STEPS, &mut moves);
                    self.castle_moves(from, us, &mut moves);
                }
            }
        }
        moves
    }

    /// Quiet or capturing move to `to`, if the target allows one.
    fn push_target(&self, from: Square, to: Square, moves: &mut MoveList) -> bool {
        match self.piece_at(to) {
            None => {
                moves.push(Move::quiet(from, to));
                true
            }
            Some((color, piece)) => {
                if color != self.side_to_move && piece != Piece::King {
                    moves.push(Move::capture(from, to));
                }
                false
            }
        }
    }

    fn step_moves(&self, from: Square, steps: &[(i8, i8)], moves: &mut MoveList) {
        for &(dr, df) in steps {
            if let Some(to) = from.offset(dr, df) {
                self.push_target(from, to, moves);
            }
        }
    }

    fn slider_moves(&self, from: Square, dirs: &[(i8, i8)], moves: &mut MoveList) {
        for &(dr, df) in dirs {
            let mut cur = from;
            while let Some(to) = cur.offset(dr, df) {
                if !self.push_target(from, to, moves) {
                    break;
                }
                cur = to;
            }
        }
    }

    fn pawn_moves(&self, from: Square, us: Color, moves: &mut MoveList) {
        let dir = us.pawn_direction();
        let Some(one) = from.offset(dir, 0) else {
            return;
        };
        let promotes = one.rank() == us.pawn_promotion_rank();

        if self.piece_at(one).is_none() {
            if promotes {
                for piece in PROMOTION_PIECES {
                    moves.push(Move::promotion(from, one, piece, false));
                }
            } else {
                moves.push(Move::quiet(from, one));
                if from.rank() == us.pawn_start_rank() {
                    if let Some(two) = one.offset(dir, 0) {
                        if self.piece_at(two).is_none() {
                            moves.push(Move::double_pawn_push(from, two));
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            let Some(to) = from.offset(dir, df) else {
                continue;
            };
            match self.piece_at(to) {
                Some((color, piece)) if color != us && piece != Piece::King => {
                    if promotes {
                        for promo in PROMOTION_PIECES {
                            moves.push(Move::promotion(from, to, promo, true));
                        }
                    } else {
                        moves.push(Move::capture(from, to));
                    }
                }
                None if self.en_passant == Some(to) => {
                    let victim = sq(from.rank(), to.file());
                    if self.piece_at(victim) == Some((us.opponent(), Piece::Pawn)) {
                        moves.push(Move::en_passant(from, to));
                    }
                }
                _ => {}
            }
        }
    }

    fn castle_moves(&self, from: Square, us: Color, moves: &mut MoveList) {
        let rank = us.back_rank();
        if from != sq(rank, 4) {
            return;
        }
        let empty = |files: &[u8]| files.iter().all(|&f| self.piece_at(sq(rank, f)).is_none());
        let rook_home = |file: u8| self.piece_at(sq(rank, file)) == Some((us, Piece::Rook));

        if self.castling.has(us, true) && rook_home(7) && empty(&[5, 6]) {
            moves.push(Move::castle_kingside(from, sq(rank, 6)));
        }
        if self.castling.has(us, false) && rook_home(0) && empty(&[1, 2, 3]) {
            moves.push(Move::castle_queenside(from, sq(rank, 2)));
        }
    }
}
