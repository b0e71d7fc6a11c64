//! Move application and the feature diffs each move produces.

use super::state::sq;
use super::{Color, Move, NullMoveInfo, Piece, Position, Square, UnmakeInfo};
use crate::nnue::features::{feature_index, needs_refresh, AccumulatorChange, NnUpdate};

/// Rook squares (from, to) for a castle of `color`.
#[inline]
fn castle_rook_squares(color: Color, kingside: bool) -> (Square, Square) {
    let rank = color.back_rank();
    if kingside {
        (sq(rank, 7), sq(rank, 5))
    } else {
        (sq(rank, 0), sq(rank, 3))
    }
}

/// One piece appearing or disappearing; at most two of each per move.
#[derive(Clone, Copy)]
struct PieceDelta {
    color: Color,
    piece: Piece,
    square: Square,
}

impl Position {
    /// Play `mv` for the side to move and report, per perspective (indexed by
    /// `Color::index`), how its accumulator must change.
    ///
    /// The move is assumed pseudo-legal for this position. Removals are
    /// ordered mover first, then the captured piece.
    ///
    /// # Panics
    /// Panics if the source square is empty.
    pub fn make_move(&mut self, mv: Move) -> (UnmakeInfo, [AccumulatorChange; 2]) {
        let us = self.side_to_move;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();

        let (_, moved_piece) = self
            .take(from)
            .expect("make_move: no piece on the source square");

        let info_prev_ep = self.en_passant;
        let info_prev_castling = self.castling;

        let mut removed: [Option<PieceDelta>; 2] = [None; 2];
        let mut added: [Option<PieceDelta>; 2] = [None; 2];
        removed[0] = Some(PieceDelta {
            color: us,
            piece: moved_piece,
            square: from,
        });

        let captured = if mv.is_en_passant() {
            let cap_sq = sq(from.rank(), to.file());
            self.take(cap_sq).map(|(_, piece)| (cap_sq, piece))
        } else if mv.is_capture() {
            self.take(to).map(|(_, piece)| (to, piece))
        } else {
            None
        };
        if let Some((square, piece)) = captured {
            removed[1] = Some(PieceDelta {
                color: them,
                piece,
                square,
            });
        }

        let placed = mv.promotion_piece().unwrap_or(moved_piece);
        self.put(to, us, placed);
        added[0] = Some(PieceDelta {
            color: us,
            piece: placed,
            square: to,
        });

        if mv.is_castling() {
            let (rook_from, rook_to) = castle_rook_squares(us, mv.is_castle_kingside());
            self.take(rook_from);
            self.put(rook_to, us, Piece::Rook);
            removed[1] = Some(PieceDelta {
                color: us,
                piece: Piece::Rook,
                square: rook_from,
            });
            added[1] = Some(PieceDelta {
                color: us,
                piece: Piece::Rook,
                square: rook_to,
            });
        }

        self.en_passant = if mv.is_double_pawn_push() {
            Some(sq((from.rank() + to.rank()) / 2, from.file()))
        } else {
            None
        };
        if moved_piece == Piece::King {
            self.castling.remove_color(us);
        }
        for corner in [from, to] {
            self.revoke_rook_rights(corner);
        }
        self.side_to_move = them;

        let king_moved_far = moved_piece == Piece::King && needs_refresh(from, to, us);
        let mut changes = [
            AccumulatorChange::Delta(NnUpdate::new()),
            AccumulatorChange::Delta(NnUpdate::new()),
        ];
        for perspective in Color::BOTH {
            changes[perspective.index()] = if king_moved_far && perspective == us {
                AccumulatorChange::Refresh
            } else {
                AccumulatorChange::Delta(self.diff_for(perspective, &removed, &added))
            };
        }

        let info = UnmakeInfo {
            moved_piece,
            captured,
            previous_en_passant: info_prev_ep,
            previous_castling: info_prev_castling,
        };
        (info, changes)
    }

    /// Take back `mv`, restoring the board exactly.
    pub fn unmake_move(&mut self, mv: Move, info: UnmakeInfo) {
        let us = self.side_to_move.opponent();
        let them = self.side_to_move;
        let from = mv.from();
        let to = mv.to();

        self.take(to);
        self.put(from, us, info.moved_piece);
        if mv.is_castling() {
            let (rook_from, rook_to) = castle_rook_squares(us, mv.is_castle_kingside());
            self.take(rook_to);
            self.put(rook_from, us, Piece::Rook);
        }
        if let Some((square, piece)) = info.captured {
            self.put(square, them, piece);
        }

        self.en_passant = info.previous_en_passant;
        self.castling = info.previous_castling;
        self.side_to_move = us;
    }

    /// Pass the turn. No feature changes for either perspective.
    pub fn make_null_move(&mut self) -> (NullMoveInfo, [AccumulatorChange; 2]) {
        let info = NullMoveInfo {
            previous_en_passant: self.en_passant,
        };
        self.en_passant = None;
        self.side_to_move = self.side_to_move.opponent();
        let noop = AccumulatorChange::Delta(NnUpdate::new());
        (info, [noop, noop])
    }

    pub fn unmake_null_move(&mut self, info: NullMoveInfo) {
        self.en_passant = info.previous_en_passant;
        self.side_to_move = self.side_to_move.opponent();
    }

    /// Feature diff for `perspective`, using its king square after the move.
    /// Only called when that king square keeps the same orientation and bucket.
    fn diff_for(
        &self,
        perspective: Color,
        removed: &[Option<PieceDelta>; 2],
        added: &[Option<PieceDelta>; 2],
    ) -> NnUpdate {
        let king_sq = self.king_square(perspective);
        let index = |d: &PieceDelta| feature_index(d.piece, d.color, d.square, king_sq, perspective);
        let mut update = NnUpdate::new();
        for delta in removed.iter().flatten() {
            update.remove(index(delta));
        }
        for delta in added.iter().flatten() {
            update.add(index(delta));
        }
        update
    }

    fn revoke_rook_rights(&mut self, square: Square) {
        for color in Color::BOTH {
            let rank = color.back_rank();
            if square == sq(rank, 0) {
                self.castling.remove(color, false);
            } else if square == sq(rank, 7) {
                self.castling.remove(color, true);
            }
        }
    }
}
