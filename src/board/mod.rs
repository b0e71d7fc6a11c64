//! Chess position collaborator for the evaluator.
//!
//! A compact mailbox board with FEN parsing, pseudo-legal move generation
//! and make/unmake. Every move reports the feature diff it causes for both
//! evaluation perspectives.
//!
//! # Example
//! ```
//! use chess_nnue::board::Position;
//!
//! let mut pos = Position::startpos();
//! let moves = pos.generate_moves();
//! let (info, changes) = pos.make_move(moves[0]);
//! assert!(changes.iter().all(|c| c.delta().is_some()));
//! pos.unmake_move(moves[0], info);
//! assert_eq!(pos, Position::startpos());
//! ```

mod error;
mod fen;
mod make_unmake;
mod movegen;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use error::{FenError, SquareError};
pub use state::{NullMoveInfo, Position, UnmakeInfo};
pub use types::{CastlingRights, Color, Move, MoveList, Piece, Square, MAX_PLY};

pub(crate) use types::PROMOTION_PIECES;
