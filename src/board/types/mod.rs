//! Core chess types.
//!
//! - `Piece` and `Color` - piece kinds and colors (a color doubles as an evaluation perspective)
//! - `Square` - compact board square (u8 index)
//! - `Move` and `MoveList` - move representation
//! - `CastlingRights` - castling state

mod castling;
mod moves;
mod piece;
mod square;

pub use castling::CastlingRights;
pub use moves::{Move, MoveList, MAX_PLY};
pub use piece::{Color, Piece};
pub use square::Square;

pub(crate) use piece::PROMOTION_PIECES;
