//! Quantized NNUE evaluation with incremental accumulator updates.
//!
//! ```no_run
//! use chess_nnue::board::Position;
//! use chess_nnue::config::EvalConfig;
//!
//! let config = EvalConfig::from_env();
//! let network = config.load_network().expect("no network configured");
//! let mut eval = config.evaluator(network);
//!
//! let mut pos = Position::startpos();
//! eval.set_position(&pos);
//! let mv = pos.generate_moves()[0];
//! let info = eval.make_move(&mut pos, mv);
//! println!("{}", eval.evaluate(&pos));
//! eval.unmake_move(&mut pos, mv, info);
//! ```

pub mod board;
pub mod config;
pub mod nnue;

pub use board::{Color, Move, Piece, Position, Square};
pub use config::{ConfigError, EvalConfig};
pub use nnue::{predict, Evaluator, Kernel, Network, NetworkError};
