//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chess_nnue::board::Position;
use chess_nnue::nnue::{Accumulator, Network, RawNetwork, HIDDEN_SIZE, QA, QB};
use once_cell::sync::Lazy;
use rand::prelude::*;

pub const HASH: u64 = 0x0123_4567_89AB_CDEF;

/// Float parameters in ranges typical of a trained net.
pub static RAW: Lazy<RawNetwork> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(42);
    let mut raw = RawNetwork::zeroed();
    for w in raw.feature_weights.iter_mut() {
        *w = rng.gen_range(-0.25..=0.25);
    }
    for b in raw.feature_bias.iter_mut() {
        *b = rng.gen_range(-0.5..=0.5);
    }
    for w in raw.output_weights.iter_mut() {
        *w = rng.gen_range(-0.5..=0.5);
    }
    raw.output_bias = rng.gen_range(-1.0..=1.0);
    raw
});

/// `RAW` encoded in the resource format.
pub static BYTES: Lazy<Vec<u8>> = Lazy::new(|| RAW.to_bytes(HASH));

static NETWORK: Lazy<Arc<Network>> = Lazy::new(|| Arc::new(RAW.quantize(HASH)));

pub fn network() -> Arc<Network> {
    Arc::clone(&NETWORK)
}

/// Output layer evaluated in i64 with no wrapping anywhere.
pub fn reference_eval(network: &Network, position: &Position) -> i64 {
    let stm = position.side_to_move();
    let own = Accumulator::refreshed(network, position, stm);
    let opp = Accumulator::refreshed(network, position, stm.opponent());
    let weights = network.output_weights();
    let mut sum = i64::from(network.output_bias()) * i64::from(QA);
    for i in 0..HIDDEN_SIZE {
        sum += i64::from(own.values()[i].max(0)) * i64::from(weights[0][i]);
        sum += i64::from(opp.values()[i].max(0)) * i64::from(weights[1][i]);
    }
    sum / i64::from(QA * QB)
}

/// Play up to `plies` random pseudo-legal moves.
pub fn random_position(seed: u64, plies: usize) -> Position {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos = Position::startpos();
    for _ in 0..plies {
        let moves = pos.generate_moves();
        if moves.is_empty() {
            break;
        }
        pos.make_move(moves[rng.gen_range(0..moves.len())]);
    }
    pos
}
