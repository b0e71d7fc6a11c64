//! Seeded test networks.
//!
//! Building a network touches millions of weights, so each one is built once
//! per test binary and shared.

use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::prelude::*;

use crate::board::{Move, Position};
use crate::nnue::{Network, RawNetwork};

pub(crate) const TEST_NETWORK_HASH: u64 = 0x7E57_0000_0000_0001;

static TEST_NETWORK: Lazy<Arc<Network>> =
    Lazy::new(|| Arc::new(random_raw_network(0x5EED, 0.25).quantize(TEST_NETWORK_HASH)));

/// Feature weights far beyond the i16 range once summed, so accumulator
/// lanes wrap on ordinary positions.
static OVERFLOW_NETWORK: Lazy<Arc<Network>> =
    Lazy::new(|| Arc::new(random_raw_network(0x0F10, 900.0).quantize(2)));

/// Random float parameters: feature weights in `[-feature_range, feature_range]`,
/// biases and output weights in `[-0.5, 0.5]`, output bias in `[-1, 1]`.
pub(crate) fn random_raw_network(seed: u64, feature_range: f32) -> RawNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut raw = RawNetwork::zeroed();
    for w in raw.feature_weights.iter_mut() {
        *w = rng.gen_range(-feature_range..=feature_range);
    }
    for b in raw.feature_bias.iter_mut() {
        *b = rng.gen_range(-0.5..=0.5);
    }
    for w in raw.output_weights.iter_mut() {
        *w = rng.gen_range(-0.5..=0.5);
    }
    raw.output_bias = rng.gen_range(-1.0..=1.0);
    raw
}

pub(crate) fn test_network() -> &'static Network {
    &TEST_NETWORK
}

pub(crate) fn shared_test_network() -> Arc<Network> {
    Arc::clone(&TEST_NETWORK)
}

pub(crate) fn overflow_network() -> Arc<Network> {
    Arc::clone(&OVERFLOW_NETWORK)
}

/// The pseudo-legal move written `uci` (e.g. `e7e8q`) in `pos`.
pub(crate) fn find_move(pos: &Position, uci: &str) -> Move {
    pos.generate_moves()
        .iter()
        .copied()
        .find(|m| m.to_string() == uci)
        .unwrap_or_else(|| panic!("move {uci} not available in {}", pos.to_fen()))
}
