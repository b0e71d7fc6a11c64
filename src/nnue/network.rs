//! Quantized network parameters and the output layer.
//!
//! A `Network` is built once (see `loader`) and never mutated afterwards, so
//! one instance can be shared by reference or `Arc` between search threads.

use super::accumulator::Accumulator;
use super::simd::{self, Kernel};
use super::{HIDDEN_SIZE, INPUT_SIZE, QA, QB};

/// Quantize a float weight to 16-bit fixed point at `precision`.
///
/// Rounds half away from zero; out-of-range values saturate and NaN maps to 0.
#[inline]
#[must_use]
pub fn quantize(value: f32, precision: i32) -> i16 {
    (value * precision as f32).round() as i16
}

/// Quantize a float to 32-bit fixed point at `precision` (output bias).
#[inline]
#[must_use]
pub fn quantize_i32(value: f32, precision: i32) -> i32 {
    (value * precision as f32).round() as i32
}

/// Inverse of `quantize`.
#[inline]
#[must_use]
pub fn dequantize(value: i16, precision: i32) -> f32 {
    f32::from(value) / precision as f32
}

/// NNUE network weights
pub struct Network {
    /// Feature transformer weights `[INPUT_SIZE][HIDDEN_SIZE]`, scale `QA`
    pub(crate) feature_weights: Box<[[i16; HIDDEN_SIZE]]>,
    /// Feature transformer biases `[HIDDEN_SIZE]`, scale `QA`
    pub(crate) feature_bias: [i16; HIDDEN_SIZE],
    /// Output weights: `[0]` for the side to move, `[1]` for the opponent, scale `QB`
    pub(crate) output_weights: [[i16; HIDDEN_SIZE]; 2],
    /// Output bias, scale `QB`
    pub(crate) output_bias: i32,
    /// Identifier declared by the resource
    pub(crate) hash: u64,
}

impl Network {
    /// All-zero network with the given hash; filled in by the loader.
    pub(crate) fn zeroed(hash: u64) -> Self {
        Network {
            feature_weights: vec![[0i16; HIDDEN_SIZE]; INPUT_SIZE].into_boxed_slice(),
            feature_bias: [0; HIDDEN_SIZE],
            output_weights: [[0; HIDDEN_SIZE]; 2],
            output_bias: 0,
            hash,
        }
    }

    /// Weight row of one input feature.
    ///
    /// # Panics
    /// Panics if `feature >= INPUT_SIZE`.
    #[inline]
    #[must_use]
    pub fn feature_row(&self, feature: usize) -> &[i16; HIDDEN_SIZE] {
        &self.feature_weights[feature]
    }

    #[inline]
    #[must_use]
    pub fn feature_bias(&self) -> &[i16; HIDDEN_SIZE] {
        &self.feature_bias
    }

    /// Output weights for the own (`0`) and opponent (`1`) halves
    #[inline]
    #[must_use]
    pub fn output_weights(&self) -> &[[i16; HIDDEN_SIZE]; 2] {
        &self.output_weights
    }

    #[inline]
    #[must_use]
    pub fn output_bias(&self) -> i32 {
        self.output_bias
    }

    /// Identifier of the loaded resource (diagnostics only)
    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Output layer: clipped ReLU on both accumulators, dot with the matching
    /// half of the output weights, add the bias and scale back down.
    ///
    /// Positive scores favor the side whose accumulator is passed as `own`.
    #[inline]
    #[must_use]
    pub fn output(&self, own: &Accumulator, opp: &Accumulator, kernel: Kernel) -> i32 {
        let dot = simd::relu_dot(
            kernel,
            own.values(),
            opp.values(),
            &self.output_weights[0],
            &self.output_weights[1],
        );
        self.output_bias.wrapping_mul(QA).wrapping_add(dot) / (QA * QB)
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("hash", &format_args!("{:016x}", self.hash))
            .field("inputs", &self.feature_weights.len())
            .field("hidden", &HIDDEN_SIZE)
            .field("output_bias", &self.output_bias)
            .finish()
    }
}
