//! NNUE (Efficiently Updatable Neural Network) evaluation.
//!
//! Provides quantized neural network evaluation with:
//! - King-bucketed, perspective-mirrored input features
//! - Incremental accumulator updates along the search stack
//! - Output layer kernels (AVX2/SSE2/NEON/scalar) with bit-identical results
//! - Clipped ReLU activation
//!
//! Architecture: (3072 -> 512) x 2 perspectives -> 1

pub mod accumulator;
pub mod error;
pub mod eval;
pub mod features;
pub mod loader;
pub mod network;
pub mod simd;

#[cfg(test)]
mod tests;

pub use accumulator::{Accumulator, AccumulatorStack};
pub use error::{LoadDiagnostic, NetworkError};
pub use eval::{predict, Evaluator, MAX_EVAL};
pub use features::{feature_index, AccumulatorChange, FeatureList, NnUpdate, MAX_UPDATE_FEATURES};
pub use loader::{LoadedNetwork, RawNetwork, NETWORK_MAGIC};
pub use network::Network;
pub use simd::Kernel;

/// Hidden layer size (lanes per perspective accumulator)
pub const HIDDEN_SIZE: usize = 512;

/// Number of king buckets after horizontal mirroring
pub const KING_BUCKETS: usize = 4;

/// Input feature size: king buckets x 12 relative piece kinds x 64 squares
pub const INPUT_SIZE: usize = KING_BUCKETS * 12 * 64;

/// Input layer quantization precision (feature weights and biases)
pub const QA: i32 = 32;

/// Output layer quantization precision (output weights and bias)
pub const QB: i32 = 512;
