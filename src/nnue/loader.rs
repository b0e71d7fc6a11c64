//! Binary network resource: parsing, encoding and float-to-fixed conversion.
//!
//! Layout, all little-endian:
//!
//! | field            | type | count                      |
//! |------------------|------|----------------------------|
//! | magic            | u8   | 4                          |
//! | hash             | u64  | 1                          |
//! | feature weights  | f32  | `INPUT_SIZE * HIDDEN_SIZE` |
//! | feature bias     | f32  | `HIDDEN_SIZE`              |
//! | output weights   | f32  | `2 * HIDDEN_SIZE`          |
//! | output bias      | f32  | 1                          |
//!
//! The whole length is validated before any field is read.

use std::path::Path;

use log::{info, warn};

use super::error::{LoadDiagnostic, NetworkError};
use super::network::{quantize, quantize_i32, Network};
use super::{HIDDEN_SIZE, INPUT_SIZE, QA, QB};

/// Marker of a standard network resource
pub const NETWORK_MAGIC: [u8; 4] = *b"BRKR";

const HEADER_LEN: usize = 4 + 8;
const PARAM_COUNT: usize = INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + 2 * HIDDEN_SIZE + 1;

/// Exact byte length of a well-formed resource.
#[must_use]
pub const fn expected_len() -> usize {
    HEADER_LEN + PARAM_COUNT * 4
}

/// A parsed network with everything noticed while parsing it.
#[derive(Debug)]
pub struct LoadedNetwork {
    pub network: Network,
    pub diagnostics: Vec<LoadDiagnostic>,
}

/// Parse a resource without logging.
///
/// # Errors
/// `NetworkError::Truncated` when `bytes` is shorter than `expected_len()`.
pub fn parse(bytes: &[u8]) -> Result<LoadedNetwork, NetworkError> {
    let expected = expected_len();
    if bytes.len() < expected {
        return Err(NetworkError::Truncated {
            expected,
            found: bytes.len(),
        });
    }

    let mut diagnostics = Vec::new();
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[..4]);
    if magic != NETWORK_MAGIC {
        diagnostics.push(LoadDiagnostic::NonStandardMagic { found: magic });
    }
    if bytes.len() > expected {
        diagnostics.push(LoadDiagnostic::TrailingBytes {
            extra: bytes.len() - expected,
        });
    }

    let mut hash = [0u8; 8];
    hash.copy_from_slice(&bytes[4..HEADER_LEN]);
    let values = bytes[HEADER_LEN..expected]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));

    Ok(LoadedNetwork {
        network: build(u64::from_le_bytes(hash), values),
        diagnostics,
    })
}

/// Quantize a stream of float parameters, in resource order, into a network.
/// The stream must hold exactly `PARAM_COUNT` values.
fn build(hash: u64, mut values: impl Iterator<Item = f32>) -> Network {
    let mut network = Network::zeroed(hash);
    let mut next = || values.next().unwrap_or(0.0);

    for row in network.feature_weights.iter_mut() {
        for w in row.iter_mut() {
            *w = quantize(next(), QA);
        }
    }
    for b in network.feature_bias.iter_mut() {
        *b = quantize(next(), QA);
    }
    for half in network.output_weights.iter_mut() {
        for w in half.iter_mut() {
            *w = quantize(next(), QB);
        }
    }
    network.output_bias = quantize_i32(next(), QB);
    network
}

impl Network {
    /// Parse a resource, logging each diagnostic as a warning.
    ///
    /// # Errors
    /// See [`parse`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NetworkError> {
        let LoadedNetwork {
            network,
            diagnostics,
        } = parse(bytes)?;
        for diagnostic in &diagnostics {
            warn!("{diagnostic}");
        }
        info!("loaded network {:016x}", network.hash());
        Ok(network)
    }

    /// Read and parse a resource file.
    ///
    /// # Errors
    /// `NetworkError::Io` if the file cannot be read, otherwise as [`parse`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| NetworkError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }
}

/// Network compiled into the binary from `NNUE_EVALFILE`
#[cfg(feature = "embedded_nnue")]
pub static EMBEDDED_NETWORK: &[u8] = include_bytes!(env!("NNUE_EVALFILE"));

#[cfg(feature = "embedded_nnue")]
impl Network {
    /// Parse the embedded network.
    ///
    /// # Errors
    /// As [`parse`]; an embedded resource is only checked at runtime.
    pub fn embedded() -> Result<Self, NetworkError> {
        Self::from_bytes(EMBEDDED_NETWORK)
    }
}

/// Float parameters in resource order, before quantization.
#[derive(Clone, Debug, PartialEq)]
pub struct RawNetwork {
    /// `INPUT_SIZE * HIDDEN_SIZE`, row-major by feature
    pub feature_weights: Vec<f32>,
    /// `HIDDEN_SIZE`
    pub feature_bias: Vec<f32>,
    /// `2 * HIDDEN_SIZE`: own half then opponent half
    pub output_weights: Vec<f32>,
    pub output_bias: f32,
}

impl RawNetwork {
    #[must_use]
    pub fn zeroed() -> Self {
        RawNetwork {
            feature_weights: vec![0.0; INPUT_SIZE * HIDDEN_SIZE],
            feature_bias: vec![0.0; HIDDEN_SIZE],
            output_weights: vec![0.0; 2 * HIDDEN_SIZE],
            output_bias: 0.0,
        }
    }

    /// Float weight of `feature` at hidden lane `lane`
    #[inline]
    pub fn feature_weight_mut(&mut self, feature: usize, lane: usize) -> &mut f32 {
        &mut self.feature_weights[feature * HIDDEN_SIZE + lane]
    }

    fn assert_shape(&self) {
        assert_eq!(self.feature_weights.len(), INPUT_SIZE * HIDDEN_SIZE, "feature weights");
        assert_eq!(self.feature_bias.len(), HIDDEN_SIZE, "feature bias");
        assert_eq!(self.output_weights.len(), 2 * HIDDEN_SIZE, "output weights");
    }

    fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.feature_weights
            .iter()
            .chain(&self.feature_bias)
            .chain(&self.output_weights)
            .chain(std::iter::once(&self.output_bias))
            .copied()
    }

    /// Encode in the resource format with the standard magic.
    ///
    /// # Panics
    /// Panics if a parameter vector has the wrong length.
    #[must_use]
    pub fn to_bytes(&self, hash: u64) -> Vec<u8> {
        self.assert_shape();
        let mut out = Vec::with_capacity(expected_len());
        out.extend_from_slice(&NETWORK_MAGIC);
        out.extend_from_slice(&hash.to_le_bytes());
        for v in self.values() {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Quantize straight into a network, identical to encoding and parsing.
    ///
    /// # Panics
    /// Panics if a parameter vector has the wrong length.
    #[must_use]
    pub fn quantize(&self, hash: u64) -> Network {
        self.assert_shape();
        build(hash, self.values())
    }
}
