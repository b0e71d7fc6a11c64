//! Evaluation configuration: which network to load and which output kernel
//! to run.
//!
//! Values come from defaults, the environment (`NNUE_EVALFILE`,
//! `NNUE_KERNEL`) or engine-style named options applied one at a time.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::nnue::{Evaluator, Kernel, Network, NetworkError};

/// Environment variable naming the network file
pub const ENV_EVAL_FILE: &str = "NNUE_EVALFILE";
/// Environment variable forcing an output kernel
pub const ENV_KERNEL: &str = "NNUE_KERNEL";

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Kernel name not recognized
    UnknownKernel { value: String },
    /// Option name not recognized
    UnknownOption { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownKernel { value } => {
                write!(
                    f,
                    "unknown kernel '{value}' (expected auto, scalar, sse2, avx2 or neon)"
                )
            }
            ConfigError::UnknownOption { name } => write!(f, "unknown option '{name}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvalConfig {
    /// Network file; `None` uses the embedded network when built with one
    pub eval_file: Option<PathBuf>,
    /// Forced kernel; `None` detects the widest available
    pub kernel: Option<Kernel>,
}

fn parse_kernel(value: &str) -> Result<Option<Kernel>, ConfigError> {
    if value.trim().eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    value
        .parse::<Kernel>()
        .map(Some)
        .map_err(|value| ConfigError::UnknownKernel { value })
}

fn parse_eval_file(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("<empty>") {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

impl EvalConfig {
    /// Configuration from the process environment. Invalid values are
    /// logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from any variable source (keys as in `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EvalConfig::default();
        if let Some(file) = lookup(ENV_EVAL_FILE) {
            config.eval_file = parse_eval_file(&file);
        }
        if let Some(kernel) = lookup(ENV_KERNEL) {
            match parse_kernel(&kernel) {
                Ok(kernel) => config.kernel = kernel,
                Err(e) => warn!("{ENV_KERNEL}: {e}"),
            }
        }
        config
    }

    /// Apply one named option. Names are case-insensitive; `EvalFile` takes
    /// a path (empty or `<empty>` clears it), `NnueKernel` takes a kernel
    /// name or `auto`.
    ///
    /// # Errors
    /// `ConfigError` for an unknown name or kernel; the configuration is left
    /// unchanged.
    pub fn apply_option(&mut self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "evalfile" | "eval file" => {
                self.eval_file = value.and_then(parse_eval_file);
            }
            "nnuekernel" | "nnue kernel" | "kernel" => {
                self.kernel = parse_kernel(value.unwrap_or("auto"))?;
            }
            _ => {
                return Err(ConfigError::UnknownOption {
                    name: name.to_string(),
                })
            }
        }
        debug!("option {normalized} set: {:?}", self);
        Ok(())
    }

    /// Kernel to run: the forced one if the host supports it, else detected.
    #[must_use]
    pub fn kernel(&self) -> Kernel {
        match self.kernel {
            Some(kernel) => kernel.or_scalar(),
            None => Kernel::detect(),
        }
    }

    /// Load the configured network, or the embedded one without a file.
    ///
    /// # Errors
    /// Whatever loading the file produces, or `NetworkError::NoNetwork` with
    /// neither a file nor an embedded network.
    pub fn load_network(&self) -> Result<Arc<Network>, NetworkError> {
        match &self.eval_file {
            Some(path) => Network::load(path).map(Arc::new),
            None => Self::embedded_network(),
        }
    }

    #[cfg(feature = "embedded_nnue")]
    fn embedded_network() -> Result<Arc<Network>, NetworkError> {
        Network::embedded().map(Arc::new)
    }

    #[cfg(not(feature = "embedded_nnue"))]
    fn embedded_network() -> Result<Arc<Network>, NetworkError> {
        Err(NetworkError::NoNetwork)
    }

    /// Evaluator for `network` with this configuration's kernel.
    #[must_use]
    pub fn evaluator(&self, network: Arc<Network>) -> Evaluator {
        Evaluator::with_kernel(network, self.kernel())
    }
}
