//! Error and diagnostic types for network loading.

use std::fmt;

/// Fatal failure to obtain a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Resource is shorter than the fixed layout requires
    Truncated { expected: usize, found: usize },
    /// Reading the resource from disk failed
    Io { path: String, reason: String },
    /// No network file configured and none embedded in the binary
    NoNetwork,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Truncated { expected, found } => {
                write!(
                    f,
                    "network resource truncated: expected {expected} bytes, found {found}"
                )
            }
            NetworkError::Io { path, reason } => {
                write!(f, "failed to read network '{path}': {reason}")
            }
            NetworkError::NoNetwork => {
                write!(f, "no network file configured and no embedded network")
            }
        }
    }
}

impl std::error::Error for NetworkError {}

/// Non-fatal finding while loading a network. The load still succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadDiagnostic {
    /// The 4-byte tag is not the standard marker; likely a custom-trained net
    NonStandardMagic { found: [u8; 4] },
    /// Bytes past the end of the fixed layout were ignored
    TrailingBytes { extra: usize },
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadDiagnostic::NonStandardMagic { found } => {
                write!(
                    f,
                    "network was not built as a standard net (magic {}), use with caution",
                    String::from_utf8_lossy(found).escape_debug()
                )
            }
            LoadDiagnostic::TrailingBytes { extra } => {
                write!(f, "ignoring {extra} trailing bytes after network data")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = NetworkError::Truncated {
            expected: 100,
            found: 12,
        };
        assert_eq!(
            err.to_string(),
            "network resource truncated: expected 100 bytes, found 12"
        );
        let diag = LoadDiagnostic::NonStandardMagic { found: *b"ABCD" };
        assert!(diag.to_string().contains("ABCD"));
        assert!(LoadDiagnostic::TrailingBytes { extra: 3 }
            .to_string()
            .contains("3 trailing"));
    }
}
