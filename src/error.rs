//! Error types for tritgen

use thiserror::Error;

/// Tritgen error type
///
/// Every variant is fatal: the output is a verification vector, and a
/// silently wrong vector is worse than no vector. Nothing here is retried.
#[derive(Debug, Error)]
pub enum TritgenError {
    /// Invalid memory geometry configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value outside its declared domain (ternary range, field width)
    #[error("Domain error: {0}")]
    Domain(String),

    /// Codebook build or coverage failure
    #[error("Codebook error: {0}")]
    Codebook(String),

    /// Threshold pair ordering violation (hi < lo)
    #[error("Threshold ordering violation at channel {channel}: hi {hi} < lo {lo}")]
    Threshold { channel: usize, lo: i64, hi: i64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TritgenError>;
