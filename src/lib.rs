//! # Tritgen - Ternary Accelerator Stimulus Generator
//!
//! Generates bit-exact verification vectors for a ternary-weight neural
//! accelerator testbench: encoded weight/activation memory images, threshold
//! FIFO writes, per-layer parameter records, and the harness summary file.
//!
//! ## Core Components
//!
//! - **Trit**: The fundamental unit (value ∈ {-1,0,+1}, 2-bit symbol encoding)
//! - **Geometry**: All word widths, bank counts and address depths, derived
//!   once from a handful of configuration scalars
//! - **Codebook**: Wildcard decoder table expanded into a flat codeword map
//!   (5 trits stored as one 8-bit codeword)
//! - **Layout**: Tensor-to-bank translation in the hardware's fill order
//! - **Records**: Fixed-width field rendering for every stimulus stream
//!
//! ## Design Principles
//!
//! - **Exact or dead**: every out-of-range value, coverage gap, or ordering
//!   violation halts the run; a silently wrong vector is worse than none
//! - **One geometry**: every width is derived once and shared, so a field
//!   can never disagree with the payload it frames
//! - **Pure translation**: no network math; tensors and thresholds arrive
//!   from the training side (seeded random stand-ins for bring-up)
//!
//! ## Example
//!
//! ```ignore
//! use tritgen::codebook::Codebook;
//! use tritgen::geometry::{Geometry, MemoryConfig};
//! use tritgen::layout::translate_weights;
//!
//! let geom = Geometry::resolve(&MemoryConfig::cutie())?;
//! let book = Codebook::base3();
//! let words = translate_weights(&weights, &geom, &book)?;
//! ```

// Trit - the fundamental unit
pub mod ternary;
pub use ternary::Trit;

// Error types
pub mod error;
pub use error::{Result, TritgenError};

// Geometry resolver - widths, depths, bank counts
pub mod geometry;
pub use geometry::{ceil_log2, Geometry, MemoryConfig};

// Decoder codebook and the word codec built on it
pub mod codebook;
pub use codebook::Codebook;
pub mod codec;
pub use codec::{decode_bits, decode_raw_trits, encode_sequence, EncodedWord};

// Tensors and memory layout translation
pub mod tensor;
pub use tensor::TritTensor;
pub mod layout;
pub use layout::{
    embed_tcn_weights, translate_activations, translate_weights, BankWriter, LayerWrites,
};

// Record formatting
pub mod record;
pub use record::{
    Field, LayerParams, Record, SignalType, TestParams, ThresholdWrite, WeightWrite,
};

// Network boundary types and seeded providers
pub mod network;
pub use network::{
    random_image, random_thresholds, random_weights, Layer, LayerKind, Pooling, ThresholdPair,
};

// Stimulus stream writers
pub mod stimuli;
