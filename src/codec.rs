//! Trit sequence codec
//!
//! Composes per-trit 2-bit symbols into codebook-compressed memory words.
//! `encode_sequence` produces both the physically stored bits and the raw
//! (decoded) bits; the raw form feeds the human-readable interface files,
//! the encoded form feeds the bit-exact stimulus files. `decode_bits` is
//! the verification inverse.

use crate::codebook::Codebook;
use crate::error::{Result, TritgenError};
use crate::ternary::Trit;

/// One encoded memory word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWord {
    /// Physically stored bits (codeword per raw group)
    pub encoded: String,
    /// Logical 2-bit-per-trit bits, before group padding
    pub raw: String,
}

/// Encode an ordered trit sequence into one memory word
///
/// The raw symbol string is right-padded with `0` to a multiple of the
/// codebook's group width (the hardware's 5-trit framing), then each group
/// is replaced by its codeword. A group without table coverage halts the
/// run: substituting a default would silently corrupt the vector.
pub fn encode_sequence(trits: &[Trit], codebook: &Codebook) -> Result<EncodedWord> {
    if codebook.is_empty() {
        return Err(TritgenError::Codebook(
            "cannot encode against an empty codebook".to_string(),
        ));
    }

    let raw: String = trits.iter().map(|t| t.symbol()).collect();

    let group = codebook.group_width();
    let mut padded = raw.clone();
    let rem = padded.len() % group;
    if rem != 0 {
        padded.extend(std::iter::repeat('0').take(group - rem));
    }

    let mut encoded = String::with_capacity(padded.len() / group * codebook.codeword_width());
    for start in (0..padded.len()).step_by(group) {
        encoded.push_str(codebook.encode_group(&padded[start..start + group])?);
    }

    Ok(EncodedWord { encoded, raw })
}

/// Decode stored bits back into the raw symbol string
///
/// Verification-only inverse of `encode_sequence`; the stimulus files are
/// produced without it.
pub fn decode_bits(encoded: &str, codebook: &Codebook) -> Result<String> {
    if codebook.is_empty() {
        return Err(TritgenError::Codebook(
            "cannot decode against an empty codebook".to_string(),
        ));
    }

    let width = codebook.codeword_width();
    if encoded.len() % width != 0 {
        return Err(TritgenError::Domain(format!(
            "encoded length {} is not a multiple of the codeword width {}",
            encoded.len(),
            width
        )));
    }

    let mut raw = String::with_capacity(encoded.len() / width * codebook.group_width());
    for start in (0..encoded.len()).step_by(width) {
        raw.push_str(codebook.decode_codeword(&encoded[start..start + width])?);
    }
    Ok(raw)
}

/// Split a raw symbol string back into trits
pub fn decode_raw_trits(raw: &str) -> Result<Vec<Trit>> {
    if raw.len() % 2 != 0 {
        return Err(TritgenError::Domain(format!(
            "raw bit string length {} is odd",
            raw.len()
        )));
    }
    (0..raw.len())
        .step_by(2)
        .map(|i| Trit::from_symbol(&raw[i..i + 2]))
        .collect()
}
