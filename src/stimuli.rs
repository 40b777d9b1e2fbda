//! Stimulus stream writers
//!
//! Serializes the translated tensors and records into the file set the RTL
//! testbench loads. Every writer takes plain `io::Write` sinks so tests can
//! drive them against in-memory buffers; the CLI opens the actual files.
//!
//! | Stream            | Bit-exact file      | Interface file           |
//! |-------------------|---------------------|--------------------------|
//! | weight writes     | `weights.txt`       | `weights_intf.txt`       |
//! | thresholds        | `thresholds.txt`    | `thresholds_intf.txt`    |
//! | input activations | `activations.txt`   | `activations_intf.txt`   |
//! | responses         | `responses.txt`     | `responses_intf.txt`     |
//! | layer parameters  | `layer_params.txt`  | `layer_params_intf.txt`  |
//! | summary           | `test_params.txt`   |                          |
//!
//! Bit-exact lines end with a space before the newline; the testbench's
//! line parser expects the trailing separator.

use std::io::Write;

use crate::codebook::Codebook;
use crate::codec::EncodedWord;
use crate::error::{Result, TritgenError};
use crate::geometry::Geometry;
use crate::layout::{self, BankWriter, LayerWrites};
use crate::network::{Layer, LayerKind};
use crate::record::{TestParams, ThresholdWrite, WeightWrite};
use crate::tensor::TritTensor;

/// Render raw word bits as comma-joined 32-bit hex words
///
/// The raw string is right-padded with zeros to a 32-bit multiple so the
/// last chunk keeps its alignment.
fn hex_words(raw: &str) -> Result<String> {
    let mut padded = raw.to_string();
    let rem = padded.len() % 32;
    if rem != 0 {
        padded.extend(std::iter::repeat('0').take(32 - rem));
    }
    let mut parts = Vec::with_capacity(padded.len() / 32);
    for start in (0..padded.len()).step_by(32) {
        let value = u32::from_str_radix(&padded[start..start + 32], 2).map_err(|e| {
            TritgenError::Domain(format!("raw word is not a binary string: {}", e))
        })?;
        parts.push(format!("{:08x}", value));
    }
    Ok(parts.join(","))
}

/// Square-kernel weight words for one layer, TCN taps embedded first
fn layer_weight_words(
    layer: &Layer,
    geom: &Geometry,
    codebook: &Codebook,
) -> Result<Vec<EncodedWord>> {
    match layer.kind {
        LayerKind::Tcn { .. } => {
            let square = layout::embed_tcn_weights(&layer.weights, layer.k)?;
            layout::translate_weights(&square, geom, codebook)
        }
        _ => layout::translate_weights(&layer.weights, geom, codebook),
    }
}

/// Write the weight memory stimulus streams for every layer in order
///
/// Only the words of real output channels are written; the zero words the
/// translator adds for out-channel padding never reach the memory.
pub fn write_weights<W: Write, V: Write>(
    sink: &mut W,
    intf: &mut V,
    geom: &Geometry,
    codebook: &Codebook,
    layers: &[Layer],
) -> Result<()> {
    let mut writer = BankWriter::new(geom);
    for (index, layer) in layers.iter().enumerate() {
        let words = layer_weight_words(layer, geom, codebook)?;
        let shape = LayerWrites {
            out_channels: layer.out_channels,
            in_channels: layer.in_channels,
        };
        let count = writer.layer_write_count(&shape);
        if words.len() < count {
            return Err(TritgenError::Domain(format!(
                "layer {}: translator produced {} words, bank writer expects {}",
                index,
                words.len(),
                count
            )));
        }
        for word in &words[..count] {
            let (bank, addr) = writer.next_write(&shape)?;
            let record = WeightWrite::from_encoded(addr, bank, &word.encoded)?.to_record(geom);
            writeln!(sink, "{} ", record.render_bits()?)?;
            writeln!(intf, "{},{},{}", addr, bank, hex_words(&word.raw)?)?;
        }
        writer.advance_layer();
    }
    Ok(())
}

/// Write the threshold FIFO streams, one record per output channel per layer
pub fn write_thresholds<W: Write, V: Write>(
    sink: &mut W,
    intf: &mut V,
    geom: &Geometry,
    layers: &[Layer],
) -> Result<()> {
    for layer in layers {
        for (channel, pair) in layer.thresholds.iter().enumerate() {
            let write = ThresholdWrite {
                pos: pair.hi,
                neg: pair.lo,
                channel,
            };
            writeln!(sink, "{} ", write.to_record(geom).render_bits()?)?;
            writeln!(intf, "{},{}", pair.hi, pair.lo)?;
        }
    }
    Ok(())
}

/// Write an activation or response tensor as `(address, encoded word)` lines
///
/// Addresses are sequential; the interface file carries the raw bits as
/// hex words next to the address.
pub fn write_activations<W: Write, V: Write>(
    sink: &mut W,
    intf: &mut V,
    geom: &Geometry,
    codebook: &Codebook,
    image: &TritTensor,
) -> Result<usize> {
    let words = layout::translate_activations(image, geom, codebook)?;
    for (addr, word) in words.iter().enumerate() {
        writeln!(sink, "{} ", word.encoded)?;
        writeln!(intf, "{},{}", addr, hex_words(&word.raw)?)?;
    }
    Ok(words.len())
}

/// Write the per-layer parameter streams
pub fn write_layer_params<W: Write, V: Write>(
    sink: &mut W,
    intf: &mut V,
    geom: &Geometry,
    layers: &[Layer],
    tcn_len: usize,
) -> Result<()> {
    for layer in layers {
        let record = layer.layer_params(geom, tcn_len).to_record(geom);
        writeln!(sink, "{} ", record.render_bits()?)?;
        writeln!(intf, "{}", record.csv_line())?;
    }
    Ok(())
}

/// Write the aggregate summary consumed by the external test harness
pub fn write_test_params<W: Write>(sink: &mut W, params: &TestParams) -> Result<()> {
    writeln!(sink, "{}", params.csv_line())?;
    Ok(())
}
