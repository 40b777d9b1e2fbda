//! Tensor-to-memory layout translation
//!
//! Maps weight and activation tensors into the ordered word streams the
//! accelerator's banked SRAMs expect. The nested iteration orders here are
//! hardware contracts: reordering any loop produces a layout mismatch even
//! though every individual word still encodes correctly. Tests pin the
//! exact orders.
//!
//! Weight words: out channel, then in-channel group, then kernel column,
//! then kernel row. Activation words: row-major over (height, width), then
//! channel groups within the pixel.

use crate::codebook::Codebook;
use crate::codec::{encode_sequence, EncodedWord};
use crate::error::{Result, TritgenError};
use crate::geometry::Geometry;
use crate::tensor::TritTensor;
use crate::ternary::Trit;

/// Translate a `[out_ch, in_ch, kh, kw]` weight tensor into memory words
///
/// Both channel dimensions are zero-padded up to the next multiple of the
/// word capacity first; the output therefore holds
/// `padded_out * padded_in/etw * kh * kw` words.
pub fn translate_weights(
    weights: &TritTensor,
    geom: &Geometry,
    codebook: &Codebook,
) -> Result<Vec<EncodedWord>> {
    let [out_ch, in_ch, kh, kw] = weights.shape();
    let etw = geom.effective_trits_per_word;

    let padded = weights.zero_pad([geom.round_to_word(out_ch), geom.round_to_word(in_ch), kh, kw])?;
    let [p_out, p_in, _, _] = padded.shape();
    let in_groups = p_in / etw;

    let mut words = Vec::with_capacity(p_out * in_groups * kh * kw);
    let mut word = vec![Trit::Zero; etw];
    for o in 0..p_out {
        for n in 0..in_groups {
            for m in 0..kw {
                for j in 0..kh {
                    for (q, slot) in word.iter_mut().enumerate() {
                        *slot = padded.get([o, n * etw + q, j, m]);
                    }
                    words.push(encode_sequence(&word, codebook)?);
                }
            }
        }
    }
    Ok(words)
}

/// Translate a `[1, channels, height, width]` activation tensor into
/// memory words
pub fn translate_activations(
    image: &TritTensor,
    geom: &Geometry,
    codebook: &Codebook,
) -> Result<Vec<EncodedWord>> {
    let [batch, channels, height, width] = image.shape();
    if batch != 1 {
        return Err(TritgenError::Domain(format!(
            "activation tensor must have batch 1, got {}",
            batch
        )));
    }
    let etw = geom.effective_trits_per_word;

    let padded = image.zero_pad([1, geom.round_to_word(channels), height, width])?;
    let groups = padded.shape()[1] / etw;

    let mut words = Vec::with_capacity(height * width * groups);
    let mut word = vec![Trit::Zero; etw];
    for n in 0..height {
        for m in 0..width {
            for j in 0..groups {
                for (i, slot) in word.iter_mut().enumerate() {
                    *slot = padded.get([0, j * etw + i, n, m]);
                }
                words.push(encode_sequence(&word, codebook)?);
            }
        }
    }
    Ok(words)
}

/// Embed a `[out_ch, in_ch, kt, 1]` TCN kernel into a square `k x k` kernel
///
/// The 1-D taps land in rows `0..kt` of the center column `(k-1)/2`; the
/// rest stays zero. The result feeds `translate_weights` unchanged.
pub fn embed_tcn_weights(weights: &TritTensor, k: usize) -> Result<TritTensor> {
    let [out_ch, in_ch, kt, trailing] = weights.shape();
    if trailing != 1 {
        return Err(TritgenError::Domain(format!(
            "TCN kernel must be [out, in, kt, 1], got trailing dim {}",
            trailing
        )));
    }
    if kt > k {
        return Err(TritgenError::Domain(format!(
            "TCN kernel size {} exceeds square kernel size {}",
            kt, k
        )));
    }

    let center = (k - 1) / 2;
    let mut square = TritTensor::zeros([out_ch, in_ch, k, k]);
    for o in 0..out_ch {
        for c in 0..in_ch {
            for t in 0..kt {
                square.set([o, c, t, center], weights.get([o, c, t, 0]));
            }
        }
    }
    Ok(square)
}

/// Per-layer shape inputs for bank/address assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerWrites {
    /// Output channels of the layer (one weight bank each)
    pub out_channels: usize,
    /// Input channels of the layer before padding
    pub in_channels: usize,
}

/// Bank/address generator for weight-memory writes
///
/// Banks fill round-robin: each output channel owns one bank, and a bank
/// receives one full kernel volume (`write_depth` words) before the next
/// bank starts. Addresses grow monotonically per bank and reset to the
/// layer base offset `layer_index * k * k * weight_stagger` on a layer
/// boundary, so layers share physical banks without overwriting each
/// other.
#[derive(Debug, Clone)]
pub struct BankWriter {
    counter: usize,
    depths: Vec<usize>,
    layer_index: usize,
    layer_stride: usize,
    kernel_area: usize,
    etw: usize,
}

impl BankWriter {
    pub fn new(geom: &Geometry) -> Self {
        Self {
            counter: 0,
            depths: vec![0; geom.config.no],
            layer_index: 0,
            layer_stride: geom.config.k * geom.config.k * geom.config.weight_stagger,
            kernel_area: geom.config.k * geom.config.k,
            etw: geom.effective_trits_per_word,
        }
    }

    /// Words one bank absorbs for one layer
    pub fn write_depth(&self, layer: &LayerWrites) -> usize {
        self.kernel_area * layer.in_channels.div_ceil(self.etw)
    }

    /// Total weight-memory writes for one layer
    pub fn layer_write_count(&self, layer: &LayerWrites) -> usize {
        self.write_depth(layer) * layer.out_channels
    }

    /// Current layer index
    pub fn layer_index(&self) -> usize {
        self.layer_index
    }

    /// Assign the next (bank, address) pair within the current layer
    pub fn next_write(&mut self, layer: &LayerWrites) -> Result<(usize, usize)> {
        if layer.out_channels > self.depths.len() {
            return Err(TritgenError::Domain(format!(
                "layer has {} output channels but the memory has {} banks",
                layer.out_channels,
                self.depths.len()
            )));
        }
        let bank = (self.counter / self.write_depth(layer)) % layer.out_channels;
        let address = self.depths[bank];
        self.depths[bank] += 1;
        self.counter += 1;
        Ok((bank, address))
    }

    /// Move to the next layer: zero the word counter and park every bank at
    /// the new layer's base offset
    pub fn advance_layer(&mut self) {
        self.layer_index += 1;
        self.counter = 0;
        let base = self.layer_index * self.layer_stride;
        for depth in &mut self.depths {
            *depth = base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MemoryConfig;

    fn geom_etw3() -> Geometry {
        // ni=6, stagger=2 -> 3 trits per word
        Geometry::resolve(&MemoryConfig {
            ni: 6,
            no: 6,
            k: 2,
            weight_stagger: 2,
            image_width: 4,
            image_height: 4,
            tcn_width: 2,
            layer_fifodepth: 8,
        })
        .unwrap()
    }

    #[test]
    fn test_weight_word_count_and_order() {
        let geom = geom_etw3();
        let book = Codebook::base3();

        // [2,3,2,2] with etw=3: no padding, 2*1*2*2 = 8 words in
        // (out_ch, in_group, col, row) order.
        let mut weights = TritTensor::zeros([2, 3, 2, 2]);
        weights.set([1, 0, 0, 1], Trit::Pos); // o=1, q=0, row j=0, col m=1

        let words = translate_weights(&weights, &geom, &book).unwrap();
        assert_eq!(words.len(), 8);

        // Word index = ((o * 1 + 0) * 2 + m) * 2 + j.
        let expected_index = ((1 * 2) + 1) * 2;
        for (i, word) in words.iter().enumerate() {
            if i == expected_index {
                assert_eq!(word.raw, "010000");
            } else {
                assert_eq!(word.raw, "000000", "word {}", i);
            }
        }
    }

    #[test]
    fn test_weight_order_full_sweep() {
        let geom = geom_etw3();
        let book = Codebook::base3();

        // Every (o, m, j) position gets a distinct channel pattern so any
        // loop reorder shows up as a mismatched word.
        let mut weights = TritTensor::zeros([2, 3, 2, 2]);
        for o in 0..2 {
            for j in 0..2 {
                for m in 0..2 {
                    // Mark channel q = (o + j + m) % 3 of this position.
                    weights.set([o, (o + j + m) % 3, j, m], Trit::Neg);
                }
            }
        }
        let words = translate_weights(&weights, &geom, &book).unwrap();
        for o in 0..2 {
            for m in 0..2 {
                for j in 0..2 {
                    let idx = (o * 2 + m) * 2 + j;
                    let q = (o + j + m) % 3;
                    let mut expected = String::from("000000");
                    expected.replace_range(q * 2..q * 2 + 2, "11");
                    assert_eq!(words[idx].raw, expected, "o={} m={} j={}", o, m, j);
                }
            }
        }
    }

    #[test]
    fn test_weight_channel_padding() {
        let geom = geom_etw3();
        let book = Codebook::base3();

        // 2 out / 4 in channels pad to 3 / 6: 3 * 2 * 2 * 2 = 24 words.
        let weights = TritTensor::random([2, 4, 2, 2], 7);
        let words = translate_weights(&weights, &geom, &book).unwrap();
        assert_eq!(words.len(), 24);
        // Padded out-channel words are all zero.
        for word in &words[16..] {
            assert_eq!(word.raw, "000000");
        }
    }

    #[test]
    fn test_activation_order() {
        let geom = geom_etw3();
        let book = Codebook::base3();

        // [1,3,2,2]: one word per pixel, (height, width) row-major.
        let mut image = TritTensor::zeros([1, 3, 2, 2]);
        image.set([0, 1, 1, 0], Trit::Pos); // channel 1, row n=1, col m=0

        let words = translate_activations(&image, &geom, &book).unwrap();
        assert_eq!(words.len(), 4);
        assert_eq!(words[2].raw, "000100"); // index = n * width + m = 2
        for (i, word) in words.iter().enumerate() {
            if i != 2 {
                assert_eq!(word.raw, "000000");
            }
        }
    }

    #[test]
    fn test_activation_channel_groups() {
        let geom = geom_etw3();
        let book = Codebook::base3();

        // 7 channels pad to 9 -> 3 words per pixel.
        let image = TritTensor::random([1, 7, 2, 2], 11);
        let words = translate_activations(&image, &geom, &book).unwrap();
        assert_eq!(words.len(), 2 * 2 * 3);
    }

    #[test]
    fn test_activation_batch_must_be_one() {
        let geom = geom_etw3();
        let book = Codebook::base3();
        let image = TritTensor::zeros([2, 3, 2, 2]);
        assert!(translate_activations(&image, &geom, &book).is_err());
    }

    #[test]
    fn test_tcn_embedding() {
        let mut taps = TritTensor::zeros([1, 2, 2, 1]);
        taps.set([0, 0, 0, 0], Trit::Pos);
        taps.set([0, 1, 1, 0], Trit::Neg);

        let square = embed_tcn_weights(&taps, 3).unwrap();
        assert_eq!(square.shape(), [1, 2, 3, 3]);
        // Taps sit in rows 0..kt of the center column.
        assert_eq!(square.get([0, 0, 0, 1]), Trit::Pos);
        assert_eq!(square.get([0, 1, 1, 1]), Trit::Neg);
        assert_eq!(square.get([0, 0, 0, 0]), Trit::Zero);
        assert_eq!(square.get([0, 0, 2, 1]), Trit::Zero);

        assert!(embed_tcn_weights(&taps, 1).is_err());
    }

    #[test]
    fn test_bank_cycling_covers_every_pair_once() {
        let geom = geom_etw3();
        let mut writer = BankWriter::new(&geom);
        let layer = LayerWrites {
            out_channels: 2,
            in_channels: 6,
        };
        // write_depth = k*k * ceil(6/3) = 4 * 2 = 8.
        let depth = writer.write_depth(&layer);
        assert_eq!(depth, 8);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..writer.layer_write_count(&layer) {
            let pair = writer.next_write(&layer).unwrap();
            assert!(seen.insert(pair), "duplicate {:?}", pair);
        }
        for bank in 0..2 {
            for addr in 0..depth {
                assert!(seen.contains(&(bank, addr)), "missing ({}, {})", bank, addr);
            }
        }
    }

    #[test]
    fn test_layer_advance_resets_to_base_offset() {
        let geom = geom_etw3();
        let mut writer = BankWriter::new(&geom);
        let layer = LayerWrites {
            out_channels: 3,
            in_channels: 3,
        };
        for _ in 0..6 {
            writer.next_write(&layer).unwrap();
        }

        writer.advance_layer();
        assert_eq!(writer.layer_index(), 1);
        // Base offset = layer_index * k * k * weight_stagger = 8.
        let (bank, addr) = writer.next_write(&layer).unwrap();
        assert_eq!(bank, 0);
        assert_eq!(addr, 8);
    }

    #[test]
    fn test_too_many_output_channels_rejected() {
        let geom = geom_etw3();
        let mut writer = BankWriter::new(&geom);
        let layer = LayerWrites {
            out_channels: 7, // memory has no = 6 banks
            in_channels: 3,
        };
        assert!(writer.next_write(&layer).is_err());
    }
}
