//! Memory geometry resolver
//!
//! A small set of configuration scalars fully determines the accelerator's
//! physical memory shape: word widths, bank counts, address depths. They are
//! derived exactly once at startup and treated as read-only by every other
//! module; the codec, the layout translator and the record formatter all
//! consume the same `Geometry` instance so a width can never disagree with
//! the payload it frames.
//!
//! Width rule: every address/field width is the ceiling log2 of its depth,
//! with a floor of 1 bit even for depth-1 dimensions. Signed channel fields
//! reserve one extra bit.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TritgenError};

/// Configuration scalars for one accelerator instance
///
/// Loadable from a JSON file; `MemoryConfig::cutie()` gives the reference
/// configuration the RTL testbench uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum number of input channels
    pub ni: usize,
    /// Maximum number of output channels
    pub no: usize,
    /// Quadratic kernel size
    pub k: usize,
    /// Cycles to stream one full weight buffer
    pub weight_stagger: usize,
    /// Image width of the activation memory
    pub image_width: usize,
    /// Image height of the activation memory
    pub image_height: usize,
    /// TCN sequence buffer width
    pub tcn_width: usize,
    /// Depth of the per-layer parameter FIFO (bounds resident layers)
    pub layer_fifodepth: usize,
}

impl MemoryConfig {
    /// Reference configuration: 96x96 channels, 3x3 kernels, stagger 2,
    /// 64x64 activation image, TCN width 24.
    pub fn cutie() -> Self {
        Self {
            ni: 96,
            no: 96,
            k: 3,
            weight_stagger: 2,
            image_width: 64,
            image_height: 64,
            tcn_width: 24,
            layer_fifodepth: 8,
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            TritgenError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}

/// Ceiling log2 with a floor of one bit
///
/// This is the bit width needed to address `depth` entries, never less
/// than 1 so that even depth-1 dimensions occupy a wire.
pub fn ceil_log2(depth: usize) -> usize {
    if depth <= 2 {
        1
    } else {
        (usize::BITS - (depth - 1).leading_zeros()) as usize
    }
}

/// All derived widths and depths, immutable once resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// The configuration the rest was derived from
    pub config: MemoryConfig,

    /// Trits carried per memory word (ni / weight_stagger, rounded up)
    pub effective_trits_per_word: usize,
    /// Effective trits rounded up to a multiple of 5 (codebook group size)
    pub physical_trits_per_word: usize,
    /// Stored bits per word: each 5-trit (10-bit) group compresses to 8 bits
    pub physical_bits_per_word: usize,
    /// Raw bits of padding carried by the physical word
    pub excess_bits: usize,
    /// Physical bits minus padding correction
    pub effective_word_width: usize,
    /// One decoder per stored byte
    pub num_decoders: usize,

    /// Number of physical SRAM banks (k * weight_stagger)
    pub num_banks: usize,
    /// Total trits held by the activation memory
    pub total_trits: usize,
    /// Trits per activation bank
    pub trits_per_bank: usize,
    /// Words per activation bank
    pub bank_depth: usize,
    /// Total addressable words (num_banks * bank_depth)
    pub num_addresses: usize,

    /// Width of a within-bank address
    pub bank_address_width: usize,
    /// Width of a flat memory address
    pub mem_address_width: usize,
    /// Width of the bank-select left shift
    pub left_shift_width: usize,
    /// Width of the stagger split counter (one spare bit)
    pub split_width: usize,
    /// Input channel field width (signed reserve: one extra bit)
    pub ni_width: usize,
    /// Output channel field width
    pub no_width: usize,
    /// Image width field width (one extra bit)
    pub image_width_width: usize,
    /// Image height field width (one extra bit)
    pub image_height_width: usize,
    /// Flat pixel address width (one extra bit)
    pub matrix_address_width: usize,
    /// TCN sequence index width
    pub tcn_width_width: usize,
    /// Kernel index width
    pub k_width: usize,

    /// Words per weight-memory bank across all resident layers
    pub weight_bank_depth: usize,
    /// Width of a weight-memory address
    pub weight_address_width: usize,
    /// Threshold field width: the accumulator spans +-(k*k*ni), plus sign
    pub threshold_width: usize,
}

impl Geometry {
    /// Derive the full geometry from configuration scalars
    ///
    /// Rejects any zero scalar before deriving anything. `ni` not divisible
    /// by `weight_stagger` is not an error: the trits-per-word ratio rounds
    /// up, and that rounded value is used consistently everywhere.
    pub fn resolve(config: &MemoryConfig) -> Result<Self> {
        for (name, value) in [
            ("ni", config.ni),
            ("no", config.no),
            ("k", config.k),
            ("weight_stagger", config.weight_stagger),
            ("image_width", config.image_width),
            ("image_height", config.image_height),
            ("tcn_width", config.tcn_width),
            ("layer_fifodepth", config.layer_fifodepth),
        ] {
            if value == 0 {
                return Err(TritgenError::Config(format!(
                    "geometry scalar {} must be positive",
                    name
                )));
            }
        }

        let effective_trits_per_word = config.ni.div_ceil(config.weight_stagger);
        let physical_trits_per_word = effective_trits_per_word.div_ceil(5) * 5;
        let physical_bits_per_word = physical_trits_per_word / 5 * 8;
        let excess_bits = (physical_trits_per_word - effective_trits_per_word) * 2;
        let effective_word_width = physical_bits_per_word - excess_bits;
        let num_decoders = physical_bits_per_word / 8;

        let num_banks = config.k * config.weight_stagger;
        let total_trits = config.image_width * config.image_height * config.ni;
        let trits_per_bank = total_trits.div_ceil(num_banks);
        let bank_depth = trits_per_bank.div_ceil(effective_trits_per_word);
        let num_addresses = num_banks * bank_depth;
        let weight_bank_depth =
            config.layer_fifodepth * config.weight_stagger * config.k * config.k;

        Ok(Self {
            config: config.clone(),
            effective_trits_per_word,
            physical_trits_per_word,
            physical_bits_per_word,
            excess_bits,
            effective_word_width,
            num_decoders,
            num_banks,
            total_trits,
            trits_per_bank,
            bank_depth,
            num_addresses,
            bank_address_width: ceil_log2(bank_depth),
            mem_address_width: ceil_log2(num_addresses),
            left_shift_width: ceil_log2(num_banks),
            split_width: ceil_log2(config.weight_stagger) + 1,
            ni_width: ceil_log2(config.ni) + 1,
            no_width: ceil_log2(config.no),
            image_width_width: ceil_log2(config.image_width) + 1,
            image_height_width: ceil_log2(config.image_height) + 1,
            matrix_address_width: ceil_log2(config.image_width * config.image_height) + 1,
            tcn_width_width: ceil_log2(config.tcn_width),
            k_width: ceil_log2(config.k),
            weight_bank_depth,
            weight_address_width: ceil_log2(weight_bank_depth),
            threshold_width: ceil_log2(config.k * config.k * config.ni) + 1,
        })
    }

    /// Round a channel count up to the next multiple of the word capacity
    pub fn round_to_word(&self, channels: usize) -> usize {
        channels.div_ceil(self.effective_trits_per_word) * self.effective_trits_per_word
    }

    /// Words needed to hold `channels` channels of one pixel/kernel position
    pub fn words_per_position(&self, channels: usize) -> usize {
        channels.div_ceil(self.effective_trits_per_word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_log2_floor_of_one() {
        assert_eq!(ceil_log2(1), 1);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(96), 7);
        assert_eq!(ceil_log2(1024), 10);
        assert_eq!(ceil_log2(1025), 11);
    }

    #[test]
    fn test_cutie_geometry() {
        let geom = Geometry::resolve(&MemoryConfig::cutie()).unwrap();
        assert_eq!(geom.effective_trits_per_word, 48);
        assert_eq!(geom.physical_trits_per_word, 50);
        assert_eq!(geom.physical_bits_per_word, 80);
        assert_eq!(geom.excess_bits, 4);
        assert_eq!(geom.effective_word_width, 76);
        assert_eq!(geom.num_decoders, 10);
        assert_eq!(geom.num_banks, 6);
        assert_eq!(geom.total_trits, 64 * 64 * 96);
        assert_eq!(geom.trits_per_bank, 65536);
        assert_eq!(geom.bank_depth, 1366);
        assert_eq!(geom.num_addresses, 8196);
        assert_eq!(geom.ni_width, 8);
        assert_eq!(geom.no_width, 7);
        assert_eq!(geom.k_width, 2);
        assert_eq!(geom.split_width, 2);
        assert_eq!(geom.weight_bank_depth, 144);
        assert_eq!(geom.weight_address_width, 8);
        assert_eq!(geom.threshold_width, 11);
    }

    #[test]
    fn test_word_width_invariant() {
        // Width invariant across a spread of configurations.
        for ni in [1, 3, 5, 6, 8, 16, 48, 96, 128] {
            for stagger in [1, 2, 3, 4] {
                let config = MemoryConfig {
                    ni,
                    no: ni,
                    k: 3,
                    weight_stagger: stagger,
                    image_width: 8,
                    image_height: 8,
                    tcn_width: 4,
                    layer_fifodepth: 8,
                };
                let geom = Geometry::resolve(&config).unwrap();
                assert_eq!(geom.physical_bits_per_word % 8, 0, "ni={} st={}", ni, stagger);
                assert!(geom.effective_word_width <= geom.physical_bits_per_word);
                assert!(geom.effective_trits_per_word * stagger >= ni);
            }
        }
    }

    #[test]
    fn test_zero_scalar_rejected() {
        let mut config = MemoryConfig::cutie();
        config.weight_stagger = 0;
        let err = Geometry::resolve(&config).unwrap_err();
        assert!(matches!(err, TritgenError::Config(_)));

        let mut config = MemoryConfig::cutie();
        config.k = 0;
        assert!(Geometry::resolve(&config).is_err());
    }

    #[test]
    fn test_non_divisible_stagger_rounds_up() {
        let config = MemoryConfig {
            ni: 7,
            no: 7,
            k: 3,
            weight_stagger: 2,
            image_width: 4,
            image_height: 4,
            tcn_width: 2,
            layer_fifodepth: 8,
        };
        let geom = Geometry::resolve(&config).unwrap();
        assert_eq!(geom.effective_trits_per_word, 4);
        assert_eq!(geom.physical_trits_per_word, 5);
        assert_eq!(geom.physical_bits_per_word, 8);
    }

    #[test]
    fn test_round_to_word() {
        let geom = Geometry::resolve(&MemoryConfig {
            ni: 6,
            no: 6,
            k: 2,
            weight_stagger: 2,
            image_width: 4,
            image_height: 4,
            tcn_width: 2,
            layer_fifodepth: 8,
        })
        .unwrap();
        assert_eq!(geom.effective_trits_per_word, 3);
        assert_eq!(geom.round_to_word(1), 3);
        assert_eq!(geom.round_to_word(3), 3);
        assert_eq!(geom.round_to_word(4), 6);
        assert_eq!(geom.words_per_position(7), 3);
    }

    #[test]
    fn test_config_json_roundtrip() {
        use std::io::Write;

        let config = MemoryConfig::cutie();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = MemoryConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_bad_json_is_config_error() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"ni\": }}").unwrap();
        let err = MemoryConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, TritgenError::Config(_)));
    }
}
