//! Network boundary types
//!
//! The generator does not run a network. Weights, activations and threshold
//! pairs arrive from the training side; this module holds the descriptions
//! the stimulus streams need and the seeded random providers that stand in
//! for a trained model during verification runs. No convolution or
//! normalization math lives here.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, TritgenError};
use crate::geometry::Geometry;
use crate::record::LayerParams;
use crate::tensor::TritTensor;

/// One output channel's activation thresholds
///
/// The accumulator result maps to +1 above `hi`, -1 at or below `lo`, 0
/// in between. The pair is ordered by construction; `hi < lo` means the
/// upstream threshold derivation is broken and the run must stop before
/// any record is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPair {
    pub lo: i64,
    pub hi: i64,
}

impl ThresholdPair {
    pub fn new(channel: usize, lo: i64, hi: i64) -> Result<Self> {
        if hi < lo {
            return Err(TritgenError::Threshold { channel, lo, hi });
        }
        Ok(Self { lo, hi })
    }
}

/// Pooling stage attached to a convolutional layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooling {
    /// 0 selects max pooling, 1 average pooling
    pub pooling_type: u8,
    pub kernel: usize,
    pub padding_type: u8,
}

/// Layer flavor, carrying only what the parameter stream distinguishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerKind {
    Cnn { pooling: Option<Pooling> },
    Tcn { kt: usize, dilation: usize },
    Dense,
}

/// One layer of the network under verification
#[derive(Debug, Clone)]
pub struct Layer {
    pub kind: LayerKind,
    pub in_channels: usize,
    pub out_channels: usize,
    pub k: usize,
    pub stride_width: usize,
    pub stride_height: usize,
    pub padding_type: u8,
    /// Spatial width of this layer's output feature map
    pub image_width: usize,
    /// Spatial height of this layer's output feature map
    pub image_height: usize,
    /// Weight tensor, `[out_channels, in_channels, k, k]`
    pub weights: TritTensor,
    /// One ordered pair per output channel
    pub thresholds: Vec<ThresholdPair>,
}

impl Layer {
    /// Convolutional layer; output dims follow from the input dims, the
    /// stride, and the optional pooling kernel (same-padding assumed)
    pub fn cnn(
        in_channels: usize,
        out_channels: usize,
        k: usize,
        in_width: usize,
        in_height: usize,
        stride_width: usize,
        stride_height: usize,
        pooling: Option<Pooling>,
        weights: TritTensor,
        thresholds: Vec<ThresholdPair>,
    ) -> Result<Self> {
        let mut out_width = in_width.div_ceil(stride_width.max(1));
        let mut out_height = in_height.div_ceil(stride_height.max(1));
        if let Some(p) = pooling {
            if p.kernel == 0 {
                return Err(TritgenError::Config(
                    "pooling kernel must be positive".into(),
                ));
            }
            out_width /= p.kernel;
            out_height /= p.kernel;
        }
        let layer = Self {
            kind: LayerKind::Cnn { pooling },
            in_channels,
            out_channels,
            k,
            stride_width,
            stride_height,
            padding_type: 1,
            image_width: out_width,
            image_height: out_height,
            weights,
            thresholds,
        };
        layer.check()?;
        Ok(layer)
    }

    /// Temporal convolution layer over a sequence of `len` steps
    ///
    /// The accelerator folds the 1D sequence into its 2D datapath: the
    /// reported image width is the dilation and the height is the number
    /// of dilation groups plus the kernel tail.
    pub fn tcn(
        in_channels: usize,
        out_channels: usize,
        k: usize,
        kt: usize,
        dilation: usize,
        len: usize,
        weights: TritTensor,
        thresholds: Vec<ThresholdPair>,
    ) -> Result<Self> {
        if dilation == 0 || len == 0 {
            return Err(TritgenError::Config(
                "tcn dilation and sequence length must be positive".into(),
            ));
        }
        let layer = Self {
            kind: LayerKind::Tcn { kt, dilation },
            in_channels,
            out_channels,
            k,
            stride_width: 1,
            stride_height: 1,
            padding_type: 1,
            image_width: dilation,
            image_height: len.div_ceil(dilation) + (kt - 1),
            weights,
            thresholds,
        };
        layer.check()?;
        Ok(layer)
    }

    /// Final classifier layer, run as a k-by-k convolution over the last
    /// feature map
    pub fn dense(
        in_channels: usize,
        out_channels: usize,
        k: usize,
        weights: TritTensor,
        thresholds: Vec<ThresholdPair>,
    ) -> Result<Self> {
        let layer = Self {
            kind: LayerKind::Dense,
            in_channels,
            out_channels,
            k,
            stride_width: 1,
            stride_height: 1,
            padding_type: 0,
            image_width: k,
            image_height: k,
            weights,
            thresholds,
        };
        layer.check()?;
        Ok(layer)
    }

    fn check(&self) -> Result<()> {
        if self.thresholds.len() != self.out_channels {
            return Err(TritgenError::Config(format!(
                "layer has {} output channels but {} threshold pairs",
                self.out_channels,
                self.thresholds.len()
            )));
        }
        let shape = self.weights.shape();
        if shape[0] != self.out_channels || shape[1] != self.in_channels {
            return Err(TritgenError::Config(format!(
                "weight tensor channels {:?} disagree with layer {}x{}",
                &shape[..2],
                self.out_channels,
                self.in_channels
            )));
        }
        Ok(())
    }

    /// Sequence length modulo dilation, zero for non-TCN layers
    pub fn tcn_width_mod_dil(&self, len: usize) -> usize {
        match self.kind {
            LayerKind::Tcn { dilation, .. } => len % dilation,
            _ => 0,
        }
    }

    /// Build the layer parameter record, channel counts rounded to full
    /// memory words
    pub fn layer_params(&self, geom: &Geometry, tcn_len: usize) -> LayerParams {
        let (pooling_enable, pooling_type, pooling_kernel, pooling_padding_type) =
            match self.kind {
                LayerKind::Cnn {
                    pooling: Some(p), ..
                } => (1, i64::from(p.pooling_type), p.kernel as i64, i64::from(p.padding_type)),
                _ => (0, 0, 0, 0),
            };
        let (is_tcn, tcn_k) = match self.kind {
            LayerKind::Tcn { kt, .. } => (1, kt as i64),
            _ => (0, 0),
        };
        LayerParams {
            image_width: self.image_width as i64,
            image_height: self.image_height as i64,
            k: self.k as i64,
            ni: geom.round_to_word(self.in_channels) as i64,
            no: geom.round_to_word(self.out_channels) as i64,
            stride_width: self.stride_width as i64,
            stride_height: self.stride_height as i64,
            padding_type: i64::from(self.padding_type),
            pooling_enable,
            pooling_type,
            pooling_kernel,
            pooling_padding_type,
            skip_in: 0,
            skip_out: 0,
            is_tcn,
            tcn_width: geom.config.tcn_width as i64,
            tcn_width_mod_dil: self.tcn_width_mod_dil(tcn_len) as i64,
            tcn_k,
        }
    }
}

/// Seeded ternary weight tensor, `[out_channels, in_channels, k1, k2]`
pub fn random_weights(
    out_channels: usize,
    in_channels: usize,
    k1: usize,
    k2: usize,
    seed: u64,
) -> TritTensor {
    TritTensor::random([out_channels, in_channels, k1, k2], seed)
}

/// Seeded ternary input image, `[1, channels, width, height]`
pub fn random_image(channels: usize, width: usize, height: usize, seed: u64) -> TritTensor {
    TritTensor::random([1, channels, width, height], seed)
}

/// Seeded per-channel threshold pairs, ordered by construction
pub fn random_thresholds(
    channels: usize,
    magnitude: i64,
    seed: u64,
) -> Result<Vec<ThresholdPair>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pairs = Vec::with_capacity(channels);
    for channel in 0..channels {
        let a: i64 = rng.gen_range(-magnitude..=magnitude);
        let b: i64 = rng.gen_range(-magnitude..=magnitude);
        pairs.push(ThresholdPair::new(channel, a.min(b), a.max(b))?);
    }
    Ok(pairs)
}
