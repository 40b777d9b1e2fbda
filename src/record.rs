//! Fixed-width record formatter
//!
//! The stimulus files are consumed by an RTL testbench that slices each line
//! at hard-coded bit offsets, so every record renders as a concatenation of
//! fixed-width binary fields with no separators. A record type is an ordered
//! list of [`Field`]s built once per record, then rendered by index; widths
//! come from the resolved [`Geometry`](crate::geometry::Geometry) so the
//! formatter can never disagree with the hardware it feeds.
//!
//! | Record           | Stream               | Fields                            |
//! |------------------|----------------------|-----------------------------------|
//! | [`LayerParams`]  | `layer_params.txt`   | geometry + layer-type flags       |
//! | [`ThresholdWrite`]| `thresholds.txt`    | pos, neg, one-hot write enable    |
//! | [`WeightWrite`]  | `weights.txt`        | address, bank, encoded word bits  |
//! | [`TestParams`]   | `test_params.txt`    | aggregate counts, CSV only        |

use crate::error::{Result, TritgenError};
use crate::geometry::Geometry;
use crate::ternary::Trit;

/// How a field's values are rendered to bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    /// Plain binary, value must fit in the declared width
    Unsigned,
    /// Two's complement at the declared width
    Signed,
    /// Two-bit trit symbol, value must be in {-1, 0, 1}
    Ternary,
}

/// One named field of a record: a type tag, a per-element width, and one or
/// more values rendered back to back
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub ty: SignalType,
    pub width: usize,
    pub values: Vec<i64>,
}

impl Field {
    pub fn scalar(name: &'static str, ty: SignalType, width: usize, value: i64) -> Self {
        Self {
            name,
            ty,
            width,
            values: vec![value],
        }
    }

    pub fn vector(name: &'static str, ty: SignalType, width: usize, values: Vec<i64>) -> Self {
        Self {
            name,
            ty,
            width,
            values,
        }
    }

    /// Render every value of the field at its declared width
    ///
    /// A value outside the width's range is a hard error, never truncated:
    /// a silently clipped field would produce a stimulus the testbench
    /// accepts but the hardware was never meant to see.
    pub fn render(&self) -> Result<String> {
        let mut out = String::with_capacity(self.width * self.values.len());
        for &value in &self.values {
            match self.ty {
                SignalType::Unsigned => out.push_str(&render_unsigned(self.name, value, self.width)?),
                SignalType::Signed => out.push_str(&render_signed(self.name, value, self.width)?),
                SignalType::Ternary => {
                    let trit = Trit::from_i8(i8::try_from(value).unwrap_or(i8::MAX)).ok_or_else(
                        || {
                            TritgenError::Domain(format!(
                                "field {}: value {} is not a ternary value",
                                self.name, value
                            ))
                        },
                    )?;
                    out.push_str(trit.symbol());
                }
            }
        }
        Ok(out)
    }
}

fn render_unsigned(name: &str, value: i64, width: usize) -> Result<String> {
    let max = 1i128 << width;
    if value < 0 || (value as i128) >= max {
        return Err(TritgenError::Domain(format!(
            "field {}: value {} does not fit in {} unsigned bits",
            name, value, width
        )));
    }
    Ok(format!("{:0width$b}", value, width = width))
}

fn render_signed(name: &str, value: i64, width: usize) -> Result<String> {
    let half = 1i128 << (width - 1);
    if (value as i128) < -half || (value as i128) >= half {
        return Err(TritgenError::Domain(format!(
            "field {}: value {} does not fit in {} signed bits",
            name, value, width
        )));
    }
    // Two's complement: negative values wrap around the width's modulus.
    let encoded = if value < 0 {
        (1i128 << width) + value as i128
    } else {
        value as i128
    };
    Ok(format!("{:0width$b}", encoded, width = width))
}

/// An ordered list of fields, rendered as one stimulus line
#[derive(Debug, Clone)]
pub struct Record {
    pub fields: Vec<Field>,
}

impl Record {
    /// Concatenate all field renderings, in declaration order
    pub fn render_bits(&self) -> Result<String> {
        let mut out = String::new();
        for field in &self.fields {
            out.push_str(&field.render()?);
        }
        Ok(out)
    }

    /// Comma-separated value form for interface-level cross-checking
    pub fn csv_line(&self) -> String {
        self.fields
            .iter()
            .flat_map(|f| f.values.iter())
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Per-layer parameter record, one line per executed layer
#[derive(Debug, Clone, Default)]
pub struct LayerParams {
    pub image_width: i64,
    pub image_height: i64,
    pub k: i64,
    pub ni: i64,
    pub no: i64,
    pub stride_width: i64,
    pub stride_height: i64,
    pub padding_type: i64,
    pub pooling_enable: i64,
    pub pooling_type: i64,
    pub pooling_kernel: i64,
    pub pooling_padding_type: i64,
    pub skip_in: i64,
    pub skip_out: i64,
    pub is_tcn: i64,
    pub tcn_width: i64,
    pub tcn_width_mod_dil: i64,
    pub tcn_k: i64,
}

impl LayerParams {
    /// Field order and widths match the layer parameter FIFO's port layout
    pub fn to_record(&self, geom: &Geometry) -> Record {
        use SignalType::Unsigned;
        Record {
            fields: vec![
                Field::scalar("image_width", Unsigned, geom.image_width_width, self.image_width),
                Field::scalar("image_height", Unsigned, geom.image_height_width, self.image_height),
                Field::scalar("k", Unsigned, geom.k_width, self.k),
                Field::scalar("ni", Unsigned, geom.ni_width, self.ni),
                Field::scalar("no", Unsigned, geom.no_width, self.no),
                Field::scalar("stride_width", Unsigned, geom.image_width_width, self.stride_width),
                Field::scalar(
                    "stride_height",
                    Unsigned,
                    geom.image_height_width,
                    self.stride_height,
                ),
                Field::scalar("padding_type", Unsigned, 1, self.padding_type),
                Field::scalar("pooling_enable", Unsigned, 1, self.pooling_enable),
                Field::scalar("pooling_type", Unsigned, 1, self.pooling_type),
                Field::scalar("pooling_kernel", Unsigned, geom.k_width, self.pooling_kernel),
                Field::scalar("pooling_padding_type", Unsigned, 1, self.pooling_padding_type),
                Field::scalar("skip_in", Unsigned, 1, self.skip_in),
                Field::scalar("skip_out", Unsigned, 1, self.skip_out),
                Field::scalar("is_tcn", Unsigned, 1, self.is_tcn),
                Field::scalar("tcn_width", Unsigned, geom.tcn_width_width, self.tcn_width),
                Field::scalar(
                    "tcn_width_mod_dil",
                    Unsigned,
                    geom.tcn_width_width,
                    self.tcn_width_mod_dil,
                ),
                Field::scalar("tcn_k", Unsigned, geom.k_width, self.tcn_k),
            ],
        }
    }
}

/// One threshold FIFO write: a signed pair plus a one-hot channel enable
#[derive(Debug, Clone)]
pub struct ThresholdWrite {
    pub pos: i64,
    pub neg: i64,
    /// Output channel whose threshold register this write targets
    pub channel: usize,
}

impl ThresholdWrite {
    pub fn to_record(&self, geom: &Geometry) -> Record {
        let mut enable = vec![0i64; geom.config.no];
        if self.channel < enable.len() {
            enable[self.channel] = 1;
        }
        Record {
            fields: vec![
                Field::scalar("pos", SignalType::Signed, geom.threshold_width, self.pos),
                Field::scalar("neg", SignalType::Signed, geom.threshold_width, self.neg),
                Field::vector("we", SignalType::Unsigned, 1, enable),
            ],
        }
    }
}

/// One weight memory write: target address, bank, and the encoded word
///
/// The word is carried as individual bits so it renders exactly like the
/// memory's write-data port sees it.
#[derive(Debug, Clone)]
pub struct WeightWrite {
    pub addr: i64,
    pub bank: i64,
    pub data_bits: Vec<i64>,
}

impl WeightWrite {
    /// Split an encoded word string into per-bit field values
    pub fn from_encoded(addr: usize, bank: usize, encoded: &str) -> Result<Self> {
        let mut data_bits = Vec::with_capacity(encoded.len());
        for c in encoded.chars() {
            match c {
                '0' => data_bits.push(0),
                '1' => data_bits.push(1),
                other => {
                    return Err(TritgenError::Domain(format!(
                        "encoded word contains non-binary character '{}'",
                        other
                    )))
                }
            }
        }
        Ok(Self {
            addr: addr as i64,
            bank: bank as i64,
            data_bits,
        })
    }

    pub fn to_record(&self, geom: &Geometry) -> Record {
        Record {
            fields: vec![
                Field::scalar("addr", SignalType::Unsigned, geom.weight_address_width, self.addr),
                Field::scalar("bank", SignalType::Unsigned, geom.no_width, self.bank),
                Field::vector("wdata", SignalType::Unsigned, 1, self.data_bits.clone()),
            ],
        }
    }
}

/// Aggregate counts for the external test harness, CSV form only
#[derive(Debug, Clone)]
pub struct TestParams {
    pub num_execs: usize,
    pub image_width: usize,
    pub image_height: usize,
    pub rounded_ni: usize,
    pub num_acts: usize,
    pub num_responses: usize,
    pub num_layers: usize,
    pub num_cnn_layers: usize,
    pub num_tcn_layers: usize,
}

impl TestParams {
    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.num_execs,
            self.image_width,
            self.image_height,
            self.rounded_ni,
            self.num_acts,
            self.num_responses,
            self.num_layers % 2,
            self.num_layers,
            self.num_cnn_layers,
            self.num_tcn_layers,
        )
    }
}
