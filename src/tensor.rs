//! Flat 4D ternary tensors
//!
//! Weights are `[out_channels, in_channels, kh, kw]`, activations are
//! `[1, channels, height, width]`. Data is a row-major `Vec<Trit>` behind a
//! fixed 4-element shape; the layout translator only ever reads through
//! `get`, so the backing order is an implementation detail here.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, TritgenError};
use crate::ternary::Trit;

/// Row-major 4D tensor of trits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TritTensor {
    data: Vec<Trit>,
    shape: [usize; 4],
}

impl TritTensor {
    /// All-zero tensor
    pub fn zeros(shape: [usize; 4]) -> Self {
        Self {
            data: vec![Trit::Zero; shape.iter().product()],
            shape,
        }
    }

    /// Build from raw i8 values, rejecting anything outside {-1, 0, +1}
    pub fn from_i8(shape: [usize; 4], values: &[i8]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(TritgenError::Domain(format!(
                "tensor shape {:?} needs {} values, got {}",
                shape,
                expected,
                values.len()
            )));
        }
        let data = values
            .iter()
            .map(|&v| Trit::try_from(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { data, shape })
    }

    /// Uniform random trits, reproducible from the seed
    pub fn random(shape: [usize; 4], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| match rng.gen_range(-1i8..=1) {
                -1 => Trit::Neg,
                0 => Trit::Zero,
                _ => Trit::Pos,
            })
            .collect();
        Self { data, shape }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn offset(&self, idx: [usize; 4]) -> usize {
        debug_assert!(idx.iter().zip(&self.shape).all(|(i, s)| i < s));
        ((idx[0] * self.shape[1] + idx[1]) * self.shape[2] + idx[2]) * self.shape[3] + idx[3]
    }

    #[inline]
    pub fn get(&self, idx: [usize; 4]) -> Trit {
        self.data[self.offset(idx)]
    }

    #[inline]
    pub fn set(&mut self, idx: [usize; 4], value: Trit) {
        let offset = self.offset(idx);
        self.data[offset] = value;
    }

    /// Zero-extend to a larger shape; existing elements keep their indices
    ///
    /// Every target dimension must be at least the current one.
    pub fn zero_pad(&self, shape: [usize; 4]) -> Result<Self> {
        if self.shape.iter().zip(&shape).any(|(old, new)| new < old) {
            return Err(TritgenError::Domain(format!(
                "cannot pad shape {:?} down to {:?}",
                self.shape, shape
            )));
        }
        let mut padded = Self::zeros(shape);
        for a in 0..self.shape[0] {
            for b in 0..self.shape[1] {
                for c in 0..self.shape[2] {
                    for d in 0..self.shape[3] {
                        padded.set([a, b, c, d], self.get([a, b, c, d]));
                    }
                }
            }
        }
        Ok(padded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_indexing() {
        let mut t = TritTensor::zeros([2, 3, 2, 2]);
        assert_eq!(t.len(), 24);
        assert_eq!(t.get([1, 2, 1, 1]), Trit::Zero);
        t.set([1, 2, 1, 1], Trit::Neg);
        assert_eq!(t.get([1, 2, 1, 1]), Trit::Neg);
        assert_eq!(t.get([1, 2, 1, 0]), Trit::Zero);
    }

    #[test]
    fn test_from_i8_validates() {
        let t = TritTensor::from_i8([1, 1, 2, 2], &[1, -1, 0, 1]).unwrap();
        assert_eq!(t.get([0, 0, 0, 0]), Trit::Pos);
        assert_eq!(t.get([0, 0, 0, 1]), Trit::Neg);
        assert_eq!(t.get([0, 0, 1, 1]), Trit::Pos);

        assert!(TritTensor::from_i8([1, 1, 2, 2], &[1, -1, 0]).is_err());
        assert!(TritTensor::from_i8([1, 1, 2, 2], &[1, -1, 0, 2]).is_err());
    }

    #[test]
    fn test_zero_pad_keeps_indices() {
        let t = TritTensor::from_i8([1, 2, 1, 1], &[1, -1]).unwrap();
        let padded = t.zero_pad([2, 3, 1, 1]).unwrap();
        assert_eq!(padded.get([0, 0, 0, 0]), Trit::Pos);
        assert_eq!(padded.get([0, 1, 0, 0]), Trit::Neg);
        assert_eq!(padded.get([0, 2, 0, 0]), Trit::Zero);
        assert_eq!(padded.get([1, 0, 0, 0]), Trit::Zero);

        assert!(t.zero_pad([1, 1, 1, 1]).is_err());
    }

    #[test]
    fn test_random_is_reproducible() {
        let a = TritTensor::random([2, 4, 3, 3], 69);
        let b = TritTensor::random([2, 4, 3, 3], 69);
        let c = TritTensor::random([2, 4, 3, 3], 70);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.data.iter().any(|t| t.is_active()));
    }
}
