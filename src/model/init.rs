//! Parameter initialization.
//!
//! - Xavier/Glorot normal for embedding tables, projection and highway weights
//! - uniform `±1/sqrt(fan_in)` for convolution kernels and biases
//!
//! All draws come from one seeded generator, so a given config always
//! produces the same parameters.

use crate::error::{EmbedderError, Result};
use crate::tensor::{Tensor1, Tensor2, Tensor3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};

pub struct ParamInit {
    rng: StdRng,
}

impl ParamInit {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// [rows, cols] matrix with std = sqrt(2 / (fan_in + fan_out)),
    /// fan_in = cols, fan_out = rows.
    pub fn xavier_normal(&mut self, rows: usize, cols: usize) -> Result<Tensor2> {
        let std = (2.0 / (rows + cols) as f32).sqrt();
        let normal = Normal::new(0.0f32, std)
            .map_err(|e| EmbedderError::config(format!("xavier init for [{}, {}]: {}", rows, cols, e)))?;
        Ok(Tensor2::from_shape_simple_fn((rows, cols), || normal.sample(&mut self.rng)))
    }

    /// Kernel [out_c, in_c, width] and bias [out_c], both uniform in ±1/sqrt(in_c * width).
    pub fn conv1d(&mut self, out_c: usize, in_c: usize, width: usize) -> (Tensor3, Tensor1) {
        let bound = 1.0 / ((in_c * width) as f32).sqrt();
        let uniform = Uniform::new_inclusive(-bound, bound);
        let weight = Tensor3::from_shape_simple_fn((out_c, in_c, width), || uniform.sample(&mut self.rng));
        let bias = Tensor1::from_shape_simple_fn(out_c, || uniform.sample(&mut self.rng));
        (weight, bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_parameters() {
        let a = ParamInit::seeded(7).xavier_normal(16, 8).unwrap();
        let b = ParamInit::seeded(7).xavier_normal(16, 8).unwrap();
        assert_eq!(a, b);

        let c = ParamInit::seeded(8).xavier_normal(16, 8).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_xavier_variance() {
        let (rows, cols) = (200, 300);
        let w = ParamInit::seeded(1).xavier_normal(rows, cols).unwrap();
        let n = w.len() as f32;
        let mean = w.sum() / n;
        let var = w.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
        let expected = 2.0 / (rows + cols) as f32;

        assert!(mean.abs() < 0.01, "mean {}", mean);
        assert!((var - expected).abs() / expected < 0.1, "var {} vs {}", var, expected);
    }

    #[test]
    fn test_conv1d_bounds() {
        let (w, b) = ParamInit::seeded(3).conv1d(8, 4, 3);
        assert_eq!(w.dim(), (8, 4, 3));
        assert_eq!(b.len(), 8);

        let bound = 1.0 / (12.0f32).sqrt();
        assert!(w.iter().chain(b.iter()).all(|v| v.abs() <= bound));
        assert!(w.iter().any(|&v| v != 0.0));
    }
}
