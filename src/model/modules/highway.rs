use super::Linear;
use crate::error::{EmbedderError, Result};
use crate::kernels;
use crate::model::init::ParamInit;
use crate::tensor::{Tensor1, Tensor2};
use ndarray::{s, Zip};

/// Stack of gated residual layers that keep width `dim`.
///
/// Each layer projects x to [h, g] (both `dim` wide) and outputs
/// `sigmoid(g) * x + (1 - sigmoid(g)) * relu(h)`.
pub struct Highway {
    dim: usize,
    layers: Vec<Linear>, // each [2 * dim, dim]
}

impl Highway {
    pub fn new(dim: usize, layers: Vec<Linear>) -> Result<Self> {
        for (i, layer) in layers.iter().enumerate() {
            if layer.in_dim() != dim || layer.out_dim() != 2 * dim {
                return Err(EmbedderError::input(format!(
                    "highway layer {} is [{}, {}], expected [{}, {}]",
                    i,
                    layer.out_dim(),
                    layer.in_dim(),
                    2 * dim,
                    dim
                )));
            }
        }
        Ok(Self { dim, layers })
    }

    /// Xavier weights; candidate bias 0, gate bias 1.
    pub fn init(init: &mut ParamInit, dim: usize, depth: usize) -> Result<Self> {
        let layers = (0..depth)
            .map(|_| {
                let weight = init.xavier_normal(2 * dim, dim)?;
                let mut bias = Tensor1::zeros(2 * dim);
                bias.slice_mut(s![dim..]).fill(1.0);
                Linear::new(weight, bias)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(dim, layers)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    /// Forward pass: (n, dim) -> (n, dim)
    pub fn forward(&self, mut x: Tensor2) -> Tensor2 {
        for layer in &self.layers {
            let proj = layer.forward(x.view());
            let mut candidate = proj.slice(s![.., ..self.dim]).to_owned();
            kernels::relu_inplace(&mut candidate);
            let gate = kernels::sigmoid(&proj.slice(s![.., self.dim..]).to_owned());

            Zip::from(&mut x)
                .and(&gate)
                .and(&candidate)
                .for_each(|x, &g, &h| *x = g * *x + (1.0 - g) * h);
        }
        x
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Linear] {
        &mut self.layers
    }
}
