use crate::error::{EmbedderError, Result};
use crate::kernels;
use crate::tensor::{Tensor1, Tensor2, TensorView2};
use ndarray::ArrayViewMutD;

/// Affine layer y = x @ W^T + b
pub struct Linear {
    weight: Tensor2, // [out_dim, in_dim]
    bias: Tensor1,   // [out_dim]
}

impl Linear {
    pub fn new(weight: Tensor2, bias: Tensor1) -> Result<Self> {
        if weight.nrows() != bias.len() {
            return Err(EmbedderError::input(format!(
                "linear bias has {} entries for {} output rows",
                bias.len(),
                weight.nrows()
            )));
        }
        Ok(Self { weight, bias })
    }

    pub fn weight(&self) -> &Tensor2 {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor1 {
        &self.bias
    }

    pub fn in_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_dim(&self) -> usize {
        self.weight.nrows()
    }

    /// Forward pass: (n, in_dim) -> (n, out_dim)
    pub fn forward(&self, x: TensorView2<'_>) -> Tensor2 {
        kernels::linear(x, &self.weight, &self.bias)
    }

    pub(crate) fn parameters_mut(&mut self) -> [ArrayViewMutD<'_, f32>; 2] {
        [
            self.weight.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }
}
