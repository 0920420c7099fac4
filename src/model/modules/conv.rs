use crate::config::FilterSpec;
use crate::error::{EmbedderError, Result};
use crate::kernels;
use crate::model::init::ParamInit;
use crate::tensor::{Tensor1, Tensor2, Tensor3, TensorView3};
use ndarray::ArrayViewMutD;

/// One filter of the bank: a valid 1-D convolution over characters,
/// reduced by max over time and passed through ReLU.
pub struct Conv1d {
    weight: Tensor3, // [out_channels, in_channels, width]
    bias: Tensor1,   // [out_channels]
}

impl Conv1d {
    pub fn new(weight: Tensor3, bias: Tensor1) -> Result<Self> {
        let (out_c, in_c, width) = weight.dim();
        if out_c == 0 || in_c == 0 || width == 0 {
            return Err(EmbedderError::input(format!(
                "convolution kernel must be non-empty, got {:?}",
                weight.dim()
            )));
        }
        if bias.len() != out_c {
            return Err(EmbedderError::input(format!(
                "convolution bias has {} entries for {} output channels",
                bias.len(),
                out_c
            )));
        }
        Ok(Self { weight, bias })
    }

    pub fn init(init: &mut ParamInit, in_channels: usize, spec: FilterSpec) -> Result<Self> {
        let (weight, bias) = init.conv1d(spec.out_channels, in_channels, spec.width);
        Self::new(weight, bias)
    }

    pub fn weight(&self) -> &Tensor3 {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor1 {
        &self.bias
    }

    pub fn out_channels(&self) -> usize {
        self.weight.dim().0
    }

    pub fn in_channels(&self) -> usize {
        self.weight.dim().1
    }

    pub fn width(&self) -> usize {
        self.weight.dim().2
    }

    /// (n, t, in_channels) -> (n, out_channels). Requires t >= width.
    pub fn forward(&self, char_embs: TensorView3<'_>) -> Tensor2 {
        let kernel = kernels::flatten_kernel(&self.weight);
        kernels::conv1d_max_relu(char_embs, &kernel, &self.bias, self.width())
    }

    pub(crate) fn parameters_mut(&mut self) -> [ArrayViewMutD<'_, f32>; 2] {
        [
            self.weight.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }
}
