use crate::tensor::{Tensor1, Tensor2, Tensor3, TensorView2, TensorView3};
use ndarray::{Array2, ArrayViewMut1, Axis};

#[cfg(feature = "parallel")]
use rayon::prelude::*;


/// Affine map over rows: out = x @ W^T + b
/// x: (n, in), W: (out, in), b: (out,) -> out: (n, out)
pub fn linear(x: TensorView2<'_>, w: &Tensor2, b: &Tensor1) -> Tensor2 {
    let mut out = x.dot(&w.t());
    out += b;
    out
}

/// ReLU activation, in place
pub fn relu_inplace(x: &mut Tensor2) {
    x.mapv_inplace(|v| v.max(0.0));
}

/// Logistic sigmoid: 1 / (1 + exp(-x))
pub fn sigmoid(x: &Tensor2) -> Tensor2 {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

/// Flatten a channels-first kernel [out_c, in_c, width] into [out_c, width * in_c]
/// so that row o lines up with a window laid out position-major.
pub fn flatten_kernel(w: &Tensor3) -> Tensor2 {
    let (out_c, in_c, width) = w.dim();
    Array2::from_shape_fn((out_c, width * in_c), |(o, j)| w[[o, j % in_c, j / in_c]])
}

/// Valid 1-D convolution, max over time, then ReLU.
///
/// x: (n, t, in_c) with characters on axis 1 and embedding channels on axis 2,
/// kernel: flattened (out_c, width * in_c), bias: (out_c,) -> out: (n, out_c).
///
/// Caller guarantees `t >= width`.
pub fn conv1d_max_relu(x: TensorView3<'_>, kernel: &Tensor2, bias: &Tensor1, width: usize) -> Tensor2 {
    let n = x.len_of(Axis(0));
    let mut out = Tensor2::zeros((n, kernel.nrows()));
    pool_rows(x, kernel, bias, width, &mut out);
    out
}

#[cfg(feature = "parallel")]
fn pool_rows(x: TensorView3<'_>, kernel: &Tensor2, bias: &Tensor1, width: usize, out: &mut Tensor2) {
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, row)| pool_word(x.index_axis(Axis(0), i), kernel, bias, width, row));
}

#[cfg(not(feature = "parallel"))]
fn pool_rows(x: TensorView3<'_>, kernel: &Tensor2, bias: &Tensor1, width: usize, out: &mut Tensor2) {
    for (i, row) in out.axis_iter_mut(Axis(0)).enumerate() {
        pool_word(x.index_axis(Axis(0), i), kernel, bias, width, row);
    }
}

/// Convolve one word (t, in_c) and reduce each output channel to its maximum.
fn pool_word(
    x: TensorView2<'_>,
    kernel: &Tensor2,
    bias: &Tensor1,
    width: usize,
    mut out: ArrayViewMut1<'_, f32>,
) {
    let (t, in_c) = x.dim();
    let steps = t + 1 - width;

    // im2col: one row per window position
    let windows = Array2::from_shape_fn((steps, width * in_c), |(p, j)| x[[p + j / in_c, j % in_c]]);
    let scores = windows.dot(&kernel.t()); // [steps, out_c]

    for (o, column) in scores.axis_iter(Axis(1)).enumerate() {
        let max = column.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        // bias is constant over time, so adding it after the max is exact
        out[o] = (max + bias[o]).max(0.0);
    }
}
