use ndarray::{Array, ArrayView, Ix1, Ix2, Ix3};

pub type Tensor1 = Array<f32, Ix1>;
pub type Tensor2 = Array<f32, Ix2>;
pub type Tensor3 = Array<f32, Ix3>;

pub type TensorView1<'a> = ArrayView<'a, f32, Ix1>;
pub type TensorView2<'a> = ArrayView<'a, f32, Ix2>;
pub type TensorView3<'a> = ArrayView<'a, f32, Ix3>;

/// A character code: 0 is padding, 1..=256 are bytes shifted by one, 257 is the EOS sentinel.
pub type CharCode = u16;

/// Rows of character codes, one row per word: [n_words, max_char_len]
pub type CodeMatrix = Array<CharCode, Ix2>;

/// Reserved padding code.
pub const CHAR_PAD: CharCode = 0;

/// Sentinel marking an end-of-sentence row in raw-character input.
/// Compared against input only; never a row of the character table.
pub const CHAR_EOS: CharCode = 257;

/// Rows in the character embedding table: padding plus 256 byte values.
pub const CHAR_VOCAB_SIZE: usize = 257;
