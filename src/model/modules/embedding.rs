use crate::error::{EmbedderError, Result};
use crate::model::init::ParamInit;
use crate::tensor::{CharCode, Tensor2, Tensor3, CHAR_VOCAB_SIZE};
use ndarray::{s, ArrayView2, ArrayViewMut2};

/// Character embedding table with a fixed all-zero padding row.
pub struct CharEmbedding {
    weight: Tensor2, // [CHAR_VOCAB_SIZE, char_embed_dim]
}

impl CharEmbedding {
    /// Wrap an existing table. Row 0 is zeroed regardless of its contents.
    pub fn new(mut weight: Tensor2) -> Result<Self> {
        if weight.nrows() != CHAR_VOCAB_SIZE || weight.ncols() == 0 {
            return Err(EmbedderError::input(format!(
                "character embedding must be [{}, dim > 0], got {:?}",
                CHAR_VOCAB_SIZE,
                weight.dim()
            )));
        }
        weight.row_mut(0).fill(0.0);
        Ok(Self { weight })
    }

    pub fn init(init: &mut ParamInit, dim: usize) -> Result<Self> {
        Self::new(init.xavier_normal(CHAR_VOCAB_SIZE, dim)?)
    }

    pub fn dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn weight(&self) -> &Tensor2 {
        &self.weight
    }

    /// Every row except padding. The padding row is never handed out mutably.
    pub fn trainable_rows_mut(&mut self) -> ArrayViewMut2<'_, f32> {
        self.weight.slice_mut(s![1.., ..])
    }

    /// Look up codes: (n, t) -> (n, t, dim). Codes must be below `CHAR_VOCAB_SIZE`.
    pub fn forward(&self, codes: ArrayView2<'_, CharCode>) -> Tensor3 {
        let (n, t) = codes.dim();
        Tensor3::from_shape_fn((n, t, self.dim()), |(i, j, k)| {
            self.weight[[codes[[i, j]] as usize, k]]
        })
    }
}
