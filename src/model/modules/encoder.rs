use super::{CharEmbedding, Conv1d, Highway, Linear};
use crate::config::EmbedderConfig;
use crate::error::{EmbedderError, Result};
use crate::model::init::ParamInit;
use crate::tensor::{CharCode, Tensor1, Tensor2, CHAR_VOCAB_SIZE};
use ndarray::{s, ArrayView2, ArrayViewD, ArrayViewMutD};

/// Character rows -> word vectors.
///
/// embed chars -> filter bank (conv, max over time, ReLU) -> concat
/// -> highway -> projection
pub struct CharacterConvolutionEncoder {
    char_embeddings: CharEmbedding,
    convolutions: Vec<Conv1d>,
    highway: Highway,
    projection: Linear, // [word_embed_dim, final_dim]
}

impl CharacterConvolutionEncoder {
    /// Build with freshly initialized parameters.
    pub fn new(config: &EmbedderConfig, init: &mut ParamInit) -> Result<Self> {
        config.validate()?;

        let char_embeddings = CharEmbedding::init(init, config.char_embed_dim)?;
        let convolutions = config
            .filters
            .iter()
            .map(|&spec| Conv1d::init(init, config.char_embed_dim, spec))
            .collect::<Result<Vec<_>>>()?;

        let final_dim = config.final_dim();
        let highway = Highway::init(init, final_dim, config.highway_layers)?;
        let projection = Linear::new(
            init.xavier_normal(config.word_embed_dim, final_dim)?,
            Tensor1::zeros(config.word_embed_dim),
        )?;

        Self::from_parts(char_embeddings, convolutions, highway, projection)
    }

    /// Assemble from existing modules, checking that their widths line up.
    pub fn from_parts(
        char_embeddings: CharEmbedding,
        convolutions: Vec<Conv1d>,
        highway: Highway,
        projection: Linear,
    ) -> Result<Self> {
        if convolutions.is_empty() {
            return Err(EmbedderError::config("filter bank is empty"));
        }
        for (i, conv) in convolutions.iter().enumerate() {
            if conv.in_channels() != char_embeddings.dim() {
                return Err(EmbedderError::config(format!(
                    "filter {} reads {} channels, character embeddings have {}",
                    i,
                    conv.in_channels(),
                    char_embeddings.dim()
                )));
            }
        }
        let final_dim: usize = convolutions.iter().map(Conv1d::out_channels).sum();
        if highway.dim() != final_dim {
            return Err(EmbedderError::config(format!(
                "highway width {} does not match filter bank output {}",
                highway.dim(),
                final_dim
            )));
        }
        if projection.in_dim() != final_dim || projection.out_dim() == 0 {
            return Err(EmbedderError::config(format!(
                "projection is [{}, {}], expected [word_embed_dim > 0, {}]",
                projection.out_dim(),
                projection.in_dim(),
                final_dim
            )));
        }

        Ok(Self {
            char_embeddings,
            convolutions,
            highway,
            projection,
        })
    }

    /// Sum of filter output channels.
    pub fn final_dim(&self) -> usize {
        self.highway.dim()
    }

    pub fn output_dim(&self) -> usize {
        self.projection.out_dim()
    }

    pub fn max_filter_width(&self) -> usize {
        self.convolutions.iter().map(Conv1d::width).max().unwrap_or(0)
    }

    pub fn char_embeddings(&self) -> &CharEmbedding {
        &self.char_embeddings
    }

    pub fn convolutions(&self) -> &[Conv1d] {
        &self.convolutions
    }

    pub fn highway(&self) -> &Highway {
        &self.highway
    }

    pub fn projection(&self) -> &Linear {
        &self.projection
    }

    /// Compose word vectors: (n, max_char_len) codes -> (n, output_dim).
    pub fn compose(&self, codes: ArrayView2<'_, CharCode>) -> Result<Tensor2> {
        let (n, t) = codes.dim();
        if t < self.max_filter_width() {
            return Err(EmbedderError::input(format!(
                "rows of {} characters are shorter than the widest filter ({})",
                t,
                self.max_filter_width()
            )));
        }
        if let Some(&bad) = codes.iter().find(|&&c| c as usize >= CHAR_VOCAB_SIZE) {
            return Err(EmbedderError::input(format!(
                "character code {} outside [0, {})",
                bad, CHAR_VOCAB_SIZE
            )));
        }

        let char_embs = self.char_embeddings.forward(codes);

        // Concatenate filter outputs along channels, in bank order
        let mut pooled = Tensor2::zeros((n, self.final_dim()));
        let mut offset = 0;
        for conv in &self.convolutions {
            let width = conv.out_channels();
            pooled
                .slice_mut(s![.., offset..offset + width])
                .assign(&conv.forward(char_embs.view()));
            offset += width;
        }

        let hidden = self.highway.forward(pooled);
        Ok(self.projection.forward(hidden.view()))
    }

    pub fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        let mut params = vec![(
            "char_embeddings.weight".to_string(),
            self.char_embeddings.weight().view().into_dyn(),
        )];
        for (i, conv) in self.convolutions.iter().enumerate() {
            params.push((format!("convolutions.{}.weight", i), conv.weight().view().into_dyn()));
            params.push((format!("convolutions.{}.bias", i), conv.bias().view().into_dyn()));
        }
        for (i, layer) in self.highway.layers().iter().enumerate() {
            params.push((format!("highway.layers.{}.weight", i), layer.weight().view().into_dyn()));
            params.push((format!("highway.layers.{}.bias", i), layer.bias().view().into_dyn()));
        }
        params.push((
            "projection.weight".to_string(),
            self.projection.weight().view().into_dyn(),
        ));
        params.push((
            "projection.bias".to_string(),
            self.projection.bias().view().into_dyn(),
        ));
        params
    }

    /// Mutable views for an optimizer. `char_embeddings.weight` covers rows
    /// `1..` only; the padding row stays zero.
    pub fn named_parameters_mut(&mut self) -> Vec<(String, ArrayViewMutD<'_, f32>)> {
        let mut params = vec![(
            "char_embeddings.weight".to_string(),
            self.char_embeddings.trainable_rows_mut().into_dyn(),
        )];
        for (i, conv) in self.convolutions.iter_mut().enumerate() {
            let [weight, bias] = conv.parameters_mut();
            params.push((format!("convolutions.{}.weight", i), weight));
            params.push((format!("convolutions.{}.bias", i), bias));
        }
        for (i, layer) in self.highway.layers_mut().iter_mut().enumerate() {
            let [weight, bias] = layer.parameters_mut();
            params.push((format!("highway.layers.{}.weight", i), weight));
            params.push((format!("highway.layers.{}.bias", i), bias));
        }
        let [weight, bias] = self.projection.parameters_mut();
        params.push(("projection.weight".to_string(), weight));
        params.push(("projection.bias".to_string(), bias));
        params
    }
}
