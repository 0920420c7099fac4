use crate::error::{EmbedderError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;


pub const DEFAULT_MAX_CHAR_LEN: usize = 50;

/// One convolution in the filter bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilterSpec {
    /// Kernel width in characters.
    pub width: usize,
    pub out_channels: usize,
}

impl FilterSpec {
    pub fn new(width: usize, out_channels: usize) -> Self {
        Self { width, out_channels }
    }
}

impl From<(usize, usize)> for FilterSpec {
    fn from((width, out_channels): (usize, usize)) -> Self {
        Self { width, out_channels }
    }
}

/// How `embed` interprets its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// [batch, seq] vocabulary indices.
    #[default]
    TokenIds,
    /// [batch, seq, max_char_len] character codes.
    RawCharacters,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedderConfig {
    pub filters: Vec<FilterSpec>,
    pub char_embed_dim: usize,
    pub word_embed_dim: usize,
    pub highway_layers: usize,
    #[serde(default = "default_max_char_len")]
    pub max_char_len: usize,
    #[serde(default)]
    pub input_mode: InputMode,
    /// Seed for parameter initialization.
    #[serde(default)]
    pub seed: u64,
}

fn default_max_char_len() -> usize {
    DEFAULT_MAX_CHAR_LEN
}

impl EmbedderConfig {
    /// `filters` are `(width, out_channels)` pairs in bank order.
    pub fn new(
        filters: &[(usize, usize)],
        char_embed_dim: usize,
        word_embed_dim: usize,
        highway_layers: usize,
    ) -> Self {
        Self {
            filters: filters.iter().copied().map(FilterSpec::from).collect(),
            char_embed_dim,
            word_embed_dim,
            highway_layers,
            max_char_len: DEFAULT_MAX_CHAR_LEN,
            input_mode: InputMode::TokenIds,
            seed: 0,
        }
    }

    pub fn with_max_char_len(mut self, max_char_len: usize) -> Self {
        self.max_char_len = max_char_len;
        self
    }

    pub fn with_input_mode(mut self, input_mode: InputMode) -> Self {
        self.input_mode = input_mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Width of the concatenated filter outputs.
    pub fn final_dim(&self) -> usize {
        self.filters.iter().map(|f| f.out_channels).sum()
    }

    pub fn max_filter_width(&self) -> usize {
        self.filters.iter().map(|f| f.width).max().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters.is_empty() {
            return Err(EmbedderError::config("filter bank is empty"));
        }
        for (i, f) in self.filters.iter().enumerate() {
            if f.width == 0 {
                return Err(EmbedderError::config(format!("filter {} has zero width", i)));
            }
            if f.out_channels == 0 {
                return Err(EmbedderError::config(format!(
                    "filter {} (width {}) has zero output channels",
                    i, f.width
                )));
            }
        }
        if self.final_dim() == 0 {
            return Err(EmbedderError::config("filter bank output dimension is zero"));
        }
        if self.char_embed_dim == 0 {
            return Err(EmbedderError::config("char_embed_dim must be positive"));
        }
        if self.word_embed_dim == 0 {
            return Err(EmbedderError::config("word_embed_dim must be positive"));
        }
        check_max_char_len(self.max_char_len, self.max_filter_width())
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse embedder config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_json_str(&json)
    }
}

/// Every filter must fit inside a word row.
pub(crate) fn check_max_char_len(max_char_len: usize, max_filter_width: usize) -> Result<()> {
    if max_char_len == 0 {
        return Err(EmbedderError::config("max_char_len must be positive"));
    }
    if max_filter_width > max_char_len {
        return Err(EmbedderError::config(format!(
            "filter width {} exceeds max_char_len {}",
            max_filter_width, max_char_len
        )));
    }
    Ok(())
}
