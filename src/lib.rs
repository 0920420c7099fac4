pub mod config;
pub mod error;
pub mod kernels;
pub mod model;
pub mod tensor;
pub mod vocab;

pub use config::{EmbedderConfig, FilterSpec, InputMode};
pub use error::{EmbedderError, Result};
pub use model::{
    CharIndexTable, CharacterCodec, CharacterConvolutionEncoder, CharacterTokenEmbedder,
    EmbedderInput, SpecialMasks, TruncationReport, VocabSnapshot,
};
pub use tensor::{CharCode, CHAR_EOS, CHAR_PAD};
pub use vocab::{Dictionary, Vocabulary};
