mod conv;
mod embedding;
mod encoder;
mod highway;
mod linear;

pub use conv::Conv1d;
pub use embedding::CharEmbedding;
pub use encoder::CharacterConvolutionEncoder;
pub use highway::Highway;
pub use linear::Linear;
