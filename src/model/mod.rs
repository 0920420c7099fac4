use crate::config::{check_max_char_len, EmbedderConfig, InputMode};
use crate::error::{EmbedderError, Result};
use crate::tensor::{CharCode, CodeMatrix, Tensor2, Tensor3, CHAR_EOS, CHAR_PAD};
use crate::vocab::Vocabulary;
use ndarray::{Array2, ArrayView2, ArrayView3, ArrayViewD, ArrayViewMutD, Axis};
use std::sync::{Arc, PoisonError, RwLock};

pub mod codec;
pub mod init;
pub mod modules;
mod overrides;

pub use codec::{CharIndexTable, CharacterCodec, TruncationReport};
pub use init::ParamInit;
pub use modules::{CharEmbedding, CharacterConvolutionEncoder, Conv1d, Highway, Linear};
pub use overrides::{SpecialMasks, EOS_SYMBOL_ROW, UNK_SYMBOL_ROW};

/// A batch for [`CharacterTokenEmbedder::embed`].
#[derive(Debug, Clone, Copy)]
pub enum EmbedderInput<'a> {
    /// [batch, seq] vocabulary indices
    Tokens(ArrayView2<'a, u32>),
    /// [batch, seq, max_char_len] character codes
    Chars(ArrayView3<'a, CharCode>),
}

/// A vocabulary together with the character table built from it.
pub struct VocabSnapshot<V> {
    vocab: V,
    table: CharIndexTable,
    truncation: TruncationReport,
}

impl<V> VocabSnapshot<V> {
    pub fn vocab(&self) -> &V {
        &self.vocab
    }

    pub fn table(&self) -> &CharIndexTable {
        &self.table
    }

    /// Truncation count from building `table`.
    pub fn truncation(&self) -> TruncationReport {
        self.truncation
    }

    pub fn max_char_len(&self) -> usize {
        self.table.max_char_len()
    }
}

/// Word embeddings composed from characters.
///
/// Pad, eos and unk never go through the character path: pad becomes the
/// zero vector, eos and unk take learned symbol vectors.
///
/// `embed` only needs `&self`. `set_vocab` swaps the vocabulary snapshot
/// atomically; calls already running keep the snapshot they started with.
pub struct CharacterTokenEmbedder<V: Vocabulary> {
    encoder: CharacterConvolutionEncoder,
    symbol_embeddings: Tensor2, // [2, word_embed_dim], rows EOS_SYMBOL_ROW and UNK_SYMBOL_ROW
    input_mode: InputMode,
    state: RwLock<Arc<VocabSnapshot<V>>>,
}

impl<V: Vocabulary> CharacterTokenEmbedder<V> {
    pub fn new(vocab: V, config: &EmbedderConfig) -> Result<Self> {
        config.validate()?;

        let mut init = ParamInit::seeded(config.seed);
        let encoder = CharacterConvolutionEncoder::new(config, &mut init)?;
        let symbol_embeddings = init.xavier_normal(2, config.word_embed_dim)?;

        tracing::debug!(
            filters = ?config.filters,
            final_dim = encoder.final_dim(),
            highway_layers = config.highway_layers,
            word_embed_dim = config.word_embed_dim,
            input_mode = ?config.input_mode,
            "Building character token embedder"
        );

        Self::from_parts(vocab, encoder, symbol_embeddings, config.max_char_len, config.input_mode)
    }

    /// Assemble from an existing encoder and symbol table.
    pub fn from_parts(
        vocab: V,
        encoder: CharacterConvolutionEncoder,
        symbol_embeddings: Tensor2,
        max_char_len: usize,
        input_mode: InputMode,
    ) -> Result<Self> {
        if symbol_embeddings.dim() != (2, encoder.output_dim()) {
            return Err(EmbedderError::config(format!(
                "symbol embeddings are {:?}, expected (2, {})",
                symbol_embeddings.dim(),
                encoder.output_dim()
            )));
        }
        let snapshot = build_snapshot(vocab, max_char_len, encoder.max_filter_width())?;

        Ok(Self {
            encoder,
            symbol_embeddings,
            input_mode,
            state: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Replace the vocabulary and rebuild the character table.
    pub fn set_vocab(&self, vocab: V, max_char_len: usize) -> Result<TruncationReport> {
        let snapshot = build_snapshot(vocab, max_char_len, self.encoder.max_filter_width())?;
        let truncation = snapshot.truncation;
        tracing::debug!(
            vocab_size = snapshot.table.len(),
            max_char_len,
            "Replaced character index table"
        );

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        Ok(truncation)
    }

    /// The current vocabulary and table. Unaffected by later `set_vocab` calls.
    pub fn snapshot(&self) -> Arc<VocabSnapshot<V>> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn embedding_dim(&self) -> usize {
        self.encoder.output_dim()
    }

    pub fn max_char_len(&self) -> usize {
        self.snapshot().max_char_len()
    }

    pub fn padding_idx(&self) -> usize {
        self.snapshot().vocab.pad()
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn encoder(&self) -> &CharacterConvolutionEncoder {
        &self.encoder
    }

    pub fn symbol_embeddings(&self) -> &Tensor2 {
        &self.symbol_embeddings
    }

    pub fn embed(&self, input: EmbedderInput<'_>) -> Result<Tensor3> {
        match input {
            EmbedderInput::Tokens(ids) => self.embed_tokens(ids),
            EmbedderInput::Chars(chars) => self.embed_chars(chars),
        }
    }

    /// Token-id mode: [batch, seq] ids -> [batch, seq, embedding_dim]
    pub fn embed_tokens(&self, ids: ArrayView2<'_, u32>) -> Result<Tensor3> {
        self.expect_mode(InputMode::TokenIds)?;
        let snapshot = self.snapshot();
        let (batch, seq) = ids.dim();

        let flat: Vec<usize> = ids.iter().map(|&id| id as usize).collect();
        if let Some(&bad) = flat.iter().find(|&&id| id >= snapshot.table.len()) {
            return Err(EmbedderError::input(format!(
                "token id {} outside vocabulary of {}",
                bad,
                snapshot.table.len()
            )));
        }

        let chars = snapshot.table.gather(&flat);
        let masks = SpecialMasks::from_token_ids(&flat, &snapshot.vocab);
        self.compose_and_override(chars, &masks, batch, seq)
    }

    /// Raw-character mode: [batch, seq, max_char_len] codes -> [batch, seq, embedding_dim]
    ///
    /// Rows starting with the padding code are pad, rows starting with
    /// `CHAR_EOS` are eos. There is no unk in this mode.
    pub fn embed_chars(&self, chars: ArrayView3<'_, CharCode>) -> Result<Tensor3> {
        self.expect_mode(InputMode::RawCharacters)?;
        let max_char_len = self.max_char_len();
        let (batch, seq, width) = chars.dim();

        if width != max_char_len {
            return Err(EmbedderError::input(format!(
                "character rows have {} codes, expected {}",
                width, max_char_len
            )));
        }
        if let Some(&bad) = chars.iter().find(|&&c| c > CHAR_EOS) {
            return Err(EmbedderError::input(format!(
                "character code {} outside [0, {}]",
                bad, CHAR_EOS
            )));
        }

        // Work on a copy so the caller's batch is left untouched
        let mut rows: CodeMatrix =
            Array2::from_shape_fn((batch * seq, width), |(r, j)| chars[[r / seq, r % seq, j]]);
        let masks = SpecialMasks::from_char_rows(rows.view());
        for (mut row, &eos) in rows.axis_iter_mut(Axis(0)).zip(&masks.eos) {
            if eos {
                row.fill(CHAR_PAD);
            }
        }

        self.compose_and_override(rows, &masks, batch, seq)
    }

    fn expect_mode(&self, mode: InputMode) -> Result<()> {
        if self.input_mode != mode {
            return Err(EmbedderError::input(format!(
                "embedder configured for {:?} input, got {:?}",
                self.input_mode, mode
            )));
        }
        Ok(())
    }

    fn compose_and_override(
        &self,
        chars: CodeMatrix,
        masks: &SpecialMasks,
        batch: usize,
        seq: usize,
    ) -> Result<Tensor3> {
        let mut word_embs = self.encoder.compose(chars.view())?;
        masks.apply(&mut word_embs, &self.symbol_embeddings);

        let dim = word_embs.ncols();
        word_embs
            .into_shape_with_order((batch, seq, dim))
            .map_err(|e| EmbedderError::input(format!("cannot shape output as [{}, {}, {}]: {}", batch, seq, dim, e)))
    }

    pub fn named_parameters(&self) -> Vec<(String, ArrayViewD<'_, f32>)> {
        let mut params = self.encoder.named_parameters();
        params.push((
            "symbol_embeddings".to_string(),
            self.symbol_embeddings.view().into_dyn(),
        ));
        params
    }

    /// Mutable parameter views. The character padding row is not included.
    pub fn named_parameters_mut(&mut self) -> Vec<(String, ArrayViewMutD<'_, f32>)> {
        let mut params = self.encoder.named_parameters_mut();
        params.push((
            "symbol_embeddings".to_string(),
            self.symbol_embeddings.view_mut().into_dyn(),
        ));
        params
    }
}

fn build_snapshot<V: Vocabulary>(
    vocab: V,
    max_char_len: usize,
    max_filter_width: usize,
) -> Result<VocabSnapshot<V>> {
    check_max_char_len(max_char_len, max_filter_width)?;
    validate_vocab(&vocab)?;

    let (table, truncation) = CharacterCodec::new(max_char_len).build_table(&vocab);
    if truncation.any() {
        tracing::info!("{}", truncation);
    }

    Ok(VocabSnapshot {
        vocab,
        table,
        truncation,
    })
}

/// pad, eos and unk must be distinct special indices.
fn validate_vocab<V: Vocabulary>(vocab: &V) -> Result<()> {
    if vocab.nspecial() > vocab.len() {
        return Err(EmbedderError::config(format!(
            "vocabulary declares {} special symbols but has {} entries",
            vocab.nspecial(),
            vocab.len()
        )));
    }
    let reserved = [("pad", vocab.pad()), ("eos", vocab.eos()), ("unk", vocab.unk())];
    for (name, index) in reserved {
        if index >= vocab.nspecial() {
            return Err(EmbedderError::config(format!(
                "{} index {} is not a special symbol (nspecial = {})",
                name,
                index,
                vocab.nspecial()
            )));
        }
    }
    if vocab.pad() == vocab.eos() || vocab.pad() == vocab.unk() || vocab.eos() == vocab.unk() {
        return Err(EmbedderError::config("pad, eos and unk must be distinct"));
    }
    Ok(())
}
