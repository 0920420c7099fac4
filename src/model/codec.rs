//! Word -> character-code rows.
//!
//! Every vocabulary entry becomes a fixed-length row of codes. Special
//! entries (`index < nspecial`) are all padding. Regular entries hold their
//! bytes shifted up by one so that 0 can mean padding, right-padded to
//! `max_char_len` and truncated beyond it.

use crate::tensor::{CharCode, CodeMatrix, CHAR_PAD};
use crate::vocab::Vocabulary;
use ndarray::{Array2, ArrayView1, Axis};
use std::fmt;

/// How many words were cut short while building a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationReport {
    pub truncated: usize,
    pub max_char_len: usize,
}

impl TruncationReport {
    pub fn any(&self) -> bool {
        self.truncated > 0
    }
}

impl fmt::Display for TruncationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Truncated {} words longer than {} characters",
            self.truncated, self.max_char_len
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterCodec {
    max_char_len: usize,
}

impl CharacterCodec {
    pub fn new(max_char_len: usize) -> Self {
        Self { max_char_len }
    }

    pub fn max_char_len(&self) -> usize {
        self.max_char_len
    }

    /// Encode one word. Returns the padded row and whether it was truncated.
    pub fn encode(&self, bytes: &[u8]) -> (Vec<CharCode>, bool) {
        let mut row = vec![CHAR_PAD; self.max_char_len];
        fill_codes(row.iter_mut(), bytes);
        (row, bytes.len() > self.max_char_len)
    }

    /// Undo the +1 shift, stopping at the first padding code.
    pub fn decode(row: &[CharCode]) -> Vec<u8> {
        row.iter()
            .take_while(|&&c| c != CHAR_PAD)
            .map(|&c| (c - 1) as u8)
            .collect()
    }

    /// Build the [len, max_char_len] table for a whole vocabulary.
    pub fn build_table<V: Vocabulary + ?Sized>(&self, vocab: &V) -> (CharIndexTable, TruncationReport) {
        let mut codes: CodeMatrix = Array2::zeros((vocab.len(), self.max_char_len));
        let mut truncated = 0;

        for (i, mut row) in codes.axis_iter_mut(Axis(0)).enumerate() {
            if i < vocab.nspecial() {
                continue;
            }
            let bytes = vocab.symbol_bytes(i);
            fill_codes(row.iter_mut(), bytes);
            if bytes.len() > self.max_char_len {
                truncated += 1;
            }
        }

        let report = TruncationReport {
            truncated,
            max_char_len: self.max_char_len,
        };
        (CharIndexTable { codes }, report)
    }
}

/// Write `byte + 1` into as many slots as there are, leaving the rest untouched.
fn fill_codes<'a>(slots: impl Iterator<Item = &'a mut CharCode>, bytes: &[u8]) {
    for (slot, &b) in slots.zip(bytes) {
        *slot = b as CharCode + 1;
    }
}

/// Character codes for every vocabulary index.
#[derive(Debug, Clone, PartialEq)]
pub struct CharIndexTable {
    codes: CodeMatrix,
}

impl CharIndexTable {
    pub fn len(&self) -> usize {
        self.codes.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.nrows() == 0
    }

    pub fn max_char_len(&self) -> usize {
        self.codes.ncols()
    }

    pub fn codes(&self) -> &CodeMatrix {
        &self.codes
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, CharCode> {
        self.codes.row(index)
    }

    /// Rows for `ids`, in order. Ids must be in range.
    pub fn gather(&self, ids: &[usize]) -> CodeMatrix {
        Array2::from_shape_fn((ids.len(), self.max_char_len()), |(r, j)| self.codes[[ids[r], j]])
    }
}
