//! Positions that bypass character composition.

use crate::tensor::{CharCode, Tensor2, CHAR_EOS, CHAR_PAD};
use crate::vocab::Vocabulary;
use ndarray::{ArrayView1, ArrayView2, Axis};

/// Row of the symbol table used for end-of-sentence.
pub const EOS_SYMBOL_ROW: usize = 0;
/// Row of the symbol table used for unknown words.
pub const UNK_SYMBOL_ROW: usize = 1;

/// Per-position flags over a flattened batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialMasks {
    pub pad: Vec<bool>,
    pub eos: Vec<bool>,
    /// `None` for raw-character input, where an unknown word is just characters.
    pub unk: Option<Vec<bool>>,
}

impl SpecialMasks {
    /// Compare ids against the vocabulary's reserved indices.
    pub fn from_token_ids<V: Vocabulary + ?Sized>(ids: &[usize], vocab: &V) -> Self {
        Self {
            pad: ids.iter().map(|&id| id == vocab.pad()).collect(),
            eos: ids.iter().map(|&id| id == vocab.eos()).collect(),
            unk: Some(ids.iter().map(|&id| id == vocab.unk()).collect()),
        }
    }

    /// Inspect the first code of each row.
    pub fn from_char_rows(rows: ArrayView2<'_, CharCode>) -> Self {
        let first = |row: ArrayView1<'_, CharCode>| row.get(0).copied().unwrap_or(CHAR_PAD);
        Self {
            pad: rows.axis_iter(Axis(0)).map(|r| first(r) == CHAR_PAD).collect(),
            eos: rows.axis_iter(Axis(0)).map(|r| first(r) == CHAR_EOS).collect(),
            unk: None,
        }
    }

    pub fn len(&self) -> usize {
        self.pad.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pad.is_empty()
    }

    /// No position carries more than one flag.
    pub fn is_disjoint(&self) -> bool {
        (0..self.len()).all(|i| {
            let unk = self.unk.as_ref().is_some_and(|u| u[i]);
            [self.pad[i], self.eos[i], unk].iter().filter(|&&f| f).count() <= 1
        })
    }

    /// Overwrite flagged rows: pad -> zeros, eos -> symbols[EOS], unk -> symbols[UNK].
    /// Applied in that order.
    pub fn apply(&self, embs: &mut Tensor2, symbols: &Tensor2) {
        for (i, mut row) in embs.axis_iter_mut(Axis(0)).enumerate() {
            if self.pad[i] {
                row.fill(0.0);
            }
            if self.eos[i] {
                row.assign(&symbols.row(EOS_SYMBOL_ROW));
            }
            if let Some(unk) = &self.unk {
                if unk[i] {
                    row.assign(&symbols.row(UNK_SYMBOL_ROW));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Dictionary;
    use ndarray::array;

    #[test]
    fn test_token_masks() {
        let dict = Dictionary::from_words(["cat"]);
        let masks = SpecialMasks::from_token_ids(&[3, 0, 1, 2, 3], &dict);
        assert_eq!(masks.pad, vec![false, true, false, false, false]);
        assert_eq!(masks.eos, vec![false, false, true, false, false]);
        assert_eq!(masks.unk, Some(vec![false, false, false, true, false]));
        assert!(masks.is_disjoint());
    }

    #[test]
    fn test_char_masks_have_no_unk() {
        let rows = array![[100u16, 98], [0, 0], [257, 0]];
        let masks = SpecialMasks::from_char_rows(rows.view());
        assert_eq!(masks.pad, vec![false, true, false]);
        assert_eq!(masks.eos, vec![false, false, true]);
        assert_eq!(masks.unk, None);
    }

    #[test]
    fn test_apply_overrides() {
        let symbols = array![[1.0, 1.0], [2.0, 2.0]];
        let mut embs = array![[9.0, 9.0], [9.0, 9.0], [9.0, 9.0], [9.0, 9.0]];
        let masks = SpecialMasks {
            pad: vec![false, true, false, false],
            eos: vec![false, false, true, false],
            unk: Some(vec![false, false, false, true]),
        };
        masks.apply(&mut embs, &symbols);
        assert_eq!(embs, array![[9.0, 9.0], [0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
    }

    #[test]
    fn test_later_override_wins() {
        let symbols = array![[1.0], [2.0]];
        let mut embs = array![[9.0]];
        let masks = SpecialMasks {
            pad: vec![true],
            eos: vec![true],
            unk: Some(vec![true]),
        };
        assert!(!masks.is_disjoint());
        masks.apply(&mut embs, &symbols);
        assert_eq!(embs, array![[2.0]]);
    }
}
