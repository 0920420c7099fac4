use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;


pub const PAD_SYMBOL: &str = "<pad>";
pub const EOS_SYMBOL: &str = "</s>";
pub const UNK_SYMBOL: &str = "<unk>";

/// What the embedder needs to know about a vocabulary.
///
/// Indices `[0, nspecial)` are special symbols that are never split into
/// characters. `pad`, `eos` and `unk` must all be special.
pub trait Vocabulary {
    /// Number of entries, special symbols included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token text at `index`.
    fn symbol(&self, index: usize) -> &str;

    /// Byte-level decoding of a token.
    fn symbol_bytes(&self, index: usize) -> &[u8] {
        self.symbol(index).as_bytes()
    }

    fn pad(&self) -> usize;
    fn eos(&self) -> usize;
    fn unk(&self) -> usize;

    /// Count of special indices at the low end of the index space.
    fn nspecial(&self) -> usize;
}

/// A word list with counts, seeded with `<pad>`, `</s>` and `<unk>`.
#[derive(Clone, Debug)]
pub struct Dictionary {
    symbols: Vec<String>,
    counts: Vec<usize>,
    indices: HashMap<String, usize>,
    pad_index: usize,
    eos_index: usize,
    unk_index: usize,
    nspecial: usize,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    pub fn new() -> Self {
        let mut dict = Self {
            symbols: Vec::new(),
            counts: Vec::new(),
            indices: HashMap::new(),
            pad_index: 0,
            eos_index: 0,
            unk_index: 0,
            nspecial: 0,
        };
        dict.pad_index = dict.add_symbol(PAD_SYMBOL);
        dict.eos_index = dict.add_symbol(EOS_SYMBOL);
        dict.unk_index = dict.add_symbol(UNK_SYMBOL);
        dict.nspecial = dict.symbols.len();
        dict
    }

    /// Build a dictionary from a word sequence, counting repeats.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dict = Self::new();
        for word in words {
            dict.add_symbol(word.as_ref());
        }
        dict
    }

    /// Add a word (or bump its count) and return its index.
    pub fn add_symbol(&mut self, word: &str) -> usize {
        if let Some(&idx) = self.indices.get(word) {
            self.counts[idx] += 1;
            return idx;
        }
        let idx = self.symbols.len();
        self.indices.insert(word.to_string(), idx);
        self.symbols.push(word.to_string());
        self.counts.push(1);
        idx
    }

    fn add_symbol_with_count(&mut self, word: &str, count: usize) {
        if self.indices.contains_key(word) {
            return;
        }
        let idx = self.symbols.len();
        self.indices.insert(word.to_string(), idx);
        self.symbols.push(word.to_string());
        self.counts.push(count);
    }

    /// Index of `word`, or `unk` if absent.
    pub fn index(&self, word: &str) -> usize {
        self.indices.get(word).copied().unwrap_or(self.unk_index)
    }

    pub fn count(&self, index: usize) -> usize {
        self.counts[index]
    }

    /// Encode whitespace-separated words as ids, unknown words mapping to `unk`.
    pub fn encode_line(&self, line: &str, append_eos: bool) -> Vec<u32> {
        let mut ids: Vec<u32> = line
            .split_whitespace()
            .map(|w| self.index(w) as u32)
            .collect();
        if append_eos {
            ids.push(self.eos_index as u32);
        }
        ids
    }

    /// Read entries in `<word> <count>` format, one per line.
    ///
    /// The count is optional. Words already present are ignored.
    pub fn load<R: BufRead>(reader: R) -> Result<Self> {
        let mut dict = Self::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read dictionary line")?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            match line.rsplit_once(' ') {
                Some((word, count)) => {
                    let count: usize = match count.parse() {
                        Ok(c) => c,
                        Err(_) => bail!(
                            "Incorrect dictionary format at line {}: expected '<word> <count>', got '{}'",
                            line_no + 1,
                            line
                        ),
                    };
                    dict.add_symbol_with_count(word, count);
                }
                None => dict.add_symbol_with_count(line, 1),
            }
        }
        Ok(dict)
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open dictionary '{}'", path.display()))?;
        Self::load(BufReader::new(file))
    }
}

impl Vocabulary for Dictionary {
    fn len(&self) -> usize {
        self.symbols.len()
    }

    fn symbol(&self, index: usize) -> &str {
        &self.symbols[index]
    }

    fn pad(&self) -> usize {
        self.pad_index
    }

    fn eos(&self) -> usize {
        self.eos_index
    }

    fn unk(&self) -> usize {
        self.unk_index
    }

    fn nspecial(&self) -> usize {
        self.nspecial
    }
}
