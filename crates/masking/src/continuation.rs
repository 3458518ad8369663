//! Word-continuation detection for whole-word masking.
//!
//! A position is a continuation when its surface form carries the
//! vocabulary's continuation prefix (`##` for WordPiece). The first position
//! of every sequence never is. Detection decodes every id, so pipelines that
//! reuse sequences should compute masks once, either next to the batch with
//! [`word_tails_tensor`] or through a [`WordTailsCache`].

use std::collections::HashMap;

use candle_core::Tensor;
use tokenizer::Vocabulary;

use crate::errors::Result;
use crate::grid::{BoolGrid, TokenGrid};

/// Marks continuation pieces in every row of `tokens`.
pub fn word_tails_mask<V: Vocabulary + ?Sized>(tokens: &TokenGrid, vocab: &V) -> Result<BoolGrid> {
    tokens.ensure_token_ids()?;
    let mut data = Vec::with_capacity(tokens.len());
    for row in tokens.rows() {
        data.extend(row_tails(row, vocab));
    }
    BoolGrid::new(data, tokens.shape())
}

/// Tensor counterpart of [`word_tails_mask`]; returns a `U8` mask on the
/// input's device.
pub fn word_tails_tensor<V: Vocabulary + ?Sized>(inputs: &Tensor, vocab: &V) -> Result<Tensor> {
    let tokens = TokenGrid::from_tensor(inputs)?;
    word_tails_mask(&tokens, vocab)?.to_tensor(inputs.device())
}

fn row_tails<V: Vocabulary + ?Sized>(row: &[i64], vocab: &V) -> Vec<bool> {
    row.iter()
        .enumerate()
        .map(|(position, &id)| position > 0 && vocab.is_continuation(id as u32))
        .collect()
}

/// Memoises continuation masks per distinct sequence.
#[derive(Debug, Default)]
pub struct WordTailsCache {
    rows: HashMap<Vec<i64>, Vec<bool>>,
    hits: usize,
    misses: usize,
}

impl WordTailsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mask_for<V: Vocabulary + ?Sized>(
        &mut self,
        tokens: &TokenGrid,
        vocab: &V,
    ) -> Result<BoolGrid> {
        tokens.ensure_token_ids()?;
        let mut data = Vec::with_capacity(tokens.len());
        for row in tokens.rows() {
            match self.rows.get(row) {
                Some(cached) => {
                    self.hits += 1;
                    data.extend_from_slice(cached);
                }
                None => {
                    self.misses += 1;
                    let tails = row_tails(row, vocab);
                    data.extend_from_slice(&tails);
                    self.rows.insert(row.to_vec(), tails);
                }
            }
        }
        log::debug!(
            "word tails cache: {} sequences, {} hits, {} misses",
            self.rows.len(),
            self.hits,
            self.misses
        );
        BoolGrid::new(data, tokens.shape())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
