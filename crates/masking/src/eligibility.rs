//! Removes structural positions from candidacy.
//!
//! Special tokens and padding are never targets. In whole-word mode the
//! continuation pieces of a word are zeroed as well, so only the first
//! piece of a word is sampled, with its own probability. The rest of the
//! word does not influence that probability.

use tokenizer::Vocabulary;

use crate::errors::Result;
use crate::grid::{BoolGrid, ProbabilityGrid, TokenGrid};

/// Zeroes every ineligible position of `probabilities` in place.
///
/// `word_tails` is applied only when given; callers pass it when whole-word
/// masking is enabled. Returns the number of positions left with a non-zero
/// probability.
pub fn apply_eligibility<V: Vocabulary + ?Sized>(
    probabilities: &mut ProbabilityGrid,
    tokens: &TokenGrid,
    vocab: &V,
    word_tails: Option<&BoolGrid>,
) -> Result<usize> {
    probabilities.ensure_shape(tokens.shape(), "probability matrix")?;
    if let Some(tails) = word_tails {
        tails.ensure_shape(tokens.shape(), "word continuation mask")?;
    }
    tokens.ensure_token_ids()?;

    let pad = vocab.pad_token_id().map(i64::from);

    for (row_index, row) in probabilities.rows_mut().enumerate() {
        let ids = tokens.row(row_index);
        let as_u32: Vec<u32> = ids.iter().map(|&id| id as u32).collect();
        let special = vocab.special_tokens_mask(&as_u32);
        let tails = word_tails.map(|grid| grid.row(row_index));

        for (col, probability) in row.iter_mut().enumerate() {
            let structural = special.get(col).copied().unwrap_or(false) || Some(ids[col]) == pad;
            let continuation = tails.map(|tails| tails[col]).unwrap_or(false);
            if structural || continuation {
                *probability = 0.0;
            }
        }
    }

    Ok(probabilities.iter().filter(|&&p| p > 0.0).count())
}
