//! Masked-token corruption for masked language modeling batches.
//!
//! Given a `[batch, seq_len]` batch of token ids, [`MaskedLanguageModeling`]
//! picks training targets and corrupts them:
//!
//! 1. [`probability`] builds a per-position masking probability, flat or
//!    perturbed by importance weights.
//! 2. [`eligibility`] zeroes special tokens, padding and, in whole-word
//!    mode, the continuation pieces found by [`continuation`].
//! 3. [`engine`] draws targets and applies the mask / random / unchanged
//!    substitution, producing labels with [`IGNORE_INDEX`] elsewhere.
//!
//! [`run`] holds the run-file handling behind the `mask` binary.
//!
//! The engine consumes any tokenizer through [`tokenizer::Vocabulary`] and
//! takes its random generator from the caller, so results are reproducible
//! for a fixed seed.

pub mod config;
pub mod continuation;
pub mod eligibility;
pub mod engine;
pub mod errors;
pub mod grid;
pub mod probability;
pub mod run;

#[cfg(test)]
mod test_support;

pub use config::MaskingConfig;
pub use continuation::{word_tails_mask, word_tails_tensor, WordTailsCache};
pub use eligibility::apply_eligibility;
pub use engine::{
    MaskedBatch, MaskedLanguageModeling, MaskingOutput, MaskingSummary, IGNORE_INDEX,
    MASK_REPLACE_PROBABILITY, RANDOM_REPLACE_PROBABILITY,
};
pub use errors::{MaskingError, Result};
pub use grid::{BoolGrid, Grid, ProbabilityGrid, TokenGrid};
pub use probability::{build_probability_matrix, normal_quantile, z_score, ImportanceWeights};
