//! Target sampling and the three-way substitution policy.
//!
//! Every call runs the same pipeline: validate, build the probability
//! matrix, filter ineligible positions, draw targets, then corrupt the
//! targets. Eighty percent become the mask token, half of the rest become a
//! uniformly drawn vocabulary id, and the remainder keep their original id.
//! Labels carry the original id at targets and [`IGNORE_INDEX`] elsewhere.

use candle_core::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokenizer::Vocabulary;

use crate::config::MaskingConfig;
use crate::continuation::word_tails_mask;
use crate::eligibility::apply_eligibility;
use crate::errors::{MaskingError, Result};
use crate::grid::{BoolGrid, ProbabilityGrid, TokenGrid};
use crate::probability::{build_probability_matrix, ImportanceWeights};

/// Label value for positions excluded from the loss.
pub const IGNORE_INDEX: i64 = -100;
/// Share of targets replaced with the mask token.
pub const MASK_REPLACE_PROBABILITY: f64 = 0.8;
/// Share of the remaining targets replaced with a random id.
pub const RANDOM_REPLACE_PROBABILITY: f64 = 0.5;

/// Counts describing one corrupted batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskingSummary {
    pub positions: usize,
    pub eligible: usize,
    pub targets: usize,
    pub masked: usize,
    pub randomized: usize,
    pub unchanged: usize,
}

impl MaskingSummary {
    /// Fraction of all positions selected as targets.
    pub fn target_rate(&self) -> f64 {
        if self.positions == 0 {
            0.0
        } else {
            self.targets as f64 / self.positions as f64
        }
    }
}

/// Result of [`MaskedLanguageModeling::mask_in_place`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaskingOutput {
    pub labels: TokenGrid,
    pub summary: MaskingSummary,
}

/// Result of the tensor API: fresh `I64` tensors on the input's device.
#[derive(Debug, Clone)]
pub struct MaskedBatch {
    pub input_ids: Tensor,
    pub labels: Tensor,
    pub summary: MaskingSummary,
}

/// Masked-language-modeling corruption over a vocabulary.
///
/// The engine holds no mutable state. Randomness always comes from the
/// caller, so workers can share one engine and keep their own generators.
#[derive(Debug, Clone)]
pub struct MaskedLanguageModeling<V> {
    vocab: V,
    config: MaskingConfig,
}

impl<V: Vocabulary> MaskedLanguageModeling<V> {
    pub fn new(vocab: V, config: MaskingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { vocab, config })
    }

    pub fn config(&self) -> &MaskingConfig {
        &self.config
    }

    pub fn vocab(&self) -> &V {
        &self.vocab
    }

    /// Filtered per-position probabilities used for target sampling.
    pub fn probability_matrix(
        &self,
        tokens: &TokenGrid,
        weights: Option<&ImportanceWeights>,
        word_tails: Option<&BoolGrid>,
    ) -> Result<ProbabilityGrid> {
        let (probabilities, _) = self.prepare(tokens, weights, word_tails)?;
        Ok(probabilities)
    }

    /// Corrupts `tokens` in place and returns the labels.
    ///
    /// Nothing is drawn from `rng` and `tokens` is left untouched when any
    /// check fails.
    pub fn mask_in_place<R: Rng + ?Sized>(
        &self,
        tokens: &mut TokenGrid,
        weights: Option<&ImportanceWeights>,
        word_tails: Option<&BoolGrid>,
        rng: &mut R,
    ) -> Result<MaskingOutput> {
        let (mask_id, vocab_size) = self.substitution_ids()?;
        let (probabilities, eligible) = self.prepare(tokens, weights, word_tails)?;

        // Draw every pass over the full shape so generator consumption
        // depends only on the batch shape.
        let targets: Vec<bool> = probabilities
            .iter()
            .map(|&p| rng.gen_bool(f64::from(p)))
            .collect();
        let mask_branch: Vec<bool> = (0..targets.len())
            .map(|_| rng.gen_bool(MASK_REPLACE_PROBABILITY))
            .collect();
        let random_branch: Vec<bool> = (0..targets.len())
            .map(|_| rng.gen_bool(RANDOM_REPLACE_PROBABILITY))
            .collect();
        let random_ids: Vec<i64> = (0..targets.len())
            .map(|_| rng.gen_range(0..vocab_size) as i64)
            .collect();

        let mut summary = MaskingSummary {
            positions: tokens.len(),
            eligible,
            ..MaskingSummary::default()
        };
        let mut labels = Vec::with_capacity(tokens.len());
        for (index, token) in tokens.as_mut_slice().iter_mut().enumerate() {
            if !targets[index] {
                labels.push(IGNORE_INDEX);
                continue;
            }
            labels.push(*token);
            summary.targets += 1;
            if mask_branch[index] {
                *token = mask_id;
                summary.masked += 1;
            } else if random_branch[index] {
                *token = random_ids[index];
                summary.randomized += 1;
            } else {
                summary.unchanged += 1;
            }
        }

        log::debug!(
            "masked batch {:?}: {} eligible, {} targets ({} mask, {} random, {} unchanged)",
            tokens.shape(),
            summary.eligible,
            summary.targets,
            summary.masked,
            summary.randomized,
            summary.unchanged
        );

        Ok(MaskingOutput {
            labels: TokenGrid::new(labels, tokens.shape())?,
            summary,
        })
    }

    /// Tensor API. `inputs` is a rank-2 integer tensor; `weights` is either
    /// a per-token table (rank 1) or per-position weights (rank 2);
    /// `word_tails` is a rank-2 mask where non-zero marks a continuation.
    /// The caller's tensors are never modified.
    pub fn mask_tokens<R: Rng + ?Sized>(
        &self,
        inputs: &Tensor,
        weights: Option<&Tensor>,
        word_tails: Option<&Tensor>,
        rng: &mut R,
    ) -> Result<MaskedBatch> {
        self.substitution_ids()?;
        let mut tokens = TokenGrid::from_tensor(inputs)?;
        let weights = weights.map(ImportanceWeights::from_tensor).transpose()?;
        let word_tails = word_tails.map(BoolGrid::from_tensor).transpose()?;

        let output = self.mask_in_place(&mut tokens, weights.as_ref(), word_tails.as_ref(), rng)?;
        let device = inputs.device();
        Ok(MaskedBatch {
            input_ids: tokens.to_tensor(device)?,
            labels: output.labels.to_tensor(device)?,
            summary: output.summary,
        })
    }

    /// [`Self::mask_tokens`] with a fresh `StdRng` seeded from `seed`.
    pub fn mask_tokens_seeded(
        &self,
        inputs: &Tensor,
        weights: Option<&Tensor>,
        word_tails: Option<&Tensor>,
        seed: u64,
    ) -> Result<MaskedBatch> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.mask_tokens(inputs, weights, word_tails, &mut rng)
    }

    fn substitution_ids(&self) -> Result<(i64, usize)> {
        let mask_id = self
            .vocab
            .mask_token_id()
            .ok_or(MaskingError::MissingMaskToken)?;
        let vocab_size = self.vocab.vocab_size();
        if vocab_size == 0 {
            return Err(MaskingError::EmptyVocabulary);
        }
        Ok((i64::from(mask_id), vocab_size))
    }

    fn prepare(
        &self,
        tokens: &TokenGrid,
        weights: Option<&ImportanceWeights>,
        word_tails: Option<&BoolGrid>,
    ) -> Result<(ProbabilityGrid, usize)> {
        tokens.ensure_token_ids()?;
        if let Some(tails) = word_tails {
            tails.ensure_shape(tokens.shape(), "word continuation mask")?;
        }

        let computed;
        let tails = match (self.config.whole_word_masking, word_tails) {
            (false, _) => None,
            (true, Some(tails)) => Some(tails),
            (true, None) => {
                computed = word_tails_mask(tokens, &self.vocab)?;
                Some(&computed)
            }
        };

        let mut probabilities = build_probability_matrix(tokens, weights, &self.config)?;
        let eligible = apply_eligibility(&mut probabilities, tokens, &self.vocab, tails)?;
        Ok((probabilities, eligible))
    }
}
