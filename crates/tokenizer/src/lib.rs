//! WordPiece tokenizer utilities for masked language modeling.
//!
//! This crate assembles BERT-style WordPiece tokenizers configured via
//! [`Config`] and exposes them through the [`Vocabulary`] trait, the narrow
//! capability the masking engine consumes: single-id decoding, vocabulary
//! size, special/mask/pad token ids and the word-continuation convention.
//!
//! # Configuration
//!
//! `Config` describes the WordPiece model (unknown token, continuation
//! prefix, special tokens), the BERT normalizer, an optional `[CLS] $A [SEP]`
//! post-processor, and artifact locations. The loader prefers a bundled
//! `tokenizer.json` when present; otherwise a `vocab.txt` with one token per
//! line is required. Validation ensures every required piece exists before
//! touching the filesystem.
//!
//! # Thread Safety
//!
//! Built tokenizers are validated to be `Send + Sync`, so one instance can be
//! shared across data-loading workers behind an `Arc`.

pub mod config;
pub mod errors;
pub mod vocabulary;

mod artifacts;
mod postprocessor;
mod pretokenizer;
mod types;
mod validate;
mod wordpiece;

pub use artifacts::write_vocab;
pub use config::{ArtifactsCfg, Config, ModelCfg, NormalizerCfg, PostCfg};
pub use errors::{Error, Result};
pub use vocabulary::Vocabulary;
pub use wordpiece::WordPieceTokenizer;

pub fn build_from_artifacts(cfg: &Config) -> Result<WordPieceTokenizer> {
    validate::validate_config(cfg)?;
    let tokenizer = wordpiece::build_from_artifacts(cfg)?;
    validate::validate_tokenizer(&tokenizer, cfg)?;
    WordPieceTokenizer::new(tokenizer, cfg)
}
