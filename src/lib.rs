//! Masked-language-modeling corruption for WordPiece-tokenized batches.
//!
//! The workspace is split in two: [`tokenizer`] builds BERT-style WordPiece
//! tokenizers and defines the [`Vocabulary`] capability, and [`masking`]
//! turns token batches into corrupted inputs plus loss labels.

pub use masking;
pub use tokenizer;

pub use masking::{MaskedBatch, MaskedLanguageModeling, MaskingConfig, MaskingError, IGNORE_INDEX};
pub use tokenizer::{Vocabulary, WordPieceTokenizer};
