//! Capability surface consumed by the masking engine.
//!
//! The engine never depends on a concrete vocabulary. Anything that can map
//! a single id back to its surface form, report its size, and identify the
//! mask, pad and special tokens can drive it, provided continuation pieces
//! follow a consistent prefix convention.

use std::sync::Arc;

use crate::errors::Result;

/// Narrow view of a tokenizer needed to corrupt token batches.
pub trait Vocabulary {
    /// Encodes `text`, optionally framing it with the tokenizer's special tokens.
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>>;

    /// Surface form of a single id, `None` when the id is outside the vocabulary.
    fn decode_token(&self, id: u32) -> Option<String>;

    /// Number of ids the vocabulary can produce, added tokens included.
    fn vocab_size(&self) -> usize;

    fn mask_token_id(&self) -> Option<u32>;

    fn pad_token_id(&self) -> Option<u32>;

    fn is_special_id(&self, id: u32) -> bool;

    /// Marker carried by pieces that continue the previous word.
    fn continuation_prefix(&self) -> &str {
        "##"
    }

    /// Per-position special-token classification of `ids`.
    fn special_tokens_mask(&self, ids: &[u32]) -> Vec<bool> {
        ids.iter().map(|&id| self.is_special_id(id)).collect()
    }

    fn is_continuation(&self, id: u32) -> bool {
        self.decode_token(id)
            .map(|token| token.starts_with(self.continuation_prefix()))
            .unwrap_or(false)
    }
}

impl<T: Vocabulary + ?Sized> Vocabulary for &T {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>> {
        (**self).encode(text, add_special_tokens)
    }

    fn decode_token(&self, id: u32) -> Option<String> {
        (**self).decode_token(id)
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn mask_token_id(&self) -> Option<u32> {
        (**self).mask_token_id()
    }

    fn pad_token_id(&self) -> Option<u32> {
        (**self).pad_token_id()
    }

    fn is_special_id(&self, id: u32) -> bool {
        (**self).is_special_id(id)
    }

    fn continuation_prefix(&self) -> &str {
        (**self).continuation_prefix()
    }
}

impl<T: Vocabulary + ?Sized> Vocabulary for Arc<T> {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>> {
        (**self).encode(text, add_special_tokens)
    }

    fn decode_token(&self, id: u32) -> Option<String> {
        (**self).decode_token(id)
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn mask_token_id(&self) -> Option<u32> {
        (**self).mask_token_id()
    }

    fn pad_token_id(&self) -> Option<u32> {
        (**self).pad_token_id()
    }

    fn is_special_id(&self, id: u32) -> bool {
        (**self).is_special_id(id)
    }

    fn continuation_prefix(&self) -> &str {
        (**self).continuation_prefix()
    }
}
