use tokenizer::errors::Result as TokenizerResult;
use tokenizer::Vocabulary;

use crate::grid::TokenGrid;

pub const PAD: i64 = 0;
pub const CLS: i64 = 2;
pub const SEP: i64 = 3;
pub const MASK: i64 = 4;

/// In-memory WordPiece-style vocabulary for unit tests.
#[derive(Debug)]
pub struct ToyVocab {
    tokens: Vec<&'static str>,
    mask: Option<u32>,
    pad: Option<u32>,
}

impl ToyVocab {
    pub fn new() -> Self {
        Self {
            tokens: vec![
                "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "how", "are", "you", "man", "?",
                "super", "##star", "##s", "play", "##ing",
            ],
            mask: Some(MASK as u32),
            pad: Some(PAD as u32),
        }
    }

    pub fn without_mask() -> Self {
        Self {
            mask: None,
            ..Self::new()
        }
    }

    pub fn without_pad() -> Self {
        Self {
            pad: None,
            ..Self::new()
        }
    }

    pub fn id(&self, token: &str) -> i64 {
        self.tokens
            .iter()
            .position(|candidate| *candidate == token)
            .map(|idx| idx as i64)
            .unwrap_or(1)
    }

    pub fn batch(&self, rows: &[&[&str]]) -> TokenGrid {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|token| self.id(token)).collect())
            .collect();
        TokenGrid::from_rows(rows).expect("rectangular test batch")
    }
}

impl Vocabulary for ToyVocab {
    fn encode(&self, text: &str, add_special_tokens: bool) -> TokenizerResult<Vec<u32>> {
        let mut ids: Vec<u32> = text
            .split_whitespace()
            .map(|word| self.id(word) as u32)
            .collect();
        if add_special_tokens {
            ids.insert(0, CLS as u32);
            ids.push(SEP as u32);
        }
        Ok(ids)
    }

    fn decode_token(&self, id: u32) -> Option<String> {
        self.tokens.get(id as usize).map(|token| (*token).to_owned())
    }

    fn vocab_size(&self) -> usize {
        self.tokens.len()
    }

    fn mask_token_id(&self) -> Option<u32> {
        self.mask
    }

    fn pad_token_id(&self) -> Option<u32> {
        self.pad
    }

    fn is_special_id(&self, id: u32) -> bool {
        id <= MASK as u32
    }
}
