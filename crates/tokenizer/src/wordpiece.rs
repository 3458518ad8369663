use crate::artifacts::{load_tokenizer_from_json, load_wordpiece_from_vocab, resolve_paths};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::postprocessor::build_template;
use crate::pretokenizer::{build_decoder, build_normalizer, build_pre_tokenizer};
use crate::types::ArtifactPaths;
use crate::validate::validate_model_vocab;
use crate::vocabulary::Vocabulary;
use std::collections::{HashMap, HashSet};
use tokenizers::tokenizer::AddedToken;
use tokenizers::{Model, Tokenizer};

pub fn build_from_artifacts(cfg: &Config) -> Result<Tokenizer> {
    let ArtifactPaths { json, vocab } = resolve_paths(&cfg.artifacts)?;

    if let Some(json_path) = json {
        return load_tokenizer_from_json(&json_path);
    }

    let vocab_path = vocab.ok_or_else(|| {
        Error::Artifact("vocab_txt path is required when tokenizer_json is absent".into())
    })?;

    let wordpiece = load_wordpiece_from_vocab(&vocab_path, &cfg.model)?;
    validate_model_vocab(&wordpiece.get_vocab(), cfg)?;
    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(build_normalizer(&cfg.normalizer)));
    tokenizer.with_pre_tokenizer(Some(build_pre_tokenizer()));
    tokenizer.with_decoder(Some(build_decoder(&cfg.model)));

    let added: Vec<AddedToken> = cfg
        .model
        .special_tokens
        .iter()
        .cloned()
        .map(|token| AddedToken::from(token, true))
        .collect();
    tokenizer.add_special_tokens(&added);

    if let Some(post_cfg) = cfg.postprocessor.as_ref() {
        let special_ids = special_token_ids(&tokenizer, cfg);
        tokenizer.with_post_processor(Some(build_template(post_cfg, &special_ids)?));
    }

    ensure_send_sync(&tokenizer);

    Ok(tokenizer)
}

fn special_token_ids(tokenizer: &Tokenizer, cfg: &Config) -> HashMap<String, u32> {
    let mut special_ids = HashMap::new();
    for token in &cfg.model.special_tokens {
        if let Some(id) = tokenizer.token_to_id(token) {
            special_ids.insert(token.clone(), id);
        }
    }
    special_ids
}

fn ensure_send_sync<T: Send + Sync>(_: &T) {}

/// WordPiece tokenizer paired with the special-token bookkeeping the masking
/// engine needs.
#[derive(Debug, Clone)]
pub struct WordPieceTokenizer {
    inner: Tokenizer,
    special_ids: HashSet<u32>,
    mask_token_id: Option<u32>,
    pad_token_id: Option<u32>,
    vocab_size: usize,
    continuation_prefix: String,
}

impl WordPieceTokenizer {
    pub fn new(inner: Tokenizer, cfg: &Config) -> Result<Self> {
        let special_ids = special_token_ids(&inner, cfg).into_values().collect();
        let lookup = |name: &Option<String>| -> Result<Option<u32>> {
            match name {
                Some(token) => inner.token_to_id(token).map(Some).ok_or_else(|| {
                    Error::Validation(format!("token '{token}' is missing from the vocabulary"))
                }),
                None => Ok(None),
            }
        };
        let mask_token_id = lookup(&cfg.model.mask_token)?;
        let pad_token_id = lookup(&cfg.model.pad_token)?;
        // Added tokens usually alias vocab entries, so count distinct ids.
        let vocab_size = inner.get_vocab(true).len();

        Ok(Self {
            inner,
            special_ids,
            mask_token_id,
            pad_token_id,
            vocab_size,
            continuation_prefix: cfg.model.continuing_subword_prefix.clone(),
        })
    }

    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    /// Decodes a full id sequence back to text.
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String> {
        self.inner
            .decode(ids, skip_special_tokens)
            .map_err(Error::from)
    }
}

impl Vocabulary for WordPieceTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<u32>> {
        let encoding = self.inner.encode(text, add_special_tokens)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode_token(&self, id: u32) -> Option<String> {
        self.inner.id_to_token(id)
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn mask_token_id(&self) -> Option<u32> {
        self.mask_token_id
    }

    fn pad_token_id(&self) -> Option<u32> {
        self.pad_token_id
    }

    fn is_special_id(&self, id: u32) -> bool {
        self.special_ids.contains(&id)
    }

    fn continuation_prefix(&self) -> &str {
        &self.continuation_prefix
    }
}
