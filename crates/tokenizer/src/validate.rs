use crate::config::Config;
use crate::errors::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokenizers::Tokenizer;

pub fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.model.unk_token.is_empty() {
        return Err(Error::InvalidConfig("model.unk_token must not be empty"));
    }

    if cfg.model.continuing_subword_prefix.is_empty() {
        return Err(Error::InvalidConfig(
            "model.continuing_subword_prefix must not be empty",
        ));
    }

    if cfg.model.max_input_chars_per_word == 0 {
        return Err(Error::InvalidConfig(
            "model.max_input_chars_per_word must be greater than zero",
        ));
    }

    let mut seen = HashSet::new();
    for token in &cfg.model.special_tokens {
        if !seen.insert(token) {
            return Err(Error::Validation(format!(
                "special token '{token}' appears multiple times"
            )));
        }
    }

    let mut required = vec![("model.unk_token", &cfg.model.unk_token)];
    if let Some(pad) = &cfg.model.pad_token {
        required.push(("model.pad_token", pad));
    }
    if let Some(mask) = &cfg.model.mask_token {
        required.push(("model.mask_token", mask));
    }
    if let Some(post) = &cfg.postprocessor {
        required.push(("postprocessor.cls_token", &post.cls_token));
        required.push(("postprocessor.sep_token", &post.sep_token));
    }
    for (field, token) in required {
        if !seen.contains(token) {
            return Err(Error::Validation(format!(
                "{field} '{token}' must be listed in model.special_tokens"
            )));
        }
    }

    ensure_directory_exists(cfg.artifacts.dir.as_path())
}

/// Every configured special token must already be a model vocabulary entry.
///
/// Runs before the specials are registered as added tokens, which would
/// otherwise hand a missing token a fresh id.
pub fn validate_model_vocab(vocab: &HashMap<String, u32>, cfg: &Config) -> Result<()> {
    if vocab.is_empty() {
        return Err(Error::Validation("vocab_txt contains no tokens".into()));
    }

    for token in &cfg.model.special_tokens {
        if !vocab.contains_key(token) {
            return Err(Error::Validation(format!(
                "expected special token '{token}' to be present in vocab_txt"
            )));
        }
    }

    Ok(())
}

pub fn validate_tokenizer(tok: &Tokenizer, cfg: &Config) -> Result<()> {
    for token in &cfg.model.special_tokens {
        if tok.token_to_id(token).is_none() {
            return Err(Error::Validation(format!(
                "expected special token '{token}' to be present in tokenizer vocab"
            )));
        }
    }

    if tok.get_vocab_size(true) == 0 {
        return Err(Error::Validation("tokenizer vocabulary is empty".into()));
    }

    Ok(())
}

fn ensure_directory_exists(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    if dir.exists() {
        return Err(Error::Validation(format!(
            "artifact directory path '{}' exists but is not a directory",
            dir.display()
        )));
    }

    Err(Error::Validation(format!(
        "artifact directory '{}' does not exist",
        dir.display()
    )))
}
