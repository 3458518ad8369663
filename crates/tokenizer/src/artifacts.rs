use crate::config::{ArtifactsCfg, ModelCfg};
use crate::errors::{Error, Result};
use crate::types::ArtifactPaths;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::Tokenizer;

const TOKENIZER_JSON_ERR: &str = "tokenizer json not found at";
const VOCAB_TXT_ERR: &str = "vocab txt not found at";

pub fn load_tokenizer_from_json(path: &Path) -> Result<Tokenizer> {
    ensure_file(path, TOKENIZER_JSON_ERR)?;
    Tokenizer::from_file(path).map_err(Error::from)
}

pub fn load_wordpiece_from_vocab(vocab: &Path, model: &ModelCfg) -> Result<WordPiece> {
    ensure_file(vocab, VOCAB_TXT_ERR)?;
    let vocab_str = path_to_string(vocab)?;

    WordPiece::from_file(&vocab_str)
        .unk_token(model.unk_token.clone())
        .continuing_subword_prefix(model.continuing_subword_prefix.clone())
        .max_input_chars_per_word(model.max_input_chars_per_word)
        .build()
        .map_err(Error::from)
}

/// Writes a WordPiece `vocab.txt`: one token per line, ids follow line order.
pub fn write_vocab<S: AsRef<str>>(path: &Path, tokens: &[S]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for token in tokens {
        let token = token.as_ref();
        if token.is_empty() || token.contains('\n') {
            return Err(Error::Validation(format!(
                "vocab entry {token:?} must be a non-empty single line"
            )));
        }
        writeln!(writer, "{token}")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn resolve_paths(cfg: &ArtifactsCfg) -> Result<ArtifactPaths> {
    let dir = cfg.dir.as_path();
    if !dir.is_dir() {
        return Err(Error::Artifact(format!(
            "artifact directory not found at {}",
            dir.display()
        )));
    }

    let resolve = |value: Option<PathBuf>| -> Option<PathBuf> {
        value.map(|path| {
            if path.is_absolute() {
                path
            } else {
                dir.join(path)
            }
        })
    };

    let configured = ArtifactPaths::from(cfg);
    let json = resolve(configured.json);
    let vocab = resolve(configured.vocab);

    if let Some(ref path) = json {
        ensure_file(path, TOKENIZER_JSON_ERR)?;
    } else {
        match vocab {
            Some(ref path) => ensure_file(path, VOCAB_TXT_ERR)?,
            None => {
                return Err(Error::Artifact(
                    "artifacts must specify either tokenizer_json or vocab_txt".into(),
                ));
            }
        }
    }

    Ok(ArtifactPaths { json, vocab })
}

fn ensure_file(path: &Path, context: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Artifact(format!("{context} {}", path.display())))
    }
}

fn path_to_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(|s| s.to_owned())
        .ok_or_else(|| Error::Artifact(format!("path is not valid UTF-8: {}", path.display())))
}
