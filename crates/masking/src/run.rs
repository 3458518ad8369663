//! Run configuration and helpers behind the `mask` command-line tool.
//!
//! A run file bundles a [`MaskingConfig`], a [`tokenizer::Config`] whose
//! artifact paths resolve against the run file's directory, and a default
//! seed. Dot-path overrides are applied to the file's JSON form before
//! deserializing it again.

use std::{fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tokenizer::Vocabulary;

use crate::config::MaskingConfig;
use crate::engine::IGNORE_INDEX;
use crate::errors::{MaskingError, Result};
use crate::grid::TokenGrid;
use crate::probability::ImportanceWeights;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub masking: MaskingConfig,
    pub tokenizer: tokenizer::Config,
    #[serde(default)]
    pub seed: u64,
}

impl RunConfig {
    /// Loads a `.json` or TOML run file and anchors relative artifact
    /// directories at the file's parent.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: RunConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            _ => toml::from_str(&contents)?,
        };
        if let Some(base) = path.parent() {
            config.tokenizer.apply_base_path(base);
        }
        Ok(config)
    }

    pub fn apply_overrides(self, overrides: &[OverrideArg]) -> Result<Self> {
        let mut value = serde_json::to_value(self)?;
        for override_arg in overrides {
            let new_value = parse_override_value(&override_arg.value);
            set_value_at_path(&mut value, &override_arg.path, new_value)?;
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// `KEY=VALUE` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideArg {
    pub path: String,
    pub value: String,
}

impl FromStr for OverrideArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| "override must be in the form key=value".to_string())?;
        if path.trim().is_empty() {
            return Err("override key must not be empty".into());
        }
        Ok(Self {
            path: path.trim().to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Interprets an override value as a bool, null, number or inline JSON,
/// falling back to a string.
pub fn parse_override_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if trimmed.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(int_val) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(int_val));
    }
    if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(json_val) = serde_json::from_str::<Value>(trimmed) {
            return json_val;
        }
    }
    Value::String(trimmed.to_string())
}

/// Sets `path` (dot separated) inside `value`, creating missing objects.
pub fn set_value_at_path(value: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(MaskingError::ConfigFormat(format!(
            "invalid override path '{}'",
            path
        )));
    }
    let Some((last, parents)) = segments.split_last() else {
        return Err(MaskingError::ConfigFormat(
            "override path must not be empty".into(),
        ));
    };

    let mut current = value;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }
        let map = current.as_object_mut().ok_or_else(|| {
            MaskingError::ConfigFormat(format!(
                "override path segment '{}' points into a non-object value",
                segment
            ))
        })?;
        current = map.entry(segment.to_string()).or_insert(Value::Null);
    }

    if current.is_null() {
        *current = Value::Object(serde_json::Map::new());
    }
    let map = current.as_object_mut().ok_or_else(|| {
        MaskingError::ConfigFormat(format!(
            "override path '{}' points into a non-object value",
            path
        ))
    })?;
    map.insert(last.to_string(), new_value);
    Ok(())
}

/// Encodes every sentence with special tokens and right-pads to the longest.
pub fn encode_batch<V: Vocabulary + ?Sized, S: AsRef<str>>(
    vocab: &V,
    sentences: &[S],
) -> Result<TokenGrid> {
    let mut rows = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let ids = vocab.encode(sentence.as_ref(), true)?;
        rows.push(ids.into_iter().map(i64::from).collect::<Vec<_>>());
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.iter().any(|row| row.len() != width) {
        let pad = vocab.pad_token_id().ok_or_else(|| {
            MaskingError::validation(vec![
                "sentences encode to different lengths and the tokenizer has no pad token"
                    .to_string(),
            ])
        })?;
        for row in rows.iter_mut() {
            row.resize(width, i64::from(pad));
        }
    }

    TokenGrid::from_rows(rows)
}

/// Reads a JSON array holding one weight per vocabulary id.
pub fn load_weights(path: &Path) -> Result<ImportanceWeights> {
    let contents = fs::read_to_string(path)?;
    let table: Vec<f32> = serde_json::from_str(&contents)?;
    Ok(ImportanceWeights::PerToken(table))
}

pub fn render_tokens<V: Vocabulary + ?Sized>(vocab: &V, ids: &[i64]) -> String {
    ids.iter()
        .map(|&id| {
            u32::try_from(id)
                .ok()
                .and_then(|id| vocab.decode_token(id))
                .unwrap_or_else(|| format!("<{}>", id))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Like [`render_tokens`], with `-` for ignored positions.
pub fn render_labels<V: Vocabulary + ?Sized>(vocab: &V, labels: &[i64]) -> String {
    labels
        .iter()
        .map(|&label| {
            if label == IGNORE_INDEX {
                "-".to_string()
            } else {
                render_tokens(vocab, &[label])
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
