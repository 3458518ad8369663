use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const MASK_TOKEN: &str = "[MASK]";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelCfg,
    #[serde(default)]
    pub normalizer: NormalizerCfg,
    #[serde(default)]
    pub postprocessor: Option<PostCfg>,
    pub artifacts: ArtifactsCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCfg {
    pub unk_token: String,
    #[serde(default = "default_continuing_subword_prefix")]
    pub continuing_subword_prefix: String,
    #[serde(default = "default_max_input_chars_per_word")]
    pub max_input_chars_per_word: usize,
    pub special_tokens: Vec<String>,
    #[serde(default)]
    pub pad_token: Option<String>,
    #[serde(default)]
    pub mask_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerCfg {
    pub clean_text: bool,
    pub handle_chinese_chars: bool,
    pub strip_accents: Option<bool>,
    pub lowercase: bool,
}

impl Default for NormalizerCfg {
    fn default() -> Self {
        Self {
            clean_text: true,
            handle_chinese_chars: true,
            strip_accents: None,
            lowercase: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCfg {
    pub cls_token: String,
    pub sep_token: String,
    pub pair_template: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsCfg {
    pub dir: PathBuf,
    #[serde(default)]
    pub tokenizer_json: Option<PathBuf>,
    #[serde(default)]
    pub vocab_txt: Option<PathBuf>,
}

impl Config {
    /// Cased BERT layout: `[PAD] [UNK] [CLS] [SEP] [MASK]`, `##` continuations
    /// and `[CLS] $A [SEP]` framing, reading `vocab.txt` from `dir`.
    pub fn bert_cased(dir: impl Into<PathBuf>) -> Self {
        Self {
            model: ModelCfg {
                unk_token: UNK_TOKEN.to_owned(),
                continuing_subword_prefix: default_continuing_subword_prefix(),
                max_input_chars_per_word: default_max_input_chars_per_word(),
                special_tokens: [PAD_TOKEN, UNK_TOKEN, CLS_TOKEN, SEP_TOKEN, MASK_TOKEN]
                    .iter()
                    .map(|token| (*token).to_owned())
                    .collect(),
                pad_token: Some(PAD_TOKEN.to_owned()),
                mask_token: Some(MASK_TOKEN.to_owned()),
            },
            normalizer: NormalizerCfg::default(),
            postprocessor: Some(PostCfg {
                cls_token: CLS_TOKEN.to_owned(),
                sep_token: SEP_TOKEN.to_owned(),
                pair_template: true,
            }),
            artifacts: ArtifactsCfg {
                dir: dir.into(),
                tokenizer_json: None,
                vocab_txt: Some(PathBuf::from("vocab.txt")),
            },
        }
    }

    /// Resolves a relative artifact directory against `base`.
    pub fn apply_base_path(&mut self, base: &Path) {
        if self.artifacts.dir.is_relative() {
            self.artifacts.dir = base.join(&self.artifacts.dir);
        }
    }
}

fn default_continuing_subword_prefix() -> String {
    "##".to_owned()
}

fn default_max_input_chars_per_word() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bert_cased_lists_every_framing_token_as_special() {
        let cfg = Config::bert_cased("artifacts");
        let post = cfg.postprocessor.as_ref().expect("postprocessor");
        for token in [&post.cls_token, &post.sep_token, &cfg.model.unk_token] {
            assert!(cfg.model.special_tokens.contains(token));
        }
        assert_eq!(cfg.model.mask_token.as_deref(), Some(MASK_TOKEN));
        assert!(!cfg.normalizer.lowercase);
    }

    #[test]
    fn base_path_only_rewrites_relative_dirs() {
        let mut relative = Config::bert_cased("artifacts");
        relative.apply_base_path(Path::new("/configs"));
        assert_eq!(relative.artifacts.dir, PathBuf::from("/configs/artifacts"));

        let mut absolute = Config::bert_cased("/opt/vocab");
        absolute.apply_base_path(Path::new("/configs"));
        assert_eq!(absolute.artifacts.dir, PathBuf::from("/opt/vocab"));
    }

    #[test]
    fn model_defaults_fill_missing_fields() {
        let json = r#"{
            "model": { "unk_token": "[UNK]", "special_tokens": ["[UNK]"] },
            "artifacts": { "dir": "." }
        }"#;
        let cfg: Config = serde_json::from_str(json).expect("parse");
        assert_eq!(cfg.model.continuing_subword_prefix, "##");
        assert_eq!(cfg.model.max_input_chars_per_word, 100);
        assert!(cfg.postprocessor.is_none());
        assert!(cfg.normalizer.clean_text);
    }
}
