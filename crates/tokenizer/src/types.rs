use crate::config::ArtifactsCfg;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub json: Option<PathBuf>,
    pub vocab: Option<PathBuf>,
}

impl From<&ArtifactsCfg> for ArtifactPaths {
    fn from(cfg: &ArtifactsCfg) -> Self {
        Self {
            json: cfg.tokenizer_json.clone(),
            vocab: cfg.vocab_txt.clone(),
        }
    }
}
