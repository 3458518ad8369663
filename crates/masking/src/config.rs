//! Engine configuration.
//!
//! [`MaskingConfig`] carries the three knobs of the corruption policy. It can
//! be built in code or loaded from a TOML/JSON file, and is validated before
//! an engine accepts it.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::errors::{MaskingError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Base probability of selecting a token as a training target.
    #[serde(default = "default_mlm_probability")]
    pub mlm_probability: f32,
    /// Two-sided confidence level scaling how far importance weights move
    /// the base probability.
    #[serde(default = "default_reliability")]
    pub reliability: f64,
    /// Keep continuation pieces out of independent sampling.
    #[serde(default)]
    pub whole_word_masking: bool,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            mlm_probability: default_mlm_probability(),
            reliability: default_reliability(),
            whole_word_masking: false,
        }
    }
}

impl MaskingConfig {
    pub fn with_mlm_probability(mut self, probability: f32) -> Self {
        self.mlm_probability = probability;
        self
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn with_whole_word_masking(mut self, enabled: bool) -> Self {
        self.whole_word_masking = enabled;
        self
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: MaskingConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | Some("tml") | None => toml::from_str(&contents)?,
            Some(other) => {
                return Err(MaskingError::ConfigFormat(format!(
                    "unsupported configuration extension '{}'",
                    other
                )));
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.mlm_probability) {
            errors.push(format!(
                "mlm_probability must be within [0, 1], got {}",
                self.mlm_probability
            ));
        }

        if !(self.reliability > 0.0 && self.reliability < 1.0) {
            errors.push(format!(
                "reliability must be within (0, 1), got {}",
                self.reliability
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MaskingError::validation(errors))
        }
    }
}

fn default_mlm_probability() -> f32 {
    0.15
}

fn default_reliability() -> f64 {
    0.05
}
