use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::clean::{CleanOptions, InvalidRowPolicy, NullTokens};
use crate::error::PipelineError;

fn default_input() -> String {
    "data/*.csv".into()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_null_tokens() -> Vec<String> {
    ["", "NULL", "null", "N/A"].map(String::from).to_vec()
}

fn default_top_n() -> i64 {
    10
}

/// Pipeline settings, read from YAML. Every key is optional.
///
/// ```yaml
/// input: data/*.csv
/// out_dir: output
/// on_invalid_row: skip
/// null_tokens: ["", "NULL"]
/// top_n: 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default)]
    pub on_invalid_row: InvalidRowPolicy,
    #[serde(default = "default_null_tokens")]
    pub null_tokens: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input: default_input(),
            out_dir: default_out_dir(),
            on_invalid_row: InvalidRowPolicy::default(),
            null_tokens: default_null_tokens(),
            top_n: default_top_n(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: PipelineConfig = serde_yaml::from_str(text).context("parsing pipeline config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        if self.input.trim().is_empty() {
            return Err(PipelineError::Config("input must not be empty".into()));
        }
        if self.top_n <= 0 {
            return Err(PipelineError::Config(format!(
                "top_n must be a positive integer, got {}",
                self.top_n
            )));
        }
        Ok(())
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            on_invalid_row: self.on_invalid_row,
            null_tokens: NullTokens::new(self.null_tokens.iter().cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() -> Result<()> {
        let cfg = PipelineConfig::from_yaml_str("{}")?;
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.on_invalid_row, InvalidRowPolicy::Abort);
        Ok(())
    }

    #[test]
    fn reads_overrides() -> Result<()> {
        let cfg = PipelineConfig::from_yaml_str(
            "input: sales/*.csv\nout_dir: out\non_invalid_row: skip\nnull_tokens: ['-']\ntop_n: 3\n",
        )?;
        assert_eq!(cfg.input, "sales/*.csv");
        assert_eq!(cfg.out_dir, PathBuf::from("out"));
        assert_eq!(cfg.on_invalid_row, InvalidRowPolicy::Skip);
        assert_eq!(cfg.null_tokens, vec!["-".to_string()]);
        assert_eq!(cfg.top_n, 3);
        Ok(())
    }

    #[test]
    fn rejects_bad_values() {
        assert!(PipelineConfig::from_yaml_str("top_n: 0").is_err());
        assert!(PipelineConfig::from_yaml_str("input: ''").is_err());
        assert!(PipelineConfig::from_yaml_str("on_invalid_row: maybe").is_err());
        assert!(PipelineConfig::from_yaml_str("unknown_key: 1").is_err());
    }
}
