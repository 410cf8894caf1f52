//! Walkthrough configuration stored in `breakthrough.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::CallSettings;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "breakthrough.toml";

/// Walkthrough configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BreakthroughConfig {
    /// Directory the document tree is loaded from and written to.
    pub project_dir: PathBuf,

    /// Optional file holding a prepared domain/challenge description.
    pub vision_file: PathBuf,

    /// Token limit for stage calls.
    pub max_tokens: u32,

    /// Token limit for clarification questions.
    pub clarify_max_tokens: u32,

    pub temperature: f32,

    /// Wall-clock limit for one generation command.
    pub request_timeout_secs: u64,

    /// Truncate generation output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Generation backends keyed by the model name given on the command line.
    pub models: BTreeMap<String, ModelConfig>,
}

/// How a request is written to a model command's stdin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestFormat {
    /// Role-labelled plain text.
    #[default]
    Text,
    /// The full request as one JSON object.
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    /// Command to execute, e.g. `["llm", "-m", "claude-3.7-sonnet"]`.
    pub command: Vec<String>,

    #[serde(default)]
    pub format: RequestFormat,

    /// Per-model override of the top-level `max_tokens`.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Enables extended reasoning when present.
    #[serde(default)]
    pub thinking: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ThinkingConfig {
    /// Requested reasoning budget; derived from `max_tokens` when unset.
    #[serde(default)]
    pub budget_tokens: Option<u32>,
}

impl Default for BreakthroughConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            "claude37sonnet".to_string(),
            ModelConfig {
                command: vec![
                    "llm".to_string(),
                    "-m".to_string(),
                    "claude-3.7-sonnet".to_string(),
                ],
                format: RequestFormat::Text,
                max_tokens: None,
                thinking: None,
            },
        );
        models.insert(
            "deepseekr1".to_string(),
            ModelConfig {
                command: vec![
                    "llm".to_string(),
                    "-m".to_string(),
                    "deepseek-reasoner".to_string(),
                ],
                format: RequestFormat::Text,
                max_tokens: Some(8000),
                thinking: None,
            },
        );

        Self {
            project_dir: PathBuf::from("some_project"),
            vision_file: PathBuf::from("user_prompt.txt"),
            max_tokens: 2048,
            clarify_max_tokens: 1024,
            temperature: 0.0,
            request_timeout_secs: 10 * 60,
            output_limit_bytes: 1_000_000,
            models,
        }
    }
}

impl BreakthroughConfig {
    pub fn validate(&self) -> Result<()> {
        if self.project_dir.as_os_str().is_empty() {
            return Err(anyhow!("project_dir must not be empty"));
        }
        if self.max_tokens == 0 || self.clarify_max_tokens == 0 {
            return Err(anyhow!("max_tokens and clarify_max_tokens must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be within 0.0..=2.0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        for (name, model) in &self.models {
            if model.command.is_empty() || model.command[0].trim().is_empty() {
                return Err(anyhow!("models.{name}.command must be a non-empty array"));
            }
            if model.max_tokens == Some(0) {
                return Err(anyhow!("models.{name}.max_tokens must be > 0"));
            }
        }
        Ok(())
    }

    /// Look up a model by name, case-insensitively.
    pub fn model(&self, name: &str) -> Result<(&str, &ModelConfig)> {
        let wanted = name.to_lowercase();
        self.models
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(key, model)| (key.as_str(), model))
            .ok_or_else(|| {
                let known: Vec<&str> = self.models.keys().map(String::as_str).collect();
                anyhow!("unknown model '{name}' (configured: {})", known.join(", "))
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Generation settings for a run against `model`.
    pub fn call_settings(&self, model: &ModelConfig) -> CallSettings {
        CallSettings {
            max_tokens: model.max_tokens.unwrap_or(self.max_tokens),
            clarify_max_tokens: self.clarify_max_tokens,
            temperature: self.temperature,
            thinking_budget: model.thinking.as_ref().map(|t| t.budget_tokens),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BreakthroughConfig::default()`.
pub fn load_config(path: &Path) -> Result<BreakthroughConfig> {
    if !path.exists() {
        let cfg = BreakthroughConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BreakthroughConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, BreakthroughConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("breakthrough.toml");
        fs::write(
            &path,
            r#"
project_dir = "ideas"
temperature = 0.7

[models.local]
command = ["ollama", "run", "llama3"]
format = "json"
thinking = { budget_tokens = 2000 }
"#,
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.project_dir, PathBuf::from("ideas"));
        assert_eq!(cfg.max_tokens, 2048);
        assert_eq!(cfg.vision_file, PathBuf::from("user_prompt.txt"));

        let (name, model) = cfg.model("LOCAL").expect("model");
        assert_eq!(name, "local");
        assert_eq!(model.format, RequestFormat::Json);
        let settings = cfg.call_settings(model);
        assert_eq!(settings.thinking_budget, Some(Some(2000)));
        assert!((settings.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn defaults_define_both_builtin_models() {
        let cfg = BreakthroughConfig::default();
        assert!(cfg.model("claude37sonnet").is_ok());
        let (_, deepseek) = cfg.model("DeepSeekR1").expect("deepseek");
        assert_eq!(cfg.call_settings(deepseek).max_tokens, 8000);
    }

    #[test]
    fn unknown_model_lists_configured_names() {
        let err = BreakthroughConfig::default()
            .model("gpt-0")
            .expect_err("unknown model");
        let message = err.to_string();
        assert!(message.contains("gpt-0"));
        assert!(message.contains("claude37sonnet"));
    }

    #[test]
    fn empty_model_command_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("breakthrough.toml");
        fs::write(&path, "[models.broken]\ncommand = []\n").expect("write");
        assert!(load_config(&path).is_err());
    }
}
