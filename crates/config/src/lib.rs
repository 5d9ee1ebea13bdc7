//! Configuration loading, validation, and management for AskPaper.
//!
//! Loads configuration from `~/.askpaper/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.askpaper/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Providers tried in order when the default one fails
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_providers: Vec<String>,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Context budgeting and answer fusion settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Offline inspection dumps
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("fallback_providers", &self.fallback_providers)
            .field("providers", &self.providers)
            .field("pipeline", &self.pipeline)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Token budgeting, fan-out and fusion settings for answering a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Hard context ceiling of the model (prompt + completion).
    #[serde(default = "default_llm_max_tokens")]
    pub llm_max_tokens: usize,

    /// Maximum number of chunks sent to the model. Extra chunks are dropped.
    #[serde(default = "default_max_contexts")]
    pub max_contexts: usize,

    /// Initial number of tokens reserved for each chunk answer.
    #[serde(default = "default_completion_reserve")]
    pub completion_reserve: usize,

    /// How much the completion reserve shrinks per budget-search round.
    #[serde(default = "default_completion_reserve_step")]
    pub completion_reserve_step: usize,

    /// How much the per-chunk budget shrinks per budget-search round.
    #[serde(default = "default_context_budget_step")]
    pub context_budget_step: usize,

    /// Tokens shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Lower bound on the completion budget of the fusion call.
    #[serde(default = "default_fusion_min_completion")]
    pub fusion_min_completion: usize,

    /// Number of sections kept for trade-off levels 1, 2, ... Level 0 never filters.
    #[serde(default = "default_trade_off_sections")]
    pub trade_off_sections: Vec<usize>,

    /// Section label fragments that are always stripped before rendering.
    #[serde(default = "default_excluded_sections")]
    pub excluded_sections: Vec<String>,

    /// What the model answers when a chunk cannot answer the question.
    #[serde(default = "default_not_enough_info_answer")]
    pub not_enough_info_answer: String,
}

fn default_llm_max_tokens() -> usize {
    4000
}
fn default_max_contexts() -> usize {
    7
}
fn default_completion_reserve() -> usize {
    700
}
fn default_completion_reserve_step() -> usize {
    60
}
fn default_context_budget_step() -> usize {
    200
}
fn default_chunk_overlap() -> usize {
    20
}
fn default_fusion_min_completion() -> usize {
    1000
}
fn default_trade_off_sections() -> Vec<usize> {
    vec![20, 14, 8, 3]
}
fn default_excluded_sections() -> Vec<String> {
    ["reference", "acknow", "appendi", "decl", "supp", "funding"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_not_enough_info_answer() -> String {
    "Not enough information to answer this request.".into()
}

impl PipelineConfig {
    /// Highest accepted trade-off level.
    pub fn max_trade_off(&self) -> usize {
        self.trade_off_sections.len()
    }

    /// Number of sections to keep for a trade-off level.
    ///
    /// `Some(None)` means "no relevance filtering", `None` means the level
    /// is outside the table.
    pub fn top_k_sections(&self, level: usize) -> Option<Option<usize>> {
        match level {
            0 => Some(None),
            n => self.trade_off_sections.get(n - 1).map(|k| Some(*k)),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_max_tokens <= self.completion_reserve {
            return Err(ConfigError::ValidationError(
                "pipeline.llm_max_tokens must be greater than pipeline.completion_reserve".into(),
            ));
        }
        if self.completion_reserve_step == 0 || self.context_budget_step == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline budget steps must be > 0".into(),
            ));
        }
        if self.max_contexts == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_contexts must be >= 1".into(),
            ));
        }
        if self.trade_off_sections.contains(&0) {
            return Err(ConfigError::ValidationError(
                "pipeline.trade_off_sections entries must be > 0".into(),
            ));
        }
        if self.not_enough_info_answer.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.not_enough_info_answer must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            llm_max_tokens: default_llm_max_tokens(),
            max_contexts: default_max_contexts(),
            completion_reserve: default_completion_reserve(),
            completion_reserve_step: default_completion_reserve_step(),
            context_budget_step: default_context_budget_step(),
            chunk_overlap: default_chunk_overlap(),
            fusion_min_completion: default_fusion_min_completion(),
            trade_off_sections: default_trade_off_sections(),
            excluded_sections: default_excluded_sections(),
            not_enough_info_answer: default_not_enough_info_answer(),
        }
    }
}

/// Where the rendered paper, chunks and responses are dumped for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_diagnostics_dir")]
    pub dir: PathBuf,
}

fn default_diagnostics_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_diagnostics_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.askpaper/config.toml).
    ///
    /// Also checks environment variables:
    /// - `ASKPAPER_API_KEY` replaces any key from the file; `OPENAI_API_KEY`
    ///   then `OPENROUTER_API_KEY` only fill a key the file left out
    /// - `ASKPAPER_PROVIDER`, `ASKPAPER_MODEL`
    /// - `ASKPAPER_ENVIRONMENT=dev` turns on the diagnostics dump
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `var`.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("ASKPAPER_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = var("OPENAI_API_KEY").or_else(|| var("OPENROUTER_API_KEY"));
        }

        if let Some(provider) = var("ASKPAPER_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = var("ASKPAPER_MODEL") {
            self.default_model = model;
        }

        if var("ASKPAPER_ENVIRONMENT").as_deref() == Some("dev") {
            self.diagnostics.enabled = true;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".askpaper")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_model must not be empty".into(),
            ));
        }
        self.pipeline.validate()
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Render the configuration as TOML with secrets removed.
    pub fn redacted_toml(&self) -> String {
        let mut config = self.clone();
        config.api_key = config.api_key.map(|_| "[REDACTED]".into());
        for provider in config.providers.values_mut() {
            provider.api_key = provider.api_key.take().map(|_| "[REDACTED]".into());
        }
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            fallback_providers: Vec::new(),
            providers: HashMap::new(),
            pipeline: PipelineConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.pipeline.llm_max_tokens, 4000);
        assert_eq!(config.pipeline.max_contexts, 7);
    }

    #[test]
    fn trade_off_table_lookup() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.top_k_sections(0), Some(None));
        assert_eq!(pipeline.top_k_sections(1), Some(Some(20)));
        assert_eq!(pipeline.top_k_sections(4), Some(Some(3)));
        assert_eq!(pipeline.top_k_sections(5), None);
        assert_eq!(pipeline.max_trade_off(), 4);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.pipeline.excluded_sections, config.pipeline.excluded_sections);
    }

    #[test]
    fn reserve_larger_than_ceiling_rejected() {
        let config = AppConfig {
            pipeline: PipelineConfig {
                completion_reserve: 5000,
                ..PipelineConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_top_k_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.trade_off_sections = vec![10, 0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn partial_pipeline_section_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gpt-4o-mini"

[pipeline]
max_contexts = 3
excluded_sections = ["reference"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.pipeline.max_contexts, 3);
        assert_eq!(config.pipeline.excluded_sections, vec!["reference".to_string()]);
        assert_eq!(config.pipeline.chunk_overlap, 20);
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pipeline = [not toml").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".into()),
            "ASKPAPER_MODEL" => Some("gpt-4o".into()),
            "ASKPAPER_ENVIRONMENT" => Some("dev".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.default_model, "gpt-4o");
        assert!(config.diagnostics.enabled);
    }

    #[test]
    fn askpaper_key_beats_the_file_key() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|key| match key {
            "ASKPAPER_API_KEY" => Some("sk-env".into()),
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn vendor_keys_only_fill_a_missing_key() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));

        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            "OPENROUTER_API_KEY" => Some("sk-or".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn secrets_never_printed() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        assert!(!format!("{config:?}").contains("sk-secret"));
        assert!(!config.redacted_toml().contains("sk-secret"));
    }
}
