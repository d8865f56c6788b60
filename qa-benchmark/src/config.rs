//! Configuration management for the QA evaluation loop
//!
//! Loads provider, retry, pipeline and output settings from TOML files and
//! resolves API keys.

use indexmap::IndexMap;
use qaeval::{Locale, PhraseLexicon};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Language of prompts and of the built-in phrase lexicon
    #[serde(default)]
    pub locale: Locale,
    /// Kept in file order so saved configs stay stable
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Replaces the built-in lexicon of `locale` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexicon: Option<PhraseLexicon>,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub default_model: String,
    /// Inline key; takes precedence over the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the key
    #[serde(default)]
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Requests per minute
    #[serde(default = "default_rpm")]
    pub rpm: u32,
}

/// Which provider drives each stage and how the stages behave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_gemini")]
    pub excerpt_provider: String,
    #[serde(default = "default_openai")]
    pub question_provider: String,
    #[serde(default = "default_gemini")]
    pub answer_provider: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
    /// Pause between consecutive requests to one provider
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub work: WorkConfig,
}

/// The literary work excerpts are drawn from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_excerpt_min_words")]
    pub excerpt_min_words: usize,
    #[serde(default = "default_excerpt_max_words")]
    pub excerpt_max_words: usize,
}

/// Backoff shape between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    /// `(attempt + 1) * delay`
    Linear,
    /// `delay * 2^attempt`, capped at `max_delay_ms`
    Exponential,
}

/// Retry settings for generator calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff")]
    pub backoff: BackoffKind,
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_delay_ms: u64,
    /// Retry every failure instead of only rate limits
    #[serde(default)]
    pub retry_all_errors: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Also write the generated questions and answers
    #[serde(default = "default_true")]
    pub save_intermediate: bool,
}

// Default value functions
fn default_true() -> bool { true }
fn default_rpm() -> u32 { 60 }
fn default_max_output_tokens() -> u32 { 2048 }
fn default_gemini() -> String { "gemini".to_string() }
fn default_openai() -> String { "openai".to_string() }
fn default_num_questions() -> usize { 20 }
fn default_pacing_ms() -> u64 { 2000 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_title() -> String { "The Master and Margarita".to_string() }
fn default_author() -> String { "Mikhail Bulgakov".to_string() }
fn default_excerpt_min_words() -> usize { 500 }
fn default_excerpt_max_words() -> usize { 800 }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff() -> BackoffKind { BackoffKind::Linear }
fn default_retry_delay_ms() -> u64 { 30_000 }
fn default_max_retry_delay_ms() -> u64 { 120_000 }
fn default_output_dir() -> String { "results".to_string() }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            excerpt_provider: default_gemini(),
            question_provider: default_openai(),
            answer_provider: default_gemini(),
            num_questions: default_num_questions(),
            pacing_ms: default_pacing_ms(),
            timeout_ms: default_timeout_ms(),
            work: WorkConfig::default(),
        }
    }
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            author: default_author(),
            excerpt_min_words: default_excerpt_min_words(),
            excerpt_max_words: default_excerpt_max_words(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
            delay_ms: default_retry_delay_ms(),
            max_delay_ms: default_max_retry_delay_ms(),
            retry_all_errors: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            save_intermediate: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = [
            "config/qa-eval.toml",
            "../config/qa-eval.toml",
            "qa-benchmark/config/qa-eval.toml",
        ];

        for path in &config_paths {
            if let Ok(config) = Self::from_file(path) {
                tracing::info!("Loaded configuration from {}", path);
                return config;
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Get a specific provider config
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Phrase lexicon in effect: the configured override or the locale's built-in set
    pub fn lexicon(&self) -> PhraseLexicon {
        match &self.lexicon {
            Some(lexicon) => lexicon.clone().normalized(),
            None => PhraseLexicon::for_locale(self.locale),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut providers = IndexMap::new();

        providers.insert("gemini".to_string(), ProviderConfig {
            name: "gemini".to_string(),
            enabled: true,
            default_model: "gemini-2.5-flash".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            temperature: Some(0.3),
            max_output_tokens: 4096,
            rpm: 10,
        });

        providers.insert("openai".to_string(), ProviderConfig {
            name: "openai".to_string(),
            enabled: true,
            default_model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
            temperature: Some(0.3),
            max_output_tokens: 4096,
            rpm: 500,
        });

        Self {
            providers,
            pipeline: PipelineConfig::default(),
            retry: RetryConfig::default(),
            output: OutputConfig::default(),
            locale: Locale::default(),
            lexicon: None,
        }
    }
}

impl ProviderConfig {
    /// Key from the inline setting, then the environment, then the key file
    pub fn resolve_api_key(&self, key_file: Option<&KeyFile>) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        if !self.api_key_env.is_empty() {
            if let Ok(key) = std::env::var(&self.api_key_env) {
                if !key.is_empty() {
                    return Some(key);
                }
            }
        }
        key_file.and_then(|f| f.key_for(&self.name))
    }
}

/// Legacy `Key.json` with one key per provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyFile {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

impl KeyFile {
    pub const DEFAULT_PATH: &'static str = "Key.json";

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// `Key.json` in the working directory, if present
    pub fn load_default() -> Option<Self> {
        Self::load_from(Self::DEFAULT_PATH)
    }

    /// Keys from `path`; a missing file is silent, an unreadable or malformed one is logged
    pub fn load_from<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Ignoring key file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(keys) => {
                tracing::debug!("Loaded API keys from {}", path.display());
                Some(keys)
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed key file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn key_for(&self, provider: &str) -> Option<String> {
        let key = match provider.to_lowercase().as_str() {
            "gemini" | "google" => self.gemini_api_key.as_ref(),
            "openai" | "gpt" => self.openai_api_key.as_ref(),
            _ => None,
        };
        key.filter(|k| !k.is_empty()).cloned()
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.providers.contains_key("gemini"));
        assert!(config.providers.contains_key("openai"));
        assert_eq!(config.pipeline.pacing_ms, 2000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.backoff, BackoffKind::Linear);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
locale = "ru"

[providers.gemini]
name = "gemini"
default_model = "gemini-2.5-pro"
api_key_env = "MY_GEMINI_KEY"

[pipeline]
num_questions = 5
pacing_ms = 0

[retry]
backoff = "exponential"
delay_ms = 100
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.locale, Locale::Ru);
        assert_eq!(config.providers["gemini"].default_model, "gemini-2.5-pro");
        assert!(config.providers["gemini"].enabled);
        assert_eq!(config.providers["gemini"].rpm, 60);
        assert_eq!(config.pipeline.num_questions, 5);
        assert_eq!(config.pipeline.answer_provider, "gemini");
        assert_eq!(config.retry.backoff, BackoffKind::Exponential);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.lexicon().retrieval_failed, "Ошибка получения ответа");
    }

    #[test]
    fn test_lexicon_override_is_normalized() {
        let toml = r#"
[lexicon]
refusal = ["No Idea"]
rejection = ["broken"]
"#;
        let config = Config::from_toml(toml).unwrap();
        let lexicon = config.lexicon();
        assert_eq!(lexicon.refusal, vec!["no idea".to_string()]);
        assert!(lexicon.low_quality.contains(&"no idea".to_string()));
        assert_eq!(lexicon.find_rejection("BROKEN output"), Some("broken"));
    }

    #[test]
    fn test_inline_key_wins() {
        let provider = ProviderConfig {
            api_key: Some("inline".to_string()),
            api_key_env: "QA_BENCHMARK_TEST_UNSET_VAR".to_string(),
            ..Config::default().providers["openai"].clone()
        };
        let keys = KeyFile {
            openai_api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        assert_eq!(provider.resolve_api_key(Some(&keys)).as_deref(), Some("inline"));

        let provider = ProviderConfig { api_key: None, ..provider };
        assert_eq!(provider.resolve_api_key(Some(&keys)).as_deref(), Some("from-file"));
        assert_eq!(provider.resolve_api_key(None), None);
    }

    #[test]
    fn test_key_file_parse() {
        let keys: KeyFile = serde_json::from_str(r#"{"gemini_api_key": "g-key"}"#).unwrap();
        assert_eq!(keys.key_for("gemini").as_deref(), Some("g-key"));
        assert_eq!(keys.key_for("openai"), None);
    }

    #[test]
    fn test_key_file_load_from() {
        let dir = tempfile::tempdir().unwrap();

        assert!(KeyFile::load_from(dir.path().join("Key.json")).is_none());

        let malformed = dir.path().join("broken.json");
        fs::write(&malformed, "{\"gemini_api_key\": ").unwrap();
        assert!(KeyFile::load_from(&malformed).is_none());
        assert!(matches!(KeyFile::from_file(&malformed), Err(ConfigError::Parse(_))));

        let valid = dir.path().join("keys.json");
        fs::write(&valid, r#"{"openai_api_key": "o-key"}"#).unwrap();
        let keys = KeyFile::load_from(&valid).unwrap();
        assert_eq!(keys.key_for("gpt").as_deref(), Some("o-key"));
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = Config::from_toml(include_str!("../config/qa-eval.toml")).unwrap();
        assert_eq!(config.locale, Locale::Ru);
        let names: Vec<&str> = config.providers.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["gemini", "openai"]);
        assert_eq!(config.pipeline.work.author, "Михаил Булгаков");
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qa-eval.toml");
        Config::default().save_toml(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.providers.len(), 2);
        assert_eq!(loaded.pipeline.work.excerpt_max_words, 800);
    }
}
