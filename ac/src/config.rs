//! AdCopy configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::split_model_id;

/// Main AdCopy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Per-row generation policy
    pub generation: GenerationConfig,

    /// Batch fan-out policy
    pub batch: BatchConfig,

    /// Content cache tiers
    pub cache: CacheConfig,

    /// Double-click protection
    pub throttle: ThrottleConfig,

    /// Spreadsheet storage and column detection
    pub sheet: SheetConfig,

    /// Client directory
    pub clients: ClientsConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key for the default provider is available.
    pub fn validate(&self) -> Result<()> {
        let provider = self.llm.default_provider();
        let Some(provider_config) = self.llm.providers.get(provider) else {
            return Err(eyre::eyre!("Default provider '{}' is not configured", provider));
        };
        if provider_config.get_api_key().is_none() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                provider_config.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .adcopy.yml
        let local_config = PathBuf::from(".adcopy.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/adcopy/adcopy.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("adcopy").join("adcopy.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = [
            config_path.cloned(),
            Some(PathBuf::from(".adcopy.yml")),
            dirs::config_dir().map(|d| d.join("adcopy").join("adcopy.yml")),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model used when a request names none (`provider:model`)
    #[serde(rename = "default-model")]
    pub default_model: String,

    /// Upper bound on response tokens
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Default sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Provider endpoints by name
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: "https://api.openai.com".to_string(),
                openai_compatible: true,
            },
        );
        providers.insert(
            "anthropic".to_string(),
            ProviderConfig {
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
                base_url: "https://api.anthropic.com".to_string(),
                openai_compatible: false,
            },
        );
        Self {
            default_model: "openai:gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout_ms: 120_000,
            providers,
        }
    }
}

impl LlmConfig {
    /// Provider named by the default model, or `openai` when unprefixed
    pub fn default_provider(&self) -> &str {
        split_model_id(&self.default_model).0.unwrap_or("openai")
    }
}

/// One provider endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Speaks the OpenAI chat-completions protocol
    #[serde(rename = "openai-compatible", default)]
    pub openai_compatible: bool,
}

impl ProviderConfig {
    /// Read the API key from the environment
    pub fn get_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}

/// Per-row generation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Attempts per row, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts; multiplied by the attempt number
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Treat count and length violations as errors
    #[serde(rename = "strict-mode")]
    pub strict_mode: bool,

    /// Descriptions shorter than this draw a warning
    #[serde(rename = "min-description-length")]
    pub min_description_length: usize,

    /// Minimum validator score for a response to count as usable
    #[serde(rename = "quality-threshold")]
    pub quality_threshold: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            strict_mode: true,
            min_description_length: crate::domain::MIN_DESCRIPTION_LENGTH,
            quality_threshold: 0.0,
        }
    }
}

impl GenerationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Batch fan-out policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Jobs per group
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Retries after the first failure of a job
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Linear backoff unit between job retries
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Pause between groups
    #[serde(rename = "group-delay-ms")]
    pub group_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_retries: 2,
            retry_delay_ms: 1000,
            group_delay_ms: 500,
        }
    }
}

impl BatchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn group_delay(&self) -> Duration {
        Duration::from_millis(self.group_delay_ms)
    }
}

/// Content cache tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disable to always call the provider
    pub enabled: bool,

    #[serde(rename = "memory-ttl-secs")]
    pub memory_ttl_secs: u64,

    #[serde(rename = "memory-max-entries")]
    pub memory_max_entries: usize,

    #[serde(rename = "durable-ttl-secs")]
    pub durable_ttl_secs: u64,

    #[serde(rename = "durable-max-entries")]
    pub durable_max_entries: usize,

    /// Directory of the durable tier; none keeps the durable tier in memory
    #[serde(rename = "durable-dir")]
    pub durable_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        // Use XDG cache directory (~/.cache/adcopy on Linux)
        let durable_dir = dirs::cache_dir().map(|d| d.join("adcopy").join("content"));
        Self {
            enabled: true,
            memory_ttl_secs: 30 * 60,
            memory_max_entries: 100,
            durable_ttl_secs: 2 * 60 * 60,
            durable_max_entries: 500,
            durable_dir,
        }
    }
}

impl CacheConfig {
    pub fn memory_ttl(&self) -> Duration {
        Duration::from_secs(self.memory_ttl_secs)
    }

    pub fn durable_ttl(&self) -> Duration {
        Duration::from_secs(self.durable_ttl_secs)
    }
}

/// Double-click protection windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    #[serde(rename = "default-delay-ms")]
    pub default_delay_ms: u64,

    #[serde(rename = "generation-delay-ms")]
    pub generation_delay_ms: u64,

    #[serde(rename = "save-delay-ms")]
    pub save_delay_ms: u64,

    #[serde(rename = "analysis-delay-ms")]
    pub analysis_delay_ms: u64,

    /// Bookkeeping older than this is dropped
    #[serde(rename = "retention-secs")]
    pub retention_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: 2000,
            generation_delay_ms: 3000,
            save_delay_ms: 1000,
            analysis_delay_ms: 5000,
            retention_secs: 10 * 60,
        }
    }
}

/// Spreadsheet storage and column detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Directory of the local sheet store
    #[serde(rename = "store-dir")]
    pub store_dir: String,

    /// Header keywords that mark a column as never writable
    #[serde(rename = "protected-headers")]
    pub protected_headers: Vec<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/sheetstore on Linux), shared with `ss`
        let store_dir = dirs::data_local_dir()
            .map(|d| d.join("sheetstore"))
            .unwrap_or_else(|| PathBuf::from(".sheetstore"))
            .to_string_lossy()
            .into_owned();

        Self {
            store_dir,
            protected_headers: crate::sheet::DEFAULT_PROTECTED_HEADERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Client directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientsConfig {
    /// YAML file holding a list of client profiles
    pub path: Option<PathBuf>,
}
