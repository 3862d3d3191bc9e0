use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Number of full market ticks to run
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Cap on how many roster agents participate (None = all)
    #[serde(default)]
    pub agent_limit: Option<usize>,
    /// Seed for the tick-order shuffle (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Pause between agent turns, to stay under free-tier rate limits
    #[serde(default = "default_turn_delay_ms")]
    pub turn_delay_ms: u64,
}

fn default_ticks() -> u32 {
    3
}

fn default_turn_delay_ms() -> u64 {
    3000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            agent_limit: None,
            seed: None,
            turn_delay_ms: default_turn_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// API key for the completion service (usually via GROQ_API_KEY)
    #[serde(default)]
    pub api_key: String,
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for the CSV trade ledger and the offers snapshot
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Disable to skip all file writes
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_persistence_enabled() -> bool {
    true
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            enabled: default_persistence_enabled(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("simulation.ticks", 3)?
            .set_default("simulation.turn_delay_ms", 3000)?
            .set_default("persistence.log_dir", "logs")?
            .set_default("persistence.enabled", true)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("AGORA_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (AGORA_SIMULATION__TICKS, etc.)
            .add_source(
                Environment::with_prefix("AGORA")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        // The completion key usually arrives through the service's own
        // conventional variable rather than the AGORA prefix
        if config.generator.api_key.is_empty() {
            if let Ok(key) = std::env::var("GROQ_API_KEY") {
                config.generator.api_key = key;
            }
        }

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.simulation.ticks == 0 {
            errors.push("simulation.ticks must be at least 1".to_string());
        }

        if self.simulation.agent_limit == Some(0) {
            errors.push("simulation.agent_limit must be at least 1 when set".to_string());
        }

        if self.generator.base_url.is_empty() {
            errors.push("generator.base_url must not be empty".to_string());
        }

        if self.generator.timeout_secs == 0 {
            errors.push("generator.timeout_secs must be at least 1".to_string());
        }

        if self.persistence.enabled && self.persistence.log_dir.is_empty() {
            errors.push("persistence.log_dir must not be empty when persistence is enabled".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
