//! PlanPilot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main PlanPilot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Email delivery configuration
    pub email: EmailConfig,

    /// Candidate extraction and mock planner cue words
    pub extract: ExtractConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planpilot.yml
        let local_config = PathBuf::from(".planpilot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planpilot/planpilot.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("planpilot").join("planpilot.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load config from {}: {}",
                            user_config.display(),
                            e
                        );
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the API server
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Sampling temperature for planning calls
    pub temperature: f32,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| {
            eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )
        })
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4.1-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 60_000,
            temperature: 0.2,
        }
    }
}

/// Email delivery configuration
///
/// Delivery is optional: with no SMTP host or sender configured, email
/// dispatch reports a not-configured error instead of sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP relay hostname; empty disables delivery
    #[serde(rename = "smtp-host")]
    pub smtp_host: String,

    /// SMTP relay port
    #[serde(rename = "smtp-port")]
    pub smtp_port: u16,

    /// Sender address; empty disables delivery
    pub from: String,

    /// Environment variable containing the SMTP username
    #[serde(rename = "username-env")]
    pub username_env: String,

    /// Environment variable containing the SMTP password
    #[serde(rename = "password-env")]
    pub password_env: String,
}

impl EmailConfig {
    /// Whether enough is configured to attempt delivery
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.is_empty() && !self.from.is_empty()
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 587,
            from: String::new(),
            username_env: "SMTP_USERNAME".to_string(),
            password_env: "SMTP_PASSWORD".to_string(),
        }
    }
}

/// Label and cue word sets for extraction and the mock planner
///
/// Injected rather than inlined so locale sets can be extended from config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Labels marking the start of a task list
    #[serde(rename = "task-labels")]
    pub task_labels: Vec<String>,

    /// Cue words that route the mock planner to summarize_text
    #[serde(rename = "summary-cues")]
    pub summary_cues: Vec<String>,

    /// Cue words that route the mock planner to generate_email
    #[serde(rename = "email-cues")]
    pub email_cues: Vec<String>,

    /// Cap on extracted task candidates
    #[serde(rename = "max-candidates")]
    pub max_candidates: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            task_labels: vec![
                "task:".to_string(),
                "tasks:".to_string(),
                "my tasks:".to_string(),
                "задача:".to_string(),
                "задачи:".to_string(),
            ],
            summary_cues: vec![
                "summary".to_string(),
                "summarize".to_string(),
                "суммар".to_string(),
                "резюм".to_string(),
            ],
            email_cues: vec![
                "email".to_string(),
                "письм".to_string(),
                "почт".to_string(),
            ],
            max_candidates: 30,
        }
    }
}
