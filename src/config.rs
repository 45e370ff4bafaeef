//! Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "productivity-tracker.yaml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub ai: AiConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment. `development` allows any CORS origin.
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:8081",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8081",
        "http://127.0.0.1:8000",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("db/productivity_tracker.db")
}

/// Token signing and password hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    #[serde(default = "default_token_expire_minutes")]
    pub access_token_expire_minutes: i64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            access_token_expire_minutes: default_token_expire_minutes(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_secret_key() -> String {
    "change-me-in-production-use-at-least-32-characters".to_string()
}

fn default_token_expire_minutes() -> i64 {
    30
}

fn default_bcrypt_cost() -> u32 {
    crate::auth::password::DEFAULT_COST
}

/// Language model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider API key. Suggestions are disabled when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_ai_base_url(),
            timeout_seconds: default_ai_timeout(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from an explicit file, or the default file if present, then apply
    /// environment overrides. A `.env` file in the working directory is read first.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unparseable numbers are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(env) = lookup("ENVIRONMENT") {
            self.server.environment = env;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(secret) = lookup("SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        if let Some(minutes) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES").and_then(|v| v.parse().ok()) {
            self.auth.access_token_expire_minutes = minutes;
        }
        if let Some(cost) = lookup("BCRYPT_COST").and_then(|v| v.parse().ok()) {
            self.auth.bcrypt_cost = cost;
        }

        if let Some(key) = lookup("GOOGLE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = lookup("AI_MODEL") {
            self.ai.model = model;
        }
        if let Some(url) = lookup("AI_BASE_URL") {
            self.ai.base_url = url;
        }
        if let Some(timeout) = lookup("AI_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.ai.timeout_seconds = timeout;
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
