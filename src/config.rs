// src/config.rs - Configuration management
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

use crate::models::CounterConfig;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub feedback: FeedbackConfig,
    pub board: BoardConfig,
    pub announcer: AnnouncerConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Where the clinic API lives.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedbackConfig {
    pub debounce_ms: u64,
    /// Only employees with this role type are offered on the form.
    pub employee_role: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoardConfig {
    pub clinic_name: String,
    pub token_prefix: String,
    pub tick_ms: u64,
    pub counters: Vec<CounterConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncerMode {
    Log,
    Command,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnnouncerConfig {
    pub mode: AnnouncerMode,
    /// Text-to-speech program; the phrase is passed as its last argument.
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub require_https: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            employee_role: "user".to_string(),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            clinic_name: "TOPMOST Dental - Clinic".to_string(),
            token_prefix: "TM".to_string(),
            tick_ms: 1000,
            counters: vec![
                CounterConfig {
                    counter: 1,
                    doctor: "Dr. Fathimalatheef".to_string(),
                    department: "General Dentist".to_string(),
                },
                CounterConfig {
                    counter: 2,
                    doctor: "Dr. Pooja Jayan".to_string(),
                    department: "Orthodontist".to_string(),
                },
                CounterConfig {
                    counter: 3,
                    doctor: "Dr. Swetha Prasad".to_string(),
                    department: "Pedodontist".to_string(),
                },
            ],
        }
    }
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            mode: AnnouncerMode::Log,
            command: "espeak".to_string(),
            args: Vec::new(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            require_https: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
        load_config_file(Path::new(&config_file))?
    } else {
        Config::default()
    };

    override_with_env(&mut config)?;

    config.validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn override_with_env(config: &mut Config) -> Result<()> {
    if let Ok(host) = env::var("BIND_ADDRESS") {
        config.server.host = host;
    }
    if let Ok(port_str) = env::var("DESK_PORT") {
        config.server.port = port_str.parse::<u16>()
            .with_context(|| format!("DESK_PORT is not a valid port: {}", port_str))?;
    }
    if let Ok(workers_str) = env::var("DESK_WORKERS") {
        if let Ok(workers) = workers_str.parse::<usize>() {
            config.server.workers = Some(workers);
        }
    }
    if let Ok(url) = env::var("CLINIC_API_URL") {
        config.api.base_url = url;
    }
    if let Ok(timeout_str) = env::var("CLINIC_API_TIMEOUT_SECONDS") {
        if let Ok(timeout) = timeout_str.parse::<u64>() {
            config.api.timeout_seconds = timeout;
        }
    }
    if let Ok(debounce_str) = env::var("SEARCH_DEBOUNCE_MS") {
        if let Ok(debounce) = debounce_str.parse::<u64>() {
            config.feedback.debounce_ms = debounce;
        }
    }
    if let Ok(role) = env::var("EMPLOYEE_ROLE") {
        config.feedback.employee_role = role;
    }
    if let Ok(name) = env::var("CLINIC_NAME") {
        config.board.clinic_name = name;
    }
    if let Ok(mode) = env::var("ANNOUNCER_MODE") {
        config.announcer.mode = match mode.to_lowercase().as_str() {
            "log" => AnnouncerMode::Log,
            "command" => AnnouncerMode::Command,
            other => anyhow::bail!("Unknown ANNOUNCER_MODE '{}' (expected log or command)", other),
        };
    }
    if let Ok(command) = env::var("ANNOUNCER_COMMAND") {
        config.announcer.command = command;
    }
    if let Ok(origins_str) = env::var("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(level) = env::var("RUST_LOG") {
        config.logging.level = level;
    }

    Ok(())
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("api.base_url must not be empty"));
        }

        if self.feedback.debounce_ms == 0 {
            return Err(anyhow::anyhow!("feedback.debounce_ms must be greater than zero"));
        }

        if self.board.tick_ms == 0 {
            return Err(anyhow::anyhow!("board.tick_ms must be greater than zero"));
        }

        if self.board.counters.is_empty() {
            return Err(anyhow::anyhow!("board.counters must list at least one counter"));
        }

        let mut seen = HashSet::new();
        for entry in &self.board.counters {
            if !seen.insert(entry.counter) {
                return Err(anyhow::anyhow!(
                    "counter {} appears more than once in board.counters",
                    entry.counter
                ));
            }
        }

        if self.announcer.mode == AnnouncerMode::Command && self.announcer.command.trim().is_empty() {
            return Err(anyhow::anyhow!("announcer.command is required in command mode"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        env::var("DESK_ENV").map(|v| v == "production").unwrap_or(false)
    }

    pub fn print_startup_info(&self) {
        log::info!("🏥 Clinic desk starting up...");
        log::info!("🌐 Server: {}:{}", self.server.host, self.server.port);
        log::info!("🔗 Clinic API: {} ({}s timeout)", self.api.base_url, self.api.timeout_seconds);
        log::info!("🔎 Search debounce: {}ms, employee role '{}'",
            self.feedback.debounce_ms, self.feedback.employee_role);
        log::info!("📋 Board: {} ({} counters)", self.board.clinic_name, self.board.counters.len());
        log::info!("🔊 Announcer: {:?}", self.announcer.mode);
        log::info!("📊 Logging: {} level", self.logging.level);

        if !self.is_production() {
            log::warn!("🚧 Running in development mode");
        }
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.feedback.debounce_ms, 500);
        assert_eq!(config.feedback.employee_role, "user");
        assert_eq!(config.board.tick_ms, 1000);
        assert_eq!(config.board.counters.len(), 3);
        assert_eq!(config.board.counters[1].department, "Orthodontist");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.board.counters.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        let duplicate = config.board.counters[0].clone();
        config.board.counters.push(duplicate);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.feedback.debounce_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.announcer.mode = AnnouncerMode::Command;
        config.announcer.command = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_loading() -> Result<()> {
        let toml_content = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [api]
        base_url = "https://clinic.example/api"

        [board]
        clinic_name = "Riverside Clinic"

        [[board.counters]]
        counter = 7
        doctor = "Dr. Ahmed"
        department = "Radiology"

        [announcer]
        mode = "command"
        command = "say"
        "#;

        let temp_file = NamedTempFile::new()?;
        fs::write(temp_file.path(), toml_content.as_bytes())?;

        let config = load_config_file(temp_file.path())?;
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.api.base_url, "https://clinic.example/api");
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.board.clinic_name, "Riverside Clinic");
        assert_eq!(config.board.token_prefix, "TM");
        assert_eq!(config.board.counters.len(), 1);
        assert_eq!(config.board.counters[0].counter, 7);
        assert_eq!(config.announcer.mode, AnnouncerMode::Command);
        assert_eq!(config.announcer.command, "say");
        assert!(config.validate().is_ok());

        Ok(())
    }

    #[test]
    fn test_malformed_toml_is_reported() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        fs::write(temp_file.path(), "[server\nport = 1")?;
        let err = load_config_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        Ok(())
    }
}
