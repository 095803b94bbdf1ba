//! Application configuration.

use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use tresenraya_core::{Difficulty, Symbol};
use tresenraya_online::{DEFAULT_CREATE_ATTEMPTS, DEFAULT_ROOM_EXPIRY_SECS, LifecycleConfig};

/// Settings shared by every front end. Every field has a default, so an
/// empty file (or no file) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search opponent strength.
    #[serde(default)]
    difficulty: Difficulty,

    /// Symbol the human plays in solo mode.
    #[serde(default = "default_symbol")]
    symbol: Symbol,

    /// Pause before showing the opponent's move, in milliseconds.
    #[serde(default = "default_ai_delay_ms")]
    ai_delay_ms: u64,

    /// Inactivity window before a room is expired, in seconds.
    #[serde(default = "default_room_expiry_secs")]
    room_expiry_secs: i64,

    /// Fresh room codes tried before creation gives up.
    #[serde(default = "default_create_attempts")]
    create_attempts: u32,

    /// Page that join links point at.
    #[serde(default = "default_join_base_url")]
    join_base_url: String,
}

fn default_symbol() -> Symbol {
    Symbol::X
}

fn default_ai_delay_ms() -> u64 {
    500
}

fn default_room_expiry_secs() -> i64 {
    DEFAULT_ROOM_EXPIRY_SECS
}

fn default_create_attempts() -> u32 {
    DEFAULT_CREATE_ATTEMPTS
}

fn default_join_base_url() -> String {
    "http://localhost:8080/".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            symbol: default_symbol(),
            ai_delay_ms: default_ai_delay_ms(),
            room_expiry_secs: default_room_expiry_secs(),
            create_attempts: default_create_attempts(),
            join_base_url: default_join_base_url(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(difficulty = %config.difficulty, symbol = %config.symbol, "Config loaded");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        if config.room_expiry_secs <= 0 {
            return Err(ConfigError::new(format!(
                "room_expiry_secs must be positive, got {}",
                config.room_expiry_secs
            )));
        }
        Ok(config)
    }

    /// Loads `path` if given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Replaces the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Replaces the human's symbol.
    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = symbol;
        self
    }

    /// Opponent pacing as a [`Duration`].
    pub fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.ai_delay_ms)
    }

    /// Room lifecycle settings.
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig::new(
            TimeDelta::seconds(self.room_expiry_secs),
            self.create_attempts,
        )
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
