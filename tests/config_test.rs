//! Tests for configuration loading.

use std::io::Write;
use std::time::Duration;

use chrono::TimeDelta;
use tempfile::NamedTempFile;
use tresenraya::AppConfig;
use tresenraya_core::{Difficulty, Symbol};

#[test]
fn test_defaults() {
    let config = AppConfig::default();
    assert_eq!(*config.difficulty(), Difficulty::Medium);
    assert_eq!(*config.symbol(), Symbol::X);
    assert_eq!(*config.room_expiry_secs(), 3600);
    assert_eq!(*config.create_attempts(), 5);
    assert_eq!(config.lifecycle_config().expiry(), &TimeDelta::hours(1));
}

#[test]
fn test_empty_file_is_all_defaults() {
    assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(
        file,
        r#"
difficulty = "hard"
symbol = "O"
ai_delay_ms = 0
room_expiry_secs = 600
join_base_url = "https://tresenraya.example/"
"#
    )
    .unwrap();

    let config = AppConfig::load(Some(file.path())).expect("Config should load");
    assert_eq!(*config.difficulty(), Difficulty::Hard);
    assert_eq!(*config.symbol(), Symbol::O);
    assert_eq!(config.ai_delay(), Duration::ZERO);
    assert_eq!(config.lifecycle_config().expiry(), &TimeDelta::minutes(10));
    assert_eq!(*config.create_attempts(), 5);
    assert_eq!(config.join_base_url(), "https://tresenraya.example/");
}

#[test]
fn test_missing_file_is_an_error() {
    let err = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(AppConfig::from_toml("difficulty = \"impossible\"").is_err());
    assert!(AppConfig::from_toml("room_expiry_secs = 0").is_err());
}

#[test]
fn test_overrides() {
    let config = AppConfig::default()
        .with_symbol(Symbol::O)
        .with_difficulty(Difficulty::Easy);
    assert_eq!(*config.symbol(), Symbol::O);
    assert_eq!(*config.difficulty(), Difficulty::Easy);
}
