/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::time::Duration;

use subweave::app_config::{Config, FetchConfig, LogLevel};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.fetch.request_timeout_secs, 30);
    assert_eq!(config.fetch.pipeline_timeout_secs, 120);
    assert_eq!(config.fetch.max_parallel_segments, 1);
    assert!(config.fetch.user_agent.starts_with("subweave/"));
    assert!(config.fetch.headers.is_empty());
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.fetch.max_parallel_segments = 0;
    assert!(config.validate().is_err());
    config.fetch.max_parallel_segments = 8;
    assert!(config.validate().is_ok());

    config.fetch.request_timeout_secs = 0;
    assert!(config.validate().is_err());
    config.fetch.request_timeout_secs = 10;

    config.fetch.user_agent = "   ".to_string();
    assert!(config.validate().is_err());
    config.fetch.user_agent = "test-agent".to_string();

    config.fetch.headers.insert("Bad Header".to_string(), "x".to_string());
    assert!(config.validate().is_err());
    config.fetch.headers.clear();

    config.fetch.headers.insert("Referer".to_string(), "https://www.example.com/".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_pipelineTimeout_zero_shouldDisableDeadline() {
    let mut fetch = FetchConfig::default();
    assert_eq!(fetch.pipeline_timeout(), Some(Duration::from_secs(120)));
    fetch.pipeline_timeout_secs = 0;
    assert_eq!(fetch.pipeline_timeout(), None);
    assert_eq!(fetch.request_timeout(), Duration::from_secs(30));
}

#[test]
fn test_deserialize_partialJson_shouldFillDefaults() -> Result<()> {
    let config: Config = serde_json::from_str(r#"{ "fetch": { "max_parallel_segments": 4 }, "log_level": "debug" }"#)?;
    assert_eq!(config.fetch.max_parallel_segments, 4);
    assert_eq!(config.fetch.request_timeout_secs, 30);
    assert_eq!(config.log_level, LogLevel::Debug);

    let empty: Config = serde_json::from_str("{}")?;
    assert_eq!(empty.fetch.max_parallel_segments, 1);
    Ok(())
}

#[test]
fn test_loadOrCreate_missingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    assert!(!path.exists());

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.fetch.max_parallel_segments, 1);

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.fetch.user_agent, config.fetch.user_agent);
    Ok(())
}

#[test]
fn test_save_thenLoad_shouldRoundTripChangedValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("custom.json");

    let mut config = Config::default();
    config.fetch.max_parallel_segments = 6;
    config.fetch.headers.insert("Origin".to_string(), "https://www.example.com".to_string());
    config.log_level = LogLevel::Trace;
    config.save(&path)?;

    let loaded = Config::load_or_create(&path)?;
    assert_eq!(loaded.fetch.max_parallel_segments, 6);
    assert_eq!(loaded.fetch.headers.get("Origin").map(String::as_str), Some("https://www.example.com"));
    assert_eq!(loaded.log_level, LogLevel::Trace);
    Ok(())
}

#[test]
fn test_loadOrCreate_malformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_logLevel_shouldMapToLevelFilter() {
    assert_eq!(log::LevelFilter::from(&LogLevel::Warn), log::LevelFilter::Warn);
    assert_eq!(log::LevelFilter::from(&LogLevel::Trace), log::LevelFilter::Trace);
}
