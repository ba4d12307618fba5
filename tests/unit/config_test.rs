//! Unit tests for configuration parsing
//!
//! Note: These tests modify global environment variables and must run serially.

use chrono::FixedOffset;
use serial_test::serial;
use studyquota::config::{ConfigError, QuotaConfig, QuotaLimits};
use studyquota::models::FeatureCategory;

const QUOTA_VARS: &[&str] = &[
    "QUOTA_LIMIT_SUMMARY",
    "QUOTA_LIMIT_FLASHCARDS",
    "QUOTA_LIMIT_QUESTIONS",
    "QUOTA_LIMIT_EDIT_CONTENT",
    "QUOTA_LIMIT_TERM_PAPER",
    "QUOTA_UTC_OFFSET_MINUTES",
    "QUOTA_RETENTION_DAYS",
    "QUOTA_RETENTION_INTERVAL_SECS",
];

fn clear_quota_env() {
    for var in QUOTA_VARS {
        std::env::remove_var(var);
    }
}

// =============================================================================
// Limits
// =============================================================================

#[test]
#[serial]
fn test_quota_limits_defaults() {
    clear_quota_env();

    let limits = QuotaLimits::from_env();

    assert_eq!(limits, QuotaLimits::default());
    assert_eq!(limits.for_category(FeatureCategory::Summary), 5);
    assert_eq!(limits.for_category(FeatureCategory::EditContent), 10);
    assert_eq!(limits.for_category(FeatureCategory::TermPaper), 2);
}

#[test]
#[serial]
fn test_quota_limits_custom_values() {
    clear_quota_env();
    std::env::set_var("QUOTA_LIMIT_SUMMARY", "20");
    std::env::set_var("QUOTA_LIMIT_TERM_PAPER", "0");

    let limits = QuotaLimits::from_env();

    assert_eq!(limits.summary, 20);
    // Zero disables the feature
    assert_eq!(limits.term_paper, 0);
    assert_eq!(limits.flashcards, 5);

    clear_quota_env();
}

#[test]
#[serial]
fn test_quota_limits_invalid_values_use_defaults() {
    clear_quota_env();
    std::env::set_var("QUOTA_LIMIT_QUESTIONS", "lots");

    let limits = QuotaLimits::from_env();
    assert_eq!(limits.questions, 5);

    clear_quota_env();
}

// =============================================================================
// Day boundary zone
// =============================================================================

#[test]
#[serial]
fn test_quota_config_defaults_to_utc_and_no_retention() {
    clear_quota_env();

    let config = QuotaConfig::from_env().unwrap();

    assert_eq!(config.utc_offset, FixedOffset::east_opt(0).unwrap());
    assert_eq!(config.retention_days, None);
    assert_eq!(config.retention_interval.as_secs(), 3600);
}

#[test]
#[serial]
fn test_quota_config_parses_offset_minutes() {
    clear_quota_env();
    std::env::set_var("QUOTA_UTC_OFFSET_MINUTES", "-330");

    let config = QuotaConfig::from_env().unwrap();
    assert_eq!(config.utc_offset.local_minus_utc(), -330 * 60);

    clear_quota_env();
}

#[test]
#[serial]
fn test_quota_config_rejects_full_day_offset() {
    clear_quota_env();
    std::env::set_var("QUOTA_UTC_OFFSET_MINUTES", "1440");

    let result = QuotaConfig::from_env();
    assert!(matches!(result, Err(ConfigError::InvalidUtcOffset)));

    clear_quota_env();
}

#[test]
#[serial]
fn test_quota_config_rejects_garbage_offset() {
    clear_quota_env();
    std::env::set_var("QUOTA_UTC_OFFSET_MINUTES", "Europe/Berlin");

    let result = QuotaConfig::from_env();
    assert!(matches!(result, Err(ConfigError::InvalidUtcOffset)));

    clear_quota_env();
}

// =============================================================================
// Retention
// =============================================================================

#[test]
#[serial]
fn test_quota_config_retention_settings() {
    clear_quota_env();
    std::env::set_var("QUOTA_RETENTION_DAYS", "90");
    std::env::set_var("QUOTA_RETENTION_INTERVAL_SECS", "0");

    let config = QuotaConfig::from_env().unwrap();

    assert_eq!(config.retention_days, Some(90));
    // Clamped so tokio::time::interval never sees zero
    assert_eq!(config.retention_interval.as_secs(), 1);

    clear_quota_env();
}

#[test]
#[serial]
fn test_quota_config_rejects_unparsable_retention() {
    for raw in ["-1", "ninety", "7.5"] {
        clear_quota_env();
        std::env::set_var("QUOTA_RETENTION_DAYS", raw);

        let result = QuotaConfig::from_env();
        assert!(
            matches!(result, Err(ConfigError::InvalidRetentionDays)),
            "{} should not switch retention off",
            raw
        );
    }

    clear_quota_env();
}

#[test]
#[serial]
fn test_quota_config_blank_retention_means_keep_forever() {
    clear_quota_env();
    std::env::set_var("QUOTA_RETENTION_DAYS", "  ");

    let config = QuotaConfig::from_env().unwrap();
    assert_eq!(config.retention_days, None);

    clear_quota_env();
}
