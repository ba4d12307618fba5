use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::time::Duration;

use crate::models::FeatureCategory;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub quota: QuotaConfig,
    pub security: SecurityConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Security configuration for production deployments
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// True if server is behind a proxy that terminates SSL (nginx, Cloudflare, etc.)
    /// When true: cookie_secure=true is enabled
    pub ssl_proxy: bool,
    /// Session encryption key (64 hex chars). Required when ssl_proxy=true
    pub session_secret_key: Option<String>,
}

/// Daily quota configuration
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Reference zone for the accounting day. The day resets at local
    /// midnight of this offset for every user.
    pub utc_offset: FixedOffset,
    pub limits: QuotaLimits,
    /// Entries older than this many days are purged. None keeps them forever.
    pub retention_days: Option<u32>,
    pub retention_interval: Duration,
}

/// Per-category daily limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub summary: i64,
    pub flashcards: i64,
    pub questions: i64,
    pub edit_content: i64,
    pub term_paper: i64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            summary: 5,
            flashcards: 5,
            questions: 5,
            edit_content: 10,
            term_paper: 2,
        }
    }
}

impl QuotaLimits {
    /// Load per-category limits, falling back to defaults on missing or invalid values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            summary: env_i64("QUOTA_LIMIT_SUMMARY", defaults.summary),
            flashcards: env_i64("QUOTA_LIMIT_FLASHCARDS", defaults.flashcards),
            questions: env_i64("QUOTA_LIMIT_QUESTIONS", defaults.questions),
            edit_content: env_i64("QUOTA_LIMIT_EDIT_CONTENT", defaults.edit_content),
            term_paper: env_i64("QUOTA_LIMIT_TERM_PAPER", defaults.term_paper),
        }
    }

    pub fn for_category(&self, category: FeatureCategory) -> i64 {
        match category {
            FeatureCategory::Summary => self.summary,
            FeatureCategory::Flashcards => self.flashcards,
            FeatureCategory::Questions => self.questions,
            FeatureCategory::EditContent => self.edit_content,
            FeatureCategory::TermPaper => self.term_paper,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            limits: QuotaLimits::default(),
            retention_days: None,
            retention_interval: Duration::from_secs(3600),
        }
    }
}

impl QuotaConfig {
    /// Load quota configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let offset_minutes: i32 = match env::var("QUOTA_UTC_OFFSET_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidUtcOffset)?,
            Err(_) => 0,
        };

        // FixedOffset accepts strictly less than a day in either direction
        let utc_offset = FixedOffset::east_opt(offset_minutes.saturating_mul(60))
            .ok_or(ConfigError::InvalidUtcOffset)?;

        let retention_days = match env::var("QUOTA_RETENTION_DAYS") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidRetentionDays)?,
            ),
            _ => None,
        };

        Ok(Self {
            utc_offset,
            limits: QuotaLimits::from_env(),
            retention_days,
            retention_interval: Duration::from_secs(
                env::var("QUOTA_RETENTION_INTERVAL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse::<u64>()
                    .unwrap_or(3600)
                    .max(1),
            ),
        })
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            quota: QuotaConfig::from_env()?,
            security: SecurityConfig::from_env()?,
        })
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidUtcOffset,
    InvalidRetentionDays,
    MissingDatabaseUrl,
    MissingSessionSecret,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::InvalidUtcOffset => write!(
                f,
                "QUOTA_UTC_OFFSET_MINUTES must be a whole number between -1439 and 1439"
            ),
            ConfigError::InvalidRetentionDays => write!(
                f,
                "QUOTA_RETENTION_DAYS must be a non-negative whole number of days"
            ),
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
            ConfigError::MissingSessionSecret => {
                write!(
                    f,
                    "SESSION_SECRET_KEY is required when SSL_PROXY is enabled"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl SecurityConfig {
    /// Load security configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret_key = env::var("SESSION_SECRET_KEY").ok();

        let ssl_proxy = env::var("SSL_PROXY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        // When SSL_PROXY is enabled, SESSION_SECRET_KEY is required
        if ssl_proxy && session_secret_key.is_none() {
            return Err(ConfigError::MissingSessionSecret);
        }

        Ok(Self {
            ssl_proxy,
            session_secret_key,
        })
    }
}
