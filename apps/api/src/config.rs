use anyhow::{bail, Context, Result};

use crate::matching::vocabulary::SkillVocabulary;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every key has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Default threshold for both match endpoints. Requests may override it.
    pub match_threshold: f64,
    pub vocabulary: SkillVocabulary,
    pub notify_recipient: String,
    pub notify_webhook_url: Option<String>,
    pub notify_timeout_secs: u64,
    pub extraction_timeout_secs: u64,
    /// Request body cap for document uploads.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let match_threshold = parse_env("MATCH_THRESHOLD", 0.5_f64)?;
        if !(0.0..=1.0).contains(&match_threshold) {
            bail!("MATCH_THRESHOLD must be between 0.0 and 1.0, got {match_threshold}");
        }

        let vocabulary = match std::env::var("SKILL_VOCABULARY") {
            Ok(raw) => SkillVocabulary::from_terms(raw.split(','))
                .context("SKILL_VOCABULARY must contain at least one term")?,
            Err(_) => SkillVocabulary::default(),
        };

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite:skillsync.db?mode=rwc"),
            port: parse_env("PORT", 8000_u16)?,
            rust_log: env_or("RUST_LOG", "info"),
            match_threshold,
            vocabulary,
            notify_recipient: env_or("NOTIFY_RECIPIENT", "candidate@example.com"),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            notify_timeout_secs: parse_env("NOTIFY_TIMEOUT_SECS", 10_u64)?,
            extraction_timeout_secs: parse_env("EXTRACTION_TIMEOUT_SECS", 30_u64)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
