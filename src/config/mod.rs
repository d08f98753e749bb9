//! Pipeline configuration.
//!
//! Loaded once from environment variables at startup; unset numeric values
//! fall back to defaults. Only the encryption key is mandatory.

use anyhow::{Context, Result};

/// Runtime settings for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Base64-encoded 32-byte master key for credential encryption.
    pub encryption_key: String,
    /// Seconds between orchestration runs.
    pub fetch_interval_secs: u64,
    /// Maximum whole-run attempts per orchestration (initial + retries).
    pub max_attempts: u32,
    /// Fixed delay between run retries, in seconds.
    pub retry_delay_secs: u64,
    /// Soft time budget for one run; exceeding it aborts in FAILURE.
    pub run_time_budget_secs: u64,
}

impl PipelineConfig {
    /// Builds the configuration from `CONTEXTA_*` environment variables.
    ///
    /// `CONTEXTA_ENCRYPTION_KEY` is required; everything else defaults.
    pub fn from_env() -> Result<Self> {
        let encryption_key = std::env::var("CONTEXTA_ENCRYPTION_KEY")
            .context("CONTEXTA_ENCRYPTION_KEY is required (base64-encoded 32-byte key)")?;

        let mut cfg = Self {
            database_path: "contexta.db".to_string(),
            encryption_key,
            fetch_interval_secs: 300,
            max_attempts: 3,
            retry_delay_secs: 60,
            run_time_budget_secs: 300,
        };

        if let Ok(v) = std::env::var("CONTEXTA_DB") {
            cfg.database_path = v;
        }
        if let Ok(v) = std::env::var("CONTEXTA_FETCH_INTERVAL_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                cfg.fetch_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("CONTEXTA_MAX_ATTEMPTS") {
            if let Ok(n) = v.parse::<u32>() {
                cfg.max_attempts = n;
            }
        }
        if let Ok(v) = std::env::var("CONTEXTA_RETRY_DELAY_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                cfg.retry_delay_secs = n;
            }
        }
        if let Ok(v) = std::env::var("CONTEXTA_RUN_TIME_BUDGET_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                cfg.run_time_budget_secs = n;
            }
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests; the process env is shared across the
    // test harness's threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "CONTEXTA_ENCRYPTION_KEY",
            "CONTEXTA_DB",
            "CONTEXTA_FETCH_INTERVAL_SECS",
            "CONTEXTA_MAX_ATTEMPTS",
            "CONTEXTA_RETRY_DELAY_SECS",
            "CONTEXTA_RUN_TIME_BUDGET_SECS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let result = PipelineConfig::from_env();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("CONTEXTA_ENCRYPTION_KEY"));
    }

    #[test]
    fn test_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("CONTEXTA_ENCRYPTION_KEY", "key");

        let cfg = PipelineConfig::from_env().unwrap();
        assert_eq!(cfg.database_path, "contexta.db");
        assert_eq!(cfg.fetch_interval_secs, 300);
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.retry_delay_secs, 60);
        assert_eq!(cfg.run_time_budget_secs, 300);

        clear_env();
    }

    #[test]
    fn test_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("CONTEXTA_ENCRYPTION_KEY", "key");
        std::env::set_var("CONTEXTA_DB", "/tmp/test.db");
        std::env::set_var("CONTEXTA_MAX_ATTEMPTS", "5");
        std::env::set_var("CONTEXTA_RUN_TIME_BUDGET_SECS", "not-a-number");

        let cfg = PipelineConfig::from_env().unwrap();
        assert_eq!(cfg.database_path, "/tmp/test.db");
        assert_eq!(cfg.max_attempts, 5);
        // Unparseable values fall back to the default.
        assert_eq!(cfg.run_time_budget_secs, 300);

        clear_env();
    }
}
