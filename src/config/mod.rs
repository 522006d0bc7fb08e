// src/config/mod.rs

use once_cell::sync::Lazy;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Runtime configuration, loaded once from the environment.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    // ── Collector
    /// Endpoint receiving PAGE_SESSION telemetry events.
    pub collector_url: String,
    /// Per-request timeout for telemetry delivery, seconds.
    pub http_timeout_secs: u64,

    // ── Monitor
    /// Fixed period between monitor flushes, milliseconds.
    pub flush_interval_ms: u64,
    /// Upper bound on the visible-text snapshot, characters.
    pub content_max_chars: usize,

    // ── Logging
    pub log_level: String,
}

/// Read an env var, falling back to `default` when absent or unparseable.
/// Values may carry trailing comments and whitespace, both are stripped.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        // Pick up a .env file when there is one; plain env vars otherwise.
        let _ = dotenvy::dotenv();

        Self {
            collector_url: env_var_or(
                "DRIFT_COLLECTOR_URL",
                "http://127.0.0.1:3333/event".to_string(),
            ),
            http_timeout_secs: env_var_or("DRIFT_HTTP_TIMEOUT_SECS", 5),
            flush_interval_ms: env_var_or("DRIFT_FLUSH_INTERVAL_MS", 5000),
            content_max_chars: env_var_or("DRIFT_CONTENT_MAX_CHARS", 500),
            log_level: env_var_or("DRIFT_LOG_LEVEL", "info".to_string()),
        }
    }

    // --- Convenience accessors ---

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Max tracing level for the subscriber; unknown names fall back to info.
    pub fn max_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<TrackerConfig> = Lazy::new(TrackerConfig::from_env);
