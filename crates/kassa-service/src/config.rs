//! Service configuration.

use chrono::{FixedOffset, Offset, Utc};

/// Default report offset: UTC+05:00.
const DEFAULT_REPORT_UTC_OFFSET_MINUTES: i32 = 5 * 60;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8051").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/kassa").
    pub data_dir: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// UTC offset, in minutes, that calendar days are evaluated in for the
    /// daily payment views.
    pub report_utc_offset_minutes: i32,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8051".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/kassa".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            report_utc_offset_minutes: std::env::var("REPORT_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REPORT_UTC_OFFSET_MINUTES),
        }
    }

    /// The report offset, falling back to UTC+05:00 when out of range.
    #[must_use]
    pub fn report_offset(&self) -> FixedOffset {
        [self.report_utc_offset_minutes, DEFAULT_REPORT_UTC_OFFSET_MINUTES]
            .into_iter()
            .find_map(|minutes| minutes.checked_mul(60).and_then(FixedOffset::east_opt))
            .unwrap_or_else(|| Utc.fix())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8051".into(),
            data_dir: "/data/kassa".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            report_utc_offset_minutes: DEFAULT_REPORT_UTC_OFFSET_MINUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offset_is_plus_five() {
        let config = ServiceConfig::default();
        assert_eq!(config.report_offset().local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn out_of_range_offset_falls_back() {
        let config = ServiceConfig {
            report_utc_offset_minutes: 100_000,
            ..ServiceConfig::default()
        };
        assert_eq!(config.report_offset().local_minus_utc(), 5 * 3600);
    }
}
