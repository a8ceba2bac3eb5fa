//! Engine configuration.

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the `RocksDB` data directory (default: "/data/tiervest").
    pub data_dir: String,

    /// UTC hour at which the daily job chain triggers (default: 0, clamped
    /// to 0..=23).
    pub settlement_hour_utc: u32,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let settlement_hour_utc = std::env::var("SETTLEMENT_HOUR_UTC")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0)
            .min(23);

        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/tiervest".into()),
            settlement_hour_utc,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: "/data/tiervest".into(),
            settlement_hour_utc: 0,
        }
    }
}
