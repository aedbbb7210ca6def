// In crates/app-config/src/types.rs

use serde::Deserialize;
use std::path::PathBuf;

/// The full application configuration. Every section falls back to its
/// defaults, so an empty file (or no file at all) is valid.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Where drafts and saved history are persisted.
    pub storage: StorageSettings,
    /// Synthetic history used before real submissions exist.
    pub seed: SeedSettings,
    pub server: ServerSettings,
    pub polling: PollingSettings,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: "development".into(),
            log_level: "info".into(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one JSON file per storage key.
    pub dir: PathBuf,
    /// Upper bound on the directory's total size. Writes past it are dropped.
    pub quota_bytes: Option<u64>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            // Browsers commonly allow 5MB of local storage per origin.
            quota_bytes: Some(5 * 1024 * 1024),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SeedSettings {
    /// Calendar days of history to generate, counting back from today.
    pub days: u32,
    pub rng_seed: u64,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self { days: 30, rng_seed: 42 }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PollingSettings {
    /// How often the live totals view re-reads the store.
    pub interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}
