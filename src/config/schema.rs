/// Configuration schema and defaults for the reachard client.
///
/// Sections: `[api]`, `[store]`, `[charts]`, `[logging]`. Every field has a
/// built-in default; users only set what they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level reachard configuration.
///
/// Maps directly to `~/.reachard/config.toml` and `.reachard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachardConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub charts: ChartsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Reachard server, without the `/v0` prefix.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7272".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [store]
// ---------------------------------------------------------------------------

/// Credential store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the store document. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.reachard/store.json".to_string(),
        }
    }
}

impl StoreConfig {
    /// The store path with a leading `~` expanded.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        expand_home(&self.path)
    }
}

// ---------------------------------------------------------------------------
// [charts]
// ---------------------------------------------------------------------------

/// Target detail chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Expected spacing between latency samples (seconds). Wider spacing is
    /// drawn as a gap.
    pub latency_step_seconds: i64,
    /// How far back the latency chart reaches (hours).
    pub latency_window_hours: i64,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            latency_step_seconds: 60,
            latency_window_hours: 24,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Expand a leading `~/` (or a bare `~`) to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

impl ReachardConfig {
    /// Annotated default config written by `reachard config init`.
    pub fn default_toml() -> String {
        r#"# reachard client configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (REACHARD_*)
#   2. Project config (.reachard.toml in current directory)
#   3. User global config (~/.reachard/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:7272"
timeout_ms = 10000

[store]
path = "~/.reachard/store.json"   # Session token lives here

[charts]
latency_step_seconds = 60         # Wider sample spacing is drawn as a gap
latency_window_hours = 24

[logging]
level = "warn"                    # error | warn | info | debug | trace (RUST_LOG wins)
"#
        .to_string()
    }
}
