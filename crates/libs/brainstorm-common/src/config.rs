use config::{Config, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Inline resource content cap (50 KB).
pub const DEFAULT_MAX_INLINE_BYTES: usize = 50 * 1024;

/// Message payload / file-referenced resource cap (500 KB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 500 * 1024;

/// Maximum JSON nesting depth accepted in payloads.
pub const DEFAULT_MAX_JSON_DEPTH: usize = 100;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub wait: WaitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for all persisted state.
    pub data_root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Max bytes for inline resource content.
    #[serde(default = "default_max_inline_bytes")]
    pub max_inline_bytes: usize,
    /// Max bytes for message payloads and file-referenced resources.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Max JSON nesting depth for structured payloads.
    #[serde(default = "default_max_json_depth")]
    pub max_json_depth: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WaitConfig {
    /// Default long-poll deadline when the caller gives none.
    #[serde(default = "default_wait_timeout_secs")]
    pub default_timeout_secs: u64,
    /// Hard ceiling for caller-supplied long-poll deadlines.
    #[serde(default = "default_wait_max_secs")]
    pub max_timeout_secs: u64,
}

fn default_max_inline_bytes() -> usize {
    DEFAULT_MAX_INLINE_BYTES
}

fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

fn default_max_json_depth() -> usize {
    DEFAULT_MAX_JSON_DEPTH
}

fn default_wait_timeout_secs() -> u64 {
    300
}

fn default_wait_max_secs() -> u64 {
    3600
}

/// Default data root: `~/.brainstorm`, or `./.brainstorm` when no home
/// directory can be determined (e.g. stripped-down containers).
pub fn default_data_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".brainstorm")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_root: default_data_root(),
            },
            limits: LimitsConfig {
                max_inline_bytes: DEFAULT_MAX_INLINE_BYTES,
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                max_json_depth: DEFAULT_MAX_JSON_DEPTH,
            },
            wait: WaitConfig {
                default_timeout_secs: default_wait_timeout_secs(),
                max_timeout_secs: default_wait_max_secs(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration with 12-factor style env var support.
    ///
    /// Priority order (highest to lowest):
    /// 1. `BRAINSTORM_DATA_ROOT` / `BRAINSTORM_MAX_PAYLOAD_SIZE` env vars
    /// 2. Config files (`config/default.toml`, `config/{run_mode}.toml`)
    /// 3. Hardcoded defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default(
                "storage.data_root",
                default_data_root().to_string_lossy().to_string(),
            )?
            .set_default("limits.max_inline_bytes", DEFAULT_MAX_INLINE_BYTES as i64)?
            .set_default("limits.max_payload_bytes", DEFAULT_MAX_PAYLOAD_BYTES as i64)?
            .set_default("limits.max_json_depth", DEFAULT_MAX_JSON_DEPTH as i64)?
            .set_default("wait.default_timeout_secs", default_wait_timeout_secs() as i64)?
            .set_default("wait.max_timeout_secs", default_wait_max_secs() as i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        if let Ok(root) = env::var("BRAINSTORM_DATA_ROOT") {
            if !root.is_empty() {
                builder = builder.set_override("storage.data_root", root)?;
            }
        }
        if let Ok(size) = env::var("BRAINSTORM_MAX_PAYLOAD_SIZE") {
            if let Ok(bytes) = size.parse::<i64>() {
                builder = builder.set_override("limits.max_payload_bytes", bytes)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Clamp a caller-supplied wait timeout to `[1, max_timeout_secs]`,
    /// substituting the default when none was given.
    pub fn effective_wait_timeout(&self, requested_secs: Option<u64>) -> u64 {
        requested_secs
            .unwrap_or(self.wait.default_timeout_secs)
            .clamp(1, self.wait.max_timeout_secs)
    }
}
