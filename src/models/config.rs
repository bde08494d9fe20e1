use crate::assets::AssetLoader;
use palette_remap::{Palette, PaletteError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Upload and output directories
    #[serde(default)]
    pub storage: StorageConfig,

    /// Worker loop settings
    #[serde(default)]
    pub queue: QueueConfig,

    /// Upload limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Output encoding settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Cross-origin access for the web frontend
    #[serde(default)]
    pub cors: CorsConfig,

    /// Named palettes selectable instead of an explicit color list
    #[serde(default)]
    pub palettes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Scratch directory for raw uploads (deleted after conversion)
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Directory receiving `<job id>.png` results (never cleaned up)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    /// Fallback tick for the worker loop when no enqueue signal arrives
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for a single conversion; 0 disables the limit
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_job_timeout_secs() -> u64 {
    120
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        (self.job_timeout_secs > 0).then(|| Duration::from_secs(self.job_timeout_secs))
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            job_timeout_secs: default_job_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Re-compress result PNGs with oxipng
    #[serde(default)]
    pub optimize: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_cors_enabled")]
    pub enabled: bool,
}

fn default_cors_enabled() -> bool {
    true
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_cors_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse YAML, falling back to defaults on error
    pub fn parse(content: &str) -> Self {
        match serde_yaml::from_str::<Self>(content) {
            Ok(config) => {
                tracing::info!(
                    upload_dir = %config.storage.upload_dir.display(),
                    output_dir = %config.storage.output_dir.display(),
                    palettes = config.palettes.len(),
                    "Loaded configuration"
                );
                config
            }
            Err(e) => {
                tracing::warn!(%e, "Failed to parse config, using defaults");
                Self::default()
            }
        }
    }

    /// Override storage directories (from UPLOAD_DIR / OUTPUT_DIR)
    pub fn with_storage_overrides(
        mut self,
        upload_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = upload_dir {
            self.storage.upload_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.storage.output_dir = dir;
        }
        self
    }

    /// Build the named palette, or `None` if no such preset exists
    pub fn preset(&self, name: &str) -> Option<Result<Palette, PaletteError>> {
        self.palettes
            .get(&name.to_lowercase())
            .map(|colors| Palette::from_hex(colors.as_slice()))
    }
}
