//! Asset loading with embedded fallbacks
//!
//! The web frontend and the default `config.yaml` are compiled into the
//! binary. The config can be replaced at runtime:
//!
//! - `CONFIG_FILE` not set: embedded config only (no filesystem access)
//! - `CONFIG_FILE` set but missing: seeded with the embedded default, then used
//! - `CONFIG_FILE` set and present: the file wins

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Embedded web frontend
#[derive(RustEmbed)]
#[folder = "static/"]
#[include = "*.html"]
#[include = "*.js"]
#[include = "*.css"]
struct EmbeddedStatic;

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

/// A static frontend file with its content type
pub struct StaticFile {
    pub data: Cow<'static, [u8]>,
    pub content_type: &'static str,
}

/// Asset loader with optional filesystem override for the config
pub struct AssetLoader {
    /// External config file path (from CONFIG_FILE env var)
    config_file: Option<PathBuf>,
}

impl AssetLoader {
    /// Create a new asset loader
    ///
    /// `config_file` should be `Some` only if CONFIG_FILE was set.
    pub fn new(config_file: Option<PathBuf>) -> Self {
        Self { config_file }
    }

    /// Human readable description of where the config comes from
    pub fn config_source(&self) -> String {
        match self.config_file {
            Some(ref path) if path.exists() => path.display().to_string(),
            Some(_) => "embedded (file not found)".to_string(),
            None => "embedded".to_string(),
        }
    }

    /// Read the config file
    ///
    /// If an external path is configured and exists, uses that.
    /// Otherwise falls back to embedded config.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let Some(ref path) = self.config_file {
            if path.exists() {
                tracing::trace!(path = %path.display(), "Loading config from filesystem");
                return Ok(Cow::Owned(fs::read(path)?));
            }
        }

        EmbeddedConfig::get("config.yaml")
            .map(|f| {
                tracing::trace!("Loading config from embedded assets");
                f.data
            })
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
            })
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        let bytes = self.read_config()?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the embedded config to CONFIG_FILE if it is set but missing.
    ///
    /// Returns `true` if a file was written.
    pub fn seed_config_if_configured(&self) -> io::Result<bool> {
        let Some(ref path) = self.config_file else {
            return Ok(false);
        };
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match EmbeddedConfig::get("config.yaml") {
            Some(data) => {
                fs::write(path, &*data.data)?;
                tracing::info!(path = %path.display(), "Seeded config file with embedded default");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Look up a frontend file by its path relative to `static/`
    pub fn static_file(path: &str) -> Option<StaticFile> {
        let path = path.trim_start_matches('/');
        EmbeddedStatic::get(path).map(|f| StaticFile {
            data: f.data,
            content_type: content_type_for(path),
        })
    }

    /// List embedded frontend files
    pub fn list_static() -> Vec<String> {
        let mut files: Vec<String> = EmbeddedStatic::iter().map(|s| s.to_string()).collect();
        files.sort();
        files
    }
}

fn content_type_for(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        _ => "application/octet-stream",
    }
}
