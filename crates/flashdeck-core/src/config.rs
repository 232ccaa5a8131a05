//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the origin the deck is served from and how terminal
//! columns map to swipe distance.
//!
//! Configuration is stored at `~/.config/flashdeck/config.json`. The
//! `FLASHDECK_ORIGIN` environment variable overrides the stored origin.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "flashdeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the configured origin
pub const ORIGIN_ENV: &str = "FLASHDECK_ORIGIN";

/// Origin used when nothing is configured
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080/";

/// Width of one terminal column in device-independent pixels, used to turn
/// mouse drags into swipe distances.
pub const DEFAULT_CELL_WIDTH_PX: f64 = 8.0;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub origin: Option<String>,
    pub cell_width_px: Option<f64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Origin to load the deck from: environment, then config, then default
    pub fn origin(&self) -> Result<Url> {
        let raw = std::env::var(ORIGIN_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.origin.clone())
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        parse_origin(&raw)
    }

    pub fn cell_width_px(&self) -> f64 {
        self.cell_width_px
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_CELL_WIDTH_PX)
    }

    /// Cache buckets for one origin
    pub fn cache_dir(&self, origin: &Url) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(origin_dir_name(origin)))
    }

    /// Rolling log files
    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    /// Durable key/value storage for one origin
    pub fn data_dir(&self, origin: &Url) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(origin_dir_name(origin)))
    }
}

/// Parse an origin URL, making sure relative joins land under its path
pub fn parse_origin(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("Invalid origin URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Origin must be http or https: {}", raw);
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Directory name that keeps each origin's data apart, e.g. `localhost_8080`
fn origin_dir_name(origin: &Url) -> String {
    let host = origin.host_str().unwrap_or("local");
    match origin.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    }
}
