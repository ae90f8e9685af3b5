use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::CONFIG_ENV;

/// Contents of `config.toml`. Every section and key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VeilConfig {
    pub store: StoreSection,
    pub clipboard: ClipboardSection,
    pub mask: MaskSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: Option<String>,
    pub gpg: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClipboardSection {
    pub timeout_seconds: Option<u64>,
    /// Command that reads the new clipboard contents from stdin.
    pub command: Option<Vec<String>>,
    /// Command that prints the clipboard contents to stdout.
    pub paste_command: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MaskSection {
    pub glyph: Option<String>,
    pub initially_hidden: Option<bool>,
}

/// Config file location: `$VEIL_CONFIG`, else `<xdg config>/veil/config.toml`.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    Ok(xdg_config_dir()?.join("config.toml"))
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config() -> anyhow::Result<VeilConfig> {
    let path = resolve_config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(VeilConfig::default());
    }
    read_config(&path)
}

pub fn read_config(path: &Path) -> anyhow::Result<VeilConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("veil"));
        }
    }
    Ok(home_dir()?.join(".config").join("veil"))
}

pub fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_home(path: &str) -> anyhow::Result<PathBuf> {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}
