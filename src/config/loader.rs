use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::store::DEFAULT_STORE_FILE;

pub const CONFIG_FILE: &str = "apibench.json";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ApibenchConfig {
    /// Data file, relative to the config directory.
    pub store: Option<String>,
    /// Environment name or id used when none is given explicitly.
    #[serde(rename = "defaultEnvironment")]
    pub default_environment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ApibenchConfig,
    /// Directory holding the config file; relative paths resolve against it.
    pub dir: PathBuf,
}

impl LoadedConfig {
    pub fn store_path(&self) -> PathBuf {
        let store = self.config.store.as_deref().unwrap_or(DEFAULT_STORE_FILE);
        resolve_relative(&self.dir, Path::new(store))
    }
}

/// Loads `apibench.json` from `target`, which may be the file itself or
/// the directory holding it. A missing file is not an error.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved, dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;

    let config: ApibenchConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;

    Ok(Some(LoadedConfig { config, dir }))
}

pub fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
