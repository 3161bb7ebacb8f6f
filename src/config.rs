use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the store lives when nothing else says so
pub const DEFAULT_DATABASE: &str = "~/.watchgit.db";

/// Environment override for the store location
pub const DATABASE_ENV: &str = "WATCHGIT_DB";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WatchgitConfig {
    pub database: Option<String>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("watchgit").join("config.toml"))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<WatchgitConfig>> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: WatchgitConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Pick the raw store location: flag, then environment, then config file,
/// then [`DEFAULT_DATABASE`].
pub fn database_location(
    flag: Option<&str>,
    env: Option<String>,
    config: Option<&WatchgitConfig>,
) -> String {
    flag.map(str::to_string)
        .or(env.filter(|v| !v.is_empty()))
        .or_else(|| config.and_then(|c| c.database.clone()))
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

/// Shell-style expansion of `~` and `$VAR` in a configured location.
pub fn expand_location(raw: &str) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| anyhow::anyhow!("cannot expand store location '{}': {}", raw, e))?;
    if expanded.is_empty() {
        anyhow::bail!("store location is empty");
    }
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Create the directory that will hold the store file.
pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    match db_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create store directory {}", dir.display())),
        _ => Ok(()),
    }
}
