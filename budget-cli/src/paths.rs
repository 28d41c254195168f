use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Config in the working directory takes precedence over the per-user one.
pub const LOCAL_CONFIG: &str = "budget.toml";

pub fn budget_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".budget-import"))
}

pub fn user_config_path() -> Result<PathBuf> {
    Ok(budget_home()?.join("config.toml"))
}

/// `--config` if given, else `./budget.toml` if present, else `~/.budget-import/config.toml`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p);
    }
    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        return Ok(local.to_path_buf());
    }
    user_config_path()
}
