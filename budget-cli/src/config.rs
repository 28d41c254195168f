use anyhow::{Context, Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Public SimpleFIN bridge, used when only username/password are configured.
pub const DEFAULT_BRIDGE_URL: &str = "https://beta-bridge.simplefin.org/simplefin";

/// Ten years; SimpleFIN bridges serve far less history than this.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub simplefin: SimpleFinSection,
    pub google: GoogleSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimpleFinSection {
    /// Access URL from the SimpleFIN claim step; may embed `user:pass@`
    pub access_url: String,
    pub username: String,
    pub password: String,
    /// How far back each run asks for transactions
    pub lookback_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoogleSection {
    /// Service-account key file
    pub credentials: PathBuf,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub mapping_sheet: String,
}

impl Default for SimpleFinSection {
    fn default() -> Self {
        Self {
            access_url: String::new(),
            username: String::new(),
            password: String::new(),
            lookback_days: 2,
        }
    }
}

impl Default for GoogleSection {
    fn default() -> Self {
        Self {
            credentials: PathBuf::new(),
            spreadsheet_id: String::new(),
            sheet_name: "transactions".to_string(),
            mapping_sheet: "lookup".to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SimpleFIN credentials required: provide access_url or username/password")]
    MissingSimpleFin,
    #[error("google credentials path required")]
    MissingGoogleCredentials,
    #[error("google Sheets spreadsheet ID required")]
    MissingSpreadsheetId,
    #[error("lookback_days must be between 1 and 3650, got {0}")]
    InvalidLookback(i64),
    #[error("invalid SimpleFIN access_url: {0}")]
    InvalidAccessUrl(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sf = &self.simplefin;
        let has_simplefin =
            !sf.access_url.is_empty() || (!sf.username.is_empty() && !sf.password.is_empty());
        if !has_simplefin {
            return Err(ConfigError::MissingSimpleFin);
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&sf.lookback_days) {
            return Err(ConfigError::InvalidLookback(sf.lookback_days));
        }
        if self.google.credentials.as_os_str().is_empty() {
            return Err(ConfigError::MissingGoogleCredentials);
        }
        if self.google.spreadsheet_id.is_empty() {
            return Err(ConfigError::MissingSpreadsheetId);
        }
        sf.endpoint()?;
        Ok(())
    }
}

/// Where and how to reach SimpleFIN, credentials split out of the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleFinEndpoint {
    /// No trailing slash, no userinfo
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl SimpleFinSection {
    /// `now` minus `lookback_days`, without panicking on out-of-range values.
    pub fn start_date(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ConfigError> {
        TimeDelta::try_days(self.lookback_days)
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or(ConfigError::InvalidLookback(self.lookback_days))
    }

    /// Explicit username/password win over credentials embedded in `access_url`.
    pub fn endpoint(&self) -> Result<SimpleFinEndpoint, ConfigError> {
        let raw = if self.access_url.is_empty() {
            DEFAULT_BRIDGE_URL
        } else {
            self.access_url.as_str()
        };
        let mut url =
            Url::parse(raw).map_err(|e| ConfigError::InvalidAccessUrl(e.to_string()))?;

        let mut username = self.username.clone();
        let mut password = self.password.clone();
        if username.is_empty() && password.is_empty() {
            username = url.username().to_string();
            password = url.password().unwrap_or_default().to_string();
        }
        // set_username/set_password only fail for cannot-be-a-base URLs
        if url.set_username("").is_err() || url.set_password(None).is_err() {
            return Err(ConfigError::InvalidAccessUrl(raw.to_string()));
        }

        Ok(SimpleFinEndpoint {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            username,
            password,
        })
    }
}

/// Printed by `config init`; older setups kept their settings in `config.yaml`.
pub const YAML_MIGRATION_NOTE: &str = "Config is TOML. An existing config.yaml is not read; \
its simplefin and google keys carry over unchanged as [simplefin] and [google] tables.";

pub fn load_config(path: &Path) -> Result<Config> {
    if is_yaml(path) {
        bail!(
            "{} is a YAML file; budget-import reads TOML. {}",
            path.display(),
            YAML_MIGRATION_NOTE
        );
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write a default config unless one already exists. Returns true if written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(path, &Config::default())?;
    Ok(true)
}
