//! Process configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present, then
//! each `LEDGER_*` variable overrides its default. Unset and empty variables
//! both fall back to the default.

use crate::ledger::TargetSheet;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_TEMPLATE_NAME: &str = "template.xlsm";
const DEFAULT_STATIC_DIR: &str = "frontend/dist";
const DEFAULT_JSON_LIMIT: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub template_name: String,
    pub export_dir: PathBuf,
    pub target_sheet: TargetSheet,
    pub static_dir: PathBuf,
    pub json_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            template_name: DEFAULT_TEMPLATE_NAME.to_string(),
            export_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            target_sheet: TargetSheet::First,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            json_limit: DEFAULT_JSON_LIMIT,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                log::warn!("Ignoring unreadable .env file: {}", err);
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let upload_dir = var("LEDGER_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let export_dir = var("LEDGER_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| upload_dir.clone());

        Ok(Self {
            host: var("LEDGER_HOST").unwrap_or(defaults.host),
            port: parse_number("LEDGER_PORT", var("LEDGER_PORT"), defaults.port)?,
            upload_dir,
            template_name: var("LEDGER_TEMPLATE_NAME").unwrap_or(defaults.template_name),
            export_dir,
            target_sheet: var("LEDGER_TARGET_SHEET")
                .map(TargetSheet::Named)
                .unwrap_or_default(),
            static_dir: var("LEDGER_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            json_limit: parse_number("LEDGER_JSON_LIMIT", var("LEDGER_JSON_LIMIT"), defaults.json_limit)?,
        })
    }

    /// Well-known location of the master template.
    pub fn template_path(&self) -> PathBuf {
        self.upload_dir.join(&self.template_name)
    }

    pub fn bind_addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    /// Config rooted in `dir`, for tests.
    #[cfg(test)]
    pub fn in_dir(dir: &std::path::Path) -> Self {
        Self {
            upload_dir: dir.to_path_buf(),
            export_dir: dir.to_path_buf(),
            ..Self::default()
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value: raw }),
    }
}

/// Creates every directory the server writes into.
pub fn ensure_dirs(config: &AppConfig) -> std::io::Result<()> {
    for dir in [&config.upload_dir, &config.export_dir] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
