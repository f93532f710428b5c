//! Config file, environment overrides and database path resolution.

use std::path::{Path, PathBuf};

use rifa_core::RaffleConfig;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";

const ENV_REMOTE_ENDPOINT: &str = "RIFA_REMOTE_ENDPOINT";
const ENV_SHEET_URL: &str = "RIFA_SHEET_URL";
const ENV_ADMIN_PASSWORD: &str = "RIFA_ADMIN_PASSWORD";
const ENV_DB_PATH: &str = "RIFA_DB_PATH";

/// Everything a command needs to open the ledger
#[derive(Debug, Clone)]
pub struct AppContext {
    pub db_path: PathBuf,
    pub config: RaffleConfig,
}

impl AppContext {
    /// Resolve paths and config from flags and the process environment
    pub fn load(db_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let env = |name: &str| std::env::var(name).ok();
        let config_path = config_path.unwrap_or_else(default_config_path);
        let config = load_config_from_path(&config_path).map_err(CliError::Config)?;
        let config = apply_env_overrides(config, env)
            .normalized()
            .map_err(CliError::Config)?;

        Ok(Self {
            db_path: resolve_db_path(db_path, env),
            config,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rifa")
        .join(CONFIG_FILE_NAME)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rifa")
        .join("rifa.db")
}

/// Read the config file; a missing file means defaults
pub fn load_config_from_path(path: &Path) -> Result<RaffleConfig, String> {
    if !path.exists() {
        return Ok(RaffleConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
    RaffleConfig::from_json(&raw)
        .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))
}

/// Environment values win over the file; blank values are ignored
pub fn apply_env_overrides(
    mut config: RaffleConfig,
    env: impl Fn(&str) -> Option<String>,
) -> RaffleConfig {
    let present = |name: &str| env(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = present(ENV_REMOTE_ENDPOINT) {
        config.remote_endpoint_url = Some(url);
    }
    if let Some(url) = present(ENV_SHEET_URL) {
        config.remote_sheet_url = Some(url);
    }
    if let Some(password) = present(ENV_ADMIN_PASSWORD) {
        config.admin_password = Some(password);
    }
    config
}

pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    cli_db_path
        .or_else(|| {
            env(ENV_DB_PATH)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(default_db_path)
}
