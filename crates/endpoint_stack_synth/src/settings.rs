//! Configuration loading: stack config file plus process environment.
//!
//! Precedence, highest first: CLI flags, config file, environment
//! (`CDK_DEFAULT_ACCOUNT`, `CDK_DEFAULT_REGION`), built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use endpoint_stack_core::{EndpointStackConfig, SynthError};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_OUTDIR: &str = "cdk.out";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] SynthError),
}

/// Process-level settings read from the environment (and `.env`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProcessSettings {
    #[serde(default)]
    pub cdk_default_account: Option<String>,
    #[serde(default)]
    pub cdk_default_region: Option<String>,
    #[serde(default)]
    pub cdk_outdir: Option<PathBuf>,
}

impl ProcessSettings {
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.cdk_outdir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR))
    }
}

/// A parsed stack config and the directory relative code paths resolve against.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: EndpointStackConfig,
    pub base_dir: PathBuf,
}

/// Reads the config file, or falls back to defaults rooted at `cwd`.
pub fn load_stack_config(path: Option<&Path>, cwd: &Path) -> Result<LoadedConfig, SettingsError> {
    let Some(path) = path else {
        debug!("no config file given, using defaults");
        return Ok(LoadedConfig {
            config: EndpointStackConfig::default(),
            base_dir: cwd.to_path_buf(),
        });
    };

    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let raw = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
        path: path.clone(),
        source,
    })?;
    let config: EndpointStackConfig =
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;

    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());
    debug!(
        path = %path.display(),
        base_dir = %base_dir.display(),
        "loaded stack config"
    );

    Ok(LoadedConfig { config, base_dir })
}

/// Fills environment gaps left by the config file, then validates.
pub fn apply_process_defaults(
    config: &mut EndpointStackConfig,
    settings: &ProcessSettings,
) -> Result<(), SettingsError> {
    let env = &mut config.stack.env;
    if env.account.is_none() {
        env.account = settings.cdk_default_account.clone();
    }
    if env.region.is_none() {
        env.region = settings.cdk_default_region.clone();
    }
    config.validate()?;
    Ok(())
}
