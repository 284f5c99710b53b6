//! Service configuration.
//!
//! Loaded from an optional JSON file, then overridden from `SHIFTDESK_*`
//! environment variables, then validated. Every field is optional in the
//! file; `resolve` fills in defaults.
use crate::generate::engine::DEFAULT_TIMEOUT_SECS;
use crate::generate::{EngineConfig, EngineStep, GeneratorSettings};
use crate::store::{DataPaths, StoreLimits};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:3001";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_MAX_BUNDLES: usize = 10;
const APP_DIR_NAME: &str = "shiftdesk";

pub const ENV_DATA_DIR: &str = "SHIFTDESK_DATA_DIR";
pub const ENV_BIND: &str = "SHIFTDESK_BIND";
pub const ENV_RESOURCES_DIR: &str = "SHIFTDESK_RESOURCES_DIR";
pub const ENV_ENGINE_COMMAND: &str = "SHIFTDESK_ENGINE_COMMAND";
pub const ENV_ENGINE_TIMEOUT_SECS: &str = "SHIFTDESK_ENGINE_TIMEOUT_SECS";
pub const ENV_PYTHON_BIN: &str = "SHIFTDESK_PYTHON_BIN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_documents: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_document_age_days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bundles: Option<usize>,
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Explicit steps; when absent the Python converter/generator pipeline is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<EngineStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_bin: Option<String>,
}

/// Fully defaulted settings ready to build the store, generator, and server.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub resources_dir: PathBuf,
    pub limits: StoreLimits,
    pub max_bundles: usize,
    pub engine: EngineConfig,
}

impl ResolvedConfig {
    pub fn paths(&self) -> DataPaths {
        DataPaths::new(self.data_dir.clone())
    }

    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            engine: self.engine.clone(),
            resources_dir: self.resources_dir.clone(),
            max_bundles: self.max_bundles,
        }
    }
}

/// Load a config file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let Some(path) = path else {
        return Ok(ServiceConfig::default());
    };
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ServiceConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    Ok(config)
}

/// Persist a config in a stable JSON format.
pub fn write_config(path: &Path, config: &ServiceConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize service config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Apply `SHIFTDESK_*` overrides from `vars` (normally `std::env::vars()`).
pub fn apply_env_overrides(
    config: &mut ServiceConfig,
    vars: &BTreeMap<String, String>,
) -> Result<()> {
    let get = |name: &str| {
        vars.get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    };
    if let Some(value) = get(ENV_DATA_DIR) {
        config.data_dir = Some(PathBuf::from(value));
    }
    if let Some(value) = get(ENV_BIND) {
        config.bind = Some(value.to_string());
    }
    if let Some(value) = get(ENV_RESOURCES_DIR) {
        config.resources_dir = Some(PathBuf::from(value));
    }
    if let Some(value) = get(ENV_ENGINE_COMMAND) {
        let step = EngineStep::parse(value).map_err(|err| anyhow!("{ENV_ENGINE_COMMAND}: {err}"))?;
        config.engine.steps = Some(vec![step]);
    }
    if let Some(value) = get(ENV_ENGINE_TIMEOUT_SECS) {
        let secs = value
            .parse::<u64>()
            .with_context(|| format!("{ENV_ENGINE_TIMEOUT_SECS} must be a whole number of seconds"))?;
        config.engine.timeout_secs = Some(secs);
    }
    if let Some(value) = get(ENV_PYTHON_BIN) {
        config.engine.python_bin = Some(value.to_string());
    }
    Ok(())
}

pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    if let Some(bind) = config.bind.as_deref() {
        bind.parse::<SocketAddr>()
            .map_err(|err| anyhow!("bind must be host:port (got {bind:?}): {err}"))?;
    }
    if config.max_documents == Some(0) {
        return Err(anyhow!("max_documents must be at least 1"));
    }
    if config.max_bundles == Some(0) {
        return Err(anyhow!("max_bundles must be at least 1"));
    }
    if config.engine.timeout_secs == Some(0) {
        return Err(anyhow!("engine.timeout_secs must be at least 1"));
    }
    if let Some(steps) = &config.engine.steps {
        if steps.is_empty() {
            return Err(anyhow!("engine.steps must list at least one step"));
        }
        for (index, step) in steps.iter().enumerate() {
            if step.program.trim().is_empty() {
                return Err(anyhow!("engine.steps[{index}].program must be non-empty"));
            }
        }
    }
    if let Some(python) = config.engine.python_bin.as_deref() {
        if python.trim().is_empty() {
            return Err(anyhow!("engine.python_bin must be non-empty"));
        }
    }
    Ok(())
}

/// Default data directory: the platform's local data dir, then home.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow!("cannot determine a data directory; pass --data-dir"))
}

/// Fill in defaults. `data_dir_override` (the `--data-dir` flag) wins over
/// both the file and the environment.
pub fn resolve(config: &ServiceConfig, data_dir_override: Option<&Path>) -> Result<ResolvedConfig> {
    validate_config(config)?;
    let data_dir = match data_dir_override.or(config.data_dir.as_deref()) {
        Some(dir) => dir.to_path_buf(),
        None => default_data_dir()?,
    };
    let bind_text = config.bind.as_deref().unwrap_or(DEFAULT_BIND);
    let bind: SocketAddr = bind_text
        .parse()
        .with_context(|| format!("parse bind address {bind_text:?}"))?;
    let resources_dir = config
        .resources_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("resources"));
    let limits = StoreLimits {
        max_documents: config
            .max_documents
            .unwrap_or(StoreLimits::default().max_documents),
        max_document_age_days: config
            .max_document_age_days
            .unwrap_or(StoreLimits::default().max_document_age_days),
    };
    let python = config.engine.python_bin.as_deref().unwrap_or(DEFAULT_PYTHON);
    let mut engine = match &config.engine.steps {
        Some(steps) => EngineConfig {
            steps: steps.clone(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        },
        None => EngineConfig::python_pipeline(python),
    };
    if let Some(secs) = config.engine.timeout_secs {
        engine.timeout = Duration::from_secs(secs);
    }
    Ok(ResolvedConfig {
        data_dir,
        bind,
        resources_dir,
        limits,
        max_bundles: config.max_bundles.unwrap_or(DEFAULT_MAX_BUNDLES),
        engine,
    })
}

/// Apply `SHIFTDESK_*` overrides from the process environment. Variables
/// that are not valid UTF-8 are skipped.
pub fn apply_process_env(config: &mut ServiceConfig) -> Result<()> {
    let vars: BTreeMap<String, String> = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .filter(|(key, _)| key.starts_with("SHIFTDESK_"))
        .collect();
    apply_env_overrides(config, &vars)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
