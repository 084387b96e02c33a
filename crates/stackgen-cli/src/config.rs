//! Configuration file management for stackgen.
//!
//! Provides a TOML-based config file at `~/.config/stackgen/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.
//! API keys are never stored in the file; each backend preset names the
//! environment variable that holds its key.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use stackgen_core::generator::presets;
use stackgen_core::orchestrator::{Orchestrator, OrchestratorConfig};

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub backends: BackendsSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Maximum number of technology stacks per task.
    pub stack_limit: usize,
    /// Deadline for a single branch's generator call, in seconds.
    pub branch_timeout_secs: u64,
    /// Maximum number of branches running at once.
    pub max_in_flight: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            stack_limit: defaults.stack_limit,
            branch_timeout_secs: defaults.branch_timeout.as_secs(),
            max_in_flight: defaults.max_in_flight,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsSection {
    /// Backend presets to fan out over, in dispatch order.
    pub enabled: Vec<String>,
    /// Backend answering validation and stack identification. Defaults to
    /// the first enabled backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
}

impl Default for BackendsSection {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_BACKENDS.iter().map(|s| s.to_string()).collect(),
            primary: None,
        }
    }
}

const DEFAULT_BACKENDS: &[&str] = &["openai", "deepseek"];

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the stackgen config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/stackgen` or
/// `~/.config/stackgen`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("stackgen");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("stackgen")
}

/// Return the path to the stackgen config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Load the config file if it exists. A missing file is not an error; a
/// malformed one is.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write a config file, creating parent dirs as needed.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Comma-separated backend presets.
    pub backends: Option<String>,
    pub stack_limit: Option<usize>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct StackgenConfig {
    pub orchestrator: OrchestratorConfig,
    pub backends: Vec<String>,
    pub primary: String,
}

impl StackgenConfig {
    /// Resolve configuration from the user's config file and environment.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = load_config()?;
        Self::resolve_with(cli, file)
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - Backends: `--backends` > `STACKGEN_BACKENDS` > `backends.enabled` > `openai,deepseek`
    /// - Primary: `STACKGEN_PRIMARY_BACKEND` > `backends.primary` > first backend
    /// - Stack limit: `--stack-limit` > `STACKGEN_STACK_LIMIT` > `engine.stack_limit`
    /// - Branch timeout: `STACKGEN_BRANCH_TIMEOUT` > `engine.branch_timeout_secs`
    /// - In-flight cap: `STACKGEN_MAX_IN_FLIGHT` > `engine.max_in_flight`
    pub fn resolve_with(cli: &CliOverrides, file: Option<ConfigFile>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let backends = if let Some(list) = &cli.backends {
            split_list(list)
        } else if let Ok(list) = std::env::var("STACKGEN_BACKENDS") {
            split_list(&list)
        } else {
            file.backends.enabled.clone()
        };

        let primary = match std::env::var("STACKGEN_PRIMARY_BACKEND") {
            Ok(p) => Some(p),
            Err(_) => file.backends.primary.clone(),
        }
        .or_else(|| backends.first().cloned())
        .context("no primary backend: enable at least one backend or set backends.primary")?;

        let stack_limit = match cli.stack_limit {
            Some(n) => n,
            None => env_parse("STACKGEN_STACK_LIMIT")?.unwrap_or(file.engine.stack_limit),
        };
        let branch_timeout_secs =
            env_parse("STACKGEN_BRANCH_TIMEOUT")?.unwrap_or(file.engine.branch_timeout_secs);
        let max_in_flight =
            env_parse("STACKGEN_MAX_IN_FLIGHT")?.unwrap_or(file.engine.max_in_flight);

        if stack_limit == 0 {
            bail!("stack_limit must be at least 1");
        }
        if max_in_flight == 0 {
            bail!("max_in_flight must be at least 1");
        }
        if branch_timeout_secs == 0 {
            bail!("branch_timeout_secs must be at least 1");
        }

        Ok(Self {
            orchestrator: OrchestratorConfig {
                stack_limit,
                branch_timeout: Duration::from_secs(branch_timeout_secs),
                max_in_flight,
            },
            backends,
            primary,
        })
    }

    /// Build generators for every configured backend and wire up the
    /// orchestrator. Missing API keys fail here, at startup.
    pub fn build_orchestrator(&self) -> Result<Orchestrator> {
        let lookup = |key: &str| std::env::var(key).ok();
        let registry = presets::build_registry(&self.backends, lookup)?;

        let primary = match registry.get(&self.primary) {
            Some(generator) => Arc::clone(generator),
            None => {
                let single = presets::build_registry(std::slice::from_ref(&self.primary), lookup)
                    .context("failed to configure primary backend")?;
                single
                    .backends()
                    .first()
                    .map(|b| Arc::clone(&b.generator))
                    .context("primary backend registry is empty")?
            }
        };

        tracing::info!(
            backends = ?registry.list(),
            primary = %self.primary,
            stack_limit = self.orchestrator.stack_limit,
            "orchestrator configured"
        );

        Ok(Orchestrator::new(
            primary,
            Arc::new(registry),
            self.orchestrator.clone(),
        ))
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} is not a valid number: {raw:?}")),
        Err(_) => Ok(None),
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
