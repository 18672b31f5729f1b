//! Service options and their YAML binding.
//!
//! Options are bound once, validated, and then treated as immutable: the
//! service reads them at construction time only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::error::ConfigError;

/// Event-contract generation selected by the `version` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractVersion {
    /// Two channels (task due, merged error), fire-and-forget delivery.
    V1,
    /// Three channels with categorized errors, handlers awaited in order.
    V2,
}

/// Opaque value-processor definition, forwarded to the engine's registry.
///
/// The adapter never interprets this; the engine's templating layer does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueProcessor {
    /// Name of the processor implementation inside the engine.
    pub handler: String,
    /// Processor-specific settings.
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

impl ValueProcessor {
    /// Create a processor definition with no extra settings.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            options: HashMap::new(),
        }
    }
}

/// Options for constructing a [`SchedulerService`](crate::SchedulerService).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceOptions {
    /// Contract generation tag, e.g. `"v1.0"` or `"v2.0"`.
    pub version: String,
    /// Location the engine loads its task definitions from. Required.
    pub config_path: String,
    /// Engine polling interval override in milliseconds.
    ///
    /// Values of zero or below are accepted and ignored; the engine keeps
    /// its own default.
    pub tick_interval: Option<i64>,
    /// Value processors to register with the engine, keyed by name.
    ///
    /// Keys are case-sensitive. Names already present in the engine's
    /// registry are left untouched.
    pub value_processors: HashMap<String, ValueProcessor>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            version: "v1.0".to_string(),
            config_path: String::new(),
            tick_interval: None,
            value_processors: HashMap::new(),
        }
    }
}

impl ServiceOptions {
    /// Create options for the given task-source path, defaults elsewhere.
    pub fn new(config_path: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            ..Self::default()
        }
    }

    /// Load options from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::FileReadError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string and validate them.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let options: ServiceOptions = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options and resolve the contract generation.
    ///
    /// `config_path` must be non-empty, `version` must name a known
    /// generation, and every value-processor entry must carry a non-empty
    /// name and handler. Runs before any engine object is constructed.
    pub fn validate(&self) -> Result<ContractVersion, ConfigError> {
        if self.config_path.trim().is_empty() {
            return Err(ConfigError::MissingField("config_path".into()));
        }
        for (name, processor) in &self.value_processors {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "value processor name cannot be empty".into(),
                ));
            }
            if processor.handler.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(format!(
                    "value processor '{}' has no handler",
                    name
                )));
            }
        }
        self.contract_version()
    }

    /// Resolve the `version` tag into a contract generation.
    pub fn contract_version(&self) -> Result<ContractVersion, ConfigError> {
        let major = self
            .version
            .trim()
            .trim_start_matches(['v', 'V'])
            .split('.')
            .next()
            .unwrap_or("");
        match major {
            "1" => Ok(ContractVersion::V1),
            "2" => Ok(ContractVersion::V2),
            _ => Err(ConfigError::UnsupportedVersion(self.version.clone())),
        }
    }

    /// The tick-interval override to apply, if any.
    ///
    /// Non-positive values are treated as "not set".
    pub fn effective_tick_interval(&self) -> Option<Duration> {
        self.tick_interval
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms as u64))
    }
}
