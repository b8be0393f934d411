//! Configuration system for the simulation kernel.
//!
//! A model tree can be described declaratively in YAML or JSON and turned
//! into coordinators by a [`ModelRegistry`](crate::registry::ModelRegistry).
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   t0: 0
//!   tend: 10
//!   log_level: info
//!   trace: true
//!
//! model:
//!   name: root
//!   children:
//!     - name: a
//!       type: Pulse
//!       outputs: [out]
//!     - name: b
//!       type: Relay
//!       inputs: [in]
//!       outputs: [out]
//!   couplings:
//!     - from: a.out
//!       to: b.in
//! ```
//!
//! A model with `children` is coupled; any other model is atomic and names
//! the registered `type` that implements it. In a coupling, `model.port`
//! names a child's port and a bare `port` names the enclosing model's own
//! boundary port.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::coupling::{Coupling, PortRef};
use crate::model::ModelDesc;
use crate::time::SimTime;
use crate::types::Parameters;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Global simulation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Start of the simulated span
    #[serde(default = "default_t0")]
    pub t0: SimTime,

    /// End of the simulated span (inclusive)
    #[serde(default = "default_tend")]
    pub tend: SimTime,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to record a lifecycle trace
    #[serde(default)]
    pub trace: bool,
}

fn default_t0() -> SimTime {
    SimTime::ZERO
}

fn default_tend() -> SimTime {
    SimTime::new(10.0)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            t0: default_t0(),
            tend: default_tend(),
            log_level: default_log_level(),
            trace: false,
        }
    }
}

/// A coupling written as `"model.port"` / `"port"` strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouplingConfig {
    pub from: String,
    pub to: String,
}

impl CouplingConfig {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Parses both ends into a [`Coupling`].
    pub fn to_coupling(&self) -> ConfigResult<Coupling> {
        Ok(Coupling::new(parse_port_ref(&self.from)?, parse_port_ref(&self.to)?))
    }
}

/// Parses `"model.port"` into a child port and `"port"` into a boundary port.
pub fn parse_port_ref(s: &str) -> ConfigResult<PortRef> {
    let s = s.trim();
    let invalid = || ConfigError::Validation(format!("invalid port reference '{}'", s));
    match s.split_once('.') {
        Some((model, port)) => {
            if model.is_empty() || port.is_empty() || port.contains('.') {
                return Err(invalid());
            }
            Ok(PortRef::child(model, port))
        }
        None if !s.is_empty() => Ok(PortRef::external(s)),
        None => Err(invalid()),
    }
}

/// Configuration for a model, atomic or coupled.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name, unique among siblings
    pub name: String,

    /// Registered implementation name (atomic models only)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,

    /// Construction parameters for the factory
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: Parameters,

    /// Input port names
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Output port names
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Children (coupled models only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ModelConfig>,

    /// Couplings among the children and this model's boundary
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub couplings: Vec<CouplingConfig>,
}

impl ModelConfig {
    /// Describes an atomic model of the given registered type.
    pub fn atomic(name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_type: Some(model_type.into()),
            ..Default::default()
        }
    }

    /// Describes a coupled model.
    pub fn coupled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, port: impl Into<String>) -> Self {
        self.inputs.push(port.into());
        self
    }

    pub fn with_output(mut self, port: impl Into<String>) -> Self {
        self.outputs.push(port.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ModelConfig) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_coupling(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.couplings.push(CouplingConfig::new(from, to));
        self
    }

    /// A model is coupled when it has no implementation type.
    pub fn is_coupled(&self) -> bool {
        self.model_type.is_none()
    }

    /// The static description (name and ports) of this model.
    pub fn desc(&self) -> ModelDesc {
        ModelDesc {
            name: self.name.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        }
    }

    /// Validates this model and its subtree.
    ///
    /// Port and child references in couplings are resolved later by the
    /// coupling graph; this checks shape and syntax only.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("model with empty name".to_string()));
        }
        if self.name.contains('.') {
            return Err(ConfigError::Validation(format!(
                "model name '{}' must not contain '.'",
                self.name
            )));
        }

        if !self.is_coupled() {
            if !self.children.is_empty() || !self.couplings.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "atomic model '{}' cannot have children or couplings",
                    self.name
                )));
            }
            return Ok(());
        }

        let mut names = HashSet::new();
        for child in &self.children {
            child.validate()?;
            if !names.insert(child.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate model '{}' in '{}'",
                    child.name, self.name
                )));
            }
        }
        for coupling in &self.couplings {
            coupling.to_coupling()?;
        }
        Ok(())
    }

    /// Number of atomic models in this subtree.
    pub fn atomic_count(&self) -> usize {
        if self.is_coupled() {
            self.children.iter().map(ModelConfig::atomic_count).sum()
        } else {
            1
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Global simulation parameters
    #[serde(default)]
    pub simulation: SimulationParams,

    /// The top coupled model
    pub model: ModelConfig,
}

impl SimConfig {
    /// Creates a configuration around a top model with default parameters.
    pub fn new(model: ModelConfig) -> Self {
        Self {
            simulation: SimulationParams::default(),
            model,
        }
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.simulation.tend < self.simulation.t0 {
            return Err(ConfigError::Validation(format!(
                "tend ({}) is before t0 ({})",
                self.simulation.tend, self.simulation.t0
            )));
        }
        if self.simulation.t0.is_infinite() {
            return Err(ConfigError::Validation("t0 must be finite".to_string()));
        }
        if !self.model.is_coupled() {
            return Err(ConfigError::Validation(format!(
                "top model '{}' must be coupled",
                self.model.name
            )));
        }
        self.model.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating a `SimConfig` programmatically.
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Creates a builder whose top model is named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: SimConfig::new(ModelConfig::coupled(name)),
        }
    }

    /// Sets the start time.
    pub fn t0(mut self, t0: impl Into<SimTime>) -> Self {
        self.config.simulation.t0 = t0.into();
        self
    }

    /// Sets the end time.
    pub fn tend(mut self, tend: impl Into<SimTime>) -> Self {
        self.config.simulation.tend = tend.into();
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    /// Enables the lifecycle trace.
    pub fn trace(mut self, enable: bool) -> Self {
        self.config.simulation.trace = enable;
        self
    }

    /// Adds a child to the top model.
    pub fn add_model(mut self, model: ModelConfig) -> Self {
        self.config.model.children.push(model);
        self
    }

    /// Adds a coupling to the top model.
    pub fn add_coupling(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.config.model.couplings.push(CouplingConfig::new(from, to));
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
