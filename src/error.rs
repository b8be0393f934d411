//! Error types for the simulation kernel.
//!
//! Every error here is fatal. Simulation is deterministic, so a failure
//! reproduces on every run; nothing is retried. Configuration errors are
//! raised while the model tree is being built, before any cycle runs.
//! Time-advance and clock errors abort `RootCoordinator::run`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::PortDirection;
use crate::time::SimTime;
use crate::types::{ModelName, PortName};

/// The top-level error type.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("coordinator '{coordinator}' has no child named '{model}'")]
    UnknownModel {
        coordinator: ModelName,
        model: ModelName,
    },

    #[error("model '{model}' has no {direction} port '{port}'")]
    UnknownPort {
        model: ModelName,
        port: PortName,
        direction: PortDirection,
    },

    #[error("coordinator '{coordinator}' already has a child named '{model}'")]
    DuplicateModel {
        coordinator: ModelName,
        model: ModelName,
    },

    #[error("no model factory registered for type '{0}'")]
    UnknownModelType(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("model '{model}' returned an invalid time advance {advance} at t={time}")]
    TimeAdvanceViolation {
        model: ModelName,
        time: SimTime,
        advance: SimTime,
    },

    #[error("model '{model}' asked to transition at t={time} outside its schedule [{last}, {next}]")]
    StaleSchedule {
        model: ModelName,
        time: SimTime,
        last: SimTime,
        next: SimTime,
    },

    #[error("clock regression in '{model}': next event t={next} is before current t={current}")]
    ClockRegression {
        model: ModelName,
        current: SimTime,
        next: SimTime,
    },
}

impl SimError {
    /// Returns true for errors raised while building the model tree.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SimError::UnknownModel { .. }
                | SimError::UnknownPort { .. }
                | SimError::DuplicateModel { .. }
                | SimError::UnknownModelType(_)
                | SimError::Config(_)
        )
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
