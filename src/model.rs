//! Model descriptions and the `Dynamics` trait.
//!
//! `Dynamics` is the atomic-model contract: the behavior every simulated
//! leaf implements. `ModelDesc` is the static side of a model (its name and
//! declared ports), kept apart from behavior so the coupling graph can be
//! validated before anything runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::Bag;
use crate::time::SimTime;
use crate::types::{ModelName, PortName};

/// Which side of a model a port lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// Static description of a model: identity and interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDesc {
    /// Unique name within the parent's scope
    pub name: ModelName,
    /// Declared input ports
    #[serde(default)]
    pub inputs: Vec<PortName>,
    /// Declared output ports
    #[serde(default)]
    pub outputs: Vec<PortName>,
}

impl ModelDesc {
    /// Creates a description with no ports.
    pub fn new(name: impl Into<ModelName>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declares an input port.
    pub fn with_input(mut self, port: impl Into<PortName>) -> Self {
        self.inputs.push(port.into());
        self
    }

    /// Declares an output port.
    pub fn with_output(mut self, port: impl Into<PortName>) -> Self {
        self.outputs.push(port.into());
        self
    }

    /// Returns true if `port` is a declared input.
    pub fn has_input(&self, port: &str) -> bool {
        self.inputs.iter().any(|p| p == port)
    }

    /// Returns true if `port` is a declared output.
    pub fn has_output(&self, port: &str) -> bool {
        self.outputs.iter().any(|p| p == port)
    }

    /// Returns true if `port` is declared in the given direction.
    pub fn has_port(&self, direction: PortDirection, port: &str) -> bool {
        match direction {
            PortDirection::Input => self.has_input(port),
            PortDirection::Output => self.has_output(port),
        }
    }
}

/// The behavior of an atomic model.
///
/// The engine owns the scheduling record (`last`, `next`) and decides which
/// transition to call; the model owns its state. State may change only in
/// `dint`, `dext` and `dconf`; `ta`, `lambda` and `observation` take `&self`.
///
/// There is no default `dconf`. How simultaneous internal due-ness and
/// external input combine is the model's decision.
pub trait Dynamics: Send {
    /// Resets the model to its initial phase.
    ///
    /// Returns the delay until the first internal event: zero makes the model
    /// imminent at the start time, `SimTime::INFINITY` makes it passive.
    fn start(&mut self, t: SimTime) -> SimTime;

    /// Duration until the next internal event, or `SimTime::INFINITY` when
    /// the model only reacts to input. Must never be negative.
    fn ta(&self, t: SimTime) -> SimTime;

    /// Output function, evaluated only for imminent models and always before
    /// any transition of the same cycle.
    fn lambda(&self, t: SimTime) -> Bag;

    /// Internal transition.
    fn dint(&mut self, t: SimTime);

    /// External transition. `e` is the time elapsed since the last transition.
    fn dext(&mut self, t: SimTime, e: SimTime, bag: &Bag);

    /// Confluent transition: the model is imminent and has input at `t`.
    fn dconf(&mut self, t: SimTime, e: SimTime, bag: &Bag);

    /// Writes a read-only view of the current phase, for diagnostics.
    fn observation(&self, _out: &mut dyn fmt::Write) -> fmt::Result {
        Ok(())
    }
}
