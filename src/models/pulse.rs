//! Self-driven model that emits on every unit of time.
//!
//! `Pulse` waits one time unit, emits its value on `out`, and waits again.
//! An external input switches it to SEND, which emits immediately (`ta = 0`)
//! and falls back to WAIT. A confluent transition applies the internal
//! transition first and then the external one, so input arriving at an
//! imminent pulse still triggers an immediate emission.

use std::fmt;

use crate::event::Bag;
use crate::model::Dynamics;
use crate::time::SimTime;
use crate::types::Parameters;

/// Phase shared by the two-phase example models.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Wait,
    Send,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Wait => write!(f, "WAIT"),
            Phase::Send => write!(f, "SEND"),
        }
    }
}

/// A model whose time advance alternates between 1 (WAIT) and 0 (SEND).
#[derive(Debug)]
pub struct Pulse {
    phase: Phase,
    value: f64,
}

impl Pulse {
    /// Creates a pulse emitting `0.0`.
    pub fn new() -> Self {
        Self::with_value(0.0)
    }

    /// Creates a pulse emitting `value`.
    pub fn with_value(value: f64) -> Self {
        Self {
            phase: Phase::Wait,
            value,
        }
    }

    /// Factory form: recognizes the optional `value` parameter.
    pub fn from_parameters(params: &Parameters) -> Self {
        let value = params
            .get("value")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);
        Self::with_value(value)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl Default for Pulse {
    fn default() -> Self {
        Self::new()
    }
}

impl Dynamics for Pulse {
    fn start(&mut self, _t: SimTime) -> SimTime {
        self.phase = Phase::Wait;
        SimTime::ZERO
    }

    fn ta(&self, _t: SimTime) -> SimTime {
        match self.phase {
            Phase::Wait => SimTime::new(1.0),
            Phase::Send => SimTime::ZERO,
        }
    }

    fn lambda(&self, _t: SimTime) -> Bag {
        Bag::single("out", serde_json::json!(self.value))
    }

    fn dint(&mut self, _t: SimTime) {
        if self.phase == Phase::Send {
            self.phase = Phase::Wait;
        }
    }

    fn dext(&mut self, _t: SimTime, _e: SimTime, _bag: &Bag) {
        self.phase = Phase::Send;
    }

    fn dconf(&mut self, t: SimTime, e: SimTime, bag: &Bag) {
        self.dint(t);
        self.dext(t, e, bag);
    }

    fn observation(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "phase={}", self.phase)
    }
}
