//! Periodic event source.

use std::fmt;

use crate::event::Bag;
use crate::model::Dynamics;
use crate::time::SimTime;
use crate::types::Parameters;

/// Emits a sequence number on `out` every `period` time units, starting
/// `offset` after the start time.
#[derive(Debug)]
pub struct Generator {
    period: SimTime,
    offset: SimTime,
    seq: u64,
}

impl Generator {
    pub fn new(period: SimTime) -> Self {
        Self {
            period,
            offset: SimTime::ZERO,
            seq: 0,
        }
    }

    /// Delays the first emission.
    pub fn with_offset(mut self, offset: SimTime) -> Self {
        self.offset = offset;
        self
    }

    /// Factory form: recognizes `period` (default 1) and `offset` (default 0).
    pub fn from_parameters(params: &Parameters) -> Self {
        let read = |key: &str, default: f64| {
            params
                .get(key)
                .and_then(|s| s.parse::<f64>().ok())
                .and_then(SimTime::try_new)
                .unwrap_or(SimTime::new(default))
        };
        Self::new(read("period", 1.0)).with_offset(read("offset", 0.0))
    }

    /// Number of events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.seq
    }
}

impl Dynamics for Generator {
    fn start(&mut self, _t: SimTime) -> SimTime {
        self.seq = 0;
        self.offset
    }

    fn ta(&self, _t: SimTime) -> SimTime {
        self.period
    }

    fn lambda(&self, t: SimTime) -> Bag {
        Bag::single("out", serde_json::json!({ "seq": self.seq, "time": t }))
    }

    fn dint(&mut self, _t: SimTime) {
        self.seq += 1;
    }

    // no input ports: nothing to react to
    fn dext(&mut self, _t: SimTime, _e: SimTime, _bag: &Bag) {}

    fn dconf(&mut self, t: SimTime, _e: SimTime, _bag: &Bag) {
        self.dint(t);
    }

    fn observation(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "seq={}", self.seq)
    }
}
