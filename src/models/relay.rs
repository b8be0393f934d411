//! Passive model that forwards a signal when poked.

use std::fmt;

use crate::event::Bag;
use crate::model::Dynamics;
use crate::models::pulse::Phase;
use crate::time::SimTime;

/// Passive until it receives input; then emits once on `out` (`ta = 0`) and
/// goes back to waiting forever. Input that coincides with its own emission
/// re-arms it through the confluent transition.
#[derive(Debug)]
pub struct Relay {
    phase: Phase,
    value: f64,
}

impl Relay {
    pub fn new() -> Self {
        Self {
            phase: Phase::Wait,
            value: 0.0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Dynamics for Relay {
    fn start(&mut self, _t: SimTime) -> SimTime {
        self.phase = Phase::Wait;
        SimTime::INFINITY
    }

    fn ta(&self, _t: SimTime) -> SimTime {
        match self.phase {
            Phase::Wait => SimTime::INFINITY,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passive_until_input() {
        let mut relay = Relay::new();
        assert!(relay.start(SimTime::ZERO).is_infinite());
        assert!(relay.ta(SimTime::new(3.0)).is_infinite());

        relay.dext(SimTime::new(3.0), SimTime::new(3.0), &Bag::single("in", serde_json::json!(0)));
        assert_eq!(relay.ta(SimTime::new(3.0)), SimTime::ZERO);

        relay.dint(SimTime::new(3.0));
        assert!(relay.ta(SimTime::new(3.0)).is_infinite());
    }

    #[test]
    fn test_confluent_rearms() {
        let mut relay = Relay::new();
        relay.start(SimTime::ZERO);
        let poke = Bag::single("in", serde_json::json!(0));
        relay.dext(SimTime::new(2.0), SimTime::new(2.0), &poke);
        relay.dconf(SimTime::new(2.0), SimTime::ZERO, &poke);
        assert_eq!(relay.ta(SimTime::new(2.0)), SimTime::ZERO);
    }
}
