//! Passive sink that keeps everything it receives.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::event::Bag;
use crate::model::Dynamics;
use crate::time::SimTime;

/// One delivery seen by a [`Collector`].
#[derive(Clone, Debug, PartialEq)]
pub struct Received {
    pub time: SimTime,
    pub elapsed: SimTime,
    pub bag: Bag,
}

/// Shared view of a collector's deliveries, readable after the model has
/// been moved into a coordinator.
pub type CollectorHandle = Arc<Mutex<Vec<Received>>>;

/// Passive model that records every bag delivered to it.
#[derive(Debug, Default)]
pub struct Collector {
    received: CollectorHandle,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the delivery log.
    pub fn handle(&self) -> CollectorHandle {
        Arc::clone(&self.received)
    }

    fn record(&mut self, t: SimTime, e: SimTime, bag: &Bag) {
        self.received.lock().push(Received {
            time: t,
            elapsed: e,
            bag: bag.clone(),
        });
    }
}

impl Dynamics for Collector {
    fn start(&mut self, _t: SimTime) -> SimTime {
        self.received.lock().clear();
        SimTime::INFINITY
    }

    fn ta(&self, _t: SimTime) -> SimTime {
        SimTime::INFINITY
    }

    fn lambda(&self, _t: SimTime) -> Bag {
        Bag::new()
    }

    fn dint(&mut self, _t: SimTime) {}

    fn dext(&mut self, t: SimTime, e: SimTime, bag: &Bag) {
        self.record(t, e, bag);
    }

    fn dconf(&mut self, t: SimTime, e: SimTime, bag: &Bag) {
        self.record(t, e, bag);
    }

    fn observation(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "received={}", self.received.lock().len())
    }
}
