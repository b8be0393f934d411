//! Scheduling wrappers for the children of a coordinator.
//!
//! A [`Simulator`] drives one [`Dynamics`] value and keeps its scheduling
//! record: the time of the last transition and the time of the next internal
//! event (`last + ta`). [`Child`] is the tagged variant stored in a
//! coordinator's arena: either an atomic simulator or a nested coordinator.

use std::fmt;

use crate::coordinator::Coordinator;
use crate::error::{SimError, SimResult};
use crate::event::Bag;
use crate::model::{Dynamics, ModelDesc};
use crate::time::SimTime;
use crate::trace::{emit, TraceKind, TraceSink};

/// Which transition function a cycle applied to a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    Internal,
    External,
    Confluent,
}

impl Transition {
    /// Chooses the transition for a model that is `imminent` and/or has input.
    /// Returns `None` when neither holds.
    pub fn select(imminent: bool, has_input: bool) -> Option<Transition> {
        match (imminent, has_input) {
            (true, false) => Some(Transition::Internal),
            (false, true) => Some(Transition::External),
            (true, true) => Some(Transition::Confluent),
            (false, false) => None,
        }
    }

    fn trace_kind(self) -> TraceKind {
        match self {
            Transition::Internal => TraceKind::Internal,
            Transition::External => TraceKind::External,
            Transition::Confluent => TraceKind::Confluent,
        }
    }
}

/// Drives one atomic model.
pub struct Simulator {
    desc: ModelDesc,
    dynamics: Box<dyn Dynamics>,
    last: SimTime,
    next: SimTime,
}

impl Simulator {
    /// Wraps a model. The schedule is empty until [`Simulator::start`].
    pub fn new(desc: ModelDesc, dynamics: Box<dyn Dynamics>) -> Self {
        Self {
            desc,
            dynamics,
            last: SimTime::ZERO,
            next: SimTime::INFINITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &ModelDesc {
        &self.desc
    }

    /// Time of the last transition.
    pub fn last_time(&self) -> SimTime {
        self.last
    }

    /// Time of the next internal event.
    pub fn next_time(&self) -> SimTime {
        self.next
    }

    /// Read access to the wrapped model.
    pub fn dynamics(&self) -> &dyn Dynamics {
        self.dynamics.as_ref()
    }

    /// Initializes the model and seeds the schedule at `t`.
    pub fn start(&mut self, t: SimTime, sink: &dyn TraceSink) -> SimResult<SimTime> {
        emit(sink, self.name(), t, TraceKind::Start, String::new);
        let advance = self.dynamics.start(t);
        self.check_advance(t, advance)?;
        self.last = t;
        self.next = t + advance;
        tracing::trace!(model = %self.desc.name, %t, next = %self.next, "simulator started");
        Ok(self.next)
    }

    /// Evaluates the output function. Does not touch the schedule.
    pub fn output(&self, t: SimTime) -> Bag {
        self.dynamics.lambda(t)
    }

    /// Applies the transition selected by imminence and input at `t`, then
    /// reschedules. Returns which transition ran, if any.
    pub fn transition(
        &mut self,
        t: SimTime,
        bag: &Bag,
        sink: &dyn TraceSink,
    ) -> SimResult<Option<Transition>> {
        if t < self.last || t > self.next {
            return Err(SimError::StaleSchedule {
                model: self.desc.name.clone(),
                time: t,
                last: self.last,
                next: self.next,
            });
        }

        let Some(kind) = Transition::select(t == self.next, !bag.is_empty()) else {
            return Ok(None);
        };

        let elapsed = t - self.last;
        match kind {
            Transition::Internal => {
                emit(sink, self.name(), t, kind.trace_kind(), String::new);
                self.dynamics.dint(t);
            }
            Transition::External => {
                emit(sink, self.name(), t, kind.trace_kind(), || {
                    format!("messages = {}", bag)
                });
                self.dynamics.dext(t, elapsed, bag);
            }
            Transition::Confluent => {
                emit(sink, self.name(), t, kind.trace_kind(), || {
                    format!("messages = {}", bag)
                });
                self.dynamics.dconf(t, elapsed, bag);
            }
        }

        let advance = self.dynamics.ta(t);
        emit(sink, self.name(), t, TraceKind::TimeAdvance, || advance.to_string());
        self.check_advance(t, advance)?;

        self.last = t;
        self.next = t + advance;
        tracing::trace!(model = %self.desc.name, %t, ?kind, next = %self.next, "transition applied");
        Ok(Some(kind))
    }

    fn check_advance(&self, t: SimTime, advance: SimTime) -> SimResult<()> {
        if advance.is_negative() {
            return Err(SimError::TimeAdvanceViolation {
                model: self.desc.name.clone(),
                time: t,
                advance,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("name", &self.desc.name)
            .field("last", &self.last)
            .field("next", &self.next)
            .finish()
    }
}

/// A child of a coordinator.
#[derive(Debug)]
pub enum Child {
    Atomic(Simulator),
    Coupled(Box<Coordinator>),
}

impl Child {
    pub fn name(&self) -> &str {
        &self.desc().name
    }

    pub fn desc(&self) -> &ModelDesc {
        match self {
            Child::Atomic(sim) => sim.desc(),
            Child::Coupled(coord) => coord.desc(),
        }
    }

    pub fn last_time(&self) -> SimTime {
        match self {
            Child::Atomic(sim) => sim.last_time(),
            Child::Coupled(coord) => coord.last_time(),
        }
    }

    pub fn next_time(&self) -> SimTime {
        match self {
            Child::Atomic(sim) => sim.next_time(),
            Child::Coupled(coord) => coord.next_time(),
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Child::Atomic(_))
    }

    pub(crate) fn start(&mut self, t: SimTime, sink: &dyn TraceSink) -> SimResult<SimTime> {
        match self {
            Child::Atomic(sim) => sim.start(t, sink),
            Child::Coupled(coord) => coord.start(t, sink),
        }
    }

    /// Writes observations of every leaf under this child, one per line.
    pub fn observe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Child::Atomic(sim) => {
                write!(out, "{}: ", sim.name())?;
                sim.dynamics().observation(out)?;
                writeln!(out)
            }
            Child::Coupled(coord) => coord.observe(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pulse, Relay};
    use crate::trace::{NullSink, TraceLog};

    #[test]
    fn test_transition_select() {
        assert_eq!(Transition::select(true, false), Some(Transition::Internal));
        assert_eq!(Transition::select(false, true), Some(Transition::External));
        assert_eq!(Transition::select(true, true), Some(Transition::Confluent));
        assert_eq!(Transition::select(false, false), None);
    }

    #[test]
    fn test_start_seeds_schedule() {
        let mut sim = Simulator::new(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
        let next = sim.start(SimTime::new(2.0), &NullSink).unwrap();
        assert_eq!(next, SimTime::new(2.0));
        assert_eq!(sim.last_time(), SimTime::new(2.0));

        let mut passive = Simulator::new(ModelDesc::new("b").with_input("in"), Box::new(Relay::new()));
        assert!(passive.start(SimTime::ZERO, &NullSink).unwrap().is_infinite());
    }

    #[test]
    fn test_internal_then_reschedule() {
        let mut sim = Simulator::new(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
        sim.start(SimTime::ZERO, &NullSink).unwrap();

        let kind = sim.transition(SimTime::ZERO, &Bag::new(), &NullSink).unwrap();
        assert_eq!(kind, Some(Transition::Internal));
        assert_eq!(sim.next_time(), SimTime::new(1.0));
    }

    #[test]
    fn test_external_passes_elapsed() {
        let log = TraceLog::new();
        let mut sim = Simulator::new(ModelDesc::new("b").with_input("in"), Box::new(Relay::new()));
        sim.start(SimTime::new(1.0), &log).unwrap();

        let bag = Bag::single("in", serde_json::json!(1));
        let kind = sim.transition(SimTime::new(4.0), &bag, &log).unwrap();
        assert_eq!(kind, Some(Transition::External));
        assert_eq!(sim.next_time(), SimTime::new(4.0));

        let ext = log.elements().filter_kind(TraceKind::External);
        assert_eq!(ext.len(), 1);
        assert!(ext.iter().next().unwrap().comment.contains("in"));
    }

    #[test]
    fn test_stale_schedule_rejected() {
        let mut sim = Simulator::new(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
        sim.start(SimTime::ZERO, &NullSink).unwrap();
        sim.transition(SimTime::ZERO, &Bag::new(), &NullSink).unwrap();

        // next is 1; t = 3 would skip a due internal event
        let err = sim.transition(SimTime::new(3.0), &Bag::new(), &NullSink).unwrap_err();
        assert!(matches!(err, SimError::StaleSchedule { .. }));
    }

    struct Broken;

    impl Dynamics for Broken {
        fn start(&mut self, _t: SimTime) -> SimTime {
            SimTime::ZERO
        }
        fn ta(&self, _t: SimTime) -> SimTime {
            SimTime::new(-1.0)
        }
        fn lambda(&self, _t: SimTime) -> Bag {
            Bag::new()
        }
        fn dint(&mut self, _t: SimTime) {}
        fn dext(&mut self, _t: SimTime, _e: SimTime, _bag: &Bag) {}
        fn dconf(&mut self, _t: SimTime, _e: SimTime, _bag: &Bag) {}
    }

    #[test]
    fn test_negative_advance_is_fatal() {
        let mut sim = Simulator::new(ModelDesc::new("broken"), Box::new(Broken));
        sim.start(SimTime::ZERO, &NullSink).unwrap();
        let err = sim.transition(SimTime::ZERO, &Bag::new(), &NullSink).unwrap_err();
        match err {
            SimError::TimeAdvanceViolation { model, advance, .. } => {
                assert_eq!(model, "broken");
                assert!(advance.is_negative());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
