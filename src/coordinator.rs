//! The Parallel DEVS coordinator.
//!
//! A `Coordinator` drives the children of one coupled model. One simulation
//! cycle at time `t` is split into two phases so coordinators nest:
//!
//! 1. [`Coordinator::output`]: every imminent child (`next_time == t`)
//!    evaluates its output function. The bags are routed through the coupling
//!    graph: sibling deliveries are buffered per child, boundary deliveries
//!    are returned to the caller as this coordinator's own output. No child
//!    state changes in this phase.
//! 2. [`Coordinator::transition`]: input arriving on the coordinator's own
//!    ports is routed into the child buffers, then each child that is
//!    imminent and/or has input gets exactly one transition, in child order.
//!    The schedule is recomputed as the minimum over the children.
//!
//! For a nested coordinator the parent calls these two phases exactly as it
//! does for an atomic simulator, with the same `t`. Its internal children are
//! never visible to the parent's coupling graph.
//!
//! With the `parallel` feature, the output functions of imminent atomic
//! children are evaluated on the rayon pool. Results are collected in child
//! order, so routing and tracing are identical to the sequential build.
//!
//! # Example
//!
//! ```
//! use pdevs::coordinator::Coordinator;
//! use pdevs::coupling::GraphManager;
//! use pdevs::model::ModelDesc;
//! use pdevs::models::Pulse;
//! use pdevs::time::SimTime;
//! use pdevs::trace::NullSink;
//!
//! let mut graph = GraphManager::new();
//! graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
//! graph.add_output_coupling("a", "out", "out");
//!
//! let mut root = Coordinator::new(ModelDesc::new("root").with_output("out"), graph).unwrap();
//! root.start(SimTime::ZERO, &NullSink).unwrap();
//!
//! let (next, bag) = root.step(SimTime::ZERO, &NullSink).unwrap();
//! assert_eq!(next, SimTime::new(1.0));
//! assert_eq!(bag.len(), 1);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use std::fmt;

use crate::coupling::{ChildId, Endpoint, GraphManager};
use crate::error::{SimError, SimResult};
use crate::event::Bag;
use crate::model::ModelDesc;
use crate::simulator::Child;
use crate::stats::CycleStats;
use crate::time::SimTime;
use crate::trace::{emit, TraceKind, TraceSink};

/// Engine for one coupled model.
pub struct Coordinator {
    desc: ModelDesc,
    graph: GraphManager,
    last: SimTime,
    next: SimTime,
    /// Per-child input accumulated during the current cycle
    inputs: Vec<Bag>,
    stats: CycleStats,
}

impl Coordinator {
    /// Builds a coordinator over `graph`, resolving and validating every
    /// coupling against the declared ports.
    pub fn new(desc: ModelDesc, mut graph: GraphManager) -> SimResult<Self> {
        graph.resolve(&desc)?;
        let inputs = vec![Bag::new(); graph.len()];
        Ok(Self {
            desc,
            graph,
            last: SimTime::ZERO,
            next: SimTime::INFINITY,
            inputs,
            stats: CycleStats::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &ModelDesc {
        &self.desc
    }

    pub fn graph(&self) -> &GraphManager {
        &self.graph
    }

    /// Time of the last cycle that touched this coordinator.
    pub fn last_time(&self) -> SimTime {
        self.last
    }

    /// Earliest next event among the children; `INFINITY` when quiescent.
    pub fn next_time(&self) -> SimTime {
        self.next
    }

    /// Counters of this coordinator and every nested one.
    pub fn stats(&self) -> CycleStats {
        let mut total = self.stats.clone();
        for child in self.graph.children_slice() {
            if let Child::Coupled(coord) = child {
                total.merge(&coord.stats());
            }
        }
        total
    }

    /// Starts every child in enumeration order and seeds the schedule.
    pub fn start(&mut self, t: SimTime, sink: &dyn TraceSink) -> SimResult<SimTime> {
        for child in self.graph.children_mut() {
            child.start(t, sink)?;
        }
        for input in &mut self.inputs {
            *input = Bag::new();
        }
        self.stats = CycleStats::default();
        self.last = t;
        self.next = self.min_next_time();
        tracing::debug!(coordinator = %self.desc.name, %t, next = %self.next, "coordinator started");
        Ok(self.next)
    }

    /// Runs one full cycle at `t` for a top-level coordinator: output phase,
    /// then transition phase with no external input.
    ///
    /// Returns the next event time and the bag emitted on this coordinator's
    /// output ports.
    pub fn step(&mut self, t: SimTime, sink: &dyn TraceSink) -> SimResult<(SimTime, Bag)> {
        let output = self.output(t, sink)?;
        self.transition(t, &Bag::new(), sink)?;
        Ok((self.next, output))
    }

    /// Output phase of the cycle at `t`.
    ///
    /// Evaluates every imminent child's output before any transition,
    /// buffers sibling deliveries and returns what leaves through this
    /// coordinator's own output ports.
    pub fn output(&mut self, t: SimTime, sink: &dyn TraceSink) -> SimResult<Bag> {
        if t < self.next {
            return Ok(Bag::new());
        }
        if t > self.next {
            return Err(self.stale(t));
        }

        let leaf_bags = self.leaf_outputs(t);

        let mut produced: Vec<(usize, Bag)> = Vec::new();
        let mut leaves = leaf_bags.into_iter().peekable();
        for (i, child) in self.graph.children_mut().iter_mut().enumerate() {
            if child.next_time() != t {
                continue;
            }
            match child {
                Child::Atomic(sim) => {
                    // computed above, in the same child order
                    if let Some((_, bag)) = leaves.next_if(|(j, _)| *j == i) {
                        self.stats.lambdas += 1;
                        emit(sink, sim.name(), t, TraceKind::Lambda, || {
                            format!("messages = {}", bag)
                        });
                        produced.push((i, bag));
                    }
                }
                Child::Coupled(coord) => {
                    let bag = coord.output(t, sink)?;
                    produced.push((i, bag));
                }
            }
        }

        let mut external = Bag::new();
        for (i, bag) in produced {
            self.route(Endpoint::Child(ChildId(i)), bag, &mut external);
        }

        tracing::trace!(coordinator = %self.desc.name, %t, out = external.len(), "output phase done");
        Ok(external)
    }

    /// Transition phase of the cycle at `t`.
    ///
    /// `bag` holds input on this coordinator's own input ports. Each child
    /// that is imminent or has input receives exactly one transition.
    pub fn transition(&mut self, t: SimTime, bag: &Bag, sink: &dyn TraceSink) -> SimResult<()> {
        if t < self.last || t > self.next {
            return Err(self.stale(t));
        }

        if !bag.is_empty() {
            let mut unused = Bag::new();
            self.route(Endpoint::External, bag.clone(), &mut unused);
        }

        let Self {
            graph,
            inputs,
            stats,
            ..
        } = self;
        for (i, child) in graph.children_mut().iter_mut().enumerate() {
            let imminent = child.next_time() == t;
            if !imminent && inputs[i].is_empty() {
                continue;
            }
            let input = std::mem::take(&mut inputs[i]);
            match child {
                Child::Atomic(sim) => {
                    if let Some(kind) = sim.transition(t, &input, sink)? {
                        stats.record_transition(kind);
                    }
                }
                Child::Coupled(coord) => coord.transition(t, &input, sink)?,
            }
        }

        let next = self.min_next_time();
        if next < t {
            return Err(SimError::ClockRegression {
                model: self.desc.name.clone(),
                current: t,
                next,
            });
        }
        self.last = t;
        self.next = next;
        tracing::trace!(coordinator = %self.desc.name, %t, next = %self.next, "transition phase done");
        Ok(())
    }

    /// Writes observations of every leaf under this coordinator.
    pub fn observe(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for child in self.graph.children_slice() {
            child.observe(out)?;
        }
        Ok(())
    }

    /// Routes `bag` leaving `source`. Sibling deliveries go to the child
    /// buffers; boundary deliveries are appended to `external`.
    fn route(&mut self, source: Endpoint, bag: Bag, external: &mut Bag) {
        for event in bag {
            if let Endpoint::Child(id) = source {
                let declared = self
                    .graph
                    .child(id)
                    .map(|c| c.desc().has_output(&event.port))
                    .unwrap_or(false);
                if !declared {
                    let model = self.graph.child(id).map(|c| c.name()).unwrap_or("?");
                    tracing::warn!(
                        coordinator = %self.desc.name,
                        %model,
                        port = %event.port,
                        "event on undeclared output port dropped"
                    );
                    self.stats.events_undeclared += 1;
                    continue;
                }
            }

            let destinations = self.graph.destinations(source, &event.port);
            if destinations.is_empty() {
                self.stats.events_discarded += 1;
                continue;
            }
            for dest in destinations {
                let copy = event.on_port(dest.port.clone());
                match dest.endpoint {
                    Endpoint::Child(target) => self.inputs[target.0].push(copy),
                    Endpoint::External => external.push(copy),
                }
                self.stats.events_routed += 1;
            }
        }
    }

    /// Output functions of the imminent atomic children, in child order.
    #[cfg(not(feature = "parallel"))]
    fn leaf_outputs(&mut self, t: SimTime) -> Vec<(usize, Bag)> {
        self.graph
            .children_slice()
            .iter()
            .enumerate()
            .filter_map(|(i, child)| match child {
                Child::Atomic(sim) if sim.next_time() == t => Some((i, sim.output(t))),
                _ => None,
            })
            .collect()
    }

    /// Output functions of the imminent atomic children, in child order,
    /// evaluated on the rayon pool.
    #[cfg(feature = "parallel")]
    fn leaf_outputs(&mut self, t: SimTime) -> Vec<(usize, Bag)> {
        self.graph
            .children_mut()
            .par_iter_mut()
            .enumerate()
            .filter_map(|(i, child)| match child {
                Child::Atomic(sim) if sim.next_time() == t => Some((i, sim.output(t))),
                _ => None,
            })
            .collect()
    }

    fn min_next_time(&self) -> SimTime {
        self.graph
            .children_slice()
            .iter()
            .map(Child::next_time)
            .min()
            .unwrap_or(SimTime::INFINITY)
    }

    fn stale(&self, t: SimTime) -> SimError {
        SimError::StaleSchedule {
            model: self.desc.name.clone(),
            time: t,
            last: self.last,
            next: self.next,
        }
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.desc.name)
            .field("last", &self.last)
            .field("next", &self.next)
            .field("graph", &self.graph)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Collector, Pulse, Relay};
    use crate::trace::{NullSink, TraceLog};

    fn pulse_relay() -> Coordinator {
        let mut graph = GraphManager::new();
        graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
        graph.add_atomic(
            ModelDesc::new("b").with_input("in").with_output("out"),
            Box::new(Relay::new()),
        );
        graph.add_internal_coupling("a", "out", "b", "in");
        Coordinator::new(ModelDesc::new("root"), graph).unwrap()
    }

    #[test]
    fn test_start_takes_min_of_children() {
        let mut coord = pulse_relay();
        let next = coord.start(SimTime::ZERO, &NullSink).unwrap();
        assert_eq!(next, SimTime::ZERO);
    }

    #[test]
    fn test_empty_coordinator_is_quiescent() {
        let mut coord = Coordinator::new(ModelDesc::new("empty"), GraphManager::new()).unwrap();
        assert!(coord.start(SimTime::ZERO, &NullSink).unwrap().is_infinite());
    }

    #[test]
    fn test_output_routes_to_sibling_without_mutation() {
        let mut coord = pulse_relay();
        coord.start(SimTime::ZERO, &NullSink).unwrap();

        let out = coord.output(SimTime::ZERO, &NullSink).unwrap();
        assert!(out.is_empty());
        // b has a pending input, no transition ran yet
        assert_eq!(coord.inputs[1].len(), 1);
        assert_eq!(coord.inputs[1].iter().next().unwrap().port, "in");
        assert_eq!(coord.stats().transitions(), 0);
        assert_eq!(coord.stats().lambdas, 1);
    }

    #[test]
    fn test_transition_dispatch() {
        let log = TraceLog::new();
        let mut coord = pulse_relay();
        coord.start(SimTime::ZERO, &log).unwrap();
        log.clear();

        let (next, _) = coord.step(SimTime::ZERO, &log).unwrap();
        // b moved to SEND with ta = 0
        assert_eq!(next, SimTime::ZERO);

        let elements = log.elements();
        assert_eq!(elements.filter_model_name("a").filter_kind(TraceKind::Internal).len(), 1);
        assert_eq!(elements.filter_model_name("b").filter_kind(TraceKind::External).len(), 1);

        let stats = coord.stats();
        assert_eq!(stats.internal_transitions, 1);
        assert_eq!(stats.external_transitions, 1);
        assert_eq!(stats.events_routed, 1);
    }

    #[test]
    fn test_uncoupled_output_is_discarded() {
        let mut graph = GraphManager::new();
        graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
        let mut coord = Coordinator::new(ModelDesc::new("root"), graph).unwrap();
        coord.start(SimTime::ZERO, &NullSink).unwrap();

        let (_, bag) = coord.step(SimTime::ZERO, &NullSink).unwrap();
        assert!(bag.is_empty());
        assert_eq!(coord.stats().events_discarded, 1);
    }

    #[test]
    fn test_undeclared_output_is_dropped() {
        let mut graph = GraphManager::new();
        // Pulse emits on "out" but nothing is declared
        graph.add_atomic(ModelDesc::new("a"), Box::new(Pulse::new()));
        let mut coord = Coordinator::new(ModelDesc::new("root"), graph).unwrap();
        coord.start(SimTime::ZERO, &NullSink).unwrap();
        coord.step(SimTime::ZERO, &NullSink).unwrap();
        assert_eq!(coord.stats().events_undeclared, 1);
    }

    #[test]
    fn test_external_input_reaches_child() {
        let mut graph = GraphManager::new();
        graph.add_atomic(ModelDesc::new("sink").with_input("in"), Box::new(Collector::new()));
        graph.add_input_coupling("in", "sink", "in");
        let mut coord = Coordinator::new(ModelDesc::new("inner").with_input("in"), graph).unwrap();
        coord.start(SimTime::ZERO, &NullSink).unwrap();

        coord
            .transition(SimTime::new(2.0), &Bag::single("in", serde_json::json!(5)), &NullSink)
            .unwrap();
        assert_eq!(coord.stats().external_transitions, 1);
        assert_eq!(coord.last_time(), SimTime::new(2.0));
    }

    #[test]
    fn test_transition_past_schedule_is_stale() {
        let mut coord = pulse_relay();
        coord.start(SimTime::ZERO, &NullSink).unwrap();
        let err = coord.transition(SimTime::new(5.0), &Bag::new(), &NullSink).unwrap_err();
        assert!(matches!(err, SimError::StaleSchedule { .. }));
    }
}
