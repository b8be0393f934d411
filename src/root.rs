//! Top-level simulation driver.
//!
//! The `RootCoordinator` owns the top coordinator, the global clock and the
//! trace sink. [`RootCoordinator::run`] starts the model tree at `t0` and
//! repeats coordinator cycles while the next event time is finite and not
//! after `tend`.
//!
//! # Example
//!
//! ```
//! use pdevs::coordinator::Coordinator;
//! use pdevs::coupling::GraphManager;
//! use pdevs::model::ModelDesc;
//! use pdevs::models::Pulse;
//! use pdevs::root::RootCoordinator;
//! use pdevs::time::SimTime;
//!
//! let mut graph = GraphManager::new();
//! graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
//! let top = Coordinator::new(ModelDesc::new("root"), graph).unwrap();
//!
//! let mut rc = RootCoordinator::new(SimTime::ZERO, SimTime::new(10.0), top);
//! rc.run().unwrap();
//! assert_eq!(rc.stats().counters.cycles, 11);
//! ```

use std::sync::Arc;

use crate::config::SimConfig;
use crate::coordinator::Coordinator;
use crate::error::{SimError, SimResult};
use crate::event::Bag;
use crate::registry::ModelRegistry;
use crate::stats::{SimulationStats, Timer};
use crate::time::SimTime;
use crate::trace::{null_sink, SharedSink, TraceLog};

/// Drives one coordinator across `[t0, tend]`.
pub struct RootCoordinator {
    t0: SimTime,
    tend: SimTime,
    current: SimTime,
    coordinator: Coordinator,
    sink: SharedSink,
    outputs: Vec<(SimTime, Bag)>,
    cycles: u64,
    wall_time_ms: f64,
}

impl RootCoordinator {
    /// Creates a driver with no tracing.
    pub fn new(t0: SimTime, tend: SimTime, coordinator: Coordinator) -> Self {
        Self {
            t0,
            tend,
            current: t0,
            coordinator,
            sink: null_sink(),
            outputs: Vec::new(),
            cycles: 0,
            wall_time_ms: 0.0,
        }
    }

    /// Builds the model tree described by `config` and wraps it.
    ///
    /// When `config.simulation.trace` is set, an in-memory [`TraceLog`] is
    /// attached; it is returned alongside so the caller can read it.
    pub fn from_config(
        config: &SimConfig,
        registry: &ModelRegistry,
    ) -> SimResult<(Self, Option<Arc<TraceLog>>)> {
        let coordinator = registry.build(&config.model)?;
        let mut root = Self::new(config.simulation.t0, config.simulation.tend, coordinator);
        let log = if config.simulation.trace {
            let log = TraceLog::shared();
            root = root.with_trace(log.clone());
            Some(log)
        } else {
            None
        };
        Ok((root, log))
    }

    /// Attaches a trace sink.
    pub fn with_trace(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// The global simulated clock: time of the last executed cycle, or `t0`.
    pub fn current_time(&self) -> SimTime {
        self.current
    }

    pub fn t0(&self) -> SimTime {
        self.t0
    }

    pub fn tend(&self) -> SimTime {
        self.tend
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Bags emitted on the top coordinator's output ports, with their time.
    pub fn outputs(&self) -> &[(SimTime, Bag)] {
        &self.outputs
    }

    /// Runs the simulation. Returns the time of the last executed cycle.
    ///
    /// Stops when the next event time is after `tend` or is infinite. Any
    /// error aborts the run immediately.
    pub fn run(&mut self) -> SimResult<SimTime> {
        let timer = Timer::start();
        self.outputs.clear();
        self.cycles = 0;
        self.current = self.t0;

        tracing::info!(
            model = %self.coordinator.name(),
            t0 = %self.t0,
            tend = %self.tend,
            "simulation started"
        );

        let mut tn = self.coordinator.start(self.t0, self.sink.as_ref())?;
        while tn.is_finite() && tn <= self.tend {
            if tn < self.current {
                return Err(SimError::ClockRegression {
                    model: self.coordinator.name().to_string(),
                    current: self.current,
                    next: tn,
                });
            }

            let (next, bag) = self.coordinator.step(tn, self.sink.as_ref())?;
            self.current = tn;
            self.cycles += 1;
            tracing::debug!(cycle = self.cycles, t = %tn, next = %next, "cycle done");

            if !bag.is_empty() {
                self.outputs.push((tn, bag));
            }
            tn = next;
        }

        self.wall_time_ms = timer.elapsed_ms();
        if tn.is_infinite() {
            tracing::info!(t = %self.current, cycles = self.cycles, "simulation quiescent");
        } else {
            tracing::info!(t = %self.current, cycles = self.cycles, next = %tn, "simulation reached end time");
        }
        Ok(self.current)
    }

    /// Writes every leaf's observation, one line per model, in tree order.
    pub fn observe(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.coordinator.observe(&mut out);
        out
    }

    /// Statistics of the last run.
    pub fn stats(&self) -> SimulationStats {
        let mut counters = self.coordinator.stats();
        counters.cycles = self.cycles;
        SimulationStats {
            name: self.coordinator.name().to_string(),
            t0: self.t0,
            tend: self.tend,
            final_time: self.current,
            counters,
            wall_time_ms: self.wall_time_ms,
        }
    }
}

impl std::fmt::Debug for RootCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootCoordinator")
            .field("t0", &self.t0)
            .field("tend", &self.tend)
            .field("current", &self.current)
            .field("cycles", &self.cycles)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}
