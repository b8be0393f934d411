//! # pdevs
//!
//! A Parallel DEVS simulation kernel.
//!
//! Atomic models implement [`Dynamics`]. A [`Coordinator`] wires its
//! children together through a [`GraphManager`] and runs each cycle in two
//! phases: every imminent model's output is computed first, then every model
//! that is imminent or has received input applies exactly one transition.
//! Coordinators nest, so a coupled model is itself a child of its parent.
//! A [`RootCoordinator`] drives the top coordinator across `[t0, tend]`.
//!
//! ## Features
//!
//! - `parallel` - Evaluate the output functions of imminent leaves on the
//!   rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use pdevs::{Coordinator, GraphManager, ModelDesc, RootCoordinator, SimTime, TraceLog};
//! use pdevs::models::{Pulse, Relay};
//!
//! let mut graph = GraphManager::new();
//! graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
//! graph.add_atomic(
//!     ModelDesc::new("b").with_input("in").with_output("out"),
//!     Box::new(Relay::new()),
//! );
//! graph.add_internal_coupling("a", "out", "b", "in");
//! let top = Coordinator::new(ModelDesc::new("root"), graph).unwrap();
//!
//! let log = TraceLog::shared();
//! let mut rc = RootCoordinator::new(SimTime::ZERO, SimTime::new(10.0), top)
//!     .with_trace(log.clone());
//! rc.run().unwrap();
//!
//! println!("{}", log.flush());
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use pdevs::{RootCoordinator, SimConfig};
//! use pdevs::registry::create_default_registry;
//!
//! let config = SimConfig::from_yaml_file("model.yaml")?;
//! let (mut rc, trace) = RootCoordinator::from_config(&config, &create_default_registry())?;
//! rc.run()?;
//! ```

pub mod config;
pub mod coordinator;
pub mod coupling;
pub mod error;
pub mod event;
pub mod model;
pub mod models;
pub mod registry;
pub mod root;
pub mod simulator;
pub mod stats;
pub mod time;
pub mod trace;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, ModelConfig, SimConfig, SimConfigBuilder};
pub use coordinator::Coordinator;
pub use coupling::{ChildId, Coupling, GraphManager, PortRef};
pub use error::{SimError, SimResult};
pub use event::{Bag, ExternalEvent};
pub use model::{Dynamics, ModelDesc, PortDirection};
pub use registry::{create_default_registry, ModelRegistry};
pub use root::RootCoordinator;
pub use simulator::{Child, Simulator, Transition};
pub use stats::{CycleStats, SimulationStats, Timer};
pub use time::SimTime;
pub use trace::{null_sink, NullSink, SharedSink, TraceElement, TraceElements, TraceKind, TraceLog, TraceSink};
pub use types::{ModelName, Parameters, PortName};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// overrides `level` when set.
///
/// # Example
///
/// ```rust,ignore
/// pdevs::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
