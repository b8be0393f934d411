//! Pulse and relay example.
//!
//! Model `a` emits on `out` once per time unit. Model `b` is passive until a
//! message arrives on `in`, then emits once at the same simulated time. The
//! run covers `[0, 10]` and prints the lifecycle trace of both models.

use pdevs::models::{Pulse, Relay};
use pdevs::{Coordinator, GraphManager, ModelDesc, RootCoordinator, SimTime, TraceKind, TraceLog};

const T_END: f64 = 10.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pdevs::init_logging("info");

    println!("==== Pulse / relay example ====");
    println!("a.out -> b.in over [0, {T_END}]\n");

    let mut graph = GraphManager::new();
    graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
    graph.add_atomic(
        ModelDesc::new("b").with_input("in").with_output("out"),
        Box::new(Relay::new()),
    );
    graph.add_internal_coupling("a", "out", "b", "in");
    let top = Coordinator::new(ModelDesc::new("root"), graph)?;

    let log = TraceLog::shared();
    let mut root = RootCoordinator::new(SimTime::ZERO, SimTime::new(T_END), top).with_trace(log.clone());

    log.clear();
    root.run()?;

    let trace = log.flush();
    print!("{}", trace);

    let pokes = trace.filter_model_name("b").filter_kind(TraceKind::External).len();
    println!("\nb was poked {} times", pokes);
    println!("final state:\n{}", root.observe());
    print!("{}", root.stats().summary());
    Ok(())
}
