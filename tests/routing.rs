//! Tests for event routing through the coupling graph.

use pdevs::models::{Collector, Generator, Pulse};
use pdevs::{Bag, Coordinator, Dynamics, GraphManager, ModelDesc, RootCoordinator, SimTime};

/// Fires once at t = 1 on two ports, one of which is never declared.
struct Chatty {
    fired: bool,
}

impl Dynamics for Chatty {
    fn start(&mut self, _t: SimTime) -> SimTime {
        self.fired = false;
        SimTime::new(1.0)
    }

    fn ta(&self, _t: SimTime) -> SimTime {
        if self.fired {
            SimTime::INFINITY
        } else {
            SimTime::new(1.0)
        }
    }

    fn lambda(&self, _t: SimTime) -> Bag {
        let mut bag = Bag::single("out", serde_json::json!("hello"));
        bag.push(pdevs::ExternalEvent::new("secret", serde_json::json!("psst")));
        bag
    }

    fn dint(&mut self, _t: SimTime) {
        self.fired = true;
    }

    fn dext(&mut self, _t: SimTime, _e: SimTime, _bag: &Bag) {}

    fn dconf(&mut self, _t: SimTime, _e: SimTime, _bag: &Bag) {}
}

#[test]
fn test_fan_out_copies_to_every_destination() {
    let mut graph = GraphManager::new();
    graph.add_atomic(
        ModelDesc::new("g").with_output("out"),
        Box::new(Generator::new(SimTime::new(1.0))),
    );
    let left = Collector::new();
    let right = Collector::new();
    let (left_log, right_log) = (left.handle(), right.handle());
    graph.add_atomic(ModelDesc::new("left").with_input("a"), Box::new(left));
    graph.add_atomic(ModelDesc::new("right").with_input("b"), Box::new(right));
    graph.add_internal_coupling("g", "out", "left", "a");
    graph.add_internal_coupling("g", "out", "right", "b");
    let top = Coordinator::new(ModelDesc::new("root"), graph).unwrap();

    let mut rc = RootCoordinator::new(SimTime::ZERO, SimTime::new(2.0), top);
    rc.run().unwrap();

    assert_eq!(left_log.lock().len(), 3);
    assert_eq!(right_log.lock().len(), 3);
    // each copy arrives on the destination's own port
    assert_eq!(left_log.lock()[0].bag.iter().next().unwrap().port, "a");
    assert_eq!(right_log.lock()[0].bag.iter().next().unwrap().port, "b");
    assert_eq!(rc.stats().counters.events_routed, 6);
}

#[test]
fn test_uncoupled_and_undeclared_outputs_are_dropped() {
    let mut graph = GraphManager::new();
    graph.add_atomic(
        ModelDesc::new("x").with_output("out").with_output("spare"),
        Box::new(Chatty { fired: false }),
    );
    let sink = Collector::new();
    let received = sink.handle();
    graph.add_atomic(ModelDesc::new("c").with_input("in"), Box::new(sink));
    graph.add_internal_coupling("x", "out", "c", "in");
    let top = Coordinator::new(ModelDesc::new("root"), graph).unwrap();

    let mut rc = RootCoordinator::new(SimTime::ZERO, SimTime::new(5.0), top);
    rc.run().unwrap();

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].bag.len(), 1);
    assert_eq!(received[0].bag.iter().next().unwrap().content, "hello");

    let counters = rc.stats().counters;
    assert_eq!(counters.events_routed, 1);
    assert_eq!(counters.events_undeclared, 1);
    assert_eq!(counters.events_discarded, 0);
}

#[test]
fn test_output_coupling_reaches_root_history() {
    let mut graph = GraphManager::new();
    graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::with_value(7.0)));
    graph.add_output_coupling("a", "out", "y");
    let top = Coordinator::new(ModelDesc::new("root").with_output("y"), graph).unwrap();

    let mut rc = RootCoordinator::new(SimTime::ZERO, SimTime::new(2.0), top);
    rc.run().unwrap();

    let outputs = rc.outputs();
    assert_eq!(outputs.len(), 3);
    for (i, (t, bag)) in outputs.iter().enumerate() {
        assert_eq!(*t, SimTime::from(i as u32));
        let event = bag.iter().next().unwrap();
        assert_eq!(event.port, "y");
        assert_eq!(event.content, 7.0);
    }
}

#[test]
fn test_input_coupling_feeds_children() {
    let inner_sink = Collector::new();
    let received = inner_sink.handle();

    let mut inner = GraphManager::new();
    inner.add_atomic(ModelDesc::new("c1").with_input("in"), Box::new(inner_sink));
    inner.add_atomic(ModelDesc::new("c2").with_input("in"), Box::new(Collector::new()));
    inner.add_input_coupling("x", "c1", "in");
    inner.add_input_coupling("x", "c2", "in");
    let inner = Coordinator::new(ModelDesc::new("box").with_input("x"), inner).unwrap();

    let mut graph = GraphManager::new();
    graph.add_atomic(
        ModelDesc::new("g").with_output("out"),
        Box::new(Generator::new(SimTime::new(5.0))),
    );
    graph.add_coupled(inner);
    graph.add_internal_coupling("g", "out", "box", "x");
    let top = Coordinator::new(ModelDesc::new("root"), graph).unwrap();

    let mut rc = RootCoordinator::new(SimTime::ZERO, SimTime::new(10.0), top);
    rc.run().unwrap();

    let times: Vec<SimTime> = received.lock().iter().map(|r| r.time).collect();
    assert_eq!(times, vec![SimTime::ZERO, SimTime::new(5.0), SimTime::new(10.0)]);
    // one hop into the box and one fan-out copy per inner collector
    assert_eq!(rc.stats().counters.events_routed, 9);
    assert_eq!(rc.stats().counters.external_transitions, 6);
}

#[test]
fn test_fan_in_concatenates_into_one_delivery() {
    let mut graph = GraphManager::new();
    graph.add_atomic(ModelDesc::new("p1").with_output("out"), Box::new(Pulse::with_value(1.0)));
    graph.add_atomic(ModelDesc::new("p2").with_output("out"), Box::new(Pulse::with_value(2.0)));
    let sink = Collector::new();
    let received = sink.handle();
    graph.add_atomic(ModelDesc::new("c").with_input("in"), Box::new(sink));
    graph.add_internal_coupling("p1", "out", "c", "in");
    graph.add_internal_coupling("p2", "out", "c", "in");
    let top = Coordinator::new(ModelDesc::new("root"), graph).unwrap();

    let mut rc = RootCoordinator::new(SimTime::ZERO, SimTime::ZERO, top);
    rc.run().unwrap();

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].time, SimTime::ZERO);
    assert_eq!(received[0].bag.len(), 2);
    // arrivals follow child enumeration order
    let contents: Vec<serde_json::Value> = received[0].bag.iter().map(|e| e.content.clone()).collect();
    assert_eq!(contents, vec![serde_json::json!(1.0), serde_json::json!(2.0)]);
    assert!(received[0].bag.iter().all(|e| e.port == "in"));

    let counters = rc.stats().counters;
    assert_eq!(counters.events_routed, 2);
    assert_eq!(counters.external_transitions, 1);
}
