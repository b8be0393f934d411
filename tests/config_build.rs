//! End-to-end tests for building and running models from configuration.

use pdevs::config::ModelConfig;
use pdevs::models::Relay;
use pdevs::{create_default_registry, RootCoordinator, SimConfig, SimConfigBuilder, SimError, SimTime, TraceKind};

const NESTED_YAML: &str = r#"
simulation:
  t0: 0
  tend: 4
  trace: true

model:
  name: root
  outputs: [y]
  children:
    - name: g
      type: Generator
      attrs:
        period: "2"
      outputs: [out]
    - name: stage
      inputs: [in]
      outputs: [out]
      children:
        - name: r
          type: Relay
          inputs: [in]
          outputs: [out]
      couplings:
        - { from: in, to: r.in }
        - { from: r.out, to: out }
  couplings:
    - { from: g.out, to: stage.in }
    - { from: stage.out, to: y }
"#;

#[test]
fn test_yaml_nested_model_runs() {
    let config = SimConfig::from_yaml(NESTED_YAML).unwrap();
    let registry = create_default_registry();
    let (mut rc, trace) = RootCoordinator::from_config(&config, &registry).unwrap();

    let last = rc.run().unwrap();
    assert_eq!(last, SimTime::new(4.0));

    // g fires at 0, 2, 4; r relays each poke in a zero-delay follow-up cycle
    let times: Vec<SimTime> = rc.outputs().iter().map(|(t, _)| *t).collect();
    assert_eq!(times, vec![SimTime::ZERO, SimTime::new(2.0), SimTime::new(4.0)]);
    assert_eq!(rc.stats().counters.cycles, 6);

    let trace = trace.expect("trace enabled in config");
    let elements = trace.elements();
    assert_eq!(elements.filter_model_name("r").filter_kind(TraceKind::External).len(), 3);
    assert_eq!(elements.filter_kind(TraceKind::Start).len(), 2);
}

#[test]
fn test_trace_disabled_by_default() {
    let config = SimConfigBuilder::new("root")
        .tend(3.0)
        .add_model(ModelConfig::atomic("a", "Pulse").with_output("out"))
        .build()
        .unwrap();
    let (mut rc, trace) = RootCoordinator::from_config(&config, &create_default_registry()).unwrap();
    assert!(trace.is_none());

    rc.run().unwrap();
    assert_eq!(rc.stats().counters.cycles, 4);
}

#[test]
fn test_custom_factory() {
    let mut registry = create_default_registry();
    registry.register("Echo", |_, _| Box::new(Relay::new()));

    let config = SimConfigBuilder::new("root")
        .add_model(ModelConfig::atomic("a", "Pulse").with_output("out"))
        .add_model(ModelConfig::atomic("e", "Echo").with_input("in").with_output("out"))
        .add_coupling("a.out", "e.in")
        .build()
        .unwrap();

    let (mut rc, _) = RootCoordinator::from_config(&config, &registry).unwrap();
    rc.run().unwrap();
    assert_eq!(rc.stats().counters.external_transitions, 11);
}

#[test]
fn test_unknown_child_in_coupling() {
    let config = SimConfigBuilder::new("root")
        .add_model(ModelConfig::atomic("a", "Pulse").with_output("out"))
        .add_coupling("a.out", "ghost.in")
        .build()
        .unwrap();

    let err = RootCoordinator::from_config(&config, &create_default_registry()).unwrap_err();
    assert!(err.is_configuration());
    match err {
        SimError::UnknownModel { coordinator, model } => {
            assert_eq!(coordinator, "root");
            assert_eq!(model, "ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_json_file_roundtrip() {
    let config = SimConfig::from_yaml(NESTED_YAML).unwrap();
    let path = std::env::temp_dir().join(format!("pdevs-config-{}.json", std::process::id()));
    config.to_json_file(&path).unwrap();

    let restored = SimConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(restored.model.atomic_count(), 2);
    let (mut rc, _) = RootCoordinator::from_config(&restored, &create_default_registry()).unwrap();
    rc.run().unwrap();
    assert_eq!(rc.outputs().len(), 3);
}
