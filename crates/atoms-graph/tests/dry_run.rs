mod common;

use std::cell::RefCell;

use atoms_action::{ActionStatus, Combine, Move, Transform};
use atoms_core::{AtomsError, PhysicsError, Quantity, Unit};
use atoms_graph::{
    DryRunMode, ProtocolGraph, SimulationOutcome, SimulationStep, Simulator, StepOptions,
};
use atoms_matter::ContainerArena;
use common::{bench_pair, celsius, ul, vial, water};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn insufficient_source_rolls_back_both_containers() -> Result<(), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let pristine = arena.clone();
    let mut graph = ProtocolGraph::new("scenario-a");
    graph.add_step(Move::new(a, b, ul(250.0))?)?;

    let err = graph.dry_run(&mut arena, DryRunMode::Mock).unwrap_err();
    assert_eq!(err.code(), "MAS_001");
    assert!(err.is_correctable());
    assert_eq!(arena, pristine);
    assert!(!graph.is_compiled());
    assert_eq!(graph.node("s1").unwrap().status(), ActionStatus::Failed);
    Ok(())
}

#[test]
fn capacity_failure_mid_protocol_rolls_back() -> Result<(), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let c = arena.insert(vial("C", 50.0, Vec::new()))?;
    let pristine = arena.clone();
    let mut graph = ProtocolGraph::new("overflow");
    graph.add_step(Move::new(a, b.clone(), ul(100.0))?)?;
    graph.add_step(Move::new(b, c, ul(80.0))?)?;

    let err = graph.dry_run(&mut arena, DryRunMode::Mock).unwrap_err();
    assert_eq!(err.code(), "VOL_001");
    assert!(err.is_correctable());
    assert_eq!(arena, pristine);
    assert!(!graph.is_compiled());
    assert_eq!(graph.node("s1").unwrap().status(), ActionStatus::Executed);
    assert_eq!(graph.node("s2").unwrap().status(), ActionStatus::Failed);
    Ok(())
}

#[test]
fn exact_full_volume_transfer_passes_dry_run() -> Result<(), AtomsError> {
    let mut arena = ContainerArena::new();
    let a = arena.insert(vial("A", 300.0, vec![water(2.0), water(11.0)]))?;
    let b = arena.insert(vial("B", 13.0, Vec::new()))?;
    let mut graph = ProtocolGraph::new("exact");
    graph.add_step(Move::new(a, b, ul(13.0))?)?;

    graph.dry_run(&mut arena, DryRunMode::Mock)?;
    assert!(graph.is_compiled());
    Ok(())
}

#[test]
fn overheating_reports_the_container_limit() -> Result<(), AtomsError> {
    let (mut arena, a, _) = bench_pair();
    let mut graph = ProtocolGraph::new("scenario-b");
    graph.add_step(Transform::temperature(a, celsius(90.0), None)?)?;

    let err = graph.dry_run(&mut arena, DryRunMode::Mock).unwrap_err();
    let physics = err.physics().unwrap();
    assert_eq!(physics.error_code(), "THM_001");
    assert_eq!(physics.violation().limit_value, "80 degC");
    Ok(())
}

#[test]
fn valid_protocol_compiles_without_side_effects() -> Result<(), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let pristine = arena.clone();
    let mut graph = ProtocolGraph::new("scenario-c");
    graph.add_step(Move::new(a, b.clone(), ul(100.0))?)?;
    graph.add_step(Transform::temperature(b, celsius(60.0), None)?)?;

    let report = graph.dry_run(&mut arena, DryRunMode::Mock)?;
    assert_eq!(report.order, ["s1", "s2"]);
    assert!(report.simulated.is_empty());
    assert!(graph.is_compiled());
    assert_eq!(arena, pristine);
    assert!(graph
        .nodes()
        .iter()
        .all(|node| node.status() == ActionStatus::Executed));

    // Re-running is idempotent.
    assert_eq!(graph.dry_run(&mut arena, DryRunMode::Mock)?, report);
    assert_eq!(arena, pristine);
    Ok(())
}

#[test]
fn failure_late_in_the_run_restores_earlier_steps() -> Result<(), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let pristine = arena.clone();
    let mut graph = ProtocolGraph::new("late-failure");
    graph.add_step(Move::new(a.clone(), b.clone(), ul(150.0))?)?;
    graph.add_step(Combine::new(b.clone(), "vortex", Quantity::new(5.0, Unit::Second))?)?;
    graph.add_step(Move::new(a, b, ul(100.0))?)?;

    let err = graph.dry_run(&mut arena, DryRunMode::Mock).unwrap_err();
    assert_eq!(err.code(), "MAS_001");
    assert_eq!(arena, pristine);
    assert_eq!(graph.node("s1").unwrap().status(), ActionStatus::Executed);
    assert_eq!(graph.node("s3").unwrap().status(), ActionStatus::Failed);

    graph.dry_run(&mut arena, DryRunMode::Mock).unwrap_err();
    assert_eq!(graph.node("s1").unwrap().status(), ActionStatus::Executed);
    Ok(())
}

#[test]
fn cycles_fail_before_any_execution() -> Result<(), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let mut graph = ProtocolGraph::new("cyclic");
    graph.add_step(Move::new(a.clone(), b.clone(), ul(10.0))?)?;
    graph.add_step(Move::new(b, a, ul(10.0))?)?;
    graph.add_dependency("s1", "s2")?;

    let err = graph.dry_run(&mut arena, DryRunMode::Mock).unwrap_err();
    assert_eq!(err.code(), "ORD_001");
    assert!(graph
        .nodes()
        .iter()
        .all(|node| node.status() == ActionStatus::Pending));
    Ok(())
}

#[test]
fn unknown_container_is_a_usage_error() -> Result<(), AtomsError> {
    let (_, a, b) = bench_pair();
    let mut empty = ContainerArena::new();
    let mut graph = ProtocolGraph::new("detached");
    graph.add_step(Move::new(a, b, ul(10.0))?)?;
    let err = graph.dry_run(&mut empty, DryRunMode::Mock).unwrap_err();
    assert_eq!(err.code(), "unknown-container");
    assert!(!err.is_correctable());
    Ok(())
}

#[test]
fn policy_tightens_ramp_limit() -> Result<(), AtomsError> {
    let (mut arena, a, _) = bench_pair();
    let policy = atoms_core::ValidationPolicy::from_yaml_str("max_ramp_rate_c_per_s: 1.0\n")?;
    let mut graph = ProtocolGraph::with_policy("slow", policy);
    graph.add_step(Transform::temperature(
        a,
        celsius(45.0),
        Some(Quantity::new(10.0, Unit::Second)),
    )?)?;
    assert_eq!(graph.dry_run(&mut arena, DryRunMode::Mock).unwrap_err().code(), "THM_001");
    Ok(())
}

struct DeckSimulator {
    calls: RefCell<Vec<String>>,
}

impl Simulator for DeckSimulator {
    fn name(&self) -> &str {
        "deck-sim"
    }

    fn version(&self) -> &str {
        "0.3.1"
    }

    fn simulate(&self, step: SimulationStep<'_>) -> Result<SimulationOutcome, AtomsError> {
        self.calls.borrow_mut().push(step.step_id.to_string());
        if step.action.action_type() == "Move" {
            Ok(SimulationOutcome::Passed {
                observation: json!({"containers": step.arena.len()}),
            })
        } else {
            Ok(SimulationOutcome::Skipped {
                reason: "only transfers are simulated".into(),
            })
        }
    }
}

struct CollisionSimulator;

impl Simulator for CollisionSimulator {
    fn name(&self) -> &str {
        "arm-sim"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn simulate(&self, _step: SimulationStep<'_>) -> Result<SimulationOutcome, AtomsError> {
        Err(PhysicsError::reaction(
            "Pipette path collides with the deck.",
            "12 millimeter clearance",
            "20 millimeter clearance",
            "Raise the travel height by at least 8 millimeter.",
        )
        .into())
    }
}

#[test]
fn science_mode_records_observations_and_skips() -> Result<(), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let mut graph = ProtocolGraph::new("science");
    graph.add_step(Move::new(a, b.clone(), ul(100.0))?)?;
    graph.add_step(Combine::new(b, "swirl", Quantity::new(3.0, Unit::Second))?)?;

    let simulator = DeckSimulator {
        calls: RefCell::new(Vec::new()),
    };
    let report = graph.dry_run(&mut arena, DryRunMode::Science(&simulator))?;
    assert_eq!(report.simulated, ["s1"]);
    assert_eq!(report.skipped["s2"], "only transfers are simulated");
    assert_eq!(*simulator.calls.borrow(), ["s1", "s2"]);
    assert_eq!(
        graph.node("s1").unwrap().observation(),
        Some(&json!({"containers": 2}))
    );

    let payload = graph.to_payload(&arena)?;
    assert_eq!(payload["simulation_nodes_passed"], json!(["s1"]));
    assert_eq!(payload["provenance"]["simulator_versions"], json!({"deck-sim": "0.3.1"}));
    Ok(())
}

#[test]
fn simulator_errors_roll_back_unchanged() -> Result<(), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let pristine = arena.clone();
    let mut graph = ProtocolGraph::new("collision");
    graph.add_step(Move::new(a, b, ul(100.0))?)?;

    let err = graph
        .dry_run(&mut arena, DryRunMode::Science(&CollisionSimulator))
        .unwrap_err();
    assert_eq!(err.code(), "RXN_001");
    assert_eq!(arena, pristine);
    assert!(!graph.is_compiled());
    Ok(())
}

proptest! {
    #[test]
    fn any_failure_point_restores_every_container(
        transfers in proptest::collection::vec((0usize..3, 0usize..3, 1u32..250), 1..10)
    ) {
        let mut arena = ContainerArena::new();
        let ids: Vec<_> = ["A", "B", "C"]
            .iter()
            .map(|label| arena.insert(vial(label, 400.0, vec![water(150.0)])).unwrap())
            .collect();
        let pristine = arena.clone();

        let mut graph = ProtocolGraph::new("fuzz");
        for (from, to, amount) in transfers {
            let action = Move::new(ids[from].clone(), ids[to].clone(), ul(f64::from(amount))).unwrap();
            graph.add_step_with(action, StepOptions::new()).unwrap();
        }

        let outcome = graph.dry_run(&mut arena, DryRunMode::Mock);
        prop_assert_eq!(&arena, &pristine);
        prop_assert_eq!(graph.is_compiled(), outcome.is_ok());
        if let Err(err) = outcome {
            prop_assert!(err.is_correctable());
        }
    }
}
