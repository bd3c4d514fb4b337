mod common;

use atoms_action::{Combine, Measure, Move, Sensor, Transform};
use atoms_core::{AtomsError, ContainerId, Quantity, Unit};
use atoms_graph::{DryRunMode, ExportOptions, ProtocolGraph, StepOptions};
use atoms_ir::{load_ir_payload, verify_ir_hash};
use atoms_matter::{Container, ContainerArena, Matter, Phase};
use chrono::{TimeZone, Utc};
use common::{bench_pair, celsius, ul};
use serde_json::json;

fn compiled_pair() -> Result<(ProtocolGraph, ContainerArena), AtomsError> {
    let (mut arena, a, b) = bench_pair();
    let mut graph = ProtocolGraph::new("scenario-c");
    graph.add_step(Move::new(a, b.clone(), ul(100.0))?)?;
    graph.add_step(Transform::temperature(b, celsius(60.0), None)?)?;
    graph.dry_run(&mut arena, DryRunMode::Mock)?;
    Ok((graph, arena))
}

#[test]
fn export_is_hash_addressed_and_valid() -> Result<(), AtomsError> {
    let (graph, arena) = compiled_pair()?;
    let payload = graph.to_payload(&arena)?;

    let hash = payload["provenance"]["ir_hash"].as_str().unwrap();
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    verify_ir_hash(&payload)?;

    assert_eq!(payload["ir_version"], "1.2.0");
    assert_eq!(payload["schema_version"], "1.2.0");
    assert_eq!(payload["created_at"], "2026-01-01T00:00:00+00:00");
    assert_eq!(payload["protocol_id"], payload["correlation_id"]);
    assert_eq!(payload["protocol_id"], graph.protocol_id());
    assert_eq!(payload["dry_run_passed"], true);
    assert_eq!(payload["provenance"]["noise_seed"], serde_json::Value::Null);
    assert_eq!(payload["provenance"]["validator_version"], "1.2.0");
    Ok(())
}

#[test]
fn steps_carry_ids_and_quantities() -> Result<(), AtomsError> {
    let (graph, arena) = compiled_pair()?;
    let payload = graph.to_payload(&arena)?;
    let steps = payload["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["step"], 1);
    assert_eq!(steps[0]["action_type"], "Move");
    assert_eq!(
        steps[0]["parameters"]["amount"],
        json!({"unit": "microliter", "value": 100.0})
    );
    assert_eq!(
        steps[0]["parameters"]["source"],
        ContainerId::from_label("A").as_str()
    );
    assert_eq!(steps[1]["depends_on"], json!(["s1"]));
    assert_eq!(steps[1]["parameters"]["duration"], serde_json::Value::Null);

    let containers = payload["references"]["containers"].as_array().unwrap();
    assert_eq!(containers.len(), 2);
    assert!(containers[0]["id"].as_str() < containers[1]["id"].as_str());
    let materials = payload["references"]["materials"].as_array().unwrap();
    assert_eq!(materials.len(), 1);
    assert_eq!(materials[0]["name"], "H2O");
    assert_eq!(materials[0]["cas_number"], serde_json::Value::Null);
    Ok(())
}

#[test]
fn repeated_exports_are_byte_identical() -> Result<(), AtomsError> {
    let (graph, arena) = compiled_pair()?;
    let first = graph.export_canonical(&arena)?;
    let second = graph.export_canonical(&arena)?;
    assert_eq!(first, second);
    assert!(first.is_ascii());
    assert!(!first.contains(": "));

    let reloaded = load_ir_payload(&first)?;
    assert_eq!(reloaded, graph.to_payload(&arena)?);

    let pretty = graph.export_json(&arena)?;
    assert!(pretty.contains("\"ir_version\": \"1.2.0\""));
    Ok(())
}

#[test]
fn options_override_envelope_fields() -> Result<(), AtomsError> {
    let (graph, arena) = compiled_pair()?;
    let options = ExportOptions {
        created_at: Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).single(),
        correlation_id: Some("run-42".into()),
        noise_seed: Some(7),
    };
    let payload = graph.to_payload_with(&arena, &options)?;
    assert_eq!(payload["created_at"], "2026-03-04T05:06:07+00:00");
    assert_eq!(payload["correlation_id"], "run-42");
    assert_eq!(payload["provenance"]["noise_seed"], 7);
    assert_ne!(
        payload["provenance"]["ir_hash"],
        graph.to_payload(&arena)?["provenance"]["ir_hash"]
    );
    Ok(())
}

#[test]
fn uncompiled_export_is_a_usage_error() -> Result<(), AtomsError> {
    let (arena, a, b) = bench_pair();
    let mut graph = ProtocolGraph::new("draft");
    graph.add_step(Move::new(a, b, ul(10.0))?)?;
    let err = graph.to_payload(&arena).unwrap_err();
    assert_eq!(err.code(), "not-compiled");
    assert!(!err.is_correctable());
    Ok(())
}

#[test]
fn edits_and_arena_drift_invalidate_compilation() -> Result<(), AtomsError> {
    let (mut graph, mut arena) = compiled_pair()?;
    let a = ContainerId::from_label("A");
    arena.get_mut(&a)?.add_matter(common::water(10.0))?;
    assert_eq!(graph.to_payload(&arena).unwrap_err().code(), "stale-compilation");

    graph.dry_run(&mut arena, DryRunMode::Mock)?;
    assert!(graph.to_payload(&arena).is_ok());

    graph.add_step(Measure::new(a, Sensor::Temperature))?;
    assert!(!graph.is_compiled());
    assert_eq!(graph.to_payload(&arena).unwrap_err().code(), "not-compiled");
    Ok(())
}

fn ethanol() -> Result<Matter, AtomsError> {
    Matter::new(
        "EtOH",
        Phase::Liquid,
        Quantity::new(0.0789, Unit::Gram),
        Quantity::new(100.0, Unit::Microliter),
    )
}

fn flask(label: &str) -> Result<Container, AtomsError> {
    Container::new(
        label,
        Quantity::new(1.0, Unit::Milliliter),
        celsius(10.0),
        celsius(0.0),
    )
}

/// Builds the same logical protocol; `flip` changes every call order that
/// should not matter.
fn logical_protocol(flip: bool) -> Result<String, AtomsError> {
    let stock = if flip {
        ethanol()?
            .with_temperature(celsius(5.0))?
            .with_cas_number("64-17-5")
    } else {
        ethanol()?
            .with_cas_number("64-17-5")
            .with_temperature(celsius(5.0))?
    };
    let source = flask("stock")?.with_contents(vec![stock])?;
    let target = flask("cold")?;

    let mut arena = ContainerArena::new();
    let (s, t) = if flip {
        let t = arena.insert(target)?;
        (arena.insert(source)?, t)
    } else {
        let s = arena.insert(source)?;
        (s, arena.insert(target)?)
    };

    let mut resources = vec!["pipette", "deck"];
    if flip {
        resources.reverse();
    }

    let mut graph = ProtocolGraph::new("scenario-d");
    graph.add_step_with(
        Move::new(s.clone(), t.clone(), ul(40.0))?,
        StepOptions::new().step_id("transfer").resources(resources),
    )?;
    graph.add_step_with(
        Combine::new(t.clone(), "swirl", Quantity::new(2.0, Unit::Second))?,
        StepOptions::new().step_id("mix").depends_on(["transfer"]),
    )?;
    graph.add_step_with(
        Measure::new(s, Sensor::Volume),
        StepOptions::new().step_id("check").depends_on(Vec::<String>::new()),
    )?;
    let deps = if flip {
        vec!["check", "mix"]
    } else {
        vec!["mix", "check"]
    };
    graph.add_step_with(
        Transform::temperature(t, celsius(8.0), Some(Quantity::new(1.0, Unit::Minute)))?,
        StepOptions::new().step_id("chill").depends_on(deps),
    )?;

    graph.dry_run(&mut arena, DryRunMode::Mock)?;
    graph.export_canonical(&arena)
}

#[test]
fn call_order_does_not_change_the_export() -> Result<(), AtomsError> {
    let forward = logical_protocol(false)?;
    let flipped = logical_protocol(true)?;
    assert_eq!(forward, flipped);
    assert!(forward.contains(r#""resources":["deck","pipette"]"#));
    Ok(())
}
