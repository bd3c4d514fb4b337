use atoms_core::errors::{AtomsError, ConstraintType, ErrorInfo, PhysicsError};
use serde_json::{json, Value};

fn sample(kind: fn(String, Value, Value, String) -> PhysicsError) -> PhysicsError {
    kind(
        "example violation".to_string(),
        json!("120 milliliter"),
        json!("100 milliliter"),
        "Reduce volume to 100 milliliter or below.".to_string(),
    )
}

#[test]
fn codes_and_families_are_stable() {
    let cases = [
        (sample(|d, a, l, h| PhysicsError::volume_overflow(d, a, l, h)), "VOL_001", ConstraintType::Volume),
        (sample(|d, a, l, h| PhysicsError::thermal_excursion(d, a, l, h)), "THM_001", ConstraintType::Thermal),
        (sample(|d, a, l, h| PhysicsError::mass_balance(d, a, l, h)), "MAS_001", ConstraintType::MassBalance),
        (sample(|d, a, l, h| PhysicsError::ordering(d, a, l, h)), "ORD_001", ConstraintType::Ordering),
        (sample(|d, a, l, h| PhysicsError::reaction(d, a, l, h)), "RXN_001", ConstraintType::Reaction),
    ];
    for (err, code, family) in cases {
        assert_eq!(err.error_code(), code);
        assert_eq!(err.constraint_type(), family);
    }
}

#[test]
fn agent_payload_carries_all_six_fields() {
    let err = PhysicsError::mass_balance(
        "Source A does not contain enough volume.",
        "0.2 milliliter",
        "0.25 milliliter",
        "Reduce transfer volume to 0.2 milliliter or less.",
    );
    let payload: Value = serde_json::from_str(&err.to_agent_payload().unwrap()).unwrap();
    assert_eq!(payload["error_code"], "MAS_001");
    assert_eq!(payload["constraint_type"], "mass_balance");
    assert_eq!(payload["actual_value"], "0.2 milliliter");
    assert_eq!(payload["limit_value"], "0.25 milliliter");
    assert_eq!(payload.as_object().unwrap().len(), 6);
}

#[test]
fn only_physics_errors_are_correctable() {
    let physics: AtomsError = PhysicsError::ordering("cycle", json!(["a", "b"]), "acyclic", "Remove a -> b.").into();
    assert!(physics.is_correctable());
    assert_eq!(physics.code(), "ORD_001");
    assert!(physics.physics().is_some());

    let usage = AtomsError::Usage(ErrorInfo::new("not-compiled", "dry run first"));
    assert!(!usage.is_correctable());
    assert_eq!(usage.code(), "not-compiled");
    assert!(usage.physics().is_none());
}

#[test]
fn error_info_display_lists_context_and_hint() {
    let info = ErrorInfo::new("dimension-mismatch", "expected volume")
        .with_context("actual", "temperature")
        .with_hint("use milliliter");
    let text = info.to_string();
    assert!(text.contains("code: dimension-mismatch"));
    assert!(text.contains("actual=temperature"));
    assert!(text.contains("hint: use milliliter"));
}
