use atoms_core::AtomsError;
use atoms_ir::{
    attach_ir_hash, canonical_json, ir_hash, load_ir_payload, validate_ir, verify_ir_hash,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn minimal(version: &str) -> Value {
    json!({
        "ir_version": version,
        "protocol_id": "00000000-0000-0000-0000-000000000000",
        "correlation_id": "00000000-0000-0000-0000-000000000001",
        "created_at": "2026-01-01T00:00:00Z",
        "steps": [
            {"step": 1, "step_id": "s1", "action_type": "Move", "parameters": {}, "depends_on": [], "resources": []},
            {"step": 2, "step_id": "s2", "action_type": "Combine", "parameters": {}, "depends_on": ["s1"], "resources": ["deck"]}
        ],
        "provenance": {
            "ir_hash": "0".repeat(64),
            "simulator_versions": {},
            "noise_seed": null,
            "validator_version": version
        }
    })
}

fn schema_path(err: &AtomsError) -> String {
    assert_eq!(err.code(), "IR_SCHEMA_VALIDATION");
    err.info().unwrap().context["path"].clone()
}

#[test]
fn canonical_json_sorts_keys_compactly() {
    let encoded = canonical_json(&json!({"b": 1, "a": {"d": [1, 2], "c": null}})).unwrap();
    assert_eq!(encoded, r#"{"a":{"c":null,"d":[1,2]},"b":1}"#);
}

#[test]
fn hash_is_64_lowercase_hex() {
    let digest = ir_hash(&json!({"a": 1})).unwrap();
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn attached_hash_verifies_and_detects_tampering() -> Result<(), AtomsError> {
    let payload = attach_ir_hash(minimal("1.2.0"))?;
    verify_ir_hash(&payload)?;
    let again = attach_ir_hash(payload.clone())?;
    assert_eq!(again, payload);

    let mut tampered = payload;
    tampered["steps"][1]["resources"] = json!(["hood"]);
    assert_eq!(verify_ir_hash(&tampered).unwrap_err().code(), "IR_HASH_MISMATCH");
    Ok(())
}

#[test]
fn current_payload_validates_unchanged() -> Result<(), AtomsError> {
    let payload = minimal("1.2.0");
    assert_eq!(validate_ir(payload.clone())?, payload);
    Ok(())
}

#[test]
fn legacy_payload_is_upgraded() -> Result<(), AtomsError> {
    let raw = minimal("1.1.0").to_string();
    let upgraded = load_ir_payload(&raw)?;
    assert_eq!(upgraded["ir_version"], "1.2.0");
    assert_eq!(upgraded["provenance"]["validator_version"], "1.2.0");
    assert_eq!(upgraded["references"], json!({"containers": [], "materials": []}));
    verify_ir_hash(&upgraded)?;
    Ok(())
}

#[test]
fn non_object_and_unknown_version_fail() {
    assert_eq!(validate_ir(json!([1, 2])).unwrap_err().code(), "IR_TYPE");
    assert_eq!(load_ir_payload("3").unwrap_err().code(), "IR_TYPE");
    assert_eq!(validate_ir(minimal("0.9.0")).unwrap_err().code(), "IR_VERSION");
    assert_eq!(load_ir_payload("{not json").unwrap_err().code(), "json-deserialize");
}

#[test]
fn missing_field_is_reported_by_name() {
    let mut payload = minimal("1.2.0");
    payload.as_object_mut().unwrap().remove("correlation_id");
    let err = validate_ir(payload).unwrap_err();
    assert_eq!(err.code(), "IR_MISSING_FIELD");
    assert!(err.to_string().contains("correlation_id"));
}

#[test]
fn steps_must_be_contiguous() {
    let mut payload = minimal("1.2.0");
    payload["steps"][1]["step"] = json!(3);
    assert_eq!(schema_path(&validate_ir(payload).unwrap_err()), "steps.1.step");
}

#[test]
fn depends_on_must_point_backwards() {
    let mut payload = minimal("1.2.0");
    payload["steps"][0]["depends_on"] = json!(["s2"]);
    assert_eq!(
        schema_path(&validate_ir(payload).unwrap_err()),
        "steps.0.depends_on.0"
    );
}

#[test]
fn duplicate_step_ids_fail() {
    let mut payload = minimal("1.2.0");
    payload["steps"][1]["step_id"] = json!("s1");
    payload["steps"][1]["depends_on"] = json!([]);
    assert_eq!(schema_path(&validate_ir(payload).unwrap_err()), "steps.1.step_id");
}

#[test]
fn provenance_fields_are_typed() {
    let mut payload = minimal("1.2.0");
    payload["provenance"]["ir_hash"] = json!("ABC");
    assert_eq!(schema_path(&validate_ir(payload).unwrap_err()), "provenance.ir_hash");

    let mut payload = minimal("1.2.0");
    payload["provenance"]["noise_seed"] = json!("seven");
    assert_eq!(schema_path(&validate_ir(payload).unwrap_err()), "provenance.noise_seed");

    let mut payload = minimal("1.2.0");
    payload["provenance"]["simulator_versions"] = json!({"ot2": 7});
    assert_eq!(
        schema_path(&validate_ir(payload).unwrap_err()),
        "provenance.simulator_versions.ot2"
    );
}

#[test]
fn schema_version_must_parse_to_a_supported_version() -> Result<(), AtomsError> {
    for raw in ["2.0.0", "1.2", "latest"] {
        let mut payload = minimal("1.2.0");
        payload["schema_version"] = json!(raw);
        assert_eq!(schema_path(&validate_ir(payload).unwrap_err()), "schema_version");
    }
    let mut payload = minimal("1.2.0");
    payload["schema_version"] = json!("1.1.0");
    validate_ir(payload)?;
    Ok(())
}

#[test]
fn created_at_must_be_rfc3339() {
    let mut payload = minimal("1.2.0");
    payload["created_at"] = json!("yesterday");
    assert_eq!(schema_path(&validate_ir(payload).unwrap_err()), "created_at");
}

#[test]
fn reference_entries_need_ids() {
    let mut payload = minimal("1.2.0");
    payload["references"] = json!({"containers": [{"label": "A"}], "materials": []});
    assert_eq!(
        schema_path(&validate_ir(payload).unwrap_err()),
        "references.containers.0"
    );
}

proptest! {
    #[test]
    fn canonical_output_is_ascii_and_round_trips(text in any::<String>(), key in "[a-z]{1,8}") {
        let value = json!({ key: text.clone(), "z": [text] });
        let encoded = canonical_json(&value).unwrap();
        prop_assert!(encoded.is_ascii());
        let decoded: Value = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
    }
}
