//! Structural conformance checks for IR payloads.
//!
//! Failures carry the dotted path of the first offending field, e.g.
//! `steps.1.depends_on.0`.

use std::collections::BTreeSet;

use chrono::DateTime;
use serde_json::{Map, Value};

use atoms_core::errors::{AtomsError, ErrorInfo};
use atoms_core::{SchemaVersion, IR_VERSION};

/// Top-level fields every payload must declare.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "ir_version",
    "protocol_id",
    "correlation_id",
    "created_at",
    "steps",
    "provenance",
];

fn schema_error(path: &str, message: impl Into<String>) -> AtomsError {
    let location = if path.is_empty() { "<root>" } else { path };
    let message = message.into();
    AtomsError::Ir(
        ErrorInfo::new(
            "IR_SCHEMA_VALIDATION",
            format!("IR schema validation failed at {location}: {message}"),
        )
        .with_context("path", location),
    )
}

fn join(path: &str, key: impl std::fmt::Display) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, AtomsError> {
    value
        .as_object()
        .ok_or_else(|| schema_error(path, "expected an object"))
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, AtomsError> {
    value
        .as_array()
        .ok_or_else(|| schema_error(path, "expected an array"))
}

fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, AtomsError> {
    value
        .as_str()
        .ok_or_else(|| schema_error(path, "expected a string"))
}

fn expect_non_empty_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, AtomsError> {
    let text = expect_str(value, path)?;
    if text.is_empty() {
        return Err(schema_error(path, "expected a non-empty string"));
    }
    Ok(text)
}

fn field<'a>(map: &'a Map<String, Value>, path: &str, key: &str) -> Result<&'a Value, AtomsError> {
    map.get(key)
        .ok_or_else(|| schema_error(path, format!("'{key}' is a required property")))
}

fn string_list<'a>(value: &'a Value, path: &str) -> Result<Vec<&'a str>, AtomsError> {
    expect_array(value, path)?
        .iter()
        .enumerate()
        .map(|(idx, item)| expect_str(item, &join(path, idx)))
        .collect()
}

/// Checks the full structure of a payload already upgraded to [`IR_VERSION`].
pub fn check_structure(payload: &Value) -> Result<(), AtomsError> {
    let root = expect_object(payload, "")?;

    let version = expect_str(field(root, "", "ir_version")?, "ir_version")?;
    if version != IR_VERSION {
        return Err(schema_error(
            "ir_version",
            format!("expected '{IR_VERSION}', got '{version}'"),
        ));
    }
    if let Some(schema_version) = root.get("schema_version") {
        let raw = expect_str(schema_version, "schema_version")?;
        if !SchemaVersion::parse(raw).is_some_and(|version| version.is_supported()) {
            return Err(schema_error(
                "schema_version",
                format!(
                    "unsupported version '{raw}', expected {} or {}",
                    SchemaVersion::LEGACY,
                    SchemaVersion::CURRENT
                ),
            ));
        }
    }

    expect_non_empty_str(field(root, "", "protocol_id")?, "protocol_id")?;
    expect_non_empty_str(field(root, "", "correlation_id")?, "correlation_id")?;
    let created_at = expect_str(field(root, "", "created_at")?, "created_at")?;
    DateTime::parse_from_rfc3339(created_at)
        .map_err(|err| schema_error("created_at", format!("'{created_at}' is not RFC3339: {err}")))?;

    if let Some(name) = root.get("protocol_name") {
        expect_str(name, "protocol_name")?;
    }
    if let Some(passed) = root.get("dry_run_passed") {
        passed
            .as_bool()
            .ok_or_else(|| schema_error("dry_run_passed", "expected a boolean"))?;
    }
    if let Some(nodes) = root.get("simulation_nodes_passed") {
        string_list(nodes, "simulation_nodes_passed")?;
    }

    check_steps(field(root, "", "steps")?)?;
    if let Some(references) = root.get("references") {
        check_references(references)?;
    }
    check_provenance(field(root, "", "provenance")?)
}

fn check_steps(steps: &Value) -> Result<(), AtomsError> {
    let steps = expect_array(steps, "steps")?;
    let mut seen = BTreeSet::new();
    for (idx, step) in steps.iter().enumerate() {
        let path = join("steps", idx);
        let step = expect_object(step, &path)?;

        let number_path = join(&path, "step");
        let number = field(step, &path, "step")?
            .as_u64()
            .ok_or_else(|| schema_error(&number_path, "expected a positive integer"))?;
        if number != idx as u64 + 1 {
            return Err(schema_error(
                &number_path,
                format!("steps must be contiguous from 1; expected {}, got {number}", idx + 1),
            ));
        }

        let id_path = join(&path, "step_id");
        let step_id = expect_non_empty_str(field(step, &path, "step_id")?, &id_path)?;
        expect_non_empty_str(
            field(step, &path, "action_type")?,
            &join(&path, "action_type"),
        )?;
        expect_object(field(step, &path, "parameters")?, &join(&path, "parameters"))?;

        let deps_path = join(&path, "depends_on");
        let deps = string_list(field(step, &path, "depends_on")?, &deps_path)?;
        for (dep_idx, dep) in deps.iter().enumerate() {
            if !seen.contains(dep) {
                return Err(schema_error(
                    &join(&deps_path, dep_idx),
                    format!("'{dep}' must reference an earlier step"),
                ));
            }
        }
        string_list(field(step, &path, "resources")?, &join(&path, "resources"))?;

        if !seen.insert(step_id) {
            return Err(schema_error(&id_path, format!("duplicate step_id '{step_id}'")));
        }
    }
    Ok(())
}

fn check_references(references: &Value) -> Result<(), AtomsError> {
    let references = expect_object(references, "references")?;
    for section in ["containers", "materials"] {
        let Some(entries) = references.get(section) else {
            continue;
        };
        let section_path = join("references", section);
        for (idx, entry) in expect_array(entries, &section_path)?.iter().enumerate() {
            let path = join(&section_path, idx);
            let entry = expect_object(entry, &path)?;
            expect_non_empty_str(field(entry, &path, "id")?, &join(&path, "id"))?;
        }
    }
    Ok(())
}

fn check_provenance(provenance: &Value) -> Result<(), AtomsError> {
    let provenance = expect_object(provenance, "provenance")?;

    let hash = expect_str(
        field(provenance, "provenance", "ir_hash")?,
        "provenance.ir_hash",
    )?;
    let is_hex = hash.len() == 64
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !is_hex {
        return Err(schema_error(
            "provenance.ir_hash",
            "expected 64 lowercase hexadecimal characters",
        ));
    }

    let versions = expect_object(
        field(provenance, "provenance", "simulator_versions")?,
        "provenance.simulator_versions",
    )?;
    for (name, version) in versions {
        expect_str(version, &join("provenance.simulator_versions", name))?;
    }

    let seed = field(provenance, "provenance", "noise_seed")?;
    if !(seed.is_null() || seed.is_i64() || seed.is_u64()) {
        return Err(schema_error(
            "provenance.noise_seed",
            "expected null or an integer",
        ));
    }

    expect_non_empty_str(
        field(provenance, "provenance", "validator_version")?,
        "provenance.validator_version",
    )?;
    Ok(())
}
