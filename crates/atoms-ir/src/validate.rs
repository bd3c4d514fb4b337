use serde_json::{json, Map, Value};
use tracing::warn;

use atoms_core::errors::{AtomsError, ErrorInfo};
use atoms_core::{IR_SCHEMA_VERSION, IR_VERSION, LEGACY_IR_VERSION, SUPPORTED_IR_VERSIONS};

use crate::hash::attach_ir_hash;
use crate::schema::{check_structure, REQUIRED_FIELDS};

fn upgrade_legacy(mut root: Map<String, Value>) -> Result<Value, AtomsError> {
    warn!(from = LEGACY_IR_VERSION, to = IR_VERSION, "upgrading legacy IR payload");
    root.insert("ir_version".into(), Value::from(IR_VERSION));
    if root.contains_key("schema_version") {
        root.insert("schema_version".into(), Value::from(IR_SCHEMA_VERSION));
    }
    root.entry("references")
        .or_insert_with(|| json!({"containers": [], "materials": []}));

    let had_hash = match root.get_mut("provenance").and_then(Value::as_object_mut) {
        Some(provenance) => {
            provenance
                .entry("simulator_versions")
                .or_insert_with(|| Value::Object(Map::new()));
            provenance.entry("noise_seed").or_insert(Value::Null);
            if provenance.get("validator_version").and_then(Value::as_str)
                == Some(LEGACY_IR_VERSION)
            {
                provenance.insert("validator_version".into(), Value::from(IR_VERSION));
            }
            provenance.contains_key("ir_hash")
        }
        None => false,
    };

    let upgraded = Value::Object(root);
    if had_hash {
        attach_ir_hash(upgraded)
    } else {
        Ok(upgraded)
    }
}

fn normalize(root: Map<String, Value>) -> Result<Value, AtomsError> {
    let declared = root
        .get("ir_version")
        .and_then(Value::as_str)
        .map(str::to_owned);
    match declared.as_deref() {
        Some(IR_VERSION) => Ok(Value::Object(root)),
        Some(LEGACY_IR_VERSION) => upgrade_legacy(root),
        other => Err(AtomsError::Ir(
            ErrorInfo::new(
                "IR_VERSION",
                format!(
                    "IR payload must declare a supported ir_version ({}).",
                    SUPPORTED_IR_VERSIONS.join(", ")
                ),
            )
            .with_context(
                "declared",
                other.map(str::to_string).unwrap_or_else(|| "<none>".into()),
            ),
        )),
    }
}

/// Validates an IR payload and returns its normalized form.
///
/// Legacy payloads are upgraded to [`IR_VERSION`] first; a declared hash is
/// recomputed during the upgrade.
pub fn validate_ir(payload: Value) -> Result<Value, AtomsError> {
    let Value::Object(root) = payload else {
        return Err(AtomsError::ir("IR_TYPE", "IR payload must be a JSON object."));
    };
    let normalized = normalize(root)?;

    for key in REQUIRED_FIELDS {
        if normalized.get(key).is_none() {
            return Err(AtomsError::Ir(
                ErrorInfo::new(
                    "IR_MISSING_FIELD",
                    format!("IR payload missing required field '{key}'."),
                )
                .with_context("field", key),
            ));
        }
    }

    check_structure(&normalized)?;
    Ok(normalized)
}

/// Parses serialized IR and validates it.
pub fn load_ir_payload(raw: &str) -> Result<Value, AtomsError> {
    let payload: Value = serde_json::from_str(raw)
        .map_err(|err| AtomsError::Serde(ErrorInfo::new("json-deserialize", err.to_string())))?;
    if !payload.is_object() {
        return Err(AtomsError::ir(
            "IR_TYPE",
            "IR payload must decode to an object.",
        ));
    }
    validate_ir(payload)
}
