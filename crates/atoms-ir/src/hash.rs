use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use atoms_core::errors::{AtomsError, ErrorInfo};

use crate::canonical::canonical_json;

/// SHA-256 hex digest of the canonical JSON of `payload`.
pub fn ir_hash(payload: &Value) -> Result<String, AtomsError> {
    let canonical = canonical_json(payload)?;
    Ok(format!("{:x}", Sha256::digest(canonical.as_bytes())))
}

fn object_mut<'a>(payload: &'a mut Value) -> Result<&'a mut Map<String, Value>, AtomsError> {
    payload
        .as_object_mut()
        .ok_or_else(|| AtomsError::ir("IR_TYPE", "IR payload must be a JSON object."))
}

/// Hash of `payload` with `provenance.ir_hash` blanked to `""`.
pub fn staged_ir_hash(payload: &Value) -> Result<String, AtomsError> {
    let mut staged = payload.clone();
    let root = object_mut(&mut staged)?;
    let provenance = root
        .entry("provenance")
        .or_insert_with(|| Value::Object(Map::new()));
    let provenance = provenance.as_object_mut().ok_or_else(|| {
        AtomsError::ir("IR_SCHEMA_VALIDATION", "provenance must be a JSON object.")
    })?;
    provenance.insert("ir_hash".into(), Value::from(""));
    ir_hash(&staged)
}

/// Returns `payload` with `provenance.ir_hash` set to its staged hash.
pub fn attach_ir_hash(mut payload: Value) -> Result<Value, AtomsError> {
    let digest = staged_ir_hash(&payload)?;
    let root = object_mut(&mut payload)?;
    let provenance = root
        .entry("provenance")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(provenance) = provenance.as_object_mut() {
        provenance.insert("ir_hash".into(), Value::from(digest));
    }
    Ok(payload)
}

/// Checks that `provenance.ir_hash` matches the payload content.
pub fn verify_ir_hash(payload: &Value) -> Result<(), AtomsError> {
    let declared = payload
        .pointer("/provenance/ir_hash")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AtomsError::ir(
                "IR_MISSING_FIELD",
                "IR payload missing required field 'provenance.ir_hash'.",
            )
        })?;
    let computed = staged_ir_hash(payload)?;
    if declared != computed {
        return Err(AtomsError::Ir(
            ErrorInfo::new("IR_HASH_MISMATCH", "IR content does not match provenance.ir_hash.")
                .with_context("declared", declared)
                .with_context("computed", computed)
                .with_hint("re-export the protocol or call attach_ir_hash after editing"),
        ));
    }
    Ok(())
}
