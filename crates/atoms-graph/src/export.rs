//! Compilation of a dry-run-verified graph into the IR payload.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use atoms_core::errors::{AtomsError, ErrorInfo};
use atoms_core::{IR_SCHEMA_VERSION, IR_VERSION, VALIDATOR_VERSION};
use atoms_ir::{attach_ir_hash, canonical_json, pretty_json, validate_ir};
use atoms_matter::ContainerArena;

use crate::dry_run::Compilation;
use crate::graph::ProtocolGraph;

/// Overrides for the non-content fields of an exported payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Creation timestamp; defaults to 2026-01-01T00:00:00+00:00.
    pub created_at: Option<DateTime<Utc>>,
    /// Correlation id; defaults to the protocol id.
    pub correlation_id: Option<String>,
    /// Seed recorded in provenance; defaults to null.
    pub noise_seed: Option<i64>,
}

fn default_created_at() -> Result<DateTime<Utc>, AtomsError> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AtomsError::usage("invalid-timestamp", "default created_at is ambiguous"))
}

impl ProtocolGraph {
    /// Deterministic protocol id: UUIDv5 (URL namespace) of `atoms:<name>:<step count>`.
    pub fn protocol_id(&self) -> String {
        let seed = format!("atoms:{}:{}", self.name, self.nodes.len());
        Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes()).to_string()
    }

    fn compilation_for(&self, arena: &ContainerArena) -> Result<&Compilation, AtomsError> {
        let compilation = self.compilation.as_ref().ok_or_else(|| {
            AtomsError::Usage(
                ErrorInfo::new("not-compiled", "Must pass dry_run() before export.")
                    .with_context("protocol", self.name.clone()),
            )
        })?;
        let current = arena.fingerprint(&compilation.containers)?;
        if current != compilation.fingerprint {
            return Err(AtomsError::Usage(
                ErrorInfo::new(
                    "stale-compilation",
                    "Referenced containers changed since the last dry_run().",
                )
                .with_context("protocol", self.name.clone())
                .with_hint("run dry_run() again before exporting"),
            ));
        }
        Ok(compilation)
    }

    fn references(&self, arena: &ContainerArena, compilation: &Compilation) -> Result<Value, AtomsError> {
        let mut containers = Vec::new();
        let mut materials = Vec::new();
        for id in &compilation.containers {
            let container = arena.get(id)?;
            containers.push(container.to_reference());
            for matter in container.contents() {
                let reference = matter.to_reference();
                let key = canonical_json(&reference)?;
                materials.push((reference, key));
            }
        }
        containers.sort_by(|a, b| reference_id(a).cmp(reference_id(b)));
        materials.sort_by(|(a, a_key), (b, b_key)| {
            reference_id(a)
                .cmp(reference_id(b))
                .then_with(|| a_key.cmp(b_key))
        });
        let materials: Vec<Value> = materials.into_iter().map(|(value, _)| value).collect();
        Ok(json!({ "containers": containers, "materials": materials }))
    }

    /// Exports with default options.
    pub fn to_payload(&self, arena: &ContainerArena) -> Result<Value, AtomsError> {
        self.to_payload_with(arena, &ExportOptions::default())
    }

    /// Assembles, hashes and validates the IR payload.
    ///
    /// Fails with a usage error when the graph is not compiled or the arena
    /// drifted since compilation.
    pub fn to_payload_with(
        &self,
        arena: &ContainerArena,
        options: &ExportOptions,
    ) -> Result<Value, AtomsError> {
        let compilation = self.compilation_for(arena)?;

        let steps: Vec<Value> = self
            .topological_nodes()?
            .into_iter()
            .enumerate()
            .map(|(idx, node)| {
                json!({
                    "step": idx + 1,
                    "step_id": node.step_id(),
                    "action_type": node.action().action_type(),
                    "parameters": Value::Object(node.action().serialize_parameters()),
                    "depends_on": node.depends_on(),
                    "resources": node.resources(),
                })
            })
            .collect();

        let protocol_id = self.protocol_id();
        let correlation_id = options
            .correlation_id
            .clone()
            .unwrap_or_else(|| protocol_id.clone());
        let created_at = match options.created_at {
            Some(created_at) => created_at,
            None => default_created_at()?,
        };

        let mut provenance = Map::new();
        provenance.insert("ir_hash".into(), Value::from(""));
        provenance.insert(
            "simulator_versions".into(),
            json!(compilation.simulator_versions),
        );
        provenance.insert(
            "noise_seed".into(),
            options.noise_seed.map(Value::from).unwrap_or(Value::Null),
        );
        provenance.insert("validator_version".into(), Value::from(VALIDATOR_VERSION));

        let payload = json!({
            "ir_version": IR_VERSION,
            "schema_version": IR_SCHEMA_VERSION,
            "protocol_id": protocol_id,
            "correlation_id": correlation_id,
            "created_at": created_at.to_rfc3339(),
            "dry_run_passed": true,
            "simulation_nodes_passed": compilation.simulated,
            "protocol_name": self.name,
            "steps": steps,
            "references": self.references(arena, compilation)?,
            "provenance": Value::Object(provenance),
        });

        let payload = validate_ir(attach_ir_hash(payload)?)?;
        let ir_hash = payload
            .pointer("/provenance/ir_hash")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        info!(protocol = %self.name, ir_hash = ir_hash, "protocol exported");
        Ok(payload)
    }

    /// Sorted-key JSON indented by two spaces.
    pub fn export_json(&self, arena: &ContainerArena) -> Result<String, AtomsError> {
        pretty_json(&self.to_payload(arena)?)
    }

    /// Canonical JSON: the byte-stable wire form.
    pub fn export_canonical(&self, arena: &ContainerArena) -> Result<String, AtomsError> {
        canonical_json(&self.to_payload(arena)?)
    }
}

fn reference_id(reference: &Value) -> &str {
    reference.get("id").and_then(Value::as_str).unwrap_or_default()
}
