//! Mixing step.

use serde_json::{Map, Value};

use atoms_core::errors::{AtomsError, PhysicsError};
use atoms_core::units::require_time;
use atoms_core::{ContainerId, Quantity, ValidationPolicy};
use atoms_matter::ContainerArena;

/// Mixes the contents of `target` with `method` for `duration`.
///
/// Mixing changes neither mass, volume nor temperature in this model.
#[derive(Debug, Clone, PartialEq)]
pub struct Combine {
    target: ContainerId,
    method: String,
    duration: Quantity,
}

impl Combine {
    /// Builds a combine step; `duration` must carry time units.
    pub fn new(
        target: ContainerId,
        method: impl Into<String>,
        duration: Quantity,
    ) -> Result<Self, AtomsError> {
        Ok(Self {
            target,
            method: method.into(),
            duration: require_time(duration)?,
        })
    }

    /// Target container.
    pub fn target(&self) -> &ContainerId {
        &self.target
    }

    /// Fails on an empty target or a non-positive duration.
    pub fn validate(&self, arena: &ContainerArena) -> Result<(), AtomsError> {
        let container = arena.get(&self.target)?;
        if container.is_empty() {
            return Err(PhysicsError::ordering(
                format!(
                    "Cannot {}: container {} is empty.",
                    self.method,
                    container.label()
                ),
                "0 milliliter",
                "> 0 milliliter",
                format!(
                    "Add more than 0 milliliter of material to {} before executing {}.",
                    container.label(),
                    self.method
                ),
            )
            .into());
        }
        if self.duration.base_value() <= 0.0 {
            return Err(PhysicsError::ordering(
                "Combine duration must be positive.",
                self.duration.to_string(),
                "> 0 second",
                "Increase combine duration above 0 second.",
            )
            .into());
        }
        Ok(())
    }

    /// IR parameters.
    pub fn parameters(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("target".into(), Value::from(self.target.as_str()));
        map.insert("method".into(), Value::from(self.method.clone()));
        map.insert("duration".into(), self.duration.to_json());
        map
    }
}
