//! Controlled change of a container property.

use serde_json::{Map, Value};

use atoms_core::errors::{AtomsError, PhysicsError};
use atoms_core::units::{require_dimension, require_temperature, require_time};
use atoms_core::{ContainerId, Quantity, Unit, ValidationPolicy};
use atoms_matter::ContainerArena;

use crate::validators::check_thermal_safety;

/// The only transform parameter the model understands.
pub const TEMPERATURE_PARAMETER: &str = "temperature";

/// Drives `parameter` of `target` to `target_value`, optionally over `duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    target: ContainerId,
    parameter: String,
    target_value: Quantity,
    duration: Option<Quantity>,
}

impl Transform {
    /// Builds a transform. The value must be finite; a duration must carry time units.
    pub fn new(
        target: ContainerId,
        parameter: impl Into<String>,
        target_value: Quantity,
        duration: Option<Quantity>,
    ) -> Result<Self, AtomsError> {
        // Any dimension is accepted here; validation rejects non-temperatures.
        let target_value = require_dimension(target_value, target_value.dimension())?;
        let duration = duration.map(require_time).transpose()?;
        Ok(Self {
            target,
            parameter: parameter.into(),
            target_value,
            duration,
        })
    }

    /// Shorthand for a temperature transform.
    pub fn temperature(
        target: ContainerId,
        target_value: Quantity,
        duration: Option<Quantity>,
    ) -> Result<Self, AtomsError> {
        Self::new(target, TEMPERATURE_PARAMETER, target_value, duration)
    }

    /// Target container.
    pub fn target(&self) -> &ContainerId {
        &self.target
    }

    /// Requested value.
    pub fn target_value(&self) -> Quantity {
        self.target_value
    }

    /// Checks the parameter name and delegates the thermal checks.
    pub fn validate(
        &self,
        arena: &ContainerArena,
        policy: &ValidationPolicy,
    ) -> Result<(), AtomsError> {
        if self.parameter != TEMPERATURE_PARAMETER {
            return Err(PhysicsError::ordering(
                "Unsupported transform parameter.",
                self.parameter.clone(),
                TEMPERATURE_PARAMETER,
                "Use parameter 'temperature'; it is the only supported transform.",
            )
            .into());
        }
        let container = arena.get(&self.target)?;
        let target_c = require_temperature(self.target_value)?.value_in(Unit::Celsius)?;
        let delta = Quantity::new(
            target_c - container.average_temperature_c(),
            Unit::DeltaCelsius,
        );
        check_thermal_safety(container, delta, self.duration, policy)
    }

    /// Sets the temperature uniformly across the target's contents.
    pub fn execute(
        &self,
        arena: &mut ContainerArena,
        policy: &ValidationPolicy,
    ) -> Result<(), AtomsError> {
        self.validate(arena, policy)?;
        arena.get_mut(&self.target)?.set_temperature(self.target_value)
    }

    /// IR parameters.
    pub fn parameters(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("target".into(), Value::from(self.target.as_str()));
        map.insert("parameter".into(), Value::from(self.parameter.clone()));
        map.insert("target_value".into(), self.target_value.to_json());
        map.insert(
            "duration".into(),
            self.duration
                .map(|duration| duration.to_json())
                .unwrap_or(Value::Null),
        );
        map
    }
}
