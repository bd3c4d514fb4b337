//! Virtual sensor readings.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde_json::{Map, Value};

use atoms_core::errors::{AtomsError, PhysicsError};
use atoms_core::{ContainerId, Quantity};
use atoms_matter::ContainerArena;

/// Property a [`Measure`] observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    /// Current volume.
    Volume,
    /// Volume-weighted average temperature.
    Temperature,
    /// Total mass.
    Mass,
}

impl Sensor {
    /// Wire name of the sensor.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Sensor::Volume => "volume",
            Sensor::Temperature => "temperature",
            Sensor::Mass => "mass",
        }
    }
}

impl Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensor {
    type Err = AtomsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "volume" => Ok(Sensor::Volume),
            "temperature" => Ok(Sensor::Temperature),
            "mass" => Ok(Sensor::Mass),
            other => Err(PhysicsError::ordering(
                "Unsupported sensor type.",
                other,
                "volume | temperature | mass",
                "Use one of: volume, temperature, mass.",
            )
            .into()),
        }
    }
}

/// Reads one property of `target` without mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    target: ContainerId,
    sensor: Sensor,
    reading: Option<Quantity>,
}

impl Measure {
    /// Builds a measurement.
    pub fn new(target: ContainerId, sensor: Sensor) -> Self {
        Self {
            target,
            sensor,
            reading: None,
        }
    }

    /// Target container.
    pub fn target(&self) -> &ContainerId {
        &self.target
    }

    /// Sensor in use.
    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    /// Last observed value, if the measurement has run.
    pub fn reading(&self) -> Option<Quantity> {
        self.reading
    }

    /// Only checks that the target exists.
    pub fn validate(&self, arena: &ContainerArena) -> Result<(), AtomsError> {
        arena.get(&self.target).map(|_| ())
    }

    /// Records the sensor value.
    pub fn execute(&mut self, arena: &ContainerArena) -> Result<(), AtomsError> {
        let container = arena.get(&self.target)?;
        self.reading = Some(match self.sensor {
            Sensor::Volume => container.current_volume(),
            Sensor::Temperature => container.average_temperature(),
            Sensor::Mass => container.total_mass(),
        });
        Ok(())
    }

    /// IR parameters; the reading is a side channel and is not exported.
    pub fn parameters(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("target".into(), Value::from(self.target.as_str()));
        map.insert("sensor_type".into(), Value::from(self.sensor.as_str()));
        map
    }
}
