//! Ambient conditions around the bench.

use serde::{Deserialize, Serialize};

use atoms_core::errors::AtomsError;
use atoms_core::units::{require_pressure, require_temperature};
use atoms_core::{Quantity, Unit};

/// Ambient conditions a protocol runs under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    temperature: Quantity,
    pressure: Quantity,
}

impl Environment {
    /// Creates an environment, checking both dimensions.
    pub fn new(temperature: Quantity, pressure: Quantity) -> Result<Self, AtomsError> {
        Ok(Self {
            temperature: require_temperature(temperature)?,
            pressure: require_pressure(pressure)?,
        })
    }

    /// Ambient temperature.
    pub fn temperature(&self) -> Quantity {
        self.temperature
    }

    /// Ambient pressure.
    pub fn pressure(&self) -> Quantity {
        self.pressure
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature: Quantity::new(25.0, Unit::Celsius),
            pressure: Quantity::new(1.0, Unit::Atmosphere),
        }
    }
}
