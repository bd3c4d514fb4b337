use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use atoms_core::errors::{AtomsError, ErrorInfo};
use atoms_core::units::{
    require_density, require_dimension, require_mass, require_molar_energy,
    require_molecular_weight, require_temperature, require_volume,
};
use atoms_core::{stable_id, Dimension, Quantity, Unit, KELVIN_AT_ZERO_CELSIUS};

use crate::flash::reference_flash_point;

/// Default volumetric thermal expansion coefficient (water near room temperature), per kelvin.
pub const DEFAULT_EXPANSION_COEFFICIENT: f64 = 2.14e-4;

/// Physical phase of a substance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Solid.
    Solid,
    /// Liquid.
    Liquid,
    /// Gas.
    Gas,
    /// Plasma.
    Plasma,
}

impl Phase {
    /// Wire name of the phase.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Phase::Solid => "solid",
            Phase::Liquid => "liquid",
            Phase::Gas => "gas",
            Phase::Plasma => "plasma",
        }
    }
}

/// A named substance instance with explicit units on every physical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matter {
    name: String,
    phase: Phase,
    mass: Quantity,
    volume: Quantity,
    density: Quantity,
    molecular_weight: Option<Quantity>,
    enthalpy_of_formation: Option<Quantity>,
    cas_number: Option<String>,
    flash_point: Option<Quantity>,
    thermal_expansion: Quantity,
    temperature: Quantity,
}

impl Matter {
    /// Creates matter at 25 degC; density is derived as mass / volume.
    pub fn new(
        name: impl Into<String>,
        phase: Phase,
        mass: Quantity,
        volume: Quantity,
    ) -> Result<Self, AtomsError> {
        let name = name.into();
        let mass = require_mass(mass)?;
        let volume = require_volume(volume)?;
        if mass.base_value() < 0.0 {
            return Err(invalid_matter(&name, "mass must not be negative"));
        }
        if volume.base_value() <= 0.0 {
            return Err(invalid_matter(&name, "volume must be positive"));
        }
        let density = Quantity::new(
            mass.base_value() / volume.base_value(),
            Unit::GramPerMilliliter,
        );
        Ok(Self {
            name,
            phase,
            mass,
            volume,
            density,
            molecular_weight: None,
            enthalpy_of_formation: None,
            cas_number: None,
            flash_point: None,
            thermal_expansion: Quantity::new(DEFAULT_EXPANSION_COEFFICIENT, Unit::PerKelvin),
            temperature: Quantity::new(25.0, Unit::Celsius),
        })
    }

    /// Overrides the derived density; must carry mass/volume units.
    pub fn with_density(mut self, density: Quantity) -> Result<Self, AtomsError> {
        self.density = require_density(density)?;
        Ok(self)
    }

    /// Sets the molecular weight; must carry mass/substance units.
    pub fn with_molecular_weight(mut self, weight: Quantity) -> Result<Self, AtomsError> {
        self.molecular_weight = Some(require_molecular_weight(weight)?);
        Ok(self)
    }

    /// Sets the enthalpy of formation; must carry energy/substance units.
    pub fn with_enthalpy_of_formation(mut self, enthalpy: Quantity) -> Result<Self, AtomsError> {
        self.enthalpy_of_formation = Some(require_molar_energy(enthalpy)?);
        Ok(self)
    }

    /// Sets the CAS registry number used for reference lookups.
    pub fn with_cas_number(mut self, cas_number: impl Into<String>) -> Self {
        self.cas_number = Some(cas_number.into());
        self
    }

    /// Sets an explicit flash point.
    pub fn with_flash_point(mut self, flash_point: Quantity) -> Result<Self, AtomsError> {
        self.flash_point = Some(require_temperature(flash_point)?);
        Ok(self)
    }

    /// Sets the volumetric thermal expansion coefficient.
    pub fn with_expansion_coefficient(mut self, alpha: Quantity) -> Result<Self, AtomsError> {
        let alpha = require_dimension(alpha, Dimension::ExpansionCoefficient)?;
        if alpha.base_value() < 0.0 {
            return Err(invalid_matter(
                &self.name,
                "thermal expansion coefficient must not be negative",
            ));
        }
        self.thermal_expansion = alpha;
        Ok(self)
    }

    /// Sets the initial temperature.
    pub fn with_temperature(mut self, temperature: Quantity) -> Result<Self, AtomsError> {
        self.set_temperature(temperature)?;
        Ok(self)
    }

    /// Stable identifier derived from the name.
    pub fn id(&self) -> String {
        stable_id("matter", &self.name)
    }

    /// Name of the substance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Mass quantity.
    pub fn mass(&self) -> Quantity {
        self.mass
    }

    /// Volume quantity.
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    /// Density quantity, explicit or derived.
    pub fn density(&self) -> Quantity {
        self.density
    }

    /// Molecular weight, when known.
    pub fn molecular_weight(&self) -> Option<Quantity> {
        self.molecular_weight
    }

    /// CAS registry number, when known.
    pub fn cas_number(&self) -> Option<&str> {
        self.cas_number.as_deref()
    }

    /// Temperature quantity.
    pub fn temperature(&self) -> Quantity {
        self.temperature
    }

    /// Mass in grams.
    pub fn mass_g(&self) -> f64 {
        self.mass.base_value()
    }

    /// Volume in milliliters.
    pub fn volume_ml(&self) -> f64 {
        self.volume.base_value()
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_c(&self) -> f64 {
        self.temperature.base_value() - KELVIN_AT_ZERO_CELSIUS
    }

    /// Expansion coefficient per kelvin.
    pub fn expansion_coefficient(&self) -> f64 {
        self.thermal_expansion.base_value()
    }

    /// Explicit flash point, falling back to the CAS reference table.
    pub fn effective_flash_point(&self) -> Option<Quantity> {
        self.flash_point
            .or_else(|| self.cas_number.as_deref().and_then(reference_flash_point))
    }

    /// Sets the temperature of this matter.
    pub fn set_temperature(&mut self, temperature: Quantity) -> Result<(), AtomsError> {
        self.temperature = require_temperature(temperature)?;
        Ok(())
    }

    /// Removes a proportional slice of `volume_ml` and returns it as a new fragment.
    ///
    /// The pull is clamped to the available volume; mass leaves in the same ratio.
    pub fn split_off(&mut self, volume_ml: f64) -> Matter {
        let available = self.volume_ml();
        let pull = volume_ml.clamp(0.0, available);
        let ratio = if available > 0.0 { pull / available } else { 0.0 };
        let pulled_mass = self.mass_g() * ratio;

        self.volume = Quantity::new(available - pull, Unit::Milliliter);
        self.mass = Quantity::new(self.mass_g() - pulled_mass, Unit::Gram);

        Matter {
            mass: Quantity::new(pulled_mass, Unit::Gram),
            volume: Quantity::new(pull, Unit::Milliliter),
            ..self.clone()
        }
    }

    /// Deterministic reference metadata emitted into the IR.
    pub fn to_reference(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::from(self.id()));
        map.insert("name".into(), Value::from(self.name.clone()));
        map.insert("phase".into(), Value::from(self.phase.as_str()));
        map.insert("mass".into(), self.mass.to_json());
        map.insert("volume".into(), self.volume.to_json());
        map.insert("density".into(), self.density.to_json());
        map.insert(
            "cas_number".into(),
            self.cas_number.clone().map(Value::from).unwrap_or(Value::Null),
        );
        if let Some(enthalpy) = &self.enthalpy_of_formation {
            map.insert("enthalpy_of_formation".into(), enthalpy.to_json());
        }
        if let Some(weight) = &self.molecular_weight {
            map.insert("molecular_weight".into(), weight.to_json());
        }
        if let Some(flash) = &self.flash_point {
            map.insert("flash_point".into(), flash.to_json());
        }
        map.insert("temperature".into(), self.temperature.to_json());
        Value::Object(map)
    }
}

fn invalid_matter(name: &str, message: &str) -> AtomsError {
    AtomsError::Usage(ErrorInfo::new("invalid-matter", message).with_context("matter", name))
}
