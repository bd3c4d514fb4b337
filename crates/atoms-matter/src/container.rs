//! Vessels with capacity and thermal bounds.

use serde::Serialize;
use serde_json::{json, Value};

use atoms_core::errors::{AtomsError, ErrorInfo, PhysicsError};
use atoms_core::units::{require_temperature, require_volume};
use atoms_core::{ContainerId, Quantity, Unit, KELVIN_AT_ZERO_CELSIUS};

use crate::matter::Matter;

/// Average temperature reported by a container with no contents, in degrees Celsius.
pub const EMPTY_CONTAINER_TEMPERATURE_C: f64 = 25.0;

/// Bounded vessel that exclusively owns an ordered list of [`Matter`].
///
/// The capacity invariant (`current volume <= max_volume`) is checked on
/// construction and on every mutation that adds material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Container {
    id: ContainerId,
    label: String,
    max_volume: Quantity,
    max_temp: Quantity,
    min_temp: Quantity,
    contents: Vec<Matter>,
}

impl Container {
    /// Creates an empty container whose id is derived from `label`.
    pub fn new(
        label: impl Into<String>,
        max_volume: Quantity,
        max_temp: Quantity,
        min_temp: Quantity,
    ) -> Result<Self, AtomsError> {
        let label = label.into();
        let max_volume = require_volume(max_volume)?;
        let max_temp = require_temperature(max_temp)?;
        let min_temp = require_temperature(min_temp)?;
        if max_volume.base_value() <= 0.0 {
            return Err(AtomsError::Usage(
                ErrorInfo::new("invalid-container", "max_volume must be positive")
                    .with_context("container", label),
            ));
        }
        if min_temp.base_value() > max_temp.base_value() {
            return Err(AtomsError::Usage(
                ErrorInfo::new("invalid-container", "min_temp must not exceed max_temp")
                    .with_context("container", label.clone())
                    .with_context("min_temp", min_temp.to_string())
                    .with_context("max_temp", max_temp.to_string()),
            ));
        }
        Ok(Self {
            id: ContainerId::from_label(&label),
            label,
            max_volume,
            max_temp,
            min_temp,
            contents: Vec::new(),
        })
    }

    /// Builder form of [`Container::add_matter`].
    pub fn with_contents(mut self, contents: Vec<Matter>) -> Result<Self, AtomsError> {
        for matter in contents {
            self.add_matter(matter)?;
        }
        Ok(self)
    }

    /// Appends `matter`, failing with a volume overflow when capacity would be exceeded.
    pub fn add_matter(&mut self, matter: Matter) -> Result<(), AtomsError> {
        self.ensure_capacity(matter.volume_ml(), 0.0)?;
        self.contents.push(matter);
        Ok(())
    }

    /// Appends fragments produced by a transfer.
    ///
    /// Overshoot of at most `tolerance_ml` is accepted; anything beyond fails
    /// with a volume overflow and leaves the contents untouched.
    pub fn receive(
        &mut self,
        fragments: Vec<Matter>,
        tolerance_ml: f64,
    ) -> Result<(), AtomsError> {
        let incoming_ml: f64 = fragments.iter().map(Matter::volume_ml).sum();
        self.ensure_capacity(incoming_ml, tolerance_ml)?;
        self.contents.extend(fragments);
        Ok(())
    }

    fn ensure_capacity(&self, incoming_ml: f64, tolerance_ml: f64) -> Result<(), AtomsError> {
        let projected = self.current_volume_ml() + incoming_ml;
        let limit = self.max_volume_ml();
        if projected <= limit + tolerance_ml {
            return Ok(());
        }
        let available = (limit - self.current_volume_ml()).max(0.0);
        Err(PhysicsError::volume_overflow(
            format!("Container {} would exceed its max volume.", self.label),
            format!("{projected} milliliter"),
            self.max_volume.to_string(),
            format!(
                "Add at most {available:.3} mL to {} or use a larger container.",
                self.label
            ),
        )
        .into())
    }

    /// Stable id of the container.
    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Human readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Capacity.
    pub fn max_volume(&self) -> Quantity {
        self.max_volume
    }

    /// Capacity in milliliters.
    pub fn max_volume_ml(&self) -> f64 {
        self.max_volume.base_value()
    }

    /// Upper temperature bound.
    pub fn max_temp(&self) -> Quantity {
        self.max_temp
    }

    /// Lower temperature bound.
    pub fn min_temp(&self) -> Quantity {
        self.min_temp
    }

    /// Contents in insertion order.
    pub fn contents(&self) -> &[Matter] {
        &self.contents
    }

    /// Mutable access to the contents; the list itself cannot grow through this.
    pub fn contents_mut(&mut self) -> &mut [Matter] {
        &mut self.contents
    }

    /// Keeps only the contents for which `keep` returns true.
    pub fn retain_contents(&mut self, keep: impl FnMut(&Matter) -> bool) {
        self.contents.retain(keep);
    }

    /// Whether the container holds nothing.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Sum of content volumes, expressed in the unit of `max_volume`.
    pub fn current_volume(&self) -> Quantity {
        let total = self.current_volume_ml();
        Quantity::new(total, Unit::Milliliter)
            .to(self.max_volume.unit())
            .unwrap_or(Quantity::new(total, Unit::Milliliter))
    }

    /// Sum of content volumes in milliliters.
    pub fn current_volume_ml(&self) -> f64 {
        self.contents.iter().map(Matter::volume_ml).sum()
    }

    /// Sum of content masses in grams.
    pub fn total_mass_g(&self) -> f64 {
        self.contents.iter().map(Matter::mass_g).sum()
    }

    /// Total mass as a quantity in grams.
    pub fn total_mass(&self) -> Quantity {
        Quantity::new(self.total_mass_g(), Unit::Gram)
    }

    /// Volume-weighted mean temperature in degrees Celsius; 25 degC when empty.
    pub fn average_temperature_c(&self) -> f64 {
        let total_volume = self.current_volume_ml();
        if self.contents.is_empty() || total_volume <= 0.0 {
            return EMPTY_CONTAINER_TEMPERATURE_C;
        }
        let weighted_kelvin: f64 = self
            .contents
            .iter()
            .map(|m| m.temperature().base_value() * m.volume_ml())
            .sum();
        weighted_kelvin / total_volume - KELVIN_AT_ZERO_CELSIUS
    }

    /// Volume-weighted mean temperature as a quantity.
    pub fn average_temperature(&self) -> Quantity {
        Quantity::new(self.average_temperature_c(), Unit::Celsius)
    }

    /// Largest expansion coefficient among the contents, or `fallback` when empty.
    pub fn max_expansion_coefficient(&self, fallback: f64) -> f64 {
        self.contents
            .iter()
            .map(Matter::expansion_coefficient)
            .reduce(f64::max)
            .unwrap_or(fallback)
    }

    /// Sets the temperature of every content uniformly.
    pub fn set_temperature(&mut self, temperature: Quantity) -> Result<(), AtomsError> {
        let temperature = require_temperature(temperature)?;
        for matter in &mut self.contents {
            matter.set_temperature(temperature)?;
        }
        Ok(())
    }

    /// Deterministic reference metadata emitted into the IR.
    pub fn to_reference(&self) -> Value {
        json!({
            "id": self.id.as_str(),
            "label": self.label,
            "max_volume": self.max_volume.to_json(),
            "max_temp": self.max_temp.to_json(),
            "min_temp": self.min_temp.to_json(),
        })
    }
}
