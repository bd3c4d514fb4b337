//! Validation policy: the configurable tolerances and physical limits.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{AtomsError, ErrorInfo};

/// Tolerances and physical limits applied by actions and validators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationPolicy {
    /// Maximum tolerated total-mass drift across a step, in grams.
    #[serde(default = "ValidationPolicy::default_mass_tolerance")]
    pub mass_tolerance_g: f64,
    /// Fragments smaller than this are dropped from a source during a transfer, in milliliters.
    #[serde(default = "ValidationPolicy::default_residual_epsilon")]
    pub residual_epsilon_ml: f64,
    /// Volume left unassigned after a transfer traversal that is still tolerated, in milliliters.
    #[serde(default = "ValidationPolicy::default_unresolved_tolerance")]
    pub unresolved_tolerance_ml: f64,
    /// Maximum heating or cooling rate, in degrees Celsius per second.
    #[serde(default = "ValidationPolicy::default_max_ramp_rate")]
    pub max_ramp_rate_c_per_s: f64,
    /// Temperature above which thermal expansion is projected, in degrees Celsius.
    #[serde(default = "ValidationPolicy::default_reference_temperature")]
    pub reference_temperature_c: f64,
    /// Expansion coefficient used when a container holds nothing.
    #[serde(default = "ValidationPolicy::default_expansion_coefficient")]
    pub default_expansion_coefficient_per_k: f64,
}

impl ValidationPolicy {
    const fn default_mass_tolerance() -> f64 {
        1e-9
    }

    const fn default_residual_epsilon() -> f64 {
        1e-12
    }

    const fn default_unresolved_tolerance() -> f64 {
        1e-9
    }

    const fn default_max_ramp_rate() -> f64 {
        10.0
    }

    const fn default_reference_temperature() -> f64 {
        25.0
    }

    const fn default_expansion_coefficient() -> f64 {
        2.14e-4
    }

    /// Parses a policy from YAML; omitted fields take their defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self, AtomsError> {
        let policy: Self = serde_yaml::from_str(raw)
            .map_err(|err| AtomsError::Serde(ErrorInfo::new("policy-yaml", err.to_string())))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reads and parses a YAML policy file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, AtomsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AtomsError::Serde(
                ErrorInfo::new("policy-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Serializes the policy to YAML.
    pub fn to_yaml_string(&self) -> Result<String, AtomsError> {
        serde_yaml::to_string(self)
            .map_err(|err| AtomsError::Serde(ErrorInfo::new("policy-yaml", err.to_string())))
    }

    /// Checks that every tolerance is usable.
    pub fn validate(&self) -> Result<(), AtomsError> {
        let non_negative = [
            ("mass_tolerance_g", self.mass_tolerance_g),
            ("residual_epsilon_ml", self.residual_epsilon_ml),
            ("unresolved_tolerance_ml", self.unresolved_tolerance_ml),
            (
                "default_expansion_coefficient_per_k",
                self.default_expansion_coefficient_per_k,
            ),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid_field(field, value, "must be finite and >= 0"));
            }
        }
        if !(self.max_ramp_rate_c_per_s.is_finite() && self.max_ramp_rate_c_per_s > 0.0) {
            return Err(invalid_field(
                "max_ramp_rate_c_per_s",
                self.max_ramp_rate_c_per_s,
                "must be finite and > 0",
            ));
        }
        if !self.reference_temperature_c.is_finite() {
            return Err(invalid_field(
                "reference_temperature_c",
                self.reference_temperature_c,
                "must be finite",
            ));
        }
        Ok(())
    }
}

fn invalid_field(field: &str, value: f64, rule: &str) -> AtomsError {
    AtomsError::Usage(
        ErrorInfo::new("invalid-policy", format!("policy field `{field}` {rule}"))
            .with_context("field", field)
            .with_context("value", value.to_string()),
    )
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            mass_tolerance_g: Self::default_mass_tolerance(),
            residual_epsilon_ml: Self::default_residual_epsilon(),
            unresolved_tolerance_ml: Self::default_unresolved_tolerance(),
            max_ramp_rate_c_per_s: Self::default_max_ramp_rate(),
            reference_temperature_c: Self::default_reference_temperature(),
            default_expansion_coefficient_per_k: Self::default_expansion_coefficient(),
        }
    }
}
