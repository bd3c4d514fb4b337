//! Structured error types shared across the protocol compiler crates.
//!
//! Two families live here. [`PhysicsError`] is the closed taxonomy of physical
//! invariant violations; it is the only error an automated correction loop is
//! expected to act on. Everything else (unit misuse, programming misuse, IR
//! contract failures) is reported through the remaining [`AtomsError`]
//! variants, which carry a plain [`ErrorInfo`] payload.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structured payload attached to every non-physics [`AtomsError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, units, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Invariant family a [`PhysicsError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    /// Container capacity constraints.
    Volume,
    /// Temperature bounds, flash points and ramp rates.
    Thermal,
    /// Conservation of mass and source sufficiency.
    MassBalance,
    /// Graph structure, dependencies and parameter shape.
    Ordering,
    /// Chemical feasibility, reserved for chemistry collaborators.
    Reaction,
}

impl ConstraintType {
    /// Returns the wire name of the constraint family.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConstraintType::Volume => "volume",
            ConstraintType::Thermal => "thermal",
            ConstraintType::MassBalance => "mass_balance",
            ConstraintType::Ordering => "ordering",
            ConstraintType::Reaction => "reaction",
        }
    }
}

impl Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail carried by every [`PhysicsError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Human readable description of the violated invariant.
    pub description: String,
    /// Observed value that broke the constraint.
    pub actual_value: Value,
    /// Bound or expected value of the constraint.
    pub limit_value: Value,
    /// Concrete corrective instruction, always stating a bound.
    pub remediation_hint: String,
}

impl Violation {
    /// Creates a violation record.
    pub fn new(
        description: impl Into<String>,
        actual_value: impl Into<Value>,
        limit_value: impl Into<Value>,
        remediation_hint: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            actual_value: actual_value.into(),
            limit_value: limit_value.into(),
            remediation_hint: remediation_hint.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | actual: {} | limit: {} | hint: {}",
            self.description, self.actual_value, self.limit_value, self.remediation_hint
        )
    }
}

/// Closed taxonomy of physical invariant violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "detail")]
pub enum PhysicsError {
    /// A container would hold more than its capacity.
    #[error("volume overflow: {0}")]
    VolumeOverflow(Violation),
    /// A temperature bound, flash point or ramp rate would be violated.
    #[error("thermal excursion: {0}")]
    ThermalExcursion(Violation),
    /// Mass would not be conserved or a source holds too little material.
    #[error("mass balance violation: {0}")]
    MassBalanceViolation(Violation),
    /// Dependency, graph or parameter-shape violation.
    #[error("ordering constraint: {0}")]
    OrderingConstraint(Violation),
    /// Reaction is not feasible under the supplied conditions.
    #[error("reaction feasibility: {0}")]
    ReactionFeasibility(Violation),
}

impl PhysicsError {
    /// Builds a [`PhysicsError::VolumeOverflow`].
    pub fn volume_overflow(
        description: impl Into<String>,
        actual_value: impl Into<Value>,
        limit_value: impl Into<Value>,
        remediation_hint: impl Into<String>,
    ) -> Self {
        Self::VolumeOverflow(Violation::new(
            description,
            actual_value,
            limit_value,
            remediation_hint,
        ))
    }

    /// Builds a [`PhysicsError::ThermalExcursion`].
    pub fn thermal_excursion(
        description: impl Into<String>,
        actual_value: impl Into<Value>,
        limit_value: impl Into<Value>,
        remediation_hint: impl Into<String>,
    ) -> Self {
        Self::ThermalExcursion(Violation::new(
            description,
            actual_value,
            limit_value,
            remediation_hint,
        ))
    }

    /// Builds a [`PhysicsError::MassBalanceViolation`].
    pub fn mass_balance(
        description: impl Into<String>,
        actual_value: impl Into<Value>,
        limit_value: impl Into<Value>,
        remediation_hint: impl Into<String>,
    ) -> Self {
        Self::MassBalanceViolation(Violation::new(
            description,
            actual_value,
            limit_value,
            remediation_hint,
        ))
    }

    /// Builds a [`PhysicsError::OrderingConstraint`].
    pub fn ordering(
        description: impl Into<String>,
        actual_value: impl Into<Value>,
        limit_value: impl Into<Value>,
        remediation_hint: impl Into<String>,
    ) -> Self {
        Self::OrderingConstraint(Violation::new(
            description,
            actual_value,
            limit_value,
            remediation_hint,
        ))
    }

    /// Builds a [`PhysicsError::ReactionFeasibility`].
    pub fn reaction(
        description: impl Into<String>,
        actual_value: impl Into<Value>,
        limit_value: impl Into<Value>,
        remediation_hint: impl Into<String>,
    ) -> Self {
        Self::ReactionFeasibility(Violation::new(
            description,
            actual_value,
            limit_value,
            remediation_hint,
        ))
    }

    /// Returns the violation detail.
    pub fn violation(&self) -> &Violation {
        match self {
            PhysicsError::VolumeOverflow(v)
            | PhysicsError::ThermalExcursion(v)
            | PhysicsError::MassBalanceViolation(v)
            | PhysicsError::OrderingConstraint(v)
            | PhysicsError::ReactionFeasibility(v) => v,
        }
    }

    /// Returns the stable short error code.
    pub const fn error_code(&self) -> &'static str {
        match self {
            PhysicsError::VolumeOverflow(_) => "VOL_001",
            PhysicsError::ThermalExcursion(_) => "THM_001",
            PhysicsError::MassBalanceViolation(_) => "MAS_001",
            PhysicsError::OrderingConstraint(_) => "ORD_001",
            PhysicsError::ReactionFeasibility(_) => "RXN_001",
        }
    }

    /// Returns the invariant family of the error.
    pub const fn constraint_type(&self) -> ConstraintType {
        match self {
            PhysicsError::VolumeOverflow(_) => ConstraintType::Volume,
            PhysicsError::ThermalExcursion(_) => ConstraintType::Thermal,
            PhysicsError::MassBalanceViolation(_) => ConstraintType::MassBalance,
            PhysicsError::OrderingConstraint(_) => ConstraintType::Ordering,
            PhysicsError::ReactionFeasibility(_) => ConstraintType::Reaction,
        }
    }

    /// Returns the six-field correction object consumed by agents.
    pub fn to_dict(&self) -> Value {
        let violation = self.violation();
        let mut map = Map::new();
        map.insert("error_code".into(), Value::from(self.error_code()));
        map.insert(
            "constraint_type".into(),
            Value::from(self.constraint_type().as_str()),
        );
        map.insert(
            "description".into(),
            Value::from(violation.description.clone()),
        );
        map.insert("actual_value".into(), violation.actual_value.clone());
        map.insert("limit_value".into(), violation.limit_value.clone());
        map.insert(
            "remediation_hint".into(),
            Value::from(violation.remediation_hint.clone()),
        );
        Value::Object(map)
    }

    /// Serializes the error as sorted-key, indented JSON for a correction loop.
    pub fn to_agent_payload(&self) -> Result<String, AtomsError> {
        serde_json::to_string_pretty(&self.to_dict())
            .map_err(|err| AtomsError::Serde(ErrorInfo::new("agent-payload", err.to_string())))
    }
}

/// Canonical error type for the protocol compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum AtomsError {
    /// Physical invariant violation; the only correctable family.
    #[error("physics violation: {0}")]
    Physics(#[from] PhysicsError),
    /// Unit and dimension misuse.
    #[error("unit error: {0}")]
    Unit(ErrorInfo),
    /// Programming misuse or malformed caller input.
    #[error("usage error: {0}")]
    Usage(ErrorInfo),
    /// IR contract failures.
    #[error("ir error: {0}")]
    Ir(ErrorInfo),
    /// Serialization failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl AtomsError {
    /// Returns the physics error when this is a physical violation.
    pub fn physics(&self) -> Option<&PhysicsError> {
        match self {
            AtomsError::Physics(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the plain payload for non-physics errors.
    pub fn info(&self) -> Option<&ErrorInfo> {
        match self {
            AtomsError::Physics(_) => None,
            AtomsError::Unit(info)
            | AtomsError::Usage(info)
            | AtomsError::Ir(info)
            | AtomsError::Serde(info) => Some(info),
        }
    }

    /// Returns the stable code of the error regardless of family.
    pub fn code(&self) -> &str {
        match self {
            AtomsError::Physics(err) => err.error_code(),
            AtomsError::Unit(info)
            | AtomsError::Usage(info)
            | AtomsError::Ir(info)
            | AtomsError::Serde(info) => &info.code,
        }
    }

    /// Whether an automated correction loop may act on this error.
    pub fn is_correctable(&self) -> bool {
        matches!(self, AtomsError::Physics(_))
    }

    /// Shorthand for a [`AtomsError::Usage`] error.
    pub fn usage(code: impl Into<String>, message: impl Into<String>) -> Self {
        AtomsError::Usage(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`AtomsError::Ir`] error.
    pub fn ir(code: impl Into<String>, message: impl Into<String>) -> Self {
        AtomsError::Ir(ErrorInfo::new(code, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_payload_keys_are_sorted() {
        let err = PhysicsError::ordering("bad", 2, 1, "Reorder to at most 1 step.");
        let payload = err.to_agent_payload().unwrap();
        let first = payload.find("actual_value").unwrap();
        let last = payload.find("remediation_hint").unwrap();
        assert!(first < last);
        assert!(payload.contains("\"error_code\": \"ORD_001\""));
    }
}
