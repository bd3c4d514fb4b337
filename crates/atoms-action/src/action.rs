//! The tagged action union and its lifecycle status.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use atoms_core::errors::AtomsError;
use atoms_core::{ContainerId, ValidationPolicy};
use atoms_matter::ContainerArena;

use crate::combine::Combine;
use crate::measure::Measure;
use crate::transfer::Move;
use crate::transform::Transform;

/// Lifecycle of an action inside one dry-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Not yet visited.
    #[default]
    Pending,
    /// Preconditions hold.
    Validated,
    /// State transition applied.
    Executed,
    /// Validation or execution raised an error.
    Failed,
}

impl Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Validated => "validated",
            ActionStatus::Executed => "executed",
            ActionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tagged union over every supported action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Volume transfer.
    Move(Move),
    /// Property change (temperature).
    Transform(Transform),
    /// Mixing.
    Combine(Combine),
    /// Sensor reading.
    Measure(Measure),
}

impl Action {
    /// Name emitted as `action_type` in the IR.
    pub const fn action_type(&self) -> &'static str {
        match self {
            Action::Move(_) => "Move",
            Action::Transform(_) => "Transform",
            Action::Combine(_) => "Combine",
            Action::Measure(_) => "Measure",
        }
    }

    /// Containers the action reads or writes, in parameter order.
    pub fn containers(&self) -> Vec<&ContainerId> {
        match self {
            Action::Move(action) => vec![action.source(), action.destination()],
            Action::Transform(action) => vec![action.target()],
            Action::Combine(action) => vec![action.target()],
            Action::Measure(action) => vec![action.target()],
        }
    }

    /// Checks preconditions against the current arena state.
    pub fn validate(
        &self,
        arena: &ContainerArena,
        policy: &ValidationPolicy,
    ) -> Result<(), AtomsError> {
        match self {
            Action::Move(action) => action.validate(arena, policy),
            Action::Transform(action) => action.validate(arena, policy),
            Action::Combine(action) => action.validate(arena),
            Action::Measure(action) => action.validate(arena),
        }
    }

    /// Re-validates, then applies the state transition.
    pub fn execute(
        &mut self,
        arena: &mut ContainerArena,
        policy: &ValidationPolicy,
    ) -> Result<(), AtomsError> {
        match self {
            Action::Move(action) => action.execute(arena, policy),
            Action::Transform(action) => action.execute(arena, policy),
            Action::Combine(action) => action.validate(arena),
            Action::Measure(action) => action.execute(arena),
        }
    }

    /// Parameters as they appear in an IR step.
    pub fn serialize_parameters(&self) -> Map<String, Value> {
        match self {
            Action::Move(action) => action.parameters(),
            Action::Transform(action) => action.parameters(),
            Action::Combine(action) => action.parameters(),
            Action::Measure(action) => action.parameters(),
        }
    }
}

impl From<Move> for Action {
    fn from(action: Move) -> Self {
        Action::Move(action)
    }
}

impl From<Transform> for Action {
    fn from(action: Transform) -> Self {
        Action::Transform(action)
    }
}

impl From<Combine> for Action {
    fn from(action: Combine) -> Self {
        Action::Combine(action)
    }
}

impl From<Measure> for Action {
    fn from(action: Measure) -> Self {
        Action::Measure(action)
    }
}
