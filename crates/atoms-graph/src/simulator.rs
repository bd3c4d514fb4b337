//! Seam for optional physics simulators consulted during a science dry-run.

use serde_json::Value;

use atoms_action::Action;
use atoms_core::errors::AtomsError;
use atoms_matter::ContainerArena;

/// Step handed to a [`Simulator`] right after it executed.
#[derive(Debug, Clone, Copy)]
pub struct SimulationStep<'a> {
    /// Step id of the node.
    pub step_id: &'a str,
    /// Action that just executed.
    pub action: &'a Action,
    /// Arena state after the action executed.
    pub arena: &'a ContainerArena,
}

/// Result of a simulator call. Skipping is normal, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// The simulator checked the step and produced an observation.
    Passed {
        /// Simulator specific observation, recorded on the node.
        observation: Value,
    },
    /// The simulator does not apply to this step or is unavailable.
    Skipped {
        /// Why the step was skipped.
        reason: String,
    },
}

/// External physics engine. Violations are returned as physics errors.
pub trait Simulator {
    /// Name recorded in `provenance.simulator_versions`.
    fn name(&self) -> &str;

    /// Version recorded in `provenance.simulator_versions`.
    fn version(&self) -> &str;

    /// Checks one executed step.
    fn simulate(&self, step: SimulationStep<'_>) -> Result<SimulationOutcome, AtomsError>;
}

/// How a dry-run treats simulators.
#[derive(Clone, Copy, Default)]
pub enum DryRunMode<'a> {
    /// Deterministic local checks only.
    #[default]
    Mock,
    /// Local checks plus a simulator call after every step.
    Science(&'a dyn Simulator),
}

impl std::fmt::Debug for DryRunMode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DryRunMode::Mock => f.write_str("Mock"),
            DryRunMode::Science(simulator) => write!(f, "Science({})", simulator.name()),
        }
    }
}
