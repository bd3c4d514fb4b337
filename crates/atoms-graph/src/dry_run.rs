//! Transactional dry-run over the container arena.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use atoms_action::{check_mass_conservation, ActionStatus};
use atoms_core::errors::AtomsError;
use atoms_core::{ContainerId, ValidationPolicy};
use atoms_matter::ContainerArena;

use crate::graph::{ProtocolGraph, ProtocolNode};
use crate::simulator::{DryRunMode, SimulationOutcome, SimulationStep};

/// State recorded by a successful dry-run and checked again on export.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Compilation {
    pub(crate) containers: Vec<ContainerId>,
    pub(crate) fingerprint: String,
    pub(crate) simulator_versions: BTreeMap<String, String>,
    pub(crate) simulated: Vec<String>,
}

/// Summary of a successful dry-run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryRunReport {
    /// Step ids in execution order.
    pub order: Vec<String>,
    /// Steps a simulator checked and passed.
    pub simulated: Vec<String>,
    /// Steps the simulator skipped, with its reason.
    pub skipped: BTreeMap<String, String>,
}

impl ProtocolGraph {
    /// Validates and executes every step in topological order, then restores the arena.
    ///
    /// The arena is restored to its pre-run state whether the run passes or
    /// fails. On failure the triggering error is returned unchanged and the
    /// graph is left uncompiled.
    pub fn dry_run(
        &mut self,
        arena: &mut ContainerArena,
        mode: DryRunMode<'_>,
    ) -> Result<DryRunReport, AtomsError> {
        self.compilation = None;
        for node in &mut self.nodes {
            node.status = ActionStatus::Pending;
            node.observation = None;
        }

        let order = self.topological_indices()?;
        let containers = self.referenced_containers(&order);
        let checkpoint = arena.snapshot(&containers)?;

        let mut report = DryRunReport::default();
        for &idx in &order {
            let node = &mut self.nodes[idx];
            if let Err(err) = run_node(node, arena, &containers, &self.policy, mode, &mut report) {
                node.status = ActionStatus::Failed;
                arena.restore(&checkpoint);
                warn!(
                    protocol = %self.name,
                    step = %node.step_id,
                    code = err.code(),
                    "dry-run failed; arena rolled back"
                );
                return Err(err);
            }
            report.order.push(node.step_id.clone());
        }

        arena.restore(&checkpoint);
        let fingerprint = arena.fingerprint(&containers)?;
        let simulator_versions = match mode {
            DryRunMode::Mock => BTreeMap::new(),
            DryRunMode::Science(simulator) => {
                BTreeMap::from([(simulator.name().to_string(), simulator.version().to_string())])
            }
        };
        info!(
            protocol = %self.name,
            steps = report.order.len(),
            simulated = report.simulated.len(),
            "dry-run passed"
        );
        self.compilation = Some(Compilation {
            containers,
            fingerprint,
            simulator_versions,
            simulated: report.simulated.clone(),
        });
        Ok(report)
    }
}

fn run_node(
    node: &mut ProtocolNode,
    arena: &mut ContainerArena,
    containers: &[ContainerId],
    policy: &ValidationPolicy,
    mode: DryRunMode<'_>,
    report: &mut DryRunReport,
) -> Result<(), AtomsError> {
    let before = arena.snapshot(containers)?;

    node.action.validate(arena, policy)?;
    node.status = ActionStatus::Validated;
    node.action.execute(arena, policy)?;
    node.status = ActionStatus::Executed;
    debug!(step = %node.step_id, action = node.action.action_type(), "step executed");

    let after = arena.snapshot(containers)?;
    check_mass_conservation(before.containers(), after.containers(), policy)?;

    if let DryRunMode::Science(simulator) = mode {
        let step = SimulationStep {
            step_id: &node.step_id,
            action: &node.action,
            arena: &*arena,
        };
        match simulator.simulate(step)? {
            SimulationOutcome::Passed { observation } => {
                debug!(step = %node.step_id, simulator = simulator.name(), "simulation passed");
                node.observation = Some(observation);
                report.simulated.push(node.step_id.clone());
            }
            SimulationOutcome::Skipped { reason } => {
                debug!(step = %node.step_id, simulator = simulator.name(), %reason, "simulation skipped");
                report.skipped.insert(node.step_id.clone(), reason);
            }
        }
    }
    Ok(())
}
