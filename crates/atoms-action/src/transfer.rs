//! Liquid transfer between two containers.

use serde_json::{Map, Value};
use tracing::debug;

use atoms_core::errors::{AtomsError, PhysicsError};
use atoms_core::units::require_volume;
use atoms_core::{ContainerId, Quantity, Unit, ValidationPolicy};
use atoms_matter::ContainerArena;

use crate::validators::check_volume_feasibility;

/// Moves `amount` of volume from `source` to `destination`.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    source: ContainerId,
    destination: ContainerId,
    amount: Quantity,
}

impl Move {
    /// Builds a transfer; `amount` must carry volume units.
    pub fn new(
        source: ContainerId,
        destination: ContainerId,
        amount: Quantity,
    ) -> Result<Self, AtomsError> {
        Ok(Self {
            source,
            destination,
            amount: require_volume(amount)?,
        })
    }

    /// Source container.
    pub fn source(&self) -> &ContainerId {
        &self.source
    }

    /// Destination container.
    pub fn destination(&self) -> &ContainerId {
        &self.destination
    }

    /// Requested volume.
    pub fn amount(&self) -> Quantity {
        self.amount
    }

    /// Checks amount, source sufficiency and destination headspace.
    pub fn validate(
        &self,
        arena: &ContainerArena,
        policy: &ValidationPolicy,
    ) -> Result<(), AtomsError> {
        let requested_ml = self.amount.base_value();
        if requested_ml <= 0.0 {
            return Err(PhysicsError::ordering(
                "Transfer volume must be positive.",
                self.amount.to_string(),
                "> 0 milliliter",
                "Set transfer volume to a positive value with explicit units.",
            )
            .into());
        }
        if self.source == self.destination {
            return Err(PhysicsError::ordering(
                "Transfer source and destination are the same container.",
                self.source.as_str(),
                "distinct containers",
                "Choose a destination container different from the source.",
            )
            .into());
        }

        let source = arena.get(&self.source)?;
        let available = source.current_volume();
        if source.current_volume_ml() + policy.unresolved_tolerance_ml < requested_ml {
            return Err(PhysicsError::mass_balance(
                format!("Source {} does not contain enough volume.", source.label()),
                available.to_string(),
                self.amount.to_string(),
                format!(
                    "Reduce transfer volume to {available} or less, or replenish {} before transfer.",
                    source.label()
                ),
            )
            .into());
        }

        let destination = arena.get(&self.destination)?;
        check_volume_feasibility(destination, self.amount, policy)
    }

    /// Pulls proportional slices from the source contents in list order into the destination.
    pub fn execute(
        &self,
        arena: &mut ContainerArena,
        policy: &ValidationPolicy,
    ) -> Result<(), AtomsError> {
        self.validate(arena, policy)?;

        let mut remaining_ml = self.amount.base_value();
        let mut fragments = Vec::new();
        let mut drawn = Vec::new();
        let source = arena.get_mut(&self.source)?;
        for (idx, matter) in source.contents_mut().iter_mut().enumerate() {
            if remaining_ml <= 0.0 {
                break;
            }
            let pull_ml = matter.volume_ml().min(remaining_ml);
            if pull_ml <= 0.0 {
                continue;
            }
            fragments.push(matter.split_off(pull_ml));
            drawn.push(idx);
            remaining_ml -= pull_ml;
        }
        // Only contents this transfer drew from may be dropped as residue.
        let epsilon = policy.residual_epsilon_ml;
        let mut position = 0;
        source.retain_contents(|matter| {
            let drained = drawn.contains(&position) && matter.volume_ml() <= epsilon;
            position += 1;
            !drained
        });

        if remaining_ml > policy.unresolved_tolerance_ml {
            return Err(PhysicsError::mass_balance(
                "Transfer execution ended with unresolved requested volume.",
                Quantity::new(remaining_ml, Unit::Milliliter).to_string(),
                "0 milliliter",
                format!(
                    "Recompute source composition so at most {} milliliter stays unresolved; unresolved volume indicates non-physical state drift.",
                    policy.unresolved_tolerance_ml
                ),
            )
            .into());
        }

        debug!(
            source = %self.source,
            destination = %self.destination,
            fragments = fragments.len(),
            "transfer executed"
        );
        arena
            .get_mut(&self.destination)?
            .receive(fragments, policy.unresolved_tolerance_ml)
    }

    /// IR parameters: container ids and the requested amount.
    pub fn parameters(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("source".into(), Value::from(self.source.as_str()));
        map.insert("destination".into(), Value::from(self.destination.as_str()));
        map.insert("amount".into(), self.amount.to_json());
        map
    }
}
