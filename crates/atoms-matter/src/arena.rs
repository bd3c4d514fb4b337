//! Id-indexed container store with transactional snapshots.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use atoms_core::errors::{AtomsError, ErrorInfo};
use atoms_core::ContainerId;

use crate::container::Container;

/// Owns every container a protocol may touch, indexed by [`ContainerId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerArena {
    containers: BTreeMap<ContainerId, Container>,
}

/// Deep copy of a subset of the arena, taken before a dry-run.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaSnapshot {
    containers: Vec<Container>,
}

impl ArenaSnapshot {
    /// Containers captured by the snapshot, in id order.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Captured state of one container.
    pub fn get(&self, id: &ContainerId) -> Option<&Container> {
        self.containers.iter().find(|container| container.id() == id)
    }
}

impl ContainerArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a container and returns its id. Labels must be unique.
    pub fn insert(&mut self, container: Container) -> Result<ContainerId, AtomsError> {
        let id = container.id().clone();
        if self.containers.contains_key(&id) {
            return Err(AtomsError::Usage(
                ErrorInfo::new(
                    "duplicate-container",
                    format!("container `{}` is already registered", container.label()),
                )
                .with_context("container_id", id.as_str()),
            ));
        }
        self.containers.insert(id.clone(), container);
        Ok(id)
    }

    /// Looks up a container.
    pub fn get(&self, id: &ContainerId) -> Result<&Container, AtomsError> {
        self.containers.get(id).ok_or_else(|| unknown_container(id))
    }

    /// Looks up a container for mutation.
    pub fn get_mut(&mut self, id: &ContainerId) -> Result<&mut Container, AtomsError> {
        self.containers.get_mut(id).ok_or_else(|| unknown_container(id))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &ContainerId) -> bool {
        self.containers.contains_key(id)
    }

    /// Iterates containers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Number of registered containers.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether no container is registered.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Clones the listed containers. Every id must be registered.
    pub fn snapshot<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ContainerId>,
    ) -> Result<ArenaSnapshot, AtomsError> {
        let mut containers = ids
            .into_iter()
            .map(|id| self.get(id).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        containers.sort_by(|a, b| a.id().cmp(b.id()));
        containers.dedup_by(|a, b| a.id() == b.id());
        Ok(ArenaSnapshot { containers })
    }

    /// Copies every captured container back into the arena.
    pub fn restore(&mut self, snapshot: &ArenaSnapshot) {
        for container in &snapshot.containers {
            self.containers
                .insert(container.id().clone(), container.clone());
        }
    }

    /// SHA-256 over the serialized state of the listed containers.
    pub fn fingerprint<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ContainerId>,
    ) -> Result<String, AtomsError> {
        let snapshot = self.snapshot(ids)?;
        let bytes = serde_json::to_vec(&snapshot.containers).map_err(|err| {
            AtomsError::Serde(ErrorInfo::new("arena-fingerprint", err.to_string()))
        })?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

fn unknown_container(id: &ContainerId) -> AtomsError {
    AtomsError::Usage(
        ErrorInfo::new(
            "unknown-container",
            format!("container `{id}` is not registered in the arena"),
        )
        .with_context("container_id", id.as_str())
        .with_hint("insert the container into the arena before referencing it"),
    )
}
