use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use atoms_action::{Action, ActionStatus};
use atoms_core::errors::{AtomsError, PhysicsError};
use atoms_core::{ContainerId, ValidationPolicy};

use crate::dry_run::Compilation;

/// One entry of the protocol graph.
#[derive(Debug, Clone)]
pub struct ProtocolNode {
    pub(crate) step_id: String,
    pub(crate) action: Action,
    pub(crate) depends_on: BTreeSet<String>,
    pub(crate) resources: BTreeSet<String>,
    pub(crate) insertion_order: usize,
    pub(crate) status: ActionStatus,
    pub(crate) observation: Option<Value>,
}

impl ProtocolNode {
    /// Unique step identifier.
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// Action executed by the step.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Predecessor step ids.
    pub fn depends_on(&self) -> &BTreeSet<String> {
        &self.depends_on
    }

    /// Opaque resource tags.
    pub fn resources(&self) -> &BTreeSet<String> {
        &self.resources
    }

    /// Position in insertion order; only used to break ties.
    pub fn insertion_order(&self) -> usize {
        self.insertion_order
    }

    /// Status reached during the most recent dry-run.
    pub fn status(&self) -> ActionStatus {
        self.status
    }

    /// Simulator observation recorded during the most recent science dry-run.
    pub fn observation(&self) -> Option<&Value> {
        self.observation.as_ref()
    }
}

/// Optional arguments of [`ProtocolGraph::add_step_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOptions {
    step_id: Option<String>,
    depends_on: Option<Vec<String>>,
    resources: Vec<String>,
}

impl StepOptions {
    /// Empty options: auto id, dependency on the previous step, no resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit step id instead of `s{n}`.
    pub fn step_id(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    /// Replaces the default dependency on the previous step. An empty list makes a root.
    pub fn depends_on<I, S>(mut self, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = Some(depends_on.into_iter().map(Into::into).collect());
        self
    }

    /// Attaches resource tags.
    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }
}

/// Dependency graph of protocol actions.
#[derive(Debug, Clone)]
pub struct ProtocolGraph {
    pub(crate) name: String,
    pub(crate) policy: ValidationPolicy,
    pub(crate) nodes: Vec<ProtocolNode>,
    pub(crate) index: BTreeMap<String, usize>,
    pub(crate) compilation: Option<Compilation>,
}

impl ProtocolGraph {
    /// Creates an empty graph with the default policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name, ValidationPolicy::default())
    }

    /// Creates an empty graph with an explicit policy.
    pub fn with_policy(name: impl Into<String>, policy: ValidationPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            nodes: Vec::new(),
            index: BTreeMap::new(),
            compilation: None,
        }
    }

    /// Protocol name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Policy passed to every action and validator.
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Whether the last dry-run succeeded and nothing changed since.
    pub fn is_compiled(&self) -> bool {
        self.compilation.is_some()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[ProtocolNode] {
        &self.nodes
    }

    /// Looks up a node by step id.
    pub fn node(&self, step_id: &str) -> Option<&ProtocolNode> {
        self.index.get(step_id).map(|&idx| &self.nodes[idx])
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no steps.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a step that depends on the previously added one.
    pub fn add_step(&mut self, action: impl Into<Action>) -> Result<String, AtomsError> {
        self.add_step_with(action, StepOptions::default())
    }

    /// Appends a step with explicit id, dependencies or resources.
    pub fn add_step_with(
        &mut self,
        action: impl Into<Action>,
        options: StepOptions,
    ) -> Result<String, AtomsError> {
        let step_id = options
            .step_id
            .unwrap_or_else(|| format!("s{}", self.nodes.len() + 1));
        if self.index.contains_key(&step_id) {
            return Err(PhysicsError::ordering(
                format!("Duplicate step id '{step_id}'."),
                step_id.clone(),
                "unique step_id",
                "Provide a step_id not yet used by any of the existing steps.",
            )
            .into());
        }

        let depends_on: BTreeSet<String> = match options.depends_on {
            Some(deps) => deps.into_iter().collect(),
            None => self
                .nodes
                .last()
                .map(|node| node.step_id.clone())
                .into_iter()
                .collect(),
        };
        self.check_known(&depends_on)?;

        let insertion_order = self.nodes.len();
        self.index.insert(step_id.clone(), insertion_order);
        self.nodes.push(ProtocolNode {
            step_id: step_id.clone(),
            action: action.into(),
            depends_on,
            resources: options.resources.into_iter().collect(),
            insertion_order,
            status: ActionStatus::Pending,
            observation: None,
        });
        self.compilation = None;
        Ok(step_id)
    }

    /// Adds the edge `depends_on -> step_id` between two existing steps.
    ///
    /// This is the only edit that can introduce a cycle; cycles surface on
    /// the next ordering or dry-run.
    pub fn add_dependency(&mut self, step_id: &str, depends_on: &str) -> Result<(), AtomsError> {
        let wanted: BTreeSet<String> = [step_id.to_string(), depends_on.to_string()]
            .into_iter()
            .collect();
        self.check_known(&wanted)?;
        let idx = self.index[step_id];
        self.nodes[idx].depends_on.insert(depends_on.to_string());
        self.compilation = None;
        Ok(())
    }

    fn check_known(&self, step_ids: &BTreeSet<String>) -> Result<(), AtomsError> {
        let unknown: Vec<&String> = step_ids
            .iter()
            .filter(|id| !self.index.contains_key(id.as_str()))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        let known: Vec<&String> = self.index.keys().collect();
        Err(PhysicsError::ordering(
            "Unknown dependency reference.",
            serde_json::json!(unknown),
            "existing step ids",
            format!("Reference only previously declared step ids: {known:?}."),
        )
        .into())
    }

    /// Nodes in deterministic topological order.
    ///
    /// Kahn's algorithm; among ready nodes the lowest insertion order goes
    /// first. A cycle fails with an ordering error naming exactly the steps
    /// that lie on a cycle.
    pub fn topological_nodes(&self) -> Result<Vec<&ProtocolNode>, AtomsError> {
        Ok(self
            .topological_indices()?
            .into_iter()
            .map(|idx| &self.nodes[idx])
            .collect())
    }

    pub(crate) fn topological_indices(&self) -> Result<Vec<usize>, AtomsError> {
        let successors = self.successors();
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.depends_on.len()).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| idx)
            .collect();

        let mut ordered = Vec::with_capacity(self.nodes.len());
        while let Some(idx) = ready.pop_first() {
            ordered.push(idx);
            for &next in &successors[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if ordered.len() != self.nodes.len() {
            let cycle = self.cycle_members(&successors, &in_degree);
            return Err(PhysicsError::ordering(
                "Dependency cycle detected.",
                serde_json::json!(cycle),
                "acyclic dependency graph",
                format!(
                    "Remove at least one depends_on edge among {cycle:?} so that 0 cycles remain."
                ),
            )
            .into());
        }
        Ok(ordered)
    }

    /// Successor lists indexed by insertion order.
    fn successors(&self) -> Vec<BTreeSet<usize>> {
        let mut successors = vec![BTreeSet::new(); self.nodes.len()];
        for (idx, node) in self.nodes.iter().enumerate() {
            for dep in &node.depends_on {
                if let Some(&parent) = self.index.get(dep) {
                    successors[parent].insert(idx);
                }
            }
        }
        successors
    }

    /// Sorted step ids of the unresolved nodes that can reach themselves.
    fn cycle_members(&self, successors: &[BTreeSet<usize>], in_degree: &[usize]) -> Vec<String> {
        let unresolved: BTreeSet<usize> = (0..self.nodes.len())
            .filter(|&idx| in_degree[idx] > 0)
            .collect();
        let mut members: Vec<String> = unresolved
            .iter()
            .filter(|&&idx| reaches(idx, idx, successors, &unresolved))
            .map(|&idx| self.nodes[idx].step_id.clone())
            .collect();
        members.sort();
        members
    }

    /// Distinct containers referenced by the actions, in order of first reference.
    pub(crate) fn referenced_containers(&self, order: &[usize]) -> Vec<ContainerId> {
        let mut seen = BTreeSet::new();
        let mut containers = Vec::new();
        for &idx in order {
            for id in self.nodes[idx].action.containers() {
                if seen.insert(id.clone()) {
                    containers.push(id.clone());
                }
            }
        }
        containers
    }
}

fn reaches(
    start: usize,
    target: usize,
    successors: &[BTreeSet<usize>],
    within: &BTreeSet<usize>,
) -> bool {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<usize> = successors[start].iter().copied().collect();
    while let Some(idx) = stack.pop() {
        if idx == target {
            return true;
        }
        if !within.contains(&idx) || !visited.insert(idx) {
            continue;
        }
        stack.extend(successors[idx].iter().copied());
    }
    false
}
