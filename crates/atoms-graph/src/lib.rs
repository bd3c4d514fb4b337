#![deny(missing_docs)]
#![doc = "Protocol dependency graph: deterministic Kahn ordering, the transactional dry-run over a container arena, and compilation to the hash-addressed IR."]

mod dry_run;
pub mod export;
mod graph;
pub mod simulator;

pub use dry_run::DryRunReport;
pub use export::ExportOptions;
pub use graph::{ProtocolGraph, ProtocolNode, StepOptions};
pub use simulator::{DryRunMode, SimulationOutcome, SimulationStep, Simulator};
