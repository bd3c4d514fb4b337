#![deny(missing_docs)]
#![doc = "Entity model: matter, containers, ambient environment and the id-indexed container arena."]

mod arena;
mod container;
mod environment;
mod flash;
mod matter;

pub use arena::{ArenaSnapshot, ContainerArena};
pub use container::{Container, EMPTY_CONTAINER_TEMPERATURE_C};
pub use environment::Environment;
pub use flash::reference_flash_point;
pub use matter::{Matter, Phase, DEFAULT_EXPANSION_COEFFICIENT};
