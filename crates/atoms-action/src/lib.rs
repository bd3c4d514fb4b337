#![deny(missing_docs)]
#![doc = "Typed protocol actions (Move, Transform, Combine, Measure) and the validators that encode physical law as executable checks."]

mod action;
mod combine;
mod measure;
mod transfer;
mod transform;
pub mod validators;

pub use action::{Action, ActionStatus};
pub use combine::Combine;
pub use measure::{Measure, Sensor};
pub use transfer::Move;
pub use transform::{Transform, TEMPERATURE_PARAMETER};
pub use validators::{
    check_mass_conservation, check_thermal_safety, check_volume_feasibility, expansion_factor,
    total_mass_g,
};
