#![deny(missing_docs)]
#![doc = "Core types for the protocol compiler: typed quantities, the physics error taxonomy, stable identifiers and the validation policy."]

pub mod errors;
pub mod ids;
pub mod policy;
pub mod provenance;
pub mod units;

pub use errors::{AtomsError, ConstraintType, ErrorInfo, PhysicsError, Violation};
pub use ids::{stable_id, ContainerId};
pub use policy::ValidationPolicy;
pub use provenance::{
    SchemaVersion, IR_SCHEMA_VERSION, IR_VERSION, LEGACY_IR_VERSION, SUPPORTED_IR_VERSIONS,
    VALIDATOR_VERSION,
};
pub use units::{
    require_density, require_dimension, require_mass, require_molar_energy, require_molarity,
    require_molecular_weight, require_pressure, require_temperature, require_temperature_delta,
    require_time, require_volume, Dimension, Quantity, Unit, KELVIN_AT_ZERO_CELSIUS,
};
