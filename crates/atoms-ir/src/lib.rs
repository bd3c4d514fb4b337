#![deny(missing_docs)]
#![doc = "Versioned intermediate representation: canonical JSON encoding, SHA-256 content hashing, structural validation and legacy upgrade."]

mod canonical;
mod hash;
pub mod schema;
mod validate;

pub use canonical::{canonical_json, pretty_json};
pub use hash::{attach_ir_hash, ir_hash, staged_ir_hash, verify_ir_hash};
pub use schema::{check_structure, REQUIRED_FIELDS};
pub use validate::{load_ir_payload, validate_ir};
