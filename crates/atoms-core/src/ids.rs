//! Deterministic identifiers derived from entity labels.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Builds `<type>_<12 hex chars>` from the SHA-256 of the normalized `<type>::<label>`.
pub fn stable_id(entity_type: &str, label: &str) -> String {
    let kind = entity_type.trim().to_lowercase();
    let normalized = format!("{kind}::{}", label.trim().to_lowercase());
    let digest = format!("{:x}", Sha256::digest(normalized.as_bytes()));
    format!("{kind}_{}", &digest[..12])
}

/// Identifier of a container, derived from its label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    /// Derives the identifier for a container label.
    pub fn from_label(label: &str) -> Self {
        Self(stable_id("container", label))
    }

    /// Returns the raw string form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
