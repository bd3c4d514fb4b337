//! Version descriptors for the intermediate representation.

/// IR version emitted by this crate.
pub const IR_VERSION: &str = "1.2.0";

/// Schema version emitted alongside [`IR_VERSION`].
pub const IR_SCHEMA_VERSION: &str = "1.2.0";

/// Oldest IR version that is still accepted and upgraded on load.
pub const LEGACY_IR_VERSION: &str = "1.1.0";

/// Every IR version accepted by the validator.
pub const SUPPORTED_IR_VERSIONS: [&str; 2] = [LEGACY_IR_VERSION, IR_VERSION];

/// Version of the validator library recorded in IR provenance.
pub const VALIDATOR_VERSION: &str = "1.2.0";

/// Parsed `major.minor.patch` version of an IR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes.
    pub patch: u32,
}

impl SchemaVersion {
    /// Version emitted by this crate.
    pub const CURRENT: SchemaVersion = SchemaVersion::new(1, 2, 0);

    /// Oldest version still accepted and upgraded on load.
    pub const LEGACY: SchemaVersion = SchemaVersion::new(1, 1, 0);

    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `major.minor.patch`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }

    /// Whether payloads of this version can be loaded.
    pub fn is_supported(&self) -> bool {
        *self == Self::CURRENT || *self == Self::LEGACY
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_agree_with_parsed_versions() {
        assert_eq!(SchemaVersion::parse(IR_VERSION), Some(SchemaVersion::CURRENT));
        assert_eq!(SchemaVersion::parse(LEGACY_IR_VERSION), Some(SchemaVersion::LEGACY));
        assert_eq!(SchemaVersion::CURRENT.to_string(), IR_SCHEMA_VERSION);
        for raw in SUPPORTED_IR_VERSIONS {
            assert!(SchemaVersion::parse(raw).is_some_and(|v| v.is_supported()));
        }
    }

    #[test]
    fn rejects_malformed_and_unknown_versions() {
        assert_eq!(SchemaVersion::parse("1.2"), None);
        assert_eq!(SchemaVersion::parse("1.2.0.1"), None);
        assert_eq!(SchemaVersion::parse("v1.2.0"), None);
        assert!(!SchemaVersion::new(2, 0, 0).is_supported());
        assert!(SchemaVersion::LEGACY < SchemaVersion::CURRENT);
    }
}
