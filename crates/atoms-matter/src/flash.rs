//! Reference flash points for common solvents.

use atoms_core::{Quantity, Unit};

/// Flash points of common solvents keyed by CAS registry number, in degrees Celsius.
const FLASH_POINTS_C: [(&str, f64); 3] = [
    ("67-56-1", 11.0),  // methanol
    ("64-17-5", 13.0),  // ethanol
    ("67-64-1", -20.0), // acetone
];

/// Looks up a reference flash point for a CAS number.
pub fn reference_flash_point(cas_number: &str) -> Option<Quantity> {
    let cas = cas_number.trim();
    FLASH_POINTS_C
        .iter()
        .find(|(entry, _)| *entry == cas)
        .map(|(_, celsius)| Quantity::new(*celsius, Unit::Celsius))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_solvents_resolve() {
        let ethanol = reference_flash_point("64-17-5").unwrap();
        assert_eq!(ethanol, Quantity::new(13.0, Unit::Celsius));
        assert!(reference_flash_point("7732-18-5").is_none());
    }
}
