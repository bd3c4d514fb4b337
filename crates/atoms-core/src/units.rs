//! Typed physical quantities with dimension tags and stateless unit conversion.
//!
//! Every unit maps to a base unit of its dimension through an affine rule
//! `base = value * scale + offset`. Only absolute temperatures carry a non-zero
//! offset. There is no process-wide registry: the tables below are the whole
//! conversion model.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{AtomsError, ErrorInfo};

/// Physical dimension of a [`Quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Length cubed.
    Volume,
    /// Mass.
    Mass,
    /// Absolute temperature.
    Temperature,
    /// Temperature difference.
    TemperatureDelta,
    /// Time.
    Time,
    /// Substance per volume.
    Molarity,
    /// Mass per substance.
    MolecularWeight,
    /// Mass per volume.
    Density,
    /// Force per area.
    Pressure,
    /// Energy per substance.
    MolarEnergy,
    /// Inverse temperature, used for expansion coefficients.
    ExpansionCoefficient,
}

impl Dimension {
    /// Returns the wire name of the dimension.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dimension::Volume => "volume",
            Dimension::Mass => "mass",
            Dimension::Temperature => "temperature",
            Dimension::TemperatureDelta => "temperature_delta",
            Dimension::Time => "time",
            Dimension::Molarity => "molarity",
            Dimension::MolecularWeight => "molecular_weight",
            Dimension::Density => "density",
            Dimension::Pressure => "pressure",
            Dimension::MolarEnergy => "molar_energy",
            Dimension::ExpansionCoefficient => "expansion_coefficient",
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    /// 1e-3 milliliter.
    Microliter,
    /// Base volume unit.
    Milliliter,
    /// 1000 milliliter.
    Liter,
    /// 1e-3 gram.
    Milligram,
    /// Base mass unit.
    Gram,
    /// 1000 gram.
    Kilogram,
    /// Degrees Celsius.
    Celsius,
    /// Kelvin, base temperature unit.
    Kelvin,
    /// Degrees Fahrenheit.
    Fahrenheit,
    /// Celsius-sized temperature difference.
    DeltaCelsius,
    /// Kelvin-sized temperature difference, base delta unit.
    DeltaKelvin,
    /// Base time unit.
    Second,
    /// 60 seconds.
    Minute,
    /// 3600 seconds.
    Hour,
    /// Moles per liter, base molarity unit.
    Molar,
    /// 1e-3 molar.
    Millimolar,
    /// 1e-6 molar.
    Micromolar,
    /// Base molecular weight unit.
    GramPerMole,
    /// 1000 gram per mole.
    KilogramPerMole,
    /// Base density unit.
    GramPerMilliliter,
    /// Equal to gram per milliliter.
    KilogramPerLiter,
    /// 1e-3 gram per milliliter.
    GramPerLiter,
    /// Base pressure unit.
    Pascal,
    /// 1e3 pascal.
    Kilopascal,
    /// 1e5 pascal.
    Bar,
    /// 101325 pascal.
    Atmosphere,
    /// Base molar energy unit.
    JoulePerMole,
    /// 1e3 joule per mole.
    KilojoulePerMole,
    /// Base expansion coefficient unit.
    PerKelvin,
}

const ALL_UNITS: [Unit; 29] = [
    Unit::Microliter,
    Unit::Milliliter,
    Unit::Liter,
    Unit::Milligram,
    Unit::Gram,
    Unit::Kilogram,
    Unit::Celsius,
    Unit::Kelvin,
    Unit::Fahrenheit,
    Unit::DeltaCelsius,
    Unit::DeltaKelvin,
    Unit::Second,
    Unit::Minute,
    Unit::Hour,
    Unit::Molar,
    Unit::Millimolar,
    Unit::Micromolar,
    Unit::GramPerMole,
    Unit::KilogramPerMole,
    Unit::GramPerMilliliter,
    Unit::KilogramPerLiter,
    Unit::GramPerLiter,
    Unit::Pascal,
    Unit::Kilopascal,
    Unit::Bar,
    Unit::Atmosphere,
    Unit::JoulePerMole,
    Unit::KilojoulePerMole,
    Unit::PerKelvin,
];

const FAHRENHEIT_SCALE: f64 = 5.0 / 9.0;

/// Kelvin value of 0 degC.
pub const KELVIN_AT_ZERO_CELSIUS: f64 = 273.15;

impl Unit {
    /// Returns the dimension measured by this unit.
    pub const fn dimension(&self) -> Dimension {
        match self {
            Unit::Microliter | Unit::Milliliter | Unit::Liter => Dimension::Volume,
            Unit::Milligram | Unit::Gram | Unit::Kilogram => Dimension::Mass,
            Unit::Celsius | Unit::Kelvin | Unit::Fahrenheit => Dimension::Temperature,
            Unit::DeltaCelsius | Unit::DeltaKelvin => Dimension::TemperatureDelta,
            Unit::Second | Unit::Minute | Unit::Hour => Dimension::Time,
            Unit::Molar | Unit::Millimolar | Unit::Micromolar => Dimension::Molarity,
            Unit::GramPerMole | Unit::KilogramPerMole => Dimension::MolecularWeight,
            Unit::GramPerMilliliter | Unit::KilogramPerLiter | Unit::GramPerLiter => {
                Dimension::Density
            }
            Unit::Pascal | Unit::Kilopascal | Unit::Bar | Unit::Atmosphere => Dimension::Pressure,
            Unit::JoulePerMole | Unit::KilojoulePerMole => Dimension::MolarEnergy,
            Unit::PerKelvin => Dimension::ExpansionCoefficient,
        }
    }

    /// Canonical symbol used on the wire.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Unit::Microliter => "microliter",
            Unit::Milliliter => "milliliter",
            Unit::Liter => "liter",
            Unit::Milligram => "milligram",
            Unit::Gram => "gram",
            Unit::Kilogram => "kilogram",
            Unit::Celsius => "degC",
            Unit::Kelvin => "kelvin",
            Unit::Fahrenheit => "degF",
            Unit::DeltaCelsius => "delta_degC",
            Unit::DeltaKelvin => "delta_K",
            Unit::Second => "second",
            Unit::Minute => "minute",
            Unit::Hour => "hour",
            Unit::Molar => "molar",
            Unit::Millimolar => "millimolar",
            Unit::Micromolar => "micromolar",
            Unit::GramPerMole => "gram / mole",
            Unit::KilogramPerMole => "kilogram / mole",
            Unit::GramPerMilliliter => "gram / milliliter",
            Unit::KilogramPerLiter => "kilogram / liter",
            Unit::GramPerLiter => "gram / liter",
            Unit::Pascal => "pascal",
            Unit::Kilopascal => "kilopascal",
            Unit::Bar => "bar",
            Unit::Atmosphere => "atmosphere",
            Unit::JoulePerMole => "joule / mole",
            Unit::KilojoulePerMole => "kilojoule / mole",
            Unit::PerKelvin => "1 / kelvin",
        }
    }

    /// Affine map `(scale, offset)` into the base unit of the dimension.
    fn to_base(&self) -> (f64, f64) {
        match self {
            Unit::Microliter => (1e-3, 0.0),
            Unit::Milliliter => (1.0, 0.0),
            Unit::Liter => (1e3, 0.0),
            Unit::Milligram => (1e-3, 0.0),
            Unit::Gram => (1.0, 0.0),
            Unit::Kilogram => (1e3, 0.0),
            Unit::Celsius => (1.0, KELVIN_AT_ZERO_CELSIUS),
            Unit::Kelvin => (1.0, 0.0),
            Unit::Fahrenheit => (
                FAHRENHEIT_SCALE,
                KELVIN_AT_ZERO_CELSIUS - 32.0 * FAHRENHEIT_SCALE,
            ),
            Unit::DeltaCelsius | Unit::DeltaKelvin => (1.0, 0.0),
            Unit::Second => (1.0, 0.0),
            Unit::Minute => (60.0, 0.0),
            Unit::Hour => (3600.0, 0.0),
            Unit::Molar => (1.0, 0.0),
            Unit::Millimolar => (1e-3, 0.0),
            Unit::Micromolar => (1e-6, 0.0),
            Unit::GramPerMole => (1.0, 0.0),
            Unit::KilogramPerMole => (1e3, 0.0),
            Unit::GramPerMilliliter | Unit::KilogramPerLiter => (1.0, 0.0),
            Unit::GramPerLiter => (1e-3, 0.0),
            Unit::Pascal => (1.0, 0.0),
            Unit::Kilopascal => (1e3, 0.0),
            Unit::Bar => (1e5, 0.0),
            Unit::Atmosphere => (101_325.0, 0.0),
            Unit::JoulePerMole => (1.0, 0.0),
            Unit::KilojoulePerMole => (1e3, 0.0),
            Unit::PerKelvin => (1.0, 0.0),
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Unit::Microliter => &["ul", "µl", "μl", "microliters", "microlitre"],
            Unit::Milliliter => &["ml", "milliliters", "millilitre", "cc"],
            Unit::Liter => &["l", "liters", "litre"],
            Unit::Milligram => &["mg", "milligrams"],
            Unit::Gram => &["g", "grams"],
            Unit::Kilogram => &["kg", "kilograms"],
            Unit::Celsius => &["c", "°c", "degc", "celsius"],
            Unit::Kelvin => &["k"],
            Unit::Fahrenheit => &["f", "°f", "degf", "fahrenheit"],
            Unit::DeltaCelsius => &["delta_degc", "delta_c"],
            Unit::DeltaKelvin => &["delta_k", "delta_kelvin"],
            Unit::Second => &["s", "sec", "seconds"],
            Unit::Minute => &["min", "minutes"],
            Unit::Hour => &["h", "hr", "hours"],
            Unit::Molar => &["m", "mol/l", "mol / liter"],
            Unit::Millimolar => &["mm", "mmol/l"],
            Unit::Micromolar => &["um", "µm", "μm", "umol/l"],
            Unit::GramPerMole => &["g/mol", "g / mol"],
            Unit::KilogramPerMole => &["kg/mol", "kg / mol"],
            Unit::GramPerMilliliter => &["g/ml", "g / ml"],
            Unit::KilogramPerLiter => &["kg/l", "kg / l"],
            Unit::GramPerLiter => &["g/l", "g / l"],
            Unit::Pascal => &["pa"],
            Unit::Kilopascal => &["kpa"],
            Unit::Bar => &[],
            Unit::Atmosphere => &["atm"],
            Unit::JoulePerMole => &["j/mol", "j / mol"],
            Unit::KilojoulePerMole => &["kj/mol", "kj / mol"],
            Unit::PerKelvin => &["1/k", "1/kelvin", "per_kelvin"],
        }
    }

    /// Parses a unit from its symbol or a common alias (case-insensitive).
    pub fn parse(raw: &str) -> Result<Self, AtomsError> {
        let needle = raw.trim();
        let lowered = needle.to_lowercase();
        for unit in ALL_UNITS {
            if unit.symbol().to_lowercase() == lowered || unit.aliases().contains(&lowered.as_str())
            {
                return Ok(unit);
            }
        }
        Err(AtomsError::Unit(
            ErrorInfo::new("unknown-unit", format!("unit `{needle}` is not supported"))
                .with_context("unit", needle),
        ))
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = AtomsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

impl TryFrom<String> for Unit {
    type Error = AtomsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Unit::parse(&value)
    }
}

impl From<Unit> for String {
    fn from(value: Unit) -> Self {
        value.symbol().to_string()
    }
}

/// Immutable physical quantity. Conversion always produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(rename = "value")]
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    /// Creates a quantity carrying an explicit unit.
    pub const fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Creates a quantity from a unit symbol or alias.
    pub fn parse(magnitude: f64, unit: &str) -> Result<Self, AtomsError> {
        Ok(Self::new(magnitude, Unit::parse(unit)?))
    }

    /// Returns the numeric magnitude in the quantity's own unit.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Returns the unit of the quantity.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns the dimension of the quantity.
    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    /// Converts into `target`, failing when the dimensions differ.
    pub fn to(&self, target: Unit) -> Result<Quantity, AtomsError> {
        if self.dimension() != target.dimension() {
            return Err(dimension_mismatch(self, target.dimension()));
        }
        if self.unit == target {
            return Ok(*self);
        }
        let (scale, offset) = self.unit.to_base();
        let base = self.magnitude * scale + offset;
        let (target_scale, target_offset) = target.to_base();
        Ok(Quantity::new((base - target_offset) / target_scale, target))
    }

    /// Returns the magnitude expressed in `target`.
    pub fn value_in(&self, target: Unit) -> Result<f64, AtomsError> {
        Ok(self.to(target)?.magnitude)
    }

    /// Returns the magnitude in the base unit of the dimension
    /// (milliliter, gram, kelvin, second, molar, ...).
    pub fn base_value(&self) -> f64 {
        let (scale, offset) = self.unit.to_base();
        self.magnitude * scale + offset
    }

    /// Returns `{"unit": <symbol>, "value": <magnitude>}`.
    pub fn to_json(&self) -> Value {
        json!({ "value": self.magnitude, "unit": self.unit.symbol() })
    }

    /// Scales the magnitude, keeping the unit. Rejected for absolute temperatures.
    pub fn scaled(&self, factor: f64) -> Result<Quantity, AtomsError> {
        if self.dimension() == Dimension::Temperature {
            return Err(AtomsError::Unit(
                ErrorInfo::new(
                    "affine-scaling",
                    "absolute temperatures cannot be scaled; convert to a delta first",
                )
                .with_context("unit", self.unit.symbol()),
            ));
        }
        Ok(Quantity::new(self.magnitude * factor, self.unit))
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit.symbol())
    }
}

fn dimension_mismatch(quantity: &Quantity, expected: Dimension) -> AtomsError {
    AtomsError::Unit(
        ErrorInfo::new(
            "dimension-mismatch",
            format!(
                "expected a {expected} quantity, got {} ({})",
                quantity,
                quantity.dimension()
            ),
        )
        .with_context("expected", expected.as_str())
        .with_context("actual", quantity.dimension().as_str())
        .with_hint(format!("supply the value with {expected} units")),
    )
}

/// Ensures the quantity has the expected dimension and a finite magnitude.
pub fn require_dimension(quantity: Quantity, expected: Dimension) -> Result<Quantity, AtomsError> {
    if quantity.dimension() != expected {
        return Err(dimension_mismatch(&quantity, expected));
    }
    if !quantity.magnitude.is_finite() {
        return Err(AtomsError::Unit(
            ErrorInfo::new("non-finite", "quantity magnitude must be finite")
                .with_context("unit", quantity.unit.symbol()),
        ));
    }
    Ok(quantity)
}

/// Requires a volume quantity.
pub fn require_volume(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::Volume)
}

/// Requires a mass quantity.
pub fn require_mass(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::Mass)
}

/// Requires an absolute temperature quantity.
pub fn require_temperature(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::Temperature)
}

/// Requires a temperature difference quantity.
pub fn require_temperature_delta(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::TemperatureDelta)
}

/// Requires a time quantity.
pub fn require_time(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::Time)
}

/// Requires a density quantity.
pub fn require_density(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::Density)
}

/// Requires a molecular weight quantity.
pub fn require_molecular_weight(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::MolecularWeight)
}

/// Requires a molarity quantity.
pub fn require_molarity(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::Molarity)
}

/// Requires a pressure quantity.
pub fn require_pressure(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::Pressure)
}

/// Requires an energy-per-substance quantity.
pub fn require_molar_energy(quantity: Quantity) -> Result<Quantity, AtomsError> {
    require_dimension(quantity, Dimension::MolarEnergy)
}
