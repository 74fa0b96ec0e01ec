use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three calculator input fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Distance,
    Time,
    Pace,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Distance, Field::Time, Field::Pace];

    /// The two fields that are not `self`, in derivation priority order
    /// for a lock on `self`.
    pub fn others(&self) -> (Field, Field) {
        match self {
            Field::Distance => (Field::Pace, Field::Time),
            Field::Time => (Field::Pace, Field::Distance),
            Field::Pace => (Field::Distance, Field::Time),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Distance => "distance",
            Field::Time => "time",
            Field::Pace => "pace",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" | "d" => Ok(Field::Distance),
            "time" | "t" => Ok(Field::Time),
            "pace" | "p" => Ok(Field::Pace),
            _ => Err(format!("Invalid field: {}", s)),
        }
    }
}

/// Whether derived fields need an explicit calculate action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculatorMode {
    #[default]
    Manual,
    Auto,
}

impl FromStr for CalculatorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(CalculatorMode::Manual),
            "auto" => Ok(CalculatorMode::Auto),
            _ => Err(format!("Invalid mode: {}", s)),
        }
    }
}

impl fmt::Display for CalculatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculatorMode::Manual => write!(f, "manual"),
            CalculatorMode::Auto => write!(f, "auto"),
        }
    }
}

/// Unit of a raw distance value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[serde(rename = "km")]
    Kilometers,
    Miles,
}

impl DistanceUnit {
    /// Meters in one unit. Fixed conversion factors, not geodetic.
    pub fn meters(&self) -> f64 {
        match self {
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Miles => 1609.34,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}

/// Unit system selected by the user interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn distance_unit(&self) -> DistanceUnit {
        match self {
            UnitSystem::Metric => DistanceUnit::Kilometers,
            UnitSystem::Imperial => DistanceUnit::Miles,
        }
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" | "km" => Ok(UnitSystem::Metric),
            "imperial" | "mi" | "miles" => Ok(UnitSystem::Imperial),
            _ => Err(format!("Invalid unit system: {}", s)),
        }
    }
}

/// The calculator's visible state: three raw strings, each either empty
/// or a value in that field's own grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationInputs {
    pub distance: String,
    pub time: String,
    pub pace: String,
}

impl CalculationInputs {
    pub fn new(
        distance: impl Into<String>,
        time: impl Into<String>,
        pace: impl Into<String>,
    ) -> Self {
        Self {
            distance: distance.into(),
            time: time.into(),
            pace: pace.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Distance => &self.distance,
            Field::Time => &self.time,
            Field::Pace => &self.pace,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Distance => self.distance = value,
            Field::Time => self.time = value,
            Field::Pace => self.pace = value,
        }
    }

    /// True when the field holds anything besides whitespace
    pub fn is_filled(&self, field: Field) -> bool {
        !self.get(field).trim().is_empty()
    }
}

/// Common race distance shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistancePreset {
    OneK,
    FiveK,
    TenK,
    HalfMarathon,
    Marathon,
}

impl DistancePreset {
    pub const ALL: [DistancePreset; 5] = [
        DistancePreset::OneK,
        DistancePreset::FiveK,
        DistancePreset::TenK,
        DistancePreset::HalfMarathon,
        DistancePreset::Marathon,
    ];

    /// Preset distance in the given unit system's distance unit
    pub fn value(&self, units: UnitSystem) -> Decimal {
        match (self, units) {
            (DistancePreset::OneK, UnitSystem::Metric) => dec!(1),
            (DistancePreset::FiveK, UnitSystem::Metric) => dec!(5),
            (DistancePreset::TenK, UnitSystem::Metric) => dec!(10),
            (DistancePreset::HalfMarathon, UnitSystem::Metric) => dec!(21.0975),
            (DistancePreset::Marathon, UnitSystem::Metric) => dec!(42.195),
            (DistancePreset::OneK, UnitSystem::Imperial) => dec!(0.62),
            (DistancePreset::FiveK, UnitSystem::Imperial) => dec!(3.11),
            (DistancePreset::TenK, UnitSystem::Imperial) => dec!(6.21),
            (DistancePreset::HalfMarathon, UnitSystem::Imperial) => dec!(13.11),
            (DistancePreset::Marathon, UnitSystem::Imperial) => dec!(26.22),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistancePreset::OneK => "1K",
            DistancePreset::FiveK => "5K",
            DistancePreset::TenK => "10K",
            DistancePreset::HalfMarathon => "Half",
            DistancePreset::Marathon => "Marathon",
        }
    }
}

impl FromStr for DistancePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1k" => Ok(DistancePreset::OneK),
            "5k" => Ok(DistancePreset::FiveK),
            "10k" => Ok(DistancePreset::TenK),
            "half" | "half-marathon" => Ok(DistancePreset::HalfMarathon),
            "marathon" | "full" => Ok(DistancePreset::Marathon),
            _ => Err(format!("Invalid distance preset: {}", s)),
        }
    }
}
