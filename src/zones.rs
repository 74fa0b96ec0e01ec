use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur during zone lookup
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    #[error("Unknown training zone: {0}")]
    UnknownZone(String),
}

/// Duration (minutes) at which zone percentages are evaluated. Maximal
/// intensity is ~1.0 here, so a zone percentage reads as a fraction of PI.
pub const NOMINAL_DURATION_MINUTES: f64 = 11.0;

/// Named training intensity categories, ordered easiest to hardest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingZone {
    Easy,
    Marathon,
    Threshold,
    Interval,
    Repetition,
}

/// Closed range of intensity fractions covered by a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRange {
    pub pct_min: Decimal,
    pub pct_max: Decimal,
}

impl ZoneRange {
    pub fn contains(&self, pct: Decimal) -> bool {
        pct >= self.pct_min && pct <= self.pct_max
    }

    pub fn bounds_f64(&self) -> (f64, f64) {
        (
            self.pct_min.to_f64().unwrap_or(0.0),
            self.pct_max.to_f64().unwrap_or(0.0),
        )
    }
}

impl TrainingZone {
    pub const ALL: [TrainingZone; 5] = [
        TrainingZone::Easy,
        TrainingZone::Marathon,
        TrainingZone::Threshold,
        TrainingZone::Interval,
        TrainingZone::Repetition,
    ];

    /// Static intensity range for this zone
    ///
    /// - Easy: 59-74%
    /// - Marathon: 75-84%
    /// - Threshold: 83-88%
    /// - Interval: 95-100%
    /// - Repetition: 105-120%
    pub fn range(&self) -> ZoneRange {
        let (pct_min, pct_max) = match self {
            TrainingZone::Easy => (dec!(0.59), dec!(0.74)),
            TrainingZone::Marathon => (dec!(0.75), dec!(0.84)),
            TrainingZone::Threshold => (dec!(0.83), dec!(0.88)),
            TrainingZone::Interval => (dec!(0.95), dec!(1.00)),
            TrainingZone::Repetition => (dec!(1.05), dec!(1.20)),
        };
        ZoneRange { pct_min, pct_max }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrainingZone::Easy => "easy",
            TrainingZone::Marathon => "marathon",
            TrainingZone::Threshold => "threshold",
            TrainingZone::Interval => "interval",
            TrainingZone::Repetition => "repetition",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TrainingZone::Easy => "Easy / long runs",
            TrainingZone::Marathon => "Marathon pace",
            TrainingZone::Threshold => "Comfortably hard tempo",
            TrainingZone::Interval => "Hard intervals, 3-5 min",
            TrainingZone::Repetition => "Fast repeats, short recoveries",
        }
    }
}

impl fmt::Display for TrainingZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TrainingZone {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" => Ok(TrainingZone::Easy),
            "marathon" | "m" => Ok(TrainingZone::Marathon),
            "threshold" | "t" => Ok(TrainingZone::Threshold),
            "interval" | "i" => Ok(TrainingZone::Interval),
            "repetition" | "r" => Ok(TrainingZone::Repetition),
            _ => Err(ZoneError::UnknownZone(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_ranges_are_well_formed() {
        for zone in TrainingZone::ALL {
            let range = zone.range();
            assert!(range.pct_min > dec!(0));
            assert!(range.pct_min < range.pct_max, "{} range inverted", zone);
        }
    }

    #[test]
    fn test_zone_midpoints_increase() {
        let midpoints: Vec<Decimal> = TrainingZone::ALL
            .iter()
            .map(|z| (z.range().pct_min + z.range().pct_max) / dec!(2))
            .collect();
        assert!(midpoints.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("Threshold".parse::<TrainingZone>().unwrap(), TrainingZone::Threshold);
        assert_eq!("r".parse::<TrainingZone>().unwrap(), TrainingZone::Repetition);
        assert!("tempo".parse::<TrainingZone>().is_err());
        assert_eq!(TrainingZone::Interval.to_string(), "interval");
    }

    #[test]
    fn test_zone_range_contains() {
        let range = TrainingZone::Threshold.range();
        assert!(range.contains(dec!(0.85)));
        assert!(range.contains(dec!(0.88)));
        assert!(!range.contains(dec!(0.9)));
        let (lo, hi) = range.bounds_f64();
        assert!((lo - 0.83).abs() < 1e-12 && (hi - 0.88).abs() < 1e-12);
    }
}
