//! Training paces and race prediction
//!
//! Both tables are driven off a single Performance Index: training zones by
//! inverting the intensity curve at a nominal duration, race times by
//! bisecting the full model for each standard distance.

use crate::duration::{format_duration, format_pace};
use crate::models::DistanceUnit;
use crate::performance_index::{
    from_meters, max_intensity, predict_time, DEFAULT_MAX_ITERATIONS, INTENSITY_A0,
    INTENSITY_A1, INTENSITY_A2,
};
use crate::zones::{TrainingZone, NOMINAL_DURATION_MINUTES};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where the PI driving a table came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum PerformanceSource {
    /// Derived from the calculator's distance and time
    Measured(f64),
    /// Entered by the user in place of the measured value
    Override(f64),
}

impl PerformanceSource {
    /// Pick the PI to predict from: a positive override beats the measurement
    pub fn resolve(measured: Option<f64>, manual: Option<f64>) -> Option<Self> {
        match manual {
            Some(pi) if pi.is_finite() && pi > 0.0 => Some(PerformanceSource::Override(pi)),
            _ => measured
                .filter(|pi| pi.is_finite() && *pi > 0.0)
                .map(PerformanceSource::Measured),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            PerformanceSource::Measured(pi) | PerformanceSource::Override(pi) => *pi,
        }
    }
}

/// Velocity (m/min) that demands `pct` of the PI's maximal intensity at the
/// nominal duration. `None` for non-positive PI or percentage.
pub fn velocity_from_pi_percent(pi: f64, pct: f64) -> Option<f64> {
    if !(pi.is_finite() && pi > 0.0 && pct.is_finite() && pct > 0.0) {
        return None;
    }

    let target = pi * pct * max_intensity(NOMINAL_DURATION_MINUTES);

    // Positive root of a2*v^2 + a1*v + (a0 - target) = 0
    let discriminant =
        INTENSITY_A1 * INTENSITY_A1 - 4.0 * INTENSITY_A2 * (INTENSITY_A0 - target);
    if discriminant < 0.0 {
        return None;
    }

    let v = (-INTENSITY_A1 + discriminant.sqrt()) / (2.0 * INTENSITY_A2);
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Minutes needed to cover `distance_meters` at `velocity` m/min
pub fn time_for_distance(distance_meters: f64, velocity: f64) -> Option<f64> {
    if !(velocity.is_finite() && velocity > 0.0) {
        return None;
    }
    Some(distance_meters / velocity)
}

/// Minutes per distance unit at `velocity` m/min
pub fn pace_for_velocity(velocity: f64, unit: DistanceUnit) -> Option<f64> {
    time_for_distance(unit.meters(), velocity)
}

/// Velocity band for one training zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingPaceRange {
    #[serde(rename = "type")]
    pub zone: TrainingZone,
    /// Velocity at the zone's lower intensity bound (m/min)
    pub min_velocity: f64,
    /// Velocity at the zone's upper intensity bound (m/min)
    pub max_velocity: f64,
}

impl TrainingPaceRange {
    pub fn average_velocity(&self) -> f64 {
        (self.min_velocity + self.max_velocity) / 2.0
    }

    /// (fast, slow) pace in minutes per `unit`
    pub fn pace_range(&self, unit: DistanceUnit) -> Option<(f64, f64)> {
        let fast = pace_for_velocity(self.max_velocity, unit)?;
        let slow = pace_for_velocity(self.min_velocity, unit)?;
        Some((fast, slow))
    }

    /// Display string such as `"5:10-5:45"`
    pub fn formatted_pace_range(&self, unit: DistanceUnit) -> String {
        match self.pace_range(unit) {
            Some((fast, slow)) => format!("{}-{}", format_pace(fast), format_pace(slow)),
            None => String::new(),
        }
    }
}

/// Velocity band for `zone` at the given PI
pub fn training_pace_range(pi: f64, zone: TrainingZone) -> Option<TrainingPaceRange> {
    let (pct_min, pct_max) = zone.range().bounds_f64();
    let min_velocity = velocity_from_pi_percent(pi, pct_min)?;
    let max_velocity = velocity_from_pi_percent(pi, pct_max)?;

    Some(TrainingPaceRange {
        zone,
        min_velocity,
        max_velocity,
    })
}

/// All five zones, easiest first. Empty when the PI is unusable.
pub fn training_paces(pi: f64) -> Vec<TrainingPaceRange> {
    TrainingZone::ALL
        .iter()
        .filter_map(|zone| training_pace_range(pi, *zone))
        .collect()
}

/// A standard race distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RaceDistance {
    pub name: &'static str,
    pub meters: f64,
}

/// Distances covered by the race prediction table, shortest first
pub const RACE_DISTANCES: [RaceDistance; 10] = [
    RaceDistance { name: "1K", meters: 1000.0 },
    RaceDistance { name: "1500m", meters: 1500.0 },
    RaceDistance { name: "5K", meters: 5000.0 },
    RaceDistance { name: "10K", meters: 10_000.0 },
    RaceDistance { name: "15K", meters: 15_000.0 },
    RaceDistance { name: "20K", meters: 20_000.0 },
    RaceDistance { name: "Half Marathon", meters: 21_097.5 },
    RaceDistance { name: "30K", meters: 30_000.0 },
    RaceDistance { name: "Marathon", meters: 42_195.0 },
    RaceDistance { name: "50K", meters: 50_000.0 },
];

/// One row of the race prediction table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RacePrediction {
    pub name: &'static str,
    pub meters: f64,
    /// Predicted time in minutes; `None` marks the row not available
    pub time_minutes: Option<f64>,
    /// Minutes per distance unit at the predicted time
    pub pace: Option<f64>,
}

impl RacePrediction {
    pub fn is_available(&self) -> bool {
        self.time_minutes.is_some()
    }

    pub fn formatted_time(&self) -> String {
        self.time_minutes.map(format_duration).unwrap_or_default()
    }

    pub fn formatted_pace(&self) -> String {
        self.pace.map(format_pace).unwrap_or_default()
    }
}

/// Predict every standard race distance at the given PI
pub fn predict_races(pi: f64, unit: DistanceUnit) -> Vec<RacePrediction> {
    predict_races_with(pi, unit, DEFAULT_MAX_ITERATIONS)
}

/// `predict_races` with an explicit bisection budget
pub fn predict_races_with(pi: f64, unit: DistanceUnit, max_iterations: usize) -> Vec<RacePrediction> {
    RACE_DISTANCES
        .iter()
        .map(|race| {
            let time_minutes = predict_time(race.meters, pi, max_iterations);
            if time_minutes.is_none() {
                debug!(race = race.name, pi, "No race prediction available");
            }
            let pace = time_minutes.map(|t| t / from_meters(race.meters, unit));
            RacePrediction {
                name: race.name,
                meters: race.meters,
                time_minutes,
                pace,
            }
        })
        .collect()
}
