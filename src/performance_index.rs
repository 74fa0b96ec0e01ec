//! Performance Index model
//!
//! A quadratic intensity curve over velocity, divided by a bi-exponential
//! curve describing the fraction of maximal intensity that can be held for a
//! given duration. The ratio is the Performance Index (PI); `predict_time`
//! inverts it by bisection.
//!
//! Velocities are in meters per minute, durations in minutes.

use crate::duration::{parse_distance, parse_duration};
use crate::models::{DistanceUnit, UnitSystem};
use tracing::{trace, warn};

/// Intensity polynomial coefficients: `a0 + a1*v + a2*v^2`
pub const INTENSITY_A0: f64 = -4.60;
pub const INTENSITY_A1: f64 = 0.182258;
pub const INTENSITY_A2: f64 = 0.000104;

/// Maximal intensity curve: `b0 + b1*exp(c1*t) + b2*exp(c2*t)`
pub const MAX_INTENSITY_B0: f64 = 0.8;
pub const MAX_INTENSITY_B1: f64 = 0.1894393;
pub const MAX_INTENSITY_C1: f64 = -0.012778;
pub const MAX_INTENSITY_B2: f64 = 0.2989558;
pub const MAX_INTENSITY_C2: f64 = -0.1932605;

/// Default bisection budget for `predict_time`
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Bisection stops once the candidate's PI is this close to the target
pub const CONVERGENCE_THRESHOLD: f64 = 1e-4;

/// Any candidate time beyond this many minutes is treated as divergence
pub const DIVERGENCE_LIMIT_MINUTES: f64 = 100_000.0;

/// Velocity in meters per minute
pub fn velocity(distance_meters: f64, time_minutes: f64) -> f64 {
    distance_meters / time_minutes
}

/// Aerobic intensity demanded by running at `velocity` m/min
pub fn intensity(velocity: f64) -> f64 {
    INTENSITY_A0 + INTENSITY_A1 * velocity + INTENSITY_A2 * velocity * velocity
}

/// Fraction of maximal intensity sustainable for `time_minutes`
pub fn max_intensity(time_minutes: f64) -> f64 {
    MAX_INTENSITY_B0
        + MAX_INTENSITY_B1 * (MAX_INTENSITY_C1 * time_minutes).exp()
        + MAX_INTENSITY_B2 * (MAX_INTENSITY_C2 * time_minutes).exp()
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Performance Index for covering `distance_meters` in `time_minutes`.
///
/// Clamped at zero from below. `None` when either input is non-positive,
/// NaN or infinite.
pub fn performance_index(distance_meters: f64, time_minutes: f64) -> Option<f64> {
    if !is_positive(distance_meters) || !is_positive(time_minutes) {
        return None;
    }

    let v = velocity(distance_meters, time_minutes);
    let pi = intensity(v) / max_intensity(time_minutes);
    if !pi.is_finite() {
        return None;
    }
    Some(pi.max(0.0))
}

/// Time in minutes at which `distance_meters` yields `target_pi`.
///
/// Bisects over `[1, distance/10]` minutes starting from `distance/200`.
/// Returns `None` for a non-positive target or distance, or when a candidate
/// time leaves `(0, DIVERGENCE_LIMIT_MINUTES]`. If the iteration budget runs
/// out before convergence the last midpoint is returned as a best estimate.
pub fn predict_time(distance_meters: f64, target_pi: f64, max_iterations: usize) -> Option<f64> {
    if !is_positive(target_pi) || !is_positive(distance_meters) {
        return None;
    }

    let mut min_time = 1.0;
    let mut max_time = distance_meters / 10.0;
    let mut time = distance_meters / 200.0;

    for iteration in 0..max_iterations {
        if !time.is_finite() || time <= 0.0 || time > DIVERGENCE_LIMIT_MINUTES {
            warn!(distance_meters, target_pi, time, "Bisection diverged");
            return None;
        }

        let current_pi = performance_index(distance_meters, time)?;
        if (current_pi - target_pi).abs() < CONVERGENCE_THRESHOLD {
            trace!(distance_meters, target_pi, time, iteration, "Bisection converged");
            return Some(time);
        }

        // PI falls as time grows: too fast means the answer lies later
        if current_pi > target_pi {
            min_time = time;
        } else {
            max_time = time;
        }
        time = (min_time + max_time) / 2.0;
    }

    trace!(distance_meters, target_pi, time, "Bisection budget exhausted");
    Some(time)
}

/// `predict_time` with the default iteration budget
pub fn predict_time_default(distance_meters: f64, target_pi: f64) -> Option<f64> {
    predict_time(distance_meters, target_pi, DEFAULT_MAX_ITERATIONS)
}

/// Convert a distance in `unit` to meters
pub fn to_meters(value: f64, unit: DistanceUnit) -> f64 {
    value * unit.meters()
}

/// Convert meters to a distance in `unit`
pub fn from_meters(meters: f64, unit: DistanceUnit) -> f64 {
    meters / unit.meters()
}

/// PI straight from the calculator's raw distance and time fields
pub fn performance_index_for_inputs(
    distance: &str,
    time: &str,
    units: UnitSystem,
) -> Option<f64> {
    let distance = parse_distance(distance).ok()?;
    let time = parse_duration(time).ok()?;
    performance_index(to_meters(distance, units.distance_unit()), time)
}
