//! Duration, pace and distance grammar
//!
//! Converts between minutes-as-float and the colon-delimited strings the
//! calculator displays (`M:SS`, `H:MM:SS`, `H:MM:SS:d`), and buckets raw
//! digit streams into segments while the user is still typing.

use crate::error::ParseError;
use crate::models::Field;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Segment grammar of a duration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationFormat {
    /// `M:SS` only
    Pace,
    /// Up to `HH:MM:SS`
    Time,
    /// Up to `HH:MM:SS:d` with a tenths-of-second segment
    PreciseTime,
}

impl DurationFormat {
    pub fn max_segments(&self) -> usize {
        match self {
            DurationFormat::Pace => 2,
            DurationFormat::Time => 3,
            DurationFormat::PreciseTime => 4,
        }
    }

    /// Longest digit stream accepted by interactive input
    pub fn max_digits(&self) -> usize {
        match self {
            DurationFormat::Pace => 4,
            DurationFormat::Time => 6,
            DurationFormat::PreciseTime => 7,
        }
    }

    /// Map a numeric segment budget onto a grammar, clamping to 2..=4
    pub fn from_max_segments(max_segments: usize) -> Self {
        match max_segments {
            0..=2 => DurationFormat::Pace,
            3 => DurationFormat::Time,
            _ => DurationFormat::PreciseTime,
        }
    }

    /// Segment widths used to bucket `len` digits, left to right
    fn bucket_widths(&self, len: usize) -> &'static [usize] {
        match (self, len) {
            (_, 0) => &[],
            (_, 1) => &[1],
            (_, 2) => &[2],
            (_, 3) => &[1, 2],
            (_, 4) => &[2, 2],
            (DurationFormat::Pace, _) => &[2, 2],
            (_, 5) => &[1, 2, 2],
            (DurationFormat::Time, _) => &[2, 2, 2],
            (DurationFormat::PreciseTime, 6) => &[1, 2, 2, 1],
            (DurationFormat::PreciseTime, _) => &[2, 2, 2, 1],
        }
    }
}

/// Parse a time string (`M:SS`, `H:MM:SS` or `H:MM:SS:d`) into minutes
pub fn parse_duration(s: &str) -> Result<f64, ParseError> {
    let values = parse_segments(s, 2, 4)?;
    minutes_from_segments(&values)
}

/// Parse a pace string (`M:SS` only) into minutes per distance unit
pub fn parse_pace(s: &str) -> Result<f64, ParseError> {
    let values = parse_segments(s, 2, 2)?;
    minutes_from_segments(&values)
}

fn parse_segments(s: &str, min: usize, max: usize) -> Result<Vec<u64>, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < min || parts.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        };
        return Err(ParseError::SegmentCount {
            expected,
            found: parts.len(),
        });
    }

    parts
        .iter()
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::NotANumber {
                    segment: part.to_string(),
                });
            }
            part.parse::<u64>().map_err(|_| ParseError::NotANumber {
                segment: part.to_string(),
            })
        })
        .collect()
}

fn check_sexagesimal(component: &'static str, value: u64) -> Result<f64, ParseError> {
    if value >= 60 {
        return Err(ParseError::OutOfRange { component, value });
    }
    Ok(value as f64)
}

fn minutes_from_segments(values: &[u64]) -> Result<f64, ParseError> {
    match *values {
        [minutes, seconds] => {
            let minutes = check_sexagesimal("minutes", minutes)?;
            let seconds = check_sexagesimal("seconds", seconds)?;
            Ok(minutes + seconds / 60.0)
        }
        [hours, minutes, seconds] => {
            let minutes = check_sexagesimal("minutes", minutes)?;
            let seconds = check_sexagesimal("seconds", seconds)?;
            Ok(hours as f64 * 60.0 + minutes + seconds / 60.0)
        }
        [hours, minutes, seconds, tenths] => {
            let minutes = check_sexagesimal("minutes", minutes)?;
            let seconds = check_sexagesimal("seconds", seconds)?;
            if tenths > 9 {
                return Err(ParseError::OutOfRange {
                    component: "tenths",
                    value: tenths,
                });
            }
            Ok(hours as f64 * 60.0 + minutes + (seconds + tenths as f64 / 10.0) / 60.0)
        }
        _ => Err(ParseError::SegmentCount {
            expected: "2-4".to_string(),
            found: values.len(),
        }),
    }
}

/// Round non-negative minutes to whole `1/units_per_minute` steps
fn rounded_units(minutes: f64, units_per_minute: f64) -> Option<u64> {
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }
    Some((minutes * units_per_minute).round() as u64)
}

/// Format minutes as `M:SS`, or `H:MM:SS` once an hour is reached.
///
/// Seconds are rounded to the nearest integer; a rounded `60` carries into
/// the minutes (and on into the hours). Negative or non-finite input yields
/// an empty string.
pub fn format_duration(minutes: f64) -> String {
    let Some(total_seconds) = rounded_units(minutes, 60.0) else {
        return String::new();
    };

    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Format minutes as `H:MM:SS:d`, keeping tenths of a second
pub fn format_duration_precise(minutes: f64) -> String {
    let Some(total_tenths) = rounded_units(minutes, 600.0) else {
        return String::new();
    };

    let tenths = total_tenths % 10;
    let total_seconds = total_tenths / 10;
    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{}:{:02}:{:02}:{}", hours, mins, secs, tenths)
}

/// Format minutes per unit as `M:SS`; never emits hours or tenths
pub fn format_pace(minutes: f64) -> String {
    let Some(total_seconds) = rounded_units(minutes, 60.0) else {
        return String::new();
    };

    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Bucket a raw digit stream into colon-delimited segments.
///
/// Values that already contain a colon were set programmatically and are
/// returned unchanged. Otherwise non-digits are dropped, the stream is cut
/// to the grammar's digit budget, and the digits are grouped by total length:
/// with three segments `"530"` becomes `"5:30"` and `"12530"` becomes
/// `"1:25:30"`.
pub fn format_digits_as_time(raw: &str, max_segments: usize) -> String {
    if raw.contains(':') {
        return raw.to_string();
    }
    format_digits(raw, DurationFormat::from_max_segments(max_segments))
}

/// Bucket digits for a specific grammar
pub fn format_digits(raw: &str, format: DurationFormat) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(format.max_digits())
        .collect();

    let mut segments = Vec::new();
    let mut start = 0;
    for &width in format.bucket_widths(digits.len()) {
        segments.push(&digits[start..start + width]);
        start += width;
    }
    segments.join(":")
}

/// Parse a distance in the user's unit (a non-negative decimal number)
pub fn parse_distance(s: &str) -> Result<f64, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let value = Decimal::from_str(trimmed)
        .map_err(|_| ParseError::InvalidDistance(trimmed.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ParseError::InvalidDistance(trimmed.to_string()));
    }

    value
        .to_f64()
        .ok_or_else(|| ParseError::InvalidDistance(trimmed.to_string()))
}

/// Format a distance with exactly two decimals, rounding half away from zero
pub fn format_distance(value: f64) -> String {
    if !value.is_finite() || value < 0.0 {
        return String::new();
    }

    match Decimal::from_f64(value) {
        Some(d) => {
            let mut rounded =
                d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            rounded.to_string()
        }
        None => String::new(),
    }
}

/// Canonical form of a typed digit stream: bucketed, parsed, then formatted
/// back (`H:MM:SS:d` for the tenths grammar). `None` while the grouped value
/// is not yet a valid duration.
pub fn normalize_digits(raw: &str, max_segments: usize) -> Option<String> {
    let grouped = format_digits_as_time(raw, max_segments);
    let formatted = match DurationFormat::from_max_segments(max_segments) {
        DurationFormat::Pace => format_pace(parse_pace(&grouped).ok()?),
        DurationFormat::Time => format_duration(parse_duration(&grouped).ok()?),
        DurationFormat::PreciseTime => format_duration_precise(parse_duration(&grouped).ok()?),
    };
    (!formatted.is_empty()).then_some(formatted)
}

/// Parse a calculator field using that field's grammar
pub fn parse_field(field: Field, s: &str) -> Result<f64, ParseError> {
    match field {
        Field::Distance => parse_distance(s),
        Field::Time => parse_duration(s),
        Field::Pace => parse_pace(s),
    }
}

/// Format a value for a calculator field using that field's grammar
pub fn format_field(field: Field, value: f64) -> String {
    match field {
        Field::Distance => format_distance(value),
        Field::Time => format_duration(value),
        Field::Pace => format_pace(value),
    }
}
