//! Rendering of prediction tables for the terminal, JSON and CSV

use anyhow::{Context, Result};
use serde::Serialize;
use std::str::FromStr;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::DistanceUnit;
use crate::running::{RacePrediction, TrainingPaceRange};

const NOT_AVAILABLE: &str = "n/a";

/// Output format for report tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

/// One rendered row of the race prediction table
#[derive(Debug, Clone, PartialEq, Tabled, Serialize)]
pub struct RaceRow {
    #[tabled(rename = "Race")]
    pub race: String,
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Pace")]
    pub pace: String,
}

/// One rendered row of the training pace table
#[derive(Debug, Clone, PartialEq, Tabled, Serialize)]
pub struct PaceRow {
    #[tabled(rename = "Zone")]
    pub zone: String,
    #[tabled(rename = "Pace")]
    pub pace: String,
    #[tabled(rename = "Velocity (m/min)")]
    pub velocity: String,
    #[tabled(rename = "Purpose")]
    pub purpose: String,
}

pub fn race_rows(predictions: &[RacePrediction], unit: DistanceUnit) -> Vec<RaceRow> {
    predictions
        .iter()
        .map(|row| {
            let (time, pace) = if row.is_available() {
                (
                    row.formatted_time(),
                    format!("{}/{}", row.formatted_pace(), unit.abbreviation()),
                )
            } else {
                (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string())
            };
            RaceRow {
                race: row.name.to_string(),
                time,
                pace,
            }
        })
        .collect()
}

pub fn pace_rows(ranges: &[TrainingPaceRange], unit: DistanceUnit) -> Vec<PaceRow> {
    ranges
        .iter()
        .map(|range| PaceRow {
            zone: range.zone.to_string(),
            pace: format!("{}/{}", range.formatted_pace_range(unit), unit.abbreviation()),
            velocity: format!("{:.0}-{:.0}", range.min_velocity, range.max_velocity),
            purpose: range.zone.description().to_string(),
        })
        .collect()
}

/// Render rows in the requested format
pub fn render<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(Table::new(rows).with(Style::rounded()).to_string()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(rows).context("Failed to serialize rows to JSON")
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in rows {
                writer.serialize(row).context("Failed to write CSV row")?;
            }
            let bytes = writer.into_inner().context("Failed to flush CSV output")?;
            String::from_utf8(bytes).context("CSV output was not UTF-8")
        }
    }
}
