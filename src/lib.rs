// Library interface for pacecalc modules
// This allows integration tests and the CLI to share the engine

pub mod calculator;
pub mod config;
pub mod duration;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod performance_index;
pub mod running;
pub mod zones;

// Re-export commonly used types for convenience
pub use calculator::{reduce, Action, Calculator, CalculatorState, ErrorKey};
pub use duration::{
    format_digits_as_time, format_duration, format_pace, parse_duration, parse_pace,
    DurationFormat,
};
pub use error::{PaceCalcError, ParseError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use performance_index::{performance_index, predict_time, to_meters};
pub use running::{
    predict_races, time_for_distance, training_pace_range, velocity_from_pi_percent,
    PerformanceSource, RacePrediction, TrainingPaceRange,
};
pub use zones::TrainingZone;
