use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use pacecalc::calculator::{Action, Calculator, CalculatorState};
use pacecalc::config::AppConfig;
use pacecalc::duration::{
    format_digits_as_time, normalize_digits, parse_distance, parse_duration,
};
use pacecalc::error::{ErrorSeverity, PaceCalcError};
use pacecalc::export::{self, OutputFormat};
use pacecalc::logging::init_logging;
use pacecalc::models::{CalculatorMode, Field, UnitSystem};
use pacecalc::performance_index::{performance_index, to_meters};
use pacecalc::running::{predict_races_with, training_paces, PerformanceSource};

/// pacecalc - Running pace calculator
///
/// Derives distance, time or pace from the other two, computes a Performance
/// Index from a race result, and predicts race times and training paces.
#[derive(Parser)]
#[command(name = "pacecalc")]
#[command(version)]
#[command(about = "Running pace, time and distance calculator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Unit system for distances and paces (metric, imperial)
    #[arg(short, long, global = true)]
    units: Option<UnitSystem>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PerformanceArgs {
    /// Race distance in the selected unit
    #[arg(short, long)]
    distance: Option<String>,

    /// Race time (M:SS or H:MM:SS)
    #[arg(short, long)]
    time: Option<String>,

    /// Performance Index to use instead of a race result
    #[arg(long)]
    pi: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one of distance, time or pace from the other two
    Calc {
        /// Distance in the selected unit
        #[arg(short, long)]
        distance: Option<String>,

        /// Time (M:SS or H:MM:SS)
        #[arg(short, long)]
        time: Option<String>,

        /// Pace per distance unit (M:SS)
        #[arg(short, long)]
        pace: Option<String>,

        /// Field to compute (distance, time, pace)
        #[arg(long)]
        target: Field,
    },

    /// Performance Index for a race result
    Index {
        /// Race distance in the selected unit
        #[arg(short, long)]
        distance: String,

        /// Race time (M:SS or H:MM:SS)
        #[arg(short, long)]
        time: String,
    },

    /// Predict race times across standard distances
    Predict {
        #[command(flatten)]
        performance: PerformanceArgs,

        /// Output format (table, json, csv)
        #[arg(short = 'f', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Training pace ranges per zone
    Paces {
        #[command(flatten)]
        performance: PerformanceArgs,

        /// Output format (table, json, csv)
        #[arg(short = 'f', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show how a typed digit stream is split into segments
    Digits {
        /// Digits as typed, e.g. 12530
        raw: String,

        /// Segment budget: 2 for pace, 3 for time, 4 for time with tenths
        #[arg(short, long, default_value_t = 3)]
        segments: usize,
    },

    /// Replay calculator actions, one per line, from a script or stdin
    Session {
        /// Script file (reads stdin when omitted)
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Starting mode (manual, auto)
        #[arg(short, long)]
        mode: Option<CalculatorMode>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref());
    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    let units = cli.units.unwrap_or(config.settings.unit_system);

    match cli.command {
        Commands::Calc {
            distance,
            time,
            pace,
            target,
        } => run_calc(units, distance, time, pace, target),

        Commands::Index { distance, time } => {
            let pi = measured_index(&distance, &time, units)?;
            println!("{} {:.1}", "Performance Index:".green().bold(), pi);
            Ok(())
        }

        Commands::Predict {
            performance,
            format,
        } => {
            let source = resolve_performance(&performance, units, &config)?;
            let unit = units.distance_unit();
            let predictions = predict_races_with(source.value(), unit, config.model.max_iterations);
            print_source_header(&source, format);
            println!("{}", export::render(&export::race_rows(&predictions, unit), format)?);
            Ok(())
        }

        Commands::Paces {
            performance,
            format,
        } => {
            let source = resolve_performance(&performance, units, &config)?;
            let unit = units.distance_unit();
            let ranges = training_paces(source.value());
            print_source_header(&source, format);
            println!("{}", export::render(&export::pace_rows(&ranges, unit), format)?);
            Ok(())
        }

        Commands::Digits { raw, segments } => {
            let grouped = format_digits_as_time(&raw, segments);
            println!("{}", grouped);
            match normalize_digits(&raw, segments) {
                Some(normalized) if normalized != grouped => {
                    println!("  {} {}", "=".dimmed(), normalized)
                }
                Some(_) => {}
                None => println!("  {}", "not a complete duration yet".yellow()),
            }
            Ok(())
        }

        Commands::Session { script, mode } => {
            let mode = mode.unwrap_or(config.settings.mode);
            run_session(script, mode, units)
        }
    }
}

fn run_calc(
    units: UnitSystem,
    distance: Option<String>,
    time: Option<String>,
    pace: Option<String>,
    target: Field,
) -> Result<()> {
    let mut calculator = Calculator::new(CalculatorMode::Manual, units);
    for (field, value) in [
        (Field::Distance, distance),
        (Field::Time, time),
        (Field::Pace, pace),
    ] {
        if let Some(value) = value {
            calculator.dispatch(Action::UpdateField(field, value));
        }
    }

    calculator.dispatch(Action::Calculate(target));
    if let Some(error) = calculator.error() {
        bail!("Calculation failed: {}", error);
    }

    let unit = units.distance_unit().abbreviation();
    let inputs = calculator.inputs();
    println!("{}", format!("{} computed", target).green().bold());
    println!("  Distance: {} {}", inputs.distance, unit);
    println!("  Time:     {}", inputs.time);
    println!("  Pace:     {}/{}", inputs.pace, unit);
    if let Some(pi) = calculator.performance_index() {
        println!("  PI:       {:.1}", pi);
    }
    Ok(())
}

fn resolve_performance(
    args: &PerformanceArgs,
    units: UnitSystem,
    config: &AppConfig,
) -> Result<PerformanceSource> {
    let measured = match (&args.distance, &args.time) {
        (Some(distance), Some(time)) => Some(measured_index(distance, time, units)?),
        (None, None) => None,
        _ => bail!("--distance and --time must be given together"),
    };

    PerformanceSource::resolve(measured, args.pi)
        .or_else(|| PerformanceSource::resolve(None, config.settings.performance_index_override))
        .ok_or_else(|| anyhow!("Provide --distance and --time, or --pi"))
}

fn measured_index(distance: &str, time: &str, units: UnitSystem) -> Result<f64> {
    let distance_value = parse_distance(distance).map_err(|e| report(e.into()))?;
    let minutes = parse_duration(time).map_err(|e| report(e.into()))?;
    performance_index(to_meters(distance_value, units.distance_unit()), minutes)
        .ok_or_else(|| anyhow!("Could not compute a Performance Index from {} in {}", distance, time))
}

fn report(err: PaceCalcError) -> anyhow::Error {
    match err.severity() {
        ErrorSeverity::Error => tracing::error!(error = %err, "Command failed"),
        ErrorSeverity::Warning => tracing::warn!(error = %err, "Rejected input"),
    }
    anyhow!(err.user_message())
}

fn print_source_header(source: &PerformanceSource, format: OutputFormat) {
    if format != OutputFormat::Table {
        return;
    }
    let label = match source {
        PerformanceSource::Measured(_) => "measured",
        PerformanceSource::Override(_) => "override",
    };
    println!(
        "{} {:.1} ({})",
        "Performance Index:".cyan().bold(),
        source.value(),
        label
    );
}

fn run_session(script: Option<PathBuf>, mode: CalculatorMode, units: UnitSystem) -> Result<()> {
    let reader: Box<dyn BufRead> = match &script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open script: {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut calculator = Calculator::new(mode, units);
    calculator.on_performance_index_change(|pi| match pi {
        Some(pi) => println!("  {} {:.1}", "PI ->".cyan(), pi),
        None => println!("  {} none", "PI ->".cyan()),
    });

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read script line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match trimmed.parse::<Action>() {
            Ok(action) => {
                println!("{} {}", ">".dimmed(), trimmed);
                let state = calculator.dispatch(action);
                print_state(state);
            }
            Err(err) => {
                let err = PaceCalcError::InvalidArgument(err.to_string());
                eprintln!("{}", format!("line {}: {}", number + 1, err.user_message()).yellow());
            }
        }
    }

    Ok(())
}

fn print_state(state: &CalculatorState) {
    let show = |field: Field| {
        let value = state.inputs.get(field);
        let value = if value.is_empty() { "-" } else { value };
        if state.is_field_locked(field) {
            format!("{}={} [locked]", field, value).bold().to_string()
        } else {
            format!("{}={}", field, value)
        }
    };

    let mut line = format!(
        "  {}  {}  {}  ({})",
        show(Field::Distance),
        show(Field::Time),
        show(Field::Pace),
        state.mode
    );
    if let Some(error) = state.error {
        line.push_str(&format!("  {}", error.to_string().red()));
    }
    println!("{}", line);
}
