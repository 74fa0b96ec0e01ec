use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PaceCalcError;
use crate::logging::LogConfig;
use crate::models::{CalculatorMode, UnitSystem};
use crate::performance_index::DEFAULT_MAX_ITERATIONS;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Calculator defaults
    #[serde(default)]
    pub settings: CalculatorSettings,

    /// Numeric model settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Calculator defaults applied when a session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorSettings {
    /// Default units (metric/imperial)
    pub unit_system: UnitSystem,

    /// Whether new sessions auto-derive fields
    pub mode: CalculatorMode,

    /// Performance Index entered by hand, preferred over the measured one
    pub performance_index_override: Option<f64>,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        CalculatorSettings {
            unit_system: UnitSystem::Metric,
            mode: CalculatorMode::Manual,
            performance_index_override: None,
        }
    }
}

/// Performance Index model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Bisection budget for race time prediction
    pub max_iterations: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: CalculatorSettings::default(),
            model: ModelSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.model.max_iterations == 0 {
            return Err(PaceCalcError::Configuration(
                "model.max_iterations must be at least 1".to_string(),
            )
            .into());
        }
        if let Some(pi) = self.settings.performance_index_override {
            if !pi.is_finite() || pi <= 0.0 {
                return Err(PaceCalcError::Configuration(format!(
                    "settings.performance_index_override must be positive, got {}",
                    pi
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pacecalc")
            .join("config.toml")
    }

    /// Load configuration from `path` (or the default location), falling
    /// back to defaults when the file is missing or unreadable
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Using default configuration"
                );
                Self::default()
            }
        }
    }
}
