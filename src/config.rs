use std::path::PathBuf;

use crate::macro_split::MacroSettings;

pub const DEFAULT_DB_PATH: &str = "phase-coach.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Carb ceiling must stay above the carb floor (0.3 g/lb)
const CARBS_MAX_RANGE: (f64, f64) = (0.3, 10.0);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
  #[error("{key} is not a number: {value}")]
  NotANumber { key: &'static str, value: String },

  #[error("{key} must be in ({min}, {max}], got {value}")]
  OutOfRange {
    key: &'static str,
    value: f64,
    min: f64,
    max: f64,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  pub db_path: PathBuf,
  /// `tracing_subscriber::EnvFilter` directive
  pub log_filter: String,
  pub macros: MacroSettings,
}

impl Config {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_env_with(|k| std::env::var(k).ok())
  }

  /// Read configuration through `get` so tests can supply values without
  /// touching the process environment.
  pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigError>
  where
    F: FnMut(&str) -> Option<String>,
  {
    let db_path = get("PHASE_COACH_DB")
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_DB_PATH.into());
    let log_filter = get("PHASE_COACH_LOG")
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

    let mut macros = MacroSettings::default();
    if let Some(raw) = get("PHASE_COACH_CARBS_MAX_PER_LB") {
      macros.carbs_max_per_lb = parse_carbs_max(&raw)?;
    }

    Ok(Self {
      db_path: PathBuf::from(db_path),
      log_filter,
      macros,
    })
  }
}

fn parse_carbs_max(raw: &str) -> Result<f64, ConfigError> {
  let key = "PHASE_COACH_CARBS_MAX_PER_LB";
  let value: f64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
    key,
    value: raw.to_string(),
  })?;

  let (min, max) = CARBS_MAX_RANGE;
  if !(value > min && value <= max) {
    return Err(ConfigError::OutOfRange { key, value, min, max });
  }
  Ok(value)
}
