//! Session configuration.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// Average driving speed assumption, shown as the simulated vehicle speed.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Upper bound for `per_stop_minutes`: one day.
pub const MAX_PER_STOP_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Period of the position simulator ticker.
    pub tick_interval_ms: u64,
    /// Nominal length of the simulation window the progress fraction spans.
    pub tick_window_secs: u64,
    /// Fixed time budget per pickup used by the ETA estimator.
    pub per_stop_minutes: u32,
    /// Base departure time the ETA is added to.
    #[serde(with = "hhmm")]
    pub departure_time: NaiveTime,
    pub nominal_speed_kmh: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2_000,
            tick_window_secs: 60,
            per_stop_minutes: 5,
            departure_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            nominal_speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl DispatchConfig {
    pub fn from_toml_str(input: &str) -> DispatchResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(DispatchError::Config("tick_interval_ms must be positive".into()));
        }
        if self.tick_window_secs == 0 {
            return Err(DispatchError::Config("tick_window_secs must be positive".into()));
        }
        if self.per_stop_minutes > MAX_PER_STOP_MINUTES {
            return Err(DispatchError::Config(format!(
                "per_stop_minutes must be at most {MAX_PER_STOP_MINUTES}"
            )));
        }
        if self.nominal_speed_kmh.is_nan() || self.nominal_speed_kmh <= 0.0 {
            return Err(DispatchError::Config("nominal_speed_kmh must be positive".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn tick_window(&self) -> Duration {
        Duration::from_secs(self.tick_window_secs)
    }
}

/// `HH:MM` clock times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
