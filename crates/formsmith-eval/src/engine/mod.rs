//! Formsmith derived-field engine
//!
//! Builds the dependency graph among fields and recomputes derived values
//! when an upstream value changes.

pub mod graph;
pub mod recompute;
mod scheduler;

#[cfg(test)]
mod tests;

pub use graph::{DependencyGraph, GraphError};
pub use recompute::{Recomputation, ValuesMap, initial_values, recompute, recompute_with_config};

use chrono::{DateTime, Datelike, Utc};

use crate::timezone::TimeZoneSpec;

/// Pins the clock seen by formulas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeterministicMode {
    /// Formulas read the host clock in the configured timezone.
    #[default]
    Disabled,
    /// Formulas see `timestamp_utc` as "now", rendered in `timezone`.
    Enabled {
        timestamp_utc: DateTime<Utc>,
        timezone: TimeZoneSpec,
    },
}

/// Configuration for formula evaluation
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub deterministic_mode: DeterministicMode,
    /// Timezone of the host clock when deterministic mode is disabled.
    pub timezone: TimeZoneSpec,
    /// Formulas longer than this many characters are rejected.
    pub max_formula_len: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            deterministic_mode: DeterministicMode::Disabled,
            timezone: TimeZoneSpec::default(),
            max_formula_len: 4096,
        }
    }
}

impl EvalConfig {
    /// A config whose clock is frozen at `timestamp_utc` (UTC).
    pub fn deterministic(timestamp_utc: DateTime<Utc>) -> Self {
        Self {
            deterministic_mode: DeterministicMode::Enabled {
                timestamp_utc,
                timezone: TimeZoneSpec::Utc,
            },
            ..Default::default()
        }
    }

    /// Current year according to the configured clock.
    ///
    /// `None` when deterministic mode is off and the crate was built without
    /// `system-clock`.
    pub fn current_year(&self) -> Option<i32> {
        match &self.deterministic_mode {
            DeterministicMode::Enabled {
                timestamp_utc,
                timezone,
            } => Some(timezone.localize(*timestamp_utc).year()),
            DeterministicMode::Disabled => self.host_year(),
        }
    }

    #[cfg(feature = "system-clock")]
    fn host_year(&self) -> Option<i32> {
        Some(self.timezone.now().year())
    }

    #[cfg(not(feature = "system-clock"))]
    fn host_year(&self) -> Option<i32> {
        None
    }
}
