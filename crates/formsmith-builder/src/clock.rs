use chrono::{DateTime, Utc};
use formsmith_eval::{DeterministicMode, EvalConfig};

use crate::BuilderError;

/// "Now" for ids and `createdAt`, from the same clock formulas use.
pub(crate) fn now(config: &EvalConfig) -> Result<DateTime<Utc>, BuilderError> {
    match &config.deterministic_mode {
        DeterministicMode::Enabled { timestamp_utc, .. } => Ok(*timestamp_utc),
        DeterministicMode::Disabled => host_now(),
    }
}

#[cfg(feature = "system-clock")]
fn host_now() -> Result<DateTime<Utc>, BuilderError> {
    Ok(Utc::now())
}

#[cfg(not(feature = "system-clock"))]
fn host_now() -> Result<DateTime<Utc>, BuilderError> {
    Err(BuilderError::NoClock)
}

/// Millisecond timestamp id, bumped until `taken` rejects it.
pub(crate) fn unique_id(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let id = millis.to_string();
        if !taken(&id) {
            return id;
        }
        millis += 1;
    }
}
