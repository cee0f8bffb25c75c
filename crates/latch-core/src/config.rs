//! Config - 環境変数からの設定
//!
//! | 変数                | 既定値             |
//! |---------------------|--------------------|
//! | `LATCH_EVENTS_PATH` | `firestore-events` |
//! | `LATCH_TIMEOUT_MS`  | `1000`             |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::timeout::DEFAULT_TIMEOUT_MS;
use crate::domain::errors::LatchError;

/// Collection that receives dedup tokens unless a trigger overrides it.
pub const DEFAULT_EVENTS_PATH: &str = "firestore-events";

pub const EVENTS_PATH_VAR: &str = "LATCH_EVENTS_PATH";
pub const TIMEOUT_MS_VAR: &str = "LATCH_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatchConfig {
    pub events_path: String,
    /// `0` falls back to the default, like [`with_timeout`](crate::app::with_timeout).
    pub timeout_ms: u64,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            events_path: DEFAULT_EVENTS_PATH.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl LatchConfig {
    /// Reads the process environment. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, LatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(EVENTS_PATH_VAR) {
            if path.trim().is_empty() {
                return Err(LatchError::Config(format!("{EVENTS_PATH_VAR} must not be empty")));
            }
            config.events_path = path;
        }

        if let Some(raw) = lookup(TIMEOUT_MS_VAR) {
            config.timeout_ms = raw.trim().parse().map_err(|e| {
                LatchError::Config(format!("{TIMEOUT_MS_VAR} must be a number of milliseconds: {e}"))
            })?;
        }

        Ok(config)
    }

    /// The limit actually applied, after the zero fallback.
    pub fn effective_timeout_ms(&self) -> u64 {
        if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout_ms
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.effective_timeout_ms())
    }
}
