//! Configuration options for the TALE engine.
//!
//! All option structs implement `Default` and serde `Deserialize`, so a host
//! can load them from JSON. Durations are written as milliseconds.
//!
//! ```
//! use tale_core::api::EngineOptions;
//!
//! let options: EngineOptions =
//!     serde_json::from_str(r#"{"execution": {"timeout": 500, "random_seed": 7}}"#).unwrap();
//! assert_eq!(options.execution.timeout.as_millis(), 500);
//! assert_eq!(options.structure.max_nesting, 64);
//! ```

use crate::sandbox::FileAccess;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Options for the Block Structure Builder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StructureOptions {
    /// Deepest block nesting accepted.
    ///
    /// Default: 64
    pub max_nesting: usize,
}

impl Default for StructureOptions {
    fn default() -> Self {
        Self { max_nesting: 64 }
    }
}

/// Where `datetime` reads the current time from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clock {
    #[default]
    System,
    /// Always report this local time.
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(time) => *time,
        }
    }
}

/// Resource limits and runtime behavior for one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Wall-clock limit for the whole run.
    ///
    /// Default: 2 seconds
    #[serde(deserialize_with = "duration_ms")]
    pub timeout: Duration,

    /// Deepest chain of user function calls.
    ///
    /// Default: 200
    pub max_call_depth: usize,

    /// Most bytes of output kept.
    ///
    /// Default: 1 MiB
    pub max_output_bytes: usize,

    /// Largest list, string or file a single operation may produce.
    ///
    /// Default: 1,000,000
    pub max_collection_len: usize,

    /// Seed for the `random` module. `None` seeds from the clock.
    pub random_seed: Option<u64>,

    pub clock: Clock,

    pub file_access: FileAccess,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            max_call_depth: 200,
            max_output_bytes: 1 << 20,
            max_collection_len: 1_000_000,
            random_seed: None,
            clock: Clock::System,
            file_access: FileAccess::default(),
        }
    }
}

/// Configuration options for the TALE engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub structure: StructureOptions,
    pub execution: ExecutionOptions,
}

fn duration_ms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
