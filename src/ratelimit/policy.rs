//! Window policies for the rate limiting dimensions.
//!
//! A policy pairs a maximum admitted count with the trailing window it is
//! counted over. Policies are loaded from configuration using the same
//! `requests_per_unit` / `unit` shape as Envoy rate limit rules.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time unit for a window policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Get the duration of one unit.
    pub fn duration(&self) -> Duration {
        match self {
            TimeUnit::Second => Duration::from_secs(1),
            TimeUnit::Minute => Duration::from_secs(60),
            TimeUnit::Hour => Duration::from_secs(3600),
            TimeUnit::Day => Duration::from_secs(86400),
        }
    }
}

/// Maximum admitted requests within a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    /// Number of requests admitted per unit of time
    pub requests_per_unit: usize,
    /// The window length
    pub unit: TimeUnit,
    /// Optional name/description for this policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl WindowPolicy {
    /// Create an unnamed policy.
    pub fn new(requests_per_unit: usize, unit: TimeUnit) -> Self {
        Self {
            requests_per_unit,
            unit,
            name: None,
        }
    }

    /// Attach a descriptive name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Policy for the per-IP dimension: 100 requests per minute.
    pub fn global_default() -> Self {
        Self::new(100, TimeUnit::Minute).named("global")
    }

    /// Policy for the per-user write path: 10 prompt creations per hour.
    pub fn write_path_default() -> Self {
        Self::new(10, TimeUnit::Hour).named("write_path")
    }

    /// The trailing window requests are counted over.
    pub fn window(&self) -> Duration {
        self.unit.duration()
    }

    /// The maximum number of admissions inside one window.
    pub fn limit(&self) -> usize {
        self.requests_per_unit
    }
}
