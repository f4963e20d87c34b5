//! Core rate limiter implementation.

use std::time::Instant;
use tracing::{debug, trace};

use crate::config::RateLimitingConfig;

use super::dimension::Dimension;
use super::policy::WindowPolicy;
use super::window::{SlidingWindowCounter, SweepStats};

/// The rate limiter shared by the admission gates and the janitor.
///
/// Holds one sliding-window counter per dimension. This struct is thread-safe
/// and is meant to be constructed once and shared behind an `Arc`.
pub struct RateLimiter {
    /// Per client IP
    global: SlidingWindowCounter,
    /// Per authenticated user, content creation only
    write_path: SlidingWindowCounter,
}

/// Outcome of one janitor pass over every dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub global: SweepStats,
    pub write_path: SweepStats,
}

impl SweepReport {
    /// Total keys evicted across dimensions.
    pub fn evicted(&self) -> usize {
        self.global.evicted + self.write_path.evicted
    }
}

impl RateLimiter {
    /// Create a rate limiter with the default policies.
    pub fn new() -> Self {
        Self::with_policies(
            WindowPolicy::global_default(),
            WindowPolicy::write_path_default(),
        )
    }

    /// Create a rate limiter from configuration.
    pub fn from_config(config: &RateLimitingConfig) -> Self {
        Self::with_policies(config.global.clone(), config.write_path.clone())
    }

    /// Create a rate limiter with explicit per-dimension policies.
    pub fn with_policies(global: WindowPolicy, write_path: WindowPolicy) -> Self {
        debug!(
            global_limit = global.limit(),
            global_window = ?global.window(),
            write_path_limit = write_path.limit(),
            write_path_window = ?write_path.window(),
            "Creating rate limiter"
        );
        Self {
            global: SlidingWindowCounter::new(global),
            write_path: SlidingWindowCounter::new(write_path),
        }
    }

    /// The counter backing a dimension.
    pub fn counter(&self, dimension: Dimension) -> &SlidingWindowCounter {
        match dimension {
            Dimension::Global => &self.global,
            Dimension::WritePath => &self.write_path,
        }
    }

    /// Decide admission for `key` in `dimension` at the current instant.
    pub fn try_admit(&self, dimension: Dimension, key: &str) -> bool {
        self.try_admit_at(dimension, key, Instant::now())
    }

    /// Decide admission for `key` in `dimension` at `now`.
    pub fn try_admit_at(&self, dimension: Dimension, key: &str, now: Instant) -> bool {
        let admitted = self.counter(dimension).try_admit_at(key, now);

        trace!(
            dimension = %dimension,
            key = %key,
            admitted,
            "Checked rate limit"
        );

        if !admitted {
            debug!(dimension = %dimension, key = %key, "Rate limit exceeded");
        }

        admitted
    }

    /// Prune every dimension as of `now`, dropping keys with no live requests.
    pub fn sweep_at(&self, now: Instant) -> SweepReport {
        SweepReport {
            global: self.global.sweep_at(now),
            write_path: self.write_path.sweep_at(now),
        }
    }

    /// Sweep at the current instant.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now())
    }

    /// Number of keys tracked in a dimension.
    pub fn tracked_keys(&self, dimension: Dimension) -> usize {
        self.counter(dimension).tracked_keys()
    }

    /// Clear all counters.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.global.clear();
        self.write_path.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
