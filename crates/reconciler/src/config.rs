//! Configuration settings for the renderer's work slices.
//!
//! Values can be loaded from environment variables or constructed
//! programmatically.

use core::time::Duration;
use std::env;

/// Runtime configuration for slice budgeting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Wall-clock length of one work slice in milliseconds
    pub frame_budget_ms: u64,
    /// A slice yields once less than this many milliseconds remain
    pub yield_margin_ms: u64,
    /// Optional cap on units of work per slice, independent of time
    pub max_units_per_slice: Option<usize>,
}

impl RendererConfig {
    /// Construct a new `RendererConfig` with explicit values.
    ///
    /// # Arguments
    ///
    /// * `frame_budget_ms` - Slice length in milliseconds (minimum 1ms)
    /// * `yield_margin_ms` - Remaining time below which a slice yields
    /// * `max_units_per_slice` - Optional unit cap; zero means no cap
    #[inline]
    #[must_use]
    pub const fn new(frame_budget_ms: u64, yield_margin_ms: u64, max_units_per_slice: Option<usize>) -> Self {
        let budget = if frame_budget_ms < 1 { 1 } else { frame_budget_ms };
        let max_units = match max_units_per_slice {
            Some(0) | None => None,
            Some(units) => Some(units),
        };
        Self {
            frame_budget_ms: budget,
            yield_margin_ms,
            max_units_per_slice: max_units,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `RECONCILER_FRAME_BUDGET_MS`: Slice length in milliseconds (default: 16)
    /// - `RECONCILER_YIELD_MARGIN_MS`: Yield margin in milliseconds (default: 1)
    /// - `RECONCILER_MAX_UNITS_PER_SLICE`: Unit cap per slice (default: none)
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let frame_budget_ms = env::var("RECONCILER_FRAME_BUDGET_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(16);
        let yield_margin_ms = env::var("RECONCILER_YIELD_MARGIN_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(1);
        let max_units_per_slice = env::var("RECONCILER_MAX_UNITS_PER_SLICE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok());
        Self::new(frame_budget_ms, yield_margin_ms, max_units_per_slice)
    }

    /// Get the slice length as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// Get the yield margin as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn yield_margin(&self) -> Duration {
        Duration::from_millis(self.yield_margin_ms)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new(16, 1, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_clamped_and_zero_cap_disabled() {
        let config = RendererConfig::new(0, 2, Some(0));
        assert_eq!(config.frame_budget(), Duration::from_millis(1));
        assert_eq!(config.yield_margin(), Duration::from_millis(2));
        assert_eq!(config.max_units_per_slice, None);
    }

    #[test]
    fn defaults_match_a_sixty_hertz_frame() {
        let config = RendererConfig::default();
        assert_eq!(config.frame_budget_ms, 16);
        assert_eq!(config.yield_margin_ms, 1);
    }
}
