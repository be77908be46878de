//! Work slices: how long the renderer may keep performing units of work
//! before it has to hand control back to the host.

use crate::config::RendererConfig;
use core::time::Duration;
use std::time::Instant;

/// A single budget slice granted by the host.
pub trait WorkSlice {
    /// True once the renderer must stop and wait for the next slice.
    fn should_yield(&self) -> bool;

    /// Called after every unit of work performed inside this slice.
    fn unit_completed(&mut self) {}

    /// Time left in this slice, if the slice is time-based.
    fn time_remaining(&self) -> Option<Duration> {
        None
    }
}

/// Source of successive slices; the host decides when each one starts.
pub trait SliceProvider {
    type Slice: WorkSlice;

    fn request_slice(&mut self) -> Self::Slice;
}

/// Wall-clock slice ending at a deadline, with an optional unit cap.
#[derive(Clone, Copy, Debug)]
pub struct FrameSlice {
    deadline: Instant,
    margin: Duration,
    max_units: Option<usize>,
    units: usize,
}

impl FrameSlice {
    #[must_use]
    pub fn starting_now(budget: Duration, margin: Duration, max_units: Option<usize>) -> Self {
        Self {
            deadline: Instant::now() + budget,
            margin,
            max_units,
            units: 0,
        }
    }
}

impl WorkSlice for FrameSlice {
    fn should_yield(&self) -> bool {
        if self.max_units.is_some_and(|max| self.units >= max) {
            return true;
        }
        self.time_remaining().is_some_and(|left| left < self.margin)
    }

    fn unit_completed(&mut self) {
        self.units = self.units.saturating_add(1);
    }

    fn time_remaining(&self) -> Option<Duration> {
        Some(self.deadline.saturating_duration_since(Instant::now()))
    }
}

/// Deterministic slice allowing a fixed number of units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSlice {
    remaining: usize,
}

impl UnitSlice {
    #[must_use]
    pub const fn new(units: usize) -> Self {
        Self { remaining: units }
    }

    /// A slice that never asks to yield.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }
}

impl WorkSlice for UnitSlice {
    fn should_yield(&self) -> bool {
        self.remaining == 0
    }

    fn unit_completed(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Hands out [`FrameSlice`]s of a configured length.
#[derive(Clone, Debug)]
pub struct FrameBudget {
    budget: Duration,
    margin: Duration,
    max_units: Option<usize>,
    granted: u64,
}

impl FrameBudget {
    #[inline]
    #[must_use]
    pub const fn new(budget: Duration, margin: Duration) -> Self {
        Self {
            budget,
            margin,
            max_units: None,
            granted: 0,
        }
    }

    #[must_use]
    pub const fn from_config(config: &RendererConfig) -> Self {
        Self {
            budget: config.frame_budget(),
            margin: config.yield_margin(),
            max_units: config.max_units_per_slice,
            granted: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Number of slices handed out so far.
    #[inline]
    #[must_use]
    pub const fn granted(&self) -> u64 {
        self.granted
    }
}

impl SliceProvider for FrameBudget {
    type Slice = FrameSlice;

    fn request_slice(&mut self) -> FrameSlice {
        self.granted = self.granted.saturating_add(1);
        FrameSlice::starting_now(self.budget, self.margin, self.max_units)
    }
}

/// Hands out [`UnitSlice`]s of a fixed size; at least one unit per slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitBudget {
    units: usize,
    granted: u64,
}

impl UnitBudget {
    #[must_use]
    pub const fn new(units: usize) -> Self {
        Self {
            units: if units == 0 { 1 } else { units },
            granted: 0,
        }
    }

    #[must_use]
    pub const fn granted(&self) -> u64 {
        self.granted
    }
}

impl SliceProvider for UnitBudget {
    type Slice = UnitSlice;

    fn request_slice(&mut self) -> UnitSlice {
        self.granted = self.granted.saturating_add(1);
        UnitSlice::new(self.units)
    }
}
