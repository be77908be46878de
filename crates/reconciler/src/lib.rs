//! Incremental tree reconciler.
//!
//! Element trees are diffed against the last committed fiber tree one unit of
//! work at a time, across host-granted slices, and the resulting mutations are
//! applied to a [`host::Host`] in one uninterruptible commit.

#[macro_use]
mod macros;

pub mod commit;
pub mod config;
pub mod element;
pub mod fiber;
mod properties;
pub mod props;
mod reconcile;
pub mod renderer;
pub mod runtime;
pub mod scheduler;
mod work;

pub use commit::CommitStats;
pub use config::RendererConfig;
pub use element::{Child, Component, Element, ElementType, build, text};
pub use fiber::{EffectTag, Fiber, FiberId, FiberTree};
pub use props::{PropValue, Props};
pub use renderer::{RenderStats, Renderer, SliceOutcome};
pub use runtime::{LoopSummary, RenderLoop, RenderRequest, drive};
pub use scheduler::{FrameBudget, FrameSlice, SliceProvider, UnitBudget, UnitSlice, WorkSlice};
