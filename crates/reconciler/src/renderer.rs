//! The renderer: double-buffered fiber trees plus the resumable work loop.

use crate::commit::{CommitStats, commit_root};
use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};
use crate::scheduler::{SliceProvider, UnitSlice, WorkSlice};
use crate::work::perform_unit_of_work;
use anyhow::Result;
use host::{Host, NodeKey};
use log::{debug, info, warn};

/// What a call to [`Renderer::work_slice`] achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Nothing to do: no render in flight.
    Idle,
    /// The slice ran out; the cursor is kept for the next one.
    Suspended,
    /// Traversal finished and the tree was committed.
    Committed(CommitStats),
}

/// Lifetime counters of a renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub renders: u64,
    pub units: u64,
    pub slices: u64,
    pub commits: u64,
    /// Work-in-progress trees discarded by a newer render or by an error.
    pub abandoned: u64,
    pub last_commit: Option<CommitStats>,
}

/// Renders element trees into a host, one unit of work at a time.
#[derive(Debug)]
pub struct Renderer<H> {
    host: H,
    fibers: FiberTree,
    current_root: Option<FiberId>,
    wip_root: Option<FiberId>,
    next_unit_of_work: Option<FiberId>,
    deletions: Vec<FiberId>,
    stats: RenderStats,
    /// Units and slices spent on the in-flight render.
    pending_units: usize,
    pending_slices: usize,
}

impl<H: Host> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            fibers: FiberTree::new(),
            current_root: None,
            wip_root: None,
            next_unit_of_work: None,
            deletions: Vec::new(),
            stats: RenderStats::default(),
            pending_units: 0,
            pending_slices: 0,
        }
    }

    /// Request that `element` be rendered into `container`.
    ///
    /// Any in-flight work is discarded; the new tree is diffed against the
    /// last committed one. No host work happens until slices are run.
    pub fn render(&mut self, element: Element, container: NodeKey) {
        if self.wip_root.is_some() {
            info!("render: discarding in-flight work for a newer request");
            self.abandon_work_in_progress();
        }
        let root = self.fibers.insert(Fiber::root(container, element, self.current_root));
        self.wip_root = Some(root);
        self.next_unit_of_work = Some(root);
        self.deletions.clear();
        self.pending_units = 0;
        self.pending_slices = 0;
        self.stats.renders += 1;
    }

    /// Perform units of work until `slice` asks to yield or the traversal is
    /// exhausted, committing in the latter case. At least one unit runs per
    /// slice while work remains.
    ///
    /// # Errors
    /// A host or arena failure abandons the work-in-progress tree, leaves the
    /// committed tree untouched and is returned.
    pub fn work_slice<S: WorkSlice + ?Sized>(&mut self, slice: &mut S) -> Result<SliceOutcome> {
        let Some(root) = self.wip_root else {
            return Ok(SliceOutcome::Idle);
        };
        self.stats.slices += 1;
        self.pending_slices += 1;

        while let Some(fiber) = self.next_unit_of_work {
            match perform_unit_of_work(&mut self.fibers, &mut self.host, fiber, root, &mut self.deletions) {
                Ok(next) => self.next_unit_of_work = next,
                Err(err) => {
                    warn!("render: unit of work failed, discarding work in progress: {err:#}");
                    self.abandon_work_in_progress();
                    return Err(err);
                }
            }
            self.stats.units += 1;
            self.pending_units += 1;
            slice.unit_completed();

            if self.next_unit_of_work.is_some() && slice.should_yield() {
                debug!(
                    "render: yielding after {} units ({:?} left in slice)",
                    self.pending_units,
                    slice.time_remaining()
                );
                return Ok(SliceOutcome::Suspended);
            }
        }

        let mut stats = match commit_root(&self.fibers, &mut self.host, root, &self.deletions) {
            Ok(stats) => stats,
            Err(err) => {
                warn!("render: commit failed, discarding work in progress: {err:#}");
                self.abandon_work_in_progress();
                return Err(err);
            }
        };
        stats.units = self.pending_units;
        stats.slices = self.pending_slices;
        self.finish_commit(root)?;
        self.stats.commits += 1;
        self.stats.last_commit = Some(stats);
        Ok(SliceOutcome::Committed(stats))
    }

    /// Keep requesting slices until the in-flight render commits.
    ///
    /// Returns `None` when nothing was in flight.
    ///
    /// # Errors
    /// Propagates the first failure from [`Renderer::work_slice`].
    pub fn run_to_completion<P: SliceProvider + ?Sized>(&mut self, provider: &mut P) -> Result<Option<CommitStats>> {
        loop {
            let mut slice = provider.request_slice();
            match self.work_slice(&mut slice)? {
                SliceOutcome::Committed(stats) => return Ok(Some(stats)),
                SliceOutcome::Idle => return Ok(None),
                SliceOutcome::Suspended => {}
            }
        }
    }

    /// Finish any in-flight render in a single unbounded slice.
    ///
    /// # Errors
    /// Propagates the failure from [`Renderer::work_slice`].
    pub fn flush(&mut self) -> Result<Option<CommitStats>> {
        match self.work_slice(&mut UnitSlice::unbounded())? {
            SliceOutcome::Committed(stats) => Ok(Some(stats)),
            SliceOutcome::Idle | SliceOutcome::Suspended => Ok(None),
        }
    }

    /// True when no render is in flight.
    #[inline]
    pub const fn is_idle(&self) -> bool {
        self.wip_root.is_none()
    }

    /// Root of the last committed tree.
    #[inline]
    pub const fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the tree being built, if any.
    #[inline]
    pub const fn work_in_progress(&self) -> Option<FiberId> {
        self.wip_root
    }

    #[inline]
    pub const fn fibers(&self) -> &FiberTree {
        &self.fibers
    }

    #[inline]
    pub const fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    #[inline]
    pub const fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Promote the committed tree to `current` and release the previous one.
    fn finish_commit(&mut self, root: FiberId) -> Result<()> {
        let committed: Vec<FiberId> = self.fibers.descendants(root).collect();
        for id in committed {
            self.fibers.get_mut(id)?.alternate = None;
        }
        if let Some(previous) = self.current_root.replace(root) {
            self.fibers.release(previous);
        }
        self.wip_root = None;
        self.next_unit_of_work = None;
        self.deletions.clear();
        debug!("render: committed tree now holds {} live fibers", self.fibers.live_count());
        Ok(())
    }

    fn abandon_work_in_progress(&mut self) {
        if let Some(root) = self.wip_root.take() {
            self.fibers.release(root);
            self.stats.abandoned += 1;
        }
        for id in self.deletions.drain(..) {
            if let Ok(fiber) = self.fibers.get_mut(id) {
                fiber.effect_tag = EffectTag::None;
            }
        }
        self.next_unit_of_work = None;
    }
}
