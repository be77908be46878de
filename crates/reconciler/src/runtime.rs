//! Driving a renderer from a tokio task.

use crate::commit::CommitStats;
use crate::element::Element;
use crate::renderer::{Renderer, SliceOutcome};
use crate::scheduler::SliceProvider;
use anyhow::Result;
use host::{Host, NodeKey};
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task;

/// Capacity of the request channel created by [`RenderLoop::new`].
pub const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// Run slices until the in-flight render commits, yielding to the runtime
/// between slices.
///
/// # Errors
/// Propagates the first failure from [`Renderer::work_slice`].
pub async fn drive<H: Host, P: SliceProvider>(
    renderer: &mut Renderer<H>,
    provider: &mut P,
) -> Result<Option<CommitStats>> {
    loop {
        let mut slice = provider.request_slice();
        match renderer.work_slice(&mut slice)? {
            SliceOutcome::Committed(stats) => return Ok(Some(stats)),
            SliceOutcome::Idle => return Ok(None),
            SliceOutcome::Suspended => task::yield_now().await,
        }
    }
}

/// A render request sent to a [`RenderLoop`].
#[derive(Clone, Debug)]
pub struct RenderRequest {
    pub element: Element,
    pub container: NodeKey,
}

/// What a [`RenderLoop`] did before its senders went away.
#[derive(Debug, Default)]
pub struct LoopSummary {
    pub commits: u64,
    pub failures: u64,
    pub last_commit: Option<CommitStats>,
    /// Most recent render failure, if any.
    pub last_error: Option<anyhow::Error>,
}

/// Owns a renderer and serves render requests from a channel.
pub struct RenderLoop<H, P> {
    renderer: Renderer<H>,
    provider: P,
    requests: mpsc::Receiver<RenderRequest>,
    summary: LoopSummary,
}

impl<H: Host, P: SliceProvider> RenderLoop<H, P> {
    /// Build the loop and the sender used to feed it.
    pub fn new(renderer: Renderer<H>, provider: P) -> (Self, mpsc::Sender<RenderRequest>) {
        let (sender, requests) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let this = Self {
            renderer,
            provider,
            requests,
            summary: LoopSummary::default(),
        };
        (this, sender)
    }

    /// Serve requests until every sender is dropped and no work remains.
    ///
    /// A request arriving while a render is in flight replaces it at the next
    /// slice boundary.
    ///
    /// A failed render is logged and counted. The renderer has already dropped
    /// the failed work and kept its committed tree, so the loop goes on serving.
    pub async fn run(mut self) -> (Renderer<H>, LoopSummary) {
        loop {
            if self.renderer.is_idle() {
                let Some(request) = self.requests.recv().await else {
                    debug!("render loop: all senders dropped, exiting");
                    return (self.renderer, self.summary);
                };
                self.renderer.render(request.element, request.container);
            }

            loop {
                match self.requests.try_recv() {
                    Ok(request) => self.renderer.render(request.element, request.container),
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                }
            }

            let mut slice = self.provider.request_slice();
            match self.renderer.work_slice(&mut slice) {
                Ok(SliceOutcome::Committed(stats)) => {
                    self.summary.commits += 1;
                    self.summary.last_commit = Some(stats);
                }
                Ok(SliceOutcome::Idle | SliceOutcome::Suspended) => {}
                Err(err) => {
                    warn!("render loop: render failed: {err:#}");
                    self.summary.failures += 1;
                    self.summary.last_error = Some(err);
                }
            }
            task::yield_now().await;
        }
    }
}
