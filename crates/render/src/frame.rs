use std::collections::VecDeque;

use crate::renderer::{FrameStats, GridRenderer};
use crate::surface::Surface;

/// Handle for one pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Host-provided source of frame callbacks, shaped like
/// `requestAnimationFrame` / `cancelAnimationFrame`.
pub trait FrameClock {
    /// Ask for one callback. `None` means the host refused.
    fn request_frame(&mut self) -> Option<FrameRequest>;

    /// Withdraw a request. Unknown or already-fired requests are ignored.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Drives a [`GridRenderer`] one frame per clock callback.
///
/// # Invariants
/// - At most one request from this loop is outstanding on the clock.
/// - No request is outstanding while the loop is stopped.
/// - A refused request leaves the loop stopped.
#[derive(Debug)]
pub struct AnimationLoop {
    renderer: GridRenderer,
    pending: Option<FrameRequest>,
    running: bool,
    frames_rendered: u64,
}

impl AnimationLoop {
    pub fn new(renderer: GridRenderer) -> Self {
        Self {
            renderer,
            pending: None,
            running: false,
            frames_rendered: 0,
        }
    }

    pub fn renderer(&self) -> &GridRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut GridRenderer {
        &mut self.renderer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Request the first frame. Returns `false` if already running, or if
    /// the clock refused the request; the loop then stays stopped and a
    /// later `start` retries.
    pub fn start<C: FrameClock + ?Sized>(&mut self, clock: &mut C) -> bool {
        if self.running {
            return false;
        }
        let Some(request) = clock.request_frame() else {
            tracing::warn!("frame clock refused the first frame request");
            return false;
        };
        self.running = true;
        self.pending = Some(request);
        tracing::debug!("animation loop started");
        true
    }

    /// Cancel the pending frame. Returns `false` if already stopped.
    pub fn stop<C: FrameClock + ?Sized>(&mut self, clock: &mut C) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        if let Some(request) = self.pending.take() {
            clock.cancel_frame(request);
        }
        tracing::debug!(frames = self.frames_rendered, "animation loop stopped");
        true
    }

    /// Handle a fired callback: render, then request the next frame.
    ///
    /// Requests that are not the one this loop is waiting for are ignored.
    pub fn on_frame<C, S>(
        &mut self,
        request: FrameRequest,
        clock: &mut C,
        surface: &mut S,
    ) -> Option<FrameStats>
    where
        C: FrameClock + ?Sized,
        S: Surface + ?Sized,
    {
        if !self.running || self.pending != Some(request) {
            tracing::trace!(?request, "ignoring stale frame request");
            return None;
        }
        self.pending = None;
        let stats = self.renderer.render_frame(surface);
        self.frames_rendered += 1;
        self.pending = clock.request_frame();
        if self.pending.is_none() {
            tracing::warn!("frame clock refused the next frame request, stopping");
            self.running = false;
        }
        Some(stats)
    }
}

/// Deterministic [`FrameClock`] that only fires when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    next_id: u64,
    queue: VecDeque<FrameRequest>,
    refusing: bool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent requests fail, as a host that has gone away would.
    pub fn set_refusing(&mut self, refusing: bool) {
        self.refusing = refusing;
    }

    /// Pop the oldest outstanding request.
    pub fn fire(&mut self) -> Option<FrameRequest> {
        self.queue.pop_front()
    }

    pub fn outstanding(&self) -> usize {
        self.queue.len()
    }

    /// Fire and deliver up to `frames` callbacks to `anim`, returning the
    /// stats of the last frame rendered.
    pub fn run<S: Surface + ?Sized>(
        &mut self,
        anim: &mut AnimationLoop,
        surface: &mut S,
        frames: usize,
    ) -> Option<FrameStats> {
        let mut last = None;
        for _ in 0..frames {
            let Some(request) = self.fire() else { break };
            if let Some(stats) = anim.on_frame(request, self, surface) {
                last = Some(stats);
            }
        }
        last
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        if self.refusing {
            return None;
        }
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.queue.push_back(request);
        Some(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.queue.retain(|r| *r != request);
    }
}
