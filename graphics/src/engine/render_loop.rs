//! Render loop driver and frame diagnostics.

use std::mem;
use std::time::{Duration, Instant};

use super::Engine;
use crate::error::GraphicsResult;
use crate::profiling::{frame_mark, profile_function, profile_plot};

/// A callback run once per tick.
pub type RenderLoopCallback = Box<dyn FnMut(&mut Engine)>;

/// Identifies a callback registered with [`Engine::run_render_loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderLoopId(u64);

/// Registered callbacks, plus the stops requested while they run.
#[derive(Default)]
pub(super) struct RenderLoop {
    callbacks: Vec<(RenderLoopId, RenderLoopCallback)>,
    next_id: u64,
    running: bool,
    pending_stops: Vec<RenderLoopId>,
    stop_below: Option<u64>,
}

impl RenderLoop {
    fn add(&mut self, callback: RenderLoopCallback) -> RenderLoopId {
        let id = RenderLoopId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    fn stop(&mut self, id: Option<RenderLoopId>) {
        match (id, self.running) {
            (Some(id), false) => self.callbacks.retain(|(other, _)| *other != id),
            (None, false) => self.callbacks.clear(),
            // Callbacks taken out for the running tick are not in `callbacks`.
            (Some(id), true) => {
                self.callbacks.retain(|(other, _)| *other != id);
                self.pending_stops.push(id);
            }
            (None, true) => {
                self.callbacks.clear();
                self.stop_below = Some(self.next_id);
            }
        }
    }

    /// Put the callbacks of a finished tick back in front of the ones
    /// registered during it, dropping those stopped meanwhile.
    fn restore(&mut self, mut ran: Vec<(RenderLoopId, RenderLoopCallback)>) {
        ran.append(&mut self.callbacks);
        let stops = mem::take(&mut self.pending_stops);
        let below = self.stop_below.take();
        ran.retain(|(id, _)| !stops.contains(id) && below.map_or(true, |b| id.0 >= b));
        self.callbacks = ran;
        self.running = false;
    }

    fn len(&self) -> usize {
        self.callbacks.len()
    }
}

impl Engine {
    /// Register a callback run once per [`Engine::tick`], after the ones
    /// already registered.
    pub fn run_render_loop(&mut self, callback: impl FnMut(&mut Engine) + 'static) -> RenderLoopId {
        self.render_loop.add(Box::new(callback))
    }

    /// Remove one callback, or all of them with `None`.
    ///
    /// Inside a tick the removal applies from the next tick on.
    pub fn stop_render_loop(&mut self, id: Option<RenderLoopId>) {
        self.render_loop.stop(id);
    }

    /// Number of registered callbacks.
    pub fn render_loop_count(&self) -> usize {
        self.render_loop.len()
    }

    /// Run one frame: measure, run every callback in registration order,
    /// end the frame.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ContextLost`](crate::GraphicsError::ContextLost)
    /// without running anything when the context is lost.
    pub fn tick(&mut self, now: Instant) -> GraphicsResult<()> {
        profile_function!();
        self.ensure_context()?;
        self.begin_frame(now);

        let mut callbacks = mem::take(&mut self.render_loop.callbacks);
        self.render_loop.running = true;
        for (_, callback) in callbacks.iter_mut() {
            callback(self);
        }
        self.render_loop.restore(callbacks);

        self.end_frame();
        Ok(())
    }

    /// Start a frame at `now`.
    pub fn begin_frame(&mut self, now: Instant) {
        self.fps.measure(now);
    }

    /// Close the current frame.
    pub fn end_frame(&mut self) {
        self.draw_calls.roll();
        profile_plot!("draw calls", self.draw_calls.last_frame());
        if !self.options.prevent_cache_wipe_between_frames {
            self.wipe_caches(false);
        }
        self.frame_id += 1;
        frame_mark!();
    }

    /// Frames per second over the last `fps_range` frames.
    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    /// Duration of the last frame.
    pub fn delta_time(&self) -> Duration {
        self.fps.delta_time()
    }

    /// Draw calls issued in the current frame.
    pub fn draw_calls(&self) -> usize {
        self.draw_calls.current()
    }

    pub fn last_frame_draw_calls(&self) -> usize {
        self.draw_calls.last_frame()
    }

    pub fn total_draw_calls(&self) -> usize {
        self.draw_calls.total()
    }

    /// Average draw calls per completed frame.
    pub fn average_draw_calls(&self) -> f64 {
        self.draw_calls.average()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> RenderLoopCallback {
        Box::new(|_| {})
    }

    #[test]
    fn test_stop_outside_tick() {
        let mut render_loop = RenderLoop::default();
        let first = render_loop.add(noop());
        render_loop.add(noop());
        render_loop.stop(Some(first));
        assert_eq!(render_loop.len(), 1);
        render_loop.stop(None);
        assert_eq!(render_loop.len(), 0);
    }

    #[test]
    fn test_stop_during_tick_applies_on_restore() {
        let mut render_loop = RenderLoop::default();
        let first = render_loop.add(noop());
        let second = render_loop.add(noop());

        let ran = mem::take(&mut render_loop.callbacks);
        render_loop.running = true;
        render_loop.stop(Some(first));
        let added = render_loop.add(noop());
        render_loop.restore(ran);

        let ids: Vec<RenderLoopId> = render_loop.callbacks.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![second, added]);
    }

    #[test]
    fn test_stop_all_during_tick_keeps_later_registrations() {
        let mut render_loop = RenderLoop::default();
        render_loop.add(noop());

        let ran = mem::take(&mut render_loop.callbacks);
        render_loop.running = true;
        render_loop.stop(None);
        let added = render_loop.add(noop());
        render_loop.restore(ran);

        let ids: Vec<RenderLoopId> = render_loop.callbacks.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![added]);
    }
}
