//! Graphics instance.
//!
//! The [`GraphicsInstance`] is the application-level owner of the engines,
//! one per rendering surface. Code that needs an engine receives an
//! [`EngineId`] (or the engine itself) explicitly.
//!
//! # Example
//!
//! ```ignore
//! let mut instance = GraphicsInstance::new();
//! let id = instance.add_engine(Box::new(HeadlessContext::new()), EngineOptions::default())?;
//!
//! instance.engine_mut(id).unwrap().run_render_loop(|engine| {
//!     engine.clear(Some([0.0, 0.0, 0.0, 1.0]), true, true, false);
//! });
//! instance.tick_all(Instant::now());
//! ```

use std::time::Instant;

use slotmap::SlotMap;

use crate::config::EngineOptions;
use crate::context::GraphicsContext;
use crate::engine::Engine;
use crate::error::{GraphicsError, GraphicsResult};

slotmap::new_key_type! {
    /// Handle to an engine owned by a [`GraphicsInstance`].
    pub struct EngineId;
}

static_assertions::assert_impl_all!(EngineId: Copy, Send, Sync);

/// Owns the engines of an application.
#[derive(Debug, Default)]
pub struct GraphicsInstance {
    engines: SlotMap<EngineId, Engine>,
}

impl GraphicsInstance {
    /// Create an instance without engines.
    pub fn new() -> Self {
        log::info!("Creating GraphicsInstance");
        Self::default()
    }

    /// Create an engine over `context` and take ownership of it.
    ///
    /// # Errors
    ///
    /// Whatever [`Engine::new`] reports.
    pub fn add_engine(
        &mut self,
        context: Box<dyn GraphicsContext>,
        options: EngineOptions,
    ) -> GraphicsResult<EngineId> {
        let engine = Engine::new(context, options)?;
        let id = self.engines.insert(engine);
        log::debug!("GraphicsInstance: added engine {:?}", id);
        Ok(id)
    }

    pub fn engine(&self, id: EngineId) -> Option<&Engine> {
        self.engines.get(id)
    }

    pub fn engine_mut(&mut self, id: EngineId) -> Option<&mut Engine> {
        self.engines.get_mut(id)
    }

    /// Dispose an engine.
    pub fn remove_engine(&mut self, id: EngineId) -> GraphicsResult<()> {
        let engine = self
            .engines
            .remove(id)
            .ok_or(GraphicsError::InvalidHandle("engine"))?;
        engine.dispose();
        Ok(())
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Iterate over the engines.
    pub fn engines(&self) -> impl Iterator<Item = (EngineId, &Engine)> {
        self.engines.iter()
    }

    /// Tick every engine once.
    ///
    /// Engines whose context is lost are skipped; their ids are returned so
    /// the application can recreate them.
    pub fn tick_all(&mut self, now: Instant) -> Vec<EngineId> {
        let mut lost = Vec::new();
        for (id, engine) in self.engines.iter_mut() {
            match engine.tick(now) {
                Ok(()) => {}
                Err(err) => {
                    log::error!("GraphicsInstance: engine {:?} failed to tick: {}", id, err);
                    lost.push(id);
                }
            }
        }
        lost
    }
}

impl Drop for GraphicsInstance {
    fn drop(&mut self) {
        let ids: Vec<EngineId> = self.engines.keys().collect();
        for id in ids {
            if let Some(engine) = self.engines.remove(id) {
                engine.dispose();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HeadlessContext;

    #[test]
    fn test_add_and_remove_engines() {
        let mut instance = GraphicsInstance::new();
        let first = instance
            .add_engine(Box::new(HeadlessContext::new()), EngineOptions::default())
            .unwrap();
        let second = instance
            .add_engine(Box::new(HeadlessContext::new()), EngineOptions::default())
            .unwrap();
        assert_eq!(instance.engine_count(), 2);

        instance.remove_engine(first).unwrap();
        assert!(instance.engine(first).is_none());
        assert!(instance.engine(second).is_some());
        assert_eq!(
            instance.remove_engine(first),
            Err(GraphicsError::InvalidHandle("engine"))
        );
    }

    #[test]
    fn test_tick_all_reports_lost_engines() {
        let mut instance = GraphicsInstance::new();
        let context = HeadlessContext::new();
        let log = context.log();
        let lost = instance
            .add_engine(Box::new(context), EngineOptions::default())
            .unwrap();
        let healthy = instance
            .add_engine(Box::new(HeadlessContext::new()), EngineOptions::default())
            .unwrap();

        log.lose_context();
        assert_eq!(instance.tick_all(Instant::now()), vec![lost]);
        assert_eq!(instance.engine(healthy).unwrap().frame_id(), 1);
    }
}
