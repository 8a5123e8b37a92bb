//! Depth test and face culling state.

use super::Tracked;
use crate::context::GraphicsContext;
use crate::types::{Capability, CompareFunction, CullFace, FrontFace};

/// Depth and culling fields with change tracking.
#[derive(Debug, Clone)]
pub struct DepthCullingState {
    depth_test: Tracked<bool>,
    depth_mask: Tracked<bool>,
    depth_func: Tracked<CompareFunction>,
    cull: Tracked<bool>,
    cull_face: Tracked<CullFace>,
    polygon_offset_fill: Tracked<bool>,
    z_offset: Tracked<f32>,
    front_face: Tracked<FrontFace>,
}

impl Default for DepthCullingState {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthCullingState {
    /// Depth test and writes on, `LessEqual`, culling off.
    pub fn new() -> Self {
        Self {
            depth_test: Tracked::new(true),
            depth_mask: Tracked::new(true),
            depth_func: Tracked::new(CompareFunction::LessEqual),
            cull: Tracked::new(false),
            cull_face: Tracked::new(CullFace::Back),
            polygon_offset_fill: Tracked::new(false),
            z_offset: Tracked::new(0.0),
            front_face: Tracked::new(FrontFace::Ccw),
        }
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test.get()
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test.set(enabled);
    }

    pub fn depth_mask(&self) -> bool {
        self.depth_mask.get()
    }

    pub fn set_depth_mask(&mut self, enabled: bool) {
        self.depth_mask.set(enabled);
    }

    pub fn depth_func(&self) -> CompareFunction {
        self.depth_func.get()
    }

    pub fn set_depth_func(&mut self, func: CompareFunction) {
        self.depth_func.set(func);
    }

    pub fn cull(&self) -> bool {
        self.cull.get()
    }

    pub fn set_cull(&mut self, enabled: bool) {
        self.cull.set(enabled);
    }

    pub fn cull_face(&self) -> CullFace {
        self.cull_face.get()
    }

    pub fn set_cull_face(&mut self, face: CullFace) {
        self.cull_face.set(face);
    }

    pub fn z_offset(&self) -> f32 {
        self.z_offset.get()
    }

    /// Set the polygon offset factor; a non-zero offset enables polygon
    /// offset fill.
    pub fn set_z_offset(&mut self, offset: f32) {
        self.z_offset.set(offset);
        self.polygon_offset_fill.set(offset != 0.0);
    }

    pub fn front_face(&self) -> FrontFace {
        self.front_face.get()
    }

    pub fn set_front_face(&mut self, face: FrontFace) {
        self.front_face.set(face);
    }

    /// Whether any field still has to be pushed.
    pub fn is_dirty(&self) -> bool {
        self.depth_test.is_dirty()
            || self.depth_mask.is_dirty()
            || self.depth_func.is_dirty()
            || self.cull.is_dirty()
            || self.cull_face.is_dirty()
            || self.polygon_offset_fill.is_dirty()
            || self.z_offset.is_dirty()
            || self.front_face.is_dirty()
    }

    /// Mark the culling fields dirty so the next apply pushes them again.
    pub fn invalidate_culling(&mut self) {
        self.cull.invalidate();
        self.cull_face.invalidate();
        self.front_face.invalidate();
    }

    /// Restore the defaults and mark every field dirty.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Push the dirty fields; returns the number of context calls.
    pub fn apply(&mut self, context: &mut dyn GraphicsContext) -> usize {
        let mut calls = 0;

        if let Some(enabled) = self.depth_test.sync() {
            context.set_capability(Capability::DepthTest, enabled);
            calls += 1;
        }
        if let Some(enabled) = self.depth_mask.sync() {
            context.depth_mask(enabled);
            calls += 1;
        }
        if let Some(func) = self.depth_func.sync() {
            context.depth_func(func);
            calls += 1;
        }
        if let Some(enabled) = self.cull.sync() {
            context.set_capability(Capability::CullFace, enabled);
            calls += 1;
        }
        if let Some(face) = self.cull_face.sync() {
            context.cull_face(face);
            calls += 1;
        }
        if let Some(enabled) = self.polygon_offset_fill.sync() {
            context.set_capability(Capability::PolygonOffsetFill, enabled);
            calls += 1;
        }
        if let Some(offset) = self.z_offset.sync() {
            context.polygon_offset(offset, 0.0);
            calls += 1;
        }
        if let Some(face) = self.front_face.sync() {
            context.front_face(face);
            calls += 1;
        }

        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HeadlessContext;

    #[test]
    fn test_first_apply_pushes_everything() {
        let mut context = HeadlessContext::new();
        let mut state = DepthCullingState::new();
        assert_eq!(state.apply(&mut context), 8);
        assert!(!state.is_dirty());
        assert_eq!(state.apply(&mut context), 0);
    }

    #[test]
    fn test_z_offset_toggles_fill() {
        let mut context = HeadlessContext::new();
        let log = context.log();
        let mut state = DepthCullingState::new();
        state.apply(&mut context);
        log.clear();

        state.set_z_offset(0.5);
        assert_eq!(state.apply(&mut context), 2);

        state.set_z_offset(0.75);
        assert_eq!(state.apply(&mut context), 1);
        assert_eq!(log.state_mutations(), 3);
    }
}
