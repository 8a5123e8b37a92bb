//! Blending state.

use super::Tracked;
use crate::context::GraphicsContext;
use crate::types::{BlendEquation, BlendFunctions, Capability};

/// Blend and color write fields with change tracking.
#[derive(Debug, Clone)]
pub struct AlphaState {
    blend: Tracked<bool>,
    functions: Tracked<BlendFunctions>,
    equation: Tracked<BlendEquation>,
    constants: Tracked<[f32; 4]>,
    color_write: Tracked<bool>,
}

impl Default for AlphaState {
    fn default() -> Self {
        Self::new()
    }
}

impl AlphaState {
    /// Blending off, `One/Zero` factors, additive equation, color writes on.
    pub fn new() -> Self {
        Self {
            blend: Tracked::new(false),
            functions: Tracked::new(BlendFunctions::default()),
            equation: Tracked::new(BlendEquation::Add),
            constants: Tracked::new([0.0; 4]),
            color_write: Tracked::new(true),
        }
    }

    pub fn blend(&self) -> bool {
        self.blend.get()
    }

    pub fn set_blend(&mut self, enabled: bool) {
        self.blend.set(enabled);
    }

    pub fn functions(&self) -> BlendFunctions {
        self.functions.get()
    }

    pub fn set_functions(&mut self, functions: BlendFunctions) {
        self.functions.set(functions);
    }

    pub fn equation(&self) -> BlendEquation {
        self.equation.get()
    }

    pub fn set_equation(&mut self, equation: BlendEquation) {
        self.equation.set(equation);
    }

    pub fn constants(&self) -> [f32; 4] {
        self.constants.get()
    }

    pub fn set_constants(&mut self, color: [f32; 4]) {
        self.constants.set(color);
    }

    pub fn color_write(&self) -> bool {
        self.color_write.get()
    }

    pub fn set_color_write(&mut self, enabled: bool) {
        self.color_write.set(enabled);
    }

    /// Whether any field still has to be pushed.
    pub fn is_dirty(&self) -> bool {
        self.blend.is_dirty()
            || self.functions.is_dirty()
            || self.equation.is_dirty()
            || self.constants.is_dirty()
            || self.color_write.is_dirty()
    }

    /// Restore the defaults and mark every field dirty.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Push the dirty fields; returns the number of context calls.
    pub fn apply(&mut self, context: &mut dyn GraphicsContext) -> usize {
        let mut calls = 0;

        if let Some(enabled) = self.blend.sync() {
            context.set_capability(Capability::Blend, enabled);
            calls += 1;
        }
        if let Some(functions) = self.functions.sync() {
            context.blend_func_separate(functions);
            calls += 1;
        }
        if let Some(equation) = self.equation.sync() {
            context.blend_equation(equation);
            calls += 1;
        }
        if let Some(color) = self.constants.sync() {
            context.blend_color(color);
            calls += 1;
        }
        if let Some(enabled) = self.color_write.sync() {
            context.color_mask(enabled);
            calls += 1;
        }

        calls
    }
}
