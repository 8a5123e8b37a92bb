//! Fixed-function state setters, clear, viewport and scissor.
//!
//! Setters only change the desired values held by the state caches;
//! [`Engine::apply_states`] pushes whatever changed right before a draw or a
//! clear.

use super::Engine;
use crate::profiling::profile_scope;
use crate::types::{
    AlphaMode, BlendEquation, Capability, ClearMask, CompareFunction, CullFace, FrontFace,
    StencilOperation, Viewport,
};

impl Engine {
    // ========================================================================
    // Culling
    // ========================================================================

    /// Set culling, polygon offset and winding for the next draws.
    ///
    /// `force` re-pushes the culling fields even when they look unchanged.
    pub fn set_state(&mut self, culling: bool, z_offset: f32, force: bool, reverse_side: bool) {
        if force {
            self.depth_culling.invalidate_culling();
        }
        self.depth_culling.set_cull(culling);
        self.depth_culling.set_cull_face(if self.options.cull_back_faces {
            CullFace::Back
        } else {
            CullFace::Front
        });
        self.depth_culling.set_z_offset(z_offset);
        self.depth_culling.set_front_face(if reverse_side {
            FrontFace::Cw
        } else {
            FrontFace::Ccw
        });
    }

    // ========================================================================
    // Depth
    // ========================================================================

    pub fn depth_buffer(&self) -> bool {
        self.depth_culling.depth_test()
    }

    pub fn set_depth_buffer(&mut self, enabled: bool) {
        self.depth_culling.set_depth_test(enabled);
    }

    pub fn depth_write(&self) -> bool {
        self.depth_culling.depth_mask()
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.depth_culling.set_depth_mask(enabled);
    }

    pub fn depth_function(&self) -> CompareFunction {
        self.depth_culling.depth_func()
    }

    pub fn set_depth_function(&mut self, func: CompareFunction) {
        self.depth_culling.set_depth_func(func);
    }

    pub fn set_depth_function_to_greater(&mut self) {
        self.set_depth_function(CompareFunction::Greater);
    }

    pub fn set_depth_function_to_greater_or_equal(&mut self) {
        self.set_depth_function(CompareFunction::GreaterEqual);
    }

    pub fn set_depth_function_to_less(&mut self) {
        self.set_depth_function(CompareFunction::Less);
    }

    pub fn set_depth_function_to_less_or_equal(&mut self) {
        self.set_depth_function(CompareFunction::LessEqual);
    }

    // ========================================================================
    // Stencil
    // ========================================================================

    pub fn stencil_buffer(&self) -> bool {
        self.stencil.test()
    }

    pub fn set_stencil_buffer(&mut self, enabled: bool) {
        self.stencil.set_test(enabled);
    }

    pub fn stencil_mask(&self) -> u32 {
        self.stencil.mask()
    }

    pub fn set_stencil_mask(&mut self, mask: u32) {
        self.stencil.set_mask(mask);
    }

    pub fn stencil_function(&self) -> CompareFunction {
        self.stencil.func()
    }

    pub fn set_stencil_function(&mut self, func: CompareFunction) {
        self.stencil.set_func(func);
    }

    pub fn stencil_function_reference(&self) -> i32 {
        self.stencil.func_ref()
    }

    pub fn set_stencil_function_reference(&mut self, reference: i32) {
        self.stencil.set_func_ref(reference);
    }

    pub fn stencil_function_mask(&self) -> u32 {
        self.stencil.func_mask()
    }

    pub fn set_stencil_function_mask(&mut self, mask: u32) {
        self.stencil.set_func_mask(mask);
    }

    pub fn stencil_operation_fail(&self) -> StencilOperation {
        self.stencil.op_stencil_fail()
    }

    pub fn set_stencil_operation_fail(&mut self, op: StencilOperation) {
        self.stencil.set_op_stencil_fail(op);
    }

    pub fn stencil_operation_depth_fail(&self) -> StencilOperation {
        self.stencil.op_depth_fail()
    }

    pub fn set_stencil_operation_depth_fail(&mut self, op: StencilOperation) {
        self.stencil.set_op_depth_fail(op);
    }

    pub fn stencil_operation_pass(&self) -> StencilOperation {
        self.stencil.op_stencil_depth_pass()
    }

    pub fn set_stencil_operation_pass(&mut self, op: StencilOperation) {
        self.stencil.set_op_stencil_depth_pass(op);
    }

    // ========================================================================
    // Alpha
    // ========================================================================

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    /// Select a blending mode.
    ///
    /// Any mode but [`AlphaMode::Disable`] enables blending. Unless
    /// `no_depth_write_change` is set, depth writes are enabled exactly when
    /// blending is disabled.
    pub fn set_alpha_mode(&mut self, mode: AlphaMode, no_depth_write_change: bool) {
        if self.alpha_mode == mode {
            return;
        }
        match mode.blend_functions() {
            Some(functions) => {
                self.alpha.set_functions(functions);
                self.alpha.set_equation(BlendEquation::Add);
                self.alpha.set_blend(true);
            }
            None => self.alpha.set_blend(false),
        }
        if !no_depth_write_change {
            self.set_depth_write(mode == AlphaMode::Disable);
        }
        self.alpha_mode = mode;
    }

    /// Constant color used by constant blend factors.
    pub fn set_alpha_constants(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.alpha.set_constants([r, g, b, a]);
    }

    pub fn alpha_testing(&self) -> bool {
        self.alpha_test
    }

    /// Flag consumed by materials to pick their alpha-test variant.
    pub fn set_alpha_testing(&mut self, enabled: bool) {
        self.alpha_test = enabled;
    }

    pub fn color_write(&self) -> bool {
        self.alpha.color_write()
    }

    pub fn set_color_write(&mut self, enabled: bool) {
        self.alpha.set_color_write(enabled);
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Push every changed state field to the context.
    ///
    /// Returns the number of context calls issued, which equals the number
    /// of fields whose desired value differs from the last applied one.
    pub fn apply_states(&mut self) -> usize {
        profile_scope!("apply_states");
        let context = self.context.as_mut();
        self.depth_culling.apply(context) + self.stencil.apply(context) + self.alpha.apply(context)
    }

    /// Clear the current target.
    ///
    /// The color buffer is cleared only with `back_buffer` and a color. The
    /// stencil buffer of the default framebuffer is cleared only when the
    /// engine was created with [`EngineOptions::stencil`](crate::EngineOptions::stencil).
    pub fn clear(&mut self, color: Option<[f32; 4]>, back_buffer: bool, depth: bool, stencil: bool) {
        self.apply_states();

        let mut mask = ClearMask::empty();
        if back_buffer && color.is_some() {
            mask |= ClearMask::COLOR;
        }
        if depth {
            mask |= ClearMask::DEPTH;
        }
        if stencil && (self.options.stencil || self.bindings.framebuffer.is_some()) {
            mask |= ClearMask::STENCIL;
        }
        if mask.is_empty() {
            return;
        }
        self.context
            .clear(mask, color.unwrap_or([0.0, 0.0, 0.0, 1.0]), 1.0, 0);
    }

    // ========================================================================
    // Viewport
    // ========================================================================

    /// Apply a normalized viewport against the required size, or the size of
    /// the current render target.
    pub fn set_viewport(
        &mut self,
        viewport: &Viewport,
        required_width: Option<u32>,
        required_height: Option<u32>,
    ) {
        let width = required_width.unwrap_or_else(|| self.render_width());
        let height = required_height.unwrap_or_else(|| self.render_height());
        let (x, y, width, height) = viewport.to_pixels(width, height);
        self.set_direct_viewport(x, y, width, height);
    }

    /// Apply a pixel viewport; returns the previous one.
    pub fn set_direct_viewport(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Option<(i32, i32, u32, u32)> {
        let previous = self.bindings.viewport;
        if previous != Some((x, y, width, height)) {
            self.context.viewport(x, y, width, height);
            self.bindings.viewport = Some((x, y, width, height));
        }
        previous
    }

    /// The last viewport applied, in pixels.
    pub fn viewport(&self) -> Option<(i32, i32, u32, u32)> {
        self.bindings.viewport
    }

    // ========================================================================
    // Scissor
    // ========================================================================

    /// Enable the scissor test on a pixel rectangle.
    pub fn enable_scissor(&mut self, x: i32, y: i32, width: u32, height: u32) {
        if self.bindings.scissor_test != Some(true) {
            self.context.set_capability(Capability::ScissorTest, true);
            self.bindings.scissor_test = Some(true);
        }
        if self.bindings.scissor != Some((x, y, width, height)) {
            self.context.scissor(x, y, width, height);
            self.bindings.scissor = Some((x, y, width, height));
        }
    }

    /// Disable the scissor test.
    pub fn disable_scissor(&mut self) {
        if self.bindings.scissor_test != Some(false) {
            self.context.set_capability(Capability::ScissorTest, false);
            self.bindings.scissor_test = Some(false);
        }
    }

    /// Whether the scissor test is enabled, as far as the engine knows.
    pub fn is_scissor_enabled(&self) -> bool {
        self.bindings.scissor_test == Some(true)
    }

    /// Clear a pixel rectangle of the current target to `color`, depth and
    /// stencil included.
    ///
    /// The scissor state in place before the call is restored afterwards.
    pub fn scissor_clear(&mut self, x: i32, y: i32, width: u32, height: u32, color: [f32; 4]) {
        let previous_test = self.bindings.scissor_test;
        let previous_box = self.bindings.scissor;

        self.enable_scissor(x, y, width, height);
        self.clear(Some(color), true, true, true);

        if let Some((x, y, width, height)) = previous_box {
            if self.bindings.scissor != previous_box {
                self.context.scissor(x, y, width, height);
                self.bindings.scissor = previous_box;
            }
        }
        match previous_test {
            Some(true) => {}
            Some(false) => self.disable_scissor(),
            None => {
                self.context.set_capability(Capability::ScissorTest, false);
                self.bindings.scissor_test = Some(false);
            }
        }
    }
}
