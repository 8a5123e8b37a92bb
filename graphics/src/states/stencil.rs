//! Stencil test state.

use super::Tracked;
use crate::context::GraphicsContext;
use crate::types::{Capability, CompareFunction, StencilOperation};

type StencilFunc = (CompareFunction, i32, u32);
type StencilOps = (StencilOperation, StencilOperation, StencilOperation);

/// Stencil fields with change tracking.
///
/// The function `(func, ref, mask)` and the operation `(fail, depth fail,
/// pass)` are each pushed with a single call.
#[derive(Debug, Clone)]
pub struct StencilState {
    test: Tracked<bool>,
    mask: Tracked<u32>,
    func: Tracked<StencilFunc>,
    op: Tracked<StencilOps>,
}

impl Default for StencilState {
    fn default() -> Self {
        Self::new()
    }
}

impl StencilState {
    /// Stencil test off, full write mask, `Always` with reference 1, keep/keep/replace.
    pub fn new() -> Self {
        Self {
            test: Tracked::new(false),
            mask: Tracked::new(0xFF),
            func: Tracked::new((CompareFunction::Always, 1, 0xFF)),
            op: Tracked::new((
                StencilOperation::Keep,
                StencilOperation::Keep,
                StencilOperation::Replace,
            )),
        }
    }

    pub fn test(&self) -> bool {
        self.test.get()
    }

    pub fn set_test(&mut self, enabled: bool) {
        self.test.set(enabled);
    }

    pub fn mask(&self) -> u32 {
        self.mask.get()
    }

    pub fn set_mask(&mut self, mask: u32) {
        self.mask.set(mask);
    }

    pub fn func(&self) -> CompareFunction {
        self.func.get().0
    }

    pub fn set_func(&mut self, func: CompareFunction) {
        self.func.update(|f| f.0 = func);
    }

    pub fn func_ref(&self) -> i32 {
        self.func.get().1
    }

    pub fn set_func_ref(&mut self, reference: i32) {
        self.func.update(|f| f.1 = reference);
    }

    pub fn func_mask(&self) -> u32 {
        self.func.get().2
    }

    pub fn set_func_mask(&mut self, mask: u32) {
        self.func.update(|f| f.2 = mask);
    }

    pub fn op_stencil_fail(&self) -> StencilOperation {
        self.op.get().0
    }

    pub fn set_op_stencil_fail(&mut self, op: StencilOperation) {
        self.op.update(|o| o.0 = op);
    }

    pub fn op_depth_fail(&self) -> StencilOperation {
        self.op.get().1
    }

    pub fn set_op_depth_fail(&mut self, op: StencilOperation) {
        self.op.update(|o| o.1 = op);
    }

    pub fn op_stencil_depth_pass(&self) -> StencilOperation {
        self.op.get().2
    }

    pub fn set_op_stencil_depth_pass(&mut self, op: StencilOperation) {
        self.op.update(|o| o.2 = op);
    }

    /// Whether any field still has to be pushed.
    pub fn is_dirty(&self) -> bool {
        self.test.is_dirty() || self.mask.is_dirty() || self.func.is_dirty() || self.op.is_dirty()
    }

    /// Restore the defaults and mark every field dirty.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Push the dirty fields; returns the number of context calls.
    pub fn apply(&mut self, context: &mut dyn GraphicsContext) -> usize {
        let mut calls = 0;

        if let Some(enabled) = self.test.sync() {
            context.set_capability(Capability::StencilTest, enabled);
            calls += 1;
        }
        if let Some(mask) = self.mask.sync() {
            context.stencil_mask(mask);
            calls += 1;
        }
        if let Some((func, reference, mask)) = self.func.sync() {
            context.stencil_func(func, reference, mask);
            calls += 1;
        }
        if let Some((fail, depth_fail, pass)) = self.op.sync() {
            context.stencil_op(fail, depth_fail, pass);
            calls += 1;
        }

        calls
    }
}
