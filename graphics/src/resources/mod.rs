//! GPU resources tracked by the engine.
//!
//! This module contains the bookkeeping records the [`Engine`] keeps for the
//! objects it created on the context:
//! - [`GpuBuffer`] - vertex, index, uniform and instance buffers
//! - [`InternalTexture`] - plain, raw, dynamic, cube and render target textures
//! - [`VertexArrayObject`] - recorded vertex layouts
//!
//! Records live in generational handle tables. Callers only hold the `Copy`
//! handles; a handle whose record was released is rejected instead of
//! aliasing a newer resource.
//!
//! [`Engine`]: crate::Engine

mod buffer;
mod texture;
mod vertex_array;

pub use buffer::GpuBuffer;
pub use texture::{InternalTexture, TextureSource};
pub use vertex_array::VertexArrayObject;

slotmap::new_key_type! {
    /// Handle to a buffer created by the engine.
    pub struct BufferHandle;

    /// Handle to a texture created by the engine.
    pub struct TextureHandle;

    /// Handle to a vertex array object recorded by the engine.
    pub struct VertexArrayHandle;
}

// Handles cross thread boundaries freely even though the engine does not
static_assertions::assert_impl_all!(BufferHandle: Copy, Send, Sync);
static_assertions::assert_impl_all!(TextureHandle: Copy, Send, Sync);
static_assertions::assert_impl_all!(VertexArrayHandle: Copy, Send, Sync);
