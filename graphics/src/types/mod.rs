//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, fixed-function state enums and the
//! descriptor structs shared by the [`Engine`](crate::Engine) and the
//! [`GraphicsContext`](crate::GraphicsContext) seam.

mod buffer;
mod common;
mod state;
mod texture;
mod uniform;

pub use buffer::{
    AttribPointer, BufferTarget, BufferUsageHint, IndexType, InstancingAttribute, PrimitiveMode,
    VertexBufferView, VertexBuffers, VertexKind,
};
pub use common::{ClearMask, Size, Viewport};
pub use state::{
    AlphaMode, BlendEquation, BlendFactor, BlendFunctions, Capability, CompareFunction, CullFace,
    FrontFace, StencilOperation,
};
pub use texture::{
    FilterMode, FramebufferAttachment, RenderTargetOptions, RenderbufferFormat,
    SamplingMode, SamplingParameters, TexImageDesc, TexImageTarget, TextureData, TextureFormat,
    TextureTarget, TextureType, WrapMode,
};
pub use uniform::UniformValue;
