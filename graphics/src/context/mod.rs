//! Graphics context abstraction.
//!
//! The [`GraphicsContext`] trait is the seam between the engine and the
//! stateful driver it drives. It mirrors an immediate-mode API: objects are
//! named by small integer ids, state is bound and then mutated, and every
//! call is assumed to have a cost. The engine's caches exist to keep the
//! number of calls made through this trait minimal.
//!
//! # Available Contexts
//!
//! - [`HeadlessContext`]: recording no-op context for tests, benchmarks and
//!   headless runs
//!
//! Real driver bindings implement the same trait outside this crate.

mod glsl;
pub mod headless;

pub use headless::{ContextCall, ContextLog, HeadlessContext};

use crate::capabilities::EngineCapabilities;
use crate::types::{
    AttribPointer, BlendEquation, BlendFunctions, BufferTarget, BufferUsageHint, Capability,
    ClearMask, CompareFunction, CullFace, FramebufferAttachment, FrontFace, IndexType,
    PrimitiveMode, RenderbufferFormat, SamplingParameters, Size, StencilOperation, TexImageDesc,
    TexImageTarget, TextureTarget, UniformValue, WrapMode,
};

macro_rules! context_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

context_id!(
    /// Context-side name of a compiled shader stage.
    ShaderId
);
context_id!(
    /// Context-side name of a linked program.
    ProgramId
);
context_id!(
    /// Context-side name of a buffer object.
    BufferId
);
context_id!(
    /// Context-side name of a texture object.
    TextureId
);
context_id!(
    /// Context-side name of a framebuffer object.
    FramebufferId
);
context_id!(
    /// Context-side name of a renderbuffer object.
    RenderbufferId
);
context_id!(
    /// Context-side name of a vertex array object.
    VertexArrayId
);
context_id!(
    /// Location of a uniform inside a linked program.
    UniformLocation
);

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

/// State of a program link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Linking is still running in the background.
    Pending,
    /// The program linked successfully.
    Linked,
    /// Linking failed with the given log.
    Failed(String),
}

/// A stateful graphics execution context.
///
/// All methods are synchronous and issued from one thread. Implementations
/// do not deduplicate calls: every call made through this trait is expected
/// to reach the driver.
pub trait GraphicsContext {
    /// Human readable vendor/renderer description.
    fn description(&self) -> String;

    /// Capabilities of the context.
    fn capabilities(&self) -> EngineCapabilities;

    /// Size of the default framebuffer.
    fn drawing_buffer_size(&self) -> Size;

    /// Resize the default framebuffer.
    fn set_drawing_buffer_size(&mut self, size: Size);

    /// Size of the surface the context presents to, in pixels.
    fn canvas_client_size(&self) -> Size;

    /// Whether the context has been lost.
    fn is_context_lost(&self) -> bool;

    // === Shaders ===

    /// Compile a shader stage; returns the compiler log on failure.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;

    /// Delete a shader stage.
    fn delete_shader(&mut self, shader: ShaderId);

    /// Start linking a program from two compiled stages.
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> ProgramId;

    /// Query the link state of a program.
    fn link_status(&mut self, program: ProgramId) -> LinkStatus;

    /// Delete a program.
    fn delete_program(&mut self, program: ProgramId);

    /// Make a program current.
    fn use_program(&mut self, program: Option<ProgramId>);

    /// Location of a vertex attribute of a linked program.
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// Location of a uniform of a linked program.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Upload a uniform value to the current program.
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    // === Buffers ===

    /// Create a buffer object.
    fn create_buffer(&mut self) -> BufferId;

    /// Bind a buffer to a target.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);

    /// Bind a uniform buffer to an indexed binding point.
    fn bind_buffer_base(&mut self, index: u32, buffer: Option<BufferId>);

    /// Allocate and fill the buffer bound to a target.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsageHint);

    /// Overwrite part of the buffer bound to a target.
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]);

    /// Delete a buffer object.
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Point an attribute location at the currently bound array buffer.
    fn vertex_attrib_pointer(&mut self, location: u32, pointer: &AttribPointer);

    /// Enable an attribute array.
    fn enable_vertex_attrib_array(&mut self, location: u32);

    /// Disable an attribute array.
    fn disable_vertex_attrib_array(&mut self, location: u32);

    /// Set the instance divisor of an attribute (0 for per-vertex).
    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32);

    // === Textures ===

    /// Create a texture object.
    fn create_texture(&mut self) -> TextureId;

    /// Delete a texture object.
    fn delete_texture(&mut self, texture: TextureId);

    /// Select the active texture unit.
    fn active_texture(&mut self, unit: u32);

    /// Bind a texture to the active unit.
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>);

    /// Upload an image (or allocate storage when `data` is `None`).
    fn tex_image(&mut self, desc: &TexImageDesc, data: Option<&[u8]>);

    /// Set filtering and wrapping of the bound texture.
    fn tex_parameters(&mut self, target: TextureTarget, sampling: SamplingParameters, wrap: WrapMode);

    /// Generate the mip chain of the bound texture.
    fn generate_mipmap(&mut self, target: TextureTarget);

    // === Vertex arrays ===

    /// Create a vertex array object.
    fn create_vertex_array(&mut self) -> VertexArrayId;

    /// Bind a vertex array object (`None` binds the default one).
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    /// Delete a vertex array object.
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    // === Framebuffers ===

    /// Create a framebuffer object.
    fn create_framebuffer(&mut self) -> FramebufferId;

    /// Delete a framebuffer object.
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Bind a framebuffer (`None` binds the default framebuffer).
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Attach a texture image to the bound framebuffer.
    fn framebuffer_texture(
        &mut self,
        attachment: FramebufferAttachment,
        target: TexImageTarget,
        texture: Option<TextureId>,
    );

    /// Create a renderbuffer with storage.
    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        width: u32,
        height: u32,
    ) -> RenderbufferId;

    /// Delete a renderbuffer.
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId);

    /// Attach a renderbuffer to the bound framebuffer.
    fn framebuffer_renderbuffer(
        &mut self,
        attachment: FramebufferAttachment,
        renderbuffer: Option<RenderbufferId>,
    );

    /// Flush pending commands.
    fn flush(&mut self);

    // === Draw ===

    /// Draw indexed primitives; `instances` requests an instanced draw.
    fn draw_elements(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        index_type: IndexType,
        offset: u32,
        instances: Option<u32>,
    );

    /// Draw non-indexed primitives; `instances` requests an instanced draw.
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32, instances: Option<u32>);

    /// Clear the buffers named by the mask.
    fn clear(&mut self, mask: ClearMask, color: [f32; 4], depth: f32, stencil: i32);

    /// Set the pixel viewport.
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Set the scissor box.
    fn scissor(&mut self, x: i32, y: i32, width: u32, height: u32);

    // === Fixed-function state ===

    /// Enable or disable a capability.
    fn set_capability(&mut self, capability: Capability, enabled: bool);

    /// Enable or disable depth writes.
    fn depth_mask(&mut self, enabled: bool);

    /// Set the depth comparison.
    fn depth_func(&mut self, func: CompareFunction);

    /// Select the culled face.
    fn cull_face(&mut self, face: CullFace);

    /// Select the front face winding.
    fn front_face(&mut self, face: FrontFace);

    /// Set the polygon offset.
    fn polygon_offset(&mut self, factor: f32, units: f32);

    /// Set the stencil write mask.
    fn stencil_mask(&mut self, mask: u32);

    /// Set the stencil test function.
    fn stencil_func(&mut self, func: CompareFunction, reference: i32, mask: u32);

    /// Set the stencil operations.
    fn stencil_op(&mut self, fail: StencilOperation, depth_fail: StencilOperation, pass: StencilOperation);

    /// Set separate color/alpha blend factors.
    fn blend_func_separate(&mut self, functions: BlendFunctions);

    /// Set the blend equation.
    fn blend_equation(&mut self, equation: BlendEquation);

    /// Set the constant blend color.
    fn blend_color(&mut self, color: [f32; 4]);

    /// Enable or disable color writes.
    fn color_mask(&mut self, enabled: bool);

    // === External state ===

    /// Save the context's own state before foreign code runs.
    fn save_state(&mut self);

    /// Restore the state saved by [`GraphicsContext::save_state`].
    fn restore_state(&mut self);
}
