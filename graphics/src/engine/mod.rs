//! The engine: GPU state and resource cache.
//!
//! The [`Engine`] owns a [`GraphicsContext`] and sits between it and the
//! scene. Every binding, uniform and fixed-function state change goes through
//! a cache first, so that the context only sees calls that change something.
//!
//! # Example
//!
//! ```ignore
//! use ember_graphics::{Engine, EngineOptions, HeadlessContext};
//!
//! let mut engine = Engine::new(Box::new(HeadlessContext::new()), EngineOptions::default())?;
//! let vertices = engine.create_vertex_buffer(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])?;
//! let effect = engine.create_effect(EffectSource::named("default"), EffectCreationOptions::new())?;
//!
//! engine.run_render_loop(move |engine| {
//!     engine.clear(Some([0.2, 0.2, 0.3, 1.0]), true, true, false);
//!     // bind and draw ...
//! });
//! engine.tick(Instant::now())?;
//! ```

mod buffers;
mod draw;
mod effects;
mod framebuffer;
mod render_loop;
mod states;
mod textures;
mod uniforms;
mod vertex_arrays;

use std::collections::HashMap;
use std::fmt;

use slotmap::SlotMap;

use crate::capabilities::EngineCapabilities;
use crate::config::EngineOptions;
use crate::context::{BufferId, FramebufferId, GraphicsContext, ProgramId, TextureId, UniformLocation};
use crate::diagnostics::{DrawCallCounter, FpsMeter};
use crate::effect::{Effect, EffectId};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{
    BufferHandle, GpuBuffer, InternalTexture, TextureHandle, VertexArrayHandle, VertexArrayObject,
};
use crate::shader::ShaderStore;
use crate::states::{AlphaState, DepthCullingState, StencilState};
use crate::types::{
    AlphaMode, AttribPointer, CullFace, Size, TextureTarget, UniformValue, VertexBuffers,
};

pub use render_loop::{RenderLoopCallback, RenderLoopId};

use render_loop::RenderLoop;

/// What the engine believes is bound on the context.
#[derive(Debug, Default)]
struct BindingCache {
    program: Option<ProgramId>,
    current_effect: Option<EffectId>,
    active_texture_unit: Option<u32>,
    bound_textures: Vec<Option<(TextureTarget, TextureId)>>,
    array_buffer: Option<BufferId>,
    index_buffer: Option<BufferId>,
    uniform_buffer: Option<BufferId>,
    attrib_pointers: HashMap<u32, AttribPointer>,
    enabled_attributes: Vec<bool>,
    instanced_attributes: Vec<u32>,
    framebuffer: Option<FramebufferId>,
    previous_framebuffer: Option<FramebufferId>,
    current_render_target: Option<TextureHandle>,
    uses_32bit_indices: bool,
    last_bind_buffers: Option<(VertexBuffers, Option<BufferHandle>, EffectId)>,
    vertex_array: Option<VertexArrayHandle>,
    viewport: Option<(i32, i32, u32, u32)>,
    scissor_test: Option<bool>,
    scissor: Option<(i32, i32, u32, u32)>,
}

impl BindingCache {
    fn new(texture_units: usize, vertex_attribs: usize) -> Self {
        Self {
            bound_textures: vec![None; texture_units],
            enabled_attributes: vec![false; vertex_attribs],
            scissor_test: Some(false),
            ..Self::default()
        }
    }

    fn reset_texture_units(&mut self) {
        self.bound_textures.iter_mut().for_each(|unit| *unit = None);
        self.active_texture_unit = None;
    }

    fn reset_vertex_bindings(&mut self) {
        self.array_buffer = None;
        self.index_buffer = None;
        self.uniform_buffer = None;
        self.attrib_pointers.clear();
        self.last_bind_buffers = None;
    }
}

/// GPU state and resource cache over a [`GraphicsContext`].
///
/// One engine exists per rendering surface. It is single-threaded and is
/// consumed by [`Engine::dispose`].
pub struct Engine {
    context: Box<dyn GraphicsContext>,
    options: EngineOptions,
    caps: EngineCapabilities,
    shader_store: ShaderStore,

    depth_culling: DepthCullingState,
    stencil: StencilState,
    alpha: AlphaState,
    alpha_mode: AlphaMode,
    alpha_test: bool,

    buffers: SlotMap<BufferHandle, GpuBuffer>,
    textures: SlotMap<TextureHandle, InternalTexture>,
    vertex_arrays: SlotMap<VertexArrayHandle, VertexArrayObject>,
    loaded_textures: Vec<TextureHandle>,
    effects: SlotMap<EffectId, Effect>,
    effect_cache: HashMap<String, EffectId>,

    bindings: BindingCache,
    uniform_cache: HashMap<UniformLocation, UniformValue>,

    hardware_scaling_level: f32,
    render_loop: RenderLoop,
    fps: FpsMeter,
    draw_calls: DrawCallCounter,
    frame_id: u64,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("description", &self.context.description())
            .field("buffers", &self.buffers.len())
            .field("textures", &self.textures.len())
            .field("effects", &self.effects.len())
            .field("vertex_arrays", &self.vertex_arrays.len())
            .field("frame_id", &self.frame_id)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine over a context.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Config`] for invalid options and
    /// [`GraphicsError::ContextLost`] if the context is already lost.
    pub fn new(context: Box<dyn GraphicsContext>, options: EngineOptions) -> GraphicsResult<Self> {
        options.validate()?;
        if context.is_context_lost() {
            return Err(GraphicsError::ContextLost);
        }

        let caps = context.capabilities();
        let texture_units = options
            .max_texture_units_override
            .map_or(caps.max_texture_image_units, |units| {
                units.min(caps.max_texture_image_units)
            });

        let mut depth_culling = DepthCullingState::new();
        depth_culling.set_cull_face(if options.cull_back_faces {
            CullFace::Back
        } else {
            CullFace::Front
        });

        log::info!(
            "Engine created on {} ({} texture units, instancing: {}, uniform buffers: {})",
            context.description(),
            texture_units,
            caps.instanced_arrays,
            caps.uniform_buffer_objects
        );

        Ok(Self {
            bindings: BindingCache::new(texture_units as usize, caps.max_vertex_attribs as usize),
            fps: FpsMeter::new(options.fps_range),
            context,
            caps,
            shader_store: ShaderStore::with_standard_library(),
            depth_culling,
            stencil: StencilState::new(),
            alpha: AlphaState::new(),
            alpha_mode: AlphaMode::Disable,
            alpha_test: false,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            loaded_textures: Vec::new(),
            effects: SlotMap::with_key(),
            effect_cache: HashMap::new(),
            uniform_cache: HashMap::new(),
            hardware_scaling_level: 1.0,
            render_loop: RenderLoop::default(),
            draw_calls: DrawCallCounter::new(),
            frame_id: 0,
            options,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Capabilities of the underlying context.
    pub fn caps(&self) -> &EngineCapabilities {
        &self.caps
    }

    /// Options the engine was created with.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Description of the underlying context.
    pub fn description(&self) -> String {
        self.context.description()
    }

    /// Number of texture units the engine uses.
    pub fn texture_units(&self) -> usize {
        self.bindings.bound_textures.len()
    }

    /// Shader sources used by [`Engine::create_effect`].
    pub fn shader_store(&self) -> &ShaderStore {
        &self.shader_store
    }

    /// Mutable access to the shader sources.
    pub fn shader_store_mut(&mut self) -> &mut ShaderStore {
        &mut self.shader_store
    }

    /// Width of the current render target (or drawing buffer).
    pub fn render_width(&self) -> u32 {
        self.bindings
            .current_render_target
            .and_then(|handle| self.textures.get(handle))
            .map_or(self.context.drawing_buffer_size().width, |texture| texture.width)
    }

    /// Height of the current render target (or drawing buffer).
    pub fn render_height(&self) -> u32 {
        self.bindings
            .current_render_target
            .and_then(|handle| self.textures.get(handle))
            .map_or(self.context.drawing_buffer_size().height, |texture| texture.height)
    }

    /// Monotonic frame counter.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Whether the context has been lost.
    pub fn is_context_lost(&self) -> bool {
        self.context.is_context_lost()
    }

    fn ensure_context(&self) -> GraphicsResult<()> {
        if self.context.is_context_lost() {
            Err(GraphicsError::ContextLost)
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Surface size
    // ========================================================================

    /// Current hardware scaling level.
    pub fn hardware_scaling_level(&self) -> f32 {
        self.hardware_scaling_level
    }

    /// Render at `1 / level` of the canvas resolution.
    ///
    /// The drawing buffer is resized right away.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::Config`] for a level that is not a positive finite
    /// number.
    pub fn set_hardware_scaling_level(&mut self, level: f32) -> GraphicsResult<()> {
        if !level.is_finite() || level <= 0.0 {
            return Err(GraphicsError::Config(format!(
                "hardware scaling level must be positive, got {level}"
            )));
        }
        self.hardware_scaling_level = level;
        self.resize();
        Ok(())
    }

    /// Match the drawing buffer to the canvas size and the hardware scaling
    /// level. Returns whether the size changed.
    pub fn resize(&mut self) -> bool {
        let canvas = self.context.canvas_client_size();
        let width = (canvas.width as f32 / self.hardware_scaling_level) as u32;
        let height = (canvas.height as f32 / self.hardware_scaling_level) as u32;
        self.set_size(width, height)
    }

    /// Resize the drawing buffer. Returns whether the size changed.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        let size = Size::new(width, height);
        if self.context.drawing_buffer_size() == size {
            return false;
        }
        log::debug!("Engine: drawing buffer resized to {}x{}", width, height);
        self.context.set_drawing_buffer_size(size);
        true
    }

    // ========================================================================
    // Cache control
    // ========================================================================

    /// Forget cached bindings.
    ///
    /// A soft wipe forgets the texture units and the current effect. A brute
    /// force wipe also forgets the program, resets every state cache to its
    /// defaults, goes back to the default vertex array and forgets the
    /// vertex, index and scissor bindings.
    pub fn wipe_caches(&mut self, brute_force: bool) {
        log::debug!("Engine: wiping caches (brute force: {})", brute_force);
        self.reset_texture_cache();
        self.bindings.current_effect = None;

        if brute_force {
            self.bindings.program = None;
            self.uniform_cache.clear();
            self.depth_culling.reset();
            self.depth_culling.set_cull_face(if self.options.cull_back_faces {
                CullFace::Back
            } else {
                CullFace::Front
            });
            self.stencil.reset();
            self.alpha.reset();
            self.alpha_mode = AlphaMode::Disable;
            self.unbind_vertex_array_object();
            self.bindings.reset_vertex_bindings();
            self.bindings.viewport = None;
            self.bindings.scissor_test = None;
            self.bindings.scissor = None;
            self.bindings.uses_32bit_indices = false;
        }
    }

    /// Forget the per-unit texture bindings.
    pub fn reset_texture_cache(&mut self) {
        self.bindings.reset_texture_units();
    }

    /// Save the context's own state before handing it to foreign code.
    pub fn backup_state(&mut self) {
        self.context.save_state();
        self.wipe_caches(true);
    }

    /// Restore the context's state after foreign code ran and resynchronize
    /// the caches.
    pub fn restore_state(&mut self) {
        self.context.restore_state();
        self.wipe_caches(true);
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Release every tracked resource and drop the engine.
    pub fn dispose(mut self) {
        self.stop_render_loop(None);
        self.release_effects();

        let textures: Vec<TextureHandle> = self.textures.keys().collect();
        for handle in textures {
            let _ = self.release_texture(handle);
        }
        let vertex_arrays: Vec<VertexArrayHandle> = self.vertex_arrays.keys().collect();
        for handle in vertex_arrays {
            let _ = self.release_vertex_array_object(handle);
        }
        let buffers: Vec<BufferHandle> = self.buffers.keys().collect();
        for handle in buffers {
            let _ = self.release_buffer(handle);
        }
        self.unbind_all_attributes();

        log::info!(
            "Engine disposed after {} frames ({} draw calls)",
            self.frame_id,
            self.draw_calls.total()
        );
    }
}
