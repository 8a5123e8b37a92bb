//! Headless graphics context for testing and development.
//!
//! This context doesn't touch a GPU but behaves like a stateful driver: it
//! hands out object names, tracks link state and resolves attribute and
//! uniform locations from shader sources. Every call is appended to a
//! [`ContextLog`] that tests keep after the context has been moved into an
//! [`Engine`](crate::Engine).
//!
//! # Example
//!
//! ```ignore
//! let context = HeadlessContext::new();
//! let log = context.log();
//! let mut engine = Engine::new(Box::new(context), EngineOptions::default())?;
//!
//! engine.set_depth_write(false);
//! engine.apply_states();
//! assert_eq!(log.state_mutations(), 1);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::glsl::{self, StageInfo};
use super::{
    BufferId, FramebufferId, GraphicsContext, LinkStatus, ProgramId, RenderbufferId, ShaderId,
    ShaderStage, TextureId, UniformLocation, VertexArrayId,
};
use crate::capabilities::EngineCapabilities;
use crate::types::{
    AttribPointer, BlendEquation, BlendFunctions, BufferTarget, BufferUsageHint, Capability,
    ClearMask, CompareFunction, CullFace, FramebufferAttachment, FrontFace, IndexType,
    PrimitiveMode, RenderbufferFormat, SamplingParameters, Size, StencilOperation, TexImageDesc,
    TexImageTarget, TextureTarget, UniformValue, WrapMode,
};

/// A single call recorded by the [`HeadlessContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContextCall {
    CompileShader(ShaderStage),
    DeleteShader(ShaderId),
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform(UniformLocation, UniformValue),
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BindBufferBase(u32, Option<BufferId>),
    BufferData {
        target: BufferTarget,
        len: usize,
        usage: BufferUsageHint,
    },
    BufferSubData {
        target: BufferTarget,
        offset: usize,
        len: usize,
    },
    DeleteBuffer(BufferId),
    VertexAttribPointer(u32, AttribPointer),
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribDivisor(u32, u32),
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    ActiveTexture(u32),
    BindTexture(TextureTarget, Option<TextureId>),
    TexImage {
        desc: TexImageDesc,
        data: Option<Vec<u8>>,
    },
    TexParameters {
        target: TextureTarget,
        sampling: SamplingParameters,
        wrap: WrapMode,
    },
    GenerateMipmap(TextureTarget),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    CreateFramebuffer(FramebufferId),
    DeleteFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    FramebufferTexture {
        attachment: FramebufferAttachment,
        target: TexImageTarget,
        texture: Option<TextureId>,
    },
    CreateRenderbuffer {
        renderbuffer: RenderbufferId,
        format: RenderbufferFormat,
        width: u32,
        height: u32,
    },
    DeleteRenderbuffer(RenderbufferId),
    FramebufferRenderbuffer {
        attachment: FramebufferAttachment,
        renderbuffer: Option<RenderbufferId>,
    },
    Flush,
    DrawElements {
        mode: PrimitiveMode,
        count: u32,
        index_type: IndexType,
        offset: u32,
        instances: Option<u32>,
    },
    DrawArrays {
        mode: PrimitiveMode,
        first: u32,
        count: u32,
        instances: Option<u32>,
    },
    Clear {
        mask: ClearMask,
        color: [f32; 4],
        depth: f32,
        stencil: i32,
    },
    Viewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    Scissor {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    SetDrawingBufferSize(Size),
    SetCapability(Capability, bool),
    DepthMask(bool),
    DepthFunc(CompareFunction),
    CullFace(CullFace),
    FrontFace(FrontFace),
    PolygonOffset(f32, f32),
    StencilMask(u32),
    StencilFunc(CompareFunction, i32, u32),
    StencilOp(StencilOperation, StencilOperation, StencilOperation),
    BlendFuncSeparate(BlendFunctions),
    BlendEquation(BlendEquation),
    BlendColor([f32; 4]),
    ColorMask(bool),
    SaveState,
    RestoreState,
}

impl ContextCall {
    /// Whether the call mutates fixed-function state.
    pub fn is_state_mutation(&self) -> bool {
        matches!(
            self,
            Self::SetCapability(..)
                | Self::DepthMask(_)
                | Self::DepthFunc(_)
                | Self::CullFace(_)
                | Self::FrontFace(_)
                | Self::PolygonOffset(..)
                | Self::StencilMask(_)
                | Self::StencilFunc(..)
                | Self::StencilOp(..)
                | Self::BlendFuncSeparate(_)
                | Self::BlendEquation(_)
                | Self::BlendColor(_)
                | Self::ColorMask(_)
                | Self::Scissor { .. }
        )
    }

    /// Whether the call is a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::DrawElements { .. } | Self::DrawArrays { .. })
    }

    /// Whether the call is a clear.
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear { .. })
    }
}

#[derive(Debug, Default)]
struct LogState {
    calls: Vec<ContextCall>,
    lost: bool,
    client_size: Option<Size>,
}

/// Shared handle to the calls recorded by a [`HeadlessContext`].
///
/// Cloning the handle shares the same log.
#[derive(Debug, Clone, Default)]
pub struct ContextLog {
    state: Rc<RefCell<LogState>>,
}

impl ContextLog {
    fn record(&self, call: ContextCall) {
        log::trace!("HeadlessContext: {:?}", call);
        self.state.borrow_mut().calls.push(call);
    }

    /// Snapshot of every recorded call.
    pub fn calls(&self) -> Vec<ContextCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.state.borrow().calls.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count the calls matching a predicate.
    pub fn count(&self, predicate: impl Fn(&ContextCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Number of fixed-function state mutations.
    pub fn state_mutations(&self) -> usize {
        self.count(ContextCall::is_state_mutation)
    }

    /// Number of draw calls.
    pub fn draw_calls(&self) -> usize {
        self.count(ContextCall::is_draw)
    }

    /// Number of clears.
    pub fn clears(&self) -> usize {
        self.count(ContextCall::is_clear)
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Simulate the loss of the context.
    pub fn lose_context(&self) {
        self.state.borrow_mut().lost = true;
    }

    fn is_lost(&self) -> bool {
        self.state.borrow().lost
    }

    /// Simulate the presentation surface being resized by the platform.
    pub fn resize_canvas(&self, width: u32, height: u32) {
        self.state.borrow_mut().client_size = Some(Size::new(width, height));
    }

    fn client_size(&self) -> Option<Size> {
        self.state.borrow().client_size
    }
}

#[derive(Debug)]
struct HeadlessShader {
    info: StageInfo,
}

#[derive(Debug)]
struct HeadlessProgram {
    status: LinkStatus,
    pending_polls: u32,
    attributes: Vec<(String, u32)>,
    uniforms: Vec<String>,
}

/// Recording no-op graphics context.
#[derive(Debug)]
pub struct HeadlessContext {
    log: ContextLog,
    capabilities: EngineCapabilities,
    size: Size,
    canvas_size: Size,
    next_id: u32,
    link_delay: u32,
    validate_shaders: bool,
    shaders: HashMap<ShaderId, HeadlessShader>,
    programs: HashMap<ProgramId, HeadlessProgram>,
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessContext {
    /// Create a context with the default capability set and a 1280x720
    /// drawing buffer.
    pub fn new() -> Self {
        Self {
            log: ContextLog::default(),
            capabilities: EngineCapabilities::default(),
            size: Size::new(1280, 720),
            canvas_size: Size::new(1280, 720),
            next_id: 1,
            link_delay: 0,
            validate_shaders: false,
            shaders: HashMap::new(),
            programs: HashMap::new(),
        }
    }

    /// Replace the capability set.
    pub fn with_capabilities(mut self, capabilities: EngineCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the drawing buffer size, and the canvas size with it.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Size::new(width, height);
        self.canvas_size = self.size;
        self
    }

    /// Report links as pending for the first `polls` status queries.
    pub fn with_deferred_linking(mut self, polls: u32) -> Self {
        self.link_delay = polls;
        self.capabilities.parallel_shader_compile = polls > 0;
        self
    }

    /// Parse and validate every compiled stage through naga.
    #[cfg(feature = "shader-validation")]
    pub fn with_shader_validation(mut self) -> Self {
        self.validate_shaders = true;
        self
    }

    /// Handle to the call log.
    pub fn log(&self) -> ContextLog {
        self.log.clone()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[cfg(feature = "shader-validation")]
    fn validate(&self, stage: ShaderStage, source: &str) -> Result<(), String> {
        if !self.validate_shaders {
            return Ok(());
        }
        let options = naga::front::glsl::Options {
            stage: match stage {
                ShaderStage::Vertex => naga::ShaderStage::Vertex,
                ShaderStage::Fragment => naga::ShaderStage::Fragment,
            },
            defines: naga::FastHashMap::default(),
        };
        let module = naga::front::glsl::Frontend::default()
            .parse(&options, source)
            .map_err(|errors| format!("GLSL parse error:\n{errors}"))?;
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| format!("Validation error: {e}"))?;
        Ok(())
    }

    #[cfg(not(feature = "shader-validation"))]
    fn validate(&self, _stage: ShaderStage, _source: &str) -> Result<(), String> {
        let _ = self.validate_shaders;
        Ok(())
    }
}

impl GraphicsContext for HeadlessContext {
    fn description(&self) -> String {
        "Headless (recording) context".to_string()
    }

    fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
    }

    fn drawing_buffer_size(&self) -> Size {
        self.size
    }

    fn set_drawing_buffer_size(&mut self, size: Size) {
        self.log.record(ContextCall::SetDrawingBufferSize(size));
        self.size = size;
    }

    fn canvas_client_size(&self) -> Size {
        self.log.client_size().unwrap_or(self.canvas_size)
    }

    fn is_context_lost(&self) -> bool {
        self.log.is_lost()
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        self.log.record(ContextCall::CompileShader(stage));
        self.validate(stage, source)?;
        let info = glsl::inspect(source, stage == ShaderStage::Vertex)?;
        let id = ShaderId(self.next_id());
        self.shaders.insert(id, HeadlessShader { info });
        Ok(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.log.record(ContextCall::DeleteShader(shader));
        self.shaders.remove(&shader);
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> ProgramId {
        let id = ProgramId(self.next_id());
        self.log.record(ContextCall::LinkProgram(id));

        let stages = (self.shaders.get(&vertex), self.shaders.get(&fragment));
        let program = match stages {
            (Some(vertex), Some(fragment)) if vertex.info.has_main && fragment.info.has_main => {
                let mut uniforms = vertex.info.uniforms.clone();
                for name in &fragment.info.uniforms {
                    if !uniforms.contains(name) {
                        uniforms.push(name.clone());
                    }
                }
                HeadlessProgram {
                    status: LinkStatus::Linked,
                    pending_polls: self.link_delay,
                    attributes: vertex.info.attributes.clone(),
                    uniforms,
                }
            }
            (Some(_), Some(_)) => HeadlessProgram {
                status: LinkStatus::Failed("missing entry point `main`".to_string()),
                pending_polls: self.link_delay,
                attributes: Vec::new(),
                uniforms: Vec::new(),
            },
            _ => HeadlessProgram {
                status: LinkStatus::Failed("invalid shader object".to_string()),
                pending_polls: 0,
                attributes: Vec::new(),
                uniforms: Vec::new(),
            },
        };
        self.programs.insert(id, program);
        id
    }

    fn link_status(&mut self, program: ProgramId) -> LinkStatus {
        match self.programs.get_mut(&program) {
            Some(program) if program.pending_polls > 0 => {
                program.pending_polls -= 1;
                LinkStatus::Pending
            }
            Some(program) => program.status.clone(),
            None => LinkStatus::Failed("invalid program object".to_string()),
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.log.record(ContextCall::DeleteProgram(program));
        self.programs.remove(&program);
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.log.record(ContextCall::UseProgram(program));
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs
            .get(&program)?
            .attributes
            .iter()
            .find(|(attribute, _)| attribute == name)
            .map(|(_, location)| *location)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let index = self
            .programs
            .get(&program)?
            .uniforms
            .iter()
            .position(|uniform| uniform == name)?;
        Some(UniformLocation(index as u32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.log.record(ContextCall::SetUniform(location, value.clone()));
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next_id());
        self.log.record(ContextCall::CreateBuffer(id));
        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.log.record(ContextCall::BindBuffer(target, buffer));
    }

    fn bind_buffer_base(&mut self, index: u32, buffer: Option<BufferId>) {
        self.log.record(ContextCall::BindBufferBase(index, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsageHint) {
        self.log.record(ContextCall::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.log.record(ContextCall::BufferSubData {
            target,
            offset,
            len: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.log.record(ContextCall::DeleteBuffer(buffer));
    }

    fn vertex_attrib_pointer(&mut self, location: u32, pointer: &AttribPointer) {
        self.log.record(ContextCall::VertexAttribPointer(location, *pointer));
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.log.record(ContextCall::EnableVertexAttribArray(location));
    }

    fn disable_vertex_attrib_array(&mut self, location: u32) {
        self.log.record(ContextCall::DisableVertexAttribArray(location));
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        self.log.record(ContextCall::VertexAttribDivisor(location, divisor));
    }

    fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.next_id());
        self.log.record(ContextCall::CreateTexture(id));
        id
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.log.record(ContextCall::DeleteTexture(texture));
    }

    fn active_texture(&mut self, unit: u32) {
        self.log.record(ContextCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>) {
        self.log.record(ContextCall::BindTexture(target, texture));
    }

    fn tex_image(&mut self, desc: &TexImageDesc, data: Option<&[u8]>) {
        self.log.record(ContextCall::TexImage {
            desc: *desc,
            data: data.map(<[u8]>::to_vec),
        });
    }

    fn tex_parameters(&mut self, target: TextureTarget, sampling: SamplingParameters, wrap: WrapMode) {
        self.log.record(ContextCall::TexParameters {
            target,
            sampling,
            wrap,
        });
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        self.log.record(ContextCall::GenerateMipmap(target));
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.next_id());
        self.log.record(ContextCall::CreateVertexArray(id));
        id
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.log.record(ContextCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.log.record(ContextCall::DeleteVertexArray(vertex_array));
    }

    fn create_framebuffer(&mut self) -> FramebufferId {
        let id = FramebufferId(self.next_id());
        self.log.record(ContextCall::CreateFramebuffer(id));
        id
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.log.record(ContextCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.log.record(ContextCall::BindFramebuffer(framebuffer));
    }

    fn framebuffer_texture(
        &mut self,
        attachment: FramebufferAttachment,
        target: TexImageTarget,
        texture: Option<TextureId>,
    ) {
        self.log.record(ContextCall::FramebufferTexture {
            attachment,
            target,
            texture,
        });
    }

    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        width: u32,
        height: u32,
    ) -> RenderbufferId {
        let renderbuffer = RenderbufferId(self.next_id());
        self.log.record(ContextCall::CreateRenderbuffer {
            renderbuffer,
            format,
            width,
            height,
        });
        renderbuffer
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        self.log.record(ContextCall::DeleteRenderbuffer(renderbuffer));
    }

    fn framebuffer_renderbuffer(
        &mut self,
        attachment: FramebufferAttachment,
        renderbuffer: Option<RenderbufferId>,
    ) {
        self.log.record(ContextCall::FramebufferRenderbuffer {
            attachment,
            renderbuffer,
        });
    }

    fn flush(&mut self) {
        self.log.record(ContextCall::Flush);
    }

    fn draw_elements(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        index_type: IndexType,
        offset: u32,
        instances: Option<u32>,
    ) {
        self.log.record(ContextCall::DrawElements {
            mode,
            count,
            index_type,
            offset,
            instances,
        });
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32, instances: Option<u32>) {
        self.log.record(ContextCall::DrawArrays {
            mode,
            first,
            count,
            instances,
        });
    }

    fn clear(&mut self, mask: ClearMask, color: [f32; 4], depth: f32, stencil: i32) {
        self.log.record(ContextCall::Clear {
            mask,
            color,
            depth,
            stencil,
        });
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.log.record(ContextCall::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn scissor(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.log.record(ContextCall::Scissor {
            x,
            y,
            width,
            height,
        });
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.log.record(ContextCall::SetCapability(capability, enabled));
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.log.record(ContextCall::DepthMask(enabled));
    }

    fn depth_func(&mut self, func: CompareFunction) {
        self.log.record(ContextCall::DepthFunc(func));
    }

    fn cull_face(&mut self, face: CullFace) {
        self.log.record(ContextCall::CullFace(face));
    }

    fn front_face(&mut self, face: FrontFace) {
        self.log.record(ContextCall::FrontFace(face));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.log.record(ContextCall::PolygonOffset(factor, units));
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.log.record(ContextCall::StencilMask(mask));
    }

    fn stencil_func(&mut self, func: CompareFunction, reference: i32, mask: u32) {
        self.log.record(ContextCall::StencilFunc(func, reference, mask));
    }

    fn stencil_op(&mut self, fail: StencilOperation, depth_fail: StencilOperation, pass: StencilOperation) {
        self.log.record(ContextCall::StencilOp(fail, depth_fail, pass));
    }

    fn blend_func_separate(&mut self, functions: BlendFunctions) {
        self.log.record(ContextCall::BlendFuncSeparate(functions));
    }

    fn blend_equation(&mut self, equation: BlendEquation) {
        self.log.record(ContextCall::BlendEquation(equation));
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        self.log.record(ContextCall::BlendColor(color));
    }

    fn color_mask(&mut self, enabled: bool) {
        self.log.record(ContextCall::ColorMask(enabled));
    }

    fn save_state(&mut self) {
        self.log.record(ContextCall::SaveState);
    }

    fn restore_state(&mut self) {
        self.log.record(ContextCall::RestoreState);
    }
}
