//! GPU texture record.

use crate::context::{FramebufferId, RenderbufferId, TextureId};
use crate::types::{SamplingMode, TextureFormat, TextureTarget, TextureType};

/// How a texture was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// Uploaded from decoded image data.
    Data,
    /// Uploaded from raw pixels; can be updated.
    Raw,
    /// Content supplied every frame by the caller.
    Dynamic,
    /// 2D render target.
    RenderTarget,
    /// Cube render target.
    CubeRenderTarget,
    /// Cube map uploaded from six faces.
    Cube,
}

/// A texture created on the context, with the framebuffer objects of render
/// targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalTexture {
    pub(crate) id: TextureId,
    pub(crate) source: TextureSource,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: TextureFormat,
    pub(crate) texture_type: TextureType,
    pub(crate) sampling_mode: SamplingMode,
    pub(crate) generate_mip_maps: bool,
    pub(crate) invert_y: bool,
    pub(crate) framebuffer: Option<FramebufferId>,
    pub(crate) depth_stencil_buffer: Option<RenderbufferId>,
    pub(crate) is_ready: bool,
}

impl InternalTexture {
    pub(crate) fn new(id: TextureId, source: TextureSource, width: u32, height: u32) -> Self {
        Self {
            id,
            source,
            width,
            height,
            format: TextureFormat::Rgba,
            texture_type: TextureType::UnsignedByte,
            sampling_mode: SamplingMode::Trilinear,
            generate_mip_maps: false,
            invert_y: false,
            framebuffer: None,
            depth_stencil_buffer: None,
            is_ready: false,
        }
    }

    /// Context-side name.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// How the texture was created.
    pub fn source(&self) -> TextureSource {
        self.source
    }

    /// Binding target.
    pub fn target(&self) -> TextureTarget {
        if self.is_cube() {
            TextureTarget::CubeMap
        } else {
            TextureTarget::Texture2d
        }
    }

    /// Whether this is a cube map.
    pub fn is_cube(&self) -> bool {
        matches!(
            self.source,
            TextureSource::Cube | TextureSource::CubeRenderTarget
        )
    }

    /// Whether this texture can be bound as a framebuffer.
    pub fn is_render_target(&self) -> bool {
        matches!(
            self.source,
            TextureSource::RenderTarget | TextureSource::CubeRenderTarget
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Component type actually used (after capability fallbacks).
    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    /// Sampling mode actually used (after capability fallbacks).
    pub fn sampling_mode(&self) -> SamplingMode {
        self.sampling_mode
    }

    pub fn generate_mip_maps(&self) -> bool {
        self.generate_mip_maps
    }

    pub fn invert_y(&self) -> bool {
        self.invert_y
    }

    /// Framebuffer of a render target.
    pub fn framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    /// Depth/stencil renderbuffer of a render target.
    pub fn depth_stencil_buffer(&self) -> Option<RenderbufferId> {
        self.depth_stencil_buffer
    }

    /// Whether content has been uploaded.
    pub fn is_ready(&self) -> bool {
        self.is_ready
    }
}
