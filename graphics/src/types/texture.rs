//! Texture types and descriptors.

use serde::{Deserialize, Serialize};

/// Pixel format of texture data as uploaded to the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// Single alpha channel.
    Alpha,
    /// Single luminance channel.
    Luminance,
    /// Luminance and alpha channels.
    LuminanceAlpha,
    /// Red, green and blue channels.
    Rgb,
    /// Red, green, blue and alpha channels.
    #[default]
    Rgba,
}

impl TextureFormat {
    /// Number of components per pixel.
    pub fn components(&self) -> usize {
        match self {
            Self::Alpha | Self::Luminance => 1,
            Self::LuminanceAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Component type of texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureType {
    /// 8-bit unsigned normalized components.
    #[default]
    UnsignedByte,
    /// 32-bit float components.
    Float,
    /// 16-bit float components.
    HalfFloat,
}

impl TextureType {
    /// Size of one component in bytes.
    pub fn component_size(&self) -> usize {
        match self {
            Self::UnsignedByte => 1,
            Self::HalfFloat => 2,
            Self::Float => 4,
        }
    }

    /// Returns true for float and half-float types.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, Self::Float | Self::HalfFloat)
    }
}

// ============================================================================
// Sampling
// ============================================================================

/// High-level texture sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SamplingMode {
    /// Point sampling.
    Nearest,
    /// Linear filtering within a mip level.
    Bilinear,
    /// Linear filtering across mip levels.
    #[default]
    Trilinear,
}

/// Low-level texture filter as understood by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Linear interpolation.
    Linear,
    /// Nearest texel, linear between mip levels.
    NearestMipmapLinear,
    /// Linear within a level, nearest mip level.
    LinearMipmapNearest,
    /// Linear within a level and between levels.
    LinearMipmapLinear,
}

/// Texture coordinate wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Repeat the texture.
    #[default]
    Repeat,
    /// Clamp to the edge texel.
    ClampToEdge,
    /// Mirror on every repetition.
    MirroredRepeat,
}

/// Resolved magnification/minification filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplingParameters {
    /// Magnification filter.
    pub mag: FilterMode,
    /// Minification filter.
    pub min: FilterMode,
}

impl SamplingParameters {
    /// Derive the filters for a sampling mode, with or without mip maps.
    pub fn new(mode: SamplingMode, mipmaps: bool) -> Self {
        let (mag, min, min_mipmapped) = match mode {
            SamplingMode::Nearest => (
                FilterMode::Nearest,
                FilterMode::Nearest,
                FilterMode::NearestMipmapLinear,
            ),
            SamplingMode::Bilinear => (
                FilterMode::Linear,
                FilterMode::Linear,
                FilterMode::LinearMipmapNearest,
            ),
            SamplingMode::Trilinear => (
                FilterMode::Linear,
                FilterMode::Linear,
                FilterMode::LinearMipmapLinear,
            ),
        };
        Self {
            mag,
            min: if mipmaps { min_mipmapped } else { min },
        }
    }
}

// ============================================================================
// Targets and uploads
// ============================================================================

/// Texture binding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    /// 2D texture.
    #[default]
    Texture2d,
    /// Cube map.
    CubeMap,
}

/// Image target of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexImageTarget {
    /// The 2D texture image.
    Texture2d,
    /// One cube face, `0..6` in the order +X, -X, +Y, -Y, +Z, -Z.
    CubeFace(u32),
}

/// Description of a single image upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TexImageDesc {
    /// Target image.
    pub target: TexImageTarget,
    /// Mip level.
    pub level: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: TextureFormat,
    /// Component type.
    pub texture_type: TextureType,
}

/// Already-decoded pixel data.
///
/// Image decoding is outside this crate: callers hand over raw bytes in the
/// declared format and type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: TextureFormat,
    /// Component type.
    pub texture_type: TextureType,
    /// Raw pixel bytes, row-major, bottom row last.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Create RGBA8 texture data.
    pub fn rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba,
            texture_type: TextureType::UnsignedByte,
            pixels,
        }
    }

    /// Expected byte length for the declared dimensions, format and type.
    pub fn expected_len(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.format.components()
            * self.texture_type.component_size()
    }
}

// ============================================================================
// Render targets
// ============================================================================

/// Options for render target creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetOptions {
    /// Generate mip maps after rendering.
    pub generate_mip_maps: bool,
    /// Attach a depth buffer.
    pub generate_depth_buffer: bool,
    /// Attach a stencil buffer.
    pub generate_stencil_buffer: bool,
    /// Requested component type (may degrade).
    pub texture_type: TextureType,
    /// Sampling mode (may be forced to nearest for float targets).
    pub sampling_mode: SamplingMode,
}

impl Default for RenderTargetOptions {
    fn default() -> Self {
        Self {
            generate_mip_maps: false,
            generate_depth_buffer: true,
            generate_stencil_buffer: false,
            texture_type: TextureType::UnsignedByte,
            sampling_mode: SamplingMode::Trilinear,
        }
    }
}

impl RenderTargetOptions {
    /// Set the component type.
    pub fn with_texture_type(mut self, texture_type: TextureType) -> Self {
        self.texture_type = texture_type;
        self
    }

    /// Set the sampling mode.
    pub fn with_sampling_mode(mut self, sampling_mode: SamplingMode) -> Self {
        self.sampling_mode = sampling_mode;
        self
    }

    /// Enable mip map generation.
    pub fn with_mip_maps(mut self) -> Self {
        self.generate_mip_maps = true;
        self
    }

    /// Enable the stencil buffer.
    pub fn with_stencil(mut self) -> Self {
        self.generate_stencil_buffer = true;
        self
    }

    /// Disable the depth buffer.
    pub fn without_depth(mut self) -> Self {
        self.generate_depth_buffer = false;
        self
    }
}

/// Storage format of a renderbuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    /// 16-bit depth.
    Depth16,
    /// Packed depth and stencil.
    DepthStencil,
}

/// Framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferAttachment {
    /// First color attachment.
    Color0,
    /// Depth attachment.
    Depth,
    /// Combined depth/stencil attachment.
    DepthStencil,
}
