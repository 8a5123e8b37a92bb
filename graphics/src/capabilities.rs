//! Context capabilities and the fallbacks derived from them.

use crate::types::{SamplingMode, TextureType};

/// Capabilities reported by a [`GraphicsContext`](crate::GraphicsContext).
///
/// Optional engine paths consult these flags; missing features either fall
/// back (render target types, instanced draws) or fail with
/// [`GraphicsError::CapabilityUnavailable`](crate::GraphicsError::CapabilityUnavailable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineCapabilities {
    /// Number of texture units usable from fragment shaders.
    pub max_texture_image_units: u32,
    /// Largest 2D texture dimension.
    pub max_texture_size: u32,
    /// Largest cube map face dimension.
    pub max_cubemap_texture_size: u32,
    /// Largest renderbuffer dimension.
    pub max_render_texture_size: u32,
    /// Number of vertex attribute slots.
    pub max_vertex_attribs: u32,
    /// Float textures can be sampled.
    pub texture_float: bool,
    /// Half-float textures can be sampled.
    pub texture_half_float: bool,
    /// Float textures support linear filtering.
    pub texture_float_linear_filtering: bool,
    /// Half-float textures support linear filtering.
    pub texture_half_float_linear_filtering: bool,
    /// Float textures can be rendered to.
    pub texture_float_render: bool,
    /// Half-float textures can be rendered to.
    pub texture_half_float_render: bool,
    /// 32-bit index buffers.
    pub element_index_uint: bool,
    /// Instanced draws and attribute divisors.
    pub instanced_arrays: bool,
    /// Uniform buffer objects.
    pub uniform_buffer_objects: bool,
    /// Program linking completes asynchronously.
    pub parallel_shader_compile: bool,
    /// Vertex array objects.
    pub vertex_array_objects: bool,
}

impl Default for EngineCapabilities {
    fn default() -> Self {
        Self {
            max_texture_image_units: 16,
            max_texture_size: 16384,
            max_cubemap_texture_size: 16384,
            max_render_texture_size: 16384,
            max_vertex_attribs: 16,
            texture_float: true,
            texture_half_float: true,
            texture_float_linear_filtering: true,
            texture_half_float_linear_filtering: true,
            texture_float_render: true,
            texture_half_float_render: true,
            element_index_uint: true,
            instanced_arrays: true,
            uniform_buffer_objects: true,
            parallel_shader_compile: false,
            vertex_array_objects: true,
        }
    }
}

impl EngineCapabilities {
    /// A minimal capability set: no float targets, no 32-bit indices, no
    /// instancing, no uniform buffers and no vertex array objects.
    pub fn minimal() -> Self {
        Self {
            max_texture_image_units: 8,
            max_texture_size: 2048,
            max_cubemap_texture_size: 1024,
            max_render_texture_size: 2048,
            max_vertex_attribs: 8,
            texture_float: false,
            texture_half_float: false,
            texture_float_linear_filtering: false,
            texture_half_float_linear_filtering: false,
            texture_float_render: false,
            texture_half_float_render: false,
            element_index_uint: false,
            instanced_arrays: false,
            uniform_buffer_objects: false,
            parallel_shader_compile: false,
            vertex_array_objects: false,
        }
    }

    /// Resolve the component type actually used for a render target.
    ///
    /// Float degrades to half-float, half-float degrades to unsigned byte.
    pub fn render_target_type(&self, requested: TextureType) -> TextureType {
        let mut texture_type = requested;
        if texture_type == TextureType::Float && !self.texture_float_render {
            texture_type = TextureType::HalfFloat;
        }
        if texture_type == TextureType::HalfFloat && !self.texture_half_float_render {
            texture_type = TextureType::UnsignedByte;
        }
        texture_type
    }

    /// Resolve the sampling mode usable with a texture type.
    ///
    /// Float and half-float textures without linear filtering support are
    /// forced to nearest sampling.
    pub fn sampling_mode_for(&self, texture_type: TextureType, requested: SamplingMode) -> SamplingMode {
        let linear = match texture_type {
            TextureType::Float => self.texture_float_linear_filtering,
            TextureType::HalfFloat => self.texture_half_float_linear_filtering,
            TextureType::UnsignedByte => true,
        };
        if linear {
            requested
        } else {
            SamplingMode::Nearest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_target_type_chain() {
        let mut caps = EngineCapabilities::default();
        assert_eq!(caps.render_target_type(TextureType::Float), TextureType::Float);

        caps.texture_float_render = false;
        assert_eq!(
            caps.render_target_type(TextureType::Float),
            TextureType::HalfFloat
        );

        caps.texture_half_float_render = false;
        assert_eq!(
            caps.render_target_type(TextureType::Float),
            TextureType::UnsignedByte
        );
        assert_eq!(
            caps.render_target_type(TextureType::HalfFloat),
            TextureType::UnsignedByte
        );
    }

    #[test]
    fn test_sampling_forced_to_nearest() {
        let caps = EngineCapabilities::minimal();
        assert_eq!(
            caps.sampling_mode_for(TextureType::Float, SamplingMode::Trilinear),
            SamplingMode::Nearest
        );
        assert_eq!(
            caps.sampling_mode_for(TextureType::UnsignedByte, SamplingMode::Bilinear),
            SamplingMode::Bilinear
        );
    }
}
