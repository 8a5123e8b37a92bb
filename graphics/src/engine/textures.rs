//! Texture creation, update and release.

use std::borrow::Cow;

use super::Engine;
use crate::context::TextureId;
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{InternalTexture, TextureHandle, TextureSource};
use crate::types::{
    FramebufferAttachment, RenderTargetOptions, RenderbufferFormat, SamplingMode,
    SamplingParameters, Size, TexImageDesc, TexImageTarget, TextureData, TextureFormat,
    TextureTarget, TextureType, WrapMode,
};

/// Number of faces of a cube map.
pub const CUBE_FACES: u32 = 6;

impl Engine {
    /// Create a 2D texture from decoded pixels.
    pub fn create_texture(
        &mut self,
        data: &TextureData,
        no_mipmap: bool,
        invert_y: bool,
        sampling_mode: SamplingMode,
    ) -> GraphicsResult<TextureHandle> {
        let handle = self.create_raw_texture(
            Some(&data.pixels),
            data.width,
            data.height,
            data.format,
            !no_mipmap,
            invert_y,
            sampling_mode,
            data.texture_type,
        )?;
        if let Some(texture) = self.textures.get_mut(handle) {
            texture.source = TextureSource::Data;
        }
        Ok(handle)
    }

    /// Create a 2D texture from raw pixels, or allocate it when `data` is
    /// `None`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_raw_texture(
        &mut self,
        data: Option<&[u8]>,
        width: u32,
        height: u32,
        format: TextureFormat,
        generate_mip_maps: bool,
        invert_y: bool,
        sampling_mode: SamplingMode,
        texture_type: TextureType,
    ) -> GraphicsResult<TextureHandle> {
        self.ensure_context()?;
        validate_size(width, height, self.caps.max_texture_size)?;

        let sampling_mode = self.caps.sampling_mode_for(texture_type, sampling_mode);
        let id = self.context.create_texture();
        let mut texture = InternalTexture::new(id, TextureSource::Raw, width, height);
        texture.texture_type = texture_type;
        texture.sampling_mode = sampling_mode;
        texture.generate_mip_maps = generate_mip_maps;
        texture.invert_y = invert_y;

        if let Err(err) = self.upload_texture(&mut texture, TexImageTarget::Texture2d, data, format) {
            self.context.delete_texture(id);
            return Err(err);
        }
        self.finish_texture(&texture, WrapMode::Repeat);
        texture.is_ready = data.is_some();
        Ok(self.register_texture(texture))
    }

    /// Replace the pixels of a raw texture.
    pub fn update_raw_texture(
        &mut self,
        handle: TextureHandle,
        data: &[u8],
        format: TextureFormat,
        invert_y: bool,
        texture_type: TextureType,
    ) -> GraphicsResult<()> {
        let mut texture = self
            .textures
            .get(handle)
            .cloned()
            .ok_or(GraphicsError::InvalidHandle("texture"))?;
        texture.invert_y = invert_y;
        texture.texture_type = texture_type;

        self.upload_texture(&mut texture, TexImageTarget::Texture2d, Some(data), format)?;
        self.finish_upload(&texture);
        texture.is_ready = true;
        self.textures[handle] = texture;
        Ok(())
    }

    /// Create an RGBA8 texture whose content is supplied later.
    pub fn create_dynamic_texture(
        &mut self,
        width: u32,
        height: u32,
        generate_mip_maps: bool,
        sampling_mode: SamplingMode,
    ) -> GraphicsResult<TextureHandle> {
        self.ensure_context()?;
        validate_size(width, height, self.caps.max_texture_size)?;

        let id = self.context.create_texture();
        let mut texture = InternalTexture::new(id, TextureSource::Dynamic, width, height);
        texture.sampling_mode = sampling_mode;
        texture.generate_mip_maps = generate_mip_maps;

        self.bind_texture_for_upload(TextureTarget::Texture2d, id);
        self.context.tex_parameters(
            TextureTarget::Texture2d,
            SamplingParameters::new(sampling_mode, generate_mip_maps),
            WrapMode::ClampToEdge,
        );
        self.unbind_upload(TextureTarget::Texture2d);
        Ok(self.register_texture(texture))
    }

    /// Upload the content of a dynamic texture.
    pub fn update_dynamic_texture(
        &mut self,
        handle: TextureHandle,
        pixels: &[u8],
        invert_y: bool,
        format: TextureFormat,
    ) -> GraphicsResult<()> {
        let mut texture = self
            .textures
            .get(handle)
            .cloned()
            .ok_or(GraphicsError::InvalidHandle("texture"))?;
        texture.invert_y = invert_y;

        self.upload_texture(&mut texture, TexImageTarget::Texture2d, Some(pixels), format)?;
        self.finish_upload(&texture);
        texture.is_ready = true;
        self.textures[handle] = texture;
        Ok(())
    }

    /// Create a 2D render target with its framebuffer.
    ///
    /// The requested component type degrades (float, half-float, unsigned
    /// byte) to what the context can render to, and float targets without
    /// linear filtering support are sampled with nearest filtering.
    pub fn create_render_target_texture(
        &mut self,
        size: Size,
        options: RenderTargetOptions,
    ) -> GraphicsResult<TextureHandle> {
        self.ensure_context()?;
        let max = self.caps.max_render_texture_size.min(self.caps.max_texture_size);
        validate_size(size.width, size.height, max)?;

        let (texture_type, sampling_mode) = self.resolve_render_target(&options);
        let id = self.context.create_texture();
        let mut texture = InternalTexture::new(id, TextureSource::RenderTarget, size.width, size.height);
        texture.texture_type = texture_type;
        texture.sampling_mode = sampling_mode;
        texture.generate_mip_maps = options.generate_mip_maps;

        self.bind_texture_for_upload(TextureTarget::Texture2d, id);
        self.context.tex_parameters(
            TextureTarget::Texture2d,
            SamplingParameters::new(sampling_mode, options.generate_mip_maps),
            WrapMode::ClampToEdge,
        );
        self.context.tex_image(
            &TexImageDesc {
                target: TexImageTarget::Texture2d,
                level: 0,
                width: size.width,
                height: size.height,
                format: TextureFormat::Rgba,
                texture_type,
            },
            None,
        );

        let framebuffer = self.context.create_framebuffer();
        self.context.bind_framebuffer(Some(framebuffer));
        self.context.framebuffer_texture(
            FramebufferAttachment::Color0,
            TexImageTarget::Texture2d,
            Some(id),
        );
        texture.framebuffer = Some(framebuffer);
        texture.depth_stencil_buffer = self.attach_depth_stencil(&options, size);

        if options.generate_mip_maps {
            self.context.generate_mipmap(TextureTarget::Texture2d);
        }
        self.unbind_upload(TextureTarget::Texture2d);
        self.context.bind_framebuffer(self.bindings.framebuffer);

        texture.is_ready = true;
        Ok(self.register_texture(texture))
    }

    /// Create a cube render target; faces are attached when bound.
    pub fn create_render_target_cube_texture(
        &mut self,
        size: u32,
        options: RenderTargetOptions,
    ) -> GraphicsResult<TextureHandle> {
        self.ensure_context()?;
        validate_size(size, size, self.caps.max_cubemap_texture_size)?;

        let (texture_type, sampling_mode) = self.resolve_render_target(&options);
        let id = self.context.create_texture();
        let mut texture = InternalTexture::new(id, TextureSource::CubeRenderTarget, size, size);
        texture.texture_type = texture_type;
        texture.sampling_mode = sampling_mode;
        texture.generate_mip_maps = options.generate_mip_maps;

        self.bind_texture_for_upload(TextureTarget::CubeMap, id);
        self.context.tex_parameters(
            TextureTarget::CubeMap,
            SamplingParameters::new(sampling_mode, options.generate_mip_maps),
            WrapMode::ClampToEdge,
        );
        for face in 0..CUBE_FACES {
            self.context.tex_image(
                &TexImageDesc {
                    target: TexImageTarget::CubeFace(face),
                    level: 0,
                    width: size,
                    height: size,
                    format: TextureFormat::Rgba,
                    texture_type,
                },
                None,
            );
        }

        let framebuffer = self.context.create_framebuffer();
        self.context.bind_framebuffer(Some(framebuffer));
        texture.framebuffer = Some(framebuffer);
        texture.depth_stencil_buffer = self.attach_depth_stencil(&options, Size::square(size));

        if options.generate_mip_maps {
            self.context.generate_mipmap(TextureTarget::CubeMap);
        }
        self.unbind_upload(TextureTarget::CubeMap);
        self.context.bind_framebuffer(self.bindings.framebuffer);

        texture.is_ready = true;
        Ok(self.register_texture(texture))
    }

    /// Create a cube map from six faces (+X, -X, +Y, -Y, +Z, -Z).
    pub fn create_cube_texture(
        &mut self,
        faces: &[&[u8]],
        size: u32,
        format: TextureFormat,
        no_mipmap: bool,
    ) -> GraphicsResult<TextureHandle> {
        self.ensure_context()?;
        validate_size(size, size, self.caps.max_cubemap_texture_size)?;
        if faces.len() != CUBE_FACES as usize {
            return Err(GraphicsError::ResourceCreation(format!(
                "cube texture needs {} faces, got {}",
                CUBE_FACES,
                faces.len()
            )));
        }

        let id = self.context.create_texture();
        let mut texture = InternalTexture::new(id, TextureSource::Cube, size, size);
        texture.generate_mip_maps = !no_mipmap;

        for (face, pixels) in faces.iter().enumerate() {
            let target = TexImageTarget::CubeFace(face as u32);
            if let Err(err) = self.upload_texture(&mut texture, target, Some(pixels), format) {
                self.context.delete_texture(id);
                self.reset_texture_cache();
                return Err(err);
            }
        }
        self.finish_texture(&texture, WrapMode::ClampToEdge);
        texture.is_ready = true;
        Ok(self.register_texture(texture))
    }

    /// Change the sampling mode of a texture.
    pub fn update_texture_sampling_mode(
        &mut self,
        mode: SamplingMode,
        handle: TextureHandle,
    ) -> GraphicsResult<()> {
        let texture = self
            .textures
            .get(handle)
            .ok_or(GraphicsError::InvalidHandle("texture"))?;
        let (id, target, texture_type, mipmaps) = (
            texture.id,
            texture.target(),
            texture.texture_type,
            texture.generate_mip_maps,
        );
        let wrap = wrap_mode_for(texture);
        let mode = self.caps.sampling_mode_for(texture_type, mode);

        self.bind_texture_for_upload(target, id);
        self.context
            .tex_parameters(target, SamplingParameters::new(mode, mipmaps), wrap);
        self.unbind_upload(target);
        self.textures[handle].sampling_mode = mode;
        Ok(())
    }

    /// Record a new size for a texture whose storage was reallocated.
    pub fn update_texture_size(&mut self, handle: TextureHandle, width: u32, height: u32) -> GraphicsResult<()> {
        validate_size(width, height, self.caps.max_texture_size)?;
        let texture = self
            .textures
            .get_mut(handle)
            .ok_or(GraphicsError::InvalidHandle("texture"))?;
        texture.width = width;
        texture.height = height;
        Ok(())
    }

    /// Release a texture with its framebuffer and depth/stencil buffer.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidHandle`] if the texture was already released;
    /// the loaded-texture set is left untouched.
    pub fn release_texture(&mut self, handle: TextureHandle) -> GraphicsResult<()> {
        let texture = self
            .textures
            .remove(handle)
            .ok_or(GraphicsError::InvalidHandle("texture"))?;

        if let Some(framebuffer) = texture.framebuffer {
            if self.bindings.framebuffer == Some(framebuffer) {
                self.context.bind_framebuffer(None);
                self.bindings.framebuffer = None;
            }
            if self.bindings.previous_framebuffer == Some(framebuffer) {
                self.bindings.previous_framebuffer = None;
            }
            self.context.delete_framebuffer(framebuffer);
        }
        if let Some(renderbuffer) = texture.depth_stencil_buffer {
            self.context.delete_renderbuffer(renderbuffer);
        }
        self.context.delete_texture(texture.id);

        for unit in self.bindings.bound_textures.iter_mut() {
            if unit.is_some_and(|(_, id)| id == texture.id) {
                *unit = None;
            }
        }
        if self.bindings.current_render_target == Some(handle) {
            self.bindings.current_render_target = None;
        }
        self.loaded_textures.retain(|&loaded| loaded != handle);

        log::debug!("Engine: released texture {:?}", handle);
        Ok(())
    }

    /// Look up a texture record.
    pub fn texture(&self, handle: TextureHandle) -> Option<&InternalTexture> {
        self.textures.get(handle)
    }

    /// Textures currently loaded, in creation order.
    pub fn loaded_textures(&self) -> &[TextureHandle] {
        &self.loaded_textures
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn register_texture(&mut self, texture: InternalTexture) -> TextureHandle {
        let description = (texture.source, texture.width, texture.height, texture.texture_type);
        let handle = self.textures.insert(texture);
        self.loaded_textures.push(handle);
        self.reset_texture_cache();
        log::debug!(
            "Engine: created {:?} texture {:?} ({}x{}, {:?})",
            description.0,
            handle,
            description.1,
            description.2,
            description.3
        );
        handle
    }

    fn resolve_render_target(&self, options: &RenderTargetOptions) -> (TextureType, SamplingMode) {
        let texture_type = self.caps.render_target_type(options.texture_type);
        if texture_type != options.texture_type {
            log::warn!(
                "Engine: {:?} render targets are not supported, falling back to {:?}",
                options.texture_type,
                texture_type
            );
        }
        let sampling_mode = self.caps.sampling_mode_for(texture_type, options.sampling_mode);
        if sampling_mode != options.sampling_mode {
            log::warn!(
                "Engine: linear filtering unavailable for {:?} targets, using nearest sampling",
                texture_type
            );
        }
        (texture_type, sampling_mode)
    }

    fn attach_depth_stencil(
        &mut self,
        options: &RenderTargetOptions,
        size: Size,
    ) -> Option<crate::context::RenderbufferId> {
        let (format, attachment) = if options.generate_stencil_buffer {
            (RenderbufferFormat::DepthStencil, FramebufferAttachment::DepthStencil)
        } else if options.generate_depth_buffer {
            (RenderbufferFormat::Depth16, FramebufferAttachment::Depth)
        } else {
            return None;
        };
        let renderbuffer = self
            .context
            .create_renderbuffer(format, size.width, size.height);
        self.context
            .framebuffer_renderbuffer(attachment, Some(renderbuffer));
        Some(renderbuffer)
    }

    /// Upload one image of `texture`, after row flipping and RGB padding.
    fn upload_texture(
        &mut self,
        texture: &mut InternalTexture,
        target: TexImageTarget,
        data: Option<&[u8]>,
        format: TextureFormat,
    ) -> GraphicsResult<()> {
        let (pixels, format) = match data {
            Some(data) => {
                let (pixels, format) = prepare_pixels(
                    data,
                    texture.width,
                    texture.height,
                    format,
                    texture.texture_type,
                    texture.invert_y,
                )?;
                (Some(pixels), format)
            }
            None => (None, format),
        };

        let texture_target = texture.target();
        self.bind_texture_for_upload(texture_target, texture.id);
        self.context.tex_image(
            &TexImageDesc {
                target,
                level: 0,
                width: texture.width,
                height: texture.height,
                format,
                texture_type: texture.texture_type,
            },
            pixels.as_deref(),
        );
        texture.format = format;
        Ok(())
    }

    fn finish_texture(&mut self, texture: &InternalTexture, wrap: WrapMode) {
        let target = texture.target();
        self.context.tex_parameters(
            target,
            SamplingParameters::new(texture.sampling_mode, texture.generate_mip_maps),
            wrap,
        );
        self.finish_upload(texture);
    }

    fn finish_upload(&mut self, texture: &InternalTexture) {
        let target = texture.target();
        if texture.generate_mip_maps {
            self.context.generate_mipmap(target);
        }
        self.unbind_upload(target);
    }

    fn bind_texture_for_upload(&mut self, target: TextureTarget, id: TextureId) {
        self.context.active_texture(0);
        self.context.bind_texture(target, Some(id));
        self.bindings.active_texture_unit = Some(0);
        if let Some(unit) = self.bindings.bound_textures.first_mut() {
            *unit = Some((target, id));
        }
    }

    fn unbind_upload(&mut self, target: TextureTarget) {
        self.context.bind_texture(target, None);
        self.reset_texture_cache();
    }
}

fn wrap_mode_for(texture: &InternalTexture) -> WrapMode {
    match texture.source {
        TextureSource::Data | TextureSource::Raw => WrapMode::Repeat,
        _ => WrapMode::ClampToEdge,
    }
}

fn validate_size(width: u32, height: u32, max: u32) -> GraphicsResult<()> {
    if width == 0 || height == 0 {
        return Err(GraphicsError::ResourceCreation(format!(
            "texture size {width}x{height} has a zero dimension"
        )));
    }
    if width > max || height > max {
        return Err(GraphicsError::ResourceCreation(format!(
            "texture size {width}x{height} exceeds the maximum of {max}"
        )));
    }
    Ok(())
}

/// Validate the pixel buffer, flip rows when `invert_y` and pad float RGB
/// data to RGBA with an alpha of one.
fn prepare_pixels(
    data: &[u8],
    width: u32,
    height: u32,
    format: TextureFormat,
    texture_type: TextureType,
    invert_y: bool,
) -> GraphicsResult<(Cow<'_, [u8]>, TextureFormat)> {
    let component_size = texture_type.component_size();
    let row_len = width as usize * format.components() * component_size;
    let expected = row_len * height as usize;
    if data.len() != expected {
        return Err(GraphicsError::ResourceCreation(format!(
            "expected {} bytes of {:?} {:?} pixels for {}x{}, got {}",
            expected,
            format,
            texture_type,
            width,
            height,
            data.len()
        )));
    }

    let mut pixels = Cow::Borrowed(data);
    if invert_y {
        let flipped: Vec<u8> = data.chunks_exact(row_len).rev().flatten().copied().collect();
        pixels = Cow::Owned(flipped);
    }

    if format == TextureFormat::Rgb && texture_type.is_floating_point() {
        let one: &[u8] = match texture_type {
            TextureType::Float => &[0x00, 0x00, 0x80, 0x3F],
            _ => &[0x00, 0x3C],
        };
        let texel = 3 * component_size;
        let mut padded = Vec::with_capacity(pixels.len() / 3 * 4);
        for rgb in pixels.chunks_exact(texel) {
            padded.extend_from_slice(rgb);
            padded.extend_from_slice(one);
        }
        return Ok((Cow::Owned(padded), TextureFormat::Rgba));
    }

    Ok((pixels, format))
}
