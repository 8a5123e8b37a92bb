//! Render target binding.

use super::Engine;
use crate::context::FramebufferId;
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::TextureHandle;
use crate::types::{FramebufferAttachment, TexImageTarget};

/// Callback run by [`Engine::unbind_framebuffer`] while the render target is
/// still bound.
pub type BeforeUnbindCallback<'a> = &'a mut dyn FnMut(&mut Engine);

impl Engine {
    /// Render into `texture`.
    ///
    /// Cube targets attach `face_index` (default +X) first. The viewport
    /// covers the required size, or the texture size.
    pub fn bind_framebuffer(
        &mut self,
        texture: TextureHandle,
        face_index: Option<u32>,
        required_width: Option<u32>,
        required_height: Option<u32>,
    ) -> GraphicsResult<()> {
        let target = self
            .textures
            .get(texture)
            .ok_or(GraphicsError::InvalidHandle("texture"))?;
        let framebuffer = target
            .framebuffer
            .ok_or(GraphicsError::InvalidHandle("render target"))?;
        let (id, is_cube, width, height) = (target.id, target.is_cube(), target.width, target.height);

        self.bindings.previous_framebuffer = self.bindings.framebuffer;
        self.bind_framebuffer_object(Some(framebuffer));
        if is_cube {
            self.context.framebuffer_texture(
                FramebufferAttachment::Color0,
                TexImageTarget::CubeFace(face_index.unwrap_or(0)),
                Some(id),
            );
        }
        self.bindings.current_render_target = Some(texture);

        self.set_direct_viewport(
            0,
            0,
            required_width.unwrap_or(width),
            required_height.unwrap_or(height),
        );
        self.wipe_caches(false);
        Ok(())
    }

    /// Stop rendering into `texture`.
    ///
    /// Mip maps are regenerated first (unless `disable_mip_gen`), then
    /// `on_before_unbind` runs with the target still bound, then the
    /// previously bound framebuffer is restored.
    pub fn unbind_framebuffer(
        &mut self,
        texture: TextureHandle,
        disable_mip_gen: bool,
        on_before_unbind: Option<BeforeUnbindCallback<'_>>,
    ) -> GraphicsResult<()> {
        let target = self
            .textures
            .get(texture)
            .ok_or(GraphicsError::InvalidHandle("texture"))?;
        let (id, texture_target, mip_maps) = (target.id, target.target(), target.generate_mip_maps);

        if mip_maps && !disable_mip_gen {
            self.context.active_texture(0);
            self.context.bind_texture(texture_target, Some(id));
            self.context.generate_mipmap(texture_target);
            self.context.bind_texture(texture_target, None);
            self.reset_texture_cache();
        }

        if let Some(callback) = on_before_unbind {
            callback(self);
        }

        self.bindings.current_render_target = None;
        let previous = self.bindings.previous_framebuffer.take();
        self.bind_framebuffer_object(previous);
        Ok(())
    }

    /// Regenerate the mip chain of a cube texture.
    pub fn generate_mip_maps_for_cubemap(&mut self, texture: TextureHandle) -> GraphicsResult<()> {
        let cube = self
            .textures
            .get(texture)
            .ok_or(GraphicsError::InvalidHandle("texture"))?;
        if !cube.is_cube() || !cube.generate_mip_maps {
            return Ok(());
        }
        let (id, target) = (cube.id, cube.target());
        self.context.active_texture(0);
        self.context.bind_texture(target, Some(id));
        self.context.generate_mipmap(target);
        self.context.bind_texture(target, None);
        self.reset_texture_cache();
        Ok(())
    }

    /// Render to the drawing buffer again.
    pub fn restore_default_framebuffer(&mut self) {
        self.bindings.current_render_target = None;
        self.bindings.previous_framebuffer = None;
        self.bind_framebuffer_object(None);

        let size = self.context.drawing_buffer_size();
        self.set_direct_viewport(0, 0, size.width, size.height);
        self.wipe_caches(false);
    }

    /// Flush pending work of the bound framebuffer.
    pub fn flush_framebuffer(&mut self) {
        self.context.flush();
    }

    fn bind_framebuffer_object(&mut self, framebuffer: Option<FramebufferId>) {
        if self.bindings.framebuffer != framebuffer {
            self.context.bind_framebuffer(framebuffer);
            self.bindings.framebuffer = framebuffer;
        }
    }
}
