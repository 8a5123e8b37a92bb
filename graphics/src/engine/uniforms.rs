//! Uniform uploads and sampler texture binding.

use super::Engine;
use crate::effect::EffectId;
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::TextureHandle;
use crate::types::{TextureTarget, UniformValue};

impl Engine {
    /// Upload a uniform of `effect`.
    ///
    /// Names the program does not declare are ignored. The upload is skipped
    /// when the bound program already holds the same value. Returns whether a
    /// context call was issued.
    pub fn set_uniform(
        &mut self,
        effect: EffectId,
        name: &str,
        value: UniformValue,
    ) -> GraphicsResult<bool> {
        let effect = self
            .effects
            .get(effect)
            .ok_or(GraphicsError::InvalidHandle("effect"))?;
        let Some(location) = effect.uniform_location(name) else {
            return Ok(false);
        };
        let Some(program) = effect.program else {
            return Err(GraphicsError::EffectNotReady(effect.signature.clone()));
        };

        self.bind_program(program);
        if self.uniform_cache.get(&location) == Some(&value) {
            return Ok(false);
        }
        self.context.set_uniform(location, &value);
        self.uniform_cache.insert(location, value);
        Ok(true)
    }

    pub fn set_int(&mut self, effect: EffectId, name: &str, value: i32) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Int(value))
    }

    pub fn set_bool(&mut self, effect: EffectId, name: &str, value: bool) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, value.into())
    }

    pub fn set_float(&mut self, effect: EffectId, name: &str, value: f32) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Float(value))
    }

    pub fn set_float2(&mut self, effect: EffectId, name: &str, x: f32, y: f32) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Float2([x, y]))
    }

    pub fn set_float3(
        &mut self,
        effect: EffectId,
        name: &str,
        x: f32,
        y: f32,
        z: f32,
    ) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Float3([x, y, z]))
    }

    pub fn set_float4(
        &mut self,
        effect: EffectId,
        name: &str,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    ) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Float4([x, y, z, w]))
    }

    /// Upload a column-major 4x4 matrix.
    pub fn set_matrix(&mut self, effect: EffectId, name: &str, matrix: &[f32; 16]) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Matrix(*matrix))
    }

    pub fn set_color3(&mut self, effect: EffectId, name: &str, color: [f32; 3]) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Float3(color))
    }

    /// Upload an RGB color with a separate alpha as a vec4.
    pub fn set_color4(
        &mut self,
        effect: EffectId,
        name: &str,
        color: [f32; 3],
        alpha: f32,
    ) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::Float4([color[0], color[1], color[2], alpha]))
    }

    pub fn set_float_array(&mut self, effect: EffectId, name: &str, values: &[f32]) -> GraphicsResult<bool> {
        self.set_uniform(effect, name, UniformValue::FloatArray(values.to_vec()))
    }

    /// Bind a texture (or nothing) to the unit of one of the effect's
    /// samplers.
    ///
    /// Unknown sampler names are ignored. A texture that is not ready binds
    /// nothing.
    pub fn set_texture(
        &mut self,
        effect: EffectId,
        sampler: &str,
        texture: Option<TextureHandle>,
    ) -> GraphicsResult<()> {
        let effect = self
            .effects
            .get(effect)
            .ok_or(GraphicsError::InvalidHandle("effect"))?;
        let Some(unit) = effect.sampler_unit(sampler) else {
            return Ok(());
        };
        if unit as usize >= self.bindings.bound_textures.len() {
            log::warn!(
                "Engine: sampler {} needs texture unit {} but only {} are available",
                sampler,
                unit,
                self.bindings.bound_textures.len()
            );
            return Ok(());
        }

        let binding = match texture {
            Some(handle) => {
                let texture = self
                    .textures
                    .get(handle)
                    .ok_or(GraphicsError::InvalidHandle("texture"))?;
                texture.is_ready.then(|| (texture.target(), texture.id))
            }
            None => None,
        };
        self.bind_texture_unit(unit, binding);
        Ok(())
    }

    /// Unbind the texture of every unit that has one.
    pub fn unbind_all_textures(&mut self) {
        for unit in 0..self.bindings.bound_textures.len() as u32 {
            if let Some((target, _)) = self.bindings.bound_textures[unit as usize] {
                self.activate_texture_unit(unit);
                self.context.bind_texture(target, None);
                self.bindings.bound_textures[unit as usize] = None;
            }
        }
    }

    fn bind_texture_unit(&mut self, unit: u32, binding: Option<(TextureTarget, crate::context::TextureId)>) {
        let current = self.bindings.bound_textures[unit as usize];
        if current == binding {
            return;
        }
        self.activate_texture_unit(unit);
        match (binding, current) {
            (Some((target, id)), _) => self.context.bind_texture(target, Some(id)),
            (None, Some((target, _))) => self.context.bind_texture(target, None),
            (None, None) => {}
        }
        self.bindings.bound_textures[unit as usize] = binding;
    }

    fn activate_texture_unit(&mut self, unit: u32) {
        if self.bindings.active_texture_unit != Some(unit) {
            self.context.active_texture(unit);
            self.bindings.active_texture_unit = Some(unit);
        }
    }
}
