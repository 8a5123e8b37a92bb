//! Vertex attribute binding and draw calls.

use super::Engine;
use crate::context::BufferId;
use crate::effect::EffectId;
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::BufferHandle;
use crate::types::{
    AttribPointer, BufferTarget, IndexType, InstancingAttribute, PrimitiveMode, VertexBuffers,
};

const FLOAT_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// One attribute ready to be pointed at its buffer.
pub(super) struct AttributeBinding {
    pub(super) location: u32,
    pub(super) buffer: BufferId,
    pub(super) pointer: AttribPointer,
    pub(super) divisor: Option<u32>,
}

impl Engine {
    /// Bind the vertex buffers and index buffer for `effect`.
    ///
    /// Each buffer is bound to the attribute its vertex kind names in the
    /// effect; kinds the effect does not use are skipped and attributes left
    /// over from the previous call are disabled. Calling again with the same
    /// buffers, index buffer and effect does nothing.
    pub fn bind_buffers(
        &mut self,
        vertex_buffers: &VertexBuffers,
        index_buffer: Option<BufferHandle>,
        effect: EffectId,
    ) -> GraphicsResult<()> {
        if let Some((buffers, index, last_effect)) = &self.bindings.last_bind_buffers {
            if buffers == vertex_buffers && *index == index_buffer && *last_effect == effect {
                return Ok(());
            }
        }

        let (attributes, index) = self.resolve_vertex_bindings(vertex_buffers, index_buffer, effect)?;
        self.unbind_vertex_array_object();

        let used: Vec<u32> = attributes.iter().map(|a| a.location).collect();
        for location in 0..self.bindings.enabled_attributes.len() as u32 {
            if !used.contains(&location) {
                self.disable_attribute(location);
            }
        }
        for attribute in attributes {
            self.bind_attribute(&attribute);
        }
        if let Some((id, uses_32bit_indices)) = index {
            self.bind_buffer_cached(BufferTarget::ElementArray, id);
            self.bindings.uses_32bit_indices = uses_32bit_indices;
        }

        self.bindings.last_bind_buffers = Some((vertex_buffers.clone(), index_buffer, effect));
        Ok(())
    }

    /// Resolve the attribute bindings and index buffer for `effect` without
    /// touching the context.
    pub(super) fn resolve_vertex_bindings(
        &self,
        vertex_buffers: &VertexBuffers,
        index_buffer: Option<BufferHandle>,
        effect: EffectId,
    ) -> GraphicsResult<(Vec<AttributeBinding>, Option<(BufferId, bool)>)> {
        let effect_ref = self
            .effects
            .get(effect)
            .ok_or(GraphicsError::InvalidHandle("effect"))?;
        let mut attributes = Vec::with_capacity(vertex_buffers.len());
        for (kind, view) in vertex_buffers.iter() {
            let Some(location) = effect_ref.attribute_location(&kind.attribute_name()) else {
                continue;
            };
            let buffer = self
                .buffers
                .get(view.buffer)
                .ok_or(GraphicsError::InvalidHandle("buffer"))?;
            if view.divisor.is_some() && !self.caps.instanced_arrays {
                return Err(GraphicsError::CapabilityUnavailable(
                    "instanced arrays are not supported".to_string(),
                ));
            }
            attributes.push(AttributeBinding {
                location,
                buffer: buffer.id(),
                pointer: AttribPointer {
                    buffer: view.buffer,
                    size: view.size,
                    stride: view.stride,
                    offset: view.offset,
                },
                divisor: view.divisor,
            });
        }
        let index = match index_buffer {
            Some(handle) => {
                let buffer = self
                    .buffers
                    .get(handle)
                    .ok_or(GraphicsError::InvalidHandle("buffer"))?;
                Some((buffer.id(), buffer.index_type() == Some(IndexType::U32)))
            }
            None => None,
        };
        Ok((attributes, index))
    }

    /// Upload per-instance data and point the instancing attributes of the
    /// current effect at it.
    pub fn update_and_bind_instances_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
        attributes: &[InstancingAttribute],
    ) -> GraphicsResult<()> {
        let effect = self
            .bindings
            .current_effect
            .and_then(|id| self.effects.get(id))
            .ok_or_else(|| GraphicsError::EffectNotReady("no effect enabled".to_string()))?;
        let stride = attributes.iter().map(|a| a.size).sum::<u32>() * FLOAT_SIZE;
        let locations: Vec<(u32, &InstancingAttribute)> = attributes
            .iter()
            .filter_map(|attribute| {
                effect
                    .attribute_location(&attribute.name)
                    .map(|location| (location, attribute))
            })
            .collect();
        let bindings: Vec<(u32, AttribPointer)> = locations
            .into_iter()
            .map(|(location, attribute)| {
                (
                    location,
                    AttribPointer {
                        buffer: handle,
                        size: attribute.size,
                        stride,
                        offset: attribute.offset * FLOAT_SIZE,
                    },
                )
            })
            .collect();

        self.update_dynamic_vertex_buffer(handle, data, 0, None)?;
        let id = self.buffers[handle].id();
        for (location, pointer) in bindings {
            self.bind_attribute(&AttributeBinding {
                location,
                buffer: id,
                pointer,
                divisor: Some(1),
            });
        }
        self.bindings.last_bind_buffers = None;
        Ok(())
    }

    /// Reset the divisor of every instanced attribute and disable it.
    pub fn unbind_instance_attributes(&mut self) {
        let locations = std::mem::take(&mut self.bindings.instanced_attributes);
        for location in locations {
            self.context.vertex_attrib_divisor(location, 0);
            self.disable_attribute(location);
        }
        self.bindings.last_bind_buffers = None;
    }

    /// Disable every enabled vertex attribute array.
    pub fn unbind_all_attributes(&mut self) {
        for location in 0..self.bindings.enabled_attributes.len() as u32 {
            self.disable_attribute(location);
        }
        self.bindings.instanced_attributes.clear();
        self.bindings.attrib_pointers.clear();
        self.bindings.last_bind_buffers = None;
    }

    /// Draw indexed triangles (or lines) from the bound index buffer.
    ///
    /// `instances_count > 0` issues an instanced draw, or that many plain
    /// draws without instancing support.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ResourceCreation`] when the byte offset of
    /// `index_start` does not fit in 32 bits.
    pub fn draw(
        &mut self,
        use_triangles: bool,
        index_start: u32,
        index_count: u32,
        instances_count: u32,
    ) -> GraphicsResult<()> {
        self.ensure_context()?;
        let index_type = if self.bindings.uses_32bit_indices {
            IndexType::U32
        } else {
            IndexType::U16
        };
        let offset = index_start
            .checked_mul(index_type.size() as u32)
            .ok_or_else(|| {
                GraphicsError::ResourceCreation(format!(
                    "index start {index_start} overflows the index buffer offset"
                ))
            })?;
        self.apply_states();

        let mode = PrimitiveMode::from_use_triangles(use_triangles);
        self.issue_draws(instances_count, |context, instances| {
            context.draw_elements(mode, index_count, index_type, offset, instances)
        });
        Ok(())
    }

    /// Draw non-indexed triangles (or lines).
    pub fn draw_unindexed(
        &mut self,
        use_triangles: bool,
        vertices_start: u32,
        vertices_count: u32,
        instances_count: u32,
    ) -> GraphicsResult<()> {
        self.ensure_context()?;
        self.apply_states();

        let mode = PrimitiveMode::from_use_triangles(use_triangles);
        self.issue_draws(instances_count, |context, instances| {
            context.draw_arrays(mode, vertices_start, vertices_count, instances)
        });
        Ok(())
    }

    /// Draw points.
    pub fn draw_point_clouds(
        &mut self,
        vertices_start: u32,
        vertices_count: u32,
        instances_count: u32,
    ) -> GraphicsResult<()> {
        self.ensure_context()?;
        self.apply_states();

        self.issue_draws(instances_count, |context, instances| {
            context.draw_arrays(PrimitiveMode::Points, vertices_start, vertices_count, instances)
        });
        Ok(())
    }

    fn issue_draws(
        &mut self,
        instances_count: u32,
        mut draw: impl FnMut(&mut dyn crate::context::GraphicsContext, Option<u32>),
    ) {
        if instances_count == 0 {
            draw(self.context.as_mut(), None);
            self.draw_calls.add(1);
        } else if self.caps.instanced_arrays {
            draw(self.context.as_mut(), Some(instances_count));
            self.draw_calls.add(1);
        } else {
            for _ in 0..instances_count {
                draw(self.context.as_mut(), None);
            }
            self.draw_calls.add(instances_count as usize);
        }
    }

    fn bind_attribute(&mut self, attribute: &AttributeBinding) {
        let location = attribute.location;
        self.bind_buffer_cached(BufferTarget::Array, attribute.buffer);
        self.enable_attribute(location);
        if self.bindings.attrib_pointers.get(&location) != Some(&attribute.pointer) {
            self.context.vertex_attrib_pointer(location, &attribute.pointer);
            self.bindings.attrib_pointers.insert(location, attribute.pointer);
        }
        match attribute.divisor {
            Some(divisor) => {
                self.context.vertex_attrib_divisor(location, divisor);
                if !self.bindings.instanced_attributes.contains(&location) {
                    self.bindings.instanced_attributes.push(location);
                }
            }
            None => {
                if let Some(index) = self.bindings.instanced_attributes.iter().position(|&l| l == location) {
                    self.context.vertex_attrib_divisor(location, 0);
                    self.bindings.instanced_attributes.swap_remove(index);
                }
            }
        }
    }

    fn enable_attribute(&mut self, location: u32) {
        if let Some(enabled) = self.bindings.enabled_attributes.get_mut(location as usize) {
            if !*enabled {
                self.context.enable_vertex_attrib_array(location);
                *enabled = true;
            }
        }
    }

    fn disable_attribute(&mut self, location: u32) {
        if let Some(enabled) = self.bindings.enabled_attributes.get_mut(location as usize) {
            if *enabled {
                self.context.disable_vertex_attrib_array(location);
                *enabled = false;
            }
        }
    }
}
