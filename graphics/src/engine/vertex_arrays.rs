//! Vertex array objects.

use super::Engine;
use crate::effect::EffectId;
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{BufferHandle, VertexArrayHandle, VertexArrayObject};
use crate::types::{BufferTarget, VertexBuffers};

impl Engine {
    /// Record the vertex layout `bind_buffers` would apply into a vertex
    /// array object.
    ///
    /// The recording bypasses the binding caches: the object starts from an
    /// empty state on the context. The default vertex array is bound again
    /// afterwards.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CapabilityUnavailable`] without vertex array object
    /// support, [`GraphicsError::InvalidHandle`] for an unknown effect or
    /// buffer.
    pub fn record_vertex_array_object(
        &mut self,
        vertex_buffers: &VertexBuffers,
        index_buffer: Option<BufferHandle>,
        effect: EffectId,
    ) -> GraphicsResult<VertexArrayHandle> {
        self.ensure_context()?;
        if !self.caps.vertex_array_objects {
            return Err(GraphicsError::CapabilityUnavailable(
                "vertex array objects are not supported".to_string(),
            ));
        }
        let (attributes, index) = self.resolve_vertex_bindings(vertex_buffers, index_buffer, effect)?;
        self.unbind_vertex_array_object();

        let id = self.context.create_vertex_array();
        self.context.bind_vertex_array(Some(id));
        for attribute in &attributes {
            self.context
                .bind_buffer(BufferTarget::Array, Some(attribute.buffer));
            self.context.enable_vertex_attrib_array(attribute.location);
            self.context
                .vertex_attrib_pointer(attribute.location, &attribute.pointer);
            if let Some(divisor) = attribute.divisor {
                self.context.vertex_attrib_divisor(attribute.location, divisor);
            }
        }
        if let Some((buffer, _)) = index {
            self.context
                .bind_buffer(BufferTarget::ElementArray, Some(buffer));
        }
        self.context.bind_vertex_array(None);

        // The array buffer binding is global, not part of the object.
        self.bindings.array_buffer = None;
        self.bindings.last_bind_buffers = None;

        let uses_32bit_indices = index.is_some_and(|(_, wide)| wide);
        let handle = self
            .vertex_arrays
            .insert(VertexArrayObject::new(id, uses_32bit_indices));
        log::debug!(
            "Engine: recorded vertex array {:?} ({} attributes)",
            handle,
            attributes.len()
        );
        Ok(handle)
    }

    /// Bind a recorded vertex array object.
    ///
    /// Binding the object already bound does nothing.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidHandle`] if the object was released.
    pub fn bind_vertex_array_object(&mut self, handle: VertexArrayHandle) -> GraphicsResult<()> {
        let vertex_array = *self
            .vertex_arrays
            .get(handle)
            .ok_or(GraphicsError::InvalidHandle("vertex array"))?;
        if self.bindings.vertex_array != Some(handle) {
            self.context.bind_vertex_array(Some(vertex_array.id()));
            self.bindings.vertex_array = Some(handle);
            self.bindings.last_bind_buffers = None;
        }
        self.bindings.uses_32bit_indices = vertex_array.uses_32bit_indices();
        Ok(())
    }

    /// Release a recorded vertex array object, unbinding it first if bound.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidHandle`] if the object was already released.
    pub fn release_vertex_array_object(&mut self, handle: VertexArrayHandle) -> GraphicsResult<()> {
        let vertex_array = self
            .vertex_arrays
            .remove(handle)
            .ok_or(GraphicsError::InvalidHandle("vertex array"))?;
        if self.bindings.vertex_array == Some(handle) {
            self.unbind_vertex_array_object();
        }
        self.context.delete_vertex_array(vertex_array.id());
        log::debug!("Engine: released vertex array {:?}", handle);
        Ok(())
    }

    /// The vertex array object currently bound, if any.
    pub fn bound_vertex_array_object(&self) -> Option<VertexArrayHandle> {
        self.bindings.vertex_array
    }

    /// Number of live vertex array objects.
    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// Go back to the default vertex array if an object is bound.
    pub(super) fn unbind_vertex_array_object(&mut self) {
        if self.bindings.vertex_array.take().is_some() {
            self.context.bind_vertex_array(None);
            self.bindings.index_buffer = None;
            self.bindings.last_bind_buffers = None;
        }
    }
}
