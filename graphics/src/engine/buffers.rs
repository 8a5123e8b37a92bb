//! Vertex, index, uniform and instance buffers.

use super::Engine;
use crate::context::BufferId;
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{BufferHandle, GpuBuffer};
use crate::types::{BufferTarget, BufferUsageHint, IndexType};

impl Engine {
    /// Create a static vertex buffer.
    pub fn create_vertex_buffer(&mut self, data: &[f32]) -> GraphicsResult<BufferHandle> {
        self.create_float_buffer(BufferTarget::Array, BufferUsageHint::Static, data)
    }

    /// Create a vertex buffer accepting partial updates.
    pub fn create_dynamic_vertex_buffer(&mut self, data: &[f32]) -> GraphicsResult<BufferHandle> {
        self.create_float_buffer(BufferTarget::Array, BufferUsageHint::Dynamic, data)
    }

    /// Create a static uniform buffer.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CapabilityUnavailable`] without uniform buffer support.
    pub fn create_uniform_buffer(&mut self, data: &[f32]) -> GraphicsResult<BufferHandle> {
        self.require_uniform_buffers()?;
        self.create_float_buffer(BufferTarget::Uniform, BufferUsageHint::Static, data)
    }

    /// Create a uniform buffer accepting partial updates.
    pub fn create_dynamic_uniform_buffer(&mut self, data: &[f32]) -> GraphicsResult<BufferHandle> {
        self.require_uniform_buffers()?;
        self.create_float_buffer(BufferTarget::Uniform, BufferUsageHint::Dynamic, data)
    }

    /// Create an index buffer.
    ///
    /// Indices are stored as 16-bit values unless one exceeds `u16::MAX`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CapabilityUnavailable`] when 32-bit indices are
    /// needed but not supported.
    pub fn create_index_buffer(&mut self, indices: &[u32]) -> GraphicsResult<BufferHandle> {
        self.ensure_context()?;
        if indices.is_empty() {
            return Err(GraphicsError::ResourceCreation(
                "index buffer cannot be empty".to_string(),
            ));
        }

        let needs_32bit = indices.iter().any(|&index| index > u16::MAX as u32);
        let index_type = if needs_32bit {
            if !self.caps.element_index_uint {
                return Err(GraphicsError::CapabilityUnavailable(
                    "32-bit indices are not supported".to_string(),
                ));
            }
            IndexType::U32
        } else {
            IndexType::U16
        };

        let id = self.context.create_buffer();
        self.unbind_vertex_array_object();
        self.context.bind_buffer(BufferTarget::ElementArray, Some(id));
        match index_type {
            IndexType::U32 => self.context.buffer_data(
                BufferTarget::ElementArray,
                bytemuck::cast_slice(indices),
                BufferUsageHint::Static,
            ),
            IndexType::U16 => {
                let narrow: Vec<u16> = indices.iter().map(|&index| index as u16).collect();
                self.context.buffer_data(
                    BufferTarget::ElementArray,
                    bytemuck::cast_slice(&narrow),
                    BufferUsageHint::Static,
                );
            }
        }
        self.reset_index_buffer_binding();

        let buffer = GpuBuffer::new(
            id,
            BufferTarget::ElementArray,
            BufferUsageHint::Static,
            indices.len(),
        )
        .with_index_type(index_type);
        let handle = self.buffers.insert(buffer);
        log::debug!(
            "Engine: created index buffer {:?} ({} indices, {:?})",
            handle,
            indices.len(),
            index_type
        );
        Ok(handle)
    }

    /// Create an empty per-instance buffer of `capacity` floats.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CapabilityUnavailable`] without instancing support.
    pub fn create_instances_buffer(&mut self, capacity: usize) -> GraphicsResult<BufferHandle> {
        if !self.caps.instanced_arrays {
            return Err(GraphicsError::CapabilityUnavailable(
                "instanced arrays are not supported".to_string(),
            ));
        }
        self.create_float_buffer(
            BufferTarget::Array,
            BufferUsageHint::Dynamic,
            &vec![0.0; capacity],
        )
    }

    /// Update a dynamic vertex buffer.
    ///
    /// `offset` and `count` are in floats; `count` defaults to the data
    /// length. Static buffers only accept a full-length update.
    pub fn update_dynamic_vertex_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
        offset: usize,
        count: Option<usize>,
    ) -> GraphicsResult<()> {
        self.update_float_buffer(handle, BufferTarget::Array, data, offset, count)
    }

    /// Update a uniform buffer, same rules as
    /// [`Engine::update_dynamic_vertex_buffer`].
    pub fn update_uniform_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
        offset: usize,
        count: Option<usize>,
    ) -> GraphicsResult<()> {
        self.update_float_buffer(handle, BufferTarget::Uniform, data, offset, count)
    }

    /// Bind a uniform buffer to an indexed binding point.
    pub fn bind_uniform_buffer_base(&mut self, handle: BufferHandle, index: u32) -> GraphicsResult<()> {
        let id = self
            .buffers
            .get(handle)
            .ok_or(GraphicsError::InvalidHandle("buffer"))?
            .id();
        self.context.bind_buffer_base(index, Some(id));
        self.bindings.uniform_buffer = Some(id);
        Ok(())
    }

    /// Release a buffer.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidHandle`] if the buffer was already released.
    pub fn release_buffer(&mut self, handle: BufferHandle) -> GraphicsResult<()> {
        let buffer = self
            .buffers
            .remove(handle)
            .ok_or(GraphicsError::InvalidHandle("buffer"))?;
        let id = buffer.id();

        if self.bindings.array_buffer == Some(id) {
            self.bindings.array_buffer = None;
        }
        if self.bindings.index_buffer == Some(id) {
            self.bindings.index_buffer = None;
        }
        if self.bindings.uniform_buffer == Some(id) {
            self.bindings.uniform_buffer = None;
        }
        self.bindings
            .attrib_pointers
            .retain(|_, pointer| pointer.buffer != handle);
        let referenced = self
            .bindings
            .last_bind_buffers
            .as_ref()
            .is_some_and(|(vertex_buffers, index_buffer, _)| {
                *index_buffer == Some(handle) || vertex_buffers.iter().any(|(_, view)| view.buffer == handle)
            });
        if referenced {
            self.bindings.last_bind_buffers = None;
        }

        self.context.delete_buffer(id);
        log::debug!("Engine: released buffer {:?}", handle);
        Ok(())
    }

    /// Look up a buffer record.
    pub fn buffer(&self, handle: BufferHandle) -> Option<&GpuBuffer> {
        self.buffers.get(handle)
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn require_uniform_buffers(&self) -> GraphicsResult<()> {
        if self.caps.uniform_buffer_objects {
            Ok(())
        } else {
            Err(GraphicsError::CapabilityUnavailable(
                "uniform buffer objects are not supported".to_string(),
            ))
        }
    }

    fn create_float_buffer(
        &mut self,
        target: BufferTarget,
        usage: BufferUsageHint,
        data: &[f32],
    ) -> GraphicsResult<BufferHandle> {
        self.ensure_context()?;
        if data.is_empty() {
            return Err(GraphicsError::ResourceCreation(format!(
                "{target:?} buffer cannot be empty"
            )));
        }

        let id = self.context.create_buffer();
        self.context.bind_buffer(target, Some(id));
        self.context.buffer_data(target, bytemuck::cast_slice(data), usage);
        self.reset_buffer_binding(target);

        let handle = self.buffers.insert(GpuBuffer::new(id, target, usage, data.len()));
        log::debug!(
            "Engine: created {:?} {:?} buffer {:?} ({} floats)",
            usage,
            target,
            handle,
            data.len()
        );
        Ok(handle)
    }

    fn update_float_buffer(
        &mut self,
        handle: BufferHandle,
        target: BufferTarget,
        data: &[f32],
        offset: usize,
        count: Option<usize>,
    ) -> GraphicsResult<()> {
        let buffer = self
            .buffers
            .get(handle)
            .ok_or(GraphicsError::InvalidHandle("buffer"))?;
        if buffer.target() != target {
            return Err(GraphicsError::ResourceCreation(format!(
                "buffer is a {:?} buffer, not {:?}",
                buffer.target(),
                target
            )));
        }
        let (id, usage, capacity) = (buffer.id(), buffer.usage(), buffer.capacity());
        let count = count.unwrap_or(data.len()).min(data.len());

        if usage == BufferUsageHint::Dynamic {
            if offset.checked_add(count).map_or(true, |end| end > capacity) {
                return Err(GraphicsError::ResourceCreation(format!(
                    "update of {count} floats at {offset} exceeds capacity {capacity}"
                )));
            }
            self.bind_buffer_cached(target, id);
            self.context.buffer_sub_data(
                target,
                offset * std::mem::size_of::<f32>(),
                bytemuck::cast_slice(&data[..count]),
            );
        } else {
            if offset != 0 || count != capacity {
                return Err(GraphicsError::ResourceCreation(format!(
                    "static buffer expects a full update of {capacity} floats, got {count} at {offset}"
                )));
            }
            self.bind_buffer_cached(target, id);
            self.context
                .buffer_data(target, bytemuck::cast_slice(&data[..count]), usage);
        }
        Ok(())
    }

    pub(super) fn bind_buffer_cached(&mut self, target: BufferTarget, id: BufferId) {
        let slot = match target {
            BufferTarget::Array => &mut self.bindings.array_buffer,
            BufferTarget::ElementArray => &mut self.bindings.index_buffer,
            BufferTarget::Uniform => &mut self.bindings.uniform_buffer,
        };
        if *slot != Some(id) {
            *slot = Some(id);
            self.context.bind_buffer(target, Some(id));
        }
    }

    fn reset_buffer_binding(&mut self, target: BufferTarget) {
        match target {
            BufferTarget::Array => {
                self.bindings.array_buffer = None;
                self.bindings.attrib_pointers.clear();
                self.bindings.last_bind_buffers = None;
            }
            BufferTarget::ElementArray => self.reset_index_buffer_binding(),
            BufferTarget::Uniform => self.bindings.uniform_buffer = None,
        }
    }

    fn reset_index_buffer_binding(&mut self) {
        self.bindings.index_buffer = None;
        self.bindings.last_bind_buffers = None;
    }
}

#[cfg(test)]
mod tests {
    use crate::capabilities::EngineCapabilities;
    use crate::config::EngineOptions;
    use crate::context::{ContextCall, HeadlessContext};
    use crate::error::GraphicsError;
    use crate::types::IndexType;
    use crate::Engine;

    fn engine_with(caps: EngineCapabilities) -> Engine {
        let context = HeadlessContext::new().with_capabilities(caps);
        Engine::new(Box::new(context), EngineOptions::default()).unwrap()
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let mut engine = engine_with(EngineCapabilities::default());
        let err = engine.create_vertex_buffer(&[]).unwrap_err();
        assert!(matches!(err, GraphicsError::ResourceCreation(_)));
    }

    #[test]
    fn test_index_width_selection() {
        let mut engine = engine_with(EngineCapabilities::default());
        let small = engine.create_index_buffer(&[0, 1, 2]).unwrap();
        let large = engine.create_index_buffer(&[0, 1, 70_000]).unwrap();
        assert_eq!(engine.buffer(small).unwrap().index_type(), Some(IndexType::U16));
        assert_eq!(engine.buffer(large).unwrap().index_type(), Some(IndexType::U32));
    }

    #[test]
    fn test_32bit_indices_without_capability() {
        let mut engine = engine_with(EngineCapabilities::minimal());
        let err = engine.create_index_buffer(&[0, 1, 70_000]).unwrap_err();
        assert!(matches!(err, GraphicsError::CapabilityUnavailable(_)));
        assert_eq!(engine.buffer_count(), 0);
    }

    #[test]
    fn test_uniform_and_instance_buffers_need_capabilities() {
        let mut engine = engine_with(EngineCapabilities::minimal());
        assert!(matches!(
            engine.create_uniform_buffer(&[1.0]),
            Err(GraphicsError::CapabilityUnavailable(_))
        ));
        assert!(matches!(
            engine.create_instances_buffer(16),
            Err(GraphicsError::CapabilityUnavailable(_))
        ));
    }

    #[test]
    fn test_dynamic_partial_update() {
        let context = HeadlessContext::new();
        let log = context.log();
        let mut engine = Engine::new(Box::new(context), EngineOptions::default()).unwrap();

        let buffer = engine.create_dynamic_vertex_buffer(&[0.0; 8]).unwrap();
        log.clear();
        engine
            .update_dynamic_vertex_buffer(buffer, &[1.0, 2.0], 4, None)
            .unwrap();
        let calls = log.calls();
        assert!(calls.contains(&ContextCall::BufferSubData {
            target: crate::types::BufferTarget::Array,
            offset: 16,
            len: 8,
        }));
        assert!(!calls.iter().any(|c| matches!(c, ContextCall::BufferData { .. })));

        let err = engine
            .update_dynamic_vertex_buffer(buffer, &[1.0; 4], 6, None)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::ResourceCreation(_)));
    }

    #[test]
    fn test_update_offset_overflow_rejected() {
        let context = HeadlessContext::new();
        let log = context.log();
        let mut engine = Engine::new(Box::new(context), EngineOptions::default()).unwrap();

        let buffer = engine.create_dynamic_vertex_buffer(&[0.0; 8]).unwrap();
        log.clear();
        let err = engine
            .update_dynamic_vertex_buffer(buffer, &[1.0, 2.0], usize::MAX, None)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::ResourceCreation(_)));
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_static_update_requires_full_length() {
        let mut engine = engine_with(EngineCapabilities::default());
        let buffer = engine.create_vertex_buffer(&[0.0; 6]).unwrap();
        assert!(engine.update_dynamic_vertex_buffer(buffer, &[1.0; 6], 0, None).is_ok());
        assert!(matches!(
            engine.update_dynamic_vertex_buffer(buffer, &[1.0; 3], 0, None),
            Err(GraphicsError::ResourceCreation(_))
        ));
    }

    #[test]
    fn test_double_release() {
        let mut engine = engine_with(EngineCapabilities::default());
        let buffer = engine.create_vertex_buffer(&[0.0; 3]).unwrap();
        assert!(engine.release_buffer(buffer).is_ok());
        assert_eq!(
            engine.release_buffer(buffer),
            Err(GraphicsError::InvalidHandle("buffer"))
        );
    }
}
