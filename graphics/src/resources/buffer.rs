//! GPU buffer record.

use crate::context::BufferId;
use crate::types::{BufferTarget, BufferUsageHint, IndexType};

/// A buffer created on the context.
///
/// Capacity is counted in elements (floats for vertex and uniform buffers,
/// indices for index buffers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuBuffer {
    id: BufferId,
    target: BufferTarget,
    usage: BufferUsageHint,
    capacity: usize,
    index_type: Option<IndexType>,
}

impl GpuBuffer {
    pub(crate) fn new(id: BufferId, target: BufferTarget, usage: BufferUsageHint, capacity: usize) -> Self {
        Self {
            id,
            target,
            usage,
            capacity,
            index_type: None,
        }
    }

    pub(crate) fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = Some(index_type);
        self
    }

    /// Context-side name.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Binding target.
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Update frequency hint.
    pub fn usage(&self) -> BufferUsageHint {
        self.usage
    }

    /// Whether partial in-place updates are accepted.
    pub fn is_dynamic(&self) -> bool {
        self.usage == BufferUsageHint::Dynamic
    }

    /// Number of elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index width for index buffers.
    pub fn index_type(&self) -> Option<IndexType> {
        self.index_type
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.index_type.map_or(std::mem::size_of::<f32>(), |t| t.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_size() {
        let buffer = GpuBuffer::new(BufferId(1), BufferTarget::Array, BufferUsageHint::Static, 6);
        assert_eq!(buffer.element_size(), 4);
        assert!(!buffer.is_dynamic());

        let indices = GpuBuffer::new(
            BufferId(2),
            BufferTarget::ElementArray,
            BufferUsageHint::Static,
            6,
        )
        .with_index_type(IndexType::U16);
        assert_eq!(indices.element_size(), 2);
    }
}
