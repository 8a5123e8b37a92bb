//! Vertex array object record.

use crate::context::VertexArrayId;

/// A vertex array object recorded by the engine.
///
/// The object captures the attribute pointers and the index buffer binding
/// of one vertex layout, so binding it replaces a full
/// [`Engine::bind_buffers`](crate::Engine::bind_buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexArrayObject {
    id: VertexArrayId,
    uses_32bit_indices: bool,
}

impl VertexArrayObject {
    pub(crate) fn new(id: VertexArrayId, uses_32bit_indices: bool) -> Self {
        Self {
            id,
            uses_32bit_indices,
        }
    }

    /// Context-side name.
    pub fn id(&self) -> VertexArrayId {
        self.id
    }

    /// Whether the recorded index buffer holds 32-bit indices.
    pub fn uses_32bit_indices(&self) -> bool {
        self.uses_32bit_indices
    }
}
