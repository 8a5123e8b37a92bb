//! Buffer and vertex layout types.

use crate::resources::BufferHandle;

/// Buffer binding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
    /// Uniform block data.
    Uniform,
}

/// Expected update frequency of buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsageHint {
    /// Written once.
    #[default]
    Static,
    /// Updated frequently.
    Dynamic,
}

/// Width of index values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    /// 16-bit indices.
    #[default]
    U16,
    /// 32-bit indices.
    U32,
}

impl IndexType {
    /// Size of one index in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Triangle list.
    Triangles,
    /// Line list.
    Lines,
    /// Point list.
    Points,
}

impl PrimitiveMode {
    /// Triangles or lines, as requested by the `use_triangles` draw flag.
    pub fn from_use_triangles(use_triangles: bool) -> Self {
        if use_triangles {
            Self::Triangles
        } else {
            Self::Lines
        }
    }
}

// ============================================================================
// Vertex kinds
// ============================================================================

/// Semantic of a vertex buffer.
///
/// The attribute name is what shaders declare and what the engine looks up
/// in the effect's attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexKind {
    /// Position (vec3).
    Position,
    /// Normal (vec3).
    Normal,
    /// Tangent (vec4).
    Tangent,
    /// Texture coordinates, sets 1 to 6.
    Uv(u8),
    /// Vertex color (vec4).
    Color,
    /// Skinning bone indices.
    MatricesIndices,
    /// Skinning bone weights.
    MatricesWeights,
    /// Extra skinning bone indices.
    MatricesIndicesExtra,
    /// Extra skinning bone weights.
    MatricesWeightsExtra,
    /// Instanced world matrix row, `0..4`.
    World(u8),
}

impl VertexKind {
    /// Attribute name used in shaders.
    pub fn attribute_name(&self) -> String {
        match self {
            Self::Position => "position".to_string(),
            Self::Normal => "normal".to_string(),
            Self::Tangent => "tangent".to_string(),
            Self::Uv(1) => "uv".to_string(),
            Self::Uv(set) => format!("uv{set}"),
            Self::Color => "color".to_string(),
            Self::MatricesIndices => "matricesIndices".to_string(),
            Self::MatricesWeights => "matricesWeights".to_string(),
            Self::MatricesIndicesExtra => "matricesIndicesExtra".to_string(),
            Self::MatricesWeightsExtra => "matricesWeightsExtra".to_string(),
            Self::World(row) => format!("world{row}"),
        }
    }

    /// Every kind an effect resolves an attribute location for.
    pub fn standard() -> impl Iterator<Item = VertexKind> {
        [
            Self::Position,
            Self::Normal,
            Self::Tangent,
            Self::Color,
            Self::MatricesIndices,
            Self::MatricesWeights,
            Self::MatricesIndicesExtra,
            Self::MatricesWeightsExtra,
        ]
        .into_iter()
        .chain((1..=6).map(Self::Uv))
        .chain((0..4).map(Self::World))
    }

    /// Default component count for this kind.
    pub fn default_size(&self) -> u32 {
        match self {
            Self::Position | Self::Normal => 3,
            Self::Uv(_) => 2,
            _ => 4,
        }
    }
}

/// A vertex buffer bound for one vertex kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferView {
    /// Underlying buffer.
    pub buffer: BufferHandle,
    /// Components per vertex.
    pub size: u32,
    /// Stride in bytes (0 for tightly packed).
    pub stride: u32,
    /// Offset in bytes.
    pub offset: u32,
    /// Instance divisor; `Some` for per-instance data.
    pub divisor: Option<u32>,
}

impl VertexBufferView {
    /// Tightly packed per-vertex view.
    pub fn new(buffer: BufferHandle, size: u32) -> Self {
        Self {
            buffer,
            size,
            stride: 0,
            offset: 0,
            divisor: None,
        }
    }

    /// Set stride and offset in bytes.
    pub fn with_layout(mut self, stride: u32, offset: u32) -> Self {
        self.stride = stride;
        self.offset = offset;
        self
    }

    /// Mark as per-instance data advancing every `divisor` instances.
    pub fn instanced(mut self, divisor: u32) -> Self {
        self.divisor = Some(divisor);
        self
    }
}

/// The set of vertex buffers of a mesh, keyed by vertex kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexBuffers {
    views: Vec<(VertexKind, VertexBufferView)>,
}

impl VertexBuffers {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the buffer for a kind.
    pub fn with(mut self, kind: VertexKind, view: VertexBufferView) -> Self {
        self.set(kind, view);
        self
    }

    /// Add or replace the buffer for a kind.
    pub fn set(&mut self, kind: VertexKind, view: VertexBufferView) {
        match self.views.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = view,
            None => self.views.push((kind, view)),
        }
    }

    /// Buffer for a kind.
    pub fn get(&self, kind: VertexKind) -> Option<&VertexBufferView> {
        self.views.iter().find(|(k, _)| *k == kind).map(|(_, v)| v)
    }

    /// Iterate over all views in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(VertexKind, VertexBufferView)> {
        self.views.iter()
    }

    /// Number of views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// A vertex attribute pointer as set on the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribPointer {
    /// Buffer the pointer reads from.
    pub buffer: BufferHandle,
    /// Components per vertex.
    pub size: u32,
    /// Stride in bytes.
    pub stride: u32,
    /// Offset in bytes.
    pub offset: u32,
}

/// Layout of one attribute inside an instances buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstancingAttribute {
    /// Attribute name in the effect.
    pub name: String,
    /// Components per instance.
    pub size: u32,
    /// Offset in floats within an instance.
    pub offset: u32,
}

impl InstancingAttribute {
    /// Create an instancing attribute.
    pub fn new(name: impl Into<String>, size: u32, offset: u32) -> Self {
        Self {
            name: name.into(),
            size,
            offset,
        }
    }

    /// The four `world0..world3` rows of a per-instance world matrix.
    pub fn world_matrix() -> Vec<Self> {
        (0..4)
            .map(|row| Self::new(VertexKind::World(row).attribute_name(), 4, row as u32 * 4))
            .collect()
    }
}
