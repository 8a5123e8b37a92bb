//! Drawable capabilities consumed by the frame scheduler.
//!
//! Scene content reaches the scheduler as shared trait objects. The
//! scheduler only needs to know which group an entry belongs to, how it is
//! classified and how to ask it to draw itself.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::effect::EffectId;
use crate::engine::Engine;
use crate::error::GraphicsResult;
use crate::resources::BufferHandle;
use crate::types::VertexBuffers;

/// Identifies a mesh for active-mesh filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u64);

/// How a sub-mesh blends with what is behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transparency {
    /// Drawn first, no blending.
    #[default]
    Opaque,
    /// Drawn after opaque geometry with fragments discarded below a cutoff.
    AlphaTest,
    /// Blended, drawn last and sorted.
    AlphaBlend,
}

/// Point of view used for sorting and layer filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World-space position.
    pub position: [f32; 3],
    /// Layers this camera renders.
    pub layer_mask: u32,
}

impl Camera {
    /// Default layer mask of a camera.
    pub const DEFAULT_LAYER_MASK: u32 = 0x0FFF_FFFF;

    pub fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            layer_mask: Self::DEFAULT_LAYER_MASK,
        }
    }

    pub fn with_layer_mask(mut self, layer_mask: u32) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    /// Whether an object on `layer_mask` is visible to this camera.
    pub fn sees(&self, layer_mask: u32) -> bool {
        self.layer_mask & layer_mask != 0
    }

    /// Euclidean distance from the camera to `point`.
    pub fn distance_to(&self, point: [f32; 3]) -> f32 {
        let [x, y, z] = self.position;
        ((point[0] - x).powi(2) + (point[1] - y).powi(2) + (point[2] - z).powi(2)).sqrt()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new([0.0; 3])
    }
}

/// A drawable piece of a mesh using one effect.
pub trait SubMesh {
    /// Group the sub-mesh is dispatched to.
    fn rendering_group_id(&self) -> usize;

    fn transparency(&self) -> Transparency;

    /// Explicit ordering among transparent sub-meshes; lower draws first.
    fn alpha_index(&self) -> i32 {
        0
    }

    /// Distance used by the depth sorts.
    fn distance_to(&self, camera: &Camera) -> f32;

    /// Effect used to draw; `None` skips the sub-mesh.
    fn effect(&self) -> Option<EffectId>;

    fn vertex_buffers(&self) -> &VertexBuffers;

    fn index_buffer(&self) -> Option<BufferHandle>;

    /// First index (or vertex) and count.
    fn index_range(&self) -> (u32, u32);

    fn instances_count(&self) -> u32 {
        0
    }

    /// Triangles, or lines for wireframe.
    fn use_triangles(&self) -> bool {
        true
    }

    /// Upload uniforms, textures and states for the coming draw. The effect
    /// is already enabled.
    fn bind(&self, engine: &mut Engine, effect: EffectId) -> GraphicsResult<()>;
}

/// A batch of sprites drawing itself.
pub trait SpriteBatch {
    fn rendering_group_id(&self) -> usize;

    fn layer_mask(&self) -> u32;

    fn render(&self, engine: &mut Engine) -> GraphicsResult<()>;
}

/// A particle system drawing itself.
pub trait ParticleSystem {
    fn rendering_group_id(&self) -> usize;

    fn layer_mask(&self) -> u32;

    /// Mesh the system is attached to; `None` for systems emitting from a
    /// fixed point, which are always rendered.
    fn emitter(&self) -> Option<MeshId>;

    /// Draw the system; returns the number of particles drawn.
    fn render(&self, engine: &mut Engine) -> GraphicsResult<usize>;
}

/// A sub-mesh with its distance to the camera, as seen by comparators.
#[derive(Clone)]
pub struct SortEntry {
    pub sub_mesh: Rc<dyn SubMesh>,
    pub distance: f32,
}

impl fmt::Debug for SortEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortEntry")
            .field("alpha_index", &self.sub_mesh.alpha_index())
            .field("distance", &self.distance)
            .finish()
    }
}

/// Orders the entries of a bucket.
pub type SubMeshComparator = Rc<dyn Fn(&SortEntry, &SortEntry) -> Ordering>;

/// Farther entries first.
pub fn back_to_front_sort(a: &SortEntry, b: &SortEntry) -> Ordering {
    b.distance.total_cmp(&a.distance)
}

/// Closer entries first.
pub fn front_to_back_sort(a: &SortEntry, b: &SortEntry) -> Ordering {
    a.distance.total_cmp(&b.distance)
}

/// Alpha index ascending, then back to front.
pub fn default_transparent_sort(a: &SortEntry, b: &SortEntry) -> Ordering {
    a.sub_mesh
        .alpha_index()
        .cmp(&b.sub_mesh.alpha_index())
        .then_with(|| back_to_front_sort(a, b))
}

/// Alpha index ascending, then front to back.
pub fn painter_sort(a: &SortEntry, b: &SortEntry) -> Ordering {
    a.sub_mesh
        .alpha_index()
        .cmp(&b.sub_mesh.alpha_index())
        .then_with(|| front_to_back_sort(a, b))
}

/// Wrap a sort function as a shareable comparator.
pub fn comparator(sort: impl Fn(&SortEntry, &SortEntry) -> Ordering + 'static) -> SubMeshComparator {
    Rc::new(sort)
}
