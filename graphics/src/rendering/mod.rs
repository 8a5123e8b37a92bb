//! Frame draw scheduling.
//!
//! A [`RenderingManager`] sorts what the scene dispatches each frame into
//! numbered [`RenderingGroup`]s and draws them in order through the
//! [`Engine`](crate::Engine):
//!
//! ```text
//! for each group 0..MAX_RENDERING_GROUPS
//!     PreClear -> auto-clear depth/stencil (once per frame)
//!     PreOpaque -> PreTransparent
//!     opaque -> alpha-test -> sprites -> particles -> transparent
//!     PostTransparent
//! ```
//!
//! Scene content is reached through the [`SubMesh`], [`SpriteBatch`] and
//! [`ParticleSystem`] capability traits.

mod drawable;
mod group;
mod manager;
mod observer;

pub use drawable::{
    Camera, MeshId, ParticleSystem, SortEntry, SpriteBatch, SubMesh, SubMeshComparator,
    Transparency, back_to_front_sort, comparator, default_transparent_sort, front_to_back_sort,
    painter_sort,
};
pub use group::{CustomRenderFn, RenderParams, RenderStats, RenderingGroup, SubMeshBuckets};
pub use manager::{AutoClear, MAX_RENDERING_GROUPS, MIN_RENDERING_GROUPS, RenderingManager};
pub use observer::{
    ObserverToken, RenderingGroupInfo, RenderingGroupObservable, RenderingGroupObserver,
    RenderingGroupStage, group_mask,
};
