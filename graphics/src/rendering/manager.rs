//! Per-scene frame draw scheduler.

use std::fmt;
use std::rc::Rc;

use super::drawable::{ParticleSystem, SpriteBatch, SubMesh, SubMeshComparator};
use super::group::{RenderParams, RenderStats, RenderingGroup};
use super::observer::{RenderingGroupInfo, RenderingGroupObservable, RenderingGroupStage, group_mask};
use crate::config::{ClearGuardReset, EngineOptions};
use crate::engine::Engine;
use crate::error::{GraphicsError, GraphicsResult};
use crate::profiling::profile_function;

/// Lowest rendering group id.
pub const MIN_RENDERING_GROUPS: usize = 0;

/// Number of rendering groups; valid ids are `MIN_RENDERING_GROUPS..MAX_RENDERING_GROUPS`.
pub const MAX_RENDERING_GROUPS: usize = 4;

/// Depth/stencil clear requested before a group is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AutoClear {
    pub enabled: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl Default for AutoClear {
    fn default() -> Self {
        Self {
            enabled: true,
            depth: true,
            stencil: true,
        }
    }
}

/// Comparators registered for a group, applied when it is created.
#[derive(Clone, Default)]
struct RenderingOrder {
    opaque: Option<SubMeshComparator>,
    alpha_test: Option<SubMeshComparator>,
    transparent: Option<SubMeshComparator>,
}

/// Partitions drawables into ordered groups and renders them once per frame.
///
/// # Example
///
/// ```ignore
/// let mut manager = RenderingManager::new();
/// manager.set_rendering_order(2, Some(comparator(front_to_back_sort)), None, None)?;
///
/// // every frame
/// manager.reset();
/// for sub_mesh in &visible {
///     manager.dispatch(Rc::clone(sub_mesh))?;
/// }
/// let stats = manager.render(&mut engine, RenderParams::new().with_camera(camera))?;
/// ```
pub struct RenderingManager {
    groups: Vec<Option<RenderingGroup>>,
    orders: Vec<RenderingOrder>,
    auto_clear: [AutoClear; MAX_RENDERING_GROUPS],
    clear_guard_reset: ClearGuardReset,
    depth_stencil_cleared: bool,
    observable: RenderingGroupObservable,
}

impl fmt::Debug for RenderingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingManager")
            .field("groups", &self.groups)
            .field("auto_clear", &self.auto_clear)
            .field("clear_guard_reset", &self.clear_guard_reset)
            .field("observable", &self.observable)
            .finish_non_exhaustive()
    }
}

impl Default for RenderingManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderingManager {
    pub fn new() -> Self {
        Self::with_clear_guard_reset(ClearGuardReset::default())
    }

    pub fn with_clear_guard_reset(clear_guard_reset: ClearGuardReset) -> Self {
        Self {
            groups: (MIN_RENDERING_GROUPS..MAX_RENDERING_GROUPS).map(|_| None).collect(),
            orders: vec![RenderingOrder::default(); MAX_RENDERING_GROUPS],
            auto_clear: [AutoClear::default(); MAX_RENDERING_GROUPS],
            clear_guard_reset,
            depth_stencil_cleared: false,
            observable: RenderingGroupObservable::new(),
        }
    }

    /// Manager using the clear guard policy of `options`.
    pub fn from_options(options: &EngineOptions) -> Self {
        Self::with_clear_guard_reset(options.clear_guard_reset)
    }

    pub fn clear_guard_reset(&self) -> ClearGuardReset {
        self.clear_guard_reset
    }

    /// Lifecycle observers notified during [`render`](Self::render).
    pub fn observable(&self) -> &RenderingGroupObservable {
        &self.observable
    }

    pub fn observable_mut(&mut self) -> &mut RenderingGroupObservable {
        &mut self.observable
    }

    /// A group, if something was ever dispatched to it.
    pub fn rendering_group(&self, id: usize) -> Option<&RenderingGroup> {
        self.groups.get(id).and_then(Option::as_ref)
    }

    /// Number of groups created so far.
    pub fn group_count(&self) -> usize {
        self.groups.iter().filter(|group| group.is_some()).count()
    }

    pub fn auto_clear(&self, id: usize) -> Option<AutoClear> {
        self.auto_clear.get(id).copied()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Queue a sub-mesh for this frame.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidRenderingGroup`] for ids outside the group
    /// range; the sub-mesh is dropped.
    pub fn dispatch(&mut self, sub_mesh: Rc<dyn SubMesh>) -> GraphicsResult<()> {
        let group = self.prepare_group(sub_mesh.rendering_group_id())?;
        group.dispatch(sub_mesh);
        Ok(())
    }

    pub fn dispatch_sprites(&mut self, batch: Rc<dyn SpriteBatch>) -> GraphicsResult<()> {
        let group = self.prepare_group(batch.rendering_group_id())?;
        group.dispatch_sprites(batch);
        Ok(())
    }

    pub fn dispatch_particles(&mut self, system: Rc<dyn ParticleSystem>) -> GraphicsResult<()> {
        let group = self.prepare_group(system.rendering_group_id())?;
        group.dispatch_particles(system);
        Ok(())
    }

    fn prepare_group(&mut self, id: usize) -> GraphicsResult<&mut RenderingGroup> {
        check_group_id(id)?;
        let order = &self.orders[id];
        let group = self.groups[id].get_or_insert_with(|| {
            log::debug!("RenderingManager: creating rendering group {}", id);
            RenderingGroup::new(
                id,
                order.opaque.clone(),
                order.alpha_test.clone(),
                order.transparent.clone(),
            )
        });
        Ok(group)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Install the comparators of a group now, or when it gets created.
    pub fn set_rendering_order(
        &mut self,
        id: usize,
        opaque: Option<SubMeshComparator>,
        alpha_test: Option<SubMeshComparator>,
        transparent: Option<SubMeshComparator>,
    ) -> GraphicsResult<()> {
        check_group_id(id)?;
        let order = RenderingOrder {
            opaque,
            alpha_test,
            transparent,
        };
        if let Some(group) = self.groups[id].as_mut() {
            group.set_opaque_sort(order.opaque.clone());
            group.set_alpha_test_sort(order.alpha_test.clone());
            group.set_transparent_sort(order.transparent.clone());
        }
        self.orders[id] = order;
        Ok(())
    }

    /// Configure the depth/stencil clear issued before a group is drawn.
    pub fn set_rendering_auto_clear_depth_stencil(
        &mut self,
        id: usize,
        enabled: bool,
        depth: bool,
        stencil: bool,
    ) -> GraphicsResult<()> {
        check_group_id(id)?;
        self.auto_clear[id] = AutoClear {
            enabled,
            depth,
            stencil,
        };
        Ok(())
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Empty every group's dispatch lists, keeping groups and comparators.
    pub fn reset(&mut self) {
        for group in self.groups.iter_mut().flatten() {
            group.prepare();
        }
    }

    /// Render every group in ascending order.
    ///
    /// Groups that were never created are skipped unless observers are
    /// registered, in which case their stage notifications still fire.
    pub fn render(&mut self, engine: &mut Engine, mut params: RenderParams<'_>) -> GraphicsResult<RenderStats> {
        profile_function!();
        let mut stats = RenderStats::default();
        let has_observers = self.observable.has_observers();

        if params.render_sprites {
            for batch in params.sprite_batches {
                if let Err(err) = self.dispatch_sprites(Rc::clone(batch)) {
                    log::warn!("RenderingManager: sprite batch dropped: {}", err);
                }
            }
        }

        let mut first_processed = true;
        for index in MIN_RENDERING_GROUPS..MAX_RENDERING_GROUPS {
            if index == MIN_RENDERING_GROUPS && self.clear_guard_reset == ClearGuardReset::GroupZero {
                self.depth_stencil_cleared = false;
            }
            if self.groups[index].is_none() && !has_observers {
                continue;
            }
            if first_processed && self.clear_guard_reset == ClearGuardReset::FirstProcessedGroup {
                self.depth_stencil_cleared = false;
            }
            first_processed = false;

            let mask = group_mask(index);
            let mut info = RenderingGroupInfo {
                rendering_group_id: index,
                stage: RenderingGroupStage::PreClear,
                camera: params.camera,
            };
            if has_observers {
                self.observable.notify(&info, mask, engine);
                stats.notifications += 1;
            }

            let auto_clear = self.auto_clear[index];
            if auto_clear.enabled && self.clear_depth_stencil(engine, auto_clear) {
                stats.clears += 1;
            }

            if has_observers {
                for stage in [RenderingGroupStage::PreOpaque, RenderingGroupStage::PreTransparent] {
                    info.stage = stage;
                    self.observable.notify(&info, mask, engine);
                    stats.notifications += 1;
                }
            }

            if let Some(group) = self.groups[index].as_mut() {
                stats += group.render(engine, &mut params)?;
            }

            if has_observers {
                info.stage = RenderingGroupStage::PostTransparent;
                self.observable.notify(&info, mask, engine);
                stats.notifications += 1;
            }
        }

        Ok(stats)
    }

    /// Issue the depth/stencil clear unless one was already issued this frame.
    fn clear_depth_stencil(&mut self, engine: &mut Engine, auto_clear: AutoClear) -> bool {
        if self.depth_stencil_cleared {
            return false;
        }
        engine.clear(None, false, auto_clear.depth, auto_clear.stencil);
        self.depth_stencil_cleared = true;
        true
    }

    /// Dispose every group. Registered comparators and observers stay.
    pub fn dispose(&mut self) {
        for slot in self.groups.iter_mut() {
            if let Some(mut group) = slot.take() {
                group.dispose();
            }
        }
    }
}

fn check_group_id(id: usize) -> GraphicsResult<()> {
    if (MIN_RENDERING_GROUPS..MAX_RENDERING_GROUPS).contains(&id) {
        Ok(())
    } else {
        log::error!(
            "RenderingManager: rendering group {} is outside {}..{}",
            id,
            MIN_RENDERING_GROUPS,
            MAX_RENDERING_GROUPS
        );
        Err(GraphicsError::InvalidRenderingGroup(id))
    }
}
