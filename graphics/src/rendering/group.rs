//! One numbered rendering group.

use std::fmt;
use std::ops::AddAssign;
use std::rc::Rc;

use super::drawable::{
    Camera, MeshId, ParticleSystem, SortEntry, SpriteBatch, SubMesh, SubMeshComparator,
    Transparency, comparator, default_transparent_sort,
};
use crate::engine::Engine;
use crate::error::GraphicsResult;
use crate::types::AlphaMode;

/// The three sub-mesh buckets handed to a custom render function.
#[derive(Clone, Copy)]
pub struct SubMeshBuckets<'a> {
    pub opaque: &'a [Rc<dyn SubMesh>],
    pub alpha_test: &'a [Rc<dyn SubMesh>],
    pub transparent: &'a [Rc<dyn SubMesh>],
}

/// Replaces the default drawing of a group's sub-meshes.
pub type CustomRenderFn<'a> = &'a mut dyn FnMut(&mut Engine, SubMeshBuckets<'_>);

/// Per-frame inputs of [`RenderingManager::render`](super::RenderingManager::render).
pub struct RenderParams<'a> {
    /// Camera for sorting and layer filtering; without one nothing is
    /// filtered and distances are zero.
    pub camera: Option<Camera>,
    /// When set, particle systems attached to other meshes are skipped.
    pub active_meshes: Option<&'a [MeshId]>,
    pub render_sprites: bool,
    pub render_particles: bool,
    /// Sprite batches dispatched at the start of the frame.
    pub sprite_batches: &'a [Rc<dyn SpriteBatch>],
    pub custom_render: Option<CustomRenderFn<'a>>,
}

impl Default for RenderParams<'_> {
    fn default() -> Self {
        Self {
            camera: None,
            active_meshes: None,
            render_sprites: true,
            render_particles: true,
            sprite_batches: &[],
            custom_render: None,
        }
    }
}

impl<'a> RenderParams<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_active_meshes(mut self, active_meshes: &'a [MeshId]) -> Self {
        self.active_meshes = Some(active_meshes);
        self
    }

    pub fn with_sprite_batches(mut self, sprite_batches: &'a [Rc<dyn SpriteBatch>]) -> Self {
        self.sprite_batches = sprite_batches;
        self
    }

    pub fn with_sprites(mut self, enabled: bool) -> Self {
        self.render_sprites = enabled;
        self
    }

    pub fn with_particles(mut self, enabled: bool) -> Self {
        self.render_particles = enabled;
        self
    }

    pub fn with_custom_render(mut self, render: CustomRenderFn<'a>) -> Self {
        self.custom_render = Some(render);
        self
    }
}

/// Counters of one [`RenderingManager::render`](super::RenderingManager::render).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Sub-meshes drawn.
    pub sub_meshes: usize,
    /// Sub-meshes skipped because their effect was missing, not ready or
    /// their draw failed, plus sprite batches and particle systems whose
    /// render failed.
    pub skipped: usize,
    pub sprite_batches: usize,
    /// Particles reported by the rendered particle systems.
    pub particles: usize,
    /// Stage notifications fired.
    pub notifications: usize,
    /// Depth/stencil auto-clears issued.
    pub clears: usize,
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, other: Self) {
        self.sub_meshes += other.sub_meshes;
        self.skipped += other.skipped;
        self.sprite_batches += other.sprite_batches;
        self.particles += other.particles;
        self.notifications += other.notifications;
        self.clears += other.clears;
    }
}

/// Dispatch lists and sort order of one group.
pub struct RenderingGroup {
    index: usize,
    opaque: Vec<Rc<dyn SubMesh>>,
    alpha_test: Vec<Rc<dyn SubMesh>>,
    transparent: Vec<Rc<dyn SubMesh>>,
    sprites: Vec<Rc<dyn SpriteBatch>>,
    particles: Vec<Rc<dyn ParticleSystem>>,
    opaque_sort: Option<SubMeshComparator>,
    alpha_test_sort: Option<SubMeshComparator>,
    transparent_sort: SubMeshComparator,
    has_custom_transparent_sort: bool,
}

impl fmt::Debug for RenderingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingGroup")
            .field("index", &self.index)
            .field("opaque", &self.opaque.len())
            .field("alpha_test", &self.alpha_test.len())
            .field("transparent", &self.transparent.len())
            .field("sprites", &self.sprites.len())
            .field("particles", &self.particles.len())
            .finish_non_exhaustive()
    }
}

impl RenderingGroup {
    /// Create a group; a missing transparent comparator means
    /// [`default_transparent_sort`].
    pub fn new(
        index: usize,
        opaque_sort: Option<SubMeshComparator>,
        alpha_test_sort: Option<SubMeshComparator>,
        transparent_sort: Option<SubMeshComparator>,
    ) -> Self {
        let mut group = Self {
            index,
            opaque: Vec::new(),
            alpha_test: Vec::new(),
            transparent: Vec::new(),
            sprites: Vec::new(),
            particles: Vec::new(),
            opaque_sort,
            alpha_test_sort,
            transparent_sort: comparator(default_transparent_sort),
            has_custom_transparent_sort: false,
        };
        group.set_transparent_sort(transparent_sort);
        group
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Unsorted opaque geometry without a comparator.
    pub fn set_opaque_sort(&mut self, sort: Option<SubMeshComparator>) {
        self.opaque_sort = sort;
    }

    pub fn set_alpha_test_sort(&mut self, sort: Option<SubMeshComparator>) {
        self.alpha_test_sort = sort;
    }

    /// `None` restores [`default_transparent_sort`].
    pub fn set_transparent_sort(&mut self, sort: Option<SubMeshComparator>) {
        self.has_custom_transparent_sort = sort.is_some();
        self.transparent_sort = sort.unwrap_or_else(|| comparator(default_transparent_sort));
    }

    pub fn has_opaque_sort(&self) -> bool {
        self.opaque_sort.is_some()
    }

    pub fn has_alpha_test_sort(&self) -> bool {
        self.alpha_test_sort.is_some()
    }

    pub fn has_custom_transparent_sort(&self) -> bool {
        self.has_custom_transparent_sort
    }

    pub fn opaque_sub_meshes(&self) -> &[Rc<dyn SubMesh>] {
        &self.opaque
    }

    pub fn alpha_test_sub_meshes(&self) -> &[Rc<dyn SubMesh>] {
        &self.alpha_test
    }

    pub fn transparent_sub_meshes(&self) -> &[Rc<dyn SubMesh>] {
        &self.transparent
    }

    pub fn sprite_batches(&self) -> &[Rc<dyn SpriteBatch>] {
        &self.sprites
    }

    pub fn particle_systems(&self) -> &[Rc<dyn ParticleSystem>] {
        &self.particles
    }

    /// Whether nothing was dispatched since the last [`prepare`](Self::prepare).
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty()
            && self.alpha_test.is_empty()
            && self.transparent.is_empty()
            && self.sprites.is_empty()
            && self.particles.is_empty()
    }

    /// Add a sub-mesh to the bucket of its transparency.
    pub fn dispatch(&mut self, sub_mesh: Rc<dyn SubMesh>) {
        match sub_mesh.transparency() {
            Transparency::AlphaBlend => self.transparent.push(sub_mesh),
            Transparency::AlphaTest => self.alpha_test.push(sub_mesh),
            Transparency::Opaque => self.opaque.push(sub_mesh),
        }
    }

    pub fn dispatch_sprites(&mut self, batch: Rc<dyn SpriteBatch>) {
        self.sprites.push(batch);
    }

    pub fn dispatch_particles(&mut self, system: Rc<dyn ParticleSystem>) {
        self.particles.push(system);
    }

    /// Clear the dispatch lists, keeping the comparators.
    pub fn prepare(&mut self) {
        self.opaque.clear();
        self.alpha_test.clear();
        self.transparent.clear();
        self.sprites.clear();
        self.particles.clear();
    }

    /// Drop the dispatch lists and the custom comparators.
    pub fn dispose(&mut self) {
        self.prepare();
        self.opaque.shrink_to_fit();
        self.alpha_test.shrink_to_fit();
        self.transparent.shrink_to_fit();
        self.sprites.shrink_to_fit();
        self.particles.shrink_to_fit();
        self.opaque_sort = None;
        self.alpha_test_sort = None;
        self.set_transparent_sort(None);
    }

    /// Draw the group: opaque, alpha-tested, sprites, particles, then
    /// transparent geometry. The stencil test is off for everything after
    /// the alpha-tested bucket and restored at the end, also when a fatal
    /// error stops the group.
    ///
    /// Errors of a single drawable are logged and counted as skipped; only
    /// fatal errors are returned.
    pub fn render(&mut self, engine: &mut Engine, params: &mut RenderParams<'_>) -> GraphicsResult<RenderStats> {
        let mut stats = RenderStats::default();

        if let Some(custom_render) = params.custom_render.as_mut() {
            custom_render(
                engine,
                SubMeshBuckets {
                    opaque: &self.opaque,
                    alpha_test: &self.alpha_test,
                    transparent: &self.transparent,
                },
            );
            return Ok(stats);
        }

        let camera = params.camera;
        render_bucket(engine, &self.opaque, self.opaque_sort.as_ref(), camera, &mut stats)?;

        if !self.alpha_test.is_empty() {
            let alpha_testing = engine.alpha_testing();
            engine.set_alpha_testing(true);
            let result = render_bucket(
                engine,
                &self.alpha_test,
                self.alpha_test_sort.as_ref(),
                camera,
                &mut stats,
            );
            engine.set_alpha_testing(alpha_testing);
            result?;
        }

        let stencil = engine.stencil_buffer();
        engine.set_stencil_buffer(false);
        let result = self.render_unstenciled(engine, params, &mut stats);
        engine.set_stencil_buffer(stencil);
        result?;

        Ok(stats)
    }

    /// Sprites, particles and transparent geometry.
    fn render_unstenciled(
        &self,
        engine: &mut Engine,
        params: &RenderParams<'_>,
        stats: &mut RenderStats,
    ) -> GraphicsResult<()> {
        let camera = params.camera;

        if params.render_sprites {
            for batch in &self.sprites {
                if !camera.map_or(true, |camera| camera.sees(batch.layer_mask())) {
                    continue;
                }
                match batch.render(engine) {
                    Ok(()) => stats.sprite_batches += 1,
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        log::warn!("RenderingGroup {}: skipped a sprite batch: {}", self.index, err);
                        stats.skipped += 1;
                    }
                }
            }
        }

        if params.render_particles {
            for system in &self.particles {
                if !camera.map_or(true, |camera| camera.sees(system.layer_mask())) {
                    continue;
                }
                let emitter_active = match (system.emitter(), params.active_meshes) {
                    (Some(emitter), Some(active)) => active.contains(&emitter),
                    _ => true,
                };
                if !emitter_active {
                    continue;
                }
                match system.render(engine) {
                    Ok(particles) => stats.particles += particles,
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        log::warn!("RenderingGroup {}: skipped a particle system: {}", self.index, err);
                        stats.skipped += 1;
                    }
                }
            }
        }

        if !self.transparent.is_empty() {
            let result = render_bucket(
                engine,
                &self.transparent,
                Some(&self.transparent_sort),
                camera,
                stats,
            );
            engine.set_alpha_mode(AlphaMode::Disable, false);
            result?;
        }

        Ok(())
    }
}

/// Sort a bucket (when a comparator is given) and draw it.
fn render_bucket(
    engine: &mut Engine,
    bucket: &[Rc<dyn SubMesh>],
    sort: Option<&SubMeshComparator>,
    camera: Option<Camera>,
    stats: &mut RenderStats,
) -> GraphicsResult<()> {
    if bucket.is_empty() {
        return Ok(());
    }
    match sort {
        Some(sort) => {
            let mut entries: Vec<SortEntry> = bucket
                .iter()
                .map(|sub_mesh| SortEntry {
                    distance: camera.map_or(0.0, |camera| sub_mesh.distance_to(&camera)),
                    sub_mesh: Rc::clone(sub_mesh),
                })
                .collect();
            entries.sort_by(|a, b| sort(a, b));
            for entry in &entries {
                render_sub_mesh(engine, entry.sub_mesh.as_ref(), stats)?;
            }
        }
        None => {
            for sub_mesh in bucket {
                render_sub_mesh(engine, sub_mesh.as_ref(), stats)?;
            }
        }
    }
    Ok(())
}

/// Draw one sub-mesh, skipping it when its effect cannot be used. Only
/// fatal errors abort the frame.
fn render_sub_mesh(engine: &mut Engine, sub_mesh: &dyn SubMesh, stats: &mut RenderStats) -> GraphicsResult<()> {
    let Some(effect) = sub_mesh.effect().filter(|&effect| engine.is_effect_ready(effect)) else {
        stats.skipped += 1;
        return Ok(());
    };

    let result = (|| {
        engine.enable_effect(effect)?;
        sub_mesh.bind(engine, effect)?;
        let index_buffer = sub_mesh.index_buffer();
        engine.bind_buffers(sub_mesh.vertex_buffers(), index_buffer, effect)?;
        let (start, count) = sub_mesh.index_range();
        if index_buffer.is_some() {
            engine.draw(sub_mesh.use_triangles(), start, count, sub_mesh.instances_count())
        } else {
            engine.draw_unindexed(sub_mesh.use_triangles(), start, count, sub_mesh.instances_count())
        }
    })();

    match result {
        Ok(()) => stats.sub_meshes += 1,
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => {
            log::warn!("RenderingGroup: skipped a sub-mesh: {}", err);
            stats.skipped += 1;
        }
    }
    Ok(())
}
