//! Common utilities for engine and scheduler integration tests.
//!
//! Every test runs against a [`HeadlessContext`] and inspects the calls it
//! recorded through a shared [`ContextLog`].

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ember_graphics::rendering::{MeshId, ParticleSystem, SpriteBatch};
use ember_graphics::types::VertexBufferView;
use ember_graphics::{
    BufferHandle, Camera, ContextLog, EffectCreationOptions, EffectId, EffectSource, Engine,
    EngineOptions, GraphicsError, GraphicsResult, HeadlessContext, SubMesh, Transparency, VertexBuffers,
    VertexKind,
};

/// Minimal vertex stage with one optional broken variant.
pub const TEST_VERTEX_SHADER: &str = "\
layout(location = 0) in vec3 position;
#ifdef BROKEN
#error broken variant
#endif
uniform mat4 world;
void main() {
    gl_Position = world * vec4(position, 1.0);
}
";

/// Minimal fragment stage.
pub const TEST_FRAGMENT_SHADER: &str = "\
uniform vec4 color;
layout(location = 0) out vec4 fragColor;
void main() {
    fragColor = color;
}
";

/// Positions of a unit quad.
pub const QUAD_POSITIONS: [f32; 12] = [
    -1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0, //
    1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0,
];

/// Indices of a unit quad.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Route `log` output to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Engine over a default headless context.
pub fn headless_engine() -> (Engine, ContextLog) {
    engine_with(HeadlessContext::new(), EngineOptions::default())
}

/// Engine over a configured headless context.
pub fn engine_with(context: HeadlessContext, options: EngineOptions) -> (Engine, ContextLog) {
    init_logging();
    let log = context.log();
    let engine = Engine::new(Box::new(context), options).expect("engine creation");
    (engine, log)
}

/// Options of the inline test effect.
pub fn test_effect_options() -> EffectCreationOptions {
    EffectCreationOptions::new().with_uniforms(["world", "color"])
}

/// Create the inline test effect with extra defines.
pub fn create_test_effect(engine: &mut Engine, defines: &[&str]) -> EffectId {
    engine
        .create_effect(
            EffectSource::inline(TEST_VERTEX_SHADER, TEST_FRAGMENT_SHADER),
            test_effect_options().with_defines(defines.iter().copied()),
        )
        .expect("effect creation")
}

/// Number of shader stages compiled so far.
pub fn compiled_stages(log: &ContextLog) -> usize {
    log.count(|call| matches!(call, ember_graphics::ContextCall::CompileShader(_)))
}

/// GPU buffers of a unit quad.
pub struct QuadBuffers {
    pub vertex_buffers: VertexBuffers,
    pub index_buffer: BufferHandle,
}

impl QuadBuffers {
    pub fn new(engine: &mut Engine) -> Self {
        let positions = engine
            .create_vertex_buffer(&QUAD_POSITIONS)
            .expect("vertex buffer");
        let index_buffer = engine.create_index_buffer(&QUAD_INDICES).expect("index buffer");
        Self {
            vertex_buffers: VertexBuffers::new()
                .with(VertexKind::Position, VertexBufferView::new(positions, 3)),
            index_buffer,
        }
    }
}

// ============================================================================
// Drawables
// ============================================================================

/// Names of drawables in the order they were asked to draw.
pub type DrawOrder = Rc<RefCell<Vec<String>>>;

pub fn draw_order() -> DrawOrder {
    Rc::new(RefCell::new(Vec::new()))
}

/// Sub-mesh that records its name when bound.
pub struct TestSubMesh {
    pub name: String,
    pub group: usize,
    pub transparency: Transparency,
    pub alpha_index: i32,
    pub distance: f32,
    pub effect: Option<EffectId>,
    pub vertex_buffers: VertexBuffers,
    pub index_buffer: Option<BufferHandle>,
    pub index_count: u32,
    pub failure: Option<GraphicsError>,
    pub record_alpha_testing: bool,
    pub order: DrawOrder,
}

impl TestSubMesh {
    pub fn new(name: &str, quad: &QuadBuffers, effect: EffectId, order: &DrawOrder) -> Self {
        Self {
            name: name.to_string(),
            group: 0,
            transparency: Transparency::Opaque,
            alpha_index: 0,
            distance: 0.0,
            effect: Some(effect),
            vertex_buffers: quad.vertex_buffers.clone(),
            index_buffer: Some(quad.index_buffer),
            index_count: QUAD_INDICES.len() as u32,
            failure: None,
            record_alpha_testing: false,
            order: Rc::clone(order),
        }
    }

    /// Record the engine's alpha-testing flag next to the name.
    pub fn recording_alpha_testing(mut self) -> Self {
        self.record_alpha_testing = true;
        self
    }

    pub fn in_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    pub fn with_transparency(mut self, transparency: Transparency) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn with_alpha_index(mut self, alpha_index: i32) -> Self {
        self.alpha_index = alpha_index;
        self
    }

    pub fn at_distance(mut self, distance: f32) -> Self {
        self.distance = distance;
        self
    }

    pub fn without_effect(mut self) -> Self {
        self.effect = None;
        self
    }

    /// Make `bind` fail with `err` after recording the name.
    pub fn failing_with(mut self, err: GraphicsError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn shared(self) -> Rc<dyn SubMesh> {
        Rc::new(self)
    }
}

impl SubMesh for TestSubMesh {
    fn rendering_group_id(&self) -> usize {
        self.group
    }

    fn transparency(&self) -> Transparency {
        self.transparency
    }

    fn alpha_index(&self) -> i32 {
        self.alpha_index
    }

    fn distance_to(&self, _camera: &Camera) -> f32 {
        self.distance
    }

    fn effect(&self) -> Option<EffectId> {
        self.effect
    }

    fn vertex_buffers(&self) -> &VertexBuffers {
        &self.vertex_buffers
    }

    fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    fn index_range(&self) -> (u32, u32) {
        (0, self.index_count)
    }

    fn bind(&self, engine: &mut Engine, _effect: EffectId) -> GraphicsResult<()> {
        let entry = if self.record_alpha_testing {
            format!("{}:alpha_testing={}", self.name, engine.alpha_testing())
        } else {
            self.name.clone()
        };
        self.order.borrow_mut().push(entry);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Sprite batch that records its name when rendered.
pub struct TestSprites {
    pub name: String,
    pub group: usize,
    pub layer_mask: u32,
    pub failure: Option<GraphicsError>,
    pub order: DrawOrder,
}

impl TestSprites {
    pub fn new(name: &str, group: usize, order: &DrawOrder) -> Self {
        Self {
            name: name.to_string(),
            group,
            layer_mask: Camera::DEFAULT_LAYER_MASK,
            failure: None,
            order: Rc::clone(order),
        }
    }

    pub fn failing_with(mut self, err: GraphicsError) -> Self {
        self.failure = Some(err);
        self
    }
}

impl SpriteBatch for TestSprites {
    fn rendering_group_id(&self) -> usize {
        self.group
    }

    fn layer_mask(&self) -> u32 {
        self.layer_mask
    }

    fn render(&self, engine: &mut Engine) -> GraphicsResult<()> {
        self.order
            .borrow_mut()
            .push(format!("{}:stencil={}", self.name, engine.stencil_buffer()));
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Particle system that records its name when rendered.
pub struct TestParticles {
    pub name: String,
    pub group: usize,
    pub layer_mask: u32,
    pub emitter: Option<MeshId>,
    pub particles: usize,
    pub failure: Option<GraphicsError>,
    pub order: DrawOrder,
}

impl TestParticles {
    pub fn new(name: &str, group: usize, order: &DrawOrder) -> Self {
        Self {
            name: name.to_string(),
            group,
            layer_mask: Camera::DEFAULT_LAYER_MASK,
            emitter: None,
            particles: 10,
            failure: None,
            order: Rc::clone(order),
        }
    }

    pub fn attached_to(mut self, emitter: MeshId) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn failing_with(mut self, err: GraphicsError) -> Self {
        self.failure = Some(err);
        self
    }
}

impl ParticleSystem for TestParticles {
    fn rendering_group_id(&self) -> usize {
        self.group
    }

    fn layer_mask(&self) -> u32 {
        self.layer_mask
    }

    fn emitter(&self) -> Option<MeshId> {
        self.emitter
    }

    fn render(&self, _engine: &mut Engine) -> GraphicsResult<usize> {
        self.order.borrow_mut().push(self.name.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.particles),
        }
    }
}
