use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ember_graphics::types::VertexBufferView;
use ember_graphics::{
    AlphaMode, BufferHandle, Camera, CompareFunction, EffectCreationOptions, EffectId,
    EffectSource, Engine, EngineOptions, GraphicsResult, HeadlessContext, RenderParams,
    RenderingManager, SubMesh, Transparency, VertexBuffers, VertexKind,
};

const VERTEX_SHADER: &str = "\
layout(location = 0) in vec3 position;
uniform mat4 world;
void main() {
    gl_Position = world * vec4(position, 1.0);
}
";

const FRAGMENT_SHADER: &str = "\
uniform vec4 color;
layout(location = 0) out vec4 fragColor;
void main() {
    fragColor = color;
}
";

fn headless_engine() -> Engine {
    Engine::new(Box::new(HeadlessContext::new()), EngineOptions::default())
        .expect("headless engine")
}

fn create_effect(engine: &mut Engine) -> EffectId {
    engine
        .create_effect(
            EffectSource::inline(VERTEX_SHADER, FRAGMENT_SHADER),
            EffectCreationOptions::new().with_uniforms(["world", "color"]),
        )
        .expect("effect")
}

struct BenchSubMesh {
    transparency: Transparency,
    distance: f32,
    effect: EffectId,
    vertex_buffers: VertexBuffers,
    index_buffer: BufferHandle,
}

impl SubMesh for BenchSubMesh {
    fn rendering_group_id(&self) -> usize {
        0
    }

    fn transparency(&self) -> Transparency {
        self.transparency
    }

    fn distance_to(&self, _camera: &Camera) -> f32 {
        self.distance
    }

    fn effect(&self) -> Option<EffectId> {
        Some(self.effect)
    }

    fn vertex_buffers(&self) -> &VertexBuffers {
        &self.vertex_buffers
    }

    fn index_buffer(&self) -> Option<BufferHandle> {
        Some(self.index_buffer)
    }

    fn index_range(&self) -> (u32, u32) {
        (0, 6)
    }

    fn bind(&self, engine: &mut Engine, effect: EffectId) -> GraphicsResult<()> {
        if self.transparency == Transparency::AlphaBlend {
            engine.set_alpha_mode(AlphaMode::Combine, false);
        }
        engine.set_float4(effect, "color", 1.0, 1.0, 1.0, 1.0)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// State cache
// ---------------------------------------------------------------------------

fn bench_apply_unchanged_states(c: &mut Criterion) {
    let mut engine = headless_engine();
    engine.apply_states();
    c.bench_function("apply_states_unchanged", |b| {
        b.iter(|| black_box(engine.apply_states()));
    });
}

fn bench_apply_toggled_states(c: &mut Criterion) {
    let mut engine = headless_engine();
    let mut toggle = false;
    c.bench_function("apply_states_toggled", |b| {
        b.iter(|| {
            toggle = !toggle;
            engine.set_depth_write(toggle);
            engine.set_depth_function(if toggle {
                CompareFunction::Less
            } else {
                CompareFunction::LessEqual
            });
            engine.set_alpha_mode(
                if toggle {
                    AlphaMode::Combine
                } else {
                    AlphaMode::Disable
                },
                true,
            );
            black_box(engine.apply_states())
        });
    });
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

fn bench_effect_cache_hit(c: &mut Criterion) {
    let mut engine = headless_engine();
    create_effect(&mut engine);
    c.bench_function("effect_cache_hit", |b| {
        b.iter(|| black_box(create_effect(&mut engine)));
    });
}

// ---------------------------------------------------------------------------
// Frame scheduling
// ---------------------------------------------------------------------------

fn bench_render_frame(c: &mut Criterion) {
    let mut engine = headless_engine();
    let effect = create_effect(&mut engine);
    let positions = engine
        .create_vertex_buffer(&[-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0])
        .expect("vertex buffer");
    let index_buffer = engine
        .create_index_buffer(&[0, 1, 2, 0, 2, 3])
        .expect("index buffer");
    let vertex_buffers =
        VertexBuffers::new().with(VertexKind::Position, VertexBufferView::new(positions, 3));

    let sub_meshes: Vec<Rc<dyn SubMesh>> = (0..256)
        .map(|i| {
            Rc::new(BenchSubMesh {
                transparency: if i % 4 == 0 {
                    Transparency::AlphaBlend
                } else {
                    Transparency::Opaque
                },
                distance: (i * 37 % 101) as f32,
                effect,
                vertex_buffers: vertex_buffers.clone(),
                index_buffer,
            }) as Rc<dyn SubMesh>
        })
        .collect();

    let mut manager = RenderingManager::new();
    let camera = Camera::default();
    c.bench_function("render_frame_256_sub_meshes", |b| {
        b.iter(|| {
            manager.reset();
            for sub_mesh in &sub_meshes {
                manager.dispatch(Rc::clone(sub_mesh)).expect("dispatch");
            }
            let stats = manager
                .render(&mut engine, RenderParams::new().with_camera(camera))
                .expect("render");
            engine.end_frame();
            black_box(stats)
        });
    });
}

criterion_group!(state_benches, bench_apply_unchanged_states, bench_apply_toggled_states);
criterion_group!(effect_benches, bench_effect_cache_hit);
criterion_group!(frame_benches, bench_render_frame);
criterion_main!(state_benches, effect_benches, frame_benches);
