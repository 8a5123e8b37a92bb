//! Engine integration tests.
//!
//! These tests drive the engine through a [`HeadlessContext`] and check the
//! calls that reach the context.
//!
//! # Test Categories
//!
//! - **State Cache Tests**: redundant state changes never reach the context
//! - **Effect Tests**: caching, fallbacks, deferred linking, callbacks
//! - **Binding Tests**: vertex buffers, uniforms and textures
//! - **Frame Tests**: render loop, render targets, surface size, diagnostics
//!
//! ```bash
//! cargo test --test engine_tests
//! ```

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use rstest::rstest;

use common::{
    QuadBuffers, TEST_FRAGMENT_SHADER, TEST_VERTEX_SHADER, compiled_stages, create_test_effect,
    engine_with, headless_engine, test_effect_options,
};
use ember_graphics::effect::EffectFallbacks;
use ember_graphics::types::{
    BufferTarget, Capability, ClearMask, IndexType, RenderTargetOptions, TextureData,
};
use ember_graphics::{
    AlphaMode, CompareFunction, ContextCall, ContextLog, EffectCreationOptions, EffectSource, EffectStatus,
    EngineCapabilities, EngineOptions, GraphicsError, HeadlessContext, SamplingMode, Size, TextureFormat,
    TextureType,
};

fn position_of(calls: &[ContextCall], predicate: impl Fn(&ContextCall) -> bool) -> usize {
    calls
        .iter()
        .position(|call| predicate(call))
        .expect("call was not recorded")
}

fn clear_masks(log: &ContextLog) -> Vec<ClearMask> {
    log.calls()
        .into_iter()
        .filter_map(|call| match call {
            ContextCall::Clear { mask, .. } => Some(mask),
            _ => None,
        })
        .collect()
}

// ============================================================================
// State Cache Tests
// ============================================================================

/// Setting a state to the value it already has issues nothing.
#[test]
fn test_redundant_state_changes_are_filtered() {
    let (mut engine, log) = headless_engine();
    engine.apply_states();
    log.clear();

    engine.set_depth_function(CompareFunction::Greater);
    engine.set_depth_function(CompareFunction::Greater);
    assert_eq!(engine.apply_states(), 1);
    assert_eq!(log.state_mutations(), 1);

    engine.set_depth_function_to_greater();
    assert_eq!(engine.apply_states(), 0);
    assert_eq!(log.state_mutations(), 1);
}

/// The number of calls equals the number of fields that changed.
#[test]
fn test_apply_counts_changed_fields() {
    let (mut engine, log) = headless_engine();
    engine.apply_states();
    log.clear();

    engine.set_depth_write(false);
    engine.set_stencil_buffer(true);
    engine.set_color_write(false);
    assert_eq!(engine.apply_states(), 3);
    assert_eq!(log.state_mutations(), 3);
}

/// Blending modes toggle depth writes unless told otherwise.
#[rstest]
#[case::combine(AlphaMode::Combine, false, false)]
#[case::add(AlphaMode::Add, false, false)]
#[case::keep_depth_write(AlphaMode::Combine, true, true)]
fn test_alpha_mode_depth_write(
    #[case] mode: AlphaMode,
    #[case] no_depth_write_change: bool,
    #[case] expected_depth_write: bool,
) {
    let (mut engine, _log) = headless_engine();
    engine.set_alpha_mode(mode, no_depth_write_change);
    assert_eq!(engine.alpha_mode(), mode);
    assert_eq!(engine.depth_write(), expected_depth_write);

    engine.set_alpha_mode(AlphaMode::Disable, false);
    assert!(engine.depth_write());
}

/// A soft wipe keeps the state cache; a brute force wipe re-applies it.
#[test]
fn test_brute_force_wipe_reapplies_states() {
    let (mut engine, log) = headless_engine();
    engine.apply_states();

    engine.wipe_caches(false);
    log.clear();
    assert_eq!(engine.apply_states(), 0);

    engine.wipe_caches(true);
    assert!(engine.apply_states() > 0);
    assert!(log.state_mutations() > 0);
}

/// Clearing without any buffer selected issues nothing.
#[test]
fn test_clear_mask() {
    let (mut engine, log) = headless_engine();
    engine.clear(None, true, false, false);
    assert_eq!(log.clears(), 0);

    engine.clear(Some([0.0, 0.0, 0.0, 1.0]), true, true, false);
    assert_eq!(log.clears(), 1);
}

/// The default framebuffer only gets stencil clears when it has a stencil
/// buffer; render targets always do.
#[test]
fn test_stencil_clear_needs_stencil_buffer() {
    let (mut engine, log) = headless_engine();
    engine.clear(None, false, true, true);
    assert_eq!(clear_masks(&log), [ClearMask::DEPTH]);

    let target = engine
        .create_render_target_texture(Size::new(32, 32), RenderTargetOptions::default())
        .unwrap();
    engine.bind_framebuffer(target, None, None, None).unwrap();
    log.clear();
    engine.clear(None, false, true, true);
    assert_eq!(clear_masks(&log), [ClearMask::DEPTH | ClearMask::STENCIL]);

    let (mut engine, log) = engine_with(HeadlessContext::new(), EngineOptions::default().with_stencil(true));
    engine.clear(None, false, true, true);
    assert_eq!(clear_masks(&log), [ClearMask::DEPTH | ClearMask::STENCIL]);
}

/// A scissored clear enables the test around the clear and puts the previous
/// scissor state back.
#[test]
fn test_scissor_clear_restores_scissor() {
    let (mut engine, log) = engine_with(HeadlessContext::new(), EngineOptions::default().with_stencil(true));
    let scissor_toggles = |enabled: bool| {
        log.count(|call| *call == ContextCall::SetCapability(Capability::ScissorTest, enabled))
    };

    engine.scissor_clear(10, 20, 30, 40, [1.0, 0.0, 0.0, 1.0]);
    let calls = log.calls();
    let enable = position_of(&calls, |call| *call == ContextCall::SetCapability(Capability::ScissorTest, true));
    let rect = position_of(&calls, |call| {
        *call == ContextCall::Scissor { x: 10, y: 20, width: 30, height: 40 }
    });
    let clear = position_of(&calls, |call| call.is_clear());
    let disable = position_of(&calls, |call| *call == ContextCall::SetCapability(Capability::ScissorTest, false));
    assert!(enable < clear && rect < clear);
    assert!(clear < disable);
    assert_eq!(clear_masks(&log), [ClearMask::COLOR | ClearMask::DEPTH | ClearMask::STENCIL]);
    assert!(!engine.is_scissor_enabled());

    engine.enable_scissor(0, 0, 8, 8);
    log.clear();
    engine.scissor_clear(10, 20, 30, 40, [0.0; 4]);
    assert!(engine.is_scissor_enabled());
    assert_eq!(scissor_toggles(true), 0);
    assert_eq!(scissor_toggles(false), 0);
    assert_eq!(
        log.calls().last(),
        Some(&ContextCall::Scissor { x: 0, y: 0, width: 8, height: 8 })
    );
}

/// Viewport changes are cached.
#[test]
fn test_viewport_is_cached() {
    let (mut engine, log) = headless_engine();
    let viewport_calls = || log.count(|call| matches!(call, ContextCall::Viewport { .. }));

    assert_eq!(engine.set_direct_viewport(0, 0, 640, 480), None);
    assert_eq!(engine.set_direct_viewport(0, 0, 640, 480), Some((0, 0, 640, 480)));
    assert_eq!(viewport_calls(), 1);
}

// ============================================================================
// Effect Tests
// ============================================================================

/// Same sources and defines give the same effect, compiled once.
#[test]
fn test_effect_cache_identity() {
    let (mut engine, log) = headless_engine();
    let first = create_test_effect(&mut engine, &[]);
    let second = create_test_effect(&mut engine, &[]);
    assert_eq!(first, second);
    assert_eq!(compiled_stages(&log), 2);
    assert_eq!(engine.effect_count(), 1);

    let variant = create_test_effect(&mut engine, &["NORMAL"]);
    assert_ne!(first, variant);
    assert_eq!(compiled_stages(&log), 4);
}

/// The built-in library provides the default effect.
#[test]
fn test_named_effect_from_store() {
    let (mut engine, _log) = headless_engine();
    let id = engine
        .create_effect(
            EffectSource::named("default"),
            EffectCreationOptions::new().with_uniforms(["world", "viewProjection", "vDiffuseColor"]),
        )
        .unwrap();
    let effect = engine.effect(id).unwrap();
    assert!(effect.is_ready());
    assert_eq!(effect.attribute_location("position"), Some(0));
    assert!(effect.uniform_location("vDiffuseColor").is_some());
}

/// A missing store entry yields a failed effect, cached like any other.
#[test]
fn test_unknown_named_effect() {
    let (mut engine, log) = headless_engine();
    let id = engine
        .create_effect(EffectSource::named("missing"), test_effect_options())
        .unwrap();

    let effect = engine.effect(id).unwrap();
    assert_eq!(effect.status(), EffectStatus::Failed);
    assert!(effect.compilation_error().unwrap().contains("missingVertexShader"));
    assert_eq!(compiled_stages(&log), 0);

    let again = engine
        .create_effect(EffectSource::named("missing"), test_effect_options())
        .unwrap();
    assert_eq!(again, id);
    assert_eq!(engine.effect_count(), 1);
    assert!(matches!(engine.enable_effect(id), Err(GraphicsError::EffectNotReady(_))));
}

/// An unresolved include reports through `on_error` once and is not
/// resolved again on the next request.
#[test]
fn test_unresolved_include_reports_error() {
    let (mut engine, log) = headless_engine();
    engine
        .shader_store_mut()
        .register_shader("brokenVertexShader", "#include<doesNotExist>\nvoid main() {}\n");
    engine
        .shader_store_mut()
        .register_shader("brokenPixelShader", TEST_FRAGMENT_SHADER);

    let messages = Rc::new(RefCell::new(Vec::new()));
    let options = || {
        test_effect_options().on_error({
            let messages = Rc::clone(&messages);
            move |_, message| messages.borrow_mut().push(message.to_string())
        })
    };

    let first = engine.create_effect(EffectSource::named("broken"), options()).unwrap();
    let second = engine.create_effect(EffectSource::named("broken"), options()).unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.effect_count(), 1);
    assert!(!engine.is_effect_ready(first));
    assert_eq!(compiled_stages(&log), 0);

    let messages = messages.borrow();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("doesNotExist"));
}

/// A failing variant retries without its lowest fallback rank.
#[test]
fn test_effect_fallbacks() {
    let (mut engine, _log) = headless_engine();
    let compiled = Rc::new(Cell::new(0));
    let errors = Rc::new(Cell::new(0));

    let mut fallbacks = EffectFallbacks::new();
    fallbacks.add_fallback(0, "BROKEN");
    let id = engine
        .create_effect(
            EffectSource::inline(TEST_VERTEX_SHADER, TEST_FRAGMENT_SHADER),
            test_effect_options()
                .with_defines(["BROKEN", "NORMAL"])
                .with_fallbacks(fallbacks)
                .on_compiled({
                    let compiled = Rc::clone(&compiled);
                    move |_| compiled.set(compiled.get() + 1)
                })
                .on_error({
                    let errors = Rc::clone(&errors);
                    move |_, _| errors.set(errors.get() + 1)
                }),
        )
        .unwrap();

    let effect = engine.effect(id).unwrap();
    assert!(effect.is_ready());
    assert_eq!(effect.defines(), ["NORMAL".to_string()]);
    assert_eq!(effect.compile_attempts(), 2);

    assert!(engine.is_effect_ready(id));
    assert_eq!(compiled.get(), 1);
    assert_eq!(errors.get(), 0);
}

/// Without fallbacks a failing effect stays failed and reports once.
#[test]
fn test_failed_effect() {
    let (mut engine, _log) = headless_engine();
    let messages = Rc::new(RefCell::new(Vec::new()));

    let id = engine
        .create_effect(
            EffectSource::inline(TEST_VERTEX_SHADER, TEST_FRAGMENT_SHADER),
            test_effect_options().with_defines(["BROKEN"]).on_error({
                let messages = Rc::clone(&messages);
                move |_, message| messages.borrow_mut().push(message.to_string())
            }),
        )
        .unwrap();

    assert_eq!(engine.effect(id).unwrap().status(), EffectStatus::Failed);
    assert!(!engine.is_effect_ready(id));
    assert!(matches!(engine.enable_effect(id), Err(GraphicsError::EffectNotReady(_))));

    let messages = messages.borrow();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("#error"));
}

/// Deferred links are polled until ready; the callback fires once.
#[test]
fn test_deferred_linking() {
    let (mut engine, _log) = engine_with(
        HeadlessContext::new().with_deferred_linking(2),
        EngineOptions::default(),
    );
    let compiled = Rc::new(Cell::new(0));
    let id = engine
        .create_effect(
            EffectSource::inline(TEST_VERTEX_SHADER, TEST_FRAGMENT_SHADER),
            test_effect_options().on_compiled({
                let compiled = Rc::clone(&compiled);
                move |_| compiled.set(compiled.get() + 1)
            }),
        )
        .unwrap();

    assert_eq!(engine.effect(id).unwrap().status(), EffectStatus::Compiling);
    assert!(matches!(engine.enable_effect(id), Err(GraphicsError::EffectNotReady(_))));
    assert!(!engine.is_effect_ready(id));
    assert_eq!(compiled.get(), 0);

    assert!(engine.is_effect_ready(id));
    assert!(engine.is_effect_ready(id));
    assert_eq!(compiled.get(), 1);
    assert!(engine.enable_effect(id).is_ok());
}

/// Releasing an effect drops it from the cache.
#[test]
fn test_release_effect() {
    let (mut engine, log) = headless_engine();
    let id = create_test_effect(&mut engine, &[]);
    engine.enable_effect(id).unwrap();

    engine.release_effect(id).unwrap();
    assert_eq!(engine.current_effect(), None);
    assert_eq!(engine.release_effect(id), Err(GraphicsError::InvalidHandle("effect")));

    create_test_effect(&mut engine, &[]);
    assert_eq!(compiled_stages(&log), 4);
}

// ============================================================================
// Binding Tests
// ============================================================================

/// Binding the same buffers for the same effect twice issues nothing.
#[test]
fn test_bind_buffers_is_idempotent() {
    let (mut engine, log) = headless_engine();
    let effect = create_test_effect(&mut engine, &[]);
    let quad = QuadBuffers::new(&mut engine);

    engine
        .bind_buffers(&quad.vertex_buffers, Some(quad.index_buffer), effect)
        .unwrap();
    log.clear();
    engine
        .bind_buffers(&quad.vertex_buffers, Some(quad.index_buffer), effect)
        .unwrap();
    assert!(log.is_empty());
}

/// Enabling the bound effect again does not switch programs.
#[test]
fn test_enable_effect_switches_once() {
    let (mut engine, log) = headless_engine();
    let first = create_test_effect(&mut engine, &[]);
    let second = create_test_effect(&mut engine, &["NORMAL"]);
    let program_switches = || log.count(|call| matches!(call, ContextCall::UseProgram(Some(_))));

    engine.enable_effect(first).unwrap();
    engine.enable_effect(first).unwrap();
    assert_eq!(program_switches(), 1);

    engine.enable_effect(second).unwrap();
    assert_eq!(program_switches(), 2);
    assert_eq!(engine.current_effect(), Some(second));
}

/// Uniform uploads are skipped when the value is unchanged.
#[test]
fn test_uniform_cache() {
    let (mut engine, log) = headless_engine();
    let effect = create_test_effect(&mut engine, &[]);
    let other = create_test_effect(&mut engine, &["NORMAL"]);
    engine.enable_effect(effect).unwrap();

    assert_eq!(engine.set_float4(effect, "color", 1.0, 0.0, 0.0, 1.0), Ok(true));
    assert_eq!(engine.set_float4(effect, "color", 1.0, 0.0, 0.0, 1.0), Ok(false));
    assert_eq!(engine.set_color4(effect, "color", [0.0, 1.0, 0.0], 1.0), Ok(true));
    assert_eq!(engine.set_float(effect, "unknown", 1.0), Ok(false));
    assert_eq!(log.count(|call| matches!(call, ContextCall::SetUniform(..))), 2);

    engine.enable_effect(other).unwrap();
    engine.enable_effect(effect).unwrap();
    assert_eq!(engine.set_color4(effect, "color", [0.0, 1.0, 0.0], 1.0), Ok(true));
}

/// Without instancing support an instanced draw becomes one draw per instance.
#[test]
fn test_instanced_draw_fallback() {
    let (mut engine, log) = engine_with(
        HeadlessContext::new().with_capabilities(EngineCapabilities::minimal()),
        EngineOptions::default(),
    );
    let effect = create_test_effect(&mut engine, &[]);
    let quad = QuadBuffers::new(&mut engine);
    engine.enable_effect(effect).unwrap();
    engine
        .bind_buffers(&quad.vertex_buffers, Some(quad.index_buffer), effect)
        .unwrap();

    engine.draw(true, 0, 6, 3).unwrap();
    assert_eq!(log.draw_calls(), 3);
    assert_eq!(engine.draw_calls(), 3);
}

/// An index start whose byte offset overflows is rejected before drawing.
#[test]
fn test_draw_index_offset_overflow() {
    let (mut engine, log) = headless_engine();
    let effect = create_test_effect(&mut engine, &[]);
    let quad = QuadBuffers::new(&mut engine);
    engine.enable_effect(effect).unwrap();
    engine
        .bind_buffers(&quad.vertex_buffers, Some(quad.index_buffer), effect)
        .unwrap();

    assert!(matches!(
        engine.draw(true, u32::MAX, 6, 0),
        Err(GraphicsError::ResourceCreation(_))
    ));
    assert_eq!(log.draw_calls(), 0);
    assert_eq!(engine.draw_calls(), 0);
}

/// A recorded vertex array replaces a full buffer binding and is switched
/// only when it changes.
#[test]
fn test_vertex_array_object_binding() {
    let (mut engine, log) = headless_engine();
    let effect = create_test_effect(&mut engine, &[]);
    let quad = QuadBuffers::new(&mut engine);
    log.clear();

    let vertex_array = engine
        .record_vertex_array_object(&quad.vertex_buffers, Some(quad.index_buffer), effect)
        .unwrap();
    let calls = log.calls();
    let record = position_of(&calls, |call| matches!(call, ContextCall::BindVertexArray(Some(_))));
    let attribute = position_of(&calls, |call| matches!(call, ContextCall::EnableVertexAttribArray(_)));
    let index = position_of(&calls, |call| {
        matches!(call, ContextCall::BindBuffer(BufferTarget::ElementArray, Some(_)))
    });
    let done = position_of(&calls, |call| *call == ContextCall::BindVertexArray(None));
    assert!(record < attribute && attribute < index && index < done);
    assert_eq!(engine.bound_vertex_array_object(), None);

    log.clear();
    engine.enable_effect(effect).unwrap();
    engine.bind_vertex_array_object(vertex_array).unwrap();
    engine.bind_vertex_array_object(vertex_array).unwrap();
    assert_eq!(log.count(|call| matches!(call, ContextCall::BindVertexArray(_))), 1);
    assert_eq!(engine.bound_vertex_array_object(), Some(vertex_array));

    engine.draw(true, 2, 3, 0).unwrap();
    assert!(log.calls().iter().any(|call| matches!(
        call,
        ContextCall::DrawElements { index_type: IndexType::U16, offset: 4, count: 3, .. }
    )));

    log.clear();
    engine
        .bind_buffers(&quad.vertex_buffers, Some(quad.index_buffer), effect)
        .unwrap();
    assert_eq!(log.calls().first(), Some(&ContextCall::BindVertexArray(None)));
    assert_eq!(engine.bound_vertex_array_object(), None);
}

/// Releasing a bound vertex array unbinds it first; a second release fails.
#[test]
fn test_release_vertex_array_object() {
    let (mut engine, log) = headless_engine();
    let effect = create_test_effect(&mut engine, &[]);
    let quad = QuadBuffers::new(&mut engine);
    let vertex_array = engine
        .record_vertex_array_object(&quad.vertex_buffers, Some(quad.index_buffer), effect)
        .unwrap();
    engine.bind_vertex_array_object(vertex_array).unwrap();
    log.clear();

    engine.release_vertex_array_object(vertex_array).unwrap();
    let calls = log.calls();
    let unbind = position_of(&calls, |call| *call == ContextCall::BindVertexArray(None));
    let delete = position_of(&calls, |call| matches!(call, ContextCall::DeleteVertexArray(_)));
    assert!(unbind < delete);
    assert_eq!(engine.vertex_array_count(), 0);
    assert_eq!(
        engine.release_vertex_array_object(vertex_array),
        Err(GraphicsError::InvalidHandle("vertex array"))
    );
    assert_eq!(
        engine.bind_vertex_array_object(vertex_array),
        Err(GraphicsError::InvalidHandle("vertex array"))
    );
}

/// Creating an index buffer leaves a bound vertex array untouched.
#[test]
fn test_index_buffer_creation_unbinds_vertex_array() {
    let (mut engine, log) = headless_engine();
    let effect = create_test_effect(&mut engine, &[]);
    let quad = QuadBuffers::new(&mut engine);
    let vertex_array = engine
        .record_vertex_array_object(&quad.vertex_buffers, None, effect)
        .unwrap();
    engine.bind_vertex_array_object(vertex_array).unwrap();
    log.clear();

    engine.create_index_buffer(&[0, 1, 2]).unwrap();
    let calls = log.calls();
    let unbind = position_of(&calls, |call| *call == ContextCall::BindVertexArray(None));
    let upload = position_of(&calls, |call| {
        matches!(call, ContextCall::BindBuffer(BufferTarget::ElementArray, Some(_)))
    });
    assert!(unbind < upload);
    assert_eq!(engine.bound_vertex_array_object(), None);
}

/// Draws fail once the context is lost.
#[test]
fn test_draw_after_context_loss() {
    let (mut engine, log) = headless_engine();
    log.lose_context();
    assert!(engine.is_context_lost());
    assert_eq!(engine.draw_unindexed(true, 0, 3, 0), Err(GraphicsError::ContextLost));
    assert_eq!(log.draw_calls(), 0);
}

// ============================================================================
// Texture Tests
// ============================================================================

/// A second release reports an invalid handle.
#[test]
fn test_double_texture_release() {
    let (mut engine, _log) = headless_engine();
    let texture = engine
        .create_texture(&TextureData::rgba8(2, 2, vec![255; 16]), false, false, SamplingMode::Trilinear)
        .unwrap();
    assert_eq!(engine.loaded_textures(), [texture]);

    engine.release_texture(texture).unwrap();
    assert_eq!(
        engine.release_texture(texture),
        Err(GraphicsError::InvalidHandle("texture"))
    );
    assert!(engine.loaded_textures().is_empty());
}

/// Float render targets degrade to what the context can render to.
#[test]
fn test_float_render_target_fallback() {
    let capabilities = EngineCapabilities {
        texture_float_render: false,
        texture_half_float_linear_filtering: false,
        ..EngineCapabilities::default()
    };
    let (mut engine, _log) = engine_with(
        HeadlessContext::new().with_capabilities(capabilities),
        EngineOptions::default(),
    );
    let target = engine
        .create_render_target_texture(
            Size::new(64, 64),
            RenderTargetOptions::default().with_texture_type(TextureType::Float),
        )
        .unwrap();

    let texture = engine.texture(target).unwrap();
    assert_eq!(texture.texture_type(), TextureType::HalfFloat);
    assert_eq!(texture.sampling_mode(), SamplingMode::Nearest);
}

/// Every sampling mode can be applied to an existing texture.
#[rstest]
#[case::nearest(SamplingMode::Nearest)]
#[case::bilinear(SamplingMode::Bilinear)]
#[case::trilinear(SamplingMode::Trilinear)]
fn test_update_sampling_mode(#[case] mode: SamplingMode) {
    let (mut engine, log) = headless_engine();
    let texture = engine
        .create_dynamic_texture(4, 4, false, SamplingMode::Bilinear)
        .unwrap();
    log.clear();

    engine.update_texture_sampling_mode(mode, texture).unwrap();
    assert_eq!(engine.texture(texture).unwrap().sampling_mode(), mode);
    assert_eq!(
        log.count(|call| matches!(call, ContextCall::TexParameters { .. })),
        1
    );
}

/// Cube textures need exactly six faces.
#[test]
fn test_cube_texture_face_count() {
    let (mut engine, _log) = headless_engine();
    let face: &[u8] = &[0; 4 * 4 * 4];
    let faces = vec![face; 5];
    let result = engine.create_cube_texture(&faces, 4, TextureFormat::Rgba, true);
    assert!(matches!(result, Err(GraphicsError::ResourceCreation(_))));
}

// ============================================================================
// Frame Tests
// ============================================================================

/// Unbinding regenerates mips, then runs the callback, then restores the
/// previous framebuffer.
#[test]
fn test_unbind_framebuffer_ordering() {
    let (mut engine, log) = headless_engine();
    let target = engine
        .create_render_target_texture(Size::new(32, 32), RenderTargetOptions::default().with_mip_maps())
        .unwrap();

    engine.bind_framebuffer(target, None, None, None).unwrap();
    assert_eq!(engine.render_width(), 32);
    log.clear();

    engine
        .unbind_framebuffer(target, false, Some(&mut |engine| engine.flush_framebuffer()))
        .unwrap();

    let calls = log.calls();
    let mipmap = position_of(&calls, |call| matches!(call, ContextCall::GenerateMipmap(_)));
    let callback = position_of(&calls, |call| matches!(call, ContextCall::Flush));
    let restore = position_of(&calls, |call| matches!(call, ContextCall::BindFramebuffer(None)));
    assert!(mipmap < callback);
    assert!(callback < restore);
    assert_eq!(engine.render_width(), 1280);
}

/// The drawing buffer follows the canvas divided by the scaling level.
#[test]
fn test_resize_with_hardware_scaling() {
    let (mut engine, log) = engine_with(HeadlessContext::new().with_size(800, 600), EngineOptions::default());
    let resizes = || log.count(|call| matches!(call, ContextCall::SetDrawingBufferSize(_)));

    assert!(!engine.resize());
    assert_eq!(resizes(), 0);

    engine.set_hardware_scaling_level(2.0).unwrap();
    assert_eq!(engine.hardware_scaling_level(), 2.0);
    assert_eq!((engine.render_width(), engine.render_height()), (400, 300));

    log.resize_canvas(1000, 500);
    assert!(engine.resize());
    assert_eq!((engine.render_width(), engine.render_height()), (500, 250));
    assert!(!engine.set_size(500, 250));
    assert_eq!(resizes(), 2);

    assert!(matches!(engine.set_hardware_scaling_level(0.0), Err(GraphicsError::Config(_))));
    assert!(matches!(
        engine.set_hardware_scaling_level(f32::NAN),
        Err(GraphicsError::Config(_))
    ));
    assert_eq!(engine.hardware_scaling_level(), 2.0);
}

/// Callbacks run in registration order; stopped ones no longer run.
#[test]
fn test_render_loop_order() {
    let (mut engine, _log) = headless_engine();
    let order = Rc::new(RefCell::new(Vec::new()));

    let first = engine.run_render_loop({
        let order = Rc::clone(&order);
        move |_| order.borrow_mut().push(1)
    });
    engine.run_render_loop({
        let order = Rc::clone(&order);
        move |_| order.borrow_mut().push(2)
    });

    let now = Instant::now();
    engine.tick(now).unwrap();
    engine.stop_render_loop(Some(first));
    engine.tick(now + Duration::from_millis(16)).unwrap();

    assert_eq!(*order.borrow(), [1, 2, 2]);
    assert_eq!(engine.frame_id(), 2);
    assert_eq!(engine.render_loop_count(), 1);
}

/// Frame rate follows the frame deltas.
#[test]
fn test_fps_measurement() {
    let (mut engine, _log) = headless_engine();
    let start = Instant::now();
    for frame in 0..5 {
        engine.tick(start + Duration::from_millis(20 * frame)).unwrap();
    }
    assert!((engine.fps() - 50.0).abs() < 0.01);
    assert_eq!(engine.delta_time(), Duration::from_millis(20));
}

/// Draw call counters roll over at the end of each frame.
#[test]
fn test_draw_call_counters() {
    let (mut engine, _log) = headless_engine();
    engine.run_render_loop(|engine| {
        engine.draw_unindexed(true, 0, 3, 0).unwrap();
        engine.draw_unindexed(true, 0, 3, 0).unwrap();
    });

    let now = Instant::now();
    engine.tick(now).unwrap();
    engine.tick(now + Duration::from_millis(16)).unwrap();

    assert_eq!(engine.draw_calls(), 0);
    assert_eq!(engine.last_frame_draw_calls(), 2);
    assert_eq!(engine.total_draw_calls(), 4);
    assert!((engine.average_draw_calls() - 2.0).abs() < f64::EPSILON);
}

/// A lost context stops ticking.
#[test]
fn test_tick_after_context_loss() {
    let (mut engine, log) = headless_engine();
    let ran = Rc::new(Cell::new(false));
    engine.run_render_loop({
        let ran = Rc::clone(&ran);
        move |_| ran.set(true)
    });

    log.lose_context();
    assert_eq!(engine.tick(Instant::now()), Err(GraphicsError::ContextLost));
    assert!(!ran.get());
}

// ============================================================================
// Shader Validation Tests
// ============================================================================

/// Stages that do not parse never produce an effect.
#[cfg(feature = "shader-validation")]
#[test]
fn test_validated_context_rejects_invalid_stage() {
    let (mut engine, _log) = engine_with(
        HeadlessContext::new().with_shader_validation(),
        EngineOptions::default(),
    );
    let id = engine
        .create_effect(
            EffectSource::inline("void main( {", TEST_FRAGMENT_SHADER),
            test_effect_options(),
        )
        .unwrap();
    assert!(engine.effect(id).unwrap().is_failed());
}
