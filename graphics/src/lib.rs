//! # Ember Graphics
//!
//! GPU state cache, resource tables and frame draw scheduler for the Ember
//! engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Engine`] - Owner of a [`GraphicsContext`] that mirrors its bound state
//!   and filters redundant calls
//! - [`GraphicsContext`] - The seam to the immediate-mode driver, with
//!   [`HeadlessContext`] as the recording implementation for tests and
//!   headless runs
//! - [`rendering`] - Per-frame sorting of drawables into rendering groups
//! - [`GraphicsInstance`] - Application-level owner of engines
//!
//! ## Example
//!
//! ```ignore
//! use ember_graphics::{Engine, EngineOptions, HeadlessContext, RenderingManager, RenderParams};
//!
//! let mut engine = Engine::new(Box::new(HeadlessContext::new()), EngineOptions::default())?;
//! let mut manager = RenderingManager::from_options(engine.options());
//!
//! manager.reset();
//! manager.dispatch(sub_mesh)?;
//! manager.render(&mut engine, RenderParams::new().with_camera(camera))?;
//! ```

pub mod capabilities;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod effect;
pub mod engine;
pub mod error;
pub mod instance;
pub mod profiling;
pub mod rendering;
pub mod resources;
pub mod shader;
pub mod states;
pub mod types;

// Re-export main types for convenience
pub use capabilities::EngineCapabilities;
pub use config::{ClearGuardReset, EngineOptions};
pub use context::{ContextCall, ContextLog, GraphicsContext, HeadlessContext};
pub use effect::{Effect, EffectCreationOptions, EffectFallbacks, EffectId, EffectSource, EffectStatus};
pub use engine::{Engine, RenderLoopCallback, RenderLoopId};
pub use error::{GraphicsError, GraphicsResult};
pub use instance::{EngineId, GraphicsInstance};
pub use rendering::{
    Camera, ParticleSystem, RenderParams, RenderStats, RenderingGroup, RenderingManager,
    SpriteBatch, SubMesh, Transparency,
};
pub use resources::{BufferHandle, TextureHandle, VertexArrayHandle};
pub use shader::{ShaderLibrary, ShaderStore};
pub use types::{
    AlphaMode, CompareFunction, SamplingMode, Size, TextureFormat, TextureType, UniformValue,
    VertexBuffers, VertexKind, Viewport,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// Starts the profiler when the `profiling` feature is enabled.
pub fn init() {
    profiling::start();
    log::info!("Ember Graphics v{} initialized", VERSION);
}
