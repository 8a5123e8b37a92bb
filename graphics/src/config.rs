//! Engine configuration.
//!
//! [`EngineOptions`] is a plain serde struct. Every field has a default, so a
//! RON document only needs to name the fields it changes:
//!
//! ```ignore
//! let options = EngineOptions::from_ron_str("(stencil: true, fps_range: 30)")?;
//! let engine = Engine::new(Box::new(HeadlessContext::new()), options)?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GraphicsError, GraphicsResult};

/// When the per-frame "already cleared" guard of the rendering manager is
/// re-armed.
///
/// Both policies issue at most one auto-clear per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClearGuardReset {
    /// Re-arm when group index 0 is visited, whether or not it is processed.
    #[default]
    GroupZero,
    /// Re-arm when the first non-skipped group of the frame is processed.
    FirstProcessedGroup,
}

/// Options controlling engine creation and per-frame behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// The default framebuffer carries a stencil buffer.
    ///
    /// Stencil clears of the default framebuffer are dropped without it.
    pub stencil: bool,
    /// Cull back faces (otherwise front faces) when culling is enabled.
    pub cull_back_faces: bool,
    /// Number of frames in the FPS sliding window.
    pub fps_range: usize,
    /// Keep binding caches alive across frames.
    pub prevent_cache_wipe_between_frames: bool,
    /// Version line prepended to every composed shader stage.
    pub shader_version: String,
    /// Cap on the number of texture units the engine uses.
    pub max_texture_units_override: Option<u32>,
    /// Auto-clear guard policy of the rendering manager.
    pub clear_guard_reset: ClearGuardReset,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            stencil: false,
            cull_back_faces: true,
            fps_range: 60,
            prevent_cache_wipe_between_frames: false,
            shader_version: "#version 450".to_string(),
            max_texture_units_override: None,
            clear_guard_reset: ClearGuardReset::GroupZero,
        }
    }
}

impl EngineOptions {
    /// Parse options from a RON document.
    pub fn from_ron_str(source: &str) -> GraphicsResult<Self> {
        let options: Self =
            ron::from_str(source).map_err(|e| GraphicsError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a RON file.
    pub fn load(path: impl AsRef<Path>) -> GraphicsResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GraphicsError::Config(format!("{}: {e}", path.display())))?;
        Self::from_ron_str(&contents)
    }

    /// Serialize the options as pretty RON.
    pub fn to_ron_string(&self) -> GraphicsResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GraphicsError::Config(e.to_string()))
    }

    /// Check value ranges.
    pub fn validate(&self) -> GraphicsResult<()> {
        if self.fps_range == 0 {
            return Err(GraphicsError::Config(
                "fps_range must be at least 1".to_string(),
            ));
        }
        if !self.shader_version.starts_with("#version") {
            return Err(GraphicsError::Config(format!(
                "invalid shader version line `{}`",
                self.shader_version
            )));
        }
        Ok(())
    }

    /// Enable or disable the default stencil buffer.
    pub fn with_stencil(mut self, stencil: bool) -> Self {
        self.stencil = stencil;
        self
    }

    /// Set the FPS window size.
    pub fn with_fps_range(mut self, fps_range: usize) -> Self {
        self.fps_range = fps_range;
        self
    }

    /// Keep binding caches between frames.
    pub fn with_prevent_cache_wipe_between_frames(mut self, prevent: bool) -> Self {
        self.prevent_cache_wipe_between_frames = prevent;
        self
    }

    /// Set the cull face used when culling is enabled.
    pub fn with_cull_back_faces(mut self, cull_back_faces: bool) -> Self {
        self.cull_back_faces = cull_back_faces;
        self
    }

    /// Cap the number of texture units.
    pub fn with_max_texture_units(mut self, units: u32) -> Self {
        self.max_texture_units_override = Some(units);
        self
    }

    /// Set the clear guard policy.
    pub fn with_clear_guard_reset(mut self, policy: ClearGuardReset) -> Self {
        self.clear_guard_reset = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.fps_range, 60);
        assert!(options.cull_back_faces);
        assert_eq!(options.clear_guard_reset, ClearGuardReset::GroupZero);
    }

    #[test]
    fn test_partial_ron() {
        let options =
            EngineOptions::from_ron_str("(stencil: true, clear_guard_reset: FirstProcessedGroup)")
                .unwrap();
        assert!(options.stencil);
        assert_eq!(
            options.clear_guard_reset,
            ClearGuardReset::FirstProcessedGroup
        );
        assert_eq!(options.fps_range, 60);
    }

    #[test]
    fn test_invalid_ron() {
        let err = EngineOptions::from_ron_str("(fps_range: 0)").unwrap_err();
        assert!(matches!(err, GraphicsError::Config(_)));

        let err = EngineOptions::from_ron_str("(fps_range: \"many\")").unwrap_err();
        assert!(matches!(err, GraphicsError::Config(_)));
    }

    #[test]
    fn test_ron_roundtrip() {
        let options = EngineOptions::default().with_max_texture_units(8);
        let text = options.to_ron_string().unwrap();
        assert_eq!(EngineOptions::from_ron_str(&text).unwrap(), options);
    }
}
