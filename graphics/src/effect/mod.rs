//! Compiled shader programs.
//!
//! An [`Effect`] is a linked program plus the attribute, uniform and sampler
//! tables resolved from it. Effects are created through
//! [`Engine::create_effect`](crate::Engine::create_effect) and cached by
//! signature, `"{vertex}+{fragment}@{defines}"`, so the same combination is
//! only ever compiled once.

mod fallbacks;

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::context::{ProgramId, UniformLocation};

pub use fallbacks::EffectFallbacks;

slotmap::new_key_type! {
    /// Handle to an effect owned by the engine.
    pub struct EffectId;
}

/// Called once when an effect becomes ready.
pub type EffectCompiledCallback = Box<dyn FnMut(&Effect)>;

/// Called once when an effect fails for good, with the error log.
pub type EffectErrorCallback = Box<dyn FnMut(&Effect, &str)>;

/// Where the stage sources of an effect come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EffectSource {
    /// `"{name}VertexShader"` and `"{name}PixelShader"` from the shader store.
    Named(String),
    /// Distinct store names for each stage.
    Stages {
        /// Base name of the vertex stage.
        vertex: String,
        /// Base name of the fragment stage.
        fragment: String,
    },
    /// Inline stage code.
    Inline {
        /// Vertex stage code.
        vertex: String,
        /// Fragment stage code.
        fragment: String,
    },
}

impl EffectSource {
    /// Effect built from a single base name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Effect built from inline code.
    pub fn inline(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::Inline {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Names used in the signature for the vertex and fragment stage.
    pub(crate) fn stage_keys(&self) -> (String, String) {
        match self {
            Self::Named(name) => (name.clone(), name.clone()),
            Self::Stages { vertex, fragment } => (vertex.clone(), fragment.clone()),
            Self::Inline { vertex, fragment } => (inline_key(vertex), inline_key(fragment)),
        }
    }
}

fn inline_key(source: &str) -> String {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    format!("inline#{:016x}", hasher.finish())
}

/// Parameters of [`Engine::create_effect`](crate::Engine::create_effect).
#[derive(Default)]
pub struct EffectCreationOptions {
    /// Attribute names to resolve in addition to the standard vertex kinds.
    pub attributes: Vec<String>,
    /// Uniform names to resolve.
    pub uniforms: Vec<String>,
    /// Sampler names; bound to consecutive texture units in this order.
    pub samplers: Vec<String>,
    /// Defines, `"NAME"` or `"NAME VALUE"`.
    pub defines: Vec<String>,
    /// Defines to drop when compilation fails.
    pub fallbacks: Option<EffectFallbacks>,
    /// Called once when the effect is ready.
    pub on_compiled: Option<EffectCompiledCallback>,
    /// Called once when the effect fails.
    pub on_error: Option<EffectErrorCallback>,
}

impl fmt::Debug for EffectCreationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectCreationOptions")
            .field("attributes", &self.attributes)
            .field("uniforms", &self.uniforms)
            .field("samplers", &self.samplers)
            .field("defines", &self.defines)
            .field("fallbacks", &self.fallbacks)
            .finish_non_exhaustive()
    }
}

impl EffectCreationOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_uniforms<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.uniforms.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_samplers<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.samplers.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_defines<S: Into<String>>(mut self, defines: impl IntoIterator<Item = S>) -> Self {
        self.defines.extend(defines.into_iter().map(Into::into));
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: EffectFallbacks) -> Self {
        self.fallbacks = Some(fallbacks);
        self
    }

    pub fn on_compiled(mut self, callback: impl FnMut(&Effect) + 'static) -> Self {
        self.on_compiled = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&Effect, &str) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// The defines block as prepended to each stage.
    pub(crate) fn defines_string(defines: &[String]) -> String {
        defines
            .iter()
            .map(|define| format!("#define {define}\n"))
            .collect()
    }
}

/// Compilation state of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectStatus {
    /// Waiting for the context to finish linking.
    Compiling,
    /// Linked and resolved.
    Ready,
    /// Failed for good.
    Failed,
}

/// A compiled program and its resolved locations.
pub struct Effect {
    pub(crate) signature: String,
    pub(crate) defines: Vec<String>,
    pub(crate) vertex_source: String,
    pub(crate) fragment_source: String,
    pub(crate) attribute_names: Vec<String>,
    pub(crate) uniform_names: Vec<String>,
    pub(crate) samplers: Vec<String>,
    pub(crate) fallbacks: Option<EffectFallbacks>,
    pub(crate) program: Option<ProgramId>,
    pub(crate) status: EffectStatus,
    pub(crate) error: Option<String>,
    pub(crate) attribute_locations: HashMap<String, u32>,
    pub(crate) uniform_locations: HashMap<String, UniformLocation>,
    pub(crate) samplers_bound: bool,
    pub(crate) compile_attempts: u32,
    pub(crate) on_compiled: Option<EffectCompiledCallback>,
    pub(crate) on_error: Option<EffectErrorCallback>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("signature", &self.signature)
            .field("status", &self.status)
            .field("program", &self.program)
            .field("defines", &self.defines)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl Effect {
    pub(crate) fn new(
        signature: String,
        vertex_source: String,
        fragment_source: String,
        options: EffectCreationOptions,
    ) -> Self {
        Self {
            signature,
            defines: options.defines,
            vertex_source,
            fragment_source,
            attribute_names: options.attributes,
            uniform_names: options.uniforms,
            samplers: options.samplers,
            fallbacks: options.fallbacks,
            program: None,
            status: EffectStatus::Compiling,
            error: None,
            attribute_locations: HashMap::new(),
            uniform_locations: HashMap::new(),
            samplers_bound: false,
            compile_attempts: 0,
            on_compiled: options.on_compiled,
            on_error: options.on_error,
        }
    }

    /// Cache key, `"{vertex}+{fragment}@{defines}"`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Compilation state.
    pub fn status(&self) -> EffectStatus {
        self.status
    }

    /// Whether the effect can be bound.
    pub fn is_ready(&self) -> bool {
        self.status == EffectStatus::Ready
    }

    /// Whether the effect failed for good.
    pub fn is_failed(&self) -> bool {
        self.status == EffectStatus::Failed
    }

    /// The compile or link log of a failed effect.
    pub fn compilation_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Defines the effect was (or is being) compiled with, after fallbacks.
    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    /// Sampler names in texture unit order.
    pub fn samplers(&self) -> &[String] {
        &self.samplers
    }

    /// Texture unit of a sampler.
    pub fn sampler_unit(&self, name: &str) -> Option<u32> {
        self.samplers
            .iter()
            .position(|sampler| sampler == name)
            .map(|unit| unit as u32)
    }

    /// Linked program.
    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    /// Resolved location of a vertex attribute.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attribute_locations.get(name).copied()
    }

    /// Resolved location of a uniform or sampler.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniform_locations.get(name).copied()
    }

    /// Number of compile attempts, fallbacks included.
    pub fn compile_attempts(&self) -> u32 {
        self.compile_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_keys() {
        let (vertex, fragment) = EffectSource::named("default").stage_keys();
        assert_eq!(vertex, "default");
        assert_eq!(fragment, "default");

        let a = EffectSource::inline("void main() {}", "void main() {}").stage_keys();
        let b = EffectSource::inline("void main() {}", "void main() { }").stage_keys();
        assert_eq!(a.0, b.0);
        assert_ne!(a.1, b.1);
    }

    #[test]
    fn test_defines_string() {
        let defines = vec!["UV1".to_string(), "NUM_BONES 4".to_string()];
        assert_eq!(
            EffectCreationOptions::defines_string(&defines),
            "#define UV1\n#define NUM_BONES 4\n"
        );
    }

    #[test]
    fn test_sampler_units() {
        let options = EffectCreationOptions::new().with_samplers(["diffuseSampler", "bumpSampler"]);
        let effect = Effect::new("a+a@".into(), String::new(), String::new(), options);
        assert_eq!(effect.sampler_unit("bumpSampler"), Some(1));
        assert_eq!(effect.sampler_unit("missing"), None);
        assert_eq!(effect.status(), EffectStatus::Compiling);
    }
}
