//! Effect compilation, caching and binding.

use super::Engine;
use crate::context::{GraphicsContext, LinkStatus, ProgramId, ShaderStage};
use crate::effect::{Effect, EffectCreationOptions, EffectId, EffectSource, EffectStatus};
use crate::error::{GraphicsError, GraphicsResult};
use crate::profiling::{profile_function, profile_scope};
use crate::types::{UniformValue, VertexKind};

/// Result of one compile or link attempt.
enum LinkOutcome {
    Pending,
    Ready,
    Failed(String),
}

impl Engine {
    /// Create (or fetch from the cache) the effect for `source` and the
    /// requested defines.
    ///
    /// Compile and link failures do not fail this call, and neither do
    /// missing shaders or includes: the returned effect is marked failed,
    /// cached under its signature and `on_error` is invoked. Only a lost
    /// context is an error.
    pub fn create_effect(
        &mut self,
        source: EffectSource,
        options: EffectCreationOptions,
    ) -> GraphicsResult<EffectId> {
        profile_function!();
        self.ensure_context()?;

        let (vertex_key, fragment_key) = source.stage_keys();
        let signature = format!(
            "{vertex_key}+{fragment_key}@{}",
            EffectCreationOptions::defines_string(&options.defines)
        );
        if let Some(&id) = self.effect_cache.get(&signature) {
            if self.effects.contains_key(id) {
                return Ok(id);
            }
        }

        let mut effect = match self.effect_sources(&source, &signature) {
            Ok((vertex_source, fragment_source)) => {
                let mut effect = Effect::new(signature.clone(), vertex_source, fragment_source, options);
                compile_effect(self.context.as_mut(), &self.options.shader_version, &mut effect);
                effect
            }
            Err(GraphicsError::Compilation { message, .. }) => {
                let mut effect = Effect::new(signature.clone(), String::new(), String::new(), options);
                fail_effect(&mut effect, message);
                effect
            }
            Err(err) => return Err(err),
        };
        notify_effect(&mut effect);

        log::debug!("Engine: created effect {} ({:?})", signature, effect.status);
        let id = self.effects.insert(effect);
        self.effect_cache.insert(signature, id);
        Ok(id)
    }

    /// Whether an effect can be used, polling the context when its program
    /// is still linking.
    pub fn is_effect_ready(&mut self, id: EffectId) -> bool {
        let Some(effect) = self.effects.get_mut(id) else {
            return false;
        };
        if effect.status == EffectStatus::Compiling {
            let version = &self.options.shader_version;
            match poll_link(self.context.as_mut(), effect) {
                LinkOutcome::Failed(message) => {
                    if retry_with_fallbacks(effect, &message) {
                        compile_effect(self.context.as_mut(), version, effect);
                    } else {
                        fail_effect(effect, message);
                    }
                }
                LinkOutcome::Pending | LinkOutcome::Ready => {}
            }
            notify_effect(effect);
        }
        effect.is_ready()
    }

    /// Look up an effect.
    pub fn effect(&self, id: EffectId) -> Option<&Effect> {
        self.effects.get(id)
    }

    /// Number of live effects.
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// The effect last enabled, if the caches still know it.
    pub fn current_effect(&self) -> Option<EffectId> {
        self.bindings.current_effect
    }

    /// Make an effect current.
    ///
    /// The program only changes when it differs from the bound one; a switch
    /// invalidates the texture unit and uniform caches. Samplers are bound to
    /// their units the first time the effect is enabled.
    pub fn enable_effect(&mut self, id: EffectId) -> GraphicsResult<()> {
        profile_scope!("enable_effect");
        let effect = self
            .effects
            .get(id)
            .ok_or(GraphicsError::InvalidHandle("effect"))?;
        let program = match (effect.status, effect.program) {
            (EffectStatus::Ready, Some(program)) => program,
            _ => return Err(GraphicsError::EffectNotReady(effect.signature.clone())),
        };

        self.bind_program(program);
        self.bindings.current_effect = Some(id);

        let effect = &mut self.effects[id];
        if !effect.samplers_bound {
            for (unit, sampler) in effect.samplers.iter().enumerate() {
                if let Some(location) = effect.uniform_locations.get(sampler) {
                    let value = UniformValue::Int(unit as i32);
                    self.context.set_uniform(*location, &value);
                    self.uniform_cache.insert(*location, value);
                }
            }
            effect.samplers_bound = true;
        }
        Ok(())
    }

    /// Delete an effect's program and drop it from the cache.
    pub fn release_effect(&mut self, id: EffectId) -> GraphicsResult<()> {
        let effect = self
            .effects
            .remove(id)
            .ok_or(GraphicsError::InvalidHandle("effect"))?;
        self.effect_cache.remove(&effect.signature);
        if let Some(program) = effect.program {
            self.delete_program(program);
        }
        if self.bindings.current_effect == Some(id) {
            self.bindings.current_effect = None;
        }
        log::debug!("Engine: released effect {}", effect.signature);
        Ok(())
    }

    /// Release every effect.
    pub fn release_effects(&mut self) {
        let ids: Vec<EffectId> = self.effects.keys().collect();
        for id in ids {
            let _ = self.release_effect(id);
        }
        self.effect_cache.clear();
    }

    pub(super) fn bind_program(&mut self, program: ProgramId) {
        if self.bindings.program == Some(program) {
            return;
        }
        self.context.use_program(Some(program));
        self.bindings.program = Some(program);
        self.uniform_cache.clear();
        self.reset_texture_cache();
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.bindings.program == Some(program) {
            self.context.use_program(None);
            self.bindings.program = None;
            self.uniform_cache.clear();
        }
        self.context.delete_program(program);
    }

    /// Stage sources with includes expanded, before defines are prepended.
    fn effect_sources(&self, source: &EffectSource, signature: &str) -> GraphicsResult<(String, String)> {
        let (vertex, fragment) = match source {
            EffectSource::Inline { vertex, fragment } => (vertex.clone(), fragment.clone()),
            EffectSource::Named(name) => (
                self.store_shader(&format!("{name}VertexShader"), signature)?,
                self.store_shader(&format!("{name}PixelShader"), signature)?,
            ),
            EffectSource::Stages { vertex, fragment } => (
                self.store_shader(&format!("{vertex}VertexShader"), signature)?,
                self.store_shader(&format!("{fragment}PixelShader"), signature)?,
            ),
        };
        let resolve = |code: &str| {
            self.shader_store
                .resolve_includes(code)
                .map_err(|err| match err {
                    GraphicsError::Compilation { message, .. } => GraphicsError::Compilation {
                        effect: signature.to_string(),
                        message,
                    },
                    other => other,
                })
        };
        Ok((resolve(&vertex)?, resolve(&fragment)?))
    }

    fn store_shader(&self, name: &str, signature: &str) -> GraphicsResult<String> {
        self.shader_store
            .shader(name)
            .map(str::to_string)
            .ok_or_else(|| GraphicsError::Compilation {
                effect: signature.to_string(),
                message: format!("shader not found: {name}"),
            })
    }
}

/// Compile the effect, dropping fallback ranks until it links, fails for
/// good or is left pending.
fn compile_effect(context: &mut dyn GraphicsContext, version: &str, effect: &mut Effect) {
    profile_function!();
    loop {
        effect.compile_attempts += 1;
        let outcome = match build_program(context, version, effect) {
            Ok(program) => {
                effect.program = Some(program);
                poll_link(context, effect)
            }
            Err(message) => LinkOutcome::Failed(message),
        };
        match outcome {
            LinkOutcome::Pending | LinkOutcome::Ready => return,
            LinkOutcome::Failed(message) => {
                if !retry_with_fallbacks(effect, &message) {
                    fail_effect(effect, message);
                    return;
                }
            }
        }
    }
}

fn build_program(
    context: &mut dyn GraphicsContext,
    version: &str,
    effect: &Effect,
) -> Result<ProgramId, String> {
    let defines = EffectCreationOptions::defines_string(&effect.defines);
    let vertex_code = format!("{version}\n{defines}{}", effect.vertex_source);
    let fragment_code = format!("{version}\n{defines}{}", effect.fragment_source);

    let vertex = context
        .compile_shader(ShaderStage::Vertex, &vertex_code)
        .map_err(|message| format!("vertex shader: {message}"))?;
    let fragment = match context.compile_shader(ShaderStage::Fragment, &fragment_code) {
        Ok(fragment) => fragment,
        Err(message) => {
            context.delete_shader(vertex);
            return Err(format!("fragment shader: {message}"));
        }
    };

    let program = context.link_program(vertex, fragment);
    context.delete_shader(vertex);
    context.delete_shader(fragment);
    Ok(program)
}

/// Query the link status; resolve the location tables once linked.
fn poll_link(context: &mut dyn GraphicsContext, effect: &mut Effect) -> LinkOutcome {
    let Some(program) = effect.program else {
        return LinkOutcome::Failed("effect has no program".to_string());
    };
    match context.link_status(program) {
        LinkStatus::Pending => LinkOutcome::Pending,
        LinkStatus::Linked => {
            resolve_locations(&*context, program, effect);
            effect.status = EffectStatus::Ready;
            effect.error = None;
            LinkOutcome::Ready
        }
        LinkStatus::Failed(message) => {
            context.delete_program(program);
            effect.program = None;
            LinkOutcome::Failed(format!("link: {message}"))
        }
    }
}

fn resolve_locations(context: &dyn GraphicsContext, program: ProgramId, effect: &mut Effect) {
    let attributes = VertexKind::standard()
        .map(|kind| kind.attribute_name())
        .chain(effect.attribute_names.iter().cloned());
    for name in attributes {
        if let Some(location) = context.attribute_location(program, &name) {
            effect.attribute_locations.insert(name, location);
        }
    }
    for name in effect.uniform_names.iter().chain(&effect.samplers) {
        if let Some(location) = context.uniform_location(program, name) {
            effect.uniform_locations.insert(name.clone(), location);
        }
    }
}

/// Drop the lowest fallback rank; false when none is left.
fn retry_with_fallbacks(effect: &mut Effect, message: &str) -> bool {
    let Some(fallbacks) = effect.fallbacks.as_mut().filter(|f| f.is_more_fallbacks()) else {
        return false;
    };
    let dropped = fallbacks.reduce(&mut effect.defines);
    log::warn!(
        "Engine: effect {} failed to compile, retrying without {:?}: {}",
        effect.signature,
        dropped,
        message
    );
    true
}

fn fail_effect(effect: &mut Effect, message: String) {
    log::error!("Engine: unable to compile effect {}:\n{}", effect.signature, message);
    effect.status = EffectStatus::Failed;
    effect.error = Some(message);
}

/// Fire the one-shot callback matching the effect's final status.
fn notify_effect(effect: &mut Effect) {
    match effect.status {
        EffectStatus::Ready => {
            if let Some(mut callback) = effect.on_compiled.take() {
                callback(effect);
            }
        }
        EffectStatus::Failed => {
            if let Some(mut callback) = effect.on_error.take() {
                let message = effect.error.clone().unwrap_or_default();
                callback(effect, &message);
            }
        }
        EffectStatus::Compiling => {}
    }
}
