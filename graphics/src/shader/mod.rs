//! Shader source registry.
//!
//! The [`ShaderStore`] maps names to shader stage sources and to includable
//! chunks. Effect compilation resolves base names through it
//! (`"{name}VertexShader"` / `"{name}PixelShader"`) and expands
//! `#include<name>` directives before the defines are prepended.
//!
//! # Example
//!
//! ```ignore
//! let mut store = ShaderStore::with_standard_library();
//! store.register_include("fog", "uniform vec4 vFogInfos;");
//! store.register_shader("skyVertexShader", SKY_VERTEX);
//!
//! let resolved = store.resolve_includes("#include<fog>\nvoid main() {}")?;
//! ```

pub mod library;

use std::collections::{HashMap, HashSet};

use crate::error::{GraphicsError, GraphicsResult};

pub use library::ShaderLibrary;

/// Name-keyed registry of shader sources and include chunks.
#[derive(Debug, Clone, Default)]
pub struct ShaderStore {
    shaders: HashMap<String, String>,
    includes: HashMap<String, String>,
}

impl ShaderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the built-in library registered.
    pub fn with_standard_library() -> Self {
        let mut store = Self::new();
        store.add_library(&ShaderLibrary::standard());
        store
    }

    /// Register every shader and include of a library.
    pub fn add_library(&mut self, library: &ShaderLibrary) {
        for (name, source) in library.shaders() {
            self.register_shader(name, source);
        }
        for (name, source) in library.includes() {
            self.register_include(name, source);
        }
    }

    /// Register (or replace) a shader stage source.
    pub fn register_shader(&mut self, name: &str, source: &str) {
        self.shaders.insert(name.to_string(), source.to_string());
    }

    /// Register (or replace) an include chunk.
    pub fn register_include(&mut self, name: &str, source: &str) {
        self.includes.insert(name.to_string(), source.to_string());
    }

    /// Source of a registered shader stage.
    pub fn shader(&self, name: &str) -> Option<&str> {
        self.shaders.get(name).map(String::as_str)
    }

    /// Source of a registered include chunk.
    pub fn include(&self, name: &str) -> Option<&str> {
        self.includes.get(name).map(String::as_str)
    }

    /// Expand `#include<name>` (or `#include "name"`) directives recursively.
    ///
    /// Each chunk is expanded at most once per source.
    pub fn resolve_includes(&self, source: &str) -> GraphicsResult<String> {
        let mut included = HashSet::new();
        self.resolve_recursive(source, &mut included)
            .map_err(|message| GraphicsError::Compilation {
                effect: String::new(),
                message,
            })
    }

    fn resolve_recursive(
        &self,
        source: &str,
        included: &mut HashSet<String>,
    ) -> Result<String, String> {
        let mut result = String::with_capacity(source.len());

        for line in source.lines() {
            let Some(name) = parse_include_directive(line.trim()) else {
                result.push_str(line);
                result.push('\n');
                continue;
            };
            if !included.insert(name.to_string()) {
                continue;
            }
            let chunk = self
                .includes
                .get(name)
                .ok_or_else(|| format!("include not found: <{name}>"))?;
            let resolved = self.resolve_recursive(chunk, included)?;
            result.push_str(&resolved);
            if !resolved.ends_with('\n') {
                result.push('\n');
            }
        }

        Ok(result)
    }
}

/// Parse an include directive, returning the chunk name if found.
fn parse_include_directive(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("#include")?.trim();
    if let Some(inner) = rest.strip_prefix('"') {
        inner.strip_suffix('"')
    } else if let Some(inner) = rest.strip_prefix('<') {
        inner.split('>').next()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut store = ShaderStore::new();
        store.register_shader("flatVertexShader", "void main() {}");
        assert_eq!(store.shader("flatVertexShader"), Some("void main() {}"));
        assert_eq!(store.shader("missing"), None);
    }

    #[test]
    fn test_nested_includes_expand_once() {
        let mut store = ShaderStore::new();
        store.register_include("a", "#include<b>\nfloat a() { return b(); }");
        store.register_include("b", "float b() { return 1.0; }");

        let resolved = store
            .resolve_includes("#include<a>\n#include<b>\nvoid main() {}")
            .unwrap();
        assert_eq!(resolved.matches("float b()").count(), 1);
        assert!(resolved.contains("float a()"));
        assert!(resolved.ends_with("void main() {}\n"));
    }

    #[test]
    fn test_missing_include() {
        let store = ShaderStore::new();
        let err = store.resolve_includes("#include<missing>").unwrap_err();
        assert!(matches!(err, GraphicsError::Compilation { .. }));
        assert!(err.to_string().contains("include not found: <missing>"));
    }

    #[test]
    fn test_standard_library_resolves() {
        let store = ShaderStore::with_standard_library();
        let vertex = store.shader("defaultVertexShader").unwrap();
        let resolved = store.resolve_includes(vertex).unwrap();
        assert!(!resolved.contains("#include"));
        assert!(resolved.contains("toLinearSpace"));
    }
}
