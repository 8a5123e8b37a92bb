//! Built-in shader sources.
//!
//! | Name | Kind | Description |
//! |------|------|-------------|
//! | `defaultVertexShader` | shader | Position/UV transform, optional instancing |
//! | `defaultPixelShader` | shader | Flat or textured color with optional alpha test |
//! | `helperFunctions` | include | Constants and color space helpers |
//!
//! The default shaders react to the `NORMAL`, `UV1`, `INSTANCES`, `DIFFUSE`
//! and `ALPHATEST` defines.

/// Default vertex stage.
const DEFAULT_VERTEX: &str = include_str!("../../shaders/default.vertex.glsl");

/// Default fragment stage.
const DEFAULT_FRAGMENT: &str = include_str!("../../shaders/default.fragment.glsl");

/// Shared helper chunk.
const HELPER_FUNCTIONS: &str = include_str!("../../shaders/helperFunctions.glsl");

/// A named collection of shader stages and include chunks.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    shaders: Vec<(String, String)>,
    includes: Vec<(String, String)>,
}

impl ShaderLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in library.
    pub fn standard() -> Self {
        let mut library = Self::new();
        library.add_shader("defaultVertexShader", DEFAULT_VERTEX);
        library.add_shader("defaultPixelShader", DEFAULT_FRAGMENT);
        library.add_include("helperFunctions", HELPER_FUNCTIONS);
        library
    }

    /// Add a shader stage source.
    pub fn add_shader(&mut self, name: &str, source: &str) {
        self.shaders.push((name.to_string(), source.to_string()));
    }

    /// Add an include chunk.
    pub fn add_include(&mut self, name: &str, source: &str) {
        self.includes.push((name.to_string(), source.to_string()));
    }

    /// Iterate over `(name, source)` of the shader stages.
    pub fn shaders(&self) -> impl Iterator<Item = (&str, &str)> {
        self.shaders.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }

    /// Iterate over `(name, source)` of the include chunks.
    pub fn includes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.includes.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_library_contents() {
        let library = ShaderLibrary::standard();
        assert_eq!(library.shaders().count(), 2);
        assert_eq!(library.includes().count(), 1);

        assert!(DEFAULT_VERTEX.contains("#include<helperFunctions>"));
        assert!(DEFAULT_FRAGMENT.contains("uniform sampler2D diffuseSampler"));
        assert!(HELPER_FUNCTIONS.contains("vec4 toLinearSpace"));
    }
}
