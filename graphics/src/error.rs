//! Graphics error types.

/// Result alias used throughout the crate.
pub type GraphicsResult<T> = Result<T, GraphicsError>;

/// Errors that can occur in the graphics system.
///
/// Failures are scoped to the resource they concern: a failed effect stays
/// not-ready and draws referencing it are skipped, a stale handle turns the
/// operation into a no-op. Only [`GraphicsError::ContextLost`] and
/// [`GraphicsError::OutOfMemory`] are fatal for the owning [`Engine`].
///
/// [`Engine`]: crate::Engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// A resource could not be created or updated (invalid size, format or length).
    #[error("resource creation failed: {0}")]
    ResourceCreation(String),

    /// A shader failed to compile or a program failed to link.
    #[error("compilation of effect `{effect}` failed: {message}")]
    Compilation {
        /// Signature of the effect being compiled.
        effect: String,
        /// Compiler or linker output.
        message: String,
    },

    /// The context lacks a feature and no fallback exists.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The handle is not tracked (never created or already released).
    #[error("invalid {0} handle")]
    InvalidHandle(&'static str),

    /// The effect exists but is not ready to be bound.
    #[error("effect `{0}` is not ready")]
    EffectNotReady(String),

    /// A rendering group id outside the supported range.
    #[error("rendering group {0} is out of range")]
    InvalidRenderingGroup(usize),

    /// The graphics context was lost; the engine must be recreated.
    #[error("graphics context lost")]
    ContextLost,

    /// Out of GPU memory.
    #[error("out of GPU memory")]
    OutOfMemory,

    /// Engine configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GraphicsError {
    /// Whether the error leaves the engine unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ContextLost | Self::OutOfMemory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::OutOfMemory;
        assert_eq!(err.to_string(), "out of GPU memory");

        let err = GraphicsError::InvalidHandle("texture");
        assert_eq!(err.to_string(), "invalid texture handle");

        let err = GraphicsError::Compilation {
            effect: "default+default@".to_string(),
            message: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "compilation of effect `default+default@` failed: syntax error"
        );
    }

    #[test]
    fn test_fatal_errors() {
        assert!(GraphicsError::ContextLost.is_fatal());
        assert!(GraphicsError::OutOfMemory.is_fatal());
        assert!(!GraphicsError::InvalidHandle("buffer").is_fatal());
        assert!(!GraphicsError::ResourceCreation("zero size".into()).is_fatal());
    }
}
