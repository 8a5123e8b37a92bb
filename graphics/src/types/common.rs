//! Common types shared across the graphics system.

use bitflags::bitflags;

// ============================================================================
// Viewport
// ============================================================================

/// Viewport configuration for rendering.
///
/// Coordinates are normalized to the render target: `(0, 0, 1, 1)` covers the
/// whole target. The engine converts them to pixels with the width and height
/// of the current target when the viewport is applied.
///
/// # Example
///
/// ```ignore
/// // Left half of the screen
/// let viewport = Viewport::new(0.0, 0.0, 0.5, 1.0);
/// engine.set_viewport(&viewport, None, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Normalized X coordinate of the viewport's origin.
    pub x: f32,
    /// Normalized Y coordinate of the viewport's origin.
    pub y: f32,
    /// Normalized width.
    pub width: f32,
    /// Normalized height.
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::full()
    }
}

impl Viewport {
    /// Create a new normalized viewport.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport covering the whole render target.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Convert to a pixel rectangle `(x, y, width, height)` for a target size.
    pub fn to_pixels(&self, target_width: u32, target_height: u32) -> (i32, i32, u32, u32) {
        let w = target_width as f32;
        let h = target_height as f32;
        (
            (self.x * w) as i32,
            (self.y * h) as i32,
            (self.width * w) as u32,
            (self.height * h) as u32,
        )
    }
}

// ============================================================================
// Size
// ============================================================================

/// 2D size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Create a square size.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ============================================================================
// Clear mask
// ============================================================================

bitflags! {
    /// Buffers affected by a clear operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearMask: u32 {
        /// Color buffer.
        const COLOR = 1 << 0;
        /// Depth buffer.
        const DEPTH = 1 << 1;
        /// Stencil buffer.
        const STENCIL = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_to_pixels() {
        let viewport = Viewport::new(0.5, 0.0, 0.5, 1.0);
        assert_eq!(viewport.to_pixels(800, 600), (400, 0, 400, 600));
        assert_eq!(Viewport::full().to_pixels(64, 32), (0, 0, 64, 32));
    }

    #[test]
    fn test_size_empty() {
        assert!(Size::new(0, 16).is_empty());
        assert!(!Size::square(16).is_empty());
    }
}
