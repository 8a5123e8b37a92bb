//! Fixed-function state enumerations.

/// Comparison function for depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the incoming value is less than the stored value.
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the incoming value is less than or equal to the stored value.
    #[default]
    LessEqual,
    /// Passes if the incoming value is greater than the stored value.
    Greater,
    /// Passes if the values differ.
    NotEqual,
    /// Passes if the incoming value is greater than or equal to the stored value.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// Stencil buffer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the current value.
    #[default]
    Keep,
    /// Set the value to zero.
    Zero,
    /// Replace with the reference value.
    Replace,
    /// Increment, clamping to the maximum.
    Increment,
    /// Decrement, clamping to zero.
    Decrement,
    /// Bitwise invert.
    Invert,
    /// Increment with wrap-around.
    IncrementWrap,
    /// Decrement with wrap-around.
    DecrementWrap,
}

/// Which faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

/// Winding order of front faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise winding.
    #[default]
    Ccw,
    /// Clockwise winding.
    Cw,
}

/// Context capabilities that can be toggled on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth testing.
    DepthTest,
    /// Face culling.
    CullFace,
    /// Polygon offset for filled primitives.
    PolygonOffsetFill,
    /// Stencil testing.
    StencilTest,
    /// Color blending.
    Blend,
    /// Scissor testing.
    ScissorTest,
}

/// Blend factor for blending operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    /// 0.0
    Zero,
    /// 1.0
    #[default]
    One,
    /// Source color
    SrcColor,
    /// 1 - source color
    OneMinusSrcColor,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination color
    DstColor,
    /// 1 - destination color
    OneMinusDstColor,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
}

/// Blend equation combining source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendEquation {
    /// source + destination
    #[default]
    Add,
    /// source - destination
    Subtract,
    /// destination - source
    ReverseSubtract,
}

/// Separate color/alpha blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunctions {
    /// Source factor for RGB.
    pub src_rgb: BlendFactor,
    /// Destination factor for RGB.
    pub dst_rgb: BlendFactor,
    /// Source factor for alpha.
    pub src_alpha: BlendFactor,
    /// Destination factor for alpha.
    pub dst_alpha: BlendFactor,
}

impl BlendFunctions {
    /// Create blend functions from the four factors.
    pub const fn new(
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) -> Self {
        Self {
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
        }
    }
}

impl Default for BlendFunctions {
    fn default() -> Self {
        Self::new(
            BlendFactor::One,
            BlendFactor::Zero,
            BlendFactor::One,
            BlendFactor::Zero,
        )
    }
}

/// High-level alpha blending modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaMode {
    /// Blending disabled.
    #[default]
    Disable,
    /// Additive: `src * a + dst`.
    Add,
    /// Standard "over" compositing.
    Combine,
    /// Subtractive.
    Subtract,
    /// Multiplicative.
    Multiply,
    /// Maximized.
    Maximized,
    /// `src + dst` ignoring alpha.
    OneOne,
    /// Premultiplied alpha.
    PreMultiplied,
}

impl AlphaMode {
    /// Blend factors for this mode, or `None` when blending is disabled.
    pub fn blend_functions(self) -> Option<BlendFunctions> {
        use BlendFactor::*;
        let functions = match self {
            Self::Disable => return None,
            Self::Add => BlendFunctions::new(SrcAlpha, One, Zero, One),
            Self::Combine => BlendFunctions::new(SrcAlpha, OneMinusSrcAlpha, One, One),
            Self::Subtract => BlendFunctions::new(Zero, OneMinusSrcColor, One, One),
            Self::Multiply => BlendFunctions::new(DstColor, Zero, One, One),
            Self::Maximized => BlendFunctions::new(SrcAlpha, OneMinusSrcColor, One, One),
            Self::OneOne => BlendFunctions::new(One, One, Zero, One),
            Self::PreMultiplied => BlendFunctions::new(One, OneMinusSrcAlpha, One, One),
        };
        Some(functions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_has_no_blend_functions() {
        assert!(AlphaMode::Disable.blend_functions().is_none());
    }

    #[test]
    fn test_combine_blend_functions() {
        let functions = AlphaMode::Combine.blend_functions().unwrap();
        assert_eq!(functions.src_rgb, BlendFactor::SrcAlpha);
        assert_eq!(functions.dst_rgb, BlendFactor::OneMinusSrcAlpha);
        assert_eq!(functions.src_alpha, BlendFactor::One);
        assert_eq!(functions.dst_alpha, BlendFactor::One);
    }
}
