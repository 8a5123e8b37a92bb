//! Uniform values.

/// A value uploaded to a shader uniform.
///
/// The engine keeps the last value set per uniform of the bound program and
/// skips uploads of identical values.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Signed integer (also samplers and booleans).
    Int(i32),
    /// Scalar float.
    Float(f32),
    /// 2-component vector.
    Float2([f32; 2]),
    /// 3-component vector.
    Float3([f32; 3]),
    /// 4-component vector.
    Float4([f32; 4]),
    /// Column-major 4x4 matrix.
    Matrix([f32; 16]),
    /// Float array.
    FloatArray(Vec<f32>),
    /// Array of column-major 4x4 matrices, flattened.
    Matrices(Vec<f32>),
}

impl UniformValue {
    /// Number of floats (or ints) carried by the value.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(_) | Self::Float(_) => 1,
            Self::Float2(_) => 2,
            Self::Float3(_) => 3,
            Self::Float4(_) => 4,
            Self::Matrix(_) => 16,
            Self::FloatArray(values) | Self::Matrices(values) => values.len(),
        }
    }

    /// Whether the value carries no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Int(value as i32)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        Self::Float2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Float3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Float4(value)
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(value: [f32; 16]) -> Self {
        Self::Matrix(value)
    }
}
