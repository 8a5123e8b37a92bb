//! Fixed-function state caches.
//!
//! Each state struct keeps the desired value and the last applied value of
//! its fields. Setters only touch the desired value; `apply` pushes exactly
//! the fields that differ and reports how many context calls it issued.
//! None of them holds a reference to the context.

mod alpha;
mod depth_culling;
mod stencil;
mod tracked;

pub use alpha::AlphaState;
pub use depth_culling::DepthCullingState;
pub use stencil::StencilState;
pub use tracked::Tracked;
