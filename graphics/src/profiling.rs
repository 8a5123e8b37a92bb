//! Profiling support via Tracy.
//!
//! Profiling is enabled via the `profiling` Cargo feature:
//!
//! ```toml
//! [dependencies]
//! ember-graphics = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! ```ignore
//! use ember_graphics::profiling::{frame_mark, profile_scope};
//!
//! fn render_frame() {
//!     profile_scope!("render_frame");
//!     // ... draw ...
//!     frame_mark!();
//! }
//! ```
//!
//! When profiling is disabled (the default), all macros compile to no-ops with
//! zero runtime overhead.

#[cfg(feature = "profiling")]
pub use tracy_client::{self, Client, frame_mark as tracy_frame_mark, plot as tracy_plot, span};

pub use crate::{frame_mark, profile_function, profile_plot, profile_scope};

/// Start the Tracy client (no-op when profiling disabled).
pub fn start() {
    #[cfg(feature = "profiling")]
    {
        let _ = Client::start();
    }
}

/// Mark the end of a frame for Tracy's frame analysis.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! frame_mark {
    () => {
        $crate::profiling::tracy_frame_mark()
    };
}

/// Mark the end of a frame (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! frame_mark {
    () => {};
}

/// Create a profiling span for the current scope.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Create a profiling span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Create a profiling span for the entire function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Create a profiling span for function (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Plot a value over time in Tracy.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

/// Plot a value (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        let _ = $value;
    };
}
