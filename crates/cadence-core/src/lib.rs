#![forbid(unsafe_code)]

//! Core: animation primitives, performance tiers, accessibility override, and
//! host interfaces.

pub mod accessibility;
pub mod animation;
pub mod host;
pub mod level;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
