//! Public surface of the prompt library.
//!
//! Re-exports the building blocks so embedders depend on a single crate.

/// Re-export for convenience.
pub use promptlib_config as config;
pub use promptlib_core as core;
/// Re-export for convenience.
pub use promptlib_protocol as protocol;

pub mod resolver;

pub use resolver::PromptResolver;
