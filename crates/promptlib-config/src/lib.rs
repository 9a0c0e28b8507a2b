//! `promptlib.json5` settings: storage location and key, import defaults and
//! export directory.
//!
//! Files are read from the system, user and working-directory layers plus any
//! `--config` override, merged in that order and checked against the schema
//! before decoding.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
pub use model::*;
