//! Errors raised while loading `promptlib.json5` layers.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// `origin` is the layer label, or `config` for single-file loads.
    #[error("{origin} is not valid JSON5: {source}")]
    Parse {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged config passed the schema but did not decode.
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
    /// `path` is `<layer>:<dotted.key>`.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}

impl ConfigError {
    pub(crate) fn read(path: &std::path::Path, source: io::Error) -> Self {
        ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(origin: &str, source: json5::Error) -> Self {
        ConfigError::Parse {
            origin: origin.to_string(),
            source,
        }
    }
}
