//! Locating and reading `promptlib.json5` layers.

use super::{
    ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_FILE, LoadedLayer, SYSTEM_CONFIG_PATH,
    SchemaMode, schema,
};
use crate::ConfigError;
use crate::model::default_home_dir;
use log::debug;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// No system layer outside Unix.
pub(super) fn system_config_path() -> Option<PathBuf> {
    cfg!(unix).then(|| PathBuf::from(SYSTEM_CONFIG_PATH))
}

pub(super) fn user_config_path() -> PathBuf {
    default_home_dir().join(DEFAULT_CONFIG_FILE)
}

/// Read and schema-check one layer.
///
/// A missing file is `Ok(None)` unless `required`; runtime layers named on the
/// command line are required.
pub(super) fn read_layer(
    source: ConfigLayerSource,
    path: &Path,
    required: bool,
) -> Result<Option<LoadedLayer>, ConfigError> {
    let label = format!("{}({})", source.name(), path.display());
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {
            debug!("no {} layer (path={})", source.name(), path.display());
            return Ok(None);
        }
        Err(err) => return Err(ConfigError::read(path, err)),
    };
    let value: Value =
        json5::from_str(&contents).map_err(|err| ConfigError::parse(&label, err))?;
    schema::validate_layer_schema(&value, SchemaMode::Partial, &label)?;
    debug!("read config layer (layer={label}, bytes={})", contents.len());
    Ok(Some(LoadedLayer {
        meta: ConfigLayer {
            source,
            path: path.to_path_buf(),
        },
        value,
    }))
}

/// Canonical path, or the path as given when it does not exist yet.
pub(super) fn canonical(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(ConfigError::read(path, err)),
    }
}
