//! Tests for layered configuration loading.

use super::*;
use crate::OnDuplicate;
use pretty_assertions::assert_eq;
use promptlib_protocol::ImportMode;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options that only look at the given cwd and explicit paths.
fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = PromptLibConfig::load_from_str("{}").expect("config");
    assert_eq!(config.storage.key, "promptLibrary.v1");
    assert_eq!(config.storage.quota_bytes, None);
    assert_eq!(config.import.mode, ImportMode::Merge);
    assert_eq!(config.import.on_duplicate, OnDuplicate::Ask);
    assert_eq!(config.import.backup_retention, 5);
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = PromptLibConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
}

/// Reject invalid import mode values with the offending path.
#[test]
fn rejects_invalid_import_mode() {
    let err = PromptLibConfig::load_from_str(r#"{ import: { mode: "append" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("import.mode"));
}

#[test]
fn rejects_empty_storage_key() {
    let err = PromptLibConfig::load_from_str(r#"{ storage: { key: "  " } }"#).unwrap_err();
    assert!(format!("{err}").contains("storage.key"));
}

#[test]
fn rejects_zero_quota() {
    let err = PromptLibConfig::load_from_str(r#"{ storage: { quota_bytes: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("storage.quota_bytes"));
}

#[test]
fn parses_full_config() {
    let config = PromptLibConfig::load_from_str(
        r#"{
            // comments are allowed in JSON5
            storage: { path: "/tmp/prompts", key: "lib", quota_bytes: 1024 },
            import: { mode: "replace", on_duplicate: "overwrite", backup_retention: 2 },
            export: { dir: "/tmp/exports" },
        }"#,
    )
    .expect("config");
    assert_eq!(config.storage.data_dir(), PathBuf::from("/tmp/prompts"));
    assert_eq!(config.storage.key, "lib");
    assert_eq!(config.storage.quota_bytes, Some(1024));
    assert_eq!(config.import.mode, ImportMode::Replace);
    assert_eq!(config.import.on_duplicate, OnDuplicate::Overwrite);
    assert_eq!(config.import.backup_retention, 2);
    assert_eq!(config.export.output_dir(), PathBuf::from("/tmp/exports"));
}

/// Cwd config takes precedence over user and system layers.
#[test]
fn layered_config_prefers_cwd_over_user_and_system() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    let system_config = root.join("system.json5");
    write_json5(
        &system_config,
        "{ storage: { key: \"system\", quota_bytes: 100 } }",
    );
    let user_config = root.join("user.json5");
    write_json5(&user_config, "{ storage: { key: \"user\" } }");
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ storage: { key: \"cwd\" } }",
    );

    let mut options = isolated_options(&cwd);
    options.system_config_path = Some(system_config);
    options.user_config_path = Some(user_config);

    let layered = PromptLibConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.storage.key, "cwd");
    assert_eq!(layered.config.storage.quota_bytes, Some(100));
    assert_eq!(layered.layers.len(), 3);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::System);
    assert_eq!(layered.layers[2].source, ConfigLayerSource::Cwd);
}

#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(
        &root.join(DEFAULT_CONFIG_FILE),
        "{ import: { on_duplicate: \"keep\" } }",
    );
    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, "{ import: { on_duplicate: \"overwrite\" } }");

    let options = isolated_options(root).with_runtime_path(&runtime_config);
    let layered = PromptLibConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.import.on_duplicate, OnDuplicate::Overwrite);
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Runtime)
    );
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = isolated_options(temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    let err = PromptLibConfig::load_layered_with_options(options).unwrap_err();
    match err {
        ConfigError::Read { path, .. } => assert!(path.ends_with("nope.json5")),
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
fn syntax_errors_name_the_layer() {
    let temp = TempDir::new().expect("tmp");
    write_json5(&temp.path().join(DEFAULT_CONFIG_FILE), "{ storage: ");
    let err = PromptLibConfig::load_layered_with_options(isolated_options(temp.path()))
        .unwrap_err();
    assert!(matches!(&err, ConfigError::Parse { origin, .. } if origin.starts_with("cwd(")));

    let err = PromptLibConfig::load_from_str("{ nope").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { origin, .. } if origin == "config"));
}

#[test]
fn schema_errors_name_the_layer() {
    let temp = TempDir::new().expect("tmp");
    write_json5(
        &temp.path().join(DEFAULT_CONFIG_FILE),
        "{ export: { dir: 42 } }",
    );
    let err = PromptLibConfig::load_layered_with_options(isolated_options(temp.path()))
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("export.dir"));
}

#[test]
fn no_layers_yields_defaults() {
    let temp = TempDir::new().expect("tmp");
    let layered =
        PromptLibConfig::load_layered_with_options(isolated_options(temp.path())).expect("layered");
    assert!(layered.layers.is_empty());
    assert_eq!(layered.config.storage.key, "promptLibrary.v1");
}
