use pretty_assertions::assert_eq;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tolteca_fs::{Error, YamlDocument};

fn write(temp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = temp.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_nested_mapping() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "50_setup.yaml",
        "setup:\n  version: 0.1.0\n  created_at: '2026-01-01T00:00:00Z'\nnotes: init\n",
    );

    let doc = YamlDocument::load(&path).unwrap();

    assert_eq!(doc["notes"], Value::from("init"));
    assert_eq!(doc["setup"]["version"], Value::from("0.1.0"));
}

#[test]
fn test_empty_file_loads_as_empty_mapping() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "50_setup.yaml", "");

    assert_eq!(YamlDocument::load(&path).unwrap(), Mapping::new());
    assert_eq!(YamlDocument::load_raw(&path).unwrap(), Value::Null);
}

#[test]
fn test_comment_only_file_loads_as_empty_mapping() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "60_extra.yaml", "# nothing here yet\n");

    assert_eq!(YamlDocument::load(&path).unwrap(), Mapping::new());
}

#[test]
fn test_malformed_file_names_the_path() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "60_broken.yaml", "a: [1, 2\n");

    let err = YamlDocument::load(&path).unwrap_err();

    assert!(matches!(err, Error::ConfigParse { .. }));
    assert!(err.to_string().contains("60_broken.yaml"), "got: {err}");
}

#[test]
fn test_top_level_sequence_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "60_list.yaml", "- a\n- b\n");

    let err = YamlDocument::load(&path).unwrap_err();
    assert!(err.to_string().contains("expected a mapping"), "got: {err}");

    // the raw loader does not care about the shape
    assert!(YamlDocument::load_raw(&path).unwrap().is_sequence());
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "config.toml", "a = 1");

    assert!(matches!(
        YamlDocument::load(&path),
        Err(Error::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_save_then_load_preserves_nesting() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("50_setup.yaml");
    let mapping: Mapping =
        serde_yaml::from_str("setup:\n  version: 0.1.0\nx: 1\nlist: [a, b]\n").unwrap();

    YamlDocument::save(&path, &mapping).unwrap();

    assert_eq!(YamlDocument::load(&path).unwrap(), mapping);
}
