use repo_fs::{ConfigStore, Error};
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct MirrorConfig {
    name: String,
    roots: Vec<String>,
}

fn sample() -> MirrorConfig {
    MirrorConfig {
        name: "central".into(),
        roots: vec!["/srv/m2".into(), "/srv/extra".into()],
    }
}

#[test]
fn test_load_toml() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("mirror.toml");
    fs::write(&file_path, "name = \"central\"\nroots = [\"/srv/m2\", \"/srv/extra\"]\n").unwrap();

    let config: MirrorConfig = ConfigStore::new().load(&file_path).unwrap();

    assert_eq!(config, sample());
}

#[test]
fn test_load_json() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("mirror.json");
    fs::write(&file_path, r#"{"name": "central", "roots": ["/srv/m2", "/srv/extra"]}"#).unwrap();

    let config: MirrorConfig = ConfigStore::new().load(&file_path).unwrap();

    assert_eq!(config, sample());
}

#[test]
fn test_load_yaml() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("mirror.yml");
    fs::write(&file_path, "name: central\nroots:\n  - /srv/m2\n  - /srv/extra\n").unwrap();

    let config: MirrorConfig = ConfigStore::new().load(&file_path).unwrap();

    assert_eq!(config, sample());
}

#[test]
fn test_save_then_load_each_format() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::new();
    for name in ["out.toml", "out.json", "out.yaml"] {
        let file_path = temp.path().join(name);
        store.save(&file_path, &sample()).unwrap();
        let loaded: MirrorConfig = store.load(&file_path).unwrap();
        assert_eq!(loaded, sample(), "format {name}");
    }
}

#[test]
fn test_unknown_extension_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("mirror.ini");
    fs::write(&file_path, "name=central").unwrap();

    let result: repo_fs::Result<MirrorConfig> = ConfigStore::new().load(&file_path);

    assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("broken.toml");
    fs::write(&file_path, "name = ").unwrap();

    let result: repo_fs::Result<MirrorConfig> = ConfigStore::new().load(&file_path);

    match result {
        Err(Error::ConfigParse { format, .. }) => assert_eq!(format, "TOML"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_format_from_extension_ignores_case() {
    use repo_fs::ConfigFormat;
    use std::path::Path;

    assert_eq!(ConfigFormat::from_path(Path::new("a/mrm.TOML")).unwrap(), ConfigFormat::Toml);
    assert_eq!(ConfigFormat::from_path(Path::new("mrm.yml")).unwrap(), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::Json.to_string(), "JSON");
    assert!(ConfigFormat::from_path(Path::new("mrm")).is_err());
}
