//! # File Store Tests

#![allow(clippy::unwrap_used, clippy::panic)]

use searchsync::FileStore;
use searchsync::paths::{CONFIG_FILE_NAME, resolve_with};
use searchsync_core::{
    ConfigStore, Definition, ErrorKind, SearchConfig, TemplateDefinition, VarValue,
};
use std::ffi::OsString;
use std::path::PathBuf;

const DOCUMENT: &str = r#"searches:
- section: Team
- name: Reviews
  template: reviews
  vars:
    repos:
    - a
    - b
- name: Mine
  query: is:open author:@me
templates:
  reviews:
    query: '{{join(repos," OR ")}} is:pr'
"#;

#[test]
fn load_keeps_order_and_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("searches.yaml");
    std::fs::write(&path, DOCUMENT).unwrap();

    let config = FileStore::new().load(&path).unwrap();

    assert_eq!(config.searches.len(), 3);
    assert_eq!(config.searches[0].section_label(), Some("Team"));
    assert_eq!(config.searches[1].template_ref(), Some("reviews"));
    assert_eq!(
        config.searches[1].vars.get("repos"),
        Some(&VarValue::List(vec!["a".to_string(), "b".to_string()]))
    );
    assert_eq!(config.searches[2].literal_query(), Some("is:open author:@me"));
    assert!(config.templates.contains_key("reviews"));
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("searches.yaml");

    let mut config = SearchConfig {
        searches: vec![
            Definition::section("Team").with_id("SSC_1"),
            Definition::with_query("Mine", "is:open"),
        ],
        ..SearchConfig::default()
    };
    config
        .templates
        .insert("t".to_string(), TemplateDefinition::new("is:pr"));

    let store = FileStore::new();
    store.save(&path, &config).unwrap();
    let loaded = store.load(&path).unwrap();

    assert_eq!(loaded, config);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("remove"));
    assert!(!text.contains("vars"));
}

#[test]
fn toml_extension_selects_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("searches.toml");
    let config = SearchConfig {
        searches: vec![Definition::with_query("Mine", "is:open").with_id("SSC_2")],
        ..SearchConfig::default()
    };

    let store = FileStore::new();
    store.save(&path, &config).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[[searches]]"));
    assert_eq!(store.load(&path).unwrap(), config);
}

#[cfg(unix)]
#[test]
fn saved_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("searches.yaml");
    std::fs::write(&path, "searches: []\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    FileStore::new().save(&path, &SearchConfig::default()).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn missing_file_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileStore::new()
        .load(&dir.path().join("absent.yaml"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Persistence);
}

#[test]
fn malformed_file_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("searches.yaml");
    std::fs::write(&path, "searches: [\n").unwrap();

    let err = FileStore::new().load(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
}

#[test]
fn default_location_under_xdg_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = resolve_with(
        None,
        Some(OsString::from(dir.path())),
        Some(PathBuf::from("/unused")),
        None,
    )
    .unwrap();

    assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
}
