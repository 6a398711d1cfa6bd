//! Unit tests for the registry model and store.

use std::fs;

use camino::Utf8PathBuf;
use cf_plugin::{PluginCommand, PluginMetadata, VersionType};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

struct StoreDir {
    _dir: TempDir,
    store: PluginStore,
}

#[fixture]
fn store_dir() -> StoreDir {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    StoreDir {
        store: PluginStore::in_dir(root.join("plugins")),
        _dir: dir,
    }
}

fn diagnose() -> PluginMetadata {
    PluginMetadata::new("diagnose", VersionType::new(1, 2, 3))
        .with_command(PluginCommand::new("diag", "run diagnostics").with_alias("d"))
        .with_command(PluginCommand::new("report", "print a report"))
}

#[rstest]
fn missing_file_is_an_empty_registry(store_dir: StoreDir) {
    assert!(store_dir.store.load().expect("load").is_empty());
}

#[rstest]
fn malformed_file_is_a_registry_error(store_dir: StoreDir) {
    let path = store_dir.store.registry_file();
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, "{\"Plugins\": [").expect("write");
    let error = store_dir.store.load().expect_err("malformed");
    assert!(matches!(error, RegistryError::Malformed { .. }));
    assert!(error.to_string().contains("config.json"));
}

#[rstest]
fn saved_registry_reloads(store_dir: StoreDir) {
    let mut config = PluginConfig::default();
    config.insert("diagnose", PluginEntry::new("/opt/diagnose", &diagnose()));
    store_dir.store.save(&config).expect("save");

    let reloaded = store_dir.store.load().expect("load");
    assert_eq!(reloaded, config);
    let entry = reloaded.get("diagnose").expect("entry");
    assert_eq!(entry.location(), "/opt/diagnose");
    assert_eq!(entry.version(), VersionType::new(1, 2, 3));
}

#[rstest]
fn reads_the_documented_shape(store_dir: StoreDir) {
    let path = store_dir.store.registry_file();
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(
        path,
        r#"{"Plugins": {"diagnose": {
            "Location": "/opt/diagnose",
            "Version": {"Major": 1, "Minor": 0, "Build": 0},
            "Commands": [{"Name": "diag", "Alias": "d", "HelpText": "run diagnostics"}]
        }}}"#,
    )
    .expect("write");

    let config = store_dir.store.load().expect("load");
    let found = config.find_command("d").expect("alias match");
    assert_eq!(found.plugin, "diagnose");
    assert_eq!(found.command.name(), "diag");
}

#[rstest]
#[case::name("diag", Some("diag"))]
#[case::alias("d", Some("diag"))]
#[case::second("report", Some("report"))]
#[case::missing("deploy", None)]
fn finds_commands_by_name_or_alias(#[case] token: &str, #[case] expected: Option<&str>) {
    let mut config = PluginConfig::default();
    config.insert("diagnose", PluginEntry::new("/opt/diagnose", &diagnose()));
    let found = config.find_command(token).map(|found| found.command.name());
    assert_eq!(found, expected);
}

#[test]
fn remove_drops_the_entry() {
    let mut config = PluginConfig::default();
    config.insert("diagnose", PluginEntry::new("/opt/diagnose", &diagnose()));
    assert!(config.remove("diagnose").is_some());
    assert!(config.remove("diagnose").is_none());
    assert!(config.is_empty());
}
