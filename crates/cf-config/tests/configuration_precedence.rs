//! Layer precedence for configuration loading.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use cf_config::{Config, LogFormat};
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::rstest;
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe in edition 2024; the override is
        // restored on drop while the mutex is held.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

fn args(extra: &[&str]) -> Vec<OsString> {
    std::iter::once("cf")
        .chain(extra.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn environment_sets_discovery_port() {
    let _env = EnvOverride::set_var("CF_DISCOVERY_PORT", OsStr::new("3000"));
    let config = Config::load_from_iter(args(&[])).expect("load");
    assert_eq!(config.discovery_port(), 3000);
}

#[test]
fn cli_flag_beats_environment() {
    let _env = EnvOverride::set_var("CF_DISCOVERY_PORT", OsStr::new("3000"));
    let config = Config::load_from_iter(args(&["--discovery-port", "4000"])).expect("load");
    assert_eq!(config.discovery_port(), 4000);
}

#[rstest]
#[case::json("json", LogFormat::Json)]
#[case::compact("compact", LogFormat::Compact)]
fn config_file_sets_log_format(#[case] value: &str, #[case] expected: LogFormat) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("cf.toml");
    fs::write(&path, format!("log_format = \"{value}\"\nlog_filter = \"debug\"\n"))
        .expect("write config");
    let path_text = path.to_str().expect("utf-8 path");

    let config = Config::load_from_iter(args(&["--config-path", path_text])).expect("load");
    assert_eq!(config.log_format(), expected);
    assert_eq!(config.log_filter(), "debug");
}

#[test]
fn unset_layers_fall_back_to_defaults() {
    let config = Config::load_from_iter(args(&[])).expect("load");
    assert_eq!(config.log_filter(), "warn");
    assert!(config.plugin_home().is_none());
}
