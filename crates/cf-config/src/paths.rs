//! Resolves the directories holding session state and installed plugins.
//!
//! Both homes are base directories; the CLI keeps its files underneath a
//! `.cf` child so that pointing `CF_HOME` at an existing home directory
//! behaves like the default.

use std::env;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::Config;
use crate::defaults::{CF_HOME_ENV, CF_PLUGIN_HOME_ENV};

const CF_DIR: &str = ".cf";
const PLUGINS_DIR: &str = "plugins";
const CONFIG_FILE: &str = "config.json";

/// Canonical locations of the CLI's on-disk state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfPaths {
    cf_home: Utf8PathBuf,
    plugin_home: Utf8PathBuf,
}

impl CfPaths {
    /// Derives paths from configuration overrides, then the `CF_HOME` and
    /// `CF_PLUGIN_HOME` environment variables, then the user's home
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error when no home directory can be determined or the
    /// home directory is not valid UTF-8.
    pub fn from_config(config: &Config) -> Result<Self, PathsError> {
        Self::resolve(config, |key| env::var(key).ok(), user_home)
    }

    fn resolve(
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
        home: impl FnOnce() -> Option<Result<Utf8PathBuf, PathsError>>,
    ) -> Result<Self, PathsError> {
        let from_env = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(Utf8PathBuf::from)
        };
        let configured = config
            .cf_home()
            .map(Utf8Path::to_path_buf)
            .or_else(|| from_env(CF_HOME_ENV));
        let cf_home = match configured {
            Some(path) => path,
            None => home().ok_or(PathsError::NoHome)??,
        };
        let plugin_home = config
            .plugin_home()
            .map(Utf8Path::to_path_buf)
            .or_else(|| from_env(CF_PLUGIN_HOME_ENV))
            .unwrap_or_else(|| cf_home.clone());
        Ok(Self {
            cf_home,
            plugin_home,
        })
    }

    /// Creates paths from explicit base directories.
    #[must_use]
    pub fn new(cf_home: impl Into<Utf8PathBuf>, plugin_home: impl Into<Utf8PathBuf>) -> Self {
        Self {
            cf_home: cf_home.into(),
            plugin_home: plugin_home.into(),
        }
    }

    /// Base directory for session state.
    #[must_use]
    pub fn cf_home(&self) -> &Utf8Path {
        &self.cf_home
    }

    /// Base directory for installed plugins.
    #[must_use]
    pub fn plugin_home(&self) -> &Utf8Path {
        &self.plugin_home
    }

    /// Session file written by `cf login` and `cf target`.
    #[must_use]
    pub fn session_file(&self) -> Utf8PathBuf {
        self.cf_home.join(CF_DIR).join(CONFIG_FILE)
    }

    /// Directory holding copied plugin executables.
    #[must_use]
    pub fn plugins_dir(&self) -> Utf8PathBuf {
        self.plugin_home.join(CF_DIR).join(PLUGINS_DIR)
    }

    /// Plugin registry file.
    #[must_use]
    pub fn plugin_registry_file(&self) -> Utf8PathBuf {
        self.plugins_dir().join(CONFIG_FILE)
    }
}

fn user_home() -> Option<Result<Utf8PathBuf, PathsError>> {
    dirs::home_dir().map(|path| {
        Utf8PathBuf::from_path_buf(path).map_err(|raw| PathsError::NonUtf8Home {
            path: raw.display().to_string(),
        })
    })
}

/// Errors raised while resolving CLI directories.
#[derive(Debug, Error)]
pub enum PathsError {
    /// Neither an override nor a home directory is available.
    #[error("cannot determine a home directory; set CF_HOME")]
    NoHome,
    /// The home directory is not valid UTF-8.
    #[error("home directory '{path}' is not valid UTF-8")]
    NonUtf8Home {
        /// Lossy rendering of the path.
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn resolve(config: &Config, vars: &[(&str, &str)]) -> Result<CfPaths, PathsError> {
        let owned: Vec<(String, String)> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        CfPaths::resolve(
            config,
            move |key| {
                owned
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| value.clone())
            },
            || Some(Ok(Utf8PathBuf::from("/home/user"))),
        )
    }

    #[rstest]
    #[case::defaults(&[], "/home/user", "/home/user")]
    #[case::cf_home(&[("CF_HOME", "/srv/cf")], "/srv/cf", "/srv/cf")]
    #[case::plugin_home(&[("CF_PLUGIN_HOME", "/opt/plugins")], "/home/user", "/opt/plugins")]
    #[case::blank_env(&[("CF_HOME", "  ")], "/home/user", "/home/user")]
    fn resolves_homes_from_environment(
        #[case] vars: &[(&str, &str)],
        #[case] cf_home: &str,
        #[case] plugin_home: &str,
    ) {
        let paths = resolve(&Config::default(), vars).expect("paths");
        assert_eq!(paths.cf_home(), cf_home);
        assert_eq!(paths.plugin_home(), plugin_home);
    }

    #[test]
    fn configuration_overrides_environment() {
        let config = Config::default()
            .with_cf_home("/etc/cf")
            .with_plugin_home("/etc/plugins");
        let paths = resolve(&config, &[("CF_HOME", "/srv/cf"), ("CF_PLUGIN_HOME", "/opt")])
            .expect("paths");
        assert_eq!(paths.cf_home(), "/etc/cf");
        assert_eq!(paths.plugin_home(), "/etc/plugins");
    }

    #[test]
    fn derives_file_locations() {
        let paths = CfPaths::new("/home/user", "/opt");
        assert_eq!(paths.session_file(), "/home/user/.cf/config.json");
        assert_eq!(paths.plugins_dir(), "/opt/.cf/plugins");
        assert_eq!(paths.plugin_registry_file(), "/opt/.cf/plugins/config.json");
    }

    #[test]
    fn missing_home_is_an_error() {
        let error = CfPaths::resolve(&Config::default(), |_| None, || None)
            .expect_err("no home");
        assert!(matches!(error, PathsError::NoHome));
    }
}
