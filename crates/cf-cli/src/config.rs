//! Separates configuration flags from the command line.
//!
//! Only flags listed in [`CONFIG_CLI_FLAGS`] that appear before the command
//! token configure the CLI. Anything after the first other token belongs to
//! the command, so `cf diag --log-filter x` hands `--log-filter x` to the
//! plugin.

use std::ffi::{OsStr, OsString};

use cf_config::{CONFIG_CLI_FLAGS, Config};
use ortho_config::OrthoConfig;

use crate::errors::AppError;

pub(crate) trait ConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if flag.starts_with("--") && CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    /// Program name followed by the configuration flags.
    pub(crate) config_arguments: Vec<OsString>,
    /// The command line proper.
    pub(crate) command: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };
    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut command = Vec::new();
    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value {
                    config_arguments.extend(remaining.next().cloned());
                }
            }
            FlagAction::Stop => {
                command.push(argument.clone());
                command.extend(remaining.cloned());
                break;
            }
        }
    }
    ConfigArgumentSplit {
        config_arguments,
        command,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os(words: &[&str]) -> Vec<OsString> {
        words.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case::bare(&["cf"], &["cf"], &[])]
    #[case::command_only(&["cf", "apps"], &["cf"], &["apps"])]
    #[case::separate_value(&["cf", "--log-filter", "debug", "apps"], &["cf", "--log-filter", "debug"], &["apps"])]
    #[case::inline_value(&["cf", "--log-format=json", "diag", "-v"], &["cf", "--log-format=json"], &["diag", "-v"])]
    #[case::flags_after_command(&["cf", "diag", "--log-filter", "x"], &["cf"], &["diag", "--log-filter", "x"])]
    #[case::unknown_flag_starts_command(&["cf", "--verbose", "apps"], &["cf"], &["--verbose", "apps"])]
    fn splits_config_flags_from_the_command(
        #[case] args: &[&str],
        #[case] config: &[&str],
        #[case] command: &[&str],
    ) {
        let split = split_config_arguments(&os(args));
        assert_eq!(split.config_arguments, os(config));
        assert_eq!(split.command, os(command));
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        assert_eq!(split_config_arguments(&[]), ConfigArgumentSplit::default());
    }
}
