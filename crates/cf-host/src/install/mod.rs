//! Installing and removing plugin executables.
//!
//! Installation runs the candidate binary once as `<binary> <port>
//! SendMetadata` against a Host RPC Server to learn its name and commands,
//! checks the result for repeats among its own commands and against the
//! built-in commands and every installed plugin, then copies the binary into
//! the plugin directory and records it in the registry.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cf_plugin::{PluginCommand, PluginMetadata};
use cf_plugin::protocol::SEND_METADATA_ARG;
use thiserror::Error;
use tracing::{debug, info};

use crate::commands::CommandRegistry;
use crate::context::HostContext;
use crate::launcher::{InputMode, LaunchError, PluginLauncher};
use crate::registry::{PluginConfig, PluginEntry, RegistryError};

const INSTALL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::install");

/// Reasons a plugin cannot be installed or removed.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The source binary does not exist.
    #[error("File not found locally, make sure the file exists at given path {path}")]
    NotFound {
        /// Path given by the user.
        path: Utf8PathBuf,
    },
    /// The binary could not be run for the hand-shake.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// The binary exited unsuccessfully during the hand-shake.
    #[error("plugin binary {path} exited with {status} while reporting its metadata")]
    HandshakeFailed {
        /// Binary path.
        path: Utf8PathBuf,
        /// Exit status.
        status: ExitStatus,
    },
    /// The binary exited without reporting metadata, or reported no name.
    #[error("Unable to obtain plugin name for executable {path}")]
    NoMetadata {
        /// Binary path.
        path: Utf8PathBuf,
    },
    /// A plugin with the same name is installed and `-f` was not given.
    #[error("Plugin name {name} is already taken")]
    NameTaken {
        /// Plugin name.
        name: String,
    },
    /// The plugin declares the same command name twice.
    #[error("Command `{command}` is declared more than once in the plugin being installed.")]
    DuplicateCommand {
        /// Repeated command name.
        command: String,
    },
    /// A plugin alias repeats one of the plugin's own command names or aliases.
    #[error(
        "Alias `{alias}` in the plugin being installed is already one of its own commands or \
         aliases."
    )]
    DuplicateAlias {
        /// Repeated alias.
        alias: String,
    },
    /// A plugin command shadows a built-in command or alias.
    #[error(
        "Command `{command}` in the plugin being installed is a native CF command/alias.  \
         Rename the `{command}` command in the plugin being installed in order to enable its \
         installation and use."
    )]
    NativeCommand {
        /// Offending command name.
        command: String,
    },
    /// A plugin alias shadows a built-in command or alias.
    #[error(
        "Alias `{alias}` in the plugin being installed is a native CF command/alias.  \
         Rename the `{alias}` command in the plugin being installed in order to enable its \
         installation and use."
    )]
    NativeAlias {
        /// Offending alias.
        alias: String,
    },
    /// A plugin command clashes with another plugin's command or alias.
    #[error(
        "Command `{command}` is a command/alias in plugin '{plugin}'.  You could try \
         uninstalling plugin '{plugin}' and then install this plugin in order to invoke the \
         `{command}` command.  However, you should first fully understand the impact of \
         uninstalling the existing '{plugin}' plugin."
    )]
    CommandCollision {
        /// Offending command name.
        command: String,
        /// Installed plugin that owns it.
        plugin: String,
    },
    /// A plugin alias clashes with another plugin's command or alias.
    #[error(
        "Alias `{alias}` is a command/alias in plugin '{plugin}'.  You could try \
         uninstalling plugin '{plugin}' and then install this plugin in order to invoke the \
         `{alias}` command.  However, you should first fully understand the impact of \
         uninstalling the existing '{plugin}' plugin."
    )]
    AliasCollision {
        /// Offending alias.
        alias: String,
        /// Installed plugin that owns it.
        plugin: String,
    },
    /// Another plugin's binary already occupies the destination file.
    #[error("The file {file} already exists under the plugin directory.")]
    FileExists {
        /// Destination file name.
        file: String,
    },
    /// Copying or deleting a plugin binary failed.
    #[error("Could not {action} plugin binary {path}: {source}")]
    Io {
        /// `copy` or `remove`.
        action: &'static str,
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The named plugin is not installed.
    #[error("Plugin name {name} does not exist")]
    NotInstalled {
        /// Plugin name.
        name: String,
    },
    /// The registry could not be read or written.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Installs the plugin binary at `source`.
///
/// With `force`, an installed plugin of the same name is replaced.
///
/// # Errors
///
/// Returns an [`InstallError`] when the binary cannot be run, reports no
/// metadata, collides with an existing command, or cannot be copied.
pub fn install_plugin(
    host: &Arc<HostContext>,
    source: &Utf8Path,
    force: bool,
) -> Result<PluginMetadata, InstallError> {
    let file = match source.file_name() {
        Some(name) if source.is_file() => name.to_owned(),
        _ => {
            return Err(InstallError::NotFound {
                path: source.to_path_buf(),
            });
        }
    };
    let metadata = fetch_metadata(host, source, &file)?;
    let mut config = host.store().load()?;
    validate(&config, host.commands(), &metadata, force)?;

    let replaced = config.remove(metadata.name());
    let destination = host.store().plugins_dir().join(&file);
    let occupied_by_replaced = replaced
        .as_ref()
        .is_some_and(|entry| entry.location() == destination);
    if destination.exists() && !occupied_by_replaced {
        return Err(InstallError::FileExists { file });
    }

    if source != destination {
        copy_binary(source, &destination)?;
    }
    config.insert(metadata.name(), PluginEntry::new(destination.clone(), &metadata));
    host.store().save(&config)?;
    if let Some(entry) = replaced.filter(|entry| entry.location() != destination) {
        remove_binary(entry.location())?;
    }
    info!(
        target: INSTALL_TARGET,
        plugin = metadata.name(),
        version = %metadata.version(),
        location = %destination,
        "plugin installed"
    );
    Ok(metadata)
}

/// Removes the plugin `name` and its installed binary.
///
/// # Errors
///
/// Returns [`InstallError::NotInstalled`] for unknown names, or an error
/// when the registry or binary cannot be updated.
pub fn uninstall_plugin(host: &Arc<HostContext>, name: &str) -> Result<(), InstallError> {
    let mut config = host.store().load()?;
    let entry = config.remove(name).ok_or_else(|| InstallError::NotInstalled {
        name: name.to_owned(),
    })?;
    host.store().save(&config)?;
    remove_binary(entry.location())?;
    info!(target: INSTALL_TARGET, plugin = name, "plugin uninstalled");
    Ok(())
}

fn fetch_metadata(
    host: &Arc<HostContext>,
    source: &Utf8Path,
    file: &str,
) -> Result<PluginMetadata, InstallError> {
    let session = PluginLauncher::new(Arc::clone(host)).spawn(
        file,
        source,
        &[SEND_METADATA_ARG.to_owned()],
        InputMode::Detached,
    )?;
    let service = Arc::clone(session.service());
    let status = session.finish()?;
    if !status.success() {
        return Err(InstallError::HandshakeFailed {
            path: source.to_path_buf(),
            status,
        });
    }
    service
        .take_plugin_metadata()
        .filter(|metadata| !metadata.name().is_empty())
        .ok_or_else(|| InstallError::NoMetadata {
            path: source.to_path_buf(),
        })
}

/// Checks `metadata` against built-ins and installed plugins.
///
/// With `force`, the installed plugin of the same name is ignored because it
/// is about to be replaced.
pub(crate) fn validate(
    config: &PluginConfig,
    builtins: &CommandRegistry,
    metadata: &PluginMetadata,
    force: bool,
) -> Result<(), InstallError> {
    let name = metadata.name();
    if config.get(name).is_some() && !force {
        return Err(InstallError::NameTaken {
            name: name.to_owned(),
        });
    }
    check_own_commands(metadata)?;
    for command in metadata.commands() {
        if builtins.exists(command.name()) {
            return Err(InstallError::NativeCommand {
                command: command.name().to_owned(),
            });
        }
        if let Some(alias) = command.alias().filter(|alias| builtins.exists(alias)) {
            return Err(InstallError::NativeAlias {
                alias: alias.to_owned(),
            });
        }
        for (plugin, entry) in config.iter().filter(|(plugin, _)| *plugin != name) {
            if entry.command_for(command.name()).is_some() {
                return Err(InstallError::CommandCollision {
                    command: command.name().to_owned(),
                    plugin: plugin.to_owned(),
                });
            }
            if let Some(alias) = command.alias().filter(|alias| entry.command_for(alias).is_some())
            {
                return Err(InstallError::AliasCollision {
                    alias: alias.to_owned(),
                    plugin: plugin.to_owned(),
                });
            }
        }
    }
    Ok(())
}

/// Rejects repeated names and aliases within one plugin's own commands.
fn check_own_commands(metadata: &PluginMetadata) -> Result<(), InstallError> {
    let mut tokens = HashSet::new();
    for command in metadata.commands() {
        if !tokens.insert(command.name()) {
            return Err(InstallError::DuplicateCommand {
                command: command.name().to_owned(),
            });
        }
    }
    for alias in metadata.commands().iter().filter_map(PluginCommand::alias) {
        if !tokens.insert(alias) {
            return Err(InstallError::DuplicateAlias {
                alias: alias.to_owned(),
            });
        }
    }
    Ok(())
}

fn copy_binary(source: &Utf8Path, destination: &Utf8Path) -> Result<(), InstallError> {
    let copy_error = |error: io::Error| InstallError::Io {
        action: "copy",
        path: destination.to_path_buf(),
        source: error,
    };
    if let Some(dir) = destination.parent() {
        fs::create_dir_all(dir).map_err(copy_error)?;
    }
    // `fs::copy` carries the permission bits, so the copy stays executable.
    fs::copy(source, destination).map_err(copy_error)?;
    debug!(target: INSTALL_TARGET, from = %source, to = %destination, "plugin binary copied");
    Ok(())
}

fn remove_binary(path: &Utf8Path) -> Result<(), InstallError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(InstallError::Io {
            action: "remove",
            path: path.to_path_buf(),
            source: error,
        }),
    }
}
