//! Failure outcome of a core command.

use std::io;

use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::install::InstallError;
use crate::platform::PlatformError;
use crate::registry::RegistryError;
use crate::session::SessionError;

/// Why a core command did not complete.
#[derive(Debug, Error)]
pub enum CommandFault {
    /// The arguments did not parse.
    #[error("incorrect usage of '{command}': {message}")]
    Usage {
        /// Command name.
        command: String,
        /// Rendered parser error.
        message: String,
    },
    /// The session has no access token.
    #[error("Not logged in. Use 'cf login' to log in.")]
    NotLoggedIn,
    /// No organisation is targeted.
    #[error("No org targeted, use 'cf target -o ORG' to target an org.")]
    NoOrgTargeted,
    /// No space is targeted.
    #[error("No space targeted, use 'cf target -s SPACE' to target a space.")]
    NoSpaceTargeted,
    /// The platform rejected a request.
    #[error(transparent)]
    Platform(#[from] PlatformError),
    /// The session file could not be updated.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The plugin registry could not be read or written.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Installing or uninstalling a plugin failed.
    #[error(transparent)]
    Install(#[from] InstallError),
    /// Querying a plugin through the discovery path failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Writing to the terminal failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    /// Any other failure, reported verbatim.
    #[error("{message}")]
    Failed {
        /// Reason for the failure.
        message: String,
    },
}

impl CommandFault {
    /// Builds a [`CommandFault::Failed`].
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
