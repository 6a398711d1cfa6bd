//! Closed method tables for both RPC services.

use crate::error::RpcError;

/// Service identifier under which the host exposes its call surface.
pub const HOST_SERVICE: &str = "CliRpcCmd";

/// Service identifier under which a plugin exposes its discovery surface.
pub const PLUGIN_SERVICE: &str = "RPC";

macro_rules! method_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $service:literal {
            $( $(#[$variant_meta:meta])* $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$variant_meta])* $variant ),+
        }

        impl $name {
            /// Every method in the table, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// Returns the fully qualified wire name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => concat!($service, ".", stringify!($variant)) ),+
                }
            }

            /// Resolves a fully qualified wire name.
            ///
            /// # Errors
            ///
            /// Returns [`RpcError::UnknownMethod`] for names outside the table.
            pub fn parse(method: &str) -> Result<Self, RpcError> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.name() == method)
                    .ok_or_else(|| RpcError::UnknownMethod {
                        method: method.to_owned(),
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

method_table! {
    /// Operations the host exposes to a running plugin.
    pub enum HostMethod in "CliRpcCmd" {
        /// Compares the running CLI version against a required version.
        IsMinCliVersion,
        /// Registers the calling plugin's metadata with the host.
        SetPluginMetadata,
        /// Toggles whether core command output reaches the terminal.
        DisableTerminalOutput,
        /// Runs a built-in core command with captured output.
        CallCoreCommand,
        /// Drains the captured output buffer.
        GetOutputAndReset,
        /// Returns the targeted organisation.
        GetCurrentOrg,
        /// Returns the targeted space.
        GetCurrentSpace,
        /// Returns the logged-in username.
        Username,
        /// Returns the logged-in user's GUID.
        UserGuid,
        /// Returns the logged-in user's e-mail address.
        UserEmail,
        /// Reports whether a user is logged in.
        IsLoggedIn,
        /// Reports whether SSL validation is disabled.
        IsSSLDisabled,
        /// Reports whether an organisation is targeted.
        HasOrganization,
        /// Reports whether a space is targeted.
        HasSpace,
        /// Returns the targeted API endpoint.
        ApiEndpoint,
        /// Reports whether an API endpoint is targeted.
        HasAPIEndpoint,
        /// Returns the targeted API version.
        ApiVersion,
        /// Returns the loggregator endpoint.
        LoggregatorEndpoint,
        /// Returns the doppler endpoint.
        DopplerEndpoint,
        /// Refreshes and returns the access token.
        AccessToken,
        /// Snapshot of one application.
        GetApp,
        /// Snapshot of the applications in the targeted space.
        GetApps,
        /// Snapshot of visible organisations.
        GetOrgs,
        /// Snapshot of spaces in the targeted organisation.
        GetSpaces,
        /// Snapshot of service instances in the targeted space.
        GetServices,
        /// Snapshot of users in an organisation.
        GetOrgUsers,
        /// Snapshot of users in a space.
        GetSpaceUsers,
        /// Snapshot of one organisation.
        GetOrg,
        /// Snapshot of one space.
        GetSpace,
        /// Snapshot of one service instance.
        GetService,
    }
}

method_table! {
    /// Operations a plugin exposes on the discovery path.
    pub enum PluginMethod in "RPC" {
        /// Lists the plugin's commands.
        ListCmds,
        /// Checks whether the plugin implements a command.
        CmdExists,
        /// Runs a command non-interactively.
        Run,
    }
}
