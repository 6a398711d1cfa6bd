//! Plugin-side client for the host call surface.
//!
//! A [`CliConnection`] knows only the loopback port the host passed on the
//! command line. Each method dials the host, performs one exchange, and
//! drops the socket, so a plugin may call from several threads without
//! sharing a stream. Core command output is captured by the host:
//! `call_core_command` followed by `get_output_and_reset` observes exactly
//! that command's lines provided the caller serialises the pair.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ConnectionError, RpcError};
use crate::metadata::PluginMetadata;
use crate::models::{
    GetAppModel, GetAppsModel, GetOrgModel, GetOrgUsersModel, GetOrgsModel, GetServiceModel,
    GetServicesModel, GetSpaceModel, GetSpaceUsersModel, GetSpacesModel, Organization, Space,
};
use crate::protocol::{CONNECT_TIMEOUT, HostMethod, RpcClient};

/// Handle a plugin uses to call back into the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliConnection {
    host: Option<SocketAddr>,
}

impl CliConnection {
    /// Creates a connection to a host listening on `127.0.0.1:<port>`.
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self {
            host: Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)),
        }
    }

    /// Parses the host port passed as the plugin's first argument.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidPort`] when `value` is not a port.
    pub fn from_port_arg(value: &str) -> Result<Self, ConnectionError> {
        parse_port(value).map(Self::new)
    }

    /// Creates a connection with no host behind it.
    ///
    /// Every call fails with [`ConnectionError::NoHost`]; plugins receive
    /// one when a command is run from the discovery path.
    #[must_use]
    pub const fn detached() -> Self {
        Self { host: None }
    }

    /// Returns the host address, if any.
    #[must_use]
    pub const fn host(&self) -> Option<SocketAddr> {
        self.host
    }

    fn call<P, R>(&self, method: HostMethod, params: &P) -> Result<R, ConnectionError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let addr = self.host.ok_or(ConnectionError::NoHost {
            method: method.name(),
        })?;
        let mut client = RpcClient::connect(addr, CONNECT_TIMEOUT)?;
        Ok(client.call(method.name(), params)?)
    }

    /// Returns whether the host CLI is at least `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn is_min_cli_version(&self, version: &str) -> Result<bool, ConnectionError> {
        self.call(HostMethod::IsMinCliVersion, version)
    }

    /// Registers `metadata` with the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn set_plugin_metadata(&self, metadata: &PluginMetadata) -> Result<bool, ConnectionError> {
        self.call(HostMethod::SetPluginMetadata, metadata)
    }

    /// Stops or resumes echoing core command output to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn disable_terminal_output(&self, disable: bool) -> Result<bool, ConnectionError> {
        self.call(HostMethod::DisableTerminalOutput, &disable)
    }

    /// Runs a core command and returns its captured output lines.
    ///
    /// # Errors
    ///
    /// Returns a call fault when the command is unknown or fails, with the
    /// partial output discarded.
    pub fn cli_command<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<String>, ConnectionError> {
        let words: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let succeeded = self.call_core_command(&words)?;
        let output = self.get_output_and_reset()?;
        if succeeded {
            Ok(output)
        } else {
            Err(RpcError::Remote {
                method: HostMethod::CallCoreCommand.name().to_owned(),
                message: format!("core command '{}' failed", words.join(" ")),
            }
            .into())
        }
    }

    /// Runs a core command without echoing its output to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying calls fail.
    pub fn cli_command_without_terminal_output<S: AsRef<str>>(
        &self,
        args: &[S],
    ) -> Result<Vec<String>, ConnectionError> {
        self.disable_terminal_output(true)?;
        let result = self.cli_command(args);
        self.disable_terminal_output(false)?;
        result
    }

    /// Runs a core command; the output is buffered for
    /// [`Self::get_output_and_reset`].
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn call_core_command<S: Serialize>(&self, args: &[S]) -> Result<bool, ConnectionError> {
        self.call(HostMethod::CallCoreCommand, args)
    }

    /// Drains the host's captured output buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_output_and_reset(&self) -> Result<Vec<String>, ConnectionError> {
        self.call(HostMethod::GetOutputAndReset, &())
    }

    /// Returns the targeted organisation.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_current_org(&self) -> Result<Organization, ConnectionError> {
        self.call(HostMethod::GetCurrentOrg, &())
    }

    /// Returns the targeted space.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_current_space(&self) -> Result<Space, ConnectionError> {
        self.call(HostMethod::GetCurrentSpace, &())
    }

    /// Returns the logged-in username.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn username(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::Username, &())
    }

    /// Returns the logged-in user's GUID.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn user_guid(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::UserGuid, &())
    }

    /// Returns the logged-in user's e-mail address.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn user_email(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::UserEmail, &())
    }

    /// Returns whether a user is logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn is_logged_in(&self) -> Result<bool, ConnectionError> {
        self.call(HostMethod::IsLoggedIn, &())
    }

    /// Returns whether SSL validation is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn is_ssl_disabled(&self) -> Result<bool, ConnectionError> {
        self.call(HostMethod::IsSSLDisabled, &())
    }

    /// Returns whether an organisation is targeted.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn has_organization(&self) -> Result<bool, ConnectionError> {
        self.call(HostMethod::HasOrganization, &())
    }

    /// Returns whether a space is targeted.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn has_space(&self) -> Result<bool, ConnectionError> {
        self.call(HostMethod::HasSpace, &())
    }

    /// Returns the targeted API endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn api_endpoint(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::ApiEndpoint, &())
    }

    /// Returns whether an API endpoint is targeted.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn has_api_endpoint(&self) -> Result<bool, ConnectionError> {
        self.call(HostMethod::HasAPIEndpoint, &())
    }

    /// Returns the targeted API version.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn api_version(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::ApiVersion, &())
    }

    /// Returns the loggregator endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn loggregator_endpoint(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::LoggregatorEndpoint, &())
    }

    /// Returns the doppler endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn doppler_endpoint(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::DopplerEndpoint, &())
    }

    /// Returns a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns a call fault when the host cannot refresh the token.
    pub fn access_token(&self) -> Result<String, ConnectionError> {
        self.call(HostMethod::AccessToken, &())
    }

    /// Returns a snapshot of application `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_app(&self, name: &str) -> Result<GetAppModel, ConnectionError> {
        self.call(HostMethod::GetApp, name)
    }

    /// Returns the applications in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_apps(&self) -> Result<Vec<GetAppsModel>, ConnectionError> {
        self.call(HostMethod::GetApps, &())
    }

    /// Returns the visible organisations.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_orgs(&self) -> Result<Vec<GetOrgsModel>, ConnectionError> {
        self.call(HostMethod::GetOrgs, &())
    }

    /// Returns the spaces in the targeted organisation.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_spaces(&self) -> Result<Vec<GetSpacesModel>, ConnectionError> {
        self.call(HostMethod::GetSpaces, &())
    }

    /// Returns the service instances in the targeted space.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_services(&self) -> Result<Vec<GetServicesModel>, ConnectionError> {
        self.call(HostMethod::GetServices, &())
    }

    /// Returns the users of organisation `org`, filtered by `extra_args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_org_users(
        &self,
        org: &str,
        extra_args: &[&str],
    ) -> Result<Vec<GetOrgUsersModel>, ConnectionError> {
        let mut args = Vec::with_capacity(extra_args.len() + 1);
        args.push(org);
        args.extend_from_slice(extra_args);
        self.call(HostMethod::GetOrgUsers, &args)
    }

    /// Returns the users of `space` within `org`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_space_users(
        &self,
        org: &str,
        space: &str,
    ) -> Result<Vec<GetSpaceUsersModel>, ConnectionError> {
        self.call(HostMethod::GetSpaceUsers, &[org, space])
    }

    /// Returns a snapshot of organisation `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_org(&self, name: &str) -> Result<GetOrgModel, ConnectionError> {
        self.call(HostMethod::GetOrg, name)
    }

    /// Returns a snapshot of space `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_space(&self, name: &str) -> Result<GetSpaceModel, ConnectionError> {
        self.call(HostMethod::GetSpace, name)
    }

    /// Returns a snapshot of service instance `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub fn get_service(&self, name: &str) -> Result<GetServiceModel, ConnectionError> {
        self.call(HostMethod::GetService, name)
    }
}

pub(crate) fn parse_port(value: &str) -> Result<u16, ConnectionError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|source| ConnectionError::InvalidPort {
            value: value.to_owned(),
            source,
        })
}
