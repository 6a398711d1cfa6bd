//! Dependencies shared by core commands and the host call surface.

use std::sync::Arc;

use cf_plugin::models::{
    GetAppModel, GetAppsModel, GetOrgModel, GetOrgUsersModel, GetOrgsModel, GetServiceModel,
    GetServicesModel, GetSpaceModel, GetSpaceUsersModel, GetSpacesModel,
};
use serde::Serialize;

use crate::auth::{Authenticator, StoredTokenAuthenticator};
use crate::commands::{CommandFault, CommandRegistry};
use crate::discovery::DiscoveryClient;
use crate::platform::{Platform, UnconfiguredPlatform};
use crate::registry::PluginStore;
use crate::session::{HostSession, SessionHandle};
use crate::sink::OutputSink;
use crate::version::CLI_VERSION;

/// Everything a command or host call needs, shared for one CLI invocation.
pub struct HostContext {
    sink: OutputSink,
    session: SessionHandle,
    platform: Arc<dyn Platform>,
    authenticator: Arc<dyn Authenticator>,
    commands: CommandRegistry,
    store: PluginStore,
    discovery: DiscoveryClient,
    cli_version: String,
}

impl HostContext {
    /// Starts building a context around `store`.
    #[must_use]
    pub fn builder(store: PluginStore) -> HostContextBuilder {
        HostContextBuilder::new(store)
    }

    /// Output sink all command output flows through.
    #[must_use]
    pub const fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Platform client.
    #[must_use]
    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// Token source for `AccessToken`.
    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Built-in commands.
    #[must_use]
    pub const fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Plugin registry location.
    #[must_use]
    pub const fn store(&self) -> &PluginStore {
        &self.store
    }

    /// Discovery client settings.
    #[must_use]
    pub const fn discovery(&self) -> &DiscoveryClient {
        &self.discovery
    }

    /// Version string reported to plugins.
    #[must_use]
    pub fn cli_version(&self) -> &str {
        &self.cli_version
    }
}

/// Builder for [`HostContext`]; unset parts take production defaults.
pub struct HostContextBuilder {
    store: PluginStore,
    sink: Option<OutputSink>,
    session: Option<SessionHandle>,
    platform: Option<Arc<dyn Platform>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    commands: Option<CommandRegistry>,
    discovery: Option<DiscoveryClient>,
    cli_version: Option<String>,
}

impl HostContextBuilder {
    fn new(store: PluginStore) -> Self {
        Self {
            store,
            sink: None,
            session: None,
            platform: None,
            authenticator: None,
            commands: None,
            discovery: None,
            cli_version: None,
        }
    }

    /// Routes command output through `sink`.
    #[must_use]
    pub fn sink(mut self, sink: OutputSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Uses `session` as the ambient session.
    #[must_use]
    pub fn session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    /// Uses `platform` for resource reads.
    #[must_use]
    pub fn platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Uses `authenticator` for token refresh.
    #[must_use]
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Replaces the built-in command set.
    #[must_use]
    pub fn commands(mut self, commands: CommandRegistry) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Uses `discovery` for the discovery path.
    #[must_use]
    pub fn discovery(mut self, discovery: DiscoveryClient) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Overrides the version reported to plugins.
    #[must_use]
    pub fn cli_version(mut self, version: impl Into<String>) -> Self {
        self.cli_version = Some(version.into());
        self
    }

    /// Finishes the context.
    #[must_use]
    pub fn build(self) -> Arc<HostContext> {
        Arc::new(HostContext {
            sink: self.sink.unwrap_or_else(OutputSink::stdout),
            session: self
                .session
                .unwrap_or_else(|| SessionHandle::in_memory(HostSession::default())),
            platform: self
                .platform
                .unwrap_or_else(|| Arc::new(UnconfiguredPlatform)),
            authenticator: self
                .authenticator
                .unwrap_or_else(|| Arc::new(StoredTokenAuthenticator::new())),
            commands: self.commands.unwrap_or_else(CommandRegistry::builtin),
            store: self.store,
            discovery: self.discovery.unwrap_or_default(),
            cli_version: self
                .cli_version
                .unwrap_or_else(|| CLI_VERSION.to_owned()),
        })
    }
}

/// Structured result a core command delivers in place of its table when a
/// plugin asked for a resource snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PluginModel {
    /// `app NAME`.
    App(Box<GetAppModel>),
    /// `apps`.
    Apps(Vec<GetAppsModel>),
    /// `orgs`.
    Orgs(Vec<GetOrgsModel>),
    /// `spaces`.
    Spaces(Vec<GetSpacesModel>),
    /// `services`.
    Services(Vec<GetServicesModel>),
    /// `org-users`.
    OrgUsers(Vec<GetOrgUsersModel>),
    /// `space-users`.
    SpaceUsers(Vec<GetSpaceUsersModel>),
    /// `org NAME`.
    Org(Box<GetOrgModel>),
    /// `space NAME`.
    Space(Box<GetSpaceModel>),
    /// `service NAME`.
    Service(Box<GetServiceModel>),
}

/// Per-execution view handed to a core command.
pub struct CommandContext {
    host: Arc<HostContext>,
    model_requested: bool,
    model: Option<PluginModel>,
}

impl CommandContext {
    /// Context for an ordinary run that prints its results.
    #[must_use]
    pub const fn new(host: Arc<HostContext>) -> Self {
        Self {
            host,
            model_requested: false,
            model: None,
        }
    }

    /// Context for a run whose results are delivered as a [`PluginModel`].
    #[must_use]
    pub const fn for_plugin_model(host: Arc<HostContext>) -> Self {
        Self {
            host,
            model_requested: true,
            model: None,
        }
    }

    /// Shared host dependencies.
    #[must_use]
    pub const fn host(&self) -> &Arc<HostContext> {
        &self.host
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        self.host.session()
    }

    /// Platform client.
    #[must_use]
    pub fn platform(&self) -> &dyn Platform {
        self.host.platform()
    }

    /// Writes one line of user-facing output.
    ///
    /// Runs that deliver a [`PluginModel`] discard their output instead, so
    /// they neither reach the terminal nor mix into captured output.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFault::Output`] when the terminal rejects the write.
    pub fn say(&self, line: impl AsRef<str>) -> Result<(), CommandFault> {
        if self.model_requested {
            return Ok(());
        }
        Ok(self.host.sink().say(line)?)
    }

    /// Writes every line in order.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFault::Output`] when the terminal rejects a write.
    pub fn say_all<I, S>(&self, lines: I) -> Result<(), CommandFault>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines.into_iter().try_for_each(|line| self.say(line))
    }

    /// Writes the `OK` banner that precedes results.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFault::Output`] when the terminal rejects the write.
    pub fn ok(&self) -> Result<(), CommandFault> {
        self.say_all(["OK", ""])
    }

    /// Returns `true` when results should be delivered as a model.
    #[must_use]
    pub const fn plugin_model_requested(&self) -> bool {
        self.model_requested
    }

    /// Stores the structured result of this run.
    pub fn deliver(&mut self, model: PluginModel) {
        self.model = Some(model);
    }

    /// Consumes the context, returning the delivered model, if any.
    #[must_use]
    pub fn into_model(self) -> Option<PluginModel> {
        self.model
    }

    /// Returns the session after checking that the user is logged in.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFault::NotLoggedIn`] without an access token.
    pub fn require_login(&self) -> Result<HostSession, CommandFault> {
        let session = self.session().snapshot();
        if session.is_logged_in() {
            Ok(session)
        } else {
            Err(CommandFault::NotLoggedIn)
        }
    }

    /// Returns the session after checking that an organisation is targeted.
    ///
    /// # Errors
    ///
    /// Returns a fault when not logged in or no organisation is targeted.
    pub fn require_org(&self) -> Result<HostSession, CommandFault> {
        let session = self.require_login()?;
        if session.has_organization() {
            Ok(session)
        } else {
            Err(CommandFault::NoOrgTargeted)
        }
    }

    /// Returns the session after checking that a space is targeted.
    ///
    /// # Errors
    ///
    /// Returns a fault when not logged in or no organisation or space is
    /// targeted.
    pub fn require_space(&self) -> Result<HostSession, CommandFault> {
        let session = self.require_org()?;
        if session.has_space() {
            Ok(session)
        } else {
            Err(CommandFault::NoSpaceTargeted)
        }
    }
}
