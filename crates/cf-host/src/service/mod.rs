//! Host call surface: the `CliRpcCmd.*` methods a plugin calls back into.
//!
//! [`HostService`] resolves each request against the closed
//! [`HostMethod`] table, so an unknown method is answered with a fault
//! instead of being looked up dynamically. Logical failures and panics
//! raised by core commands become call faults; neither closes the
//! connection nor stops the server.
//!
//! Output capture is reset at the start of every `CallCoreCommand`.
//! Callers running concurrent `CallCoreCommand`/`GetOutputAndReset` pairs
//! must serialise them themselves.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use cf_plugin::models::{Organization, Space};
use cf_plugin::protocol::{RequestHandler, RpcRequest, RpcResponse, unknown_method};
use cf_plugin::{HostMethod, PluginMetadata, RpcError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::AuthError;
use crate::commands::CommandFault;
use crate::context::{CommandContext, HostContext, PluginModel};
use crate::version::{self, VersionError};

const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::rpc");

/// Logical failure of one host call, returned to the plugin as a fault.
#[derive(Debug, Error)]
pub enum HostError {
    /// The request parameters did not match the method.
    #[error(transparent)]
    Params(#[from] RpcError),
    /// The requested core command does not exist.
    #[error("'{command}' is not a core command")]
    UnknownCommand {
        /// Requested command.
        command: String,
    },
    /// The core command failed.
    #[error("command '{command}' failed: {source}")]
    Command {
        /// Command name.
        command: String,
        /// Failure reported by the command.
        #[source]
        source: Box<CommandFault>,
    },
    /// The core command panicked.
    #[error("command '{command}' panicked: {message}")]
    Panicked {
        /// Command name.
        command: String,
        /// Panic payload, when it was a string.
        message: String,
    },
    /// The command completed without producing the requested snapshot.
    #[error("command '{command}' produced no result")]
    NoModel {
        /// Command name.
        command: String,
    },
    /// The result could not be encoded for the wire.
    #[error(transparent)]
    Encode(RpcError),
    /// Token refresh failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// A version string could not be parsed.
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Serves host calls against a shared [`HostContext`].
pub struct HostService {
    host: Arc<HostContext>,
    metadata: Mutex<Option<PluginMetadata>>,
}

impl HostService {
    /// Creates a service over `host`.
    #[must_use]
    pub const fn new(host: Arc<HostContext>) -> Self {
        Self {
            host,
            metadata: Mutex::new(None),
        }
    }

    /// Shared host context.
    #[must_use]
    pub const fn host(&self) -> &Arc<HostContext> {
        &self.host
    }

    /// Removes and returns metadata registered through `SetPluginMetadata`.
    #[must_use]
    pub fn take_plugin_metadata(&self) -> Option<PluginMetadata> {
        self.metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Executes one host method.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] for logical failures of the call.
    pub fn call(&self, method: HostMethod, request: &RpcRequest) -> Result<Value, HostError> {
        let session = || self.host.session().snapshot();
        let value = match method {
            HostMethod::IsMinCliVersion => {
                let required: String = request.params()?;
                to_value(&version::satisfies(self.host.cli_version(), &required)?)?
            }
            HostMethod::SetPluginMetadata => {
                let metadata: PluginMetadata = request.params()?;
                debug!(target: SERVICE_TARGET, plugin = metadata.name(), "plugin metadata registered");
                *self.metadata.lock().unwrap_or_else(PoisonError::into_inner) = Some(metadata);
                to_value(&true)?
            }
            HostMethod::DisableTerminalOutput => {
                let disable: bool = request.params()?;
                self.host.sink().disable_terminal_output(disable);
                to_value(&true)?
            }
            HostMethod::CallCoreCommand => {
                let args: Vec<String> = request.params()?;
                to_value(&self.call_core_command(&args))?
            }
            HostMethod::GetOutputAndReset => to_value(&self.host.sink().drain_lines())?,
            HostMethod::GetCurrentOrg => {
                let fields = session().organization_fields;
                to_value(&Organization {
                    guid: fields.guid,
                    name: fields.name,
                })?
            }
            HostMethod::GetCurrentSpace => {
                let fields = session().space_fields;
                to_value(&Space {
                    guid: fields.guid,
                    name: fields.name,
                })?
            }
            HostMethod::Username => to_value(&session().username())?,
            HostMethod::UserGuid => to_value(&session().user_guid())?,
            HostMethod::UserEmail => to_value(&session().user_email())?,
            HostMethod::IsLoggedIn => to_value(&session().is_logged_in())?,
            HostMethod::IsSSLDisabled => to_value(&session().ssl_disabled)?,
            HostMethod::HasOrganization => to_value(&session().has_organization())?,
            HostMethod::HasSpace => to_value(&session().has_space())?,
            HostMethod::ApiEndpoint => to_value(&session().target)?,
            HostMethod::HasAPIEndpoint => to_value(&session().has_api_endpoint())?,
            HostMethod::ApiVersion => to_value(&session().api_version)?,
            HostMethod::LoggregatorEndpoint => to_value(session().loggregator_endpoint())?,
            HostMethod::DopplerEndpoint => to_value(&session().doppler_endpoint)?,
            HostMethod::AccessToken => {
                to_value(&self.host.authenticator().refresh_token(self.host.session())?)?
            }
            HostMethod::GetApp => self.snapshot_named("app", request)?,
            HostMethod::GetApps => self.snapshot(&["apps"])?,
            HostMethod::GetOrgs => self.snapshot(&["orgs"])?,
            HostMethod::GetSpaces => self.snapshot(&["spaces"])?,
            HostMethod::GetServices => self.snapshot(&["services"])?,
            HostMethod::GetOrgUsers => self.snapshot_with_args("org-users", request)?,
            HostMethod::GetSpaceUsers => self.snapshot_with_args("space-users", request)?,
            HostMethod::GetOrg => self.snapshot_named("org", request)?,
            HostMethod::GetSpace => self.snapshot_named("space", request)?,
            HostMethod::GetService => self.snapshot_named("service", request)?,
        };
        Ok(value)
    }

    /// Runs a core command on a plugin's behalf, reporting failure as
    /// `false`. The output sink is reset before the command starts.
    pub fn call_core_command(&self, args: &[String]) -> bool {
        let sink = self.host.sink();
        sink.reset();
        let Some((name, rest)) = args.split_first() else {
            return false;
        };
        match self.run_guarded(name, rest, false) {
            Ok(_) => true,
            Err(HostError::UnknownCommand { command }) => {
                debug!(target: SERVICE_TARGET, %command, "plugin requested unknown core command");
                false
            }
            Err(error) => {
                warn!(target: SERVICE_TARGET, command = %name, %error, "core command failed");
                sink.say("FAILED").ok();
                sink.say(failure_text(&error)).ok();
                false
            }
        }
    }

    fn snapshot_named(&self, command: &str, request: &RpcRequest) -> Result<Value, HostError> {
        let name: String = request.params()?;
        self.snapshot(&[command, name.as_str()])
    }

    fn snapshot_with_args(&self, command: &str, request: &RpcRequest) -> Result<Value, HostError> {
        let args: Vec<String> = request.params()?;
        let mut words = vec![command];
        words.extend(args.iter().map(String::as_str));
        self.snapshot(&words)
    }

    /// Runs a resource command in model mode and returns the model it
    /// delivers. Model runs never write to the sink, so the shared terminal
    /// setting and capture buffer are left alone for concurrent calls.
    fn snapshot(&self, words: &[&str]) -> Result<Value, HostError> {
        let Some((name, rest)) = words.split_first() else {
            return Err(HostError::UnknownCommand {
                command: String::new(),
            });
        };
        let args: Vec<String> = rest.iter().map(|word| (*word).to_owned()).collect();
        let model = self
            .run_guarded(name, &args, true)?
            .ok_or_else(|| HostError::NoModel {
                command: (*name).to_owned(),
            })?;
        to_value(&model)
    }

    fn run_guarded(
        &self,
        name: &str,
        args: &[String],
        want_model: bool,
    ) -> Result<Option<PluginModel>, HostError> {
        let command = self
            .host
            .commands()
            .find(name)
            .ok_or_else(|| HostError::UnknownCommand {
                command: name.to_owned(),
            })?;
        let host = Arc::clone(&self.host);
        let mut ctx = if want_model {
            CommandContext::for_plugin_model(host)
        } else {
            CommandContext::new(host)
        };
        debug!(target: SERVICE_TARGET, command = name, want_model, "running core command");
        match panic::catch_unwind(AssertUnwindSafe(|| command.execute(&mut ctx, args))) {
            Ok(Ok(())) => Ok(ctx.into_model()),
            Ok(Err(source)) => Err(HostError::Command {
                command: name.to_owned(),
                source: Box::new(source),
            }),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(target: SERVICE_TARGET, command = name, %message, "core command panicked");
                Err(HostError::Panicked {
                    command: name.to_owned(),
                    message,
                })
            }
        }
    }
}

fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> Result<Value, HostError> {
    serde_json::to_value(value).map_err(|error| HostError::Encode(RpcError::Encode(error.into())))
}

fn failure_text(error: &HostError) -> String {
    match error {
        HostError::Command { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

impl RequestHandler for HostService {
    fn handle(&self, request: &RpcRequest) -> RpcResponse {
        let method = match HostMethod::parse(request.method()) {
            Ok(method) => method,
            Err(error) => return unknown_method(request, &error),
        };
        debug!(target: SERVICE_TARGET, method = method.name(), "host call");
        match self.call(method, request) {
            Ok(value) => RpcResponse::ok(request.id(), &value)
                .unwrap_or_else(|error| RpcResponse::fault(request.id(), error.to_string())),
            Err(error) => {
                debug!(target: SERVICE_TARGET, method = method.name(), %error, "host call fault");
                RpcResponse::fault(request.id(), error.to_string())
            }
        }
    }
}
