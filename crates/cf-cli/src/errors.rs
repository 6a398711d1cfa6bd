//! Failures reported by the binary before exiting non-zero.

use std::sync::Arc;

use cf_config::PathsError;
use cf_host::{DispatchError, SessionError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("argument '{argument}' is not valid UTF-8")]
    NonUtf8Argument { argument: String },
    #[error(transparent)]
    Paths(#[from] PathsError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
