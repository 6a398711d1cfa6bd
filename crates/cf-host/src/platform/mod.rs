//! Seam between core commands and the platform API.
//!
//! The HTTP client and resource mapping live outside this crate. Core
//! commands see the platform only through [`Platform`], which keeps them
//! testable against fabricated data.

mod types;

use thiserror::Error;

pub use self::types::{
    AppDetail, AppSummary, InstanceStatus, LastOperation, OrgDetail, Quota, ResourceRef, Role,
    RouteSummary, ServiceInstance, SpaceDetail, UserRoles,
};

/// Read access to platform resources, scoped by GUIDs from the session.
pub trait Platform: Send + Sync {
    /// Lists applications in a space.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried.
    fn apps(&self, space_guid: &str) -> Result<Vec<AppSummary>, PlatformError>;

    /// Fetches one application by name.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] for unknown names.
    fn app(&self, space_guid: &str, name: &str) -> Result<AppDetail, PlatformError>;

    /// Lists organisations visible to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried.
    fn orgs(&self) -> Result<Vec<ResourceRef>, PlatformError>;

    /// Fetches one organisation by name.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] for unknown names.
    fn org(&self, name: &str) -> Result<OrgDetail, PlatformError>;

    /// Lists spaces in an organisation.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried.
    fn spaces(&self, org_guid: &str) -> Result<Vec<ResourceRef>, PlatformError>;

    /// Fetches one space by name.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] for unknown names.
    fn space(&self, org_guid: &str, name: &str) -> Result<SpaceDetail, PlatformError>;

    /// Lists service instances in a space.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried.
    fn services(&self, space_guid: &str) -> Result<Vec<ServiceInstance>, PlatformError>;

    /// Fetches one service instance by name.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] for unknown names.
    fn service(&self, space_guid: &str, name: &str) -> Result<ServiceInstance, PlatformError>;

    /// Lists users with roles in an organisation.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried.
    fn org_users(&self, org_guid: &str) -> Result<Vec<UserRoles>, PlatformError>;

    /// Lists users with roles in a space.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be queried.
    fn space_users(&self, space_guid: &str) -> Result<Vec<UserRoles>, PlatformError>;
}

/// Failures reported by the platform client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// No API endpoint is configured.
    #[error("no API endpoint set; use 'cf api' to set an endpoint")]
    NoEndpoint,
    /// The named resource does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Resource kind, e.g. `App`.
        kind: &'static str,
        /// Requested name.
        name: String,
    },
    /// The request failed.
    #[error("platform request failed: {message}")]
    Request {
        /// Failure description.
        message: String,
    },
}

impl PlatformError {
    /// Builds a [`PlatformError::NotFound`].
    #[must_use]
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Platform client used when no API client is wired in: every call fails
/// with [`PlatformError::NoEndpoint`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredPlatform;

impl Platform for UnconfiguredPlatform {
    fn apps(&self, _space_guid: &str) -> Result<Vec<AppSummary>, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn app(&self, _space_guid: &str, _name: &str) -> Result<AppDetail, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn orgs(&self) -> Result<Vec<ResourceRef>, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn org(&self, _name: &str) -> Result<OrgDetail, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn spaces(&self, _org_guid: &str) -> Result<Vec<ResourceRef>, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn space(&self, _org_guid: &str, _name: &str) -> Result<SpaceDetail, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn services(&self, _space_guid: &str) -> Result<Vec<ServiceInstance>, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn service(&self, _space_guid: &str, _name: &str) -> Result<ServiceInstance, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn org_users(&self, _org_guid: &str) -> Result<Vec<UserRoles>, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }

    fn space_users(&self, _space_guid: &str) -> Result<Vec<UserRoles>, PlatformError> {
        Err(PlatformError::NoEndpoint)
    }
}
