//! Resource records as the host's platform client reports them.
//!
//! These are the display-side shapes core commands render as tables. They
//! are free to change; plugins receive the stable models from
//! `cf_plugin::models` instead.

use std::collections::BTreeMap;
use std::fmt;

/// Name and GUID of a related resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRef {
    /// Resource GUID.
    pub guid: String,
    /// Resource name.
    pub name: String,
}

impl ResourceRef {
    /// Creates a reference.
    #[must_use]
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
        }
    }
}

/// A route mapped to an application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSummary {
    /// Route GUID.
    pub guid: String,
    /// Host name, empty for apex routes.
    pub host: String,
    /// Owning domain.
    pub domain: ResourceRef,
    /// Optional path suffix.
    pub path: String,
    /// TCP port for TCP routes.
    pub port: Option<u16>,
}

impl RouteSummary {
    /// Renders the route as `host.domain[:port][/path]`.
    #[must_use]
    pub fn url(&self) -> String {
        let mut url = if self.host.is_empty() {
            self.domain.name.clone()
        } else {
            format!("{}.{}", self.host, self.domain.name)
        };
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        url.push_str(&self.path);
        url
    }
}

/// Row of the `apps` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSummary {
    /// Application GUID.
    pub guid: String,
    /// Application name.
    pub name: String,
    /// Requested state (`STARTED`, `STOPPED`).
    pub state: String,
    /// Desired instance count.
    pub instances: u32,
    /// Instances currently running.
    pub running_instances: u32,
    /// Memory per instance in MiB.
    pub memory_mb: u64,
    /// Disk quota per instance in MiB.
    pub disk_quota_mb: u64,
    /// Mapped routes.
    pub routes: Vec<RouteSummary>,
}

/// Runtime statistics for one application instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceStatus {
    /// Instance state.
    pub state: String,
    /// Extra state details.
    pub details: String,
    /// Start time in seconds since the Unix epoch.
    pub since: i64,
    /// CPU usage fraction.
    pub cpu_usage: f64,
    /// Disk quota in bytes.
    pub disk_quota: u64,
    /// Disk usage in bytes.
    pub disk_usage: u64,
    /// Memory quota in bytes.
    pub mem_quota: u64,
    /// Memory usage in bytes.
    pub mem_usage: u64,
}

/// Everything `app NAME` shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppDetail {
    /// Listing fields.
    pub summary: AppSummary,
    /// Owning space GUID.
    pub space_guid: String,
    /// Buildpack URL or name.
    pub buildpack: String,
    /// Custom start command.
    pub command: String,
    /// Start command detected during staging.
    pub detected_start_command: String,
    /// User-provided environment.
    pub environment: BTreeMap<String, String>,
    /// Health check timeout in seconds.
    pub health_check_timeout: u32,
    /// Package state (`STAGED`, `PENDING`, `FAILED`).
    pub package_state: String,
    /// Reason staging failed, if it did.
    pub staging_failed_reason: String,
    /// Stack the app runs on.
    pub stack: ResourceRef,
    /// Per-instance statistics.
    pub instances: Vec<InstanceStatus>,
    /// Bound service instances.
    pub services: Vec<ResourceRef>,
}

/// Quota definition for an organisation or space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quota {
    /// Quota GUID.
    pub guid: String,
    /// Quota name.
    pub name: String,
    /// Total memory limit in MiB.
    pub memory_limit_mb: u64,
    /// Per-instance memory limit in MiB; `-1` means unlimited.
    pub instance_memory_limit_mb: i64,
    /// Route limit; `-1` means unlimited.
    pub routes_limit: i64,
    /// Service instance limit; `-1` means unlimited.
    pub services_limit: i64,
    /// Whether paid service plans are allowed.
    pub non_basic_services_allowed: bool,
}

/// Everything `org NAME` shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgDetail {
    /// The organisation itself.
    pub org: ResourceRef,
    /// Organisation quota.
    pub quota: Quota,
    /// Spaces in the organisation.
    pub spaces: Vec<ResourceRef>,
    /// Private and shared domains.
    pub domains: Vec<ResourceRef>,
    /// Space quota definitions.
    pub space_quotas: Vec<Quota>,
}

/// Everything `space NAME` shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceDetail {
    /// The space itself.
    pub space: ResourceRef,
    /// Owning organisation.
    pub organization: ResourceRef,
    /// Applications in the space.
    pub applications: Vec<ResourceRef>,
    /// Service instances in the space.
    pub service_instances: Vec<ResourceRef>,
    /// Domains usable from the space.
    pub domains: Vec<ResourceRef>,
    /// Security groups bound to the space.
    pub security_groups: Vec<ResourceRef>,
    /// Space quota, if assigned.
    pub quota: Option<Quota>,
}

/// Most recent operation on a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastOperation {
    /// Operation kind (`create`, `update`, `delete`).
    pub kind: String,
    /// Operation state (`succeeded`, `in progress`, `failed`).
    pub state: String,
    /// Broker-supplied description.
    pub description: String,
}

/// A service instance as `services` and `service NAME` show it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceInstance {
    /// Instance GUID.
    pub guid: String,
    /// Instance name.
    pub name: String,
    /// Service plan.
    pub plan: ResourceRef,
    /// Service offering.
    pub offering: ResourceRef,
    /// Offering documentation URL.
    pub documentation_url: String,
    /// Broker dashboard URL.
    pub dashboard_url: String,
    /// Whether the instance is user-provided.
    pub user_provided: bool,
    /// Last broker operation.
    pub last_operation: LastOperation,
    /// Names of bound applications.
    pub bound_apps: Vec<String>,
}

/// Role a user holds in an organisation or space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    /// Organisation manager.
    OrgManager,
    /// Billing manager.
    BillingManager,
    /// Organisation auditor.
    OrgAuditor,
    /// Organisation member.
    OrgUser,
    /// Space manager.
    SpaceManager,
    /// Space developer.
    SpaceDeveloper,
    /// Space auditor.
    SpaceAuditor,
}

impl Role {
    /// Wire name used in plugin models.
    #[must_use]
    pub const fn model_name(self) -> &'static str {
        match self {
            Self::OrgManager => "RoleOrgManager",
            Self::BillingManager => "RoleBillingManager",
            Self::OrgAuditor => "RoleOrgAuditor",
            Self::OrgUser => "RoleOrgUser",
            Self::SpaceManager => "RoleSpaceManager",
            Self::SpaceDeveloper => "RoleSpaceDeveloper",
            Self::SpaceAuditor => "RoleSpaceAuditor",
        }
    }

    /// Heading used in user listings.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::OrgManager => "ORG MANAGER",
            Self::BillingManager => "BILLING MANAGER",
            Self::OrgAuditor => "ORG AUDITOR",
            Self::OrgUser => "USERS",
            Self::SpaceManager => "SPACE MANAGER",
            Self::SpaceDeveloper => "SPACE DEVELOPER",
            Self::SpaceAuditor => "SPACE AUDITOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

/// A user and the roles they hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRoles {
    /// User GUID.
    pub guid: String,
    /// Login name.
    pub username: String,
    /// Whether the user is a platform administrator.
    pub admin: bool,
    /// Roles held in the queried organisation or space.
    pub roles: Vec<Role>,
}
