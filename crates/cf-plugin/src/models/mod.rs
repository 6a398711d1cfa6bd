//! Stable resource snapshots returned to plugins.
//!
//! These types form a versioned schema that is deliberately separate from the
//! host's internal display models: core commands fill them when invoked on a
//! plugin's behalf, and refactoring the table output never changes what a
//! plugin receives. Every field defaults so that newer hosts may add fields
//! without breaking older plugins.

use serde::{Deserialize, Serialize};

/// Name and GUID pair for the targeted organisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Organization {
    /// Organisation GUID.
    pub guid: String,
    /// Organisation name.
    pub name: String,
}

/// Name and GUID pair for the targeted space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Space {
    /// Space GUID.
    pub guid: String,
    /// Space name.
    pub name: String,
}

/// Generic name/GUID reference used inside larger snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NamedGuid {
    /// Resource GUID.
    pub guid: String,
    /// Resource name.
    pub name: String,
}

/// Route bound to an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Route {
    /// Route GUID.
    pub guid: String,
    /// Host component.
    pub host: String,
    /// Domain the route belongs to.
    pub domain: NamedGuid,
    /// Optional path component.
    pub path: String,
    /// Optional TCP port.
    pub port: u16,
}

/// Per-instance runtime statistics of an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppInstance {
    /// Instance state, e.g. `running`.
    pub state: String,
    /// Instance details reported by the platform.
    pub details: String,
    /// Unix timestamp of the instance start.
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

/// Full snapshot of a single application (`GetApp`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetAppModel {
    /// Application GUID.
    pub guid: String,
    /// Application name.
    pub name: String,
    /// Custom buildpack URL.
    pub buildpack_url: String,
    /// Custom start command.
    pub command: String,
    /// Start command detected during staging.
    pub detected_start_command: String,
    /// Disk quota in megabytes.
    pub disk_quota: u64,
    /// User-provided environment variables.
    pub environment_vars: std::collections::BTreeMap<String, String>,
    /// Desired instance count.
    pub instance_count: u32,
    /// Memory limit in megabytes.
    pub memory: u64,
    /// Number of running instances.
    pub running_instances: u32,
    /// Health check timeout in seconds.
    pub health_check_timeout: u32,
    /// Desired state, e.g. `started`.
    pub state: String,
    /// GUID of the owning space.
    pub space_guid: String,
    /// Package state, e.g. `STAGED`.
    pub package_state: String,
    /// Reason staging failed, when it did.
    pub staging_failed_reason: String,
    /// Stack the application runs on.
    pub stack: NamedGuid,
    /// Per-instance statistics.
    pub instances: Vec<AppInstance>,
    /// Bound routes.
    pub routes: Vec<Route>,
    /// Bound service instances.
    pub services: Vec<NamedGuid>,
}

/// Summary row of `GetApps`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetAppsModel {
    /// Application GUID.
    pub guid: String,
    /// Application name.
    pub name: String,
    /// Desired state.
    pub state: String,
    /// Desired instance count.
    pub total_instances: u32,
    /// Number of running instances.
    pub running_instances: u32,
    /// Memory limit in megabytes.
    pub memory: u64,
    /// Disk quota in megabytes.
    pub disk_quota: u64,
    /// Bound routes.
    pub routes: Vec<Route>,
}

/// Row of `GetOrgs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetOrgsModel {
    /// Organisation GUID.
    pub guid: String,
    /// Organisation name.
    pub name: String,
}

/// Row of `GetSpaces`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetSpacesModel {
    /// Space GUID.
    pub guid: String,
    /// Space name.
    pub name: String,
}

/// Last asynchronous operation performed on a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LastOperation {
    /// Operation type, e.g. `create`.
    #[serde(rename = "Type")]
    pub kind: String,
    /// Operation state, e.g. `succeeded`.
    pub state: String,
    /// Human-readable description.
    pub description: String,
}

/// Row of `GetServices`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetServicesModel {
    /// Service instance GUID.
    pub guid: String,
    /// Service instance name.
    pub name: String,
    /// Selected plan.
    pub service_plan: NamedGuid,
    /// Service offering.
    pub service: NamedGuid,
    /// Last operation state.
    pub last_operation: LastOperation,
    /// Names of bound applications.
    pub application_names: Vec<String>,
    /// Whether the instance is user-provided.
    pub is_user_provided: bool,
}

/// Row of `GetOrgUsers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetOrgUsersModel {
    /// User GUID.
    pub guid: String,
    /// Username.
    pub username: String,
    /// Whether the user is a platform administrator.
    pub is_admin: bool,
    /// Organisation roles held by the user.
    pub roles: Vec<String>,
}

/// Row of `GetSpaceUsers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetSpaceUsersModel {
    /// User GUID.
    pub guid: String,
    /// Username.
    pub username: String,
    /// Whether the user is a platform administrator.
    pub is_admin: bool,
    /// Space roles held by the user.
    pub roles: Vec<String>,
}

/// Quota limits attached to an organisation or space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct QuotaFields {
    /// Quota GUID.
    pub guid: String,
    /// Quota name.
    pub name: String,
    /// Memory limit in megabytes.
    pub memory_limit: u64,
    /// Per-instance memory limit in megabytes.
    pub instance_memory_limit: i64,
    /// Route limit.
    pub routes_limit: i64,
    /// Service instance limit.
    pub services_limit: i64,
    /// Whether paid service plans are allowed.
    pub non_basic_services_allowed: bool,
}

/// Detailed snapshot of one organisation (`GetOrg`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetOrgModel {
    /// Organisation GUID.
    pub guid: String,
    /// Organisation name.
    pub name: String,
    /// Assigned quota.
    pub quota_definition: QuotaFields,
    /// Spaces within the organisation.
    pub spaces: Vec<NamedGuid>,
    /// Domains visible to the organisation.
    pub domains: Vec<NamedGuid>,
    /// Space quotas defined by the organisation.
    pub space_quotas: Vec<QuotaFields>,
}

/// Detailed snapshot of one space (`GetSpace`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetSpaceModel {
    /// Space GUID.
    pub guid: String,
    /// Space name.
    pub name: String,
    /// Owning organisation.
    pub organization: NamedGuid,
    /// Applications in the space.
    pub applications: Vec<NamedGuid>,
    /// Service instances in the space.
    pub service_instances: Vec<NamedGuid>,
    /// Domains visible to the space.
    pub domains: Vec<NamedGuid>,
    /// Security groups applied to the space.
    pub security_groups: Vec<NamedGuid>,
    /// Assigned space quota.
    pub space_quota: QuotaFields,
}

/// Detailed snapshot of one service instance (`GetService`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetServiceModel {
    /// Service instance GUID.
    pub guid: String,
    /// Service instance name.
    pub name: String,
    /// Dashboard URL exposed by the broker.
    pub dashboard_url: String,
    /// Whether the instance is user-provided.
    pub is_user_provided: bool,
    /// Service offering name and documentation link.
    pub service_offering: ServiceOffering,
    /// Selected plan.
    pub service_plan: NamedGuid,
    /// Last operation state.
    pub last_operation: LastOperation,
}

/// Offering backing a service instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceOffering {
    /// Offering name.
    pub name: String,
    /// Documentation URL.
    pub documentation_url: String,
}
