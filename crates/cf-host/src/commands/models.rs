//! Conversion from platform records to the stable plugin models.

use cf_plugin::models::{
    AppInstance, GetAppModel, GetAppsModel, GetOrgModel, GetOrgUsersModel, GetOrgsModel,
    GetServiceModel, GetServicesModel, GetSpaceModel, GetSpaceUsersModel, GetSpacesModel,
    LastOperation as ModelOperation, NamedGuid, QuotaFields, Route, ServiceOffering,
};

use crate::platform::{
    AppDetail, AppSummary, InstanceStatus, LastOperation, OrgDetail, Quota, ResourceRef, Role,
    RouteSummary, ServiceInstance, SpaceDetail, UserRoles,
};

fn named(resource: &ResourceRef) -> NamedGuid {
    NamedGuid {
        guid: resource.guid.clone(),
        name: resource.name.clone(),
    }
}

fn named_all(resources: &[ResourceRef]) -> Vec<NamedGuid> {
    resources.iter().map(named).collect()
}

fn route(summary: &RouteSummary) -> Route {
    Route {
        guid: summary.guid.clone(),
        host: summary.host.clone(),
        domain: named(&summary.domain),
        path: summary.path.clone(),
        port: summary.port.unwrap_or_default(),
    }
}

fn instance(status: &InstanceStatus) -> AppInstance {
    AppInstance {
        state: status.state.clone(),
        details: status.details.clone(),
        since: status.since,
        cpu_usage: status.cpu_usage,
        disk_quota: status.disk_quota,
        disk_usage: status.disk_usage,
        mem_quota: status.mem_quota,
        mem_usage: status.mem_usage,
    }
}

fn quota(fields: &Quota) -> QuotaFields {
    QuotaFields {
        guid: fields.guid.clone(),
        name: fields.name.clone(),
        memory_limit: fields.memory_limit_mb,
        instance_memory_limit: fields.instance_memory_limit_mb,
        routes_limit: fields.routes_limit,
        services_limit: fields.services_limit,
        non_basic_services_allowed: fields.non_basic_services_allowed,
    }
}

fn operation(last: &LastOperation) -> ModelOperation {
    ModelOperation {
        kind: last.kind.clone(),
        state: last.state.clone(),
        description: last.description.clone(),
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|role| role.model_name().to_owned()).collect()
}

pub(super) fn app(detail: &AppDetail) -> GetAppModel {
    let summary = &detail.summary;
    GetAppModel {
        guid: summary.guid.clone(),
        name: summary.name.clone(),
        buildpack_url: detail.buildpack.clone(),
        command: detail.command.clone(),
        detected_start_command: detail.detected_start_command.clone(),
        disk_quota: summary.disk_quota_mb,
        environment_vars: detail.environment.clone(),
        instance_count: summary.instances,
        memory: summary.memory_mb,
        running_instances: summary.running_instances,
        health_check_timeout: detail.health_check_timeout,
        state: summary.state.clone(),
        space_guid: detail.space_guid.clone(),
        package_state: detail.package_state.clone(),
        staging_failed_reason: detail.staging_failed_reason.clone(),
        stack: named(&detail.stack),
        instances: detail.instances.iter().map(instance).collect(),
        routes: summary.routes.iter().map(route).collect(),
        services: named_all(&detail.services),
    }
}

pub(super) fn apps(summaries: &[AppSummary]) -> Vec<GetAppsModel> {
    summaries
        .iter()
        .map(|summary| GetAppsModel {
            guid: summary.guid.clone(),
            name: summary.name.clone(),
            state: summary.state.clone(),
            total_instances: summary.instances,
            running_instances: summary.running_instances,
            memory: summary.memory_mb,
            disk_quota: summary.disk_quota_mb,
            routes: summary.routes.iter().map(route).collect(),
        })
        .collect()
}

pub(super) fn orgs(orgs: &[ResourceRef]) -> Vec<GetOrgsModel> {
    orgs.iter()
        .map(|org| GetOrgsModel {
            guid: org.guid.clone(),
            name: org.name.clone(),
        })
        .collect()
}

pub(super) fn spaces(spaces: &[ResourceRef]) -> Vec<GetSpacesModel> {
    spaces
        .iter()
        .map(|space| GetSpacesModel {
            guid: space.guid.clone(),
            name: space.name.clone(),
        })
        .collect()
}

pub(super) fn services(instances: &[ServiceInstance]) -> Vec<GetServicesModel> {
    instances
        .iter()
        .map(|service| GetServicesModel {
            guid: service.guid.clone(),
            name: service.name.clone(),
            service_plan: named(&service.plan),
            service: named(&service.offering),
            last_operation: operation(&service.last_operation),
            application_names: service.bound_apps.clone(),
            is_user_provided: service.user_provided,
        })
        .collect()
}

pub(super) fn service(service: &ServiceInstance) -> GetServiceModel {
    GetServiceModel {
        guid: service.guid.clone(),
        name: service.name.clone(),
        dashboard_url: service.dashboard_url.clone(),
        is_user_provided: service.user_provided,
        service_offering: ServiceOffering {
            name: service.offering.name.clone(),
            documentation_url: service.documentation_url.clone(),
        },
        service_plan: named(&service.plan),
        last_operation: operation(&service.last_operation),
    }
}

pub(super) fn org(detail: &OrgDetail) -> GetOrgModel {
    GetOrgModel {
        guid: detail.org.guid.clone(),
        name: detail.org.name.clone(),
        quota_definition: quota(&detail.quota),
        spaces: named_all(&detail.spaces),
        domains: named_all(&detail.domains),
        space_quotas: detail.space_quotas.iter().map(quota).collect(),
    }
}

pub(super) fn space(detail: &SpaceDetail) -> GetSpaceModel {
    GetSpaceModel {
        guid: detail.space.guid.clone(),
        name: detail.space.name.clone(),
        organization: named(&detail.organization),
        applications: named_all(&detail.applications),
        service_instances: named_all(&detail.service_instances),
        domains: named_all(&detail.domains),
        security_groups: named_all(&detail.security_groups),
        space_quota: detail.quota.as_ref().map(quota).unwrap_or_default(),
    }
}

/// Keeps users holding at least one of `shown` and restricts their roles to
/// it.
fn users_with<T>(
    users: &[UserRoles],
    shown: &[Role],
    build: impl Fn(&UserRoles, Vec<String>) -> T,
) -> Vec<T> {
    users
        .iter()
        .filter_map(|user| {
            let roles: Vec<Role> = user
                .roles
                .iter()
                .copied()
                .filter(|role| shown.contains(role))
                .collect();
            (!roles.is_empty()).then(|| build(user, role_names(&roles)))
        })
        .collect()
}

pub(super) fn org_users(users: &[UserRoles], shown: &[Role]) -> Vec<GetOrgUsersModel> {
    users_with(users, shown, |user, roles| GetOrgUsersModel {
        guid: user.guid.clone(),
        username: user.username.clone(),
        is_admin: user.admin,
        roles,
    })
}

pub(super) fn space_users(users: &[UserRoles], shown: &[Role]) -> Vec<GetSpaceUsersModel> {
    users_with(users, shown, |user, roles| GetSpaceUsersModel {
        guid: user.guid.clone(),
        username: user.username.clone(),
        is_admin: user.admin,
        roles,
    })
}
