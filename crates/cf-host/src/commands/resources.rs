//! Commands that display platform resources.
//!
//! Each command prints a table for the user. When a plugin requests a
//! resource snapshot the same command runs with a model-capturing context
//! and delivers the stable plugin model instead.

use clap::Parser;

use super::{CommandFault, CommandMetadata, CoreCommand, Table, models, parse_args};
use crate::context::{CommandContext, PluginModel};
use crate::platform::{AppSummary, Quota, ResourceRef, Role, UserRoles};
use crate::session::HostSession;

const MEBIBYTE: u64 = 1024 * 1024;

fn memory(megabytes: u64) -> String {
    match (megabytes.checked_rem(1024), megabytes.checked_div(1024)) {
        (Some(0), Some(gigabytes)) if gigabytes > 0 => format!("{gigabytes}G"),
        _ => format!("{megabytes}M"),
    }
}

fn bytes(amount: u64) -> String {
    memory(amount.checked_div(MEBIBYTE).unwrap_or_default())
}

fn limit(value: i64) -> String {
    if value < 0 {
        "unlimited".to_owned()
    } else {
        value.to_string()
    }
}

fn names(resources: &[ResourceRef]) -> String {
    resources
        .iter()
        .map(|resource| resource.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn urls(app: &AppSummary) -> String {
    app.routes
        .iter()
        .map(|route| route.url())
        .collect::<Vec<_>>()
        .join(", ")
}

fn quota_line(quota: &Quota) -> String {
    format!(
        "{} ({} memory limit, {} instance memory limit, {} routes, {} services, paid services {})",
        quota.name,
        memory(quota.memory_limit_mb),
        u64::try_from(quota.instance_memory_limit_mb).map_or_else(|_| limit(-1), memory),
        limit(quota.routes_limit),
        limit(quota.services_limit),
        if quota.non_basic_services_allowed {
            "allowed"
        } else {
            "disallowed"
        },
    )
}

fn in_space(session: &HostSession) -> String {
    format!(
        "in org {} / space {} as {}...",
        session.organization_fields.name,
        session.space_fields.name,
        session.username()
    )
}

fn key_values(ctx: &CommandContext, pairs: &[(&str, String)]) -> Result<(), CommandFault> {
    let mut table = Table::new(&[]);
    for (key, value) in pairs {
        table.push_row(vec![format!("{key}:"), value.clone()]);
    }
    ctx.say_all(table.lines().into_iter().skip(1))
}

fn user_listing(
    ctx: &CommandContext,
    users: &[UserRoles],
    shown: &[Role],
) -> Result<(), CommandFault> {
    for role in shown {
        ctx.say("")?;
        ctx.say(role.heading())?;
        let holders: Vec<&str> = users
            .iter()
            .filter(|user| user.roles.contains(role))
            .map(|user| user.username.as_str())
            .collect();
        if holders.is_empty() {
            ctx.say("  No users found")?;
        }
        for holder in holders {
            ctx.say(format!("  {holder}"))?;
        }
    }
    Ok(())
}

/// Arguments shared by the single-resource commands.
#[derive(Debug, Parser)]
struct NamedArgs {
    /// Resource name.
    name: String,
    /// Print only the GUID.
    #[arg(long)]
    guid: bool,
}

/// Arguments for listing commands.
#[derive(Debug, Parser)]
struct NoArgs {}

const APP: CommandMetadata = CommandMetadata {
    name: "app",
    alias: None,
    description: "Display health and status for an app",
    usage: "cf app APP_NAME [--guid]",
};

pub(super) struct AppCommand;

impl CoreCommand for AppCommand {
    fn metadata(&self) -> CommandMetadata {
        APP
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<NamedArgs>(ctx, APP.name, args)? else {
            return Ok(());
        };
        let session = ctx.require_space()?;
        let detail = ctx.platform().app(&session.space_fields.guid, &parsed.name)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::App(Box::new(models::app(&detail))));
            return Ok(());
        }
        if parsed.guid {
            return ctx.say(&detail.summary.guid);
        }
        let summary = &detail.summary;
        ctx.say(format!(
            "Showing health and status for app {} {}",
            summary.name,
            in_space(&session)
        ))?;
        ctx.ok()?;
        key_values(
            ctx,
            &[
                ("name", summary.name.clone()),
                ("requested state", summary.state.to_lowercase()),
                (
                    "instances",
                    format!("{}/{}", summary.running_instances, summary.instances),
                ),
                (
                    "usage",
                    format!("{} x {} instances", memory(summary.memory_mb), summary.instances),
                ),
                ("routes", urls(summary)),
                ("stack", detail.stack.name.clone()),
                ("buildpack", detail.buildpack.clone()),
            ],
        )?;
        if detail.instances.is_empty() {
            return Ok(());
        }
        ctx.say("")?;
        let mut table = Table::new(&["", "state", "since", "memory", "disk", "details"]);
        for (index, instance) in detail.instances.iter().enumerate() {
            table.push_row(vec![
                format!("#{index}"),
                instance.state.to_lowercase(),
                instance.since.to_string(),
                format!("{} of {}", bytes(instance.mem_usage), bytes(instance.mem_quota)),
                format!("{} of {}", bytes(instance.disk_usage), bytes(instance.disk_quota)),
                instance.details.clone(),
            ]);
        }
        ctx.say_all(table.lines())
    }
}

const APPS: CommandMetadata = CommandMetadata {
    name: "apps",
    alias: Some("a"),
    description: "List all apps in the target space",
    usage: "cf apps",
};

pub(super) struct AppsCommand;

impl CoreCommand for AppsCommand {
    fn metadata(&self) -> CommandMetadata {
        APPS
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        if parse_args::<NoArgs>(ctx, APPS.name, args)?.is_none() {
            return Ok(());
        }
        let session = ctx.require_space()?;
        let apps = ctx.platform().apps(&session.space_fields.guid)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::Apps(models::apps(&apps)));
            return Ok(());
        }
        ctx.say(format!("Getting apps {}", in_space(&session)))?;
        ctx.ok()?;
        if apps.is_empty() {
            return ctx.say("No apps found");
        }
        let mut table = Table::new(&["name", "requested state", "instances", "memory", "disk", "urls"]);
        for app in &apps {
            table.push_row(vec![
                app.name.clone(),
                app.state.to_lowercase(),
                format!("{}/{}", app.running_instances, app.instances),
                memory(app.memory_mb),
                memory(app.disk_quota_mb),
                urls(app),
            ]);
        }
        ctx.say_all(table.lines())
    }
}

const ORGS: CommandMetadata = CommandMetadata {
    name: "orgs",
    alias: Some("o"),
    description: "List all orgs",
    usage: "cf orgs",
};

pub(super) struct OrgsCommand;

impl CoreCommand for OrgsCommand {
    fn metadata(&self) -> CommandMetadata {
        ORGS
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        if parse_args::<NoArgs>(ctx, ORGS.name, args)?.is_none() {
            return Ok(());
        }
        let session = ctx.require_login()?;
        let orgs = ctx.platform().orgs()?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::Orgs(models::orgs(&orgs)));
            return Ok(());
        }
        ctx.say(format!("Getting orgs as {}...", session.username()))?;
        ctx.ok()?;
        if orgs.is_empty() {
            return ctx.say("No orgs found");
        }
        ctx.say("name")?;
        ctx.say_all(orgs.iter().map(|org| org.name.as_str()))
    }
}

const ORG: CommandMetadata = CommandMetadata {
    name: "org",
    alias: None,
    description: "Show org info",
    usage: "cf org ORG [--guid]",
};

pub(super) struct OrgCommand;

impl CoreCommand for OrgCommand {
    fn metadata(&self) -> CommandMetadata {
        ORG
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<NamedArgs>(ctx, ORG.name, args)? else {
            return Ok(());
        };
        let session = ctx.require_login()?;
        let detail = ctx.platform().org(&parsed.name)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::Org(Box::new(models::org(&detail))));
            return Ok(());
        }
        if parsed.guid {
            return ctx.say(&detail.org.guid);
        }
        ctx.say(format!(
            "Getting info for org {} as {}...",
            detail.org.name,
            session.username()
        ))?;
        ctx.ok()?;
        key_values(
            ctx,
            &[
                ("name", detail.org.name.clone()),
                ("domains", names(&detail.domains)),
                ("quota", quota_line(&detail.quota)),
                ("spaces", names(&detail.spaces)),
                (
                    "space quotas",
                    detail
                        .space_quotas
                        .iter()
                        .map(|quota| quota.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            ],
        )
    }
}

const SPACES: CommandMetadata = CommandMetadata {
    name: "spaces",
    alias: None,
    description: "List all spaces in an org",
    usage: "cf spaces",
};

pub(super) struct SpacesCommand;

impl CoreCommand for SpacesCommand {
    fn metadata(&self) -> CommandMetadata {
        SPACES
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        if parse_args::<NoArgs>(ctx, SPACES.name, args)?.is_none() {
            return Ok(());
        }
        let session = ctx.require_org()?;
        let spaces = ctx.platform().spaces(&session.organization_fields.guid)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::Spaces(models::spaces(&spaces)));
            return Ok(());
        }
        ctx.say(format!(
            "Getting spaces in org {} as {}...",
            session.organization_fields.name,
            session.username()
        ))?;
        ctx.ok()?;
        if spaces.is_empty() {
            return ctx.say("No spaces found");
        }
        ctx.say("name")?;
        ctx.say_all(spaces.iter().map(|space| space.name.as_str()))
    }
}

const SPACE: CommandMetadata = CommandMetadata {
    name: "space",
    alias: None,
    description: "Show space info",
    usage: "cf space SPACE [--guid]",
};

pub(super) struct SpaceCommand;

impl CoreCommand for SpaceCommand {
    fn metadata(&self) -> CommandMetadata {
        SPACE
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<NamedArgs>(ctx, SPACE.name, args)? else {
            return Ok(());
        };
        let session = ctx.require_org()?;
        let detail = ctx
            .platform()
            .space(&session.organization_fields.guid, &parsed.name)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::Space(Box::new(models::space(&detail))));
            return Ok(());
        }
        if parsed.guid {
            return ctx.say(&detail.space.guid);
        }
        ctx.say(format!(
            "Getting info for space {} in org {} as {}...",
            detail.space.name,
            detail.organization.name,
            session.username()
        ))?;
        ctx.ok()?;
        key_values(
            ctx,
            &[
                ("name", detail.space.name.clone()),
                ("org", detail.organization.name.clone()),
                ("apps", names(&detail.applications)),
                ("services", names(&detail.service_instances)),
                ("domains", names(&detail.domains)),
                ("security groups", names(&detail.security_groups)),
                (
                    "space quota",
                    detail.quota.as_ref().map(quota_line).unwrap_or_default(),
                ),
            ],
        )
    }
}

const SERVICES: CommandMetadata = CommandMetadata {
    name: "services",
    alias: Some("s"),
    description: "List all service instances in the target space",
    usage: "cf services",
};

pub(super) struct ServicesCommand;

impl CoreCommand for ServicesCommand {
    fn metadata(&self) -> CommandMetadata {
        SERVICES
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        if parse_args::<NoArgs>(ctx, SERVICES.name, args)?.is_none() {
            return Ok(());
        }
        let session = ctx.require_space()?;
        let services = ctx.platform().services(&session.space_fields.guid)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::Services(models::services(&services)));
            return Ok(());
        }
        ctx.say(format!("Getting services {}", in_space(&session)))?;
        ctx.ok()?;
        if services.is_empty() {
            return ctx.say("No services found");
        }
        let mut table = Table::new(&["name", "service", "plan", "bound apps", "last operation"]);
        for service in &services {
            let offering = if service.user_provided {
                "user-provided".to_owned()
            } else {
                service.offering.name.clone()
            };
            table.push_row(vec![
                service.name.clone(),
                offering,
                service.plan.name.clone(),
                service.bound_apps.join(", "),
                format!(
                    "{} {}",
                    service.last_operation.kind, service.last_operation.state
                )
                .trim()
                .to_owned(),
            ]);
        }
        ctx.say_all(table.lines())
    }
}

const SERVICE: CommandMetadata = CommandMetadata {
    name: "service",
    alias: None,
    description: "Show service instance info",
    usage: "cf service SERVICE_INSTANCE [--guid]",
};

pub(super) struct ServiceCommand;

impl CoreCommand for ServiceCommand {
    fn metadata(&self) -> CommandMetadata {
        SERVICE
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<NamedArgs>(ctx, SERVICE.name, args)? else {
            return Ok(());
        };
        let session = ctx.require_space()?;
        let service = ctx
            .platform()
            .service(&session.space_fields.guid, &parsed.name)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::Service(Box::new(models::service(&service))));
            return Ok(());
        }
        if parsed.guid {
            return ctx.say(&service.guid);
        }
        ctx.say(format!(
            "Showing info of service {} {}",
            service.name,
            in_space(&session)
        ))?;
        ctx.say("")?;
        key_values(
            ctx,
            &[
                ("name", service.name.clone()),
                ("service", service.offering.name.clone()),
                ("plan", service.plan.name.clone()),
                ("documentation", service.documentation_url.clone()),
                ("dashboard", service.dashboard_url.clone()),
                ("bound apps", service.bound_apps.join(", ")),
                (
                    "last operation",
                    format!(
                        "{} {}",
                        service.last_operation.kind, service.last_operation.state
                    ),
                ),
            ],
        )
    }
}

/// Arguments for `org-users`.
#[derive(Debug, Parser)]
struct OrgUsersArgs {
    /// Organisation name.
    org: String,
    /// List all users in the org.
    #[arg(short = 'a', long = "all-users")]
    all: bool,
}

const ORG_USERS: CommandMetadata = CommandMetadata {
    name: "org-users",
    alias: None,
    description: "Show org users by role",
    usage: "cf org-users ORG [-a]",
};

const ORG_MANAGEMENT_ROLES: &[Role] = &[Role::OrgManager, Role::BillingManager, Role::OrgAuditor];
const ORG_MEMBER_ROLES: &[Role] = &[Role::OrgUser];

pub(super) struct OrgUsersCommand;

impl CoreCommand for OrgUsersCommand {
    fn metadata(&self) -> CommandMetadata {
        ORG_USERS
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<OrgUsersArgs>(ctx, ORG_USERS.name, args)? else {
            return Ok(());
        };
        let session = ctx.require_login()?;
        let detail = ctx.platform().org(&parsed.org)?;
        let users = ctx.platform().org_users(&detail.org.guid)?;
        let shown = if parsed.all {
            ORG_MEMBER_ROLES
        } else {
            ORG_MANAGEMENT_ROLES
        };
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::OrgUsers(models::org_users(&users, shown)));
            return Ok(());
        }
        ctx.say(format!(
            "Getting users in org {} as {}...",
            detail.org.name,
            session.username()
        ))?;
        user_listing(ctx, &users, shown)
    }
}

/// Arguments for `space-users`.
#[derive(Debug, Parser)]
struct SpaceUsersArgs {
    /// Organisation name.
    org: String,
    /// Space name.
    space: String,
}

const SPACE_USERS: CommandMetadata = CommandMetadata {
    name: "space-users",
    alias: None,
    description: "Show space users by role",
    usage: "cf space-users ORG SPACE",
};

const SPACE_ROLES: &[Role] = &[Role::SpaceManager, Role::SpaceDeveloper, Role::SpaceAuditor];

pub(super) struct SpaceUsersCommand;

impl CoreCommand for SpaceUsersCommand {
    fn metadata(&self) -> CommandMetadata {
        SPACE_USERS
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<SpaceUsersArgs>(ctx, SPACE_USERS.name, args)? else {
            return Ok(());
        };
        let session = ctx.require_login()?;
        let org = ctx.platform().org(&parsed.org)?;
        let space = ctx.platform().space(&org.org.guid, &parsed.space)?;
        let users = ctx.platform().space_users(&space.space.guid)?;
        if ctx.plugin_model_requested() {
            ctx.deliver(PluginModel::SpaceUsers(models::space_users(&users, SPACE_ROLES)));
            return Ok(());
        }
        ctx.say(format!(
            "Getting users in org {} / space {} as {}...",
            org.org.name,
            space.space.name,
            session.username()
        ))?;
        user_listing(ctx, &users, SPACE_ROLES)
    }
}
