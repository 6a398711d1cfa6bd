//! Behaviour of the built-in commands as the user sees it.

use std::sync::Arc;

use cf_plugin::{PluginCommand, PluginMetadata, VersionType};
use rstest::rstest;

use super::*;
use crate::context::HostContext;
use crate::platform::{AppSummary, OrgDetail, ResourceRef, RouteSummary, SpaceDetail};
use crate::registry::{PluginConfig, PluginEntry};
use crate::session::{HostSession, SessionHandle, TargetFields};
use crate::test_support::{MockPlatformApi, TestHost, strings, targeted_session, test_host, with_platform};

fn run(host: &Arc<HostContext>, args: &[&str]) -> Result<Vec<String>, CommandFault> {
    let (name, rest) = args.split_first().expect("command name");
    let command = host.commands().find(name).expect("registered command");
    let mut ctx = CommandContext::new(Arc::clone(host));
    command.execute(&mut ctx, &strings(rest))?;
    Ok(host.sink().drain_lines())
}

fn sample_app() -> AppSummary {
    AppSummary {
        guid: "app-1".to_owned(),
        name: "web".to_owned(),
        state: "STARTED".to_owned(),
        instances: 2,
        running_instances: 1,
        memory_mb: 1024,
        disk_quota_mb: 512,
        routes: vec![RouteSummary {
            host: "web".to_owned(),
            domain: ResourceRef::new("domain-1", "example.com"),
            ..RouteSummary::default()
        }],
    }
}

#[test]
fn apps_prints_a_table_for_the_targeted_space() {
    let mut platform = MockPlatformApi::new();
    platform
        .expect_apps()
        .withf(|space| space == "space-1")
        .returning(|_| Ok(vec![sample_app()]));
    let test = with_platform(platform);

    let lines = run(&test.host, &["apps"]).expect("apps");
    assert_eq!(
        lines.first().map(String::as_str),
        Some("Getting apps in org acme / space dev as alice...")
    );
    assert!(lines.iter().any(|line| line == "OK"));
    let row = lines.last().expect("row");
    for cell in ["web", "started", "1/2", "1G", "512M", "web.example.com"] {
        assert!(row.contains(cell), "{row}");
    }
    assert!(test.terminal.text().contains("web.example.com"));
}

#[test]
fn empty_spaces_say_so() {
    let mut platform = MockPlatformApi::new();
    platform.expect_apps().returning(|_| Ok(Vec::new()));
    let test = with_platform(platform);
    let lines = run(&test.host, &["a"]).expect("alias runs apps");
    assert_eq!(lines.last().map(String::as_str), Some("No apps found"));
}

#[rstest]
#[case::logged_out(HostSession::default(), "Not logged in")]
#[case::no_space(HostSession { space_fields: TargetFields::default(), ..targeted_session() }, "No space targeted")]
fn resource_commands_require_a_target(#[case] session: HostSession, #[case] message: &str) {
    let test = test_host(|builder| builder.session(SessionHandle::in_memory(session)));
    let fault = run(&test.host, &["apps"]).expect_err("requires target");
    assert!(fault.to_string().starts_with(message), "{fault}");
}

#[test]
fn target_org_switches_org_and_clears_space() {
    let mut platform = MockPlatformApi::new();
    platform
        .expect_org()
        .withf(|name| name == "beta")
        .returning(|_| {
            Ok(OrgDetail {
                org: ResourceRef::new("org-2", "beta"),
                ..OrgDetail::default()
            })
        });
    let test = with_platform(platform);

    let lines = run(&test.host, &["target", "-o", "beta"]).expect("target");
    let session = test.host.session().snapshot();
    assert_eq!(session.organization_fields, TargetFields::new("org-2", "beta"));
    assert!(!session.has_space());
    assert!(lines.iter().any(|line| line == "org:            beta"));
    assert!(lines.iter().any(|line| line.starts_with("No space targeted")));
}

#[test]
fn target_space_needs_an_org() {
    let session = HostSession {
        organization_fields: TargetFields::default(),
        space_fields: TargetFields::default(),
        ..targeted_session()
    };
    let test = test_host(|builder| builder.session(SessionHandle::in_memory(session)));
    let fault = run(&test.host, &["target", "-s", "dev"]).expect_err("no org");
    assert!(matches!(fault, CommandFault::NoOrgTargeted));
}

#[test]
fn target_space_resolves_within_the_org() {
    let mut platform = MockPlatformApi::new();
    platform
        .expect_space()
        .withf(|org, name| org == "org-1" && name == "prod")
        .returning(|_, _| {
            Ok(SpaceDetail {
                space: ResourceRef::new("space-9", "prod"),
                ..SpaceDetail::default()
            })
        });
    let test = with_platform(platform);
    run(&test.host, &["t", "-s", "prod"]).expect("target");
    assert_eq!(
        test.host.session().snapshot().space_fields,
        TargetFields::new("space-9", "prod")
    );
}

fn with_plugin(test: &TestHost) {
    let metadata = PluginMetadata::new("diagnose", VersionType::new(1, 4, 0)).with_command(
        PluginCommand::new("diag", "run diagnostics")
            .with_alias("d")
            .with_usage("cf diag [--verbose]")
            .with_option("verbose", "print everything"),
    );
    let mut config = PluginConfig::default();
    config.insert("diagnose", PluginEntry::new("/plugins/diagnose", &metadata));
    test.host.store().save(&config).expect("save registry");
}

#[test]
fn help_lists_builtins_then_plugin_commands() {
    let test = test_host(|builder| builder);
    with_plugin(&test);
    let lines = run(&test.host, &["help"]).expect("help");
    let commands = lines.iter().position(|line| line == "COMMANDS:").expect("builtins");
    let plugins = lines
        .iter()
        .position(|line| line == "INSTALLED PLUGIN COMMANDS:")
        .expect("plugins");
    assert!(commands < plugins);
    assert!(lines.iter().any(|line| line.trim_start().starts_with("apps")));
    assert!(lines.last().expect("last").contains("run diagnostics"));
}

#[test]
fn help_describes_plugin_commands_by_alias() {
    let test = test_host(|builder| builder);
    with_plugin(&test);
    let lines = run(&test.host, &["help", "d"]).expect("help");
    assert_eq!(lines.get(1).map(String::as_str), Some("   diag - run diagnostics"));
    assert!(lines.iter().any(|line| line == "   cf diag [--verbose]"));
    assert!(lines.iter().any(|line| line.contains("-verbose") && line.contains("print everything")));
}

#[test]
fn help_for_unknown_commands_fails() {
    let test = test_host(|builder| builder);
    let fault = run(&test.host, &["help", "nope"]).expect_err("unknown");
    assert_eq!(fault.to_string(), "'nope' is not a registered command. See 'cf help'");
}

#[test]
fn plugins_lists_registry_entries() {
    let test = test_host(|builder| builder);
    with_plugin(&test);
    let lines = run(&test.host, &["plugins"]).expect("plugins");
    assert_eq!(lines.first().map(String::as_str), Some("Listing installed plugins..."));
    let row = lines.last().expect("row");
    for cell in ["diagnose", "1.4.0", "diag, d", "run diagnostics"] {
        assert!(row.contains(cell), "{row}");
    }
}

#[test]
fn version_prints_the_cli_version() {
    let test = test_host(|builder| builder);
    assert_eq!(run(&test.host, &["-v"]).expect("version"), vec!["cf version 6.53.0"]);
}

#[test]
fn help_flags_render_usage_without_failing() {
    let test = test_host(|builder| builder);
    let lines = run(&test.host, &["target", "--help"]).expect("help flag");
    assert!(lines.iter().any(|line| line.starts_with("Usage: target")));
}

#[test]
fn unexpected_arguments_are_usage_faults() {
    let test = test_host(|builder| builder);
    let fault = run(&test.host, &["apps", "--bogus"]).expect_err("usage");
    assert!(matches!(fault, CommandFault::Usage { ref command, .. } if command == "apps"));
}

struct Quiet;

impl CoreCommand for Quiet {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "apps",
            alias: Some("q"),
            description: "replacement",
            usage: "cf apps",
        }
    }

    fn execute(&self, ctx: &mut CommandContext, _args: &[String]) -> Result<(), CommandFault> {
        ctx.say("quiet")
    }
}

#[test]
fn registering_a_command_shadows_the_builtin() {
    let registry = CommandRegistry::builtin().with(Arc::new(Quiet));
    let count = registry.metadata().filter(|command| command.name == "apps").count();
    assert_eq!(count, 1);
    assert!(registry.exists("q"));
    assert!(!registry.exists("a"));
}
