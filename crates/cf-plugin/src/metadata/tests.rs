//! Unit tests for plugin descriptor types.

use rstest::rstest;

use super::*;

fn diagnose() -> PluginMetadata {
    PluginMetadata::new("diagnose", VersionType::new(1, 2, 3))
        .with_command(PluginCommand::new("diag", "run diagnostics").with_alias("d"))
        .with_command(PluginCommand::new("diag-report", "print the last report"))
}

#[rstest]
#[case::name("diag", Some("diag"))]
#[case::alias("d", Some("diag"))]
#[case::second_command("diag-report", Some("diag-report"))]
#[case::unknown("report", None)]
#[case::empty("", None)]
fn command_for_resolves_names_and_aliases(#[case] token: &str, #[case] expected: Option<&str>) {
    let metadata = diagnose();
    assert_eq!(metadata.command_for(token).map(PluginCommand::name), expected);
}

#[test]
fn blank_alias_is_treated_as_absent() {
    let command = PluginCommand::new("diag", "").with_alias("   ");
    assert_eq!(command.alias(), None);
    assert!(!command.answers_to("   "));
}

#[test]
fn versions_order_numerically() {
    assert!(VersionType::new(1, 9, 0) < VersionType::new(1, 10, 0));
    assert!(VersionType::new(2, 0, 0) > VersionType::new(1, 99, 99));
}

#[test]
fn parses_registry_shaped_json() {
    let json = r#"{
        "Name": "Diego-Enabler",
        "Version": {"Major": 1, "Minor": 0, "Build": 1},
        "Commands": [
            {
                "Name": "enable-diego",
                "Alias": "",
                "HelpText": "enable Diego support for an app",
                "UsageDetails": {"Usage": "cf enable-diego APP_NAME", "Options": null}
            }
        ]
    }"#;
    let metadata: PluginMetadata = serde_json::from_str(json).expect("parse metadata");
    assert_eq!(metadata.name(), "Diego-Enabler");
    assert_eq!(metadata.version(), VersionType::new(1, 0, 1));
    let command = metadata.commands().first().expect("one command");
    assert_eq!(command.usage_text(), "cf enable-diego APP_NAME");
    assert!(command.usage_details().options.is_empty());
    assert_eq!(command.alias(), None);
}

#[test]
fn null_command_list_parses_as_empty() {
    let metadata: PluginMetadata =
        serde_json::from_str(r#"{"Name": "bare", "Commands": null}"#).expect("parse metadata");
    assert!(metadata.commands().is_empty());
}
