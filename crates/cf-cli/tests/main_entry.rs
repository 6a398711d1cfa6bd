//! Integration tests for the `cf` binary entry point.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

fn cf(home: &TempDir) -> assert_cmd::Command {
    let mut command = cargo_bin_cmd!("cf");
    command
        .env("CF_HOME", home.path())
        .env_remove("CF_PLUGIN_HOME");
    command
}

#[test]
fn version_prints_the_cli_version() {
    let home = TempDir::new().expect("temp dir");
    cf(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(contains("cf version "));
}

#[test]
fn bare_invocation_shows_help() {
    let home = TempDir::new().expect("temp dir");
    cf(&home).assert().success().stdout(contains("COMMANDS:"));
}

#[test]
fn unknown_commands_exit_non_zero() {
    let home = TempDir::new().expect("temp dir");
    cf(&home)
        .arg("unknown-thing")
        .assert()
        .failure()
        .stderr(contains("'unknown-thing' is not a registered command. See 'cf help'"));
}

#[test]
fn config_flags_precede_the_command() {
    let home = TempDir::new().expect("temp dir");
    cf(&home)
        .args(["--log-filter", "cf_host=debug", "plugins"])
        .assert()
        .success()
        .stdout(contains("Listing installed plugins..."));
}

#[test]
fn resource_commands_require_login() {
    let home = TempDir::new().expect("temp dir");
    cf(&home)
        .arg("apps")
        .assert()
        .failure()
        .stderr(contains("Not logged in"));
}
