//! Behavioural tests for routing command lines to plugins.

use std::cell::RefCell;
use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use cf_plugin::{PluginCommand, PluginMetadata, VersionType};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::{DispatchError, Dispatcher};
use crate::registry::{PluginConfig, PluginEntry};
use crate::test_support::{TestHost, test_host, write_script};

struct DispatchWorld {
    test: TestHost,
    plugin: Option<String>,
    argv_file: Utf8PathBuf,
    outcome: Option<Result<(), DispatchError>>,
}

impl DispatchWorld {
    fn new() -> Self {
        let test = test_host(|builder| builder);
        let argv_file = test.plugins_dir.join("argv.txt");
        Self {
            test,
            plugin: None,
            argv_file,
            outcome: None,
        }
    }

    fn install(&mut self, plugin: &str, command: &str, alias: &str, exit_code: i32) {
        let script = write_script(
            &self.test.plugins_dir,
            plugin,
            &format!("printf '%s\\n' \"$@\" > '{}'\nexit {exit_code}", self.argv_file),
        );
        let metadata = PluginMetadata::new(plugin, VersionType::new(1, 0, 0))
            .with_command(PluginCommand::new(command, "run diagnostics").with_alias(alias));
        let mut config = PluginConfig::default();
        config.insert(plugin, PluginEntry::new(script, &metadata));
        self.test.host.store().save(&config).expect("save registry");
        self.plugin = Some(plugin.to_owned());
    }

    fn recorded_argv(&self) -> Option<Vec<String>> {
        fs::read_to_string(&self.argv_file)
            .ok()
            .map(|text| text.lines().map(str::to_owned).collect())
    }

    fn outcome(&self) -> &Result<(), DispatchError> {
        self.outcome.as_ref().expect("dispatch has run")
    }
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

#[given(r#"a plugin "{plugin}" providing "{command}" with alias "{alias}""#)]
fn given_plugin(world: &RefCell<DispatchWorld>, plugin: String, command: String, alias: String) {
    world.borrow_mut().install(
        strip_quotes(&plugin),
        strip_quotes(&command),
        strip_quotes(&alias),
        0,
    );
}

#[given("the plugin exits with status {code}")]
fn given_exit_status(world: &RefCell<DispatchWorld>, code: i32) {
    let mut state = world.borrow_mut();
    let plugin = state.plugin.clone().expect("plugin installed");
    state.install(&plugin, "diag", "d", code);
}

#[when(r#"the user runs "{line}""#)]
fn when_user_runs(world: &RefCell<DispatchWorld>, line: String) {
    let args: Vec<String> = strip_quotes(&line)
        .split_whitespace()
        .map(str::to_owned)
        .collect();
    let mut state = world.borrow_mut();
    let outcome = Dispatcher::new(Arc::clone(&state.test.host)).dispatch(&args);
    state.outcome = Some(outcome);
}

#[then("the dispatch succeeds")]
fn then_succeeds(world: &RefCell<DispatchWorld>) {
    let state = world.borrow();
    assert!(state.outcome().is_ok(), "{:?}", state.outcome());
}

#[then(r#"the plugin was started with "{expected}" after the port"#)]
fn then_started_with(world: &RefCell<DispatchWorld>, expected: String) {
    let argv = world.borrow().recorded_argv().expect("plugin recorded argv");
    let (port, rest) = argv.split_first().expect("port argument");
    assert!(port.parse::<u16>().is_ok(), "first argument {port} is not a port");
    assert_eq!(rest.join(" "), strip_quotes(&expected));
}

#[then("the dispatch fails as an unknown command")]
fn then_unknown(world: &RefCell<DispatchWorld>) {
    let state = world.borrow();
    assert!(
        matches!(state.outcome(), Err(DispatchError::UnknownCommand { .. })),
        "{:?}",
        state.outcome()
    );
}

#[then("no plugin process was started")]
fn then_nothing_started(world: &RefCell<DispatchWorld>) {
    assert!(world.borrow().recorded_argv().is_none());
}

#[then(r#"the dispatch fails naming plugin "{plugin}""#)]
fn then_fails_naming(world: &RefCell<DispatchWorld>, plugin: String) {
    let state = world.borrow();
    let error = state.outcome().as_ref().expect_err("dispatch failed");
    assert!(matches!(error, DispatchError::PluginFailed { .. }), "{error:?}");
    assert!(error.to_string().contains(strip_quotes(&plugin)));
}

#[scenario(path = "tests/features/dispatch.feature")]
fn command_dispatch(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}
