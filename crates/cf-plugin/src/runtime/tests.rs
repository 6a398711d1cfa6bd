//! Unit tests for argument classification and the discovery handler.

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::error::RpcError;
use crate::metadata::{PluginCommand, VersionType};

#[derive(Default)]
struct Recorder {
    runs: Mutex<Vec<Vec<String>>>,
}

impl Plugin for Recorder {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("diagnose", VersionType::new(1, 0, 0))
            .with_command(PluginCommand::new("diag", "run diagnostics").with_alias("d"))
            .with_command(PluginCommand::new("explode", "always fails"))
    }

    fn run(&self, _connection: &CliConnection, args: &[String]) -> Result<(), PluginError> {
        self.runs.lock().expect("runs lock").push(args.to_vec());
        if args.first().map(String::as_str) == Some("explode") {
            return Err(PluginError::failed("boom"));
        }
        Ok(())
    }
}

struct Harness {
    plugin: Arc<Recorder>,
    handler: DiscoveryHandler,
}

#[fixture]
fn harness() -> Harness {
    let plugin = Arc::new(Recorder::default());
    let handler = DiscoveryHandler::new(Arc::clone(&plugin) as Arc<dyn Plugin>);
    Harness { plugin, handler }
}

fn call(handler: &DiscoveryHandler, method: &str, params: &Value) -> Result<Value, RpcError> {
    let request = RpcRequest::new(1, method, params).expect("encode");
    handler.handle(&request).into_result(method)
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| (*arg).to_owned()).collect()
}

#[rstest]
#[case::discovery(&["20080"], Invocation::Discovery { port: 20080 })]
#[case::metadata(&["4000", "SendMetadata"], Invocation::SendMetadata { port: 4000 })]
#[case::run(&["4000", "diag", "--verbose"], Invocation::Run { port: 4000, args: strings(&["diag", "--verbose"]) })]
#[case::metadata_with_args(&["4000", "SendMetadata", "x"], Invocation::Run { port: 4000, args: strings(&["SendMetadata", "x"]) })]
fn classifies_invocations(#[case] args: &[&str], #[case] expected: Invocation) {
    assert_eq!(Invocation::from_args(&strings(args)).expect("classify"), expected);
}

#[rstest]
#[case::missing(&[])]
#[case::not_a_port(&["diag"])]
fn rejects_missing_or_bad_ports(#[case] args: &[&str]) {
    assert!(Invocation::from_args(&strings(args)).is_err());
}

#[rstest]
fn list_cmds_preserves_declaration_order(harness: Harness) {
    let result = call(&harness.handler, "RPC.ListCmds", &Value::Null).expect("list");
    let commands: Vec<PluginCommand> = serde_json::from_value(result).expect("commands");
    let names: Vec<&str> = commands.iter().map(PluginCommand::name).collect();
    assert_eq!(names, vec!["diag", "explode"]);
}

#[rstest]
#[case::name("diag", true)]
#[case::alias("d", true)]
#[case::missing("report", false)]
fn cmd_exists_checks_names_and_aliases(harness: Harness, #[case] name: &str, #[case] exists: bool) {
    let result = call(&harness.handler, "RPC.CmdExists", &json!(name)).expect("exists");
    assert_eq!(result, json!(exists));
}

#[rstest]
fn run_substitutes_the_canonical_name(harness: Harness) {
    call(&harness.handler, "RPC.Run", &json!(["d", "app"])).expect("run");
    let runs = harness.plugin.runs.lock().expect("runs lock");
    assert_eq!(*runs, vec![strings(&["diag", "app"])]);
}

#[rstest]
#[case::unknown_command(json!(["report"]), "does not implement command 'report'")]
#[case::failing_command(json!(["explode"]), "boom")]
#[case::bad_params(json!({"name": "diag"}), "malformed")]
fn run_failures_are_call_faults(harness: Harness, #[case] params: Value, #[case] needle: &str) {
    let error = call(&harness.handler, "RPC.Run", &params).expect_err("fault");
    assert!(error.is_remote());
    assert!(error.to_string().contains(needle), "{error}");
}

#[rstest]
fn unknown_methods_are_faults(harness: Harness) {
    let error = call(&harness.handler, "RPC.Explode", &Value::Null).expect_err("fault");
    assert!(error.to_string().contains("unknown RPC method"));
}
