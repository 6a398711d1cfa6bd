//! Runs the real plugin executable against the host in all three modes.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use camino::{Utf8Path, Utf8PathBuf};
use cf_demo_plugin::DemoPlugin;
use cf_host::session::TargetFields;
use cf_host::{
    DiscoveryClient, Dispatcher, HostContext, HostSession, InstallError, OutputSink,
    PluginConfig, PluginEntry, PluginLauncher, PluginStore, SessionHandle, install_plugin,
    uninstall_plugin,
};
use cf_plugin::Plugin;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const PLUGIN_EXE: &str = env!("CARGO_BIN_EXE_cf-demo-plugin");

struct Harness {
    host: Arc<HostContext>,
    root: Utf8PathBuf,
    _dir: TempDir,
}

impl Harness {
    fn out_file(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

fn session() -> HostSession {
    let claims = URL_SAFE_NO_PAD.encode(r#"{"user_name":"alice","user_id":"u-1"}"#);
    HostSession {
        target: "https://api.example.com".to_owned(),
        access_token: format!("bearer e30.{claims}.sig"),
        organization_fields: TargetFields::new("org-1", "acme"),
        space_fields: TargetFields::new("space-1", "dev"),
        ..HostSession::default()
    }
}

#[fixture]
fn harness() -> Harness {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8");
    let host = HostContext::builder(PluginStore::in_dir(root.join("plugins")))
        .sink(OutputSink::capture_only())
        .session(SessionHandle::in_memory(session()))
        .cli_version("6.53.0")
        .build();
    Harness {
        host,
        root,
        _dir: dir,
    }
}

fn read_lines(path: &Utf8Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("plugin output")
        .lines()
        .map(str::to_owned)
        .collect()
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| (*word).to_owned()).collect()
}

#[rstest]
fn interactive_commands_call_back_into_the_host(harness: Harness) {
    let out = harness.out_file("whoami.txt");
    let status = PluginLauncher::new(Arc::clone(&harness.host))
        .invoke(
            "demo",
            Utf8Path::new(PLUGIN_EXE),
            &strings(&["whoami", "--out", out.as_str()]),
        )
        .expect("invoke");
    assert!(status.success());
    assert_eq!(read_lines(&out), vec!["user: alice", "org: acme", "space: dev"]);
}

#[rstest]
fn dispatching_an_alias_runs_core_commands_through_the_host(harness: Harness) {
    let mut config = PluginConfig::default();
    config.insert("demo", PluginEntry::new(PLUGIN_EXE, &DemoPlugin.metadata()));
    harness.host.store().save(&config).expect("registry");
    let out = harness.out_file("report.txt");

    Dispatcher::new(Arc::clone(&harness.host))
        .dispatch(&strings(&["rpt", "--out", out.as_str()]))
        .expect("dispatch");
    assert_eq!(
        read_lines(&out),
        vec!["cli supported: true", "cf version 6.53.0"]
    );
    assert!(!harness.host.sink().terminal_output_disabled());
}

#[rstest]
fn install_hand_shake_records_the_plugin(harness: Harness) {
    let metadata =
        install_plugin(&harness.host, Utf8Path::new(PLUGIN_EXE), false).expect("install");
    assert_eq!(metadata, DemoPlugin.metadata());

    let config = harness.host.store().load().expect("registry");
    let entry = config.get("demo").expect("demo entry");
    assert!(entry.location().starts_with(harness.host.store().plugins_dir()));
    assert!(entry.location().is_file());
    assert_eq!(entry.commands(), DemoPlugin.metadata().commands());

    let again = install_plugin(&harness.host, Utf8Path::new(PLUGIN_EXE), false)
        .expect_err("already installed");
    assert!(matches!(again, InstallError::NameTaken { .. }));
    install_plugin(&harness.host, Utf8Path::new(PLUGIN_EXE), true).expect("forced reinstall");

    let location = entry.location().to_path_buf();
    uninstall_plugin(&harness.host, "demo").expect("uninstall");
    assert!(harness.host.store().load().expect("registry").is_empty());
    assert!(!location.exists());
}

fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind");
    listener.local_addr().expect("addr").port()
}

#[test]
fn discovery_lists_every_plugin_and_stops_each_child() {
    let mut config = PluginConfig::default();
    config.insert("alpha", PluginEntry::new(PLUGIN_EXE, &DemoPlugin.metadata()));
    config.insert("beta", PluginEntry::new(PLUGIN_EXE, &DemoPlugin.metadata()));
    let port = free_port();
    let client = DiscoveryClient::new(port, Duration::from_secs(5));

    let found = client.list_all(&config).expect("discovery");
    let labels: Vec<String> = found
        .iter()
        .map(|item| format!("{}:{}", item.plugin, item.command.name()))
        .collect();
    assert_eq!(
        labels,
        vec!["alpha:whoami", "alpha:report", "beta:whoami", "beta:report"]
    );
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    assert!(TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_err());
}

#[test]
fn discovery_probes_commands_by_alias() {
    let client = DiscoveryClient::new(free_port(), Duration::from_secs(5));
    let exe = Utf8Path::new(PLUGIN_EXE);
    assert!(client.command_exists("demo", exe, "me").expect("exists"));
    assert!(!client.command_exists("demo", exe, "deploy").expect("exists"));
}
