//! Process lifecycle tests using shell-script plugins.

use std::fs;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use rstest::rstest;

use super::*;
use crate::test_support::{TestHost, strings, test_host};

fn launcher(test: &TestHost) -> PluginLauncher {
    PluginLauncher::new(Arc::clone(&test.host))
}

fn refuses(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_err()
}

#[cfg(unix)]
#[test]
fn child_receives_port_then_original_arguments() {
    let test = test_host(|builder| builder);
    let out = test.plugins_dir.join("argv.txt");
    let script = crate::test_support::write_script(
        &test.plugins_dir,
        "diagnose",
        &format!("echo \"$@\" > '{out}'"),
    );

    let mut session = launcher(&test)
        .spawn("diagnose", &script, &strings(&["diag", "--verbose"]), InputMode::Detached)
        .expect("spawn");
    let port = session.port();
    assert!(session.wait().expect("wait").success());
    drop(session);

    let argv = fs::read_to_string(&out).expect("argv");
    assert_eq!(argv.trim(), format!("{port} diag --verbose"));
}

#[cfg(unix)]
#[rstest]
#[case::success("exit 0", Some(0))]
#[case::failure("exit 3", Some(3))]
fn invoke_reports_exit_status_and_releases_the_port(
    #[case] body: &str,
    #[case] code: Option<i32>,
) {
    let test = test_host(|builder| builder);
    let port_file = test.plugins_dir.join("port.txt");
    let script = crate::test_support::write_script(
        &test.plugins_dir,
        "plugin",
        &format!("echo \"$1\" > '{port_file}'\n{body}"),
    );

    let status = launcher(&test)
        .invoke("plugin", &script, &[])
        .expect("invoke");

    assert_eq!(status.code(), code);
    let port: u16 = fs::read_to_string(&port_file)
        .expect("port file")
        .trim()
        .parse()
        .expect("port");
    assert!(refuses(port));
}

#[test]
fn spawn_failure_is_reported_with_context() {
    let test = test_host(|builder| builder);
    let missing = Utf8PathBuf::from("/nonexistent/cf-plugin-binary");
    let error = launcher(&test)
        .spawn("ghost", &missing, &[], InputMode::Detached)
        .err()
        .expect("spawn failure");
    assert!(matches!(error, LaunchError::Spawn { .. }));
    let message = error.to_string();
    assert!(message.contains("ghost"));
    assert!(message.contains("/nonexistent/cf-plugin-binary"));
}

#[cfg(target_os = "linux")]
#[test]
fn dropping_a_session_kills_a_hung_plugin() {
    let test = test_host(|builder| builder);
    let script = crate::test_support::write_script(&test.plugins_dir, "hang", "exec sleep 30");

    let started = Instant::now();
    let session = launcher(&test)
        .spawn("hang", &script, &[], InputMode::Detached)
        .expect("spawn");
    let pid = session.id();
    let port = session.port();
    drop(session);

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
    assert!(refuses(port));
}

#[cfg(unix)]
#[test]
fn teardown_happens_when_the_caller_panics() {
    let test = test_host(|builder| builder);
    let script = crate::test_support::write_script(&test.plugins_dir, "hang", "exec sleep 30");
    let launcher = launcher(&test);

    let port = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let session = launcher
            .spawn("hang", &script, &[], InputMode::Detached)
            .expect("spawn");
        std::panic::panic_any(session.port())
    }))
    .err()
    .and_then(|payload| payload.downcast_ref::<u16>().copied())
    .expect("port payload");

    assert!(refuses(port));
}
