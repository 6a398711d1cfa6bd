//! Shared fixtures for unit tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use camino::Utf8PathBuf;
use mockall::mock;
use tempfile::TempDir;

use crate::auth::{AuthError, Authenticator};
use crate::context::{HostContext, HostContextBuilder};
use crate::platform::{
    AppDetail, AppSummary, OrgDetail, Platform, PlatformError, ResourceRef, ServiceInstance,
    SpaceDetail, UserRoles,
};
use crate::registry::PluginStore;
use crate::session::{HostSession, SessionHandle, TargetFields};
use crate::sink::OutputSink;

mock! {
    pub PlatformApi {}
    impl Platform for PlatformApi {
        fn apps(&self, space_guid: &str) -> Result<Vec<AppSummary>, PlatformError>;
        fn app(&self, space_guid: &str, name: &str) -> Result<AppDetail, PlatformError>;
        fn orgs(&self) -> Result<Vec<ResourceRef>, PlatformError>;
        fn org(&self, name: &str) -> Result<OrgDetail, PlatformError>;
        fn spaces(&self, org_guid: &str) -> Result<Vec<ResourceRef>, PlatformError>;
        fn space(&self, org_guid: &str, name: &str) -> Result<SpaceDetail, PlatformError>;
        fn services(&self, space_guid: &str) -> Result<Vec<ServiceInstance>, PlatformError>;
        fn service(&self, space_guid: &str, name: &str) -> Result<ServiceInstance, PlatformError>;
        fn org_users(&self, org_guid: &str) -> Result<Vec<UserRoles>, PlatformError>;
        fn space_users(&self, space_guid: &str) -> Result<Vec<UserRoles>, PlatformError>;
    }
}

mock! {
    pub TokenSource {}
    impl Authenticator for TokenSource {
        fn refresh_token(&self, session: &SessionHandle) -> Result<String, AuthError>;
    }
}

/// Terminal stand-in recording everything forwarded to it.
#[derive(Clone, Default)]
pub(crate) struct Terminal(Arc<Mutex<Vec<u8>>>);

impl Terminal {
    pub(crate) fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("terminal lock").clone()).expect("utf-8")
    }
}

impl Write for Terminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("terminal lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn jwt(payload: &str) -> String {
    format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload))
}

/// Session logged in as `alice` targeting `acme` / `dev`.
pub(crate) fn targeted_session() -> HostSession {
    HostSession {
        target: "https://api.example.com".to_owned(),
        api_version: "3.99.0".to_owned(),
        access_token: format!(
            "bearer {}",
            jwt(r#"{"user_name":"alice","user_id":"u-1","email":"alice@example.com"}"#)
        ),
        organization_fields: TargetFields::new("org-1", "acme"),
        space_fields: TargetFields::new("space-1", "dev"),
        doppler_endpoint: "wss://doppler.example.com".to_owned(),
        ..HostSession::default()
    }
}

/// A host context over a temporary plugin directory.
pub(crate) struct TestHost {
    pub(crate) host: Arc<HostContext>,
    pub(crate) terminal: Terminal,
    pub(crate) plugins_dir: Utf8PathBuf,
    _dir: TempDir,
}

impl TestHost {
    pub(crate) fn sink(&self) -> &OutputSink {
        self.host.sink()
    }
}

pub(crate) fn test_host(customise: impl FnOnce(HostContextBuilder) -> HostContextBuilder) -> TestHost {
    let dir = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    let plugins_dir = root.join("plugins");
    let terminal = Terminal::default();
    let builder = HostContext::builder(PluginStore::in_dir(plugins_dir.clone()))
        .sink(OutputSink::new(terminal.clone()))
        .session(SessionHandle::in_memory(targeted_session()))
        .cli_version("6.53.0");
    TestHost {
        host: customise(builder).build(),
        terminal,
        plugins_dir,
        _dir: dir,
    }
}

pub(crate) fn with_platform(platform: MockPlatformApi) -> TestHost {
    test_host(|builder| builder.platform(Arc::new(platform)))
}

pub(crate) fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| (*word).to_owned()).collect()
}

/// Writes an executable shell script named `name` under `dir`.
#[cfg(unix)]
pub(crate) fn write_script(dir: &camino::Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).expect("script dir");
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}
