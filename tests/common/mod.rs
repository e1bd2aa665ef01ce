//! Shared utilities for integration tests.

use std::fs;
use std::path::Path;
use std::time::Duration;

use foldserve::{ServerConfig, Session};
use tempfile::TempDir;

/// Create a served folder with `{Pictures/cat.jpg, Documents/index.html}`.
pub fn fixture_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("Pictures")).unwrap();
    fs::write(dir.path().join("Pictures/cat.jpg"), b"meow").unwrap();
    fs::create_dir(dir.path().join("Documents")).unwrap();
    fs::write(dir.path().join("Documents/index.html"), "<h1>docs</h1>").unwrap();
    dir
}

/// Write a routes document atomically (temp file + rename), the way editors save.
pub fn write_routes(root: &Path, json: &str) {
    let tmp = root.join(".routes.json.tmp");
    fs::write(&tmp, json).unwrap();
    fs::rename(&tmp, root.join("routes.json")).unwrap();
}

/// Settings for a session on an ephemeral port.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.port = 0;
    config.listener.server_name = "foldserve-test".into();
    config
}

/// Start a session on `root` and return it with its base URL.
pub async fn start_session(root: &Path) -> (Session, String) {
    let mut session = Session::new(test_config());
    let addr = session.start(root).await.unwrap();
    (session, format!("http://{addr}"))
}

/// HTTP client without pooling so sessions can drain quickly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `check` until it returns true or `timeout` passes.
#[allow(dead_code)]
pub async fn eventually<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
