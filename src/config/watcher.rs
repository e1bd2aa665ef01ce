//! Routes file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify (OS subscription on the served folder)
//!     → classify() into FolderEvent
//!     → bounded channel (try_send; overflow dropped, a reload is already queued)
//!     → "route-reload" thread
//!     → stable read of routes.json → RouteSet::parse
//!     → SharedRoutes::store (atomic swap)
//! ```

use std::fs::{self, Metadata};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::schema::ReloadConfig;
use crate::observability::metrics;
use crate::resilience::backoff::read_retry_delay;
use crate::routing::{RouteSet, SharedRoutes};

const EVENT_QUEUE_CAPACITY: usize = 16;

/// Error type for starting a watcher.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to subscribe to folder changes: {0}")]
    Notify(#[from] notify::Error),
    #[error("failed to spawn reload thread: {0}")]
    Spawn(#[source] io::Error),
}

/// File-level notification about the served folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderEvent {
    Appeared(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    FolderDeleted,
    /// Internal: wakes the reload thread so it can observe `stop()`.
    Shutdown,
}

/// What the reload thread should do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Result of one reload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A new RouteSet with this many routes was published.
    Applied(usize),
    /// The routes file is gone; an empty RouteSet was published.
    Cleared,
    /// The file could not be read; the previous RouteSet stays.
    KeptPrevious,
}

/// Translate a raw notify event into folder events.
pub fn classify(event: &Event, root: &Path) -> Vec<FolderEvent> {
    let is_root = |p: &PathBuf| p.as_path() == root;

    match event.kind {
        EventKind::Create(_) => event.paths.iter().cloned().map(FolderEvent::Appeared).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().cloned().map(FolderEvent::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut events = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                events.push(FolderEvent::Removed(from.clone()));
            }
            if let Some(to) = event.paths.get(1) {
                events.push(FolderEvent::Appeared(to.clone()));
            }
            events
        }
        EventKind::Modify(_) => event.paths.iter().cloned().map(FolderEvent::Changed).collect(),
        EventKind::Remove(_) => {
            if event.paths.iter().any(is_root) || !root.exists() {
                vec![FolderEvent::FolderDeleted]
            } else {
                event.paths.iter().cloned().map(FolderEvent::Removed).collect()
            }
        }
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Reads the routes file and publishes parsed RouteSets.
#[derive(Debug, Clone)]
pub struct RouteReloader {
    routes_file: PathBuf,
    routes: SharedRoutes,
    settings: ReloadConfig,
}

impl RouteReloader {
    pub fn new(
        routes_file: impl Into<PathBuf>,
        routes: SharedRoutes,
        settings: ReloadConfig,
    ) -> Self {
        Self {
            routes_file: routes_file.into(),
            routes,
            settings,
        }
    }

    pub fn routes_file(&self) -> &Path {
        &self.routes_file
    }

    /// React to one folder event.
    pub fn handle(&self, event: &FolderEvent) -> Flow {
        match event {
            FolderEvent::Appeared(path) | FolderEvent::Changed(path) | FolderEvent::Removed(path)
                if path == &self.routes_file =>
            {
                self.reload();
                Flow::Continue
            }
            FolderEvent::FolderDeleted => {
                tracing::warn!(
                    path = %self.routes_file.display(),
                    "Served folder deleted; clearing routes"
                );
                self.publish(RouteSet::empty());
                metrics::record_reload(ReloadOutcome::Cleared);
                Flow::Stop
            }
            FolderEvent::Shutdown => Flow::Stop,
            _ => Flow::Continue,
        }
    }

    /// Re-read the routes file and publish the result.
    pub fn reload(&self) -> ReloadOutcome {
        let outcome = match read_stable(&self.routes_file, &self.settings) {
            Ok(Some(bytes)) => {
                let set = RouteSet::parse(Some(&bytes));
                let count = set.len();
                self.publish(set);
                tracing::info!(
                    path = %self.routes_file.display(),
                    routes = count,
                    "Routes reloaded"
                );
                ReloadOutcome::Applied(count)
            }
            Ok(None) => {
                self.publish(RouteSet::empty());
                tracing::info!(
                    path = %self.routes_file.display(),
                    "Routes file removed; serving without routes"
                );
                ReloadOutcome::Cleared
            }
            Err(e) => {
                tracing::error!(
                    path = %self.routes_file.display(),
                    error = %e,
                    "Failed to read routes file. Keeping current routes."
                );
                ReloadOutcome::KeptPrevious
            }
        };
        metrics::record_reload(outcome);
        outcome
    }

    fn publish(&self, set: RouteSet) {
        metrics::set_routes_loaded(set.len());
        self.routes.store(Arc::new(set));
    }
}

/// Read the routes file for the initial RouteSet of a session.
///
/// A missing or unreadable file yields an empty RouteSet.
pub fn load_routes(routes_file: &Path, settings: &ReloadConfig) -> RouteSet {
    match read_stable(routes_file, settings) {
        Ok(bytes) => RouteSet::parse(bytes.as_deref()),
        Err(e) => {
            tracing::warn!(
                path = %routes_file.display(),
                error = %e,
                "Failed to read routes file; serving without routes"
            );
            RouteSet::empty()
        }
    }
}

/// Read a file only once it is not being written to.
///
/// The read is accepted when length and modification time match before and
/// after it. Returns `Ok(None)` if the file does not exist.
pub fn read_stable(path: &Path, settings: &ReloadConfig) -> io::Result<Option<Vec<u8>>> {
    let mut attempt = 0;
    loop {
        attempt += 1;

        let Some(before) = metadata_if_exists(path)? else {
            return Ok(None);
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(after) = metadata_if_exists(path)? else {
            return Ok(None);
        };

        if fingerprint(&before) == fingerprint(&after) && bytes.len() as u64 == after.len() {
            return Ok(Some(bytes));
        }

        if attempt >= settings.max_read_attempts {
            return Err(io::Error::other("file kept changing while being read"));
        }

        let delay = read_retry_delay(attempt, settings);
        tracing::debug!(
            path = %path.display(),
            attempt,
            delay = ?delay,
            "Routes file changed mid-read, retrying"
        );
        thread::sleep(delay);
    }
}

fn metadata_if_exists(path: &Path) -> io::Result<Option<Metadata>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn fingerprint(metadata: &Metadata) -> (u64, Option<SystemTime>) {
    (metadata.len(), metadata.modified().ok())
}

/// A live subscription on the served folder.
///
/// Dropping the watcher stops it.
pub struct ConfigWatcher {
    subscription: Arc<Mutex<Option<RecommendedWatcher>>>,
    reloader: RouteReloader,
    wake_tx: mpsc::Sender<FolderEvent>,
    stopped: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Subscribe to changes in `root` and start the reload thread.
    pub fn start(root: &Path, reloader: RouteReloader) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let notify_tx = tx.clone();
        let watched_root = root.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for folder_event in classify(&event, &watched_root) {
                        if let Err(TrySendError::Full(dropped)) = notify_tx.try_send(folder_event)
                        {
                            tracing::debug!(event = ?dropped, "Reload queue full; dropping event");
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(root, RecursiveMode::NonRecursive)?;

        let subscription = Arc::new(Mutex::new(Some(watcher)));
        let stopped = Arc::new(AtomicBool::new(false));

        let worker = {
            let subscription = Arc::clone(&subscription);
            let stopped = Arc::clone(&stopped);
            let reloader = reloader.clone();
            thread::Builder::new()
                .name("route-reload".into())
                .spawn(move || reload_loop(rx, reloader, subscription, stopped))
                .map_err(WatchError::Spawn)?
        };

        tracing::info!(path = ?root, "Routes watcher started");
        Ok(Self {
            subscription,
            reloader,
            wake_tx: tx,
            stopped,
            worker: Some(worker),
        })
    }

    /// Whether the OS subscription is still alive.
    pub fn is_observing(&self) -> bool {
        self.subscription
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Reload the routes file on the calling thread.
    ///
    /// Returns `None` once the watcher has been stopped.
    pub fn reload_now(&self) -> Option<ReloadOutcome> {
        if self.stopped.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.reloader.reload())
    }

    /// Cancel the subscription and join the reload thread.
    ///
    /// No routes are published after this returns. Calling it twice is a no-op.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        self.stopped.store(true, Ordering::SeqCst);
        if let Ok(mut guard) = self.subscription.lock() {
            guard.take();
        }
        // A full queue means the worker is awake and will see the flag.
        let _ = self.wake_tx.try_send(FolderEvent::Shutdown);

        if worker.join().is_err() {
            tracing::error!("Routes reload thread panicked");
        }
        tracing::info!("Routes watcher stopped");
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("observing", &self.is_observing())
            .field("stopped", &self.stopped.load(Ordering::SeqCst))
            .finish()
    }
}

fn reload_loop(
    mut rx: mpsc::Receiver<FolderEvent>,
    reloader: RouteReloader,
    subscription: Arc<Mutex<Option<RecommendedWatcher>>>,
    stopped: Arc<AtomicBool>,
) {
    while let Some(event) = rx.blocking_recv() {
        if stopped.load(Ordering::SeqCst) {
            break;
        }
        if reloader.handle(&event) == Flow::Stop {
            if let Ok(mut guard) = subscription.lock() {
                guard.take();
            }
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::shared_routes;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    fn reloader(dir: &Path) -> (RouteReloader, SharedRoutes) {
        let routes = shared_routes(RouteSet::empty());
        let reloader = RouteReloader::new(
            dir.join("routes.json"),
            routes.clone(),
            ReloadConfig::default(),
        );
        (reloader, routes)
    }

    const ONE_ROUTE: &str = r#"{"routes": [{"path": "/cat", "resource": "cat.jpg"}]}"#;

    #[test]
    fn test_classify_events() {
        let root = Path::new("/srv/site");
        let file = root.join("routes.json");

        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(file.clone());
        assert_eq!(classify(&created, root), vec![FolderEvent::Appeared(file.clone())]);

        let changed = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(file.clone());
        assert_eq!(classify(&changed, root), vec![FolderEvent::Changed(file.clone())]);

        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(root.join("routes.json.tmp"))
            .add_path(file.clone());
        assert_eq!(
            classify(&renamed, root),
            vec![
                FolderEvent::Removed(root.join("routes.json.tmp")),
                FolderEvent::Appeared(file.clone())
            ]
        );

        let deleted =
            Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(root.to_path_buf());
        assert_eq!(classify(&deleted, root), vec![FolderEvent::FolderDeleted]);
    }

    #[test]
    fn test_change_to_routes_file_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let (reloader, routes) = reloader(dir.path());
        fs::write(dir.path().join("routes.json"), ONE_ROUTE).unwrap();

        let flow = reloader.handle(&FolderEvent::Changed(dir.path().join("routes.json")));
        assert_eq!(flow, Flow::Continue);
        assert_eq!(routes.load().len(), 1);
    }

    #[test]
    fn test_other_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (reloader, routes) = reloader(dir.path());
        fs::write(dir.path().join("routes.json"), ONE_ROUTE).unwrap();

        reloader.handle(&FolderEvent::Appeared(dir.path().join("index.html")));
        assert!(routes.load().is_empty());
    }

    #[test]
    fn test_removed_file_clears_routes() {
        let dir = tempfile::tempdir().unwrap();
        let (reloader, routes) = reloader(dir.path());
        fs::write(dir.path().join("routes.json"), ONE_ROUTE).unwrap();
        assert_eq!(reloader.reload(), ReloadOutcome::Applied(1));

        fs::remove_file(dir.path().join("routes.json")).unwrap();
        reloader.handle(&FolderEvent::Removed(dir.path().join("routes.json")));
        assert!(routes.load().is_empty());
    }

    #[test]
    fn test_unreadable_file_keeps_previous_routes() {
        let dir = tempfile::tempdir().unwrap();
        let (reloader, routes) = reloader(dir.path());
        fs::write(dir.path().join("routes.json"), ONE_ROUTE).unwrap();
        reloader.reload();

        // A directory where the file should be cannot be read.
        fs::remove_file(dir.path().join("routes.json")).unwrap();
        fs::create_dir(dir.path().join("routes.json")).unwrap();
        assert_eq!(reloader.reload(), ReloadOutcome::KeptPrevious);
        assert_eq!(routes.load().len(), 1);
    }

    #[test]
    fn test_folder_deletion_clears_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let (reloader, routes) = reloader(dir.path());
        fs::write(dir.path().join("routes.json"), ONE_ROUTE).unwrap();
        reloader.reload();

        assert_eq!(reloader.handle(&FolderEvent::FolderDeleted), Flow::Stop);
        assert!(routes.load().is_empty());
    }

    #[test]
    fn test_load_routes_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = load_routes(&dir.path().join("routes.json"), &ReloadConfig::default());
        assert!(set.is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (reloader, _) = reloader(dir.path());
        let mut watcher = ConfigWatcher::start(dir.path(), reloader).unwrap();
        assert!(watcher.is_observing());

        watcher.stop();
        assert!(!watcher.is_observing());
        watcher.stop();
    }

    #[test]
    fn test_reload_now_publishes_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let (reloader, routes) = reloader(dir.path());
        let mut watcher = ConfigWatcher::start(dir.path(), reloader).unwrap();

        fs::write(dir.path().join("routes.json"), ONE_ROUTE).unwrap();
        assert_eq!(watcher.reload_now(), Some(ReloadOutcome::Applied(1)));
        assert_eq!(routes.load().len(), 1);

        watcher.stop();
        fs::remove_file(dir.path().join("routes.json")).unwrap();
        assert_eq!(watcher.reload_now(), None);
        assert_eq!(routes.load().len(), 1);
    }
}
