//! Watch session lifecycle and event plumbing.
//!
//! Bridges notify's recursive directory subscription to the debounce
//! policy and the rebuild callback. Raw events flow through a bounded
//! queue into a dedicated worker thread; the callback runs synchronously
//! on that worker, so at most one rebuild is in flight at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::debounce::{self, FileSnapshot};
use super::filter::WatchFilter;
use crate::error::WatcherError;
use crate::Result;

/// Capacity of the raw event queue.
///
/// Bursts under a slow rebuild are coalesced by dropping excess events;
/// the snapshot comparison on the next delivered event catches any net
/// change, so dropped intermediates never hide a final state.
pub const EVENT_QUEUE_CAPACITY: usize = 1;

/// Lifecycle state of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not yet subscribed.
    Idle,
    /// Subscription active, events being processed.
    Running,
    /// Shutdown requested, waiting for teardown.
    Stopping,
    /// Subscription torn down, worker joined.
    Stopped,
}

/// Callback invoked once per debounced change.
pub type RebuildCallback = Box<dyn FnMut() -> Result<()> + Send>;

/// A live watch over a directory tree.
///
/// Dropping the session stops it.
#[derive(Debug)]
pub struct WatchSession {
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
    state: Arc<Mutex<SessionState>>,
    root: PathBuf,
}

impl WatchSession {
    /// Start watching `root` recursively, invoking `callback` on each
    /// debounced change. Returns immediately; event delivery and the
    /// callback run on background threads.
    ///
    /// # Errors
    ///
    /// Returns `WatcherError::PathNotFound` if `root` does not exist or
    /// is not a readable directory, and `WatcherError::Subscribe` if the
    /// native subscription cannot be established.
    pub fn start(
        root: impl AsRef<Path>,
        callback: RebuildCallback,
        filter: WatchFilter,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(WatcherError::PathNotFound(root).into());
        }

        let state = Arc::new(Mutex::new(SessionState::Idle));
        let (event_tx, event_rx) = bounded::<Event>(EVENT_QUEUE_CAPACITY);

        // The closure owns the sender; dropping the watcher closes the
        // channel and ends the worker loop.
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // A full queue means a rebuild is in progress; the
                    // event is dropped and coalesced into the next one.
                    let _ = event_tx.try_send(event);
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            })
            .map_err(|e| WatcherError::Subscribe {
                path: root.clone(),
                reason: e.to_string(),
            })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| WatcherError::Subscribe {
                path: root.clone(),
                reason: e.to_string(),
            })?;

        let worker_state = Arc::clone(&state);
        let worker = std::thread::Builder::new()
            .name("docwatch-events".to_string())
            .spawn(move || event_loop(&event_rx, callback, filter, &worker_state))?;

        *state.lock() = SessionState::Running;
        tracing::info!(path = %root.display(), "Watching directory");

        Ok(Self {
            watcher: Some(watcher),
            worker: Some(worker),
            state,
            root,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Request shutdown and block until the subscription is torn down and
    /// any in-flight callback has returned. Calling `stop` on an already
    /// stopped session is a no-op.
    pub fn stop(&mut self) {
        if self.watcher.is_none() && self.worker.is_none() {
            return;
        }

        *self.state.lock() = SessionState::Stopping;

        // Dropping the subscription drops the event sender, which ends
        // the worker loop once the current callback returns.
        drop(self.watcher.take());

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Watch worker panicked during shutdown");
            }
        }

        *self.state.lock() = SessionState::Stopped;
        tracing::info!(path = %self.root.display(), "Stopped watching directory");
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker loop: drain the bounded queue, debounce, fire the callback.
fn event_loop(
    events: &Receiver<Event>,
    mut callback: RebuildCallback,
    filter: WatchFilter,
    state: &Arc<Mutex<SessionState>>,
) {
    let mut previous = FileSnapshot::sentinel();

    while let Ok(event) = events.recv() {
        if *state.lock() == SessionState::Stopping {
            break;
        }
        handle_event(&event, &mut previous, &mut callback, filter);
    }
}

fn handle_event(
    event: &Event,
    previous: &mut FileSnapshot,
    callback: &mut RebuildCallback,
    filter: WatchFilter,
) {
    // Only creations and modifications matter; renames and removals of
    // interest surface as modifications of their directory's files.
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }

    for path in &event.paths {
        if filter.is_ignored(path) {
            continue;
        }
        // Directory-level events are always ignored.
        if path.is_dir() {
            continue;
        }

        // The file may be gone by the time we look; suppress rather than
        // fail the session.
        let Ok(current) = FileSnapshot::read(path) else {
            tracing::debug!(path = %path.display(), "File unreadable, suppressing event");
            continue;
        };

        if debounce::is_change(previous, &current) {
            if let Err(e) = callback() {
                tracing::error!(path = %path.display(), error = %e, "Rebuild failed");
            }
            tracing::info!(
                "Rebuilding docs. Detected: {} path: {}",
                kind_label(&event.kind),
                path.display()
            );
        }

        // Always track the latest observation, even when no change was
        // reported, so duplicates compare against fresh state.
        *previous = current;
    }
}

fn kind_label(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::Create(_) => "created",
        EventKind::Modify(_) => "modified",
        _ => "changed",
    }
}
