// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::pipeline::walk::relative_str;
use crate::watch::dispatcher::WatchEvent;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher observing `source_root` recursively.
///
/// Every changed path is relativized against `source_root` and forwarded as a
/// [`WatchEvent::PathChanged`] into `events_tx`; rule matching and debouncing
/// happen in the dispatcher.
pub fn spawn_watcher(
    source_root: impl Into<PathBuf>,
    events_tx: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle> {
    let root = source_root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the blocking notify callback into the async world.
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = raw_tx.send(event) {
                    // tracing is not reliably usable inside the notify
                    // callback thread; fall back to stderr.
                    eprintln!("siteforge: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("siteforge: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = raw_rx.recv().await {
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let Some(rel) = relative_str(&root, path) else {
                    warn!("could not relativize {:?} against root {:?}", path, root);
                    continue;
                };

                if let Err(err) = events_tx.send(WatchEvent::PathChanged(rel)).await {
                    warn!("failed to send watch event: {err}");
                    // Dispatcher is gone; no point keeping this loop alive.
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}
