use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Window for coalescing bursts of events on the same path
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Buffered events between the watcher thread and the dispatcher
pub const EVENT_BUFFER: usize = 256;

/// A single filesystem event or a watcher error, in arrival order
pub type WatchMessage = Result<notify::Event, notify::Error>;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to create watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("Failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Keeps the OS watch alive. Dropping it stops event delivery.
pub struct WatchSource {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

/// Watch `root` (not its subfolders) and stream events into a channel.
///
/// The debouncer calls back on its own thread; a full channel blocks that
/// thread, which in turn holds back further events.
pub fn start_watcher(
    root: &Path,
) -> Result<(WatchSource, mpsc::Receiver<WatchMessage>), WatchError> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    let mut debouncer = new_debouncer(
        DEBOUNCE_WINDOW,
        None,
        move |result: DebounceEventResult| {
            let messages: Vec<WatchMessage> = match result {
                Ok(events) => events.into_iter().map(|e| Ok(e.event)).collect(),
                Err(errors) => errors.into_iter().map(Err).collect(),
            };
            for message in messages {
                if tx.blocking_send(message).is_err() {
                    // Dispatcher is gone
                    return;
                }
            }
        },
    )
    .map_err(WatchError::Create)?;

    debouncer
        .watch(root, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Watch {
            path: root.to_path_buf(),
            source,
        })?;

    tracing::info!(root = %root.display(), "Watching folder");

    Ok((
        WatchSource {
            _debouncer: debouncer,
        },
        rx,
    ))
}

/// Create the watched folder if needed and return its canonical path
pub fn prepare_root(root: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    root.canonicalize()
}
