pub mod dispatcher;
pub mod mover;
pub mod watcher;

pub use dispatcher::{arrived_paths, Dispatcher, DispatchSettings, Disposition};
pub use mover::{Mover, PlaceError, PlaceOutcome};
pub use watcher::{prepare_root, start_watcher, WatchError, WatchMessage, WatchSource};
