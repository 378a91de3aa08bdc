//! Per-event orchestration
//!
//! Every file that arrives in the watched root (created, renamed into place
//! or moved in from elsewhere) goes through the same steps, one event at a
//! time:
//!
//! 1. skip directories and anything not directly inside the root
//! 2. wait the settle delay so the writer can finish
//! 3. ignore filter
//! 4. placement rules
//! 5. AI suggestion (awaited) when no rule matched
//! 6. fallback to `Unsorted` for anything blank
//! 7. hand off to the mover
//!
//! Nothing in here fails the loop. Per-file problems are logged and the
//! file is left where it is.

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use super::mover::{Mover, PlaceError, PlaceOutcome};
use super::watcher::WatchMessage;
use crate::ai::SuggestionHandle;
use crate::rules::{should_ignore, IgnoreSpec, RuleSet};
use crate::FALLBACK_DESTINATION;

/// Default wait between a create event and reading the file
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// The watched root. Also the base of every destination.
    pub root: PathBuf,
    pub preserve_structure: bool,
    pub settle_delay: Duration,
}

impl DispatchSettings {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            preserve_structure: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// How one created path was handled
#[derive(Debug)]
pub enum Disposition {
    /// Directories are not classified
    Directory,
    /// Created somewhere below the root, not directly in it
    OutsideRoot,
    /// Gone by the time the settle delay ran out
    Vanished,
    /// Matched the ignore policy
    Ignored,
    /// Mover ran
    Placed(PlaceOutcome),
    /// Mover refused or failed; file left in place
    Failed(PlaceError),
}

/// Where a destination came from, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Rule,
    Suggestion,
    Fallback,
}

impl Source {
    fn as_str(&self) -> &'static str {
        match self {
            Source::Rule => "rule",
            Source::Suggestion => "suggestion",
            Source::Fallback => "fallback",
        }
    }
}

pub struct Dispatcher {
    settings: DispatchSettings,
    ignore: IgnoreSpec,
    rules: RuleSet,
    suggestions: Option<SuggestionHandle>,
    mover: Mover,
}

impl Dispatcher {
    /// `suggestions` is `None` when AI suggestions are disabled
    pub fn new(
        settings: DispatchSettings,
        ignore: IgnoreSpec,
        rules: RuleSet,
        suggestions: Option<SuggestionHandle>,
    ) -> Self {
        let mover = Mover::new(settings.root.clone());
        Self {
            settings,
            ignore,
            rules,
            suggestions,
            mover,
        }
    }

    /// Process events in arrival order until the channel closes
    pub async fn run(&self, mut events: mpsc::Receiver<WatchMessage>) {
        while let Some(message) = events.recv().await {
            match message {
                Ok(event) => {
                    self.handle_event(&event).await;
                }
                Err(e) => tracing::error!("Watcher error: {}", e),
            }
        }
        tracing::info!("Event stream closed, dispatcher stopping");
    }

    /// Handle every arriving path of an event. Other event kinds are dropped.
    pub async fn handle_event(&self, event: &notify::Event) -> Vec<Disposition> {
        let paths = arrived_paths(event);

        let mut dispositions = Vec::with_capacity(paths.len());
        for path in paths {
            dispositions.push(self.handle_created(path).await);
        }
        dispositions
    }

    /// Classify and place one newly created path
    pub async fn handle_created(&self, path: &Path) -> Disposition {
        let is_dir = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            // TODO: treat a new folder as one unit, steered by a config file inside it
            tracing::debug!(path = %path.display(), "Skipping directory");
            return Disposition::Directory;
        }

        if path.parent() != Some(self.settings.root.as_path()) {
            return Disposition::OutsideRoot;
        }

        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!("New file detected: {}", file_name);

        if should_ignore(path, &self.ignore) {
            tracing::info!("Ignored by config: {}", file_name);
            return Disposition::Ignored;
        }

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!("{} disappeared before it could be sorted", file_name);
            return Disposition::Vanished;
        }

        let (destination, source) = self.resolve_destination(path, &file_name).await;
        tracing::info!(
            source = source.as_str(),
            "Destination for {}: {}",
            file_name,
            destination
        );

        match self
            .mover
            .place(path, &destination, self.settings.preserve_structure)
            .await
        {
            Ok(PlaceOutcome::Moved(target)) => {
                tracing::info!("Moved {} → {}", file_name, target.display());
                Disposition::Placed(PlaceOutcome::Moved(target))
            }
            Ok(PlaceOutcome::SkippedMissingFolder(dir)) => {
                tracing::info!(
                    "Skipping {} → {} (preserve_structure=true, folder doesn't exist)",
                    file_name,
                    dir.display()
                );
                Disposition::Placed(PlaceOutcome::SkippedMissingFolder(dir))
            }
            Err(e) => {
                tracing::warn!("Failed to place {}: {}", file_name, e);
                Disposition::Failed(e)
            }
        }
    }

    /// Rule first, then suggestion, then fallback. Always non-blank and trimmed.
    async fn resolve_destination(&self, path: &Path, file_name: &str) -> (String, Source) {
        let (candidate, source) = match self.rules.match_rule(file_name) {
            Some(dest) => (dest.to_string(), Source::Rule),
            None => match &self.suggestions {
                Some(handle) => (handle.request(path).await, Source::Suggestion),
                None => (String::new(), Source::Fallback),
            },
        };

        match candidate.trim() {
            "" => (FALLBACK_DESTINATION.to_string(), Source::Fallback),
            trimmed => (trimmed.to_string(), source),
        }
    }
}

/// Paths that showed up in the folder with this event.
///
/// A rename reported with both sides (`[from, to]`) only yields the new
/// name. `RenameMode::Any` is what FSEvents reports for either side of a
/// rename; the old side no longer exists and ends up as
/// [`Disposition::Vanished`].
pub fn arrived_paths(event: &notify::Event) -> Vec<&Path> {
    match event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To))
        | EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
            event.paths.iter().map(PathBuf::as_path).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.get(1).map(PathBuf::as_path).into_iter().collect()
        }
        _ => Vec::new(),
    }
}
