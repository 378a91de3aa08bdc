//! Final placement of a classified file.
//!
//! Destinations are folder paths relative to the watched root. A leading
//! `/` is read as relative to the root; `..` and drive prefixes are
//! refused. An existing file at the target is never overwritten.

use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaceError {
    #[error("Destination escapes the watched root: {0}")]
    EscapesRoot(String),

    #[error("Source has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("Destination already exists: {0}")]
    Collision(PathBuf),

    #[error("Failed to create folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task failed: {0}")]
    Task(String),
}

/// What happened to a file handed to the mover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// File now lives at this path
    Moved(PathBuf),
    /// Preserve-structure refused to create this folder; file left in place
    SkippedMissingFolder(PathBuf),
}

/// Moves files into subfolders of one root
#[derive(Debug, Clone)]
pub struct Mover {
    root: PathBuf,
}

impl Mover {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Move `source` into `<root>/<destination>/`.
    ///
    /// With `preserve_structure` the destination folder must already exist.
    pub async fn place(
        &self,
        source: &Path,
        destination: &str,
        preserve_structure: bool,
    ) -> Result<PlaceOutcome, PlaceError> {
        let dest_dir = self.destination_dir(destination)?;
        let source = source.to_path_buf();

        tokio::task::spawn_blocking(move || place_sync(&source, &dest_dir, preserve_structure))
            .await
            .map_err(|e| PlaceError::Task(e.to_string()))?
    }

    /// Resolve a relative destination under the root
    fn destination_dir(&self, destination: &str) -> Result<PathBuf, PlaceError> {
        let relative = Path::new(destination);
        let mut dir = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => dir.push(part),
                // "/Work/Reports" means "Work/Reports" under the root
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(PlaceError::EscapesRoot(destination.to_string()));
                }
            }
        }

        Ok(dir)
    }
}

fn place_sync(
    source: &Path,
    dest_dir: &Path,
    preserve_structure: bool,
) -> Result<PlaceOutcome, PlaceError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| PlaceError::NoFileName(source.to_path_buf()))?;

    if preserve_structure {
        if !dest_dir.is_dir() {
            return Ok(PlaceOutcome::SkippedMissingFolder(dest_dir.to_path_buf()));
        }
    } else {
        fs::create_dir_all(dest_dir).map_err(|e| PlaceError::CreateDir {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;
    }

    let target = dest_dir.join(file_name);
    if target.exists() {
        return Err(PlaceError::Collision(target));
    }

    fs::rename(source, &target).map_err(|e| PlaceError::Move {
        from: source.to_path_buf(),
        to: target.clone(),
        source: e,
    })?;

    Ok(PlaceOutcome::Moved(target))
}
