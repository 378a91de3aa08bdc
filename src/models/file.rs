use std::fmt;
use std::path::Path;

/// The little we know about a new file without opening it
#[derive(Debug, Clone, PartialEq)]
pub struct FileFacts {
    /// Extension including the leading dot, empty when there is none
    pub extension: String,
    /// File size in bytes
    pub size: u64,
}

impl FileFacts {
    /// Stat a file. Follows symlinks.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;

        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Ok(Self {
            extension,
            size: metadata.len(),
        })
    }
}

impl fmt::Display for FileFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extension: {}, Size: {} bytes", self.extension, self.size)
    }
}

/// Metadata line for the suggestion prompt.
///
/// Best effort: a file that is already gone yields an empty string.
pub fn describe_file(path: &Path) -> String {
    FileFacts::from_path(path)
        .map(|facts| facts.to_string())
        .unwrap_or_default()
}
