use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// AppleDouble metadata files (`._foo`) are always skipped
pub const HIDDEN_FILE_PREFIX: &str = "._";

/// Files operating systems drop into folders on their own
const OS_DEFAULT_NAMES: [&str; 3] = [".DS_Store", "Thumbs.db", "desktop.ini"];

/// Which paths to leave alone. A path is ignored if any criterion matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgnoreSpec {
    /// Skip `.DS_Store`, `Thumbs.db` and `desktop.ini`
    #[serde(default, rename = "os_defaults")]
    pub use_os_defaults: bool,
    /// Exact file names
    #[serde(default, rename = "files")]
    pub exact_names: HashSet<String>,
    /// Extensions, compared case-insensitively (`.log` and `log` are equivalent)
    #[serde(default)]
    pub extensions: HashSet<String>,
    /// Substrings matched anywhere in the full path
    #[serde(default, rename = "folders")]
    pub path_substrings: HashSet<String>,
}

/// Whether `path` must be skipped before classification
pub fn should_ignore(path: &Path, spec: &IgnoreSpec) -> bool {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.starts_with(HIDDEN_FILE_PREFIX) {
        return true;
    }

    if spec.use_os_defaults && OS_DEFAULT_NAMES.contains(&file_name.as_str()) {
        return true;
    }

    if spec.exact_names.contains(&file_name) {
        return true;
    }

    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        let ignored_ext = spec
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.'))
            .filter(|e| !e.is_empty())
            .any(|e| e.to_lowercase() == ext);
        if ignored_ext {
            return true;
        }
    }

    let full_path = path.to_string_lossy();
    spec.path_substrings
        .iter()
        .filter(|s| !s.is_empty())
        .any(|s| full_path.contains(s.as_str()))
}
