use std::path::Path;
use walkdir::WalkDir;

/// Everything the model sees about one file
#[derive(Debug, Clone, Default)]
pub struct PlacementContext<'a> {
    pub instructions: &'a str,
    pub knowledge_base: &'a str,
    pub file_name: &'a str,
    pub metadata: &'a str,
    pub folders: &'a str,
    pub preserve_structure: bool,
}

/// Build the user prompt asking for a destination folder
pub fn build_placement_prompt(ctx: &PlacementContext<'_>) -> String {
    let folder_rule = if ctx.preserve_structure {
        "Do not suggest new folders. Only pick from existing ones."
    } else {
        "You may suggest new folders if appropriate."
    };

    format!(
        r#"{}

Knowledge base:
{}

Filename: {}
Metadata: {}
Existing folder structure: {}

Constraints:
- Respond only with a folder path.
- {}"#,
        ctx.instructions, ctx.knowledge_base, ctx.file_name, ctx.metadata, ctx.folders, folder_rule
    )
}

/// Every subdirectory under `root`, relative to it, one per line.
///
/// Walked fresh on each call so folders created by earlier moves show up.
/// Unreadable entries are skipped.
pub fn folder_snapshot(root: &Path) -> String {
    let mut listing = String::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        if let Ok(rel) = entry.path().strip_prefix(root) {
            listing.push_str(&rel.to_string_lossy());
            listing.push('\n');
        }
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_prompt_contains_context() {
        let prompt = build_placement_prompt(&PlacementContext {
            instructions: "Sort my downloads.",
            knowledge_base: "Invoices go under Finance.",
            file_name: "bill.pdf",
            metadata: "Extension: .pdf, Size: 10 bytes",
            folders: "Finance\nPhotos\n",
            preserve_structure: false,
        });

        assert!(prompt.starts_with("Sort my downloads."));
        assert!(prompt.contains("Invoices go under Finance."));
        assert!(prompt.contains("Filename: bill.pdf"));
        assert!(prompt.contains("Metadata: Extension: .pdf, Size: 10 bytes"));
        assert!(prompt.contains("Finance\nPhotos"));
        assert!(prompt.contains("- Respond only with a folder path."));
        assert!(prompt.contains("You may suggest new folders"));
    }

    #[test]
    fn test_prompt_preserve_structure_constraint() {
        let prompt = build_placement_prompt(&PlacementContext {
            file_name: "a.txt",
            preserve_structure: true,
            ..Default::default()
        });
        assert!(prompt.contains("Do not suggest new folders. Only pick from existing ones."));
        assert!(!prompt.contains("You may suggest new folders"));
    }

    #[test]
    fn test_folder_snapshot_lists_nested_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Work/Reports")).unwrap();
        fs::create_dir_all(dir.path().join("Photos")).unwrap();
        fs::write(dir.path().join("loose.txt"), "x").unwrap();
        fs::write(dir.path().join("Photos/cat.jpg"), "x").unwrap();

        let sep = std::path::MAIN_SEPARATOR;
        let expected = format!("Photos\nWork\nWork{}Reports\n", sep);
        assert_eq!(folder_snapshot(dir.path()), expected);
    }

    #[test]
    fn test_folder_snapshot_empty_root() {
        let dir = tempdir().unwrap();
        assert_eq!(folder_snapshot(dir.path()), "");
    }
}
