//! Plain-text snapshot of the RAG directory layout.
//!
//! Written into the documents folder at startup so the model can retrieve
//! "what files exist where" like any other document.

use std::path::Path;
use walkdir::WalkDir;

/// Render an indented listing of `root`.
///
/// ```text
///  project/
/// |-- main.py
/// |-- src/
/// |--|-- lib.py
/// ```
///
/// Files come before subdirectories at each level, both sorted by name.
/// Directories named in `exclude_dirs` are pruned.
pub fn render_file_tree(root: &Path, exclude_dirs: &[String]) -> String {
    let mut out = String::new();

    let walker = WalkDir::new(root)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !exclude_dirs
                    .iter()
                    .any(|d| entry.file_name().to_str() == Some(d.as_str()))
        });

    for entry in walker.flatten() {
        let name = if entry.depth() == 0 {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.display().to_string())
        } else {
            entry.file_name().to_string_lossy().into_owned()
        };

        let indent = "|--".repeat(entry.depth());
        if entry.file_type().is_dir() {
            out.push_str(&format!("{indent} {name}/\n"));
        } else {
            out.push_str(&format!("{indent} {name}\n"));
        }
    }

    out
}

/// Render the tree of `root` and write it to `out_path`.
pub fn write_file_tree(root: &Path, exclude_dirs: &[String], out_path: &Path) -> std::io::Result<()> {
    let tree = render_file_tree(root, exclude_dirs);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out_path, tree)
}
