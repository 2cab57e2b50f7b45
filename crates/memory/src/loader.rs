//! Document store loader.
//!
//! Walks the RAG directory, keeps files whose name ends with a whitelisted
//! extension, and splits each one into [`Chunk`]s tagged with its path.
//! A file that cannot be read is logged and skipped; it never aborts a load.

use mira_core::Chunk;
use mira_core::error::LoadError;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::splitter::RecursiveSplitter;

/// Which files the loader picks up and how it splits them.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// File name suffixes to include (e.g. ".md")
    pub include_extensions: Vec<String>,

    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,

    /// File names never loaded
    pub exclude_files: Vec<String>,

    pub splitter: RecursiveSplitter,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            include_extensions: [".py", ".css", ".md", ".json", ".txt"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_dirs: [".git", "__pycache__", ".venv"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_files: [".gitignore", "requirements.txt", "README.md"]
                .into_iter()
                .map(String::from)
                .collect(),
            splitter: RecursiveSplitter::default(),
        }
    }
}

/// What a load produced.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub chunks: Vec<Chunk>,
    pub files_loaded: usize,
    pub skipped: Vec<LoadError>,
}

/// Turns a directory tree into chunks.
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    options: LoaderOptions,
}

impl DocumentLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load and split every eligible file under `root`.
    pub fn load(&self, root: &Path) -> LoadReport {
        let mut report = LoadReport::default();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    warn!(path = %path.display(), error = %e, "Skipping unreadable path");
                    report.skipped.push(LoadError::Walk {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.path().is_file() || !self.is_eligible(&entry) {
                continue;
            }

            let path = entry.path();
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let source = path.display().to_string();
                    let pieces = self.options.splitter.split_text(&content);
                    debug!(file = %source, chunks = pieces.len(), "Loaded file");
                    report
                        .chunks
                        .extend(pieces.into_iter().map(|text| Chunk::new(text, source.clone())));
                    report.files_loaded += 1;
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping file");
                    report.skipped.push(LoadError::Read {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            root = %root.display(),
            files = report.files_loaded,
            chunks = report.chunks.len(),
            skipped = report.skipped.len(),
            "Loaded documents"
        );

        report
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .options
                .exclude_dirs
                .iter()
                .any(|d| entry.file_name().to_str() == Some(d.as_str()))
    }

    fn is_eligible(&self, entry: &DirEntry) -> bool {
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        if self.options.exclude_files.iter().any(|f| f == name) {
            return false;
        }
        self.options
            .include_extensions
            .iter()
            .any(|ext| name.ends_with(ext.as_str()))
    }
}
