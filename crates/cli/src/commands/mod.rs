//! Subcommand implementations and the setup they share.

pub mod chat;
pub mod config_cmd;
pub mod index;

use mira_config::AppConfig;
use mira_memory::{
    DocumentLoader, Embedder, LoadReport, LoaderOptions, ProviderEmbedder, RecursiveSplitter,
    VectorIndex, write_file_tree,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Name of the layout snapshot written into the documents folder.
pub const FILE_TREE_NAME: &str = "file_structure.txt";

/// Export the variables in a `.env` file into the process environment.
///
/// Variables that are already set keep their value. Returns `Ok(false)` when
/// there is no such file.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Pick the embedding backend named in `[embedding]`.
pub fn build_embedder(config: &AppConfig) -> Result<Arc<dyn Embedder>, Box<dyn std::error::Error>> {
    if config.embedding.provider == "local" {
        #[cfg(feature = "local")]
        {
            return Ok(Arc::new(mira_memory::LocalEmbedder::new()?));
        }
        #[cfg(not(feature = "local"))]
        {
            return Err(mira_core::Error::config(
                "embedding.provider = \"local\" requires building with `--features local`",
            )
            .into());
        }
    }

    let provider = mira_providers::router::build_embedding_provider(config);
    info!(
        provider = provider.name(),
        model = %config.embedding.model,
        "Embedding provider set up"
    );
    Ok(Arc::new(ProviderEmbedder::new(
        provider,
        &config.embedding.model,
    )))
}

/// Snapshot the RAG directory layout, load every document and embed it.
pub async fn build_index(
    config: &AppConfig,
    embedder: Arc<dyn Embedder>,
) -> Result<(VectorIndex, LoadReport), Box<dyn std::error::Error>> {
    let rag = &config.rag;

    let tree_path = rag.docs_folder.join(FILE_TREE_NAME);
    match write_file_tree(&rag.rag_dir, &rag.exclude_dirs, &tree_path) {
        Ok(()) => info!(path = %tree_path.display(), "File structure snapshot written"),
        Err(e) => warn!(path = %tree_path.display(), error = %e, "Could not write file structure"),
    }

    let loader = DocumentLoader::new(LoaderOptions {
        include_extensions: rag.include_extensions.clone(),
        exclude_dirs: rag.exclude_dirs.clone(),
        exclude_files: rag.exclude_files.clone(),
        splitter: RecursiveSplitter::new(rag.chunk_size, rag.chunk_overlap)?,
    });

    let mut report = loader.load(&rag.rag_dir);
    let chunks = std::mem::take(&mut report.chunks);
    let index = VectorIndex::build(chunks, embedder, config.embedding.batch_size).await?;

    Ok((index, report))
}
