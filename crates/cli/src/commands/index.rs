//! `mira index`: build the retrieval index and report on it.

pub async fn run(query: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("Indexing {}", config.rag.rag_dir.display());

    let embedder = super::build_embedder(&config)?;
    let (index, report) = super::build_index(&config, embedder).await?;

    println!("   Files:   {}", report.files_loaded);
    println!("   Chunks:  {}", index.len());
    if !report.skipped.is_empty() {
        println!("   Skipped: {}", report.skipped.len());
        for err in &report.skipped {
            println!("     - {err}");
        }
    }

    if let Some(query) = query {
        println!();
        println!("Top {} for {query:?}:", config.rag.top_k);
        let hits = index.query(&query, config.rag.top_k).await?;
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "  {}. [{:.3}] {}\n     {}",
                rank + 1,
                hit.score,
                hit.chunk.source,
                hit.chunk.preview(120).replace('\n', " ")
            );
        }
    }

    Ok(())
}
