use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use chispa_backend::core::config::{AppPaths, ConfigService, EmbeddingProvider};
use chispa_backend::core::logging;
use chispa_backend::llm::embedder_from_settings;
use chispa_backend::rag::{ArtifactStore, Ingestor, KeywordClassifier};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProviderArg {
    Http,
    Hashing,
}

#[derive(Parser, Debug)]
#[command(
    name = "build_index",
    about = "Chunk, embed and publish the case-study corpus as a vector index"
)]
struct BuildIndexCli {
    /// Source CSV (defaults to `paths.source_csv` from config)
    #[arg(long, env = "CHISPA_SOURCE_CSV")]
    source: Option<PathBuf>,

    /// Artifact directory (defaults to `paths.artifacts_dir` from config)
    #[arg(long, env = "CHISPA_ARTIFACTS_DIR")]
    artifacts: Option<PathBuf>,

    /// Override the embedding provider
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Maximum chunk length in characters
    #[arg(long)]
    max_chars: Option<usize>,

    /// Texts per embedding request
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = BuildIndexCli::parse();

    let paths = Arc::new(AppPaths::new());
    logging::init_with_file(&paths, "build_index.log");

    let config = ConfigService::new(paths.clone());
    let mut settings = config.settings().context("Failed to load configuration")?;

    if let Some(provider) = cli.provider {
        settings.embedding.provider = match provider {
            ProviderArg::Http => EmbeddingProvider::Http,
            ProviderArg::Hashing => EmbeddingProvider::Hashing,
        };
    }
    if let Some(max_chars) = cli.max_chars {
        anyhow::ensure!(max_chars > 0, "--max-chars must be positive");
        settings.chunking.max_chars = max_chars;
    }
    if let Some(batch_size) = cli.batch_size {
        anyhow::ensure!(batch_size > 0, "--batch-size must be positive");
        settings.embedding.batch_size = batch_size;
    }

    let source = paths.resolve(cli.source.as_ref().unwrap_or(&settings.paths.source_csv));
    let artifacts = paths.resolve(
        cli.artifacts
            .as_ref()
            .unwrap_or(&settings.paths.artifacts_dir),
    );

    let embedder = embedder_from_settings(&settings.embedding)
        .context("Failed to initialize embedder")?;
    let classifier = Arc::new(KeywordClassifier::new(settings.classifier.rules.clone()));
    let ingestor = Ingestor::new(embedder, classifier, settings.ingest_options());
    let store = ArtifactStore::new(&artifacts);

    let report = ingestor
        .run(&source, &store)
        .await
        .with_context(|| format!("Failed to build index from {}", source.display()))?;

    tracing::info!(
        "Published generation {} to {}: {} records, {} chunks ({} duplicates dropped), dimension {}",
        report.generation,
        artifacts.display(),
        report.records,
        report.chunks,
        report.duplicates_dropped,
        report.dimension
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
