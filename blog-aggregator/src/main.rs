use anyhow::Context;
use blog_aggregator::config::DEFAULT_CONFIG_PATH;
use blog_aggregator::{AggregatorConfig, BlogAggregator};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fetch configured RSS/Atom feeds and write one markdown post per new entry.
#[derive(Debug, Parser)]
#[command(name = "blog-aggregator", version)]
struct Args {
    /// Feed configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override `settings.output_directory`
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override `settings.author_index_path`
    #[arg(long)]
    authors_file: Option<PathBuf>,

    /// Skip TLS certificate validation when fetching feeds
    #[arg(long)]
    accept_invalid_certs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("{}", "=".repeat(60));
    info!("Blog Aggregator - Fetching RSS Feeds");
    info!("{}", "=".repeat(60));

    let mut config = AggregatorConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    if let Some(output_dir) = args.output_dir {
        config.settings.output_directory = output_dir;
    }
    if let Some(authors_file) = args.authors_file {
        config.settings.author_index_path = authors_file;
    }
    if args.accept_invalid_certs {
        config.settings.accept_invalid_certs = true;
    }

    let aggregator = BlogAggregator::new(config)?;
    let summary = aggregator.run().await?;

    info!(
        "{} feed(s) processed, {} failed, {} new post(s)",
        summary.feeds_processed, summary.feeds_failed, summary.posts_created
    );
    Ok(())
}
