use crate::authors::AuthorIndex;
use crate::config::AggregatorConfig;
use crate::existing::scan_existing_posts;
use crate::fetcher::Fetcher;
use crate::processor::FeedProcessor;
use crate::traits::FeedSource;
use crate::types::{Result, RunSummary};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs every enabled feed once, in order, and regenerates the author index.
pub struct BlogAggregator {
    config: AggregatorConfig,
    source: Arc<dyn FeedSource>,
}

impl BlogAggregator {
    /// Aggregator fetching over HTTP with the configured settings.
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.settings.fetch_config())?;
        Ok(Self::with_source(config, Arc::new(fetcher)))
    }

    pub fn with_source(config: AggregatorConfig, source: Arc<dyn FeedSource>) -> Self {
        Self { config, source }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Local::now().naive_local()).await
    }

    /// Same as [`run`](Self::run) with an explicit notion of "now" for the
    /// recency cutoff and undated entries.
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<RunSummary> {
        let settings = &self.config.settings;
        let output_dir = settings.output_directory.as_path();

        std::fs::create_dir_all(output_dir)?;

        let index = AuthorIndex::from_config(&self.config);
        index.write_to(&settings.author_index_path)?;
        info!("Generated author data for {} author(s)", index.authors.len());

        let mut existing = scan_existing_posts(output_dir)?;
        info!("Found {} existing post(s)", existing.len());

        let processor = FeedProcessor::new(self.source.clone(), output_dir);
        let feeds: Vec<_> = self.config.enabled_feeds().collect();
        let delay = Duration::from_secs(settings.feed_delay_seconds);
        let mut summary = RunSummary::default();

        for (idx, policy) in feeds.iter().enumerate() {
            let outcome = processor.process(policy, &mut existing, now).await;

            summary.feeds_processed += 1;
            summary.posts_created += outcome.created();
            if outcome.is_failed() {
                summary.feeds_failed += 1;
            }

            if idx + 1 < feeds.len() && !delay.is_zero() {
                info!("Waiting {}s before next feed...", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        }

        info!("Aggregation complete! Created {} new post(s)", summary.posts_created);
        Ok(summary)
    }
}
