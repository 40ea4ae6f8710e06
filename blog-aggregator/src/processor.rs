use crate::config::FeedPolicy;
use crate::extract::{extract, MAX_SUMMARY_LENGTH};
use crate::filter::should_keep;
use crate::parser::FeedParser;
use crate::render::render;
use crate::traits::FeedSource;
use crate::types::{AggregatorError, FeedOutcome, RawEntry, Result};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs one feed through fetch, parse, filter and render.
pub struct FeedProcessor {
    source: Arc<dyn FeedSource>,
    output_dir: PathBuf,
}

impl FeedProcessor {
    pub fn new(source: Arc<dyn FeedSource>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
        }
    }

    /// Process the first `max_posts` entries of the feed, writing one document
    /// per entry that passes the filters. Every written id is added to
    /// `existing`.
    ///
    /// Never returns an error: any failure abandons the rest of this feed and
    /// is reported as [`FeedOutcome::Failed`]. Documents written before the
    /// failure stay on disk.
    pub async fn process(
        &self,
        policy: &FeedPolicy,
        existing: &mut HashSet<String>,
        now: NaiveDateTime,
    ) -> FeedOutcome {
        info!("Fetching feed for {}...", policy.name);

        let entries = match self.fetch_entries(policy).await {
            Ok(entries) => entries,
            Err(AggregatorError::Parse(reason)) => {
                warn!("Warning: Failed to parse feed for {}: {}", policy.name, reason);
                return FeedOutcome::Failed { reason, created: 0 };
            }
            Err(e) => {
                error!("Error fetching {}: {}", policy.name, e);
                return FeedOutcome::Failed {
                    reason: e.to_string(),
                    created: 0,
                };
            }
        };

        let mut created = 0;
        for entry in entries.iter().take(policy.max_posts) {
            match self.process_entry(entry, policy, existing, now) {
                Ok(Some(filename)) => {
                    info!("Created: {}", filename);
                    created += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Error processing {}: {}", policy.name, e);
                    return FeedOutcome::Failed {
                        reason: e.to_string(),
                        created,
                    };
                }
            }
        }

        if created == 0 {
            info!("No new posts from {}", policy.name);
        } else {
            info!("Created {} new post(s) from {}", created, policy.name);
        }
        FeedOutcome::Created(created)
    }

    async fn fetch_entries(&self, policy: &FeedPolicy) -> Result<Vec<RawEntry>> {
        let url = policy
            .source_url()
            .ok_or_else(|| AggregatorError::MissingFeedUrl {
                name: policy.name.clone(),
            })?;

        let content = self.source.fetch(url).await?;
        FeedParser::parse(&content)
    }

    /// Returns the written filename, or `None` when the entry was filtered out.
    fn process_entry(
        &self,
        entry: &RawEntry,
        policy: &FeedPolicy,
        existing: &mut HashSet<String>,
        now: NaiveDateTime,
    ) -> Result<Option<String>> {
        let post = extract(entry, MAX_SUMMARY_LENGTH, now);

        let tags = match should_keep(&post, policy, existing, now) {
            Ok(tags) => tags,
            Err(rejection) => {
                debug!("Skipping {:?} ({}): {:?}", post.title, post.id, rejection);
                return Ok(None);
            }
        };

        let document = render(&post, &tags, policy);
        document.write_to(&self.output_dir)?;
        existing.insert(post.id);

        Ok(Some(document.filename))
    }
}
