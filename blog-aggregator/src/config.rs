use crate::types::{AggregatorError, FetchConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "feeds.json";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "content/posts";
pub const DEFAULT_AUTHOR_INDEX_PATH: &str = "data/authors.json";
pub const DEFAULT_MAX_POSTS: usize = 10;
pub const DEFAULT_FEED_DELAY_SECONDS: u64 = 2;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub feeds: Vec<FeedPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output_directory: PathBuf,
    pub author_index_path: PathBuf,
    pub request_timeout_seconds: u64,
    pub feed_delay_seconds: u64,
    pub accept_invalid_certs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            author_index_path: PathBuf::from(DEFAULT_AUTHOR_INDEX_PATH),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            feed_delay_seconds: DEFAULT_FEED_DELAY_SECONDS,
            accept_invalid_certs: false,
        }
    }
}

impl Settings {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_seconds: self.request_timeout_seconds,
            accept_invalid_certs: self.accept_invalid_certs,
            ..FetchConfig::default()
        }
    }
}

/// Per-feed configuration: where to fetch from, how many entries to look at,
/// and which tags to keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPolicy {
    pub name: String,
    #[serde(default)]
    pub feed_url: Option<String>,
    /// Homepage of the author; doubles as the feed URL for older configs.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub include_tags: Vec<String>,
    #[serde(default)]
    pub exclude_tags: Vec<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self {
            name: String::new(),
            feed_url: None,
            url: None,
            max_posts: DEFAULT_MAX_POSTS,
            enabled: true,
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            linkedin_url: None,
            profile_picture_url: None,
        }
    }
}

impl FeedPolicy {
    /// `feed_url`, falling back to the legacy `url` key.
    pub fn source_url(&self) -> Option<&str> {
        self.feed_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(self.url.as_deref().filter(|u| !u.is_empty()))
    }
}

fn default_max_posts() -> usize {
    DEFAULT_MAX_POSTS
}

fn default_enabled() -> bool {
    true
}

impl AggregatorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|e| AggregatorError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_json(&raw).map_err(|e| match e {
            AggregatorError::Serialization(e) => AggregatorError::Config {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Enabled feeds in configured order.
    pub fn enabled_feeds(&self) -> impl Iterator<Item = &FeedPolicy> {
        self.feeds.iter().filter(|f| f.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_sparse_config() {
        let config = AggregatorConfig::from_json(
            r#"{ "feeds": [ { "name": "Alice", "feed_url": "https://alice.dev/rss" } ] }"#,
        )
        .unwrap();

        assert_eq!(config.settings.output_directory, PathBuf::from("content/posts"));
        assert_eq!(config.settings.author_index_path, PathBuf::from("data/authors.json"));
        assert_eq!(config.settings.feed_delay_seconds, 2);
        assert!(!config.settings.accept_invalid_certs);

        let feed = &config.feeds[0];
        assert_eq!(feed.max_posts, 10);
        assert!(feed.enabled);
        assert!(feed.include_tags.is_empty());
        assert_eq!(feed.source_url(), Some("https://alice.dev/rss"));
    }

    #[test]
    fn legacy_url_is_used_as_feed_url() {
        let config = AggregatorConfig::from_json(
            r#"{
                "settings": { "output_directory": "out", "accept_invalid_certs": true },
                "feeds": [
                    { "name": "Bob", "url": "https://bob.dev/feed", "enabled": false, "max_posts": 3 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.settings.output_directory, PathBuf::from("out"));
        assert!(config.settings.fetch_config().accept_invalid_certs);
        assert_eq!(config.feeds[0].source_url(), Some("https://bob.dev/feed"));
        assert_eq!(config.feeds[0].max_posts, 3);
        assert_eq!(config.enabled_feeds().count(), 0);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = AggregatorConfig::load("/definitely/not/here/feeds.json").unwrap_err();
        assert!(matches!(err, AggregatorError::Config { .. }));
    }

    #[test]
    fn feed_without_name_is_rejected() {
        assert!(AggregatorConfig::from_json(r#"{ "feeds": [ { "feed_url": "x" } ] }"#).is_err());
    }
}
