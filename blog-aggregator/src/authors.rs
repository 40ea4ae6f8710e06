use crate::config::{AggregatorConfig, FeedPolicy};
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub name: String,
    pub url: String,
    pub feed_url: String,
    pub linkedin_url: String,
    pub profile_picture_url: String,
}

impl From<&FeedPolicy> for AuthorEntry {
    fn from(policy: &FeedPolicy) -> Self {
        Self {
            name: policy.name.clone(),
            url: policy.url.clone().unwrap_or_default(),
            feed_url: policy.feed_url.clone().unwrap_or_default(),
            linkedin_url: policy.linkedin_url.clone().unwrap_or_default(),
            profile_picture_url: policy.profile_picture_url.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorIndex {
    pub authors: Vec<AuthorEntry>,
}

impl AuthorIndex {
    /// One entry per enabled feed, in configured order.
    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self {
            authors: config.enabled_feeds().map(AuthorEntry::from).collect(),
        }
    }

    /// Overwrite `path` with the index, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AggregatorConfig {
        AggregatorConfig::from_json(
            r#"{ "feeds": [
                { "name": "Alice", "url": "https://alice.dev", "feed_url": "https://alice.dev/rss",
                  "linkedin_url": "https://linkedin.com/in/alice" },
                { "name": "Bob", "feed_url": "https://bob.dev/rss", "enabled": false },
                { "name": "Carol", "url": "https://carol.dev/feed" }
            ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn only_enabled_feeds_are_listed() {
        let index = AuthorIndex::from_config(&config());
        let names: Vec<&str> = index.authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);

        assert_eq!(index.authors[0].linkedin_url, "https://linkedin.com/in/alice");
        assert_eq!(index.authors[1].feed_url, "");
        assert_eq!(index.authors[1].profile_picture_url, "");
    }

    #[test]
    fn write_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("authors.json");

        AuthorIndex::from_config(&config()).write_to(&path).unwrap();
        AuthorIndex::default().write_to(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({ "authors": [] }));
    }
}
