use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub timeout_seconds: u64,
    /// Skip TLS certificate validation for feeds served with broken chains.
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
                "AppleWebKit/537.36 (KHTML, like Gecko) ",
                "Chrome/120.0.0.0 Safari/537.36"
            )
            .to_string(),
            accept: "application/rss+xml, application/xml, text/xml, */*".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_seconds: 30,
            accept_invalid_certs: false,
        }
    }
}

/// A media attachment (`media:content`) on a feed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaAttachment {
    pub url: Option<String>,
    pub mime_type: Option<String>,
}

/// An enclosure link on a feed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enclosure {
    pub href: Option<String>,
    pub mime_type: Option<String>,
}

/// One entry as handed over by the feed parser.
///
/// Feeds vary wildly in which of these they populate, so every field is
/// optional or possibly empty and read through a default.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content: Vec<String>,
    pub media_content: Vec<MediaAttachment>,
    pub media_thumbnails: Vec<String>,
    pub enclosures: Vec<Enclosure>,
    pub tags: Vec<Option<String>>,
}

/// Publish time as written by the feed: wall-clock time plus the offset, if the
/// source carried one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedAt {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl PublishedAt {
    pub fn naive(local: NaiveDateTime) -> Self {
        Self { local, offset: None }
    }

    pub fn with_offset(dt: DateTime<FixedOffset>) -> Self {
        Self {
            local: dt.naive_local(),
            offset: Some(*dt.offset()),
        }
    }

    /// ISO-8601 rendering; naive values carry no offset suffix.
    pub fn to_iso8601(&self) -> String {
        match self.offset.and_then(|o| o.from_local_datetime(&self.local).single()) {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string(),
            None => self.local.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        }
    }

    pub fn date_prefix(&self) -> String {
        self.local.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedPost {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published_at: PublishedAt,
    pub image_url: Option<String>,
    pub summary: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    pub filename: String,
    pub body: String,
}

/// Result of processing one feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    Created(usize),
    /// The feed was abandoned; `created` counts posts already on disk before the failure.
    Failed { reason: String, created: usize },
}

impl FeedOutcome {
    pub fn created(&self) -> usize {
        match self {
            FeedOutcome::Created(n) => *n,
            FeedOutcome::Failed { created, .. } => *created,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FeedOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feeds_processed: usize,
    pub feeds_failed: usize,
    pub posts_created: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error in {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("Feed {name} has no feed URL configured")]
    MissingFeedUrl { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
