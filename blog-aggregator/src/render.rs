use crate::config::FeedPolicy;
use crate::types::{ExtractedPost, OutputDocument, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

pub const MAX_SLUG_LENGTH: usize = 100;
pub const MAX_RENDERED_TAGS: usize = 5;
const FRONT_MATTER_DELIMITER: &str = "+++";

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static slug regex is valid"));
static SLUG_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("static separator regex is valid"));

/// Lowercase, drop punctuation, join words with hyphens, cap at 100 chars.
pub fn sanitize_filename(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = SLUG_SEPARATORS.replace_all(&stripped, "-");
    hyphenated.chars().take(MAX_SLUG_LENGTH).collect()
}

pub fn post_filename(post: &ExtractedPost) -> String {
    format!(
        "{}-{}-{}.md",
        post.published_at.date_prefix(),
        sanitize_filename(&post.title),
        post.id
    )
}

/// Render a post as a markdown file with TOML front matter. `tags` are the
/// post-filter tags; only the first five are written.
pub fn render(post: &ExtractedPost, tags: &[String], policy: &FeedPolicy) -> OutputDocument {
    let mut front_matter = vec![
        FRONT_MATTER_DELIMITER.to_string(),
        format!("title = \"{}\"", post.title.replace('"', "\\\"")),
        format!("date = \"{}\"", post.published_at.to_iso8601()),
        format!("authors = [\"{}\"]", policy.name),
        format!("external_url = \"{}\"", post.link),
        "draft = false".to_string(),
    ];

    if let Some(linkedin_url) = policy.linkedin_url.as_deref().filter(|u| !u.is_empty()) {
        front_matter.push(format!("linkedin_url = \"{}\"", linkedin_url));
    }

    if !tags.is_empty() {
        let quoted: Vec<String> = tags
            .iter()
            .take(MAX_RENDERED_TAGS)
            .map(|t| format!("\"{}\"", t))
            .collect();
        front_matter.push(format!("tags = [{}]", quoted.join(", ")));
    }

    if let Some(image) = &post.image_url {
        front_matter.push(format!("featured_image = \"{}\"", image));
    }

    front_matter.push(FRONT_MATTER_DELIMITER.to_string());

    OutputDocument {
        filename: post_filename(post),
        body: format!("{}\n\n{}\n\n", front_matter.join("\n"), post.summary),
    }
}

impl OutputDocument {
    /// Write the document into `dir`, replacing any file of the same name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, self.body.as_bytes())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PublishedAt;
    use chrono::NaiveDate;

    fn post() -> ExtractedPost {
        ExtractedPost {
            id: "abcdef012345".to_string(),
            title: r#"Say "hi" to Rust"#.to_string(),
            link: "https://alice.dev/hi".to_string(),
            published_at: PublishedAt::naive(
                NaiveDate::from_ymd_opt(2025, 3, 4)
                    .unwrap()
                    .and_hms_opt(5, 6, 7)
                    .unwrap(),
            ),
            image_url: None,
            summary: "A friendly intro.".to_string(),
            tags: Vec::new(),
        }
    }

    fn policy() -> FeedPolicy {
        FeedPolicy {
            name: "Alice".to_string(),
            feed_url: Some("https://alice.dev/rss".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn slug_drops_punctuation_and_joins_words() {
        assert_eq!(sanitize_filename("Hello, World! 2024"), "hello-world-2024");
        assert_eq!(sanitize_filename("a  -- b"), "a-b");
        assert_eq!(sanitize_filename("Ünïcode Wörds"), "ünïcode-wörds");
        assert_eq!(sanitize_filename(&"x".repeat(150)).chars().count(), 100);
    }

    #[test]
    fn filename_combines_date_slug_and_id() {
        assert_eq!(post_filename(&post()), "2025-03-04-say-hi-to-rust-abcdef012345.md");
    }

    #[test]
    fn minimal_front_matter() {
        let doc = render(&post(), &[], &policy());
        let expected = "+++\n\
title = \"Say \\\"hi\\\" to Rust\"\n\
date = \"2025-03-04T05:06:07\"\n\
authors = [\"Alice\"]\n\
external_url = \"https://alice.dev/hi\"\n\
draft = false\n\
+++\n\
\n\
A friendly intro.\n\n";
        assert_eq!(doc.body, expected);
    }

    #[test]
    fn optional_fields_are_emitted_in_order() {
        let mut p = post();
        p.image_url = Some("https://img/cover.png".to_string());
        let mut pol = policy();
        pol.linkedin_url = Some("https://linkedin.com/in/alice".to_string());
        let tags: Vec<String> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|t| t.to_string())
            .collect();

        let doc = render(&p, &tags, &pol);
        let lines: Vec<&str> = doc.body.lines().collect();
        assert_eq!(lines[6], "linkedin_url = \"https://linkedin.com/in/alice\"");
        assert_eq!(lines[7], "tags = [\"a\", \"b\", \"c\", \"d\", \"e\"]");
        assert_eq!(lines[8], "featured_image = \"https://img/cover.png\"");
        assert_eq!(lines[9], "+++");
    }

    #[test]
    fn write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render(&post(), &[], &policy());
        let path = doc.write_to(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), doc.body);
    }
}
