use crate::extract::parse_date;
use crate::types::{AggregatorError, Enclosure, MediaAttachment, RawEntry, Result};
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

const ENTRY_TAGS: &[&[u8]] = &[b"item", b"entry"];
const PUBLISHED_TAGS: &[&[u8]] = &[b"pubDate", b"published", b"issued", b"date"];
const UPDATED_TAGS: &[&[u8]] = &[b"updated", b"modified"];

/// Date text of one entry exactly as the document wrote it.
#[derive(Debug, Default, Clone, PartialEq)]
struct SourceDates {
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum DateField {
    Published,
    Updated,
}

/// Turns RSS/Atom documents into [`RawEntry`] values.
pub struct FeedParser;

impl FeedParser {
    /// Entries in document order. A document feed-rs cannot read at all is an
    /// error; a valid feed with no items is an empty list.
    pub fn parse(content: &[u8]) -> Result<Vec<RawEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        // feed-rs normalizes timestamps to UTC, so the written offset is
        // recovered from the document text when the entry counts line up.
        let mut dates = source_dates(content);
        if dates.len() != feed.entries.len() {
            debug!(
                "Date scan found {} entries, feed-rs found {}; using normalized dates",
                dates.len(),
                feed.entries.len()
            );
            dates.clear();
        }
        dates.resize(feed.entries.len(), SourceDates::default());

        let entries: Vec<RawEntry> = feed
            .entries
            .into_iter()
            .zip(dates)
            .map(|(entry, dates)| Self::raw_entry(entry, dates))
            .collect();
        debug!("Parsed feed with {} entries", entries.len());
        Ok(entries)
    }

    fn raw_entry(entry: Entry, dates: SourceDates) -> RawEntry {
        let link = select_entry_link(&entry);

        let mut media_content = Vec::new();
        let mut enclosures = Vec::new();
        let mut media_thumbnails = Vec::new();
        let mut description = None;

        for media in &entry.media {
            for content in &media.content {
                let url = content.url.as_ref().map(|u| u.to_string());
                let mime_type = content.content_type.as_ref().map(|m| m.to_string());
                // feed-rs folds RSS enclosures into media objects; typed
                // non-image attachments are treated as enclosures.
                match mime_type.as_deref() {
                    Some(t) if !t.starts_with("image/") => enclosures.push(Enclosure {
                        href: url,
                        mime_type,
                    }),
                    _ => media_content.push(MediaAttachment { url, mime_type }),
                }
            }
            media_thumbnails.extend(media.thumbnails.iter().map(|t| t.image.uri.clone()));
            if description.is_none() {
                description = media.description.as_ref().map(|d| d.content.clone());
            }
        }

        enclosures.extend(
            entry
                .links
                .iter()
                .filter(|l| l.rel.as_deref().is_some_and(|r| r.eq_ignore_ascii_case("enclosure")))
                .map(|l| Enclosure {
                    href: Some(l.href.clone()),
                    mime_type: l.media_type.clone(),
                }),
        );

        RawEntry {
            title: entry.title.map(|t| t.content),
            link,
            published: entry_date(dates.published, entry.published),
            updated: entry_date(dates.updated, entry.updated),
            summary: entry.summary.map(|s| s.content),
            description,
            content: entry.content.and_then(|c| c.body).into_iter().collect(),
            media_content,
            media_thumbnails,
            enclosures,
            tags: entry.categories.into_iter().map(|c| Some(c.term)).collect(),
        }
    }
}

/// The source text when it parses, else feed-rs's UTC reading of it.
fn entry_date(source: Option<String>, normalized: Option<DateTime<Utc>>) -> Option<String> {
    source
        .filter(|raw| parse_date(raw).is_some())
        .or_else(|| normalized.map(|dt| dt.to_rfc3339()))
}

/// Raw publish/update text per `<item>`/`<entry>`, in document order. A
/// document quick-xml cannot walk yields an empty list.
fn source_dates(content: &[u8]) -> Vec<SourceDates> {
    let mut reader = Reader::from_reader(content);
    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut current: Option<SourceDates> = None;
    let mut field: Option<DateField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if ENTRY_TAGS.contains(&name) {
                    current = Some(SourceDates::default());
                } else if current.is_some() {
                    field = if PUBLISHED_TAGS.contains(&name) {
                        Some(DateField::Published)
                    } else if UPDATED_TAGS.contains(&name) {
                        Some(DateField::Updated)
                    } else {
                        None
                    };
                    text.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                if ENTRY_TAGS.contains(&e.local_name().as_ref()) {
                    entries.push(SourceDates::default());
                }
            }
            Ok(Event::Text(t)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::CData(t)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if ENTRY_TAGS.contains(&name) {
                    if let Some(dates) = current.take() {
                        entries.push(dates);
                    }
                } else if let (Some(kind), Some(dates)) = (field.take(), current.as_mut()) {
                    let value = text.trim();
                    let slot = match kind {
                        DateField::Published => &mut dates.published,
                        DateField::Updated => &mut dates.updated,
                    };
                    if slot.is_none() && !value.is_empty() {
                        *slot = Some(value.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Date scan stopped: {}", e);
                return Vec::new();
            }
            _ => {}
        }
        buf.clear();
    }

    entries
}

/// The entry's alternate link, else its first non-empty link, else an id that
/// looks like a URL.
fn select_entry_link(entry: &Entry) -> Option<String> {
    let candidates = || entry.links.iter().filter(|l| !l.href.trim().is_empty());

    candidates()
        .find(|l| {
            l.rel
                .as_deref()
                .map_or(true, |r| r.is_empty() || r.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| {
            candidates().find(|l| {
                !l.rel
                    .as_deref()
                    .is_some_and(|r| r.eq_ignore_ascii_case("enclosure"))
            })
        })
        .map(|l| l.href.trim().to_string())
        .or_else(|| {
            let id = entry.id.trim();
            (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract, MAX_SUMMARY_LENGTH};
    use crate::render::post_filename;
    use chrono::NaiveDate;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Alice's blog</title>
    <link>https://alice.dev</link>
    <description>Posts</description>
    <item>
      <title>First post</title>
      <link>https://alice.dev/first</link>
      <pubDate>Tue, 10 Jun 2025 08:30:00 +0000</pubDate>
      <description><![CDATA[<p>Hello <b>world</b><img src="https://alice.dev/inline.png"></p>]]></description>
      <category>rust</category>
      <category>go</category>
      <enclosure url="https://alice.dev/episode.mp3" type="audio/mpeg" length="1234"/>
    </item>
    <item>
      <title>Second post</title>
      <link>https://alice.dev/second</link>
      <media:thumbnail url="https://alice.dev/thumb.jpg"/>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn maps_rss_items_to_raw_entries() {
        let entries = FeedParser::parse(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title.as_deref(), Some("First post"));
        assert_eq!(first.link.as_deref(), Some("https://alice.dev/first"));
        assert_eq!(first.published.as_deref(), Some("Tue, 10 Jun 2025 08:30:00 +0000"));
        assert!(first.summary.as_deref().unwrap().contains("<b>world</b>"));
        assert_eq!(
            first.tags,
            vec![Some("rust".to_string()), Some("go".to_string())]
        );
        assert!(first.media_content.is_empty());
        assert_eq!(first.enclosures.len(), 1);
        assert_eq!(first.enclosures[0].mime_type.as_deref(), Some("audio/mpeg"));

        let second = &entries[1];
        assert_eq!(second.media_thumbnails, vec!["https://alice.dev/thumb.jpg".to_string()]);
    }

    #[test]
    fn late_night_offset_keeps_the_written_day() {
        let xml = r#"<rss version="2.0"><channel><title>t</title><link>https://x</link><description>d</description>
<item><title>Late night</title><link>https://x/late</link><pubDate>Tue, 10 Jun 2025 01:00:00 +0200</pubDate></item>
</channel></rss>"#;
        let entries = FeedParser::parse(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].published.as_deref(), Some("Tue, 10 Jun 2025 01:00:00 +0200"));

        let now = NaiveDate::from_ymd_opt(2025, 6, 11)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let post = extract(&entries[0], MAX_SUMMARY_LENGTH, now);
        assert_eq!(post.published_at.to_iso8601(), "2025-06-10T01:00:00+02:00");
        assert!(post_filename(&post).starts_with("2025-06-10-late-night-"));
    }

    #[test]
    fn atom_dates_keep_their_offset() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>urn:feed</id>
  <title>Atom blog</title>
  <updated>2025-06-10T00:00:00Z</updated>
  <entry>
    <id>urn:one</id>
    <title>One</title>
    <link href="https://atom.dev/one"/>
    <published>2025-06-09T23:30:00-05:00</published>
    <updated>2025-06-10T09:00:00-05:00</updated>
  </entry>
</feed>"#;
        let entries = FeedParser::parse(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].published.as_deref(), Some("2025-06-09T23:30:00-05:00"));
        assert_eq!(entries[0].updated.as_deref(), Some("2025-06-10T09:00:00-05:00"));
    }

    #[test]
    fn date_scan_pairs_text_with_entries() {
        let dates = source_dates(RSS.as_bytes());
        assert_eq!(
            dates,
            vec![
                SourceDates {
                    published: Some("Tue, 10 Jun 2025 08:30:00 +0000".to_string()),
                    updated: None,
                },
                SourceDates::default(),
            ]
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = FeedParser::parse(b"this is not a feed").unwrap_err();
        assert!(matches!(err, AggregatorError::Parse(_)));
    }

    #[test]
    fn empty_channel_has_no_entries() {
        let xml = r#"<rss version="2.0"><channel><title>t</title><link>https://x</link><description>d</description></channel></rss>"#;
        assert!(FeedParser::parse(xml.as_bytes()).unwrap().is_empty());
    }
}
