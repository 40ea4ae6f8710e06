use crate::identity::post_id;
use crate::types::{ExtractedPost, PublishedAt, RawEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

pub const MAX_SUMMARY_LENGTH: usize = 200;
pub const UNTITLED_POST: &str = "Untitled Post";
const ELLIPSIS: &str = "...";

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("static img selector is valid"));

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
];

/// Derive the post view of a raw feed entry. `now` stands in for a missing or
/// unparseable publish date.
pub fn extract(
    entry: &RawEntry,
    max_summary_length: usize,
    now: NaiveDateTime,
) -> ExtractedPost {
    let title = entry
        .title
        .clone()
        .unwrap_or_else(|| UNTITLED_POST.to_string());
    let link = entry.link.clone().unwrap_or_default();

    ExtractedPost {
        id: post_id(&link),
        title,
        link,
        published_at: published_at(entry, now),
        image_url: extract_image(entry),
        summary: extract_summary(entry, max_summary_length),
        tags: extract_tags(entry),
    }
}

/// `published` wins over `updated`; whichever is chosen must parse or the
/// result is `now`.
pub fn published_at(entry: &RawEntry, now: NaiveDateTime) -> PublishedAt {
    let raw = entry
        .published
        .as_deref()
        .or(entry.updated.as_deref())
        .map(str::trim)
        .unwrap_or_default();

    if raw.is_empty() {
        return PublishedAt::naive(now);
    }

    parse_date(raw).unwrap_or_else(|| {
        debug!("Unparseable entry date {:?}, using current time", raw);
        PublishedAt::naive(now)
    })
}

/// Best-effort parse of the date layouts seen in RSS and Atom feeds.
pub fn parse_date(raw: &str) -> Option<PublishedAt> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(PublishedAt::with_offset(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(PublishedAt::with_offset(dt));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(PublishedAt::with_offset(dt));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(PublishedAt::naive(dt));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(PublishedAt::naive)
}

/// First image found, in order: media content, media thumbnail, image
/// enclosure, `<img>` in the content block, `<img>` in the summary.
pub fn extract_image(entry: &RawEntry) -> Option<String> {
    if let Some(url) = entry.media_content.first().and_then(|m| non_empty(m.url.as_deref())) {
        return Some(url);
    }

    if let Some(url) = entry.media_thumbnails.first().and_then(|u| non_empty(Some(u.as_str()))) {
        return Some(url);
    }

    let enclosure = entry.enclosures.iter().find(|e| {
        e.mime_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
    });
    if let Some(href) = enclosure.and_then(|e| non_empty(e.href.as_deref())) {
        return Some(href);
    }

    if let Some(src) = entry.content.first().and_then(|html| first_img_src(html)) {
        return Some(src);
    }

    entry
        .summary
        .as_deref()
        .or(entry.description.as_deref())
        .and_then(first_img_src)
}

/// `src` of the first `<img>` tag in an HTML fragment, if it has one.
pub fn first_img_src(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let img = fragment.select(&IMG_SELECTOR).next()?;
    non_empty(img.value().attr("src"))
}

pub fn extract_summary(entry: &RawEntry, max_length: usize) -> String {
    let source = entry
        .summary
        .as_deref()
        .or(entry.description.as_deref())
        .or(entry.content.first().map(String::as_str))
        .unwrap_or_default();

    truncate_summary(&strip_html(source), max_length)
}

/// Plain text of an HTML fragment with whitespace collapsed to single spaces.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_length` characters including the ellipsis,
/// backing up to the last whitespace so words are not split.
pub fn truncate_summary(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let budget = max_length.saturating_sub(ELLIPSIS.len());
    // One extra char so a boundary sitting right after the budget still counts.
    let window: String = text.chars().take(budget + 1).collect();
    let cut = match window.rfind(char::is_whitespace) {
        Some(idx) => &window[..idx],
        None => {
            let end = window
                .char_indices()
                .nth(budget)
                .map(|(i, _)| i)
                .unwrap_or(window.len());
            &window[..end]
        }
    };

    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

pub fn extract_tags(entry: &RawEntry) -> Vec<String> {
    entry.tags.iter().flatten().cloned().collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
