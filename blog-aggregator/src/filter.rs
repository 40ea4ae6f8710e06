use crate::config::FeedPolicy;
use crate::types::ExtractedPost;
use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;

/// Posts older than this many days are never rendered.
pub const MAX_POST_AGE_DAYS: i64 = 365;

/// Why an entry did not make it to rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AlreadyExists,
    TooOld,
    NoMatchingTags,
}

/// Decide whether a post is rendered. On success returns the tags that survive
/// the policy's include/exclude lists.
///
/// Checks run cheapest first: dedupe, age, tags.
pub fn should_keep(
    post: &ExtractedPost,
    policy: &FeedPolicy,
    existing: &HashSet<String>,
    now: NaiveDateTime,
) -> Result<Vec<String>, Rejection> {
    if existing.contains(&post.id) {
        return Err(Rejection::AlreadyExists);
    }
    if is_too_old(post, now) {
        return Err(Rejection::TooOld);
    }
    apply_tag_filters(&post.tags, policy).ok_or(Rejection::NoMatchingTags)
}

/// Compares wall-clock times with any UTC offset dropped.
pub fn is_too_old(post: &ExtractedPost, now: NaiveDateTime) -> bool {
    post.published_at.local < now - Duration::days(MAX_POST_AGE_DAYS)
}

/// Returns `None` when the policy has include tags and none of the post's tags
/// survive; the whole entry is dropped in that case.
pub fn apply_tag_filters(tags: &[String], policy: &FeedPolicy) -> Option<Vec<String>> {
    let include = lowercased(&policy.include_tags);
    let exclude = lowercased(&policy.exclude_tags);

    let filtered: Vec<String> = tags
        .iter()
        .filter(|tag| include.is_empty() || include.contains(&tag.to_lowercase()))
        .filter(|tag| !exclude.contains(&tag.to_lowercase()))
        .cloned()
        .collect();

    if !include.is_empty() && filtered.is_empty() {
        None
    } else {
        Some(filtered)
    }
}

fn lowercased(tags: &[String]) -> HashSet<String> {
    tags.iter().map(|t| t.to_lowercase()).collect()
}
