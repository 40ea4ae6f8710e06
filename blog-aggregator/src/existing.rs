use crate::types::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

static POST_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-([a-f0-9]{12})\.md$").expect("static filename regex is valid"));

/// Identifiers of posts already written to `output_dir`.
///
/// Only direct children are considered. A missing directory is an empty set.
pub fn scan_existing_posts(output_dir: &Path) -> Result<HashSet<String>> {
    let mut existing = HashSet::new();

    if !output_dir.exists() {
        debug!("Output directory {} does not exist yet", output_dir.display());
        return Ok(existing);
    }

    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(id) = name.to_str().and_then(post_id_from_filename) {
            existing.insert(id.to_string());
        }
    }

    debug!("Found {} existing post ids in {}", existing.len(), output_dir.display());
    Ok(existing)
}

pub fn post_id_from_filename(name: &str) -> Option<&str> {
    POST_FILENAME
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
