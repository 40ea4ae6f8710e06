/// Length of a post identifier in hex characters.
pub const POST_ID_LEN: usize = 12;

/// Stable identifier for a post, derived from its link.
///
/// MD5 keeps identifiers compatible with output directories written by
/// earlier runs; only the first 12 hex characters are used.
pub fn post_id(link: &str) -> String {
    let digest = md5::compute(link.as_bytes());
    let mut id = format!("{:x}", digest);
    id.truncate(POST_ID_LEN);
    id
}
