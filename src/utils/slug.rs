//! Slug, permalink and filename helpers.

use regex::Regex;

/// Lower-case, turn whitespace runs into `_`, and keep only `[a-z0-9_.-]`.
pub fn sanitize_filename(name: &str) -> String {
    sanitize(name, |c| c == '.')
}

/// Like [`sanitize_filename`] but without dots, for content slugs.
pub fn sanitize_slug(name: &str) -> String {
    sanitize(name, |_| false)
}

fn sanitize(name: &str, extra: impl Fn(char) -> bool) -> String {
    let lowered = name.to_lowercase();
    let underscored = match Regex::new(r"\s+") {
        Ok(ws) => ws.replace_all(&lowered, "_").into_owned(),
        Err(_) => lowered,
    };
    underscored
        .chars()
        .filter(|&c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' || extra(c))
        .collect()
}

/// Last non-empty path segment of a permalink.
///
/// # Examples
/// ```
/// use sitesync::utils::slug::slug_from_permalink;
///
/// assert_eq!(slug_from_permalink("/members/alice-b"), Some("alice-b"));
/// assert_eq!(slug_from_permalink("/members/alice-b/"), Some("alice-b"));
/// ```
pub fn slug_from_permalink(permalink: &str) -> Option<&str> {
    permalink
        .split('/')
        .filter(|segment| !segment.trim().is_empty())
        .next_back()
}

/// Permalink for a display name: `/<entity>/<lowercased-hyphen-joined-name>/`.
///
/// Returns `None` for a blank name.
pub fn permalink_for_name(entity: &str, name: &str) -> Option<String> {
    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        return None;
    }
    Some(format!("/{entity}/{slug}/"))
}
