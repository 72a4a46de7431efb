// src/utils/url.rs

//! URL manipulation utilities for file-hosting share links.

use regex::Regex;
use url::Url;

const DRIVE_HOST: &str = "drive.google.com";

/// Extract the file id from a Google Drive share link.
///
/// Handles both `/file/d/<id>/view` and `open?id=<id>` shapes.
///
/// # Examples
/// ```
/// use sitesync::utils::url::drive_file_id;
///
/// assert_eq!(
///     drive_file_id("https://drive.google.com/open?id=abc123&usp=sharing"),
///     Some("abc123".to_string())
/// );
/// ```
pub fn drive_file_id(url: &str) -> Option<String> {
    if !url.contains(DRIVE_HOST) {
        return None;
    }

    let pattern = if url.contains("/file/d/") {
        Regex::new(r"/file/d/([^/?#]+)").ok()?
    } else if url.contains("id=") {
        Regex::new(r"id=([^&#]+)").ok()?
    } else {
        return None;
    };

    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

/// Rewrite a Drive `/file/d/<id>/view` share link into a direct-content URL.
///
/// Returns `None` when the link does not have the recognized shape.
pub fn direct_image_url(url: &str) -> Option<String> {
    let pattern = Regex::new(r"https://drive\.google\.com/file/d/([^/?#]+)/view").ok()?;
    let id = pattern.captures(url)?.get(1)?.as_str();
    Some(format!(
        "https://lh3.googleusercontent.com/d/{id}=w1000?authuser=1/view"
    ))
}

/// Redact identifying parts of a URL before logging it.
pub fn mask_url(url: &str) -> String {
    if url.contains(DRIVE_HOST) {
        if url.contains("/file/d/") {
            if let Ok(pattern) = Regex::new(r"/file/d/[^/?#]+") {
                return pattern
                    .replace(url, "/file/d/[FILE_ID_REDACTED]")
                    .into_owned();
            }
        } else if url.contains("id=") {
            if let Ok(pattern) = Regex::new(r"id=[^&#]+") {
                return pattern.replace(url, "id=[FILE_ID_REDACTED]").into_owned();
            }
        }
    }

    match Url::parse(url) {
        Ok(parsed) => format!(
            "{}://{}/[PATH_REDACTED]",
            parsed.scheme(),
            parsed.host_str().unwrap_or_default()
        ),
        Err(_) => "[INVALID_URL_REDACTED]".to_string(),
    }
}

/// Lower-cased extension of the URL path including the dot, if any.
pub fn path_extension(url: &Url) -> Option<String> {
    let file = url.path_segments()?.next_back()?;
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

/// Last path segment of the URL without its extension.
pub fn path_stem(url: &Url) -> Option<String> {
    let file = url.path_segments()?.next_back()?;
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    (!stem.is_empty()).then(|| stem.to_string())
}
