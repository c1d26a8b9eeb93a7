//! Content-Type lookup by file extension.

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("css", "text/css"),
    ("jpg", "image/jpg"),
    ("jpeg", "image/jpg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("txt", "text/plain"),
    ("doc", "application/msword"),
    ("zip", "application/zip"),
    ("7z", "application/x-7z-compressed"),
];

/// Returns the MIME type for `ext` (without the dot), ignoring ASCII case.
///
/// ```
/// # use lantern::http::mime::content_type;
/// assert_eq!(content_type("HTML"), "text/html");
/// assert_eq!(content_type("exe"), "application/octet-stream");
/// ```
pub fn content_type(ext: &str) -> &'static str {
    MIME_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
