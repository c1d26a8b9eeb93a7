//! HTML directory listings.

use std::time::SystemTime;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub modified: Option<SystemTime>,
}

/// Renders the listing page for `path`.
///
/// The table text (rows only) is capped at `capacity` bytes. Once the next
/// row would cross the cap it and every later entry are left out.
pub fn render(path: &str, entries: &[ListingEntry], capacity: usize) -> String {
    let base = path.trim_end_matches('/');
    let mut table = String::new();
    let mut omitted = 0usize;

    let parent = (!base.is_empty()).then(|| row(&parent_link(path), "..", "-"));
    let rows = parent.into_iter().chain(entries.iter().map(|entry| {
        let suffix = if entry.is_dir { "/" } else { "" };
        let href = format!("{}/{}{}", base, entry.name, suffix);
        let display = format!("{}{}", entry.name, suffix);
        let modified = entry
            .modified
            .map(format_modified)
            .unwrap_or_else(|| "-".to_string());
        row(&href, &display, &modified)
    }));

    for line in rows {
        if omitted > 0 || table.len() + line.len() > capacity {
            omitted += 1;
            continue;
        }
        table.push_str(&line);
    }

    if omitted > 0 {
        tracing::debug!(path, omitted, "directory listing truncated");
    }

    let title = escape_html(if path.is_empty() { "/" } else { path });
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Index of {title}</title></head>\n<body>\n\
         <h1>Index of {title}</h1>\n<table>\n\
         <tr><th>Name</th><th>Last modified</th></tr>\n{table}</table>\n</body>\n</html>\n"
    )
}

fn row(href: &str, name: &str, modified: &str) -> String {
    format!(
        "<tr><td><a href=\"{}\">{}</a></td><td>{}</td></tr>\n",
        escape_html(href),
        escape_html(name),
        modified
    )
}

/// Link to the directory one level up: the path minus its last segment.
///
/// ```
/// # use lantern::resource::listing::parent_link;
/// assert_eq!(parent_link("/docs/api/"), "/docs/");
/// assert_eq!(parent_link("/docs"), "/");
/// ```
pub fn parent_link(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) if pos > 0 => format!("{}/", &trimmed[..pos]),
        _ => "/".to_string(),
    }
}

fn format_modified(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
