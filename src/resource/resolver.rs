use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::StaticFilesConfig;
use crate::error::ResolveError;
use crate::resource::listing::{self, ListingEntry};

/// Maps decoded request paths onto the served directory.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    root: PathBuf,
    max_file_size: u64,
    listing_capacity: usize,
}

impl ResourceResolver {
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64, listing_capacity: usize) -> Self {
        Self {
            root: root.into(),
            max_file_size,
            listing_capacity,
        }
    }

    pub fn from_config(cfg: &StaticFilesConfig) -> Self {
        Self::new(cfg.root.clone(), cfg.max_file_size, cfg.listing_capacity)
    }

    /// Reads `<root>/<name>.<ext>` after percent-decoding both parts.
    ///
    /// Files larger than the configured maximum are refused with
    /// [`ResolveError::TooLarge`]; paths leaving the root with
    /// [`ResolveError::Forbidden`].
    pub fn resolve_file(&self, name: &str, ext: &str) -> Result<Vec<u8>, ResolveError> {
        let decoded = format!("{}.{}", percent_decode(name), percent_decode(ext));
        let path = self.locate(&decoded)?;

        let metadata = fs::metadata(&path).map_err(classify)?;
        if !metadata.is_file() {
            return Err(ResolveError::NotFound);
        }
        self.check_size(metadata.len())?;

        let contents = fs::read(&path).map_err(classify)?;
        // The file may have grown since the metadata call.
        self.check_size(contents.len() as u64)?;
        Ok(contents)
    }

    /// Generates the HTML listing for the directory at `path`.
    pub fn list_directory(&self, path: &str) -> Result<Vec<u8>, ResolveError> {
        let decoded = percent_decode(path);
        let dir = self.locate(&decoded)?;
        if !dir.is_dir() {
            return Err(ResolveError::NotFound);
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(classify)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            entries.push(ListingEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: metadata.is_dir(),
                modified: metadata.modified().ok(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(listing::render(&decoded, &entries, self.listing_capacity).into_bytes())
    }

    fn check_size(&self, size: u64) -> Result<(), ResolveError> {
        if size > self.max_file_size {
            return Err(ResolveError::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Joins a decoded request path onto the root, refusing anything that
    /// would end up outside it.
    fn locate(&self, decoded: &str) -> Result<PathBuf, ResolveError> {
        let mut path = self.root.clone();
        for component in Path::new(decoded.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ResolveError::Forbidden);
                }
            }
        }

        // Symlinks inside the root may still point out of it.
        let canonical = path.canonicalize().map_err(classify)?;
        let root = self.root.canonicalize()?;
        if !canonical.starts_with(&root) {
            return Err(ResolveError::Forbidden);
        }
        Ok(canonical)
    }
}

fn classify(e: io::Error) -> ResolveError {
    match e.kind() {
        io::ErrorKind::NotFound => ResolveError::NotFound,
        _ => ResolveError::Io(e),
    }
}

/// Decodes `%XX` escapes. Malformed escapes are kept literally and invalid
/// UTF-8 is replaced.
///
/// ```
/// # use lantern::resource::percent_decode;
/// assert_eq!(percent_decode("/my%20file"), "/my file");
/// assert_eq!(percent_decode("100%"), "100%");
/// ```
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                decoded.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_escapes() {
        assert_eq!(percent_decode("a%2Fb"), "a/b");
        assert_eq!(percent_decode("%41%42c"), "ABc");
        assert_eq!(percent_decode("end%4"), "end%4");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn encoded_traversal_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ResourceResolver::new(dir.path(), 1024, 1024);

        let err = resolver.resolve_file("/%2e%2e/etc/passwd", "txt").unwrap_err();

        assert!(matches!(err, ResolveError::Forbidden));
    }
}
