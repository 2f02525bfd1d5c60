//! Archive storage keys

use crate::error::{ArchiveFsError, ArchiveFsResult};
use std::fmt;

/// A `/`-separated archive key
///
/// Segments are non-empty, contain no `/`, and never start with `.`; the
/// leading-dot namespace is reserved for backend staging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// The archive root
    pub fn root() -> Self {
        ArchivePath(String::new())
    }

    /// Parse a key like `cluster/server/main`
    pub fn parse(s: &str) -> ArchiveFsResult<Self> {
        let mut path = ArchivePath::root();
        for segment in s.split('/').filter(|s| !s.is_empty()) {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    /// Append one segment
    pub fn child(&self, segment: &str) -> ArchiveFsResult<Self> {
        validate_segment(segment)?;
        if self.0.is_empty() {
            Ok(ArchivePath(segment.to_string()))
        } else {
            Ok(ArchivePath(format!("{}/{}", self.0, segment)))
        }
    }

    /// Sibling key formed by appending `suffix` to the last segment
    pub fn with_suffix(&self, suffix: &str) -> ArchiveFsResult<Self> {
        if self.is_root() {
            return Err(ArchiveFsError::invalid_path("root has no name to suffix"));
        }
        if suffix.contains('/') {
            return Err(ArchiveFsError::invalid_path(format!(
                "suffix '{}' contains '/'",
                suffix
            )));
        }
        Ok(ArchivePath(format!("{}{}", self.0, suffix)))
    }

    /// Segments from the root down
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Parent key, `None` at the root
    pub fn parent(&self) -> Option<ArchivePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(ArchivePath(self.0[..idx].to_string())),
            None => Some(ArchivePath::root()),
        }
    }

    /// Segments of `self` below `prefix`, if `prefix` is an ancestor-or-self
    pub fn strip_prefix(&self, prefix: &ArchivePath) -> Option<Vec<&str>> {
        let mut own = self.segments();
        for expected in prefix.segments() {
            if own.next() != Some(expected) {
                return None;
            }
        }
        Some(own.collect())
    }

    /// True for the empty key
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

fn validate_segment(segment: &str) -> ArchiveFsResult<()> {
    if segment.is_empty() || segment.contains('/') || segment.contains('\\') {
        return Err(ArchiveFsError::invalid_path(format!(
            "invalid segment '{}'",
            segment
        )));
    }
    if segment.starts_with('.') {
        return Err(ArchiveFsError::invalid_path(format!(
            "segment '{}' starts with '.'",
            segment
        )));
    }
    Ok(())
}
