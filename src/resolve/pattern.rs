//! Glob pattern expansion against the filesystem.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::error::{Result, TrellisError};
use crate::project::slash_path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled file pattern.
#[derive(Debug)]
pub struct FilePattern {
    raw: String,
    pattern: Pattern,
    /// Leading components without glob syntax; the walk starts there.
    prefix: PathBuf,
}

impl FilePattern {
    /// Compile a pattern, rejecting malformed glob syntax.
    pub fn new(raw: &str) -> Result<Self> {
        let pattern = Pattern::new(raw).map_err(|e| TrellisError::InvalidPattern {
            pattern: raw.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            raw: raw.to_string(),
            pattern,
            prefix: literal_prefix(raw),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `candidate` (spelled relative to the base dir, or absolute)
    /// matches this pattern.
    pub fn matches(&self, candidate: &Path) -> bool {
        self.pattern
            .matches_with(&slash_path(candidate), MATCH_OPTIONS)
    }

    /// All regular files matching the pattern, in file name order.
    ///
    /// Each match is returned as it is spelled relative to `base_dir`
    /// (or absolute, for absolute patterns). A missing prefix directory
    /// yields no matches.
    pub fn expand(&self, base_dir: &Path) -> Vec<PathBuf> {
        let walk_root = base_dir.join(&self.prefix);
        let mut matches = Vec::new();

        for entry in WalkDir::new(&walk_root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let candidate = match entry.path().strip_prefix(&walk_root) {
                Ok(rest) if rest.as_os_str().is_empty() => self.prefix.clone(),
                Ok(rest) => self.prefix.join(rest),
                Err(_) => continue,
            };

            if self.matches(&candidate) {
                matches.push(candidate);
            }
        }

        matches
    }
}

/// Leading path components that contain no glob syntax.
fn literal_prefix(raw: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    if raw.starts_with('/') {
        prefix.push("/");
    }

    for part in raw.split('/').filter(|p| !p.is_empty()) {
        if part.contains(['*', '?', '[']) {
            break;
        }
        prefix.push(part);
    }

    prefix
}

/// Lexically clean a path: drop `.` and fold `name/..` pairs.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    out
}
