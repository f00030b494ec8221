//! File resolution: expands a file set into concrete files.
//!
//! Entries are applied in file set order. An including entry adds every
//! matching file (or replaces the options of a file already present); an
//! excluding entry removes every matching file. The last entry touching a
//! path therefore decides both whether it is part of the project and which
//! options it carries. Order is by first inclusion; a file that is excluded
//! and later included again moves to the end.
//!
//! Resolution only reads the filesystem, so resolving an unchanged tree
//! twice yields identical output.

mod pattern;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::project::{slash_path, FileOptions, FileSet};

pub use pattern::{normalize, FilePattern};

/// A concrete file with its effective options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFile {
    /// Path joined onto the base directory and lexically normalised.
    pub absolute_path: PathBuf,
    /// Path relative to the base directory, `/`-separated (absolute for
    /// files outside it).
    pub relative_path: String,
    /// Options of the last including entry that matched.
    pub options: FileOptions,
}

impl ResolvedFile {
    /// Whether the file name ends with `suffix` (e.g. `.glsl`).
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.relative_path.ends_with(suffix)
    }
}

/// Expand `file_set` against `base_dir`.
///
/// Patterns that match nothing contribute nothing; only malformed patterns
/// are errors.
pub fn resolve(file_set: &FileSet, base_dir: &Path) -> Result<Vec<ResolvedFile>> {
    let mut resolved: IndexMap<PathBuf, ResolvedFile> = IndexMap::new();

    for entry in file_set.iter() {
        let pattern = FilePattern::new(&entry.pattern)?;
        let matches = pattern.expand(base_dir);
        debug!(pattern = pattern.as_str(), matches = matches.len(), "expanded pattern");

        for candidate in matches {
            let absolute_path = normalize(&base_dir.join(&candidate));

            if entry.options.exclude {
                resolved.shift_remove(&absolute_path);
                continue;
            }

            if let Some(existing) = resolved.get_mut(&absolute_path) {
                existing.options = entry.options.clone();
                continue;
            }

            let relative_path = relative_to(&candidate, &absolute_path, base_dir);
            resolved.insert(
                absolute_path.clone(),
                ResolvedFile {
                    absolute_path,
                    relative_path,
                    options: entry.options.clone(),
                },
            );
        }
    }

    Ok(resolved.into_values().collect())
}

fn relative_to(candidate: &Path, absolute: &Path, base_dir: &Path) -> String {
    if candidate.is_relative() {
        return slash_path(&normalize(candidate));
    }
    match absolute.strip_prefix(normalize(base_dir)) {
        Ok(relative) => slash_path(relative),
        Err(_) => slash_path(absolute),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(base: &Path, relative: &str) {
        let path = base.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    fn relative_paths(files: &[ResolvedFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn test_exclude_after_include() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.c");
        touch(dir.path(), "skip.c");

        let mut set = FileSet::new();
        set.include("*.c");
        set.exclude("skip.c");

        let files = resolve(&set, dir.path()).unwrap();
        assert_eq!(relative_paths(&files), vec!["a.c"]);
    }

    #[test]
    fn test_empty_match_is_not_an_error() {
        let dir = tempdir().unwrap();

        let mut set = FileSet::new();
        set.include("Sources/**/*.cpp");

        assert!(resolve(&set, dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_pattern_fails() {
        let dir = tempdir().unwrap();

        let mut set = FileSet::new();
        set.include("Sources/[");

        assert!(resolve(&set, dir.path()).is_err());
    }

    #[test]
    fn test_later_inclusion_re_adds() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.c");
        touch(dir.path(), "src/b.c");
        touch(dir.path(), "src/c.c");

        let mut set = FileSet::new();
        set.include("src/*.c");
        set.exclude("src/*.c");
        set.include("src/b.c");

        let files = resolve(&set, dir.path()).unwrap();
        assert_eq!(relative_paths(&files), vec!["src/b.c"]);
    }

    #[test]
    fn test_re_added_file_moves_to_end() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.c");
        touch(dir.path(), "b.c");

        let mut set = FileSet::new();
        set.include("*.c");
        set.exclude("a.c");
        set.include("a.c");

        let files = resolve(&set, dir.path()).unwrap();
        assert_eq!(relative_paths(&files), vec!["b.c", "a.c"]);
    }

    #[test]
    fn test_last_including_entry_sets_options() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "Shaders/blur.glsl");
        touch(dir.path(), "Shaders/tint.glsl");

        let mut set = FileSet::new();
        set.include("Shaders/*.glsl");
        set.add(
            "Shaders/tint.glsl",
            FileOptions {
                no_filter: true,
                ..Default::default()
            },
        );

        let files = resolve(&set, dir.path()).unwrap();
        assert_eq!(relative_paths(&files), vec!["Shaders/blur.glsl", "Shaders/tint.glsl"]);
        assert!(!files[0].options.no_filter);
        assert!(files[1].options.no_filter);
    }

    #[test]
    fn test_options_follow_declaration_order_not_specificity() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/main.c");

        let mut set = FileSet::new();
        set.add(
            "src/main.c",
            FileOptions {
                no_filter: true,
                ..Default::default()
            },
        );
        set.include("src/*.c");

        let files = resolve(&set, dir.path()).unwrap();
        assert!(!files[0].options.no_filter);
    }

    #[test]
    fn test_overlapping_patterns_deduplicated() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.c");
        touch(dir.path(), "src/a.h");

        let mut set = FileSet::new();
        set.include("src/*.c");
        set.include("src/**");
        set.include("./src/a.c");

        let files = resolve(&set, dir.path()).unwrap();
        assert_eq!(relative_paths(&files), vec!["src/a.c", "src/a.h"]);
    }

    #[test]
    fn test_parent_directory_patterns() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "shared/util.c");
        fs::create_dir_all(dir.path().join("game")).unwrap();

        let mut set = FileSet::new();
        set.include("../shared/*.c");

        let base = dir.path().join("game");
        let files = resolve(&set, &base).unwrap();

        assert_eq!(relative_paths(&files), vec!["../shared/util.c"]);
        assert_eq!(files[0].absolute_path, dir.path().join("shared/util.c"));
    }

    #[test]
    fn test_absolute_pattern_inside_base() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "lib/x.c");

        let mut set = FileSet::new();
        let absolute = format!(
            "{}/lib/*.c",
            glob::Pattern::escape(&slash_path(dir.path()))
        );
        set.include(absolute);

        let files = resolve(&set, dir.path()).unwrap();
        assert_eq!(relative_paths(&files), vec!["lib/x.c"]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let dir = tempdir().unwrap();
        for name in ["z.c", "m.c", "a.c", "sub/q.c", "sub/b.c", "other/k.h"] {
            touch(dir.path(), name);
        }

        let mut set = FileSet::new();
        set.include("**/*.c");
        set.include("other/*");
        set.exclude("sub/q.c");

        let first = resolve(&set, dir.path()).unwrap();
        let second = resolve(&set, dir.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            relative_paths(&first),
            vec!["a.c", "m.c", "sub/b.c", "z.c", "other/k.h"]
        );
    }
}
