//! Accumulator for flattening: unions descriptors in visit order.

use std::path::{Path, PathBuf};

use glob::Pattern;
use indexmap::IndexSet;

use crate::project::{slash_path, FileSet, ProjectDescriptor, TargetKind};

/// Merged state of all visited projects.
pub(super) struct Merger {
    root_dir: PathBuf,
    name: String,
    kind: TargetKind,
    debug_dir: PathBuf,
    defines: IndexSet<String>,
    libraries: IndexSet<String>,
    include_dirs: IndexSet<String>,
    file_set: FileSet,
}

impl Merger {
    pub fn new(root: &ProjectDescriptor) -> Self {
        Self {
            root_dir: root.dir.clone(),
            name: root.name.clone(),
            kind: root.kind,
            debug_dir: root.debug_dir.clone(),
            defines: IndexSet::new(),
            libraries: IndexSet::new(),
            include_dirs: IndexSet::new(),
            file_set: FileSet::new(),
        }
    }

    /// Merge one project's own declarations (not its sub-projects).
    pub fn merge(&mut self, project: &ProjectDescriptor) {
        // First declaration keeps its position for defines and libraries.
        for define in &project.defines {
            self.defines.insert(define.clone());
        }
        for library in &project.libraries {
            self.libraries.insert(library.clone());
        }
        for dir in &project.include_dirs {
            self.include_dirs.insert(rebase_dir(dir, &project.dir, &self.root_dir));
        }

        // Repeated patterns stay in place; the resolver settles overlaps
        // path by path.
        for entry in project.file_set.iter() {
            let pattern = rebase_pattern(&entry.pattern, &project.dir, &self.root_dir);
            self.file_set.add(pattern, entry.options.clone());
        }
    }

    pub fn finish(self) -> ProjectDescriptor {
        ProjectDescriptor {
            name: self.name,
            kind: self.kind,
            dir: self.root_dir,
            defines: self.defines.into_iter().collect(),
            libraries: self.libraries.into_iter().collect(),
            include_dirs: self.include_dirs.into_iter().collect(),
            sub_projects: Vec::new(),
            file_set: self.file_set,
            debug_dir: self.debug_dir,
        }
    }
}

/// Express a pattern declared in `from` relative to `root`.
///
/// Patterns of projects below the root get a relative prefix; projects
/// elsewhere get an absolute, glob-escaped prefix.
pub(super) fn rebase_pattern(pattern: &str, from: &Path, root: &Path) -> String {
    if from == root || Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }

    let prefix = match from.strip_prefix(root) {
        Ok(relative) => slash_path(relative),
        Err(_) => slash_path(from),
    };
    format!("{}/{}", Pattern::escape(&prefix), pattern)
}

fn rebase_dir(dir: &str, from: &Path, root: &Path) -> String {
    if from == root || Path::new(dir).is_absolute() {
        return dir.to_string();
    }

    match from.strip_prefix(root) {
        Ok(relative) => slash_path(&relative.join(dir)),
        Err(_) => slash_path(&from.join(dir)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::FileOptions;

    #[test]
    fn test_rebase_same_dir() {
        let root = Path::new("/game");
        assert_eq!(rebase_pattern("Sources/*.c", root, root), "Sources/*.c");
    }

    #[test]
    fn test_rebase_nested_dir() {
        assert_eq!(
            rebase_pattern("Sources/*.c", Path::new("/game/engine"), Path::new("/game")),
            "engine/Sources/*.c"
        );
    }

    #[test]
    fn test_rebase_outside_root_is_absolute() {
        assert_eq!(
            rebase_pattern("*.c", Path::new("/shared/lib"), Path::new("/game")),
            "/shared/lib/*.c"
        );
    }

    #[test]
    fn test_rebase_escapes_glob_characters() {
        assert_eq!(
            rebase_pattern("*.c", Path::new("/game/lib[1]"), Path::new("/game")),
            "lib[[]1[]]/*.c"
        );
    }

    #[test]
    fn test_rebase_include_dir() {
        assert_eq!(
            rebase_dir("Sources", Path::new("/game/engine"), Path::new("/game")),
            "engine/Sources"
        );
        assert_eq!(rebase_dir("Sources", Path::new("/game"), Path::new("/game")), "Sources");
    }

    #[test]
    fn test_merge_keeps_repeated_patterns_in_order() {
        let root = ProjectDescriptor::new("game", "/game")
            .with_file("a.c", FileOptions::default())
            .with_file("*.c", FileOptions::excluded())
            .with_file("a.c", FileOptions::default());

        let mut merger = Merger::new(&root);
        merger.merge(&root);
        let flat = merger.finish();

        let patterns: Vec<&str> = flat.file_set.iter().map(|e| e.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a.c", "*.c", "a.c"]);
        assert!(flat.file_set.entries()[1].options.exclude);
    }
}
