//! Project descriptors and the sub-project reference graph.
//!
//! A project is declared by a `trellis.yaml` file in its directory. Loading
//! a project also loads every sub-project it references, producing a
//! [`ProjectGraph`]: an arena of descriptors where sub-project references
//! are [`ProjectId`] indices. Two references to the same directory share a
//! node, so shared libraries (diamonds) and reference cycles are both
//! representable; the flattener decides which of them are legal.
//!
//! # Example
//!
//! ```ignore
//! use trellis::project::load_project;
//! use trellis::Platform;
//!
//! let (graph, root) = load_project("./game", &Platform::Linux)?;
//! println!("{} project(s) loaded", graph.len());
//! ```

mod loader;
mod manifest;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{load_project, PROJECT_FILENAME};
pub use manifest::{FileEntryDef, PlatformSection, ProjectManifest};

/// Per-pattern options attached to a file entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileOptions {
    /// Remove matching files from the project.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude: bool,

    /// Do not place matching files into IDE filters/groups.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_filter: bool,

    /// Backend specific options, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FileOptions {
    /// Options marking matching files as excluded.
    pub fn excluded() -> Self {
        Self {
            exclude: true,
            ..Default::default()
        }
    }
}

/// An include/exclude directive before glob expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub pattern: String,
    pub options: FileOptions,
}

impl FileEntry {
    pub fn new(pattern: impl Into<String>, options: FileOptions) -> Self {
        Self {
            pattern: pattern.into(),
            options,
        }
    }
}

/// Ordered collection of file directives.
///
/// Order matters: when several entries match the same path, the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    entries: Vec<FileEntry>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directive.
    pub fn add(&mut self, pattern: impl Into<String>, options: FileOptions) {
        self.entries.push(FileEntry::new(pattern, options));
    }

    /// Append an include directive with default options.
    pub fn include(&mut self, pattern: impl Into<String>) {
        self.add(pattern, FileOptions::default());
    }

    /// Append an exclude directive.
    pub fn exclude(&mut self, pattern: impl Into<String>) {
        self.add(pattern, FileOptions::excluded());
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<FileEntry> for FileSet {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// What a project builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    #[default]
    Application,
    StaticLibrary,
    DynamicLibrary,
}

impl TargetKind {
    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::Application => "application",
            TargetKind::StaticLibrary => "static-library",
            TargetKind::DynamicLibrary => "dynamic-library",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Index of a project inside a [`ProjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(usize);

/// One project's declared metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDescriptor {
    /// Project name (becomes the solution/binary name for the root).
    pub name: String,
    /// Target kind.
    pub kind: TargetKind,
    /// Directory the project was declared in; patterns are relative to it.
    pub dir: PathBuf,
    /// Preprocessor defines, first declaration first.
    pub defines: Vec<String>,
    /// Link libraries in link order.
    pub libraries: Vec<String>,
    /// Include directories, relative to `dir`.
    pub include_dirs: Vec<String>,
    /// Referenced sub-projects in declaration order.
    pub sub_projects: Vec<ProjectId>,
    /// File directives.
    pub file_set: FileSet,
    /// Working directory for running the built program, relative to `dir`.
    pub debug_dir: PathBuf,
}

impl ProjectDescriptor {
    /// Create an empty application project.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Application,
            dir: dir.into(),
            defines: Vec::new(),
            libraries: Vec::new(),
            include_dirs: Vec::new(),
            sub_projects: Vec::new(),
            file_set: FileSet::new(),
            debug_dir: PathBuf::from(manifest::DEFAULT_DEBUG_DIR),
        }
    }

    /// Set the target kind.
    pub fn with_kind(mut self, kind: TargetKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a file directive.
    pub fn with_file(mut self, pattern: impl Into<String>, options: FileOptions) -> Self {
        self.file_set.add(pattern, options);
        self
    }

    /// Add a define.
    pub fn with_define(mut self, define: impl Into<String>) -> Self {
        self.defines.push(define.into());
        self
    }

    /// Add a library.
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.libraries.push(library.into());
        self
    }

    /// Add an include directory.
    pub fn with_include_dir(mut self, dir: impl Into<String>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Append a file directive in place.
    pub fn add_file(&mut self, pattern: impl Into<String>, options: FileOptions) {
        self.file_set.add(pattern, options);
    }

    /// The debug directory as an absolute (or `dir`-joined) path.
    pub fn debug_dir_path(&self) -> PathBuf {
        self.dir.join(&self.debug_dir)
    }
}

/// Arena of loaded projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    projects: Vec<ProjectDescriptor>,
}

impl ProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project, returning its id.
    pub fn add(&mut self, project: ProjectDescriptor) -> ProjectId {
        self.projects.push(project);
        ProjectId(self.projects.len() - 1)
    }

    /// Record that `parent` references `child` as a sub-project.
    pub fn link(&mut self, parent: ProjectId, child: ProjectId) {
        self.projects[parent.0].sub_projects.push(child);
    }

    pub fn get(&self, id: ProjectId) -> &ProjectDescriptor {
        &self.projects[id.0]
    }

    pub fn get_mut(&mut self, id: ProjectId) -> &mut ProjectDescriptor {
        &mut self.projects[id.0]
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProjectId, &ProjectDescriptor)> {
        self.projects
            .iter()
            .enumerate()
            .map(|(i, p)| (ProjectId(i), p))
    }
}

/// Render a path with `/` separators.
pub fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
