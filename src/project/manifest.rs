//! Project descriptor file (trellis.yaml) parsing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrellisError};
use crate::platform::Platform;

use super::{FileOptions, ProjectDescriptor, TargetKind};

pub(crate) const DEFAULT_DEBUG_DIR: &str = "Deployment";

/// A file directive as written in YAML: either a bare pattern or a
/// pattern with options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileEntryDef {
    Pattern(String),
    Detailed {
        pattern: String,
        #[serde(flatten)]
        options: FileOptions,
    },
}

impl FileEntryDef {
    fn into_parts(self) -> (String, FileOptions) {
        match self {
            FileEntryDef::Pattern(pattern) => (pattern, FileOptions::default()),
            FileEntryDef::Detailed { pattern, options } => (pattern, options),
        }
    }
}

/// Additions that only apply when exporting for one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSection {
    pub defines: Vec<String>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<String>,
    pub files: Vec<FileEntryDef>,
    pub sub_projects: Vec<PathBuf>,
}

/// Project descriptor loaded from trellis.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Project name.
    pub name: String,

    /// Target kind.
    #[serde(default)]
    pub kind: TargetKind,

    /// Working directory for the built program.
    #[serde(default = "default_debug_dir")]
    pub debug_dir: PathBuf,

    #[serde(default)]
    pub defines: Vec<String>,

    #[serde(default)]
    pub libraries: Vec<String>,

    #[serde(default)]
    pub include_dirs: Vec<String>,

    /// File include/exclude directives, in order.
    #[serde(default)]
    pub files: Vec<FileEntryDef>,

    /// Sub-project directories, relative to this project.
    #[serde(default)]
    pub sub_projects: Vec<PathBuf>,

    /// Per-platform additions keyed by platform id.
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformSection>,
}

fn default_debug_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DEBUG_DIR)
}

impl ProjectManifest {
    /// Load a descriptor from a trellis.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrellisError::io(path, format!("Failed to read project file: {}", e)))?;

        Self::parse(&content).map_err(|e| match e {
            TrellisError::Configuration { message, help } => TrellisError::Configuration {
                message: format!("{}: {}", path.display(), message),
                help,
            },
            other => other,
        })
    }

    /// Parse a descriptor from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(content).map_err(|e| TrellisError::Configuration {
                message: format!("Invalid project file: {}", e),
                help: Some("Check trellis.yaml syntax".to_string()),
            })?;

        if manifest.name.trim().is_empty() {
            return Err(TrellisError::Configuration {
                message: "Project name must not be empty".to_string(),
                help: None,
            });
        }

        Ok(manifest)
    }

    /// Build a descriptor for `platform`, rooted at `dir`.
    ///
    /// Returns the descriptor (without sub-project links) and the sub-project
    /// directories it references, in declaration order.
    pub fn into_descriptor(
        mut self,
        dir: &Path,
        platform: &Platform,
    ) -> (ProjectDescriptor, Vec<PathBuf>) {
        let section = self
            .platforms
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(platform.id()))
            .map(|(_, section)| section.clone());

        if let Some(section) = section {
            self.defines.extend(section.defines);
            self.libraries.extend(section.libraries);
            self.include_dirs.extend(section.include_dirs);
            self.files.extend(section.files);
            self.sub_projects.extend(section.sub_projects);
        }

        let mut descriptor = ProjectDescriptor::new(self.name, dir);
        descriptor.kind = self.kind;
        descriptor.debug_dir = self.debug_dir;
        descriptor.defines = self.defines;
        descriptor.libraries = self.libraries;
        descriptor.include_dirs = self.include_dirs;
        for entry in self.files {
            let (pattern, options) = entry.into_parts();
            descriptor.add_file(pattern, options);
        }

        (descriptor, self.sub_projects)
    }
}
