//! Exporter dispatch: turns a resolved project into native build files.
//!
//! An [`Exporter`] receives the flattened project with its resolved files
//! and writes target-specific artifacts into the output directory. Which
//! exporter serves a platform is decided by the [`ExporterRegistry`]:
//! built-in backends first, then contributed backends found below the
//! project's `Backends/` directory.

mod cmake;
mod contributed;
mod makefile;
mod registry;
mod visualstudio;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ExportOptions;
use crate::error::{Result, TrellisError};
use crate::graph::FlattenedProject;
use crate::platform::{Platform, VrApi};
use crate::project::{slash_path, TargetKind};
use crate::resolve::ResolvedFile;

pub use cmake::{AndroidExporter, XCodeExporter};
pub use contributed::{find_contributed, ContributedExporter};
pub use makefile::{MakefileExporter, MakefileVariant};
pub use registry::{ExporterFactory, ExporterRegistry, PlatformPredicate};
pub use visualstudio::VisualStudioExporter;

/// A backend producing build artifacts for one or more platforms.
pub trait Exporter {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Write the build artifacts for `project` into `to`.
    fn export_solution(
        &self,
        project: &ResolvedProject,
        from: &Path,
        to: &Path,
        platform: &Platform,
        vr_api: VrApi,
        options: &ExportOptions,
    ) -> Result<()>;
}

/// A flattened project together with its concrete files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProject {
    pub name: String,
    pub kind: TargetKind,
    pub dir: PathBuf,
    pub debug_dir: PathBuf,
    pub defines: Vec<String>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<String>,
    pub files: Vec<ResolvedFile>,
}

impl ResolvedProject {
    pub fn new(project: &FlattenedProject, files: Vec<ResolvedFile>) -> Self {
        Self {
            name: project.name.clone(),
            kind: project.kind,
            dir: project.dir.clone(),
            debug_dir: project.debug_dir_path(),
            defines: project.defines.clone(),
            libraries: project.libraries.clone(),
            include_dirs: project.include_dirs.clone(),
            files,
        }
    }

    /// Every file that is compiled (C, C++ and Objective-C sources).
    pub fn compiled_sources(&self) -> impl Iterator<Item = &ResolvedFile> {
        self.files
            .iter()
            .filter(|f| SourceKind::of(&f.absolute_path).is_compiled())
    }

    /// Include directories as absolute, `/`-separated paths.
    pub fn include_paths(&self) -> Vec<String> {
        self.include_dirs
            .iter()
            .map(|dir| slash_path(&crate::resolve::normalize(&self.dir.join(dir))))
            .collect()
    }
}

/// Classification of a file by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    C,
    Cpp,
    ObjC,
    ObjCpp,
    Header,
    Other,
}

impl SourceKind {
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "c" => SourceKind::C,
            "cpp" | "cc" | "cxx" => SourceKind::Cpp,
            "m" => SourceKind::ObjC,
            "mm" => SourceKind::ObjCpp,
            "h" | "hpp" | "hxx" | "inl" => SourceKind::Header,
            _ => SourceKind::Other,
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(
            self,
            SourceKind::C | SourceKind::Cpp | SourceKind::ObjC | SourceKind::ObjCpp
        )
    }
}

/// Write `content` to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TrellisError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| TrellisError::io(path, e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::project::FileOptions;

    /// A project at `/game` with the given files (relative to it).
    pub(crate) fn sample_project(files: &[&str]) -> ResolvedProject {
        let dir = PathBuf::from("/game");
        ResolvedProject {
            name: "game".to_string(),
            kind: TargetKind::Application,
            dir: dir.clone(),
            debug_dir: dir.join("Deployment"),
            defines: vec!["SYS_LINUX".to_string(), "NDEBUG".to_string()],
            libraries: vec!["pthread".to_string(), "GL".to_string()],
            include_dirs: vec!["Sources".to_string(), "engine/Sources".to_string()],
            files: files
                .iter()
                .map(|f| ResolvedFile {
                    absolute_path: dir.join(f),
                    relative_path: f.to_string(),
                    options: FileOptions::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_source_kind() {
        assert_eq!(SourceKind::of(Path::new("a.c")), SourceKind::C);
        assert_eq!(SourceKind::of(Path::new("a.CPP")), SourceKind::Cpp);
        assert_eq!(SourceKind::of(Path::new("a.mm")), SourceKind::ObjCpp);
        assert_eq!(SourceKind::of(Path::new("a.h")), SourceKind::Header);
        assert_eq!(SourceKind::of(Path::new("a.glsl")), SourceKind::Other);
        assert!(!SourceKind::Header.is_compiled());
    }

    #[test]
    fn test_compiled_sources_keep_order() {
        let project = sample_project(&["b.cpp", "a.h", "a.c", "s.glsl"]);
        let sources: Vec<&str> = project
            .compiled_sources()
            .map(|f| f.relative_path.as_str())
            .collect();
        assert_eq!(sources, vec!["b.cpp", "a.c"]);
    }

    #[test]
    fn test_include_paths_are_absolute() {
        let project = sample_project(&[]);
        assert_eq!(
            project.include_paths(),
            vec!["/game/Sources".to_string(), "/game/engine/Sources".to_string()]
        );
    }
}
