//! Contributed backends: exporters shipped as executables in a project's
//! `Backends/` directory.
//!
//! A backend for a platform lives in `Backends/<dir>`, where `<dir>` is the
//! platform id or display name (any case). The first file in it whose stem
//! ends in `Exporter` is the exporter. It is run as
//! `<exe> <from> <to> <platform> <vr-api>` and receives the resolved project
//! as JSON on stdin.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::config::ExportOptions;
use crate::error::{Result, TrellisError};
use crate::platform::{Platform, VrApi};
use crate::process::run_tool;

use super::{Exporter, ResolvedProject};

const EXPORTER_SUFFIX: &str = "Exporter";

/// Find a contributed exporter for `platform` below `backends_dir`.
pub fn find_contributed(backends_dir: &Path, platform: &Platform) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(backends_dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && serves(p, platform))
        .collect();
    dirs.sort();

    dirs.iter().find_map(|dir| exporter_in(dir))
}

fn serves(dir: &Path, platform: &Platform) -> bool {
    let Some(name) = dir.file_name().map(|n| n.to_string_lossy().to_lowercase()) else {
        return false;
    };
    name == platform.id().to_lowercase() || name == platform.display_name().to_lowercase()
}

fn exporter_in(dir: &Path) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    files.into_iter().find(|p| {
        p.file_stem()
            .map(|s| s.to_string_lossy().ends_with(EXPORTER_SUFFIX))
            .unwrap_or(false)
    })
}

/// An exporter implemented by an external executable.
#[derive(Debug, Clone)]
pub struct ContributedExporter {
    program: PathBuf,
    name: String,
}

impl ContributedExporter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| EXPORTER_SUFFIX.to_string());
        Self { program, name }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Exporter for ContributedExporter {
    fn name(&self) -> &str {
        &self.name
    }

    fn export_solution(
        &self,
        project: &ResolvedProject,
        from: &Path,
        to: &Path,
        platform: &Platform,
        vr_api: VrApi,
        _options: &ExportOptions,
    ) -> Result<()> {
        info!("Creating {} project files with {}", platform.display_name(), self.name);

        let payload = serde_json::to_vec(project).map_err(|e| TrellisError::Build {
            message: format!("Failed to serialise project for {}: {}", self.name, e),
            help: None,
        })?;

        let mut command = Command::new(&self.program);
        command
            .arg(from)
            .arg(to)
            .arg(platform.id())
            .arg(vr_api.name())
            .current_dir(from);

        run_tool(&mut command, &self.name, Some(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_find_by_display_name() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Xbox One/XboxOneExporter"));

        let found = find_contributed(dir.path(), &Platform::XboxOne).unwrap();
        assert_eq!(found, dir.path().join("Xbox One/XboxOneExporter"));
    }

    #[test]
    fn test_find_by_id_ignores_case() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("DREAMCAST/DreamcastExporter.py"));

        assert!(find_contributed(dir.path(), &Platform::from_id("dreamcast")).is_some());
    }

    #[test]
    fn test_first_exporter_file_wins() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("switch/README.md"));
        touch(&dir.path().join("switch/BExporter"));
        touch(&dir.path().join("switch/AExporter"));

        let found = find_contributed(dir.path(), &Platform::Switch).unwrap();
        assert_eq!(found, dir.path().join("switch/AExporter"));
    }

    #[test]
    fn test_no_matching_directory() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("switch/SwitchExporter"));

        assert!(find_contributed(dir.path(), &Platform::Ps4).is_none());
        assert!(find_contributed(&dir.path().join("missing"), &Platform::Switch).is_none());
    }

    #[test]
    fn test_directory_without_exporter() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("ps4/krafix/krafix-ps4"));

        assert!(find_contributed(dir.path(), &Platform::Ps4).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_contributed_exporter_receives_project() {
        use crate::export::tests::sample_project;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let from = dir.path().join("game");
        let to = dir.path().join("build");
        fs::create_dir_all(&from).unwrap();
        fs::create_dir_all(&to).unwrap();

        let program = dir.path().join("Ps4Exporter");
        fs::write(
            &program,
            "#!/bin/sh\necho \"$3 $4\" > \"$2/args.txt\"\ncat > \"$2/project.json\"\n",
        )
        .unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let exporter = ContributedExporter::new(&program);
        let project = sample_project(&["Sources/main.cpp"]);
        let options = ExportOptions::new(&from, &to, Platform::Ps4);

        exporter
            .export_solution(&project, &from, &to, &Platform::Ps4, VrApi::None, &options)
            .unwrap();

        assert_eq!(fs::read_to_string(to.join("args.txt")).unwrap(), "ps4 none\n");
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(to.join("project.json")).unwrap()).unwrap();
        assert_eq!(json["name"], "game");
        assert_eq!(json["files"][0]["relative_path"], "Sources/main.cpp");
    }

    #[cfg(unix)]
    #[test]
    fn test_contributed_exporter_failure() {
        use crate::export::tests::sample_project;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let program = dir.path().join("FailingExporter");
        fs::write(&program, "#!/bin/sh\necho 'no toolchain' >&2\nexit 4\n").unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let exporter = ContributedExporter::new(&program);
        let options = ExportOptions::new(dir.path(), dir.path(), Platform::Switch);
        let err = exporter
            .export_solution(
                &sample_project(&[]),
                dir.path(),
                dir.path(),
                &Platform::Switch,
                VrApi::None,
                &options,
            )
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
    }
}
