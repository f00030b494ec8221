//! The export pipeline.
//!
//! Load the project tree, flatten it, resolve files, compile shaders,
//! resolve again to pick up generated sources, then hand the result to the
//! platform's exporter. Every call recomputes everything from disk.

use std::fs;
use std::path::Path;

use glob::Pattern;
use tracing::{error, info};

use crate::config::ExportOptions;
use crate::error::{Result, TrellisError};
use crate::export::{ExporterRegistry, ResolvedProject};
use crate::graph::{flatten, FlattenedProject};
use crate::native;
use crate::platform::Platform;
use crate::project::{load_project, slash_path, FileOptions, ProjectGraph, ProjectId};
use crate::resolve::{resolve, ResolvedFile};
use crate::shader::{self, CompiledShaderRef, BACKENDS_DIR};

/// What an export produced.
#[derive(Debug)]
pub struct ExportOutcome {
    /// The project as handed to the exporter (or as resolved after shader
    /// compilation when only shaders were compiled).
    pub project: ResolvedProject,
    /// Compiled shaders in discovery order.
    pub shaders: Vec<CompiledShaderRef>,
    /// Name of the exporter that ran, if any.
    pub exporter: Option<String>,
}

/// Export with the built-in exporters.
pub fn export_project(options: &ExportOptions) -> Result<ExportOutcome> {
    export_project_with(options, &ExporterRegistry::with_builtins())
}

/// Export, selecting the backend from `registry`.
///
/// `from`, `to` and the toolchain directory may be relative; they are
/// resolved against the current directory before anything runs.
pub fn export_project_with(
    options: &ExportOptions,
    registry: &ExporterRegistry,
) -> Result<ExportOutcome> {
    let options = &options.clone().with_absolute_paths()?;
    let platform = &options.platform;
    if options.only_shaders {
        info!(platform = %platform, "Only compiling shaders");
    } else {
        info!(platform = %platform, "Creating {} project files", platform.display_name());
    }

    let (mut graph, root) = stage(platform, "load", load_project(&options.from, platform))?;

    // Entry-point dialects compile into generated sources that the second
    // pass must find.
    let generates_sources = shader::dialect(platform, options.graphics_api)
        .map(|d| d.uses_entry_points())
        .unwrap_or(false);
    if generates_sources && !options.no_shaders {
        add_generated_sources(&mut graph, root, &options.generated_sources_dir());
    }

    let (flat, files) = stage(platform, "resolve", resolve_pass(&graph, root))?;

    fs::create_dir_all(&options.to).map_err(|e| TrellisError::io(&options.to, e))?;

    let shaders = if options.no_shaders {
        Vec::new()
    } else {
        stage(
            platform,
            "shaders",
            shader::compile_all(&files, &flat.debug_dir_path(), options),
        )?
    };

    if options.only_shaders {
        return Ok(ExportOutcome {
            project: ResolvedProject::new(&flat, files),
            shaders,
            exporter: None,
        });
    }

    let (flat, files) = stage(platform, "resolve", resolve_pass(&graph, root))?;
    let project = ResolvedProject::new(&flat, files);

    let exporter = stage(
        platform,
        "select",
        registry.select(platform, &options.from.join(BACKENDS_DIR)),
    )?;
    info!(platform = %platform, exporter = exporter.name(), stage = "export", "exporting");
    stage(
        platform,
        "export",
        exporter.export_solution(
            &project,
            &options.from,
            &options.to,
            platform,
            options.vr_api,
            options,
        ),
    )?;

    Ok(ExportOutcome {
        project,
        shaders,
        exporter: Some(exporter.name().to_string()),
    })
}

/// Export, then build and run as requested by `options`.
pub fn run(options: &ExportOptions) -> Result<ExportOutcome> {
    let outcome = export_project(options)?;

    if outcome.exporter.is_some() && options.compile {
        let platform = &options.platform;
        stage(platform, "compile", native::compile(&outcome.project, options))?;
        if options.run {
            stage(platform, "run", native::run(&outcome.project, options))?;
        }
    }

    Ok(outcome)
}

/// Load, flatten and resolve the project without compiling or exporting.
pub fn resolve_project(from: &Path, platform: &Platform) -> Result<ResolvedProject> {
    let (graph, root) = stage(platform, "load", load_project(from, platform))?;
    let (flat, files) = stage(platform, "resolve", resolve_pass(&graph, root))?;
    Ok(ResolvedProject::new(&flat, files))
}

/// Log a failed stage with its context before handing the error on.
fn stage<T>(platform: &Platform, stage: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        error!(platform = %platform, stage = %stage, error = %err, "export failed");
    }
    result
}

fn resolve_pass(graph: &ProjectGraph, root: ProjectId) -> Result<(FlattenedProject, Vec<ResolvedFile>)> {
    let flat = flatten(graph, root)?;
    let files = resolve(&flat.file_set, &flat.dir)?;
    Ok((flat, files))
}

fn add_generated_sources(graph: &mut ProjectGraph, root: ProjectId, dir: &Path) {
    let pattern = format!("{}/*", Pattern::escape(&slash_path(dir)));
    graph.get_mut(root).add_file(pattern, FileOptions::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::PROJECT_FILENAME;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn write(base: &Path, relative: &str, content: &str) {
        let path = base.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn relative_paths(project: &ResolvedProject) -> Vec<&str> {
        project.files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn test_export_linux_project() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("game");
        write(
            &from,
            PROJECT_FILENAME,
            "name: game\nfiles: [Sources/**]\nsub_projects: [engine]\n",
        );
        write(&from, "Sources/main.cpp", "");
        write(
            &from,
            "engine/trellis.yaml",
            "name: engine\nkind: static-library\nlibraries: [m]\nfiles: [Sources/*.c]\n",
        );
        write(&from, "engine/Sources/core.c", "");

        let to = dir.path().join("build");
        let mut options = ExportOptions::new(&from, &to, Platform::Linux);
        options.no_shaders = true;

        let outcome = export_project(&options).unwrap();

        assert_eq!(outcome.exporter.as_deref(), Some("Makefile"));
        assert_eq!(
            relative_paths(&outcome.project),
            vec!["Sources/main.cpp", "engine/Sources/core.c"]
        );
        assert_eq!(outcome.project.libraries, vec!["m".to_string()]);
        assert!(to.join("Release/Makefile").is_file());
    }

    #[test]
    fn test_resolve_project_applies_platform_section() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            PROJECT_FILENAME,
            "name: game\nfiles: [Sources/*.cpp]\nplatforms:\n  linux:\n    libraries: [X11]\n    files: [Backends/Linux/*.cpp]\n",
        );
        write(dir.path(), "Sources/main.cpp", "");
        write(dir.path(), "Backends/Linux/window.cpp", "");

        let linux = resolve_project(dir.path(), &Platform::Linux).unwrap();
        assert_eq!(
            relative_paths(&linux),
            vec!["Sources/main.cpp", "Backends/Linux/window.cpp"]
        );
        assert_eq!(linux.libraries, vec!["X11".to_string()]);

        let windows = resolve_project(dir.path(), &Platform::Windows).unwrap();
        assert_eq!(relative_paths(&windows), vec!["Sources/main.cpp"]);
    }

    #[test]
    fn test_cycle_aborts_before_output() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("game");
        write(&from, PROJECT_FILENAME, "name: game\nsub_projects: [engine]\n");
        write(&from, "engine/trellis.yaml", "name: engine\nsub_projects: [..]\n");

        let to = dir.path().join("build");
        let options = ExportOptions::new(&from, &to, Platform::Linux);

        let err = export_project(&options).unwrap_err();
        assert!(matches!(err, TrellisError::Cycle(_)));
        assert!(!to.exists());
    }

    #[test]
    fn test_unknown_platform_has_no_exporter() {
        let dir = tempdir().unwrap();
        write(dir.path(), PROJECT_FILENAME, "name: game\n");

        let mut options =
            ExportOptions::new(dir.path(), dir.path().join("build"), Platform::from_id("dreamcast"));
        options.no_shaders = true;

        let err = export_project(&options).unwrap_err();
        assert!(matches!(err, TrellisError::NoExporterFound { .. }));
    }

    #[test]
    fn test_missing_project_file() {
        let dir = tempdir().unwrap();
        let options = ExportOptions::new(dir.path(), dir.path().join("build"), Platform::Linux);

        let err = export_project(&options).unwrap_err();
        assert!(matches!(err, TrellisError::Configuration { .. }));
    }

    /// Log output collected in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_failed_stage_is_logged_with_context() {
        let dir = tempdir().unwrap();
        let options = ExportOptions::new(dir.path(), dir.path().join("build"), Platform::Linux);

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let err = tracing::subscriber::with_default(subscriber, || export_project(&options))
            .unwrap_err();

        assert!(matches!(err, TrellisError::Configuration { .. }));
        let text = logs.text();
        assert!(text.contains("export failed"), "{}", text);
        assert!(text.contains("platform=linux"), "{}", text);
        assert!(text.contains("stage=load"), "{}", text);
    }

    /// `path` spelled relative to the current directory.
    fn relative_to_cwd(path: &Path) -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        relative.join(path.strip_prefix("/").unwrap())
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_paths_reach_contributed_exporter() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let from = root.join("game");
        let to = root.join("out");
        write(&from, PROJECT_FILENAME, "name: game
");

        let program = from.join("Backends/dreamcast/DreamcastExporter");
        write(
            &from,
            "Backends/dreamcast/DreamcastExporter",
            "#!/bin/sh\necho \"$1\" > \"$2/marker\"\n",
        );
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        fs::create_dir_all(&to).unwrap();

        let mut options = ExportOptions::new(
            relative_to_cwd(&from),
            relative_to_cwd(&to),
            Platform::from_id("dreamcast"),
        );
        options.no_shaders = true;
        assert!(options.from.is_relative());

        let outcome = export_project(&options).unwrap();

        assert_eq!(outcome.exporter.as_deref(), Some("DreamcastExporter"));
        let marker = fs::read_to_string(to.join("marker")).unwrap();
        assert_eq!(marker.trim(), from.display().to_string());
        assert!(!from.join(&options.to).exists());
    }

    #[cfg(unix)]
    mod shaders {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn install_compiler(toolchain: &Path) {
            let path = toolchain.join("Tools/krafix/krafix");
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "#!/bin/sh\necho \"// $1\" > \"$3\"\n").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn shader_project(dir: &Path) -> PathBuf {
            let from = dir.join("game");
            write(
                &from,
                PROJECT_FILENAME,
                "name: game\nfiles: [Sources/**, Shaders/*.glsl]\n",
            );
            write(&from, "Sources/main.mm", "");
            write(&from, "Shaders/blur.frag.glsl", "");
            from
        }

        #[test]
        fn test_metal_outputs_found_by_second_pass() {
            let dir = tempdir().unwrap();
            let toolchain = dir.path().join("toolchain");
            install_compiler(&toolchain);
            let from = shader_project(dir.path());

            let to = from.join("build");
            let options = ExportOptions::new(&from, &to, Platform::Osx).with_toolchain_dir(&toolchain);

            let outcome = export_project(&options).unwrap();

            assert_eq!(outcome.shaders.len(), 1);
            assert_eq!(outcome.exporter.as_deref(), Some("Xcode"));
            assert_eq!(
                relative_paths(&outcome.project),
                vec!["Sources/main.mm", "Shaders/blur.frag.glsl", "build/Sources/blur.frag.metal"]
            );
            assert_eq!(
                fs::read_to_string(from.join("Deployment/blur.frag")).unwrap(),
                ">blur_frag_main"
            );
            assert!(to.join("CMakeLists.txt").is_file());
        }

        #[test]
        fn test_only_shaders_skips_export() {
            let dir = tempdir().unwrap();
            let toolchain = dir.path().join("toolchain");
            install_compiler(&toolchain);
            let from = shader_project(dir.path());

            let to = dir.path().join("build");
            let mut options =
                ExportOptions::new(&from, &to, Platform::Linux).with_toolchain_dir(&toolchain);
            options.only_shaders = true;

            let outcome = export_project(&options).unwrap();

            assert!(outcome.exporter.is_none());
            assert_eq!(
                fs::read_to_string(from.join("Deployment/blur.frag")).unwrap(),
                "// glsl\n"
            );
            assert!(!to.join("Release/Makefile").exists());
        }
    }
}
