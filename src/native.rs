//! Native build step: runs the platform's build tool on exported files,
//! copies the binary into the debug directory, and optionally starts it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::config::ExportOptions;
use crate::error::{Result, TrellisError};
use crate::export::ResolvedProject;
use crate::platform::Platform;
use crate::process::run_tool;

/// One build tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

impl ToolInvocation {
    fn new(program: &str, args: &[&str], dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            dir: dir.into(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(&self.dir);
        command
    }
}

/// Number of parallel make jobs.
fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// The tool invocations that build `project` for the configured platform,
/// or `None` when building is not supported for it.
pub fn build_commands(project: &ResolvedProject, options: &ExportOptions) -> Option<Vec<ToolInvocation>> {
    let to = &options.to;
    let config = options.configuration();

    let commands = match options.platform {
        Platform::Linux => {
            let jobs = cpu_count().to_string();
            vec![ToolInvocation::new("make", &["-j", &jobs], to.join(config))]
        }
        Platform::Pi => vec![ToolInvocation::new("make", &[], to.join(config))],
        Platform::Osx | Platform::Ios => {
            let xcodeproj = format!("{}.xcodeproj", project.name);
            vec![
                ToolInvocation::new("cmake", &["-G", "Xcode", "."], to),
                ToolInvocation::new(
                    "xcodebuild",
                    &["-configuration", config, "-project", &xcodeproj],
                    to,
                ),
            ]
        }
        Platform::Windows | Platform::WindowsApp => {
            let vcxproj = format!("{}.vcxproj", project.name);
            let properties = format!("/p:Configuration={},Platform=x64", config);
            vec![ToolInvocation::new(
                "MSBuild.exe",
                &[&vcxproj, "/m", "/clp:ErrorsOnly", &properties],
                to,
            )]
        }
        Platform::Android => {
            let task = format!("assemble{}", config);
            let dir = to.join(&project.name);
            if cfg!(windows) {
                vec![ToolInvocation::new("gradlew.bat", &[&task], dir)]
            } else {
                vec![ToolInvocation::new("bash", &["gradlew", &task], dir)]
            }
        }
        _ => return None,
    };

    Some(commands)
}

/// Build the exported project, then copy the binary into the debug dir.
pub fn compile(project: &ResolvedProject, options: &ExportOptions) -> Result<()> {
    let options = &options.clone().with_absolute_paths()?;
    let Some(commands) = build_commands(project, options) else {
        warn!(platform = %options.platform, "--compile not yet implemented for this platform");
        return Ok(());
    };

    for invocation in &commands {
        info!(stage = "compile", tool = %invocation.program, "running build tool");
        run_tool(&mut invocation.command(), &invocation.program, None)?;
    }

    if let Some((built, name)) = built_binary(project, options) {
        let target = project.debug_dir.join(name);
        fs::create_dir_all(&project.debug_dir)
            .map_err(|e| TrellisError::io(&project.debug_dir, e))?;
        fs::copy(&built, &target).map_err(|e| TrellisError::io(&built, e))?;
        info!(binary = %target.display(), "copied build output");
    }

    Ok(())
}

/// Built binary and its file name, for platforms whose binary is copied.
fn built_binary(project: &ResolvedProject, options: &ExportOptions) -> Option<(PathBuf, String)> {
    let config = options.configuration();
    match options.platform {
        Platform::Linux => Some((options.to.join(config).join(&project.name), project.name.clone())),
        Platform::Windows => {
            let name = format!("{}.exe", project.name);
            Some((options.to.join("x64").join(config).join(&name), name))
        }
        _ => None,
    }
}

/// How to start the built program, or `None` when running is unsupported.
pub fn run_command(project: &ResolvedProject, options: &ExportOptions) -> Option<ToolInvocation> {
    match options.platform {
        Platform::Linux => {
            let binary = project.debug_dir.join(&project.name);
            Some(ToolInvocation::new(&binary.to_string_lossy(), &[], &project.debug_dir))
        }
        Platform::Windows => {
            let binary = project.debug_dir.join(format!("{}.exe", project.name));
            Some(ToolInvocation::new(&binary.to_string_lossy(), &[], &project.debug_dir))
        }
        Platform::Osx => {
            let app = Path::new("build")
                .join("Release")
                .join(format!("{}.app", project.name))
                .join("Contents")
                .join("MacOS")
                .join(&project.name);
            Some(ToolInvocation::new("open", &[&app.to_string_lossy()], &options.to))
        }
        _ => None,
    }
}

/// Start the built program with inherited stdio and wait for it.
pub fn run(project: &ResolvedProject, options: &ExportOptions) -> Result<()> {
    let options = &options.clone().with_absolute_paths()?;
    let Some(invocation) = run_command(project, options) else {
        warn!(platform = %options.platform, "--run not yet implemented for this platform");
        return Ok(());
    };

    info!(stage = "run", program = %invocation.program, "starting");
    let status = invocation.command().status().map_err(|e| TrellisError::Build {
        message: format!("Failed to start {}: {}", invocation.program, e),
        help: Some("Build the project first with --compile".to_string()),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(TrellisError::ExternalTool {
            tool: project.name.clone(),
            code: status.code().unwrap_or(1),
        })
    }
}
