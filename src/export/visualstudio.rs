//! Visual Studio (MSBuild) backend for Windows and Windows App.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::ExportOptions;
use crate::error::Result;
use crate::platform::{Platform, VrApi};
use crate::project::TargetKind;

use super::{write_file, Exporter, ResolvedProject, SourceKind};

const CONFIGURATIONS: [&str; 2] = ["Debug", "Release"];

/// Writes `<to>/<name>.vcxproj` and its `.filters` companion.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualStudioExporter;

impl VisualStudioExporter {
    /// Render the `.vcxproj` file.
    pub fn render_project(&self, project: &ResolvedProject, platform: &Platform) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        let _ = writeln!(
            out,
            "<Project DefaultTargets=\"Build\" ToolsVersion=\"17.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">"
        );

        let _ = writeln!(out, "  <ItemGroup Label=\"ProjectConfigurations\">");
        for config in CONFIGURATIONS {
            let _ = writeln!(out, "    <ProjectConfiguration Include=\"{}|x64\">", config);
            let _ = writeln!(out, "      <Configuration>{}</Configuration>", config);
            let _ = writeln!(out, "      <Platform>x64</Platform>");
            let _ = writeln!(out, "    </ProjectConfiguration>");
        }
        let _ = writeln!(out, "  </ItemGroup>");

        let _ = writeln!(out, "  <PropertyGroup Label=\"Globals\">");
        let _ = writeln!(out, "    <ProjectGuid>{{{}}}</ProjectGuid>", guid(&project.name));
        let _ = writeln!(out, "    <RootNamespace>{}</RootNamespace>", escape(&project.name));
        if *platform == Platform::WindowsApp {
            let _ = writeln!(out, "    <AppContainerApplication>true</AppContainerApplication>");
        }
        let _ = writeln!(out, "  </PropertyGroup>");
        let _ = writeln!(out, "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.Default.props\" />");

        let configuration_type = match project.kind {
            TargetKind::Application => "Application",
            TargetKind::StaticLibrary => "StaticLibrary",
            TargetKind::DynamicLibrary => "DynamicLibrary",
        };
        for config in CONFIGURATIONS {
            let _ = writeln!(
                out,
                "  <PropertyGroup Condition=\"'$(Configuration)|$(Platform)'=='{}|x64'\" Label=\"Configuration\">",
                config
            );
            let _ = writeln!(out, "    <ConfigurationType>{}</ConfigurationType>", configuration_type);
            let _ = writeln!(
                out,
                "    <UseDebugLibraries>{}</UseDebugLibraries>",
                config == "Debug"
            );
            let _ = writeln!(out, "    <PlatformToolset>v143</PlatformToolset>");
            let _ = writeln!(out, "  </PropertyGroup>");
        }
        let _ = writeln!(out, "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.props\" />");

        let _ = writeln!(out, "  <PropertyGroup>");
        let _ = writeln!(
            out,
            "    <LocalDebuggerWorkingDirectory>{}</LocalDebuggerWorkingDirectory>",
            escape(&windows_path(&project.debug_dir.to_string_lossy()))
        );
        let _ = writeln!(out, "  </PropertyGroup>");

        let defines: Vec<String> = project.defines.iter().map(|d| escape(d)).collect();
        let includes: Vec<String> = project
            .include_paths()
            .iter()
            .map(|i| escape(&windows_path(i)))
            .collect();
        let libraries: Vec<String> = project
            .libraries
            .iter()
            .map(|l| {
                if Path::new(l).extension().is_some() {
                    escape(l)
                } else {
                    format!("{}.lib", escape(l))
                }
            })
            .collect();

        let _ = writeln!(out, "  <ItemDefinitionGroup>");
        let _ = writeln!(out, "    <ClCompile>");
        let _ = writeln!(
            out,
            "      <PreprocessorDefinitions>{}%(PreprocessorDefinitions)</PreprocessorDefinitions>",
            joined(&defines)
        );
        let _ = writeln!(
            out,
            "      <AdditionalIncludeDirectories>{}%(AdditionalIncludeDirectories)</AdditionalIncludeDirectories>",
            joined(&includes)
        );
        let _ = writeln!(out, "    </ClCompile>");
        let _ = writeln!(out, "    <Link>");
        let _ = writeln!(
            out,
            "      <AdditionalDependencies>{}%(AdditionalDependencies)</AdditionalDependencies>",
            joined(&libraries)
        );
        let _ = writeln!(out, "    </Link>");
        let _ = writeln!(out, "  </ItemDefinitionGroup>");

        for (element, headers) in [("ClInclude", true), ("ClCompile", false)] {
            let _ = writeln!(out, "  <ItemGroup>");
            for file in &project.files {
                let source_kind = SourceKind::of(&file.absolute_path);
                let matches = if headers {
                    source_kind == SourceKind::Header
                } else {
                    source_kind.is_compiled()
                };
                if matches {
                    let _ = writeln!(
                        out,
                        "    <{} Include=\"{}\" />",
                        element,
                        escape(&windows_path(&file.absolute_path.to_string_lossy()))
                    );
                }
            }
            let _ = writeln!(out, "  </ItemGroup>");
        }

        let _ = writeln!(out, "  <Import Project=\"$(VCTargetsPath)\\Microsoft.Cpp.targets\" />");
        let _ = writeln!(out, "</Project>");
        out
    }

    /// Render the `.vcxproj.filters` file. Files marked `no_filter` stay at
    /// the top level.
    pub fn render_filters(&self, project: &ResolvedProject) -> String {
        let mut filters = BTreeSet::new();
        for file in project.files.iter().filter(|f| !f.options.no_filter) {
            if let Some(dir) = filter_of(&file.relative_path) {
                // Parent filters must be declared too.
                let mut prefix = String::new();
                for part in dir.split('\\') {
                    if !prefix.is_empty() {
                        prefix.push('\\');
                    }
                    prefix.push_str(part);
                    filters.insert(prefix.clone());
                }
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        let _ = writeln!(
            out,
            "<Project ToolsVersion=\"4.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">"
        );

        let _ = writeln!(out, "  <ItemGroup>");
        for filter in &filters {
            let _ = writeln!(out, "    <Filter Include=\"{}\">", escape(filter));
            let _ = writeln!(
                out,
                "      <UniqueIdentifier>{{{}}}</UniqueIdentifier>",
                guid(filter)
            );
            let _ = writeln!(out, "    </Filter>");
        }
        let _ = writeln!(out, "  </ItemGroup>");

        let _ = writeln!(out, "  <ItemGroup>");
        for file in &project.files {
            let element = match SourceKind::of(&file.absolute_path) {
                SourceKind::Header => "ClInclude",
                kind if kind.is_compiled() => "ClCompile",
                _ => continue,
            };
            let path = escape(&windows_path(&file.absolute_path.to_string_lossy()));
            let filter = if file.options.no_filter {
                None
            } else {
                filter_of(&file.relative_path)
            };
            match filter {
                Some(filter) => {
                    let _ = writeln!(out, "    <{} Include=\"{}\">", element, path);
                    let _ = writeln!(out, "      <Filter>{}</Filter>", escape(&filter));
                    let _ = writeln!(out, "    </{}>", element);
                }
                None => {
                    let _ = writeln!(out, "    <{} Include=\"{}\" />", element, path);
                }
            }
        }
        let _ = writeln!(out, "  </ItemGroup>");
        let _ = writeln!(out, "</Project>");
        out
    }
}

impl Exporter for VisualStudioExporter {
    fn name(&self) -> &str {
        "Visual Studio"
    }

    fn export_solution(
        &self,
        project: &ResolvedProject,
        _from: &Path,
        to: &Path,
        platform: &Platform,
        _vr_api: VrApi,
        _options: &ExportOptions,
    ) -> Result<()> {
        info!("Creating {} project files", platform.display_name());

        let vcxproj = to.join(format!("{}.vcxproj", project.name));
        write_file(&vcxproj, &self.render_project(project, platform))?;
        write_file(
            &to.join(format!("{}.vcxproj.filters", project.name)),
            &self.render_filters(project),
        )
    }
}

/// Filter name for a file: its directory, `\`-separated, without `..`.
fn filter_of(relative: &str) -> Option<String> {
    let (dir, _) = relative.rsplit_once('/')?;
    let parts: Vec<&str> = dir
        .split('/')
        .filter(|p| !p.is_empty() && *p != "." && *p != "..")
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\\"))
    }
}

fn joined(items: &[String]) -> String {
    items.iter().map(|i| format!("{};", i)).collect()
}

fn windows_path(path: &str) -> String {
    path.replace('/', "\\")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// GUID-shaped identifier derived from the SHA-256 of `seed`, so it is
/// the same on every machine and toolchain.
fn guid(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let hex: String = digest[..16].iter().map(|b| format!("{:02X}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
