//! CMake-based backends: Xcode projects for Apple platforms and Gradle
//! projects with a CMake native build for Android.

use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use crate::config::ExportOptions;
use crate::error::Result;
use crate::platform::{Platform, VrApi};
use crate::project::{slash_path, TargetKind};

use super::{write_file, Exporter, ResolvedProject, SourceKind};

/// Options for one generated `CMakeLists.txt`.
struct CMakeTarget<'a> {
    system_name: Option<&'a str>,
    languages: &'a str,
    /// Applications become shared libraries (loaded by a host activity).
    application_as_shared: bool,
    bundle: bool,
}

fn cmake_lists(project: &ResolvedProject, target: &CMakeTarget<'_>, debug: bool) -> String {
    let name = &project.name;
    let mut out = String::new();

    let _ = writeln!(out, "cmake_minimum_required(VERSION 3.10)");
    if let Some(system) = target.system_name {
        let _ = writeln!(out, "set(CMAKE_SYSTEM_NAME {})", system);
    }
    let _ = writeln!(out, "project({} {})", name, target.languages);
    let _ = writeln!(out, "set(CMAKE_CXX_STANDARD 17)");
    let _ = writeln!(
        out,
        "set(CMAKE_BUILD_TYPE {})",
        if debug { "Debug" } else { "Release" }
    );
    out.push('\n');

    let _ = writeln!(out, "set(SOURCES");
    for file in project.files.iter().filter(|f| {
        let kind = SourceKind::of(&f.absolute_path);
        kind.is_compiled() || kind == SourceKind::Header
    }) {
        let _ = writeln!(out, "  \"{}\"", slash_path(&file.absolute_path));
    }
    let _ = writeln!(out, ")");
    out.push('\n');

    let declaration = match project.kind {
        TargetKind::StaticLibrary => format!("add_library({} STATIC ${{SOURCES}})", name),
        TargetKind::DynamicLibrary => format!("add_library({} SHARED ${{SOURCES}})", name),
        TargetKind::Application if target.application_as_shared => {
            format!("add_library({} SHARED ${{SOURCES}})", name)
        }
        TargetKind::Application if target.bundle => {
            format!("add_executable({} MACOSX_BUNDLE ${{SOURCES}})", name)
        }
        TargetKind::Application => format!("add_executable({} ${{SOURCES}})", name),
    };
    let _ = writeln!(out, "{}", declaration);

    if !project.defines.is_empty() {
        let _ = writeln!(
            out,
            "target_compile_definitions({} PRIVATE {})",
            name,
            project.defines.join(" ")
        );
    }

    let includes = project.include_paths();
    if !includes.is_empty() {
        let quoted: Vec<String> = includes.iter().map(|i| format!("\"{}\"", i)).collect();
        let _ = writeln!(
            out,
            "target_include_directories({} PRIVATE {})",
            name,
            quoted.join(" ")
        );
    }

    if !project.libraries.is_empty() {
        let _ = writeln!(
            out,
            "target_link_libraries({} PRIVATE {})",
            name,
            project.libraries.join(" ")
        );
    }

    // IDE groups mirror the directory layout unless a file opts out.
    for file in project.files.iter().filter(|f| !f.options.no_filter) {
        if let Some((group, _)) = file.relative_path.rsplit_once('/') {
            let _ = writeln!(
                out,
                "source_group(\"{}\" FILES \"{}\")",
                group.replace('/', "\\\\"),
                slash_path(&file.absolute_path)
            );
        }
    }

    out
}

/// Xcode projects (through CMake's Xcode generator) for iOS, macOS and tvOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct XCodeExporter;

impl XCodeExporter {
    pub fn render(&self, project: &ResolvedProject, platform: &Platform, debug: bool) -> String {
        let system_name = match platform {
            Platform::Ios => Some("iOS"),
            Platform::TvOs => Some("tvOS"),
            _ => None,
        };
        cmake_lists(
            project,
            &CMakeTarget {
                system_name,
                languages: "C CXX OBJC OBJCXX",
                application_as_shared: false,
                bundle: true,
            },
            debug,
        )
    }
}

impl Exporter for XCodeExporter {
    fn name(&self) -> &str {
        "Xcode"
    }

    fn export_solution(
        &self,
        project: &ResolvedProject,
        _from: &Path,
        to: &Path,
        platform: &Platform,
        _vr_api: VrApi,
        options: &ExportOptions,
    ) -> Result<()> {
        info!("Creating {} project files", platform.display_name());
        write_file(
            &to.join("CMakeLists.txt"),
            &self.render(project, platform, options.debug),
        )
    }
}

/// Android Studio (Gradle) projects with a CMake native build.
#[derive(Debug, Clone, Copy, Default)]
pub struct AndroidExporter;

const GRADLEW: &str = "#!/bin/sh\nexec gradle \"$@\"\n";

impl AndroidExporter {
    fn app_gradle(&self, project: &ResolvedProject, vr_api: VrApi) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "apply plugin: 'com.android.application'");
        out.push('\n');
        let _ = writeln!(out, "android {{");
        let _ = writeln!(out, "    compileSdkVersion 33");
        let _ = writeln!(out, "    defaultConfig {{");
        let _ = writeln!(out, "        applicationId \"tech.trellis.{}\"", package_segment(&project.name));
        let _ = writeln!(out, "        minSdkVersion 21");
        let _ = writeln!(out, "        targetSdkVersion 33");
        if vr_api != VrApi::None {
            let _ = writeln!(out, "        manifestPlaceholders = [vrApi: \"{}\"]", vr_api.name());
        }
        let _ = writeln!(out, "        externalNativeBuild {{");
        let _ = writeln!(out, "            cmake {{");
        let _ = writeln!(out, "                arguments \"-DANDROID_STL=c++_static\"");
        let _ = writeln!(out, "            }}");
        let _ = writeln!(out, "        }}");
        let _ = writeln!(out, "    }}");
        let _ = writeln!(out, "    externalNativeBuild {{");
        let _ = writeln!(out, "        cmake {{");
        let _ = writeln!(out, "            path \"src/main/cpp/CMakeLists.txt\"");
        let _ = writeln!(out, "        }}");
        let _ = writeln!(out, "    }}");
        let _ = writeln!(out, "    sourceSets {{");
        let _ = writeln!(out, "        main {{");
        let _ = writeln!(
            out,
            "            assets.srcDirs = ['{}']",
            slash_path(&project.debug_dir)
        );
        let _ = writeln!(out, "        }}");
        let _ = writeln!(out, "    }}");
        let _ = writeln!(out, "}}");
        out
    }

    fn manifest(&self, project: &ResolvedProject) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <manifest xmlns:android=\"http://schemas.android.com/apk/res/android\" package=\"tech.trellis.{package}\">\n\
             \x20   <application android:label=\"{name}\" android:hasCode=\"false\">\n\
             \x20       <activity android:name=\"android.app.NativeActivity\" android:exported=\"true\">\n\
             \x20           <meta-data android:name=\"android.app.lib_name\" android:value=\"{name}\" />\n\
             \x20           <intent-filter>\n\
             \x20               <action android:name=\"android.intent.action.MAIN\" />\n\
             \x20               <category android:name=\"android.intent.category.LAUNCHER\" />\n\
             \x20           </intent-filter>\n\
             \x20       </activity>\n\
             \x20   </application>\n\
             </manifest>\n",
            package = package_segment(&project.name),
            name = project.name,
        )
    }

    pub fn render_cmake(&self, project: &ResolvedProject, debug: bool) -> String {
        cmake_lists(
            project,
            &CMakeTarget {
                system_name: None,
                languages: "C CXX",
                application_as_shared: true,
                bundle: false,
            },
            debug,
        )
    }
}

/// Lowercase identifier usable as a Java package segment.
fn package_segment(name: &str) -> String {
    let segment: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();
    if segment.is_empty() || segment.starts_with(|c: char| c.is_ascii_digit()) {
        format!("app{}", segment)
    } else {
        segment
    }
}

impl Exporter for AndroidExporter {
    fn name(&self) -> &str {
        "Android"
    }

    fn export_solution(
        &self,
        project: &ResolvedProject,
        _from: &Path,
        to: &Path,
        platform: &Platform,
        vr_api: VrApi,
        options: &ExportOptions,
    ) -> Result<()> {
        info!("Creating {} project files", platform.display_name());

        let root = to.join(&project.name);
        write_file(
            &root.join("settings.gradle"),
            &format!("rootProject.name = '{}'\ninclude ':app'\n", project.name),
        )?;
        write_file(
            &root.join("build.gradle"),
            "buildscript {\n    repositories {\n        google()\n        mavenCentral()\n    }\n    dependencies {\n        classpath 'com.android.tools.build:gradle:7.4.2'\n    }\n}\n\nallprojects {\n    repositories {\n        google()\n        mavenCentral()\n    }\n}\n",
        )?;
        write_file(&root.join("gradlew"), GRADLEW)?;
        write_file(&root.join("app/build.gradle"), &self.app_gradle(project, vr_api))?;
        write_file(
            &root.join("app/src/main/AndroidManifest.xml"),
            &self.manifest(project),
        )?;
        write_file(
            &root.join("app/src/main/cpp/CMakeLists.txt"),
            &self.render_cmake(project, options.debug),
        )
    }
}
