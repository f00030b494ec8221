//! Makefile backends (Linux, Raspberry Pi, Emscripten, Tizen).

use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use crate::config::ExportOptions;
use crate::error::Result;
use crate::platform::{Platform, VrApi};
use crate::project::{slash_path, TargetKind};

use super::{write_file, Exporter, ResolvedProject, SourceKind};

/// Which toolchain the makefile drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MakefileVariant {
    Linux,
    Emscripten,
    Tizen,
}

/// Writes `<to>/<Debug|Release>/Makefile`.
#[derive(Debug, Clone)]
pub struct MakefileExporter {
    variant: MakefileVariant,
}

impl MakefileExporter {
    pub fn linux() -> Self {
        Self {
            variant: MakefileVariant::Linux,
        }
    }

    pub fn emscripten() -> Self {
        Self {
            variant: MakefileVariant::Emscripten,
        }
    }

    pub fn tizen() -> Self {
        Self {
            variant: MakefileVariant::Tizen,
        }
    }

    pub fn variant(&self) -> MakefileVariant {
        self.variant
    }

    fn compilers(&self) -> (&'static str, &'static str) {
        match self.variant {
            MakefileVariant::Linux => ("gcc", "g++"),
            MakefileVariant::Emscripten => ("emcc", "em++"),
            MakefileVariant::Tizen => ("i386-linux-gnueabi-gcc", "i386-linux-gnueabi-g++"),
        }
    }

    fn binary_name(&self, project: &ResolvedProject) -> String {
        match (project.kind, self.variant) {
            (TargetKind::StaticLibrary, _) => format!("lib{}.a", project.name),
            (TargetKind::DynamicLibrary, _) => format!("lib{}.so", project.name),
            (TargetKind::Application, MakefileVariant::Emscripten) => {
                format!("{}.html", project.name)
            }
            (TargetKind::Application, _) => project.name.clone(),
        }
    }

    /// Render the makefile text.
    pub fn render(&self, project: &ResolvedProject, debug: bool) -> String {
        let (cc, cxx) = self.compilers();
        let binary = self.binary_name(project);
        let mut out = String::new();

        let _ = writeln!(out, "# Generated by trellis for {}", project.name);
        let _ = writeln!(out, "CC ?= {}", cc);
        let _ = writeln!(out, "CXX ?= {}", cxx);
        let _ = writeln!(
            out,
            "OPT = {}",
            if debug { "-g -O0" } else { "-O2" }
        );

        let defines: Vec<String> = project.defines.iter().map(|d| format!("-D{}", d)).collect();
        let _ = writeln!(out, "DEFINES = {}", defines.join(" "));

        let includes: Vec<String> = project
            .include_paths()
            .iter()
            .map(|dir| format!("-I\"{}\"", dir))
            .collect();
        let _ = writeln!(out, "INCLUDES = {}", includes.join(" "));

        let libs: Vec<String> = project.libraries.iter().map(|l| format!("-l{}", l)).collect();
        let _ = writeln!(out, "LIBS = {}", libs.join(" "));
        out.push('\n');

        let sources: Vec<_> = project.compiled_sources().collect();
        let objects: Vec<String> = sources
            .iter()
            .map(|f| object_name(&f.relative_path))
            .collect();
        let _ = writeln!(out, "OBJECTS = {}", objects.join(" "));
        out.push('\n');

        let _ = writeln!(out, "{}: $(OBJECTS)", binary);
        let link = match project.kind {
            TargetKind::StaticLibrary => format!("\tar rcs {} $(OBJECTS)", binary),
            TargetKind::DynamicLibrary => {
                format!("\t$(CXX) -shared $(OPT) $(OBJECTS) -o {} $(LIBS)", binary)
            }
            TargetKind::Application => format!("\t$(CXX) $(OPT) $(OBJECTS) -o {} $(LIBS)", binary),
        };
        let _ = writeln!(out, "{}", link);

        for (file, object) in sources.iter().zip(&objects) {
            let source = slash_path(&file.absolute_path);
            let compiler = match SourceKind::of(&file.absolute_path) {
                SourceKind::C | SourceKind::ObjC => "$(CC)",
                _ => "$(CXX)",
            };
            out.push('\n');
            let _ = writeln!(out, "{}: \"{}\"", object, source);
            let _ = writeln!(
                out,
                "\t{} $(OPT) $(DEFINES) $(INCLUDES) -c \"{}\" -o {}",
                compiler, source, object
            );
        }

        out.push('\n');
        let _ = writeln!(out, ".PHONY: clean");
        let _ = writeln!(out, "clean:");
        let _ = writeln!(out, "\trm -f $(OBJECTS) {}", binary);

        out
    }
}

/// Object file name for a source, unique per relative path.
fn object_name(relative: &str) -> String {
    let stem = relative
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(relative);
    let flat: String = stem
        .split('/')
        .map(|part| if part == ".." { "up" } else { part })
        .collect::<Vec<_>>()
        .join("_");
    format!("{}.o", flat.trim_start_matches('_'))
}

impl Exporter for MakefileExporter {
    fn name(&self) -> &str {
        match self.variant {
            MakefileVariant::Linux => "Makefile",
            MakefileVariant::Emscripten => "Emscripten",
            MakefileVariant::Tizen => "Tizen",
        }
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

        let path = to.join(options.configuration()).join("Makefile");
        write_file(&path, &self.render(project, options.debug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_project;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_object_name() {
        assert_eq!(object_name("Sources/main.cpp"), "Sources_main.o");
        assert_eq!(object_name("../shared/util.c"), "up_shared_util.o");
        assert_eq!(object_name("/opt/lib/x.c"), "opt_lib_x.o");
    }

    #[test]
    fn test_render_linux() {
        let project = sample_project(&["Sources/main.cpp", "Sources/main.h", "Sources/util.c"]);
        let makefile = MakefileExporter::linux().render(&project, false);

        insta::assert_snapshot!(makefile, @r###"
        # Generated by trellis for game
        CC ?= gcc
        CXX ?= g++
        OPT = -O2
        DEFINES = -DSYS_LINUX -DNDEBUG
        INCLUDES = -I"/game/Sources" -I"/game/engine/Sources"
        LIBS = -lpthread -lGL

        OBJECTS = Sources_main.o Sources_util.o

        game: $(OBJECTS)
        	$(CXX) $(OPT) $(OBJECTS) -o game $(LIBS)

        Sources_main.o: "/game/Sources/main.cpp"
        	$(CXX) $(OPT) $(DEFINES) $(INCLUDES) -c "/game/Sources/main.cpp" -o Sources_main.o

        Sources_util.o: "/game/Sources/util.c"
        	$(CC) $(OPT) $(DEFINES) $(INCLUDES) -c "/game/Sources/util.c" -o Sources_util.o

        .PHONY: clean
        clean:
        	rm -f $(OBJECTS) game
        "###);
    }

    #[test]
    fn test_emscripten_links_html() {
        let project = sample_project(&["Sources/main.cpp"]);
        let makefile = MakefileExporter::emscripten().render(&project, true);

        assert!(makefile.contains("CXX ?= em++"));
        assert!(makefile.contains("OPT = -g -O0"));
        assert!(makefile.contains("game.html: $(OBJECTS)"));
    }

    #[test]
    fn test_static_library() {
        let mut project = sample_project(&["Sources/lib.c"]);
        project.kind = TargetKind::StaticLibrary;

        let makefile = MakefileExporter::linux().render(&project, false);
        assert!(makefile.contains("\tar rcs libgame.a $(OBJECTS)"));
    }

    #[test]
    fn test_export_writes_configuration_dir() {
        let dir = tempdir().unwrap();
        let project = sample_project(&["Sources/main.cpp"]);
        let mut options = ExportOptions::new(dir.path(), dir.path().join("build"), Platform::Linux);
        options.debug = true;

        MakefileExporter::linux()
            .export_solution(
                &project,
                dir.path(),
                &options.to,
                &Platform::Linux,
                VrApi::None,
                &options,
            )
            .unwrap();

        let written = fs::read_to_string(dir.path().join("build/Debug/Makefile")).unwrap();
        assert!(written.starts_with("# Generated by trellis for game"));
    }
}
