//! Init command implementation.
//!
//! Generates a starter `trellis.yaml` from the source directories found.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use walkdir::WalkDir;

use crate::error::{Result, TrellisError};
use crate::export::SourceKind;
use crate::output::{display_path, plural, Printer};
use crate::project::PROJECT_FILENAME;
use crate::shader::SHADER_SUFFIX;

/// Directories that hold generated output, never sources.
const SKIPPED_DIRS: [&str; 3] = ["build", "Deployment", "Backends"];

/// Create a starter trellis.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing trellis.yaml
    #[arg(long)]
    pub force: bool,
}

/// What a directory scan found.
#[derive(Debug, Default, PartialEq)]
struct Layout {
    /// Top-level directories containing sources or shaders.
    source_dirs: BTreeSet<String>,
    /// Top-level directories containing headers.
    include_dirs: BTreeSet<String>,
    /// Extensions of sources directly in the project directory.
    root_extensions: BTreeSet<String>,
    files: usize,
}

fn scan(root: &Path) -> Layout {
    let mut layout = Layout::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir() && {
                    let name = e.file_name().to_string_lossy();
                    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
                })
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let kind = SourceKind::of(path);
        let is_shader = path.to_string_lossy().ends_with(SHADER_SUFFIX);
        if !(kind.is_compiled() || kind == SourceKind::Header || is_shader) {
            continue;
        }
        layout.files += 1;

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let mut components = relative.components();
        let first = components.next().map(|c| c.as_os_str().to_string_lossy().into_owned());
        let nested = components.next().is_some();

        match first {
            Some(dir) if nested => {
                if kind == SourceKind::Header {
                    layout.include_dirs.insert(dir.clone());
                }
                layout.source_dirs.insert(dir);
            }
            _ => {
                if let Some(ext) = path.extension() {
                    layout.root_extensions.insert(ext.to_string_lossy().into_owned());
                }
            }
        }
    }

    layout
}

fn render(name: &str, layout: &Layout) -> String {
    let name = serde_yaml::to_string(name).unwrap_or_else(|_| format!("\"{}\"\n", name));
    let mut yaml = format!("name: {}", name);

    yaml.push_str("files:\n");
    if layout.source_dirs.is_empty() && layout.root_extensions.is_empty() {
        yaml.push_str("  - Sources/**\n");
    }
    for dir in &layout.source_dirs {
        yaml.push_str(&format!("  - \"{}/**\"\n", dir));
    }
    for ext in &layout.root_extensions {
        yaml.push_str(&format!("  - \"*.{}\"\n", ext));
    }

    if layout.include_dirs.is_empty() {
        if layout.source_dirs.is_empty() && layout.root_extensions.is_empty() {
            yaml.push_str("include_dirs: [Sources]\n");
        }
    } else {
        yaml.push_str("include_dirs:\n");
        for dir in &layout.include_dirs {
            yaml.push_str(&format!("  - \"{}\"\n", dir));
        }
    }

    yaml
}

fn project_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "project".to_string())
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(PROJECT_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(TrellisError::Build {
            message: format!("{} already exists", PROJECT_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    printer.status("Scanning", &display_path(&args.path));
    let layout = scan(&args.path);
    if layout.files == 0 {
        printer.warning("Warning", "no sources found, defaulting to Sources/**");
    }
    let yaml = render(&project_name(&args.path), &layout);

    fs::write(&manifest_path, &yaml).map_err(|e| TrellisError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write project file: {}", e),
    })?;

    if !layout.source_dirs.is_empty() {
        let dirs: Vec<&str> = layout.source_dirs.iter().map(|s| s.as_str()).collect();
        printer.info("Discovered", &dirs.join(", "));
    }

    printer.success(
        "Created",
        &format!(
            "{} ({} found)",
            PROJECT_FILENAME,
            plural(layout.files, "source file", "source files")
        ),
    );

    Ok(())
}
