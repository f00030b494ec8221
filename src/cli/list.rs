//! List command implementation.
//!
//! Prints the flattened, resolved project for a platform.

use std::path::PathBuf;

use clap::Args;

use crate::error::{Result, TrellisError};
use crate::output::{plural, Printer};
use crate::pipeline::resolve_project;
use crate::platform::Platform;

/// Print the flattened, resolved project
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Project directory containing trellis.yaml
    #[arg(default_value = ".")]
    pub from: PathBuf,

    /// Target platform
    #[arg(long, short, default_value_t = Platform::host())]
    pub target: Platform,

    /// Print JSON to stdout instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs, printer: &Printer) -> Result<()> {
    let project = resolve_project(&args.from, &args.target)?;

    if args.json {
        let json = serde_json::to_string_pretty(&project).map_err(|e| TrellisError::Build {
            message: format!("Failed to serialise project: {}", e),
            help: None,
        })?;
        println!("{}", json);
        return Ok(());
    }

    printer.info(
        "Project",
        &format!("{} ({})", printer.bold(&project.name), project.kind),
    );
    let groups: [(&str, &[String]); 3] = [
        ("Defines", &project.defines),
        ("Libraries", &project.libraries),
        ("Includes", &project.include_dirs),
    ];
    for (label, values) in groups {
        if !values.is_empty() {
            printer.info(label, &values.join(", "));
        }
    }

    for file in &project.files {
        let mut line = file.relative_path.clone();
        if file.options.no_filter {
            line.push_str(&printer.dim(" (no filter)"));
        }
        printer.info("File", &line);
    }

    printer.success(
        "Resolved",
        &format!(
            "{} for {}",
            plural(project.files.len(), "file", "files"),
            args.target.display_name()
        ),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::PROJECT_FILENAME;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_list_resolves_project() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_FILENAME), "name: game\nfiles: [\"*.c\"]\n").unwrap();
        fs::write(dir.path().join("main.c"), "").unwrap();

        let args = ListArgs {
            from: dir.path().to_path_buf(),
            target: Platform::Linux,
            json: false,
        };
        run(args, &Printer::new()).unwrap();
    }

    #[test]
    fn test_list_missing_project() {
        let dir = tempdir().unwrap();
        let args = ListArgs {
            from: dir.path().to_path_buf(),
            target: Platform::Linux,
            json: true,
        };

        assert!(run(args, &Printer::new()).is_err());
    }
}
