//! Shader compiler discovery.

use std::env::consts::EXE_SUFFIX;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TrellisError};
use crate::platform::Platform;

/// Directory below a project holding contributed backends.
pub const BACKENDS_DIR: &str = "Backends";

/// Locate the shader compiler for `platform`.
///
/// A platform-specific compiler shipped in `<project>/Backends/*/krafix/`
/// takes precedence over the toolchain's default compiler. When several
/// backends ship one, the last in name order wins.
pub fn find_compiler(
    project_dir: &Path,
    toolchain_dir: Option<&Path>,
    platform: &Platform,
) -> Result<PathBuf> {
    if let Some(path) = backend_compiler(project_dir, platform) {
        debug!(path = %path.display(), "using backend shader compiler");
        return Ok(path);
    }

    if let Some(toolchain) = toolchain_dir {
        let path = toolchain
            .join("Tools")
            .join("krafix")
            .join(format!("krafix{}", EXE_SUFFIX));
        if path.is_file() {
            debug!(path = %path.display(), "using toolchain shader compiler");
            return Ok(path);
        }
    }

    Err(TrellisError::CompilerNotFound {
        platform: platform.id().to_string(),
    })
}

fn backend_compiler(project_dir: &Path, platform: &Platform) -> Option<PathBuf> {
    let entries = fs::read_dir(project_dir.join(BACKENDS_DIR)).ok()?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let file_name = format!("krafix-{}{}", platform.id(), EXE_SUFFIX);
    dirs.iter()
        .rev()
        .map(|dir| dir.join("krafix").join(&file_name))
        .find(|path| path.is_file())
}
