//! Project loader - reads a trellis.yaml and everything it references.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TrellisError};
use crate::platform::Platform;

use super::manifest::ProjectManifest;
use super::{ProjectGraph, ProjectId};

/// The name of the project descriptor file.
pub const PROJECT_FILENAME: &str = "trellis.yaml";

/// Load the project in `dir` and all of its sub-projects.
///
/// Directories are canonicalised, so every directory is loaded once and
/// repeated references point at the same node. Reference cycles are kept
/// in the graph; flattening reports them.
pub fn load_project(dir: impl AsRef<Path>, platform: &Platform) -> Result<(ProjectGraph, ProjectId)> {
    let mut loader = Loader {
        platform,
        graph: ProjectGraph::new(),
        ids: HashMap::new(),
    };
    let root = loader.load(dir.as_ref(), None)?;
    Ok((loader.graph, root))
}

struct Loader<'a> {
    platform: &'a Platform,
    graph: ProjectGraph,
    ids: HashMap<PathBuf, ProjectId>,
}

impl Loader<'_> {
    fn load(&mut self, dir: &Path, referrer: Option<&Path>) -> Result<ProjectId> {
        let canonical = dir
            .canonicalize()
            .map_err(|_| missing_project(dir, referrer))?;

        if let Some(id) = self.ids.get(&canonical) {
            return Ok(*id);
        }

        let path = canonical.join(PROJECT_FILENAME);
        if !path.is_file() {
            return Err(missing_project(dir, referrer));
        }

        debug!(path = %path.display(), "loading project");
        let manifest = ProjectManifest::load(&path)?;
        let (descriptor, sub_dirs) = manifest.into_descriptor(&canonical, self.platform);

        // Registered before descending so a back-reference finds this node
        // instead of recursing forever.
        let id = self.graph.add(descriptor);
        self.ids.insert(canonical.clone(), id);

        for sub_dir in sub_dirs {
            let child = self.load(&canonical.join(&sub_dir), Some(&path))?;
            self.graph.link(id, child);
        }

        Ok(id)
    }
}

fn missing_project(dir: &Path, referrer: Option<&Path>) -> TrellisError {
    let message = match referrer {
        Some(from) => format!(
            "{} not found in {} (referenced from {})",
            PROJECT_FILENAME,
            dir.display(),
            from.display()
        ),
        None => format!("{} not found in {}", PROJECT_FILENAME, dir.display()),
    };
    TrellisError::Configuration {
        message,
        help: Some("Run `trellis init` to create a project file".to_string()),
    }
}
