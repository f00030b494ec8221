//! Sub-project graph flattening.
//!
//! Walks the sub-project references depth-first from the root and merges
//! every reachable project into a single [`FlattenedProject`]. Merge order
//! is root first, then sub-projects in declaration order, recursively; each
//! project is merged once even when referenced from several parents. A
//! reference back to a project that is still being visited is a cycle and
//! fails the whole flatten.

mod merge;

use std::collections::{HashMap, HashSet};
use std::ops::Deref;

use tracing::warn;

use crate::error::{Result, TrellisError};
use crate::project::{ProjectDescriptor, ProjectGraph, ProjectId, TargetKind};

use merge::Merger;

/// A project with all sub-projects merged in.
///
/// Has no sub-project references of its own; `file_set`, `defines`,
/// `libraries` and `include_dirs` hold the union over the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedProject {
    project: ProjectDescriptor,
}

impl FlattenedProject {
    /// A one-node graph containing this project.
    pub fn to_graph(&self) -> (ProjectGraph, ProjectId) {
        let mut graph = ProjectGraph::new();
        let id = graph.add(self.project.clone());
        (graph, id)
    }
}

impl Deref for FlattenedProject {
    type Target = ProjectDescriptor;

    fn deref(&self) -> &ProjectDescriptor {
        &self.project
    }
}

/// Flatten the sub-project tree below `root` into a single project.
///
/// Fails with [`TrellisError::Cycle`] on a back-reference to a project that
/// is still being visited, and with [`TrellisError::DuplicateName`] when two
/// sub-projects of the same parent share a name but not a target kind.
pub fn flatten(graph: &ProjectGraph, root: ProjectId) -> Result<FlattenedProject> {
    let mut walk = Walk {
        graph,
        merger: Merger::new(graph.get(root)),
        visited: HashSet::new(),
        in_progress: HashSet::new(),
        path: Vec::new(),
    };

    walk.visit(root)?;

    Ok(FlattenedProject {
        project: walk.merger.finish(),
    })
}

struct Walk<'a> {
    graph: &'a ProjectGraph,
    merger: Merger,
    visited: HashSet<ProjectId>,
    in_progress: HashSet<ProjectId>,
    path: Vec<ProjectId>,
}

impl Walk<'_> {
    fn visit(&mut self, id: ProjectId) -> Result<()> {
        let graph = self.graph;
        let project = graph.get(id);

        self.in_progress.insert(id);
        self.path.push(id);

        self.merger.merge(project);
        check_sibling_names(graph, project)?;

        for &child in &project.sub_projects {
            if self.in_progress.contains(&child) {
                return Err(self.cycle_error(child).into());
            }
            if self.visited.contains(&child) {
                continue;
            }
            self.visit(child)?;
        }

        self.path.pop();
        self.in_progress.remove(&id);
        self.visited.insert(id);
        Ok(())
    }

    fn cycle_error(&self, back_edge: ProjectId) -> CycleError {
        // in_progress guarantees the target is on the path
        let start = self
            .path
            .iter()
            .position(|p| *p == back_edge)
            .unwrap_or(0);
        let mut cycle: Vec<String> = self.path[start..]
            .iter()
            .map(|p| self.graph.get(*p).name.clone())
            .collect();
        cycle.push(self.graph.get(back_edge).name.clone());
        CycleError { cycle }
    }
}

fn check_sibling_names(graph: &ProjectGraph, parent: &ProjectDescriptor) -> Result<()> {
    let mut seen: HashMap<&str, TargetKind> = HashMap::new();

    for &child in &parent.sub_projects {
        let sub = graph.get(child);
        match seen.get(sub.name.as_str()) {
            Some(kind) if *kind != sub.kind => {
                return Err(TrellisError::DuplicateName {
                    parent: parent.name.clone(),
                    name: sub.name.clone(),
                    first: kind.to_string(),
                    second: sub.kind.to_string(),
                });
            }
            Some(_) => {
                warn!(parent = %parent.name, name = %sub.name, "sub-project name declared twice");
            }
            None => {
                seen.insert(sub.name.as_str(), sub.kind);
            }
        }
    }

    Ok(())
}

/// Error returned when the sub-project references contain a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// Project names along the cycle; the first name is repeated at the end.
    pub cycle: Vec<String>,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Circular sub-project reference detected: ")?;
        for (i, name) in self.cycle.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", name)?;
        }
        Ok(())
    }
}

impl std::error::Error for CycleError {}
