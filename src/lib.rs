//! trellis - Cross-platform native project generator
//!
//! Reads a tree of `trellis.yaml` project descriptions, flattens them into a
//! single project for a target platform, compiles GLSL shaders for the
//! platform's graphics API, and writes native build files (Makefiles,
//! CMake/Xcode, Visual Studio, Gradle) for it.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod native;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod project;
pub mod resolve;
pub mod shader;

pub use config::ExportOptions;
pub use error::{Result, TrellisError};
pub use export::{Exporter, ExporterRegistry, ResolvedProject};
pub use graph::{flatten, CycleError, FlattenedProject};
pub use pipeline::{export_project, export_project_with, resolve_project, ExportOutcome};
pub use platform::{GraphicsApi, Platform, VrApi};
pub use project::{load_project, ProjectDescriptor, ProjectGraph, ProjectId, TargetKind};
pub use resolve::{resolve, ResolvedFile};
pub use shader::{CompiledShaderRef, Dialect};
