use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::CycleError;

/// Main error type for trellis operations
#[derive(Error, Diagnostic, Debug)]
pub enum TrellisError {
    #[error("IO error: {0}")]
    #[diagnostic(code(trellis::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(trellis::io))]
    Io { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(trellis::config))]
    Configuration {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{0}")]
    #[diagnostic(
        code(trellis::config::cycle),
        help("Sub-project references must form a tree or a DAG")
    )]
    Cycle(#[from] CycleError),

    #[error("Sub-projects of '{parent}' both declare the name '{name}' with different kinds ({first} and {second})")]
    #[diagnostic(code(trellis::config::duplicate_name))]
    DuplicateName {
        parent: String,
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid file pattern '{pattern}': {message}")]
    #[diagnostic(code(trellis::resolve::pattern))]
    InvalidPattern { pattern: String, message: String },

    #[error("Unsupported shader language for platform {platform} with graphics API {api}")]
    #[diagnostic(
        code(trellis::shader::language),
        help("Pick a graphics API supported by the target platform")
    )]
    UnsupportedShaderLanguage { platform: String, api: String },

    #[error("Could not find shader compiler for platform {platform}")]
    #[diagnostic(
        code(trellis::shader::compiler),
        help("Pass --toolchain or provide Backends/<name>/krafix/krafix-<platform>")
    )]
    CompilerNotFound { platform: String },

    #[error("Shader compiler error in {}: {compiled} of {total} shader(s) compiled", file.display())]
    #[diagnostic(code(trellis::shader::compile))]
    ShaderCompile {
        file: PathBuf,
        compiled: usize,
        total: usize,
        diagnostics: Vec<String>,
    },

    #[error("No exporter found for platform {platform}")]
    #[diagnostic(
        code(trellis::export::missing),
        help("Add an exporter under Backends/<platform>/")
    )]
    NoExporterFound { platform: String },

    #[error("{tool} failed with exit code {code}")]
    #[diagnostic(code(trellis::tool))]
    ExternalTool { tool: String, code: i32 },

    #[error("Build error: {message}")]
    #[diagnostic(code(trellis::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl TrellisError {
    /// Exit code the binary should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            TrellisError::ExternalTool { code, .. } => *code,
            _ => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        TrellisError::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrellisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_exit_code() {
        let err = TrellisError::ExternalTool {
            tool: "make".to_string(),
            code: 2,
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "make failed with exit code 2");
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        let err = TrellisError::NoExporterFound {
            platform: "dreamcast".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_shader_compile_reports_progress() {
        let err = TrellisError::ShaderCompile {
            file: PathBuf::from("Shaders/blur.frag.glsl"),
            compiled: 2,
            total: 5,
            diagnostics: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Shader compiler error in Shaders/blur.frag.glsl: 2 of 5 shader(s) compiled"
        );
    }
}
