//! Export configuration.
//!
//! Everything that influences an export (target platform, graphics API,
//! toolchain location, which stages run) lives in one [`ExportOptions`]
//! value passed down explicitly through loading, flattening, shader
//! compilation and dispatch.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::platform::{GraphicsApi, Platform, VrApi};
use crate::resolve::normalize;

/// Options for a single export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Project directory containing the root `trellis.yaml`.
    pub from: PathBuf,
    /// Output directory for generated projects and intermediate files.
    pub to: PathBuf,
    /// Target platform.
    pub platform: Platform,
    /// Graphics API (drives shader dialect selection).
    pub graphics_api: GraphicsApi,
    /// VR API, passed through to backends.
    pub vr_api: VrApi,
    /// Debug configuration (also passes `--debug` to the shader compiler).
    pub debug: bool,
    /// Toolchain directory holding the default shader compiler.
    pub toolchain_dir: Option<PathBuf>,
    /// Skip shader compilation.
    pub no_shaders: bool,
    /// Compile shaders and stop before exporting.
    pub only_shaders: bool,
    /// Run the native build tool after exporting.
    pub compile: bool,
    /// Launch the built binary after compiling.
    pub run: bool,
}

impl ExportOptions {
    /// Create options for exporting `from` into `to` for `platform`.
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            platform,
            graphics_api: GraphicsApi::Default,
            vr_api: VrApi::None,
            debug: false,
            toolchain_dir: None,
            no_shaders: false,
            only_shaders: false,
            compile: false,
            run: false,
        }
    }

    /// Set the graphics API.
    pub fn with_graphics_api(mut self, api: GraphicsApi) -> Self {
        self.graphics_api = api;
        self
    }

    /// Set the toolchain directory.
    pub fn with_toolchain_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.toolchain_dir = Some(dir.into());
        self
    }

    /// Name of the build configuration (`Debug` or `Release`).
    pub fn configuration(&self) -> &'static str {
        if self.debug {
            "Debug"
        } else {
            "Release"
        }
    }

    /// The same options with `from`, `to` and the toolchain directory made
    /// absolute against the current directory.
    ///
    /// External tools run in other working directories, so every path
    /// handed to them has to be absolute.
    pub fn with_absolute_paths(mut self) -> Result<Self> {
        self.from = absolute(&self.from)?;
        self.to = absolute(&self.to)?;
        if let Some(dir) = self.toolchain_dir.take() {
            self.toolchain_dir = Some(absolute(&dir)?);
        }
        Ok(self)
    }

    /// Directory the shader compiler writes dialect-specific sources into.
    pub fn generated_sources_dir(&self) -> PathBuf {
        self.to.join("Sources")
    }
}

/// `path` joined onto the current directory (unless already absolute) and
/// lexically normalised.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir()?;
    Ok(normalize(&cwd.join(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExportOptions::new("game", "game/build", Platform::Linux);

        assert_eq!(options.graphics_api, GraphicsApi::Default);
        assert_eq!(options.vr_api, VrApi::None);
        assert!(!options.debug);
        assert!(!options.compile);
        assert!(options.toolchain_dir.is_none());
    }

    #[test]
    fn test_configuration_name() {
        let mut options = ExportOptions::new(".", "build", Platform::Linux);
        assert_eq!(options.configuration(), "Release");

        options.debug = true;
        assert_eq!(options.configuration(), "Debug");
    }

    #[test]
    fn test_generated_sources_dir() {
        let options = ExportOptions::new(".", "out", Platform::Osx);
        assert_eq!(options.generated_sources_dir(), PathBuf::from("out/Sources"));
    }

    #[test]
    fn test_with_absolute_paths() {
        let cwd = std::env::current_dir().unwrap();
        let options = ExportOptions::new("game", "./out/../build", Platform::Linux)
            .with_toolchain_dir("toolchain")
            .with_absolute_paths()
            .unwrap();

        assert_eq!(options.from, cwd.join("game"));
        assert_eq!(options.to, cwd.join("build"));
        assert_eq!(options.toolchain_dir, Some(cwd.join("toolchain")));
    }

    #[test]
    fn test_absolute_paths_kept() {
        let options = ExportOptions::new("/game", "/game/build", Platform::Linux)
            .with_absolute_paths()
            .unwrap();

        assert_eq!(options.from, PathBuf::from("/game"));
        assert_eq!(options.to, PathBuf::from("/game/build"));
        assert!(options.toolchain_dir.is_none());
    }
}
