//! Platform to exporter lookup.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, TrellisError};
use crate::platform::Platform;

use super::contributed::{find_contributed, ContributedExporter};
use super::makefile::MakefileExporter;
use super::{AndroidExporter, Exporter, VisualStudioExporter, XCodeExporter};

/// Decides whether a registry entry serves a platform.
pub type PlatformPredicate = Box<dyn Fn(&Platform) -> bool + Send + Sync>;

/// Creates the exporter for a matched platform.
pub type ExporterFactory = Box<dyn Fn(&Platform) -> Box<dyn Exporter> + Send + Sync>;

/// Ordered list of `(predicate, factory)` pairs. The first match wins.
pub struct ExporterRegistry {
    entries: Vec<(PlatformPredicate, ExporterFactory)>,
}

impl Default for ExporterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ExporterRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A registry with the built-in backends.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register(
            |p| p.is_apple(),
            |_| Box::new(XCodeExporter),
        );
        registry.register(
            |p| *p == Platform::Android,
            |_| Box::new(AndroidExporter),
        );
        registry.register(
            |p| *p == Platform::Html5,
            |_| Box::new(MakefileExporter::emscripten()),
        );
        registry.register(
            |p| matches!(p, Platform::Linux | Platform::Pi),
            |_| Box::new(MakefileExporter::linux()),
        );
        registry.register(
            |p| *p == Platform::Tizen,
            |_| Box::new(MakefileExporter::tizen()),
        );
        registry.register(
            |p| matches!(p, Platform::Windows | Platform::WindowsApp),
            |_| Box::new(VisualStudioExporter),
        );

        registry
    }

    /// Add an entry after the existing ones.
    pub fn register<P, F>(&mut self, predicate: P, factory: F)
    where
        P: Fn(&Platform) -> bool + Send + Sync + 'static,
        F: Fn(&Platform) -> Box<dyn Exporter> + Send + Sync + 'static,
    {
        self.entries.push((Box::new(predicate), Box::new(factory)));
    }

    /// The registered exporter for `platform`, without looking at any
    /// contributed backends.
    pub fn registered(&self, platform: &Platform) -> Option<Box<dyn Exporter>> {
        self.entries
            .iter()
            .find(|(predicate, _)| predicate(platform))
            .map(|(_, factory)| factory(platform))
    }

    /// Select the exporter for `platform`.
    ///
    /// Registered backends are consulted first; only when none matches is
    /// `backends_dir` scanned for a contributed one.
    pub fn select(&self, platform: &Platform, backends_dir: &Path) -> Result<Box<dyn Exporter>> {
        if let Some(exporter) = self.registered(platform) {
            debug!(platform = %platform, exporter = exporter.name(), "selected registered exporter");
            return Ok(exporter);
        }

        if let Some(program) = find_contributed(backends_dir, platform) {
            debug!(platform = %platform, program = %program.display(), "selected contributed exporter");
            return Ok(Box::new(ContributedExporter::new(program)));
        }

        Err(TrellisError::NoExporterFound {
            platform: platform.id().to_string(),
        })
    }
}
