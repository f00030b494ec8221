//! Export and shaders command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::config::ExportOptions;
use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::pipeline;
use crate::platform::{GraphicsApi, Platform, VrApi};

/// Export native project files for a target platform
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Project directory containing trellis.yaml
    #[arg(default_value = ".")]
    pub from: PathBuf,

    /// Output directory
    #[arg(long, default_value = "build")]
    pub to: PathBuf,

    /// Target platform (windows, osx, linux, android, ... or a contributed id)
    #[arg(long, short, default_value_t = Platform::host())]
    pub target: Platform,

    /// Graphics API
    #[arg(long, value_enum, default_value_t = GraphicsApi::Default)]
    pub graphics: GraphicsApi,

    /// VR API
    #[arg(long, value_enum, default_value_t = VrApi::None)]
    pub vr: VrApi,

    /// Debug configuration
    #[arg(long)]
    pub debug: bool,

    /// Toolchain directory containing Tools/krafix
    #[arg(long)]
    pub toolchain: Option<PathBuf>,

    /// Skip shader compilation
    #[arg(long = "noshaders")]
    pub no_shaders: bool,

    /// Compile shaders and stop
    #[arg(long = "onlyshaders")]
    pub only_shaders: bool,

    /// Build the exported project with the native tool
    #[arg(long)]
    pub compile: bool,

    /// Run the built program (requires --compile)
    #[arg(long, requires = "compile")]
    pub run: bool,
}

impl ExportArgs {
    /// Options for this invocation; `only_shaders` forces shader-only mode.
    pub fn options(&self, only_shaders: bool) -> ExportOptions {
        let mut options = ExportOptions::new(&self.from, &self.to, self.target.clone())
            .with_graphics_api(self.graphics);
        options.vr_api = self.vr;
        options.debug = self.debug;
        options.toolchain_dir = self.toolchain.clone();
        options.no_shaders = self.no_shaders;
        options.only_shaders = self.only_shaders || only_shaders;
        options.compile = self.compile;
        options.run = self.run;
        options
    }
}

pub fn run(args: ExportArgs, only_shaders: bool, printer: &Printer) -> Result<()> {
    let options = args.options(only_shaders);

    let verb = if options.only_shaders { "Compiling" } else { "Exporting" };
    printer.status(
        verb,
        &format!(
            "{} for {} ({})",
            display_path(&options.from),
            options.platform.display_name(),
            options.configuration()
        ),
    );

    let outcome = pipeline::run(&options)?;

    let summary = format!(
        "{}, {}",
        plural(outcome.project.files.len(), "file", "files"),
        plural(outcome.shaders.len(), "shader", "shaders")
    );
    match &outcome.exporter {
        Some(exporter) => printer.success(
            "Finished",
            &format!(
                "{} with {} into {} ({})",
                outcome.project.name,
                exporter,
                printer.cyan(&display_path(&options.to)),
                summary
            ),
        ),
        None => printer.success("Finished", &format!("{} ({})", outcome.project.name, summary)),
    }

    Ok(())
}
