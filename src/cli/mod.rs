//! Command line interface.

pub mod completions;
pub mod export;
pub mod init;
pub mod list;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// trellis - Cross-platform project generator
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export native project files for a target platform
    Export(export::ExportArgs),

    /// Compile shaders only (same as `export --onlyshaders`)
    Shaders(export::ExportArgs),

    /// Print the flattened, resolved project
    List(list::ListArgs),

    /// Create a starter trellis.yaml
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` with `verbose`.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
