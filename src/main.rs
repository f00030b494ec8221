use clap::Parser;
use miette::Result;
use trellis::cli::{Cli, Commands};
use trellis::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    trellis::cli::init_logging(cli.verbose);
    let printer = Printer::new();

    let result = match cli.command {
        Commands::Export(args) => trellis::cli::export::run(args, false, &printer),
        Commands::Shaders(args) => trellis::cli::export::run(args, true, &printer),
        Commands::List(args) => trellis::cli::list::run(args, &printer),
        Commands::Init(args) => trellis::cli::init::run(args, &printer),
        Commands::Completions(args) => trellis::cli::completions::run(args),
    };

    if let Err(err) = result {
        // A failing build tool's exit code is passed through.
        let code = err.exit_code();
        if code != 1 {
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
        return Err(err.into());
    }

    Ok(())
}
