use clap::Parser;
use tracing_subscriber::EnvFilter;

use knot_detector::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Progress is reported at info; --verbose adds per-fragment state transitions
    let filter = if cli.verbose {
        EnvFilter::new("knot_detector=debug,info")
    } else {
        EnvFilter::new("knot_detector=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Analyze(args) => {
            cli::analyze::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Inspect(args) => {
            cli::inspect::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Plan(args) => {
            cli::plan::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
