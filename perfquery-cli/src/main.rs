mod plan;
mod render;
mod stats;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plan::Plan;
use render::Render;
use stats::Stats;

#[derive(Debug, Parser)]
#[command(name = "perfquery")]
#[command(about = "Build performance metric queries and aggregate their samples", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Build a query from options and print the rendered request")]
    Render(Render),

    #[command(about = "Plan the periodic query of a sensor kind from its profile")]
    Plan(Plan),

    #[command(about = "Sum and average numbers, or AND booleans")]
    Stats(Stats),
}

fn main() -> Result<()> {
    // stdout carries the JSON output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(render) => render::handle_render(render)?,
        Commands::Plan(plan) => plan::handle_plan(plan)?,
        Commands::Stats(stats) => stats::handle_stats(stats)?,
    }

    Ok(())
}
