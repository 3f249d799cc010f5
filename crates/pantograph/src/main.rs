use anyhow::Result;
use clap::{Parser, Subcommand};
use pantograph::cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Plan(args) => args.run(),
        Command::Start(args) => args.run(),
    }
}

#[derive(Parser)]
#[command(name = "pantograph", about = "Motion control for a five-bar drawing robot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a single-axis trapezoidal move and print the sampled profile.
    Plan(cli::plan::PlanArgs),
    /// Start the simulation runtime with the specified configuration.
    Start(cli::start::StartArgs),
}
