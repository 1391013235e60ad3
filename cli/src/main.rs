
mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{analyze, rollup};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match &cli.command {
        Commands::Analyze(args) => analyze::run(&cli, args),
        Commands::Rollup(args) => rollup::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
