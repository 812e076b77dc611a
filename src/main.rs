mod backend;
mod cli;
mod commands;
mod progress;
mod resources;
mod schema;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{ApplyArgs, Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let command = cli
        .command
        .unwrap_or_else(|| Command::Apply(ApplyArgs::default()));

    match command {
        Command::Apply(args) => {
            let clean = commands::apply::run(&ctx, cli.config.as_deref(), &args)?;
            if !clean {
                // Partial convergence: report printed, exit non-zero
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Plan => commands::plan::run(&ctx, cli.config.as_deref()),
        Command::Validate => commands::validate::run(cli.config.as_deref()),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "trueup", &mut io::stdout());
            Ok(())
        }
    }
}
