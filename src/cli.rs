use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trueup")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Convergent host provisioner - declare state, re-run safely", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the host declaration (default: /etc/trueup/host.toml,
    /// falling back to ~/.config/trueup/host.toml)
    #[arg(short, long, global = true, value_name = "PATH", env = "TRUEUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Defaults to `apply` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge the host to the declared state (the default)
    Apply(ApplyArgs),

    /// Probe and reconcile only; show pending actions without mutating
    Plan,

    /// Check the declaration and list every issue
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Default)]
pub struct ApplyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Emit the full run report as JSON instead of decorated output
    #[arg(long)]
    pub json: bool,
}
