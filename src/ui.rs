#![allow(dead_code)]

use colored::Colorize;
use converge::{ActionKind, Outcome};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message (stderr, so machine-readable stdout stays clean)
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Colored one-character marker for a pending or taken action
pub fn action_symbol(action: ActionKind) -> String {
    match action {
        ActionKind::Create => "+".green().to_string(),
        ActionKind::Update => "~".yellow().to_string(),
        ActionKind::Delete => "-".red().to_string(),
        ActionKind::NoOp => "=".dimmed().to_string(),
    }
}

/// Colored outcome label for report lines
pub fn outcome_label(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success => "ok".green().to_string(),
        Outcome::Failed { .. } => "failed".red().to_string(),
        Outcome::Blocked { .. } => "blocked".yellow().to_string(),
    }
}
