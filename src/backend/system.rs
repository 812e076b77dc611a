//! Real command execution against the live host.

use super::{Backend, CmdOutput};
use anyhow::{Context, Result};
use std::process::Command;

/// Backend that executes real commands via `std::process::Command`.
pub struct SystemBackend;

impl Backend for SystemBackend {
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
        log::debug!("exec: {program} {}", args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute {program}"))?;

        Ok(CmdOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
            success: output.status.success(),
        })
    }
}
