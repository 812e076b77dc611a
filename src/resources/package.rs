//! Packages - create-only through rpm/dnf
//!
//! `rpm -q` answers installed/absent through its exit status; `dnf
//! install -y` is idempotent for an already-installed package.

use crate::backend::Backend;
use converge::{ExecError, Observed, ProbeError};

pub fn observe(backend: &dyn Backend, name: &str) -> Result<Observed, ProbeError> {
    let output = backend
        .run("rpm", &["-q", name])
        .map_err(|e| ProbeError::new(format!("rpm: {e:#}")))?;

    if output.success {
        let version = output.stdout.lines().next().map(|l| l.trim().to_string());
        Ok(Observed::Installed { version })
    } else if output.code == Some(1) {
        Ok(Observed::Absent)
    } else {
        Err(ProbeError::new(format!(
            "rpm -q {name} failed: {}",
            output.stderr.trim()
        )))
    }
}

pub fn apply(backend: &dyn Backend, name: &str) -> Result<(), ExecError> {
    backend
        .run_checked("dnf", &["install", "-y", name])
        .map_err(|e| ExecError::new(format!("{e:#}")))?;
    Ok(())
}
