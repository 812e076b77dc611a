//! Local user accounts - create-only through getent/useradd
//!
//! Existing accounts are never modified; re-running against a host where
//! the user already exists (with whatever home/shell) is a NoOp.

use crate::backend::Backend;
use converge::{ExecError, Observed, ProbeError, UserSpec, UserState};

pub fn observe(backend: &dyn Backend, name: &str) -> Result<Observed, ProbeError> {
    let output = backend
        .run("getent", &["passwd", name])
        .map_err(|e| ProbeError::new(format!("getent passwd: {e:#}")))?;

    if output.success {
        let line = output.stdout.lines().next().unwrap_or_default();
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < 7 {
            return Err(ProbeError::new(format!(
                "unparseable passwd entry for {name}"
            )));
        }
        let uid = fields[2]
            .parse()
            .map_err(|_| ProbeError::new(format!("non-numeric uid for {name}")))?;
        Ok(Observed::User(UserState {
            uid,
            home: fields[5].to_string(),
            shell: fields[6].to_string(),
        }))
    } else if output.code == Some(2) {
        Ok(Observed::Absent)
    } else {
        Err(ProbeError::new(format!(
            "getent passwd {name} failed: {}",
            output.stderr.trim()
        )))
    }
}

pub fn apply(backend: &dyn Backend, name: &str, spec: &UserSpec) -> Result<(), ExecError> {
    let mut args: Vec<&str> = Vec::new();
    if spec.system {
        args.push("-r");
    }
    if let Some(home) = &spec.home {
        args.push("-d");
        args.push(home);
    }
    args.push(if spec.create_home { "-m" } else { "-M" });
    if let Some(shell) = &spec.shell {
        args.push("-s");
        args.push(shell);
    }
    args.push(name);

    backend
        .run_checked("useradd", &args)
        .map_err(|e| ExecError::new(format!("{e:#}")))?;
    Ok(())
}
