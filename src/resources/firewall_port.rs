//! Firewall ports - additive, through firewall-cmd
//!
//! A port that is already open is a NoOp; the privileged add-port call
//! is only issued when the probe says the port is closed. An unreachable
//! firewalld is a probe error, never a silent NoOp.

use crate::backend::Backend;
use converge::{ExecError, Observed, PortSpec, ProbeError};

pub fn observe(backend: &dyn Backend, spec: &PortSpec) -> Result<Observed, ProbeError> {
    let state = backend
        .run("firewall-cmd", &["--state"])
        .map_err(|e| ProbeError::new(format!("firewall-cmd: {e:#}")))?;
    if !state.success {
        return Err(ProbeError::new("firewalld is not running"));
    }

    let ports = backend
        .run_checked("firewall-cmd", &["--list-ports"])
        .map_err(|e| ProbeError::new(format!("{e:#}")))?;

    let wanted = spec.port_spec();
    if ports.split_whitespace().any(|p| p == wanted) {
        Ok(Observed::PortOpen)
    } else {
        Ok(Observed::Absent)
    }
}

pub fn apply(backend: &dyn Backend, spec: &PortSpec) -> Result<(), ExecError> {
    let port = format!("--add-port={}", spec.port_spec());
    backend
        .run_checked("firewall-cmd", &["--permanent", &port])
        .map_err(|e| ExecError::new(format!("{e:#}")))?;
    backend
        .run_checked("firewall-cmd", &["--reload"])
        .map_err(|e| ExecError::new(format!("{e:#}")))?;
    Ok(())
}
