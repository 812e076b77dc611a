//! Systemd units - unit file content plus running state
//!
//! The unit file is content-compared like any managed file. The apply
//! path probes again before writing so a repeated Create never errors:
//! write the unit only if it differs, daemon-reload only after a write,
//! and `enable --now` always (idempotent for a running unit).

use super::write_file;
use crate::backend::Backend;
use crate::resources::HostPaths;
use converge::{ExecError, Observed, ProbeError, ServiceSpec, ServiceState};
use std::io::ErrorKind;

pub fn observe(
    backend: &dyn Backend,
    paths: &HostPaths,
    unit: &str,
) -> Result<Observed, ProbeError> {
    let unit_path = paths.unit_file(unit);
    let unit_digest = match std::fs::read_to_string(&unit_path) {
        Ok(content) => Some(converge::content_digest(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            return Err(ProbeError::new(format!(
                "cannot read {}: {e}",
                unit_path.display()
            )));
        }
    };

    // is-active/is-enabled answer through their exit status
    let active = backend
        .run("systemctl", &["is-active", "--quiet", unit])
        .map_err(|e| ProbeError::new(format!("systemctl: {e:#}")))?
        .success;
    let enabled = backend
        .run("systemctl", &["is-enabled", "--quiet", unit])
        .map_err(|e| ProbeError::new(format!("systemctl: {e:#}")))?
        .success;

    if unit_digest.is_none() && !active && !enabled {
        return Ok(Observed::Absent);
    }
    Ok(Observed::Service(ServiceState {
        unit_digest,
        active,
        enabled,
    }))
}

pub fn apply(
    backend: &dyn Backend,
    paths: &HostPaths,
    unit: &str,
    spec: &ServiceSpec,
) -> Result<(), ExecError> {
    let unit_path = paths.unit_file(unit);
    let current = match std::fs::read_to_string(&unit_path) {
        Ok(content) => Some(converge::content_digest(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            return Err(ExecError::new(format!(
                "cannot read {}: {e}",
                unit_path.display()
            )));
        }
    };

    if current.as_deref() != Some(converge::content_digest(&spec.unit).as_str()) {
        write_file(&unit_path, &spec.unit, Some(0o644))?;
        backend
            .run_checked("systemctl", &["daemon-reload"])
            .map_err(|e| ExecError::new(format!("{e:#}")))?;
    }

    backend
        .run_checked("systemctl", &["enable", "--now", unit])
        .map_err(|e| ExecError::new(format!("{e:#}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CmdOutput;
    use crate::backend::testing::MockBackend;
    use converge::{ActionKind, Desired, Resource};

    fn paths(dir: &tempfile::TempDir) -> HostPaths {
        HostPaths {
            unit_dir: dir.path().to_path_buf(),
            ..HostPaths::default()
        }
    }

    fn running_backend() -> MockBackend {
        MockBackend::new()
            .respond("systemctl is-active --quiet loki.service", CmdOutput::ok(""))
            .respond(
                "systemctl is-enabled --quiet loki.service",
                CmdOutput::ok(""),
            )
    }

    const UNIT: &str = "[Unit]\nDescription=Loki\n\n[Service]\nExecStart=/usr/bin/loki\n";

    #[test]
    fn test_no_unit_file_and_inactive_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new()
            .respond(
                "systemctl is-active --quiet loki.service",
                CmdOutput::failed(3, ""),
            )
            .respond(
                "systemctl is-enabled --quiet loki.service",
                CmdOutput::failed(1, ""),
            );
        let observed = observe(&backend, &paths(&dir), "loki.service").unwrap();
        assert!(observed.is_absent());
    }

    #[test]
    fn test_running_with_matching_unit_reconciles_to_noop() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        std::fs::write(paths.unit_file("loki.service"), UNIT).unwrap();

        let backend = running_backend();
        let observed = observe(&backend, &paths, "loki.service").unwrap();
        let resource = Resource::new(
            "loki.service",
            Desired::ServiceUnit(ServiceSpec { unit: UNIT.into() }),
        );
        assert_eq!(
            converge::reconcile(&resource, &observed).kind,
            ActionKind::NoOp
        );
    }

    #[test]
    fn test_stopped_unit_reconciles_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        std::fs::write(paths.unit_file("loki.service"), UNIT).unwrap();

        let backend = MockBackend::new()
            .respond(
                "systemctl is-active --quiet loki.service",
                CmdOutput::failed(3, ""),
            )
            .respond(
                "systemctl is-enabled --quiet loki.service",
                CmdOutput::ok(""),
            );
        let observed = observe(&backend, &paths, "loki.service").unwrap();
        let resource = Resource::new(
            "loki.service",
            Desired::ServiceUnit(ServiceSpec { unit: UNIT.into() }),
        );
        let action = converge::reconcile(&resource, &observed);
        assert_eq!(action.kind, ActionKind::Create);
    }

    #[test]
    fn test_apply_skips_write_when_content_matches() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);
        std::fs::write(
            paths.unit_file("loki.service"),
            converge::normalize(UNIT),
        )
        .unwrap();

        let backend = MockBackend::new().respond(
            "systemctl enable --now loki.service",
            CmdOutput::ok(""),
        );
        apply(
            &backend,
            &paths,
            "loki.service",
            &ServiceSpec { unit: UNIT.into() },
        )
        .unwrap();
        // No daemon-reload: the unit file was untouched
        assert_eq!(backend.calls(), vec!["systemctl enable --now loki.service"]);
    }

    #[test]
    fn test_apply_writes_reloads_and_enables_on_divergence() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(&dir);

        let backend = MockBackend::new()
            .respond("systemctl daemon-reload", CmdOutput::ok(""))
            .respond(
                "systemctl enable --now loki.service",
                CmdOutput::ok(""),
            );
        apply(
            &backend,
            &paths,
            "loki.service",
            &ServiceSpec { unit: UNIT.into() },
        )
        .unwrap();
        assert_eq!(
            backend.calls(),
            vec![
                "systemctl daemon-reload",
                "systemctl enable --now loki.service"
            ]
        );
        assert_eq!(
            std::fs::read_to_string(paths.unit_file("loki.service")).unwrap(),
            converge::normalize(UNIT)
        );
    }
}
