//! Managed files - full-content ownership of configuration files

use super::{apply_ownership, observe_file, write_file};
use crate::backend::Backend;
use converge::{ExecError, FileSpec, Observed, ProbeError};
use std::path::Path;

pub fn observe(backend: &dyn Backend, path: &str, spec: &FileSpec) -> Result<Observed, ProbeError> {
    let backend = (spec.owner.is_some() || spec.group.is_some()).then_some(backend);
    match observe_file(Path::new(path), backend)? {
        None => Ok(Observed::Absent),
        Some(state) => Ok(Observed::File(state)),
    }
}

pub fn apply(backend: &dyn Backend, path: &str, spec: &FileSpec) -> Result<(), ExecError> {
    let path = Path::new(path);
    write_file(path, &spec.content, spec.mode)?;
    apply_ownership(backend, path, spec.owner.as_deref(), spec.group.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockBackend;
    use converge::{ActionKind, Desired, Resource};

    fn file_spec(content: &str) -> FileSpec {
        FileSpec {
            content: content.into(),
            mode: Some(0o644),
            owner: None,
            group: None,
        }
    }

    #[test]
    fn test_absent_then_apply_then_noop() {
        let backend = MockBackend::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loki").join("config.yml");
        let path = path.to_str().unwrap().to_string();
        let spec = file_spec("auth_enabled: false\n");

        assert!(observe(&backend, &path, &spec).unwrap().is_absent());

        apply(&backend, &path, &spec).unwrap();

        let observed = observe(&backend, &path, &spec).unwrap();
        let resource = Resource::new(path, Desired::FileContent(spec));
        assert_eq!(
            converge::reconcile(&resource, &observed).kind,
            ActionKind::NoOp
        );
    }

    #[test]
    fn test_content_drift_reconciles_to_update() {
        let backend = MockBackend::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.conf");
        std::fs::write(&path, "old contents\n").unwrap();
        let path = path.to_str().unwrap().to_string();
        let spec = file_spec("new contents\n");

        let observed = observe(&backend, &path, &spec).unwrap();
        let resource = Resource::new(path, Desired::FileContent(spec));
        let action = converge::reconcile(&resource, &observed);
        assert_eq!(action.kind, ActionKind::Update);
        assert!(action.rationale.contains("content"));
    }

    #[test]
    fn test_trailing_whitespace_does_not_cause_drift() {
        let backend = MockBackend::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.conf");
        std::fs::write(&path, "key=value   \n\n\n").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let path = path.to_str().unwrap().to_string();
        let spec = file_spec("key=value");

        let observed = observe(&backend, &path, &spec).unwrap();
        let resource = Resource::new(path, Desired::FileContent(spec));
        assert_eq!(
            converge::reconcile(&resource, &observed).kind,
            ActionKind::NoOp
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let backend = MockBackend::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repeat.conf");
        let path = path.to_str().unwrap().to_string();
        let spec = file_spec("x=1\n");

        apply(&backend, &path, &spec).unwrap();
        apply(&backend, &path, &spec).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x=1\n");
    }
}
