//! Directory resources - existence, mode, ownership

use super::{apply_ownership, resolve_group_name, resolve_user_name};
use crate::backend::Backend;
use converge::{DirectorySpec, DirectoryState, ExecError, Observed, ProbeError};
use std::io::ErrorKind;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

pub fn observe(
    backend: &dyn Backend,
    path: &str,
    spec: &DirectorySpec,
) -> Result<Observed, ProbeError> {
    let meta = match std::fs::symlink_metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Observed::Absent),
        Err(e) => return Err(ProbeError::new(format!("cannot stat {path}: {e}"))),
        Ok(meta) => meta,
    };
    if !meta.is_dir() {
        // A file in the way is not something this kind converges over
        return Err(ProbeError::new(format!(
            "{path} exists but is not a directory"
        )));
    }

    let owner = match spec.owner {
        Some(_) => resolve_user_name(backend, meta.uid())?,
        None => None,
    };
    let group = match spec.group {
        Some(_) => resolve_group_name(backend, meta.gid())?,
        None => None,
    };

    Ok(Observed::Directory(DirectoryState {
        mode: meta.permissions().mode() & 0o7777,
        owner,
        group,
    }))
}

pub fn apply(backend: &dyn Backend, path: &str, spec: &DirectorySpec) -> Result<(), ExecError> {
    std::fs::create_dir_all(path)
        .map_err(|e| ExecError::new(format!("cannot create {path}: {e}")))?;
    if let Some(mode) = spec.mode {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| ExecError::new(format!("cannot chmod {path}: {e}")))?;
    }
    apply_ownership(
        backend,
        Path::new(path),
        spec.owner.as_deref(),
        spec.group.as_deref(),
    )
}
