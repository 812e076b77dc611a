//! Host read/write boundary - per-kind probes and appliers
//!
//! One module per resource kind. Probes implement the read side
//! (`converge::Probe`) and never mutate the host; appliers implement
//! the write side (`converge::Executor`) through the command
//! [`Backend`]. Everything host-specific (paths, command names) lives
//! here, keeping the engine crate pure.

pub mod directory;
pub mod file_content;
pub mod firewall_port;
pub mod login_banner;
pub mod package;
pub mod repo_definition;
pub mod service_unit;
pub mod system_user;

use crate::backend::Backend;
use converge::{
    ActionKind, Desired, ExecError, FileState, Observed, ProbeError, Resource,
};
use std::io::ErrorKind;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Host locations the file-backed kinds render into.
#[derive(Debug, Clone)]
pub struct HostPaths {
    pub repo_dir: PathBuf,
    pub unit_dir: PathBuf,
    pub dconf_db: PathBuf,
    pub dconf_profile: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("/etc/yum.repos.d"),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            dconf_db: PathBuf::from("/etc/dconf/db"),
            dconf_profile: PathBuf::from("/etc/dconf/profile"),
        }
    }
}

impl HostPaths {
    pub fn repo_file(&self, id: &str) -> PathBuf {
        self.repo_dir.join(format!("{id}.repo"))
    }

    pub fn unit_file(&self, unit: &str) -> PathBuf {
        self.unit_dir.join(unit)
    }

    pub fn banner_keyfile(&self, profile: &str) -> PathBuf {
        self.dconf_db.join(format!("{profile}.d")).join("01-banner-message")
    }

    pub fn banner_profile(&self, profile: &str) -> PathBuf {
        self.dconf_profile.join(profile)
    }
}

/// The read side of the host boundary.
pub struct HostProbe<'a> {
    backend: &'a dyn Backend,
    paths: HostPaths,
}

impl<'a> HostProbe<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            paths: HostPaths::default(),
        }
    }

    pub fn with_paths(backend: &'a dyn Backend, paths: HostPaths) -> Self {
        Self { backend, paths }
    }
}

impl converge::Probe for HostProbe<'_> {
    fn observe(&self, resource: &Resource) -> Result<Observed, ProbeError> {
        match &resource.desired {
            Desired::Directory(spec) => directory::observe(self.backend, &resource.identity, spec),
            Desired::FileContent(spec) => {
                file_content::observe(self.backend, &resource.identity, spec)
            }
            Desired::SystemUser(_) => system_user::observe(self.backend, &resource.identity),
            Desired::FirewallPort(spec) => firewall_port::observe(self.backend, spec),
            Desired::ServiceUnit(_) => {
                service_unit::observe(self.backend, &self.paths, &resource.identity)
            }
            Desired::RepoDefinition(_) => {
                repo_definition::observe(&self.paths, &resource.identity)
            }
            Desired::Package => package::observe(self.backend, &resource.identity),
            Desired::LoginBanner(_) => login_banner::observe(&self.paths, &resource.identity),
        }
    }
}

/// The write side of the host boundary.
pub struct HostExecutor<'a> {
    backend: &'a dyn Backend,
    paths: HostPaths,
}

impl<'a> HostExecutor<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            paths: HostPaths::default(),
        }
    }

    pub fn with_paths(backend: &'a dyn Backend, paths: HostPaths) -> Self {
        Self { backend, paths }
    }
}

impl converge::Executor for HostExecutor<'_> {
    fn execute(
        &mut self,
        resource: &Resource,
        action: &converge::Action,
    ) -> Result<(), ExecError> {
        if action.kind == ActionKind::Delete {
            return Err(ExecError::new(format!(
                "no delete policy for {}",
                resource.kind()
            )));
        }

        match &resource.desired {
            Desired::Directory(spec) => directory::apply(self.backend, &resource.identity, spec),
            Desired::FileContent(spec) => {
                file_content::apply(self.backend, &resource.identity, spec)
            }
            Desired::SystemUser(spec) => system_user::apply(self.backend, &resource.identity, spec),
            Desired::FirewallPort(spec) => firewall_port::apply(self.backend, spec),
            Desired::ServiceUnit(spec) => {
                service_unit::apply(self.backend, &self.paths, &resource.identity, spec)
            }
            Desired::RepoDefinition(spec) => {
                repo_definition::apply(&self.paths, &resource.identity, spec)
            }
            Desired::Package => package::apply(self.backend, &resource.identity),
            Desired::LoginBanner(spec) => {
                login_banner::apply(self.backend, &self.paths, &resource.identity, spec)
            }
        }
    }
}

/// The on-disk file a file-backed resource renders to, for diff display.
pub fn rendered_path(paths: &HostPaths, resource: &Resource) -> Option<PathBuf> {
    match &resource.desired {
        Desired::FileContent(_) => Some(PathBuf::from(&resource.identity)),
        Desired::ServiceUnit(_) => Some(paths.unit_file(&resource.identity)),
        Desired::RepoDefinition(_) => Some(paths.repo_file(&resource.identity)),
        Desired::LoginBanner(_) => Some(paths.banner_keyfile(&resource.identity)),
        _ => None,
    }
}

// ============================================================================
// Shared filesystem helpers
// ============================================================================

/// Observe a managed file: None if absent, digest + mode + ownership
/// otherwise. Ownership is only resolved when a backend is passed in,
/// since resolution costs a getent call per id.
pub(crate) fn observe_file(
    path: &Path,
    backend: Option<&dyn Backend>,
) -> Result<Option<FileState>, ProbeError> {
    let meta = match std::fs::symlink_metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ProbeError::new(format!(
                "cannot stat {}: {e}",
                path.display()
            )));
        }
        Ok(meta) => meta,
    };
    if meta.is_dir() {
        return Err(ProbeError::new(format!(
            "{} exists but is a directory",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ProbeError::new(format!("cannot read {}: {e}", path.display())))?;

    let (owner, group) = match backend {
        Some(backend) => (
            resolve_user_name(backend, meta.uid())?,
            resolve_group_name(backend, meta.gid())?,
        ),
        None => (None, None),
    };

    Ok(Some(FileState {
        content_digest: converge::content_digest(&content),
        mode: meta.permissions().mode() & 0o7777,
        owner,
        group,
    }))
}

/// Resolve a uid to a username through `getent passwd`.
pub(crate) fn resolve_user_name(
    backend: &dyn Backend,
    uid: u32,
) -> Result<Option<String>, ProbeError> {
    resolve_name(backend, "passwd", uid)
}

/// Resolve a gid to a group name through `getent group`.
pub(crate) fn resolve_group_name(
    backend: &dyn Backend,
    gid: u32,
) -> Result<Option<String>, ProbeError> {
    resolve_name(backend, "group", gid)
}

fn resolve_name(
    backend: &dyn Backend,
    database: &str,
    id: u32,
) -> Result<Option<String>, ProbeError> {
    let id = id.to_string();
    let output = backend
        .run("getent", &[database, &id])
        .map_err(|e| ProbeError::new(format!("getent {database}: {e:#}")))?;
    if output.success {
        Ok(output
            .stdout
            .split(':')
            .next()
            .map(|name| name.trim().to_string()))
    } else if output.code == Some(2) {
        // No such entry: the id simply has no name
        Ok(None)
    } else {
        Err(ProbeError::new(format!(
            "getent {database} {id} failed: {}",
            output.stderr.trim()
        )))
    }
}

/// Write normalized content, creating parent directories, then set the
/// mode. The write is idempotent: rewriting identical content is fine.
pub(crate) fn write_file(path: &Path, content: &str, mode: Option<u32>) -> Result<(), ExecError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ExecError::new(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    std::fs::write(path, converge::normalize(content))
        .map_err(|e| ExecError::new(format!("cannot write {}: {e}", path.display())))?;
    if let Some(mode) = mode {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| ExecError::new(format!("cannot chmod {}: {e}", path.display())))?;
    }
    Ok(())
}

/// Apply declared ownership via `chown`. No-op when neither owner nor
/// group is declared.
pub(crate) fn apply_ownership(
    backend: &dyn Backend,
    path: &Path,
    owner: Option<&str>,
    group: Option<&str>,
) -> Result<(), ExecError> {
    let spec = match (owner, group) {
        (None, None) => return Ok(()),
        (Some(owner), None) => owner.to_string(),
        (None, Some(group)) => format!(":{group}"),
        (Some(owner), Some(group)) => format!("{owner}:{group}"),
    };
    let path = path.to_string_lossy();
    backend
        .run_checked("chown", &[&spec, path.as_ref()])
        .map_err(|e| ExecError::new(format!("{e:#}")))?;
    Ok(())
}
