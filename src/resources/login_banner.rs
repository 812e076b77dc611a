//! Login banner - dconf keyfile, profile, and `dconf update`
//!
//! Two files back the banner: a keyfile in the system database
//! directory and a profile naming that database. `dconf update` compiles
//! the database and is safe to re-run.

use super::{observe_file, write_file};
use crate::backend::Backend;
use crate::resources::HostPaths;
use converge::{BannerSpec, BannerState, ExecError, Observed, ProbeError};

pub fn observe(paths: &HostPaths, profile: &str) -> Result<Observed, ProbeError> {
    // Ownership is irrelevant for dconf files; compare content only
    let keyfile = observe_file(&paths.banner_keyfile(profile), None)?;
    let profile_file = observe_file(&paths.banner_profile(profile), None)?;

    match (keyfile, profile_file) {
        (None, None) => Ok(Observed::Absent),
        (keyfile, profile_file) => Ok(Observed::Banner(BannerState {
            keyfile_digest: keyfile.map(|s| s.content_digest),
            profile_digest: profile_file.map(|s| s.content_digest),
        })),
    }
}

pub fn apply(
    backend: &dyn Backend,
    paths: &HostPaths,
    profile: &str,
    spec: &BannerSpec,
) -> Result<(), ExecError> {
    write_file(&paths.banner_keyfile(profile), &spec.keyfile(), Some(0o644))?;
    write_file(
        &paths.banner_profile(profile),
        &spec.profile(profile),
        Some(0o644),
    )?;
    backend
        .run_checked("dconf", &["update"])
        .map_err(|e| ExecError::new(format!("{e:#}")))?;
    Ok(())
}
