//! Package-manager repo definitions - rendered .repo files
//!
//! The declaration renders to a `.repo` file; convergence is plain
//! content comparison, so an unchanged definition is never rewritten.

use super::{observe_file, write_file};
use crate::resources::HostPaths;
use converge::{ExecError, Observed, ProbeError, RepoSpec};

pub fn observe(paths: &HostPaths, id: &str) -> Result<Observed, ProbeError> {
    match observe_file(&paths.repo_file(id), None)? {
        None => Ok(Observed::Absent),
        Some(state) => Ok(Observed::File(state)),
    }
}

pub fn apply(paths: &HostPaths, id: &str, spec: &RepoSpec) -> Result<(), ExecError> {
    write_file(&paths.repo_file(id), &spec.render(id), Some(0o644))
}
