//! # Converge
//!
//! A convergence engine for declarative host provisioning.
//!
//! The crate models desired host state as typed [`Resource`]s, reads
//! current state through a [`Probe`], computes the minimal [`Action`]
//! per resource with a pure reconciler, applies actions through an
//! [`Executor`], and collects per-resource outcomes in a [`RunReport`].
//!
//! ## Core Concepts
//!
//! - **Resource**: one declared unit of desired state (directory, file,
//!   user, firewall port, service unit, repo definition, package, banner)
//! - **Observed**: what a probe found on the host; absent is normal
//! - **Action**: Create / Update / NoOp with a rationale naming the
//!   diverged attribute
//! - **RunReport**: ordered outcomes plus a counts summary
//!
//! ## Guarantees
//!
//! - Validation runs before any probe and reports every issue at once
//! - Probes never mutate the host; the reconciler is pure
//! - Execution is single-threaded in stable topological order of the
//!   declared `requires` edges
//! - Failures are contained to a resource and its dependents; siblings
//!   continue, and the report reflects the partial run
//!
//! The host boundary stays out of this crate: callers implement
//! [`Probe`] and [`Executor`] against their external services, which is
//! also what makes the run loop testable with plain mocks.

pub mod engine;
pub mod error;
pub mod graph;
pub mod observed;
pub mod reconcile;
pub mod report;
pub mod resource;
pub mod types;
pub mod validate;

// Re-export main types at crate root
pub use engine::{Executor, NoProgress, PlannedAction, Probe, Progress, plan, run};
pub use error::{ExecError, Issue, ProbeError, ValidationError};
pub use graph::execution_order;
pub use observed::{
    BannerState, DirectoryState, FileState, Observed, ServiceState, UserState,
};
pub use reconcile::{content_digest, normalize, reconcile};
pub use report::{ReportEntry, RunReport, RunSummary};
pub use resource::{
    BannerSpec, Desired, DirectorySpec, FileSpec, Kind, PortSpec, Protocol, RepoSpec, Resource,
    ResourceRef, ServiceSpec, UserSpec,
};
pub use types::{Action, ActionKind, Outcome};
pub use validate::validate;
