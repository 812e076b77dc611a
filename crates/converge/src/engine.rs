//! Run loop - probe, reconcile, execute, report
//!
//! The engine is generic over [`Probe`], [`Executor`] and [`Progress`]
//! so the whole loop is testable without a live host. Execution is
//! single-threaded and synchronous: one resource at a time, in stable
//! topological order of the `requires` edges.

use crate::error::{ExecError, ProbeError, ValidationError};
use crate::graph::execution_order;
use crate::observed::Observed;
use crate::reconcile::reconcile;
use crate::report::{ReportEntry, RunReport};
use crate::resource::{Kind, Resource};
use crate::types::{Action, Outcome};
use crate::validate::validate;
use chrono::Utc;

/// Reads current host state for one resource. Must never mutate the host.
pub trait Probe {
    fn observe(&self, resource: &Resource) -> Result<Observed, ProbeError>;
}

/// Applies one action through external-service calls.
///
/// Every action must be idempotent at the external-service layer: a
/// second Create against an already-created resource must not error.
pub trait Executor {
    fn execute(&mut self, resource: &Resource, action: &Action) -> Result<(), ExecError>;
}

/// Receives per-resource progress during a run.
pub trait Progress {
    fn resource_started(&mut self, _resource: &Resource) {}
    fn resource_finished(&mut self, _resource: &Resource, _action: &Action, _outcome: &Outcome) {}
}

/// No-op progress sink.
pub struct NoProgress;

impl Progress for NoProgress {}

/// One planned (not yet executed) action.
#[derive(Debug, Clone)]
pub struct PlannedAction {
    pub kind: Kind,
    pub identity: String,
    /// The reconciled action, or the probe failure that prevented one.
    pub action: Result<Action, ProbeError>,
}

/// Probe and reconcile only; never mutates the host.
///
/// Entries come back in declaration order.
pub fn plan<P: Probe>(
    resources: &[Resource],
    probe: &P,
) -> Result<Vec<PlannedAction>, ValidationError> {
    validate(resources)?;

    let mut planned: Vec<PlannedAction> = resources
        .iter()
        .map(|r| PlannedAction {
            kind: r.kind(),
            identity: r.identity.clone(),
            action: Ok(Action::noop("not probed")),
        })
        .collect();

    for index in order_checked(resources)? {
        let resource = &resources[index];
        planned[index].action = probe
            .observe(resource)
            .map(|observed| reconcile(resource, &observed));
    }

    Ok(planned)
}

/// Converge the host: probe, reconcile and execute every resource.
///
/// Probes run just-in-time per resource in topological order, so a
/// resource observes the host *after* its dependencies converged.
/// Failures are contained: a failed resource marks its dependents
/// `Blocked` and the run continues. The report lists entries in
/// declaration order.
pub fn run<P, E, G>(
    resources: &[Resource],
    probe: &P,
    executor: &mut E,
    progress: &mut G,
) -> Result<RunReport, ValidationError>
where
    P: Probe,
    E: Executor,
    G: Progress,
{
    validate(resources)?;
    let started_at = Utc::now();

    let mut entries: Vec<Option<ReportEntry>> = vec![None; resources.len()];
    // References that converged so far (Success outcomes only)
    let mut converged: std::collections::HashSet<String> = std::collections::HashSet::new();

    for index in order_checked(resources)? {
        let resource = &resources[index];
        progress.resource_started(resource);

        let (action, outcome) = converge_one(resource, &converged, probe, executor);
        progress.resource_finished(resource, &action, &outcome);

        if outcome.is_success() {
            converged.insert(resource.reference().to_string());
        }
        entries[index] = Some(ReportEntry {
            kind: resource.kind(),
            identity: resource.identity.clone(),
            action: action.kind,
            rationale: action.rationale,
            outcome,
        });
    }

    let entries = entries.into_iter().flatten().collect();
    Ok(RunReport::new(started_at, entries))
}

fn converge_one<P: Probe, E: Executor>(
    resource: &Resource,
    converged: &std::collections::HashSet<String>,
    probe: &P,
    executor: &mut E,
) -> (Action, Outcome) {
    // Hard dependencies short-circuit to Blocked, never attempted
    for reference in &resource.requires {
        if !converged.contains(reference.as_str()) {
            return (
                Action::noop("not attempted"),
                Outcome::Blocked {
                    dependency: reference.clone(),
                },
            );
        }
    }

    let observed = match probe.observe(resource) {
        Ok(observed) => observed,
        Err(err) => {
            return (
                Action::noop("state could not be read"),
                Outcome::Failed {
                    reason: format!("probe: {err}"),
                },
            );
        }
    };

    let action = reconcile(resource, &observed);
    if action.is_noop() {
        return (action, Outcome::Success);
    }

    let outcome = match executor.execute(resource, &action) {
        Ok(()) => Outcome::Success,
        Err(err) => Outcome::Failed {
            reason: err.reason,
        },
    };
    (action, outcome)
}

fn order_checked(resources: &[Resource]) -> Result<Vec<usize>, ValidationError> {
    // validate() already rejected cycles; keep the error path anyway so
    // this function is total.
    execution_order(resources).map_err(|stuck| ValidationError {
        issues: vec![crate::error::Issue::DependencyCycle(stuck.join(", "))],
    })
}
