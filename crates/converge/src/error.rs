//! Error taxonomy for a provisioning run
//!
//! Only a bad declaration aborts a whole run. Probe and execution
//! failures are contained to one resource and its dependents, and end up
//! in the run report rather than being raised to the caller.

use crate::resource::Kind;
use std::fmt;
use thiserror::Error;

/// One problem found in the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    #[error("{kind} resource has an empty identity")]
    EmptyIdentity { kind: Kind },

    #[error("duplicate {kind} resource '{identity}'")]
    Duplicate { kind: Kind, identity: String },

    #[error("{kind} '{identity}': {problem}")]
    BadAttribute {
        kind: Kind,
        identity: String,
        problem: String,
    },

    #[error("{kind} '{identity}': bad requires entry: {problem}")]
    BadRequires {
        kind: Kind,
        identity: String,
        problem: String,
    },

    #[error("{kind} '{identity}' requires undeclared resource '{reference}'")]
    UnknownRequires {
        kind: Kind,
        identity: String,
        reference: String,
    },

    #[error("dependency cycle involving {0}")]
    DependencyCycle(String),
}

/// The declaration is malformed. Fatal: nothing is safe to attempt.
///
/// Carries every issue found, not just the first, so one pass reports
/// the whole misconfiguration.
#[derive(Debug, Clone, Error)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid declaration ({} issue", self.issues.len())?;
        if self.issues.len() != 1 {
            write!(f, "s")?;
        }
        write!(f, ")")?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

/// Current state could not be read for one resource.
///
/// Absence is never a probe error; this is reserved for "cannot query":
/// permission denied, firewalld not running, unreadable passwd database.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct ProbeError {
    pub reason: String,
}

impl ProbeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// An external-service call failed while applying an action.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct ExecError {
    pub reason: String,
}

impl ExecError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
