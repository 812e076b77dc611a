//! Actions and outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the reconciler decided must happen to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Bring an absent resource into existence (or start a stopped unit).
    Create,
    /// Rewrite diverged attributes of an existing resource.
    Update,
    /// Remove a resource. No kind policy currently emits this; the
    /// executor refuses it rather than guessing.
    Delete,
    /// Observed state already matches the declaration.
    NoOp,
}

impl ActionKind {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
            Self::NoOp => f.write_str("no-op"),
        }
    }
}

/// An action plus the attribute divergence that motivated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Which attribute diverged (or why nothing needs to happen).
    pub rationale: String,
}

impl Action {
    pub fn new(kind: ActionKind, rationale: impl Into<String>) -> Self {
        Self {
            kind,
            rationale: rationale.into(),
        }
    }

    pub fn create(rationale: impl Into<String>) -> Self {
        Self::new(ActionKind::Create, rationale)
    }

    pub fn update(rationale: impl Into<String>) -> Self {
        Self::new(ActionKind::Update, rationale)
    }

    pub fn noop(rationale: impl Into<String>) -> Self {
        Self::new(ActionKind::NoOp, rationale)
    }

    pub fn is_noop(&self) -> bool {
        self.kind == ActionKind::NoOp
    }
}

/// Per-resource outcome recorded in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The resource converged (including "was already converged").
    Success,
    /// Probe or execution failed; the reason is kept verbatim.
    Failed { reason: String },
    /// A required resource did not converge, so this one was not attempted.
    Blocked { dependency: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Blocked { dependency } => write!(f, "blocked on {dependency}"),
        }
    }
}
