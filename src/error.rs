//! Engine failures.
//!
//! Every failure carries a [`Snapshot`] of the engine's equations and rules at
//! the moment it was raised.

use std::fmt;
use thiserror::Error;

/// Rendered equation and rule sets, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub equations: Vec<String>,
    pub rules: Vec<String>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.equations.is_empty() && self.rules.is_empty()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "equations:")?;
        for eq in &self.equations {
            writeln!(f, "  {}", eq)?;
        }
        writeln!(f, "rules:")?;
        for rule in &self.rules {
            writeln!(f, "  {}", rule)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KbError {
    /// Unfailing mode is off and the order cannot direct an equation.
    #[error("cannot orient {equation}\n{snapshot}")]
    Unorientable { equation: String, snapshot: Snapshot },

    /// Normalization ran out of passes.
    #[error("reduction taking too long: {original} reached {last}\n{snapshot}")]
    ReductionDivergence {
        original: String,
        last: String,
        snapshot: Snapshot,
    },

    /// A normal form was requested before the system is complete enough for
    /// that term.
    #[error("{reason}\n{snapshot}")]
    IncompleteSystem { reason: String, snapshot: Snapshot },

    /// The step budget, time limit or cancellation flag stopped completion.
    #[error("completion stopped after {steps} steps: {reason}\n{snapshot}")]
    BudgetExceeded {
        steps: usize,
        reason: String,
        snapshot: Snapshot,
    },

    /// A collaborator failed mid-step, or the engine was already failed.
    #[error("internal error: {message}\n{snapshot}")]
    Internal { message: String, snapshot: Snapshot },
}

impl KbError {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            KbError::Unorientable { snapshot, .. }
            | KbError::ReductionDivergence { snapshot, .. }
            | KbError::IncompleteSystem { snapshot, .. }
            | KbError::BudgetExceeded { snapshot, .. }
            | KbError::Internal { snapshot, .. } => snapshot,
        }
    }

    /// Does this error leave the engine usable for another attempt?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KbError::BudgetExceeded { .. } | KbError::IncompleteSystem { .. }
        )
    }
}
