//! Completion policy flags and budgets.

use crate::rewrite::DEFAULT_MAX_GROWTH;
use std::time::Duration;

/// Configuration for a [`Completion`](crate::completion::Completion) engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Keep unorientable equations instead of failing.
    pub unfailing: bool,
    /// Reorder the worklist after each step, cheapest equations first.
    pub sort_worklist: bool,
    /// Steps allowed per `complete()` or `equal()` call.
    pub max_steps: Option<usize>,
    /// Wall-clock limit per `complete()` or `equal()` call.
    pub time_limit: Option<Duration>,
    /// Passes allowed per normalization.
    pub max_reduction_passes: usize,
    /// Nodes a term may gain during one normalization.
    pub max_term_growth: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            unfailing: true,
            sort_worklist: true,
            max_steps: Some(10_000),
            time_limit: None,
            max_reduction_passes: 10_000,
            max_term_growth: DEFAULT_MAX_GROWTH,
        }
    }
}

impl CompletionConfig {
    pub fn with_unfailing(mut self, unfailing: bool) -> Self {
        self.unfailing = unfailing;
        self
    }

    pub fn with_sort_worklist(mut self, sort: bool) -> Self {
        self.sort_worklist = sort;
        self
    }

    /// `None` removes the step budget.
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_max_reduction_passes(mut self, passes: usize) -> Self {
        self.max_reduction_passes = passes;
        self
    }

    pub fn with_max_term_growth(mut self, growth: usize) -> Self {
        self.max_term_growth = growth;
        self
    }
}
