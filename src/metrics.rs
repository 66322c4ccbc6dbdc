//! Completion metrics for profiling and analysis.
//!
//! When the `tracing` feature is enabled, counters are collected while the
//! engine runs. When disabled, all operations are no-ops.
//!
//! # Usage
//!
//! ```rust,ignore
//! let report = engine.metrics();
//! println!("Steps: {}, Rules: {}", report.steps, report.rules_added);
//! ```

#[cfg(feature = "tracing")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate counters for one engine.
///
/// All counters use relaxed ordering.
#[cfg(feature = "tracing")]
pub struct CompletionMetrics {
    /// Completion steps taken
    pub steps: AtomicU64,
    /// Equations oriented into rules
    pub rules_added: AtomicU64,
    /// Rules moved back to the worklist because their left side became reducible
    pub rules_collapsed: AtomicU64,
    /// Right sides rewritten by compose
    pub rules_composed: AtomicU64,
    /// Unorientable equations moved to the back of the worklist
    pub equations_deferred: AtomicU64,
    /// Critical pairs produced
    pub critical_pairs: AtomicU64,
    /// Critical pairs that survived the subsumption filter
    pub critical_pairs_kept: AtomicU64,
    /// Normalization passes
    pub reduction_passes: AtomicU64,
}

#[cfg(feature = "tracing")]
impl CompletionMetrics {
    pub fn new() -> Self {
        Self {
            steps: AtomicU64::new(0),
            rules_added: AtomicU64::new(0),
            rules_collapsed: AtomicU64::new(0),
            rules_composed: AtomicU64::new(0),
            equations_deferred: AtomicU64::new(0),
            critical_pairs: AtomicU64::new(0),
            critical_pairs_kept: AtomicU64::new(0),
            reduction_passes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rule_added(&self) {
        self.rules_added.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rule_collapsed(&self) {
        self.rules_collapsed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rule_composed(&self) {
        self.rules_composed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_deferred(&self) {
        self.equations_deferred.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch of critical pairs: `generated` before and `kept` after
    /// the subsumption filter.
    #[inline]
    pub fn record_critical_pairs(&self, generated: usize, kept: usize) {
        self.critical_pairs
            .fetch_add(generated as u64, Ordering::Relaxed);
        self.critical_pairs_kept
            .fetch_add(kept as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reduction_passes(&self, passes: usize) {
        self.reduction_passes
            .fetch_add(passes as u64, Ordering::Relaxed);
    }

    /// Generate a snapshot report of all metrics.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            steps: self.steps.load(Ordering::Relaxed),
            rules_added: self.rules_added.load(Ordering::Relaxed),
            rules_collapsed: self.rules_collapsed.load(Ordering::Relaxed),
            rules_composed: self.rules_composed.load(Ordering::Relaxed),
            equations_deferred: self.equations_deferred.load(Ordering::Relaxed),
            critical_pairs: self.critical_pairs.load(Ordering::Relaxed),
            critical_pairs_kept: self.critical_pairs_kept.load(Ordering::Relaxed),
            reduction_passes: self.reduction_passes.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.steps.store(0, Ordering::Relaxed);
        self.rules_added.store(0, Ordering::Relaxed);
        self.rules_collapsed.store(0, Ordering::Relaxed);
        self.rules_composed.store(0, Ordering::Relaxed);
        self.equations_deferred.store(0, Ordering::Relaxed);
        self.critical_pairs.store(0, Ordering::Relaxed);
        self.critical_pairs_kept.store(0, Ordering::Relaxed);
        self.reduction_passes.store(0, Ordering::Relaxed);
    }
}

#[cfg(feature = "tracing")]
impl Default for CompletionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsReport {
    pub steps: u64,
    pub rules_added: u64,
    pub rules_collapsed: u64,
    pub rules_composed: u64,
    pub equations_deferred: u64,
    pub critical_pairs: u64,
    pub critical_pairs_kept: u64,
    pub reduction_passes: u64,
}

impl MetricsReport {
    /// Fraction of critical pairs that survived subsumption.
    pub fn critical_pair_yield(&self) -> f64 {
        if self.critical_pairs == 0 {
            0.0
        } else {
            self.critical_pairs_kept as f64 / self.critical_pairs as f64
        }
    }
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Completion Metrics ===")?;
        writeln!(f, "Steps:              {}", self.steps)?;
        writeln!(
            f,
            "Rules:              {} added, {} collapsed, {} composed",
            self.rules_added, self.rules_collapsed, self.rules_composed
        )?;
        writeln!(f, "Deferred equations: {}", self.equations_deferred)?;
        writeln!(
            f,
            "Critical pairs:     {} ({} kept, {:.1}% yield)",
            self.critical_pairs,
            self.critical_pairs_kept,
            self.critical_pair_yield() * 100.0
        )?;
        writeln!(f, "Reduction passes:   {}", self.reduction_passes)?;
        Ok(())
    }
}

// No-op implementation when tracing is disabled
#[cfg(not(feature = "tracing"))]
pub struct CompletionMetrics;

#[cfg(not(feature = "tracing"))]
impl CompletionMetrics {
    #[inline]
    pub fn new() -> Self {
        CompletionMetrics
    }
    #[inline]
    pub fn record_step(&self) {}
    #[inline]
    pub fn record_rule_added(&self) {}
    #[inline]
    pub fn record_rule_collapsed(&self) {}
    #[inline]
    pub fn record_rule_composed(&self) {}
    #[inline]
    pub fn record_deferred(&self) {}
    #[inline]
    pub fn record_critical_pairs(&self, _generated: usize, _kept: usize) {}
    #[inline]
    pub fn record_reduction_passes(&self, _passes: usize) {}
    #[inline]
    pub fn report(&self) -> MetricsReport {
        MetricsReport::default()
    }
    #[inline]
    pub fn reset(&self) {}
}

#[cfg(not(feature = "tracing"))]
impl Default for CompletionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
