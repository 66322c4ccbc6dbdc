//! Unfailing Knuth–Bendix completion.
//!
//! The engine owns a worklist of equations and an ordered list of rules. Each
//! step picks an equation, orients it into a rule when the order allows (or
//! defers it in unfailing mode), adds its critical pairs, and then
//! interreduces: collapse, compose, simplify, sort, self-subsumption.
//!
//! Rules are tried in insertion order, so intermediate normal forms are
//! deterministic for a given input.

mod render;

use crate::config::CompletionConfig;
use crate::critical::{OverlapCtx, Superposer};
use crate::equation::{subsumes, subsumes_any_direction, Equation};
use crate::error::{KbError, Snapshot};
use crate::fresh::VarSupply;
use crate::metrics::{CompletionMetrics, MetricsReport};
use crate::order::ReductionOrder;
use crate::rewrite::{RewriteError, Rewriter};
use crate::symbol::SymbolStore;
use crate::term::{TermId, TermStore};
use render::{by_length, render_equation, render_term};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::trace::{debug, debug_span, info, warn};

/// Where the engine stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More steps are needed.
    Running,
    /// Worklist empty: the rules decide equality of all terms.
    Complete,
    /// Only unorientable equations remain and all their critical pairs join:
    /// equality of ground terms is decided.
    GroundComplete,
    /// A step failed; the engine only serves diagnostics now.
    Failed,
}

/// Per-call step, time and cancellation budget.
struct Budget {
    max_steps: Option<usize>,
    deadline: Option<Instant>,
    taken: usize,
}

impl Budget {
    fn start(config: &CompletionConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            deadline: config.time_limit.map(|limit| Instant::now() + limit),
            taken: 0,
        }
    }

    /// Why the next step may not run, if it may not.
    fn exhausted(&self, cancel: &AtomicBool) -> Option<String> {
        if cancel.load(Ordering::Relaxed) {
            return Some("cancelled".to_string());
        }
        if let Some(max) = self.max_steps {
            if self.taken >= max {
                return Some(format!("step budget of {} exhausted", max));
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some("time limit reached".to_string());
            }
        }
        None
    }
}

/// A completion engine over a shared term store.
pub struct Completion<O: ReductionOrder> {
    symbols: Arc<SymbolStore>,
    terms: Arc<TermStore>,
    order: O,
    config: CompletionConfig,
    equations: Vec<Equation>,
    rules: Vec<Equation>,
    supply: VarSupply,
    superposer: Superposer,
    status: Status,
    cancel: Arc<AtomicBool>,
    metrics: CompletionMetrics,
    steps: usize,
}

impl<O: ReductionOrder> Completion<O> {
    /// Create an engine for `equations`. Trivial and duplicate equations are
    /// dropped. Input variables are reserved so the fresh-variable supply
    /// never reuses them.
    pub fn new(
        symbols: Arc<SymbolStore>,
        terms: Arc<TermStore>,
        equations: Vec<Equation>,
        order: O,
        config: CompletionConfig,
    ) -> Self {
        let mut worklist = Vec::with_capacity(equations.len());
        for eq in equations.into_iter().filter(|eq| !eq.is_trivial()) {
            add(&mut worklist, eq);
        }
        let mut engine = Self {
            symbols,
            terms,
            order,
            config,
            equations: worklist,
            rules: Vec::new(),
            supply: VarSupply::default(),
            superposer: Superposer::new(),
            status: Status::Running,
            cancel: Arc::new(AtomicBool::new(false)),
            metrics: CompletionMetrics::new(),
            steps: 0,
        };
        engine.reserve_input_vars();
        engine
    }

    /// Replace the fresh-variable source. Input variables stay reserved.
    pub fn with_fresh_vars(mut self, vars: impl Iterator<Item = u32> + Send + 'static) -> Self {
        self.supply = VarSupply::new(vars);
        self.reserve_input_vars();
        self
    }

    fn reserve_input_vars(&mut self) {
        for eq in self.equations.iter().chain(self.rules.iter()) {
            self.supply.reserve(eq.vars(&self.terms));
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }

    pub fn is_ground_complete(&self) -> bool {
        matches!(self.status, Status::Complete | Status::GroundComplete)
    }

    /// Pending equations, in worklist order.
    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    /// Active rules, in application order.
    pub fn rules(&self) -> &[Equation] {
        &self.rules
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Change the per-call budget. Completion state is kept.
    pub fn set_budget(&mut self, max_steps: Option<usize>, time_limit: Option<Duration>) {
        self.config.max_steps = max_steps;
        self.config.time_limit = time_limit;
    }

    pub fn terms(&self) -> &Arc<TermStore> {
        &self.terms
    }

    pub fn symbols(&self) -> &Arc<SymbolStore> {
        &self.symbols
    }

    /// Steps taken over the engine's lifetime.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    /// Setting the returned flag stops a running `complete()` or `equal()`
    /// before its next step.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    // ========== QUERIES ==========

    /// Run until the engine is complete or ground-complete.
    ///
    /// Budget failures leave the engine usable; any other failure leaves it
    /// [`Status::Failed`].
    pub fn complete(&mut self) -> Result<(), KbError> {
        self.cancel.store(false, Ordering::Relaxed);
        let mut budget = Budget::start(&self.config);
        loop {
            if self.check_terminal()? {
                return Ok(());
            }
            if let Some(reason) = budget.exhausted(&self.cancel) {
                return Err(self.budget_error(budget.taken, reason));
            }
            self.advance()?;
            budget.taken += 1;
        }
    }

    /// One completion step. Returns `true` once the engine is terminal.
    pub fn step(&mut self) -> Result<bool, KbError> {
        if self.check_terminal()? {
            return Ok(true);
        }
        self.advance()?;
        Ok(false)
    }

    /// Decide `lhs = rhs`, advancing completion lazily until both sides meet
    /// or the engine is terminal.
    ///
    /// A ground-complete engine that still separates the sides answers
    /// `false`.
    pub fn equal(&mut self, lhs: TermId, rhs: TermId) -> Result<bool, KbError> {
        self.ensure_usable()?;
        self.reserve_query_vars(&[lhs, rhs]);
        self.cancel.store(false, Ordering::Relaxed);
        let mut budget = Budget::start(&self.config);
        loop {
            let sides = self.normalize_full(&[lhs, rhs])?;
            if sides[0] == sides[1] {
                return Ok(true);
            }
            if self.check_terminal()? {
                return Ok(false);
            }
            if let Some(reason) = budget.exhausted(&self.cancel) {
                return Err(self.budget_error(budget.taken, reason));
            }
            self.advance()?;
            budget.taken += 1;
        }
    }

    /// Canonical form of `term`. Ground terms need a ground-complete engine;
    /// terms with variables need a complete one.
    pub fn normal_form(&mut self, term: TermId) -> Result<TermId, KbError> {
        self.ensure_usable()?;
        if self.terms.is_ground(term) {
            if !self.is_ground_complete() {
                return Err(KbError::IncompleteSystem {
                    reason: "cannot find ground normal form for ground incomplete system"
                        .to_string(),
                    snapshot: self.snapshot(),
                });
            }
        } else if !self.is_complete() {
            return Err(KbError::IncompleteSystem {
                reason: "cannot find normal form for incomplete system".to_string(),
                snapshot: self.snapshot(),
            });
        }
        self.reduce(term)
    }

    /// Normalize `term` with the current rules and, in unfailing mode, the
    /// current equations. No completeness requirement.
    pub fn reduce(&mut self, term: TermId) -> Result<TermId, KbError> {
        self.ensure_usable()?;
        self.reserve_query_vars(&[term]);
        let rules = self.rules.clone();
        let equations = self.active_equations();
        self.normalize_one(&rules, &equations, term)
    }

    /// Equations, a blank line, then rules; each block shortest first, with
    /// engine-generated variables renamed `v0`, `v1`, ... per line.
    pub fn render(&self) -> String {
        let snapshot = self.snapshot();
        let mut blocks = Vec::new();
        if !snapshot.equations.is_empty() {
            blocks.push(snapshot.equations.join("\n"));
        }
        if !snapshot.rules.is_empty() {
            blocks.push(snapshot.rules.join("\n"));
        }
        blocks.join("\n\n")
    }

    /// Rendered equations and rules, each sorted shortest first.
    pub fn snapshot(&self) -> Snapshot {
        let mut equations: Vec<String> = self
            .equations
            .iter()
            .map(|eq| self.render_pair(eq, "="))
            .collect();
        let mut rules: Vec<String> = self
            .rules
            .iter()
            .map(|rule| self.render_pair(rule, "->"))
            .collect();
        equations.sort_by(|a, b| by_length(a, b));
        rules.sort_by(|a, b| by_length(a, b));
        Snapshot { equations, rules }
    }

    /// Render one term the way [`render`](Self::render) does.
    pub fn render_term(&self, term: TermId) -> String {
        render_term(term, &self.terms, &self.symbols, &self.supply)
    }

    fn render_pair(&self, eq: &Equation, sep: &str) -> String {
        render_equation(eq, sep, &self.terms, &self.symbols, &self.supply)
    }

    // ========== STEP ==========

    /// Recompute the terminal state. Errors here poison the engine.
    fn check_terminal(&mut self) -> Result<bool, KbError> {
        match self.status {
            Status::Complete | Status::GroundComplete => return Ok(true),
            Status::Failed => return Err(self.poisoned()),
            Status::Running => {}
        }
        if self.equations.is_empty() {
            self.status = Status::Complete;
            #[cfg(feature = "tracing")]
            info!(rules = self.rules.len(), steps = self.steps, "complete");
            return Ok(true);
        }
        let ground = self.all_unorientable()
            && self.poison_on_err(|kb| kb.all_pairs_join())?;
        if ground {
            self.status = Status::GroundComplete;
            #[cfg(feature = "tracing")]
            info!(
                equations = self.equations.len(),
                rules = self.rules.len(),
                steps = self.steps,
                "ground_complete"
            );
        }
        Ok(ground)
    }

    fn advance(&mut self) -> Result<(), KbError> {
        self.poison_on_err(|kb| kb.advance_inner())
    }

    fn poison_on_err<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, KbError>,
    ) -> Result<T, KbError> {
        let result = f(self);
        if result.is_err() {
            self.status = Status::Failed;
        }
        result
    }

    fn advance_inner(&mut self) -> Result<(), KbError> {
        self.steps += 1;
        self.metrics.record_step();

        #[cfg(feature = "tracing")]
        let _span = debug_span!(
            "step",
            step = self.steps,
            equations = self.equations.len(),
            rules = self.rules.len()
        )
        .entered();

        let st = self.pick()?;
        let (s, t) = (st.lhs, st.rhs);
        let oriented = if self.order.greater(s, t, &self.terms) {
            Some(Equation::new(s, t))
        } else if self.order.greater(t, s, &self.terms) {
            Some(Equation::new(t, s))
        } else if s == t {
            remove(&mut self.equations, st);
            return Ok(());
        } else {
            None
        };

        match oriented {
            Some(ab) => {
                #[cfg(feature = "tracing")]
                debug!(rule = %self.render_pair(&ab, "->"), "rule_added");
                self.metrics.record_rule_added();
                add(&mut self.rules, ab);
                let pairs = self.superpose(ab, false)?;
                let generated = pairs.len();
                let kept = self.filter_subsumed(pairs);
                self.metrics.record_critical_pairs(generated, kept.len());
                for eq in kept {
                    add(&mut self.equations, eq);
                }
                remove(&mut self.equations, st);
                self.collapse_by(ab)?;
            }
            None => {
                if !self.config.unfailing {
                    return Err(KbError::Unorientable {
                        equation: self.render_pair(&st, "="),
                        snapshot: self.snapshot(),
                    });
                }
                #[cfg(feature = "tracing")]
                debug!(equation = %self.render_pair(&st, "="), "equation_deferred");
                self.metrics.record_deferred();
                remove(&mut self.equations, st);
                self.equations.push(st);

                let ba = st.reversed();
                let mut generated = 0;
                let mut kept = Vec::new();
                for (source, extended) in [(st, false), (ba, false), (st, true), (ba, true)] {
                    let pairs = self.superpose(source, extended)?;
                    generated += pairs.len();
                    kept.extend(self.filter_subsumed(pairs));
                }
                self.metrics.record_critical_pairs(generated, kept.len());
                for eq in kept {
                    add(&mut self.equations, eq);
                }
            }
        }

        self.compose()?;
        self.simplify()?;
        if self.config.sort_worklist {
            self.sort_worklist();
        }
        self.remove_self_subsumed();
        Ok(())
    }

    /// First orientable equation, else the first one.
    fn pick(&self) -> Result<Equation, KbError> {
        self.equations
            .iter()
            .copied()
            .find(|eq| self.order.orientable(eq.lhs, eq.rhs, &self.terms))
            .or_else(|| self.equations.first().copied())
            .ok_or_else(|| self.internal("step called with an empty worklist"))
    }

    fn all_unorientable(&self) -> bool {
        self.equations
            .iter()
            .all(|eq| !self.order.orientable(eq.lhs, eq.rhs, &self.terms))
    }

    /// Critical pairs of `ab` from the engine's superposer.
    fn superpose(&mut self, ab: Equation, extended: bool) -> Result<Vec<Equation>, KbError> {
        let mut ctx = OverlapCtx {
            order: &self.order,
            supply: &mut self.supply,
            terms: &self.terms,
        };
        let result = if extended {
            self.superposer
                .against_all(&self.equations, &self.rules, ab, &mut ctx)
        } else {
            self.superposer.against_rules(&self.rules, ab, &mut ctx)
        };
        result.map_err(|err| self.internal(err))
    }

    /// Drop candidates that an existing equation subsumes.
    fn filter_subsumed(&self, candidates: Vec<Equation>) -> Vec<Equation> {
        candidates
            .into_iter()
            .filter(|cand| {
                !self
                    .equations
                    .iter()
                    .any(|eq| subsumes(eq, cand, &self.terms))
            })
            .collect()
    }

    /// Move rules whose left side `ab` rewrites back to the front of the
    /// worklist.
    fn collapse_by(&mut self, ab: Equation) -> Result<(), KbError> {
        let only = [ab];
        let others: Vec<Equation> = self.rules.iter().copied().filter(|r| *r != ab).collect();
        for rule in others {
            let lhs = self.normalize_one(&only, &[], rule.lhs)?;
            if lhs != rule.lhs {
                #[cfg(feature = "tracing")]
                debug!(rule = %self.render_pair(&rule, "->"), "rule_collapsed");
                self.metrics.record_rule_collapsed();
                add_front(&mut self.equations, Equation::new(lhs, rule.rhs));
                remove(&mut self.rules, rule);
            }
        }
        Ok(())
    }

    /// Normalize right sides with the other rules until none changes.
    fn compose(&mut self) -> Result<(), KbError> {
        loop {
            let mut changed = None;
            let rules = self.rules.clone();
            for (i, rule) in rules.iter().copied().enumerate() {
                let others: Vec<Equation> = rules
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, r)| *r)
                    .collect();
                let rhs = self.normalize_one(&others, &[], rule.rhs)?;
                if rhs != rule.rhs {
                    changed = Some((i, Equation::new(rule.lhs, rhs)));
                    break;
                }
            }
            let Some((i, composed)) = changed else {
                return Ok(());
            };
            #[cfg(feature = "tracing")]
            debug!(rule = %self.render_pair(&composed, "->"), "rule_composed");
            self.metrics.record_rule_composed();
            if self.rules.contains(&composed) {
                self.rules.remove(i);
            } else {
                self.rules[i] = composed;
            }
        }
    }

    /// Normalize both sides of every equation with the rules; drop the ones
    /// that become trivial.
    fn simplify(&mut self) -> Result<(), KbError> {
        let rules = self.rules.clone();
        let sides: Vec<TermId> = self
            .equations
            .iter()
            .flat_map(|eq| [eq.lhs, eq.rhs])
            .collect();
        let reduced = self.normalize_with(&rules, &[], &sides)?;
        let mut next = Vec::with_capacity(self.equations.len());
        for pair in reduced.chunks_exact(2) {
            let eq = Equation::new(pair[0], pair[1]);
            if !eq.is_trivial() {
                add(&mut next, eq);
            }
        }
        self.equations = next;
        Ok(())
    }

    /// Shortest rendering first. In unfailing mode orientable equations go
    /// ahead of unorientable ones.
    fn sort_worklist(&mut self) {
        let all = std::mem::take(&mut self.equations);
        if !self.config.unfailing {
            self.equations = self.sorted_by_rendering(all);
            return;
        }
        let (orientable, unorientable): (Vec<Equation>, Vec<Equation>) = all
            .into_iter()
            .partition(|eq| self.order.orientable(eq.lhs, eq.rhs, &self.terms));
        let mut sorted = self.sorted_by_rendering(orientable);
        sorted.extend(self.sorted_by_rendering(unorientable));
        self.equations = sorted;
    }

    fn sorted_by_rendering(&self, eqs: Vec<Equation>) -> Vec<Equation> {
        let mut keyed: Vec<(String, Equation)> = eqs
            .into_iter()
            .map(|eq| (self.render_pair(&eq, "="), eq))
            .collect();
        keyed.sort_by(|a, b| by_length(&a.0, &b.0));
        keyed.into_iter().map(|(_, eq)| eq).collect()
    }

    /// Remove worklist equations subsumed by another remaining one, in either
    /// direction.
    fn remove_self_subsumed(&mut self) {
        let mut i = 0;
        while i < self.equations.len() {
            let cand = self.equations[i];
            let subsumed = self
                .equations
                .iter()
                .any(|other| *other != cand && subsumes_any_direction(other, &cand, &self.terms));
            if subsumed {
                self.equations.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Every critical pair of the worklist and rules, computed afresh and
    /// reduced by the whole system, joins.
    fn all_pairs_join(&mut self) -> Result<bool, KbError> {
        let equations = self.equations.clone();
        let rules = self.rules.clone();
        let sources = equations
            .iter()
            .map(|eq| (*eq, true))
            .chain(rules.iter().map(|r| (*r, false)));

        for (source, extended) in sources {
            let mut local = Superposer::new();
            let mut ctx = OverlapCtx {
                order: &self.order,
                supply: &mut self.supply,
                terms: &self.terms,
            };
            let overlapped = if extended {
                local.against_all(&equations, &rules, source, &mut ctx)
            } else {
                local.against_rules(&rules, source, &mut ctx)
            };
            let pairs = overlapped.map_err(|err| self.internal(err))?;

            let mut reduced = Vec::new();
            for pair in pairs {
                let sides = self.normalize_full(&[pair.lhs, pair.rhs])?;
                let eq = Equation::new(sides[0], sides[1]);
                if !eq.is_trivial() {
                    add(&mut reduced, eq);
                }
            }
            for pair in self.filter_subsumed(reduced) {
                let sides = self.normalize_full(&[pair.lhs, pair.rhs])?;
                if sides[0] != sides[1] {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    // ========== NORMALIZATION ==========

    /// Equations usable for rewriting: all of them in unfailing mode, none
    /// otherwise.
    fn active_equations(&self) -> Vec<Equation> {
        if self.config.unfailing {
            self.equations.clone()
        } else {
            Vec::new()
        }
    }

    /// Normalize with all rules, plus the equations in unfailing mode.
    fn normalize_full(&mut self, targets: &[TermId]) -> Result<Vec<TermId>, KbError> {
        let rules = self.rules.clone();
        let equations = self.active_equations();
        self.normalize_with(&rules, &equations, targets)
    }

    fn normalize_one(
        &mut self,
        rules: &[Equation],
        equations: &[Equation],
        target: TermId,
    ) -> Result<TermId, KbError> {
        let mut out = self.normalize_with(rules, equations, &[target])?;
        out.pop()
            .ok_or_else(|| self.internal("normalization returned no term"))
    }

    /// Normalize each target with one rewriter, so the pass memo is shared.
    fn normalize_with(
        &mut self,
        rules: &[Equation],
        equations: &[Equation],
        targets: &[TermId],
    ) -> Result<Vec<TermId>, KbError> {
        let mut rewriter = Rewriter::new(
            &self.terms,
            &self.order,
            &mut self.supply,
            self.config.max_reduction_passes,
        )
        .with_max_growth(self.config.max_term_growth)
        .with_rules(rules)
        .with_equations(equations);

        let mut out = Vec::with_capacity(targets.len());
        let mut failure = None;
        for &target in targets {
            match rewriter.normalize(target) {
                Ok(normal) => out.push(normal),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        let passes = rewriter.passes();
        self.metrics.record_reduction_passes(passes);
        match failure {
            Some(err) => Err(self.rewrite_error(err)),
            None => Ok(out),
        }
    }

    fn reserve_query_vars(&mut self, roots: &[TermId]) {
        for &root in roots {
            self.supply.reserve(self.terms.vars(root).iter().copied());
        }
    }

    // ========== ERRORS ==========

    fn ensure_usable(&self) -> Result<(), KbError> {
        if self.status == Status::Failed {
            return Err(self.poisoned());
        }
        Ok(())
    }

    fn poisoned(&self) -> KbError {
        self.internal("engine failed in an earlier step")
    }

    fn internal(&self, message: impl Display) -> KbError {
        KbError::Internal {
            message: message.to_string(),
            snapshot: self.snapshot(),
        }
    }

    fn budget_error(&self, steps: usize, reason: String) -> KbError {
        #[cfg(feature = "tracing")]
        warn!(steps, reason = %reason, "completion_budget_exceeded");
        KbError::BudgetExceeded {
            steps,
            reason,
            snapshot: self.snapshot(),
        }
    }

    fn rewrite_error(&self, err: RewriteError) -> KbError {
        match err {
            RewriteError::Diverged { original, last, .. } => {
                #[cfg(feature = "tracing")]
                warn!(term = %self.render_term(original), "reduction_diverged");
                KbError::ReductionDivergence {
                    original: self.render_term(original),
                    last: self.render_term(last),
                    snapshot: self.snapshot(),
                }
            }
            other => self.internal(other),
        }
    }
}

/// Append unless already present.
fn add(list: &mut Vec<Equation>, eq: Equation) {
    if !list.contains(&eq) {
        list.push(eq);
    }
}

/// Prepend unless already present.
fn add_front(list: &mut Vec<Equation>, eq: Equation) {
    if !list.contains(&eq) {
        list.insert(0, eq);
    }
}

fn remove(list: &mut Vec<Equation>, eq: Equation) {
    list.retain(|other| *other != eq);
}
