use okb::completion::{Completion, Status};
use okb::config::CompletionConfig;
use okb::equation::Equation;
use okb::fresh::VarSupply;
use okb::matching::match_term;
use okb::order::{Kbo, Lpo, Precedence, ReductionOrder};
use okb::rewrite::Rewriter;
use okb::subst::{apply_subst, Subst};
use okb::symbol::SymbolStore;
use okb::term::{TermId, TermStore};
use okb::unify::unify;
use proptest::prelude::*;
use smallvec::SmallVec;
use std::sync::Arc;

const MAX_VAR: u32 = 3;

/// Constants `a b e`, unary `g`, binary `*` and `h`.
const FUNCTOR_NAMES: [&str; 6] = ["a", "b", "e", "g", "*", "h"];

#[derive(Clone, Debug)]
enum RawTerm {
    Var(u32),
    App { f: usize, kids: Vec<RawTerm> },
}

fn leaf(ground: bool) -> BoxedStrategy<RawTerm> {
    let constants = prop_oneof![
        Just(RawTerm::App { f: 0, kids: vec![] }),
        Just(RawTerm::App { f: 1, kids: vec![] }),
        Just(RawTerm::App { f: 2, kids: vec![] }),
    ];
    if ground {
        constants.boxed()
    } else {
        prop_oneof![(0..=MAX_VAR).prop_map(RawTerm::Var), constants].boxed()
    }
}

fn term_strategy(ground: bool, depth: u32) -> impl Strategy<Value = RawTerm> {
    leaf(ground).prop_recursive(depth, 16, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|t| RawTerm::App {
                f: 3,
                kids: vec![t]
            }),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| RawTerm::App {
                f: 4,
                kids: vec![a, b],
            }),
            (inner.clone(), inner).prop_map(|(a, b)| RawTerm::App {
                f: 5,
                kids: vec![a, b],
            }),
        ]
    })
}

fn build_term(raw: &RawTerm, symbols: &SymbolStore, terms: &TermStore) -> TermId {
    match raw {
        RawTerm::Var(v) => terms.var(*v),
        RawTerm::App { f, kids } => {
            let func = symbols.intern(FUNCTOR_NAMES[*f]);
            let children: SmallVec<[TermId; 4]> = kids
                .iter()
                .map(|kid| build_term(kid, symbols, terms))
                .collect();
            terms.app(func, children)
        }
    }
}

fn stores() -> (Arc<SymbolStore>, Arc<TermStore>) {
    (Arc::new(SymbolStore::new()), Arc::new(TermStore::new()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn unifier_makes_both_sides_equal(
        left in term_strategy(false, 3),
        right in term_strategy(false, 3),
    ) {
        let (symbols, terms) = stores();
        let s = build_term(&left, &symbols, &terms);
        let t = build_term(&right, &symbols, &terms);
        if let Some(sigma) = unify(s, t, &terms) {
            prop_assert_eq!(apply_subst(s, &sigma, &terms), apply_subst(t, &sigma, &terms));
        }
    }

    #[test]
    fn instances_always_unify_with_their_pattern(
        pattern in term_strategy(false, 3),
        fillers in prop::collection::vec(term_strategy(true, 2), (MAX_VAR as usize) + 1),
    ) {
        let (symbols, terms) = stores();
        let p = build_term(&pattern, &symbols, &terms);
        let mut theta = Subst::new();
        for (v, raw) in fillers.iter().enumerate() {
            theta.bind(v as u32, build_term(raw, &symbols, &terms));
        }
        let instance = apply_subst(p, &theta, &terms);

        let sigma = match_term(p, instance, &terms);
        prop_assert!(sigma.is_some());
        prop_assert_eq!(apply_subst(p, &sigma.unwrap(), &terms), instance);
        prop_assert!(unify(p, instance, &terms).is_some());
    }

    #[test]
    fn matching_is_sound(
        pattern in term_strategy(false, 3),
        target in term_strategy(false, 3),
    ) {
        let (symbols, terms) = stores();
        let p = build_term(&pattern, &symbols, &terms);
        let t = build_term(&target, &symbols, &terms);
        if let Some(sigma) = match_term(p, t, &terms) {
            prop_assert_eq!(apply_subst(p, &sigma, &terms), t);
        }
    }

    #[test]
    fn orders_are_irreflexive_and_asymmetric(
        left in term_strategy(false, 3),
        right in term_strategy(false, 3),
    ) {
        let (symbols, terms) = stores();
        let s = build_term(&left, &symbols, &terms);
        let t = build_term(&right, &symbols, &terms);
        let precedence = Precedence::new(Arc::clone(&symbols)).with_order(&["h", "*", "g"]);
        let orders: [Box<dyn ReductionOrder>; 2] = [
            Box::new(Kbo::new(precedence.clone())),
            Box::new(Lpo::new(precedence)),
        ];
        for order in &orders {
            prop_assert!(!order.greater(s, s, &terms));
            prop_assert!(!(order.greater(s, t, &terms) && order.greater(t, s, &terms)));
        }
    }

    #[test]
    fn orders_contain_the_subterm_relation(inner in term_strategy(false, 3)) {
        let (symbols, terms) = stores();
        let t = build_term(&inner, &symbols, &terms);
        let wrapped = terms.app1(symbols.intern("g"), t);
        let precedence = Precedence::new(Arc::clone(&symbols));
        prop_assert!(Kbo::new(precedence.clone()).greater(wrapped, t, &terms));
        prop_assert!(Lpo::new(precedence).greater(wrapped, t, &terms));
    }

    #[test]
    fn normal_forms_are_idempotent(raw in term_strategy(false, 4)) {
        let (symbols, terms) = stores();
        let x = terms.var(0);
        let e = terms.app0(symbols.intern("e"));
        let star = symbols.intern("*");
        let rules = [
            Equation::new(terms.app2(star, e, x), x),
            Equation::new(terms.app2(star, x, e), x),
        ];
        let order = Kbo::new(Precedence::new(Arc::clone(&symbols)));
        let mut supply = VarSupply::default();
        let mut rewriter = Rewriter::new(&terms, &order, &mut supply, 1_000).with_rules(&rules);

        let t = build_term(&raw, &symbols, &terms);
        let once = rewriter.normalize(t).unwrap();
        prop_assert_eq!(rewriter.normalize(once).unwrap(), once);
        prop_assert!(terms.size(once) <= terms.size(t));
    }

    #[test]
    fn ground_normal_forms_are_idempotent_without_rules(raw in term_strategy(true, 4)) {
        let (symbols, terms) = stores();
        let x = terms.var(0);
        let y = terms.var(1);
        let equations: Vec<Equation> = ["*", "h"]
            .iter()
            .map(|name| {
                let f = symbols.intern(name);
                Equation::new(terms.app2(f, x, y), terms.app2(f, y, x))
            })
            .collect();
        let order = Kbo::new(Precedence::new(Arc::clone(&symbols)));
        let mut engine = Completion::new(
            Arc::clone(&symbols),
            Arc::clone(&terms),
            equations,
            order,
            CompletionConfig::default().with_max_steps(Some(100)),
        );
        engine.complete().unwrap();
        prop_assert_eq!(engine.status(), Status::GroundComplete);
        prop_assert!(engine.rules().is_empty());

        let t = build_term(&raw, &symbols, &terms);
        let once = engine.normal_form(t).unwrap();
        prop_assert_eq!(engine.normal_form(once), Ok(once));
        prop_assert_eq!(engine.equal(t, once), Ok(true));
    }

    #[test]
    fn ground_axioms_hold_after_completion(
        axioms in prop::collection::vec((term_strategy(true, 2), term_strategy(true, 2)), 1..4),
    ) {
        let (symbols, terms) = stores();
        let equations: Vec<Equation> = axioms
            .iter()
            .map(|(l, r)| Equation::new(build_term(l, &symbols, &terms), build_term(r, &symbols, &terms)))
            .collect();
        let order = Kbo::new(Precedence::new(Arc::clone(&symbols)));
        let mut engine = Completion::new(
            Arc::clone(&symbols),
            Arc::clone(&terms),
            equations.clone(),
            order.clone(),
            CompletionConfig::default().with_max_steps(Some(2_000)),
        );

        engine.complete().unwrap();
        prop_assert!(engine.is_complete());
        for rule in engine.rules() {
            prop_assert!(order.greater(rule.lhs, rule.rhs, &terms));
        }
        for eq in &equations {
            prop_assert_eq!(engine.equal(eq.lhs, eq.rhs), Ok(true));
            prop_assert_eq!(engine.normal_form(eq.lhs), engine.normal_form(eq.rhs));
        }
    }
}
