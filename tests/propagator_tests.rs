use fdprop::alldifferent::{AllDifferentACPropagator, AllDifferentWeakPropagator};
use fdprop::cardinality::{CardinalityACPropagator, CardinalityCountingPropagator};
use fdprop::circuit::CircuitPropagator;
use fdprop::cmp::{LessEqualPropagator, NeqPropagator};
use fdprop::config::Config;
use fdprop::constraint::Constraint;
use fdprop::cumulative::CumulativePropagator;
use fdprop::error::{Inconsistency, ModelError};
use fdprop::propagator::{PropagationContext, PropagationLevel, Propagator};
use fdprop::seqbin::{Relation, SeqBinPropagator};
use fdprop::solver::Solver;
use fdprop::state::SolverState;
use fdprop::variable::{new_var, VarRef};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

fn assert_domain(mut it: impl Iterator<Item = i64>, expected: Vec<i64>) {
    let mut it1 = expected.iter().cloned();
    loop {
        match (it.next(), it1.next()) {
            (None, None) => break,
            (None, Some(y)) => panic!("Domain iterator ended, but expected value {}", y),
            (Some(x), None) => panic!("Expected domain iterator to end, but got value {}", x),
            (Some(x), Some(y)) => assert_eq!(x, y, "Expected value {} in domain, but got {}", y, x),
        }
    }
}

fn root() -> PropagationContext {
    PropagationContext {
        depth: 0,
        trigger: None,
    }
}

fn checked_solver() -> Solver {
    Solver::new(Config {
        check_idempotence: true,
        ..Config::default()
    })
}

fn values_of(mask: u8, offset: i64) -> Vec<i64> {
    (0..8).filter(|b| mask >> b & 1 == 1).map(|b| b + offset).collect()
}

fn domains(vars: &[VarRef]) -> Vec<Vec<i64>> {
    vars.iter().map(|v| v.borrow().iter().collect()).collect()
}

fn for_each_tuple(doms: &[Vec<i64>], cur: &mut Vec<i64>, f: &mut impl FnMut(&[i64])) {
    if cur.len() == doms.len() {
        f(cur);
        return;
    }
    for &v in &doms[cur.len()] {
        cur.push(v);
        for_each_tuple(doms, cur, f);
        cur.pop();
    }
}

/// Values of each position that appear in some accepted tuple; `None` if none is accepted.
fn supported_values(doms: &[Vec<i64>], accept: impl Fn(&[i64]) -> bool) -> Option<Vec<Vec<i64>>> {
    let mut supported = vec![Vec::new(); doms.len()];
    let mut any = false;
    for_each_tuple(doms, &mut Vec::new(), &mut |t| {
        if accept(t) {
            any = true;
            for (i, &v) in t.iter().enumerate() {
                if !supported[i].contains(&v) {
                    supported[i].push(v);
                }
            }
        }
    });
    for s in &mut supported {
        s.sort_unstable();
    }
    any.then_some(supported)
}

#[test]
fn test_alldifferent() {
    let fake_solver_state = Rc::new(RefCell::new(SolverState::new()));
    let x = new_var(&fake_solver_state, "x", vec![0, 1, 2]).unwrap();
    let y = new_var(&fake_solver_state, "y", vec![0]).unwrap();
    let z = new_var(&fake_solver_state, "z", vec![2]).unwrap();
    let mut p = AllDifferentACPropagator::new(vec![x.clone(), y.clone(), z.clone()]).unwrap();
    assert_eq!(p.run_propagator(root()), Ok(()));
    assert_domain(x.borrow().iter(), vec![1]);
    assert_domain(y.borrow().iter(), vec![0]);
    assert_domain(z.borrow().iter(), vec![2]);
}

#[test]
fn test_alldifferent_saturated_pair() {
    let mut solver = checked_solver();
    let x = solver.new_variable("x", [1, 2]).unwrap();
    let y = solver.new_variable("y", [1, 2]).unwrap();
    let z = solver.new_variable("z", [1, 2, 3]).unwrap();
    solver
        .post_alldifferent(vec![x.clone(), y.clone(), z.clone()])
        .unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(x.borrow().iter(), vec![1, 2]);
    assert_domain(y.borrow().iter(), vec![1, 2]);
    assert_domain(z.borrow().iter(), vec![3]);
    assert_eq!(solver.fixed_variables().len(), 1);
}

#[test]
fn test_alldifferent_pigeonhole_fails() {
    let mut solver = Solver::new(Config::default());
    let vars: Vec<_> = (0..3)
        .map(|i| solver.new_range(&format!("x{i}"), 0, 1).unwrap())
        .collect();
    solver.post_alldifferent(vars).unwrap();
    assert_eq!(
        solver.propagate(),
        Err(Inconsistency::NoSupport {
            constraint: "alldifferent"
        })
    );
    assert_eq!(solver.stats().fails, 1);
}

#[test]
fn test_alldifferent_rejects_repeated_variable() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let x = new_var(&state, "x", vec![0, 1]).unwrap();
    assert!(matches!(
        AllDifferentACPropagator::new(vec![x.clone(), x]),
        Err(ModelError::DuplicateVariable(name, "alldifferent")) if name == "x"
    ));
}

#[test]
fn test_alldifferent_matching_survives_backtrack() {
    let mut solver = checked_solver();
    let vars: Vec<_> = (0..4)
        .map(|i| solver.new_range(&format!("x{i}"), 0, 3).unwrap())
        .collect();
    solver.post_alldifferent(vars.clone()).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    for v in 0..4 {
        let depth = solver.push_depth();
        solver.assign(&vars[0], v).unwrap();
        assert_eq!(solver.propagate(), Ok(()));
        for other in &vars[1..] {
            assert!(!other.borrow().dom.contains_value(v));
        }
        solver.backtrack_to(depth - 1);
        assert_domain(vars[1].borrow().iter(), vec![0, 1, 2, 3]);
    }
}

#[test]
fn test_alldifferent_weak() {
    let mut solver = Solver::new(Config {
        alldifferent_level: PropagationLevel::Weak,
        ..Config::default()
    });
    let x = solver.new_variable("x", [1, 2]).unwrap();
    let y = solver.new_variable("y", [1, 2]).unwrap();
    let z = solver.new_variable("z", [1, 2, 3]).unwrap();
    solver
        .post_alldifferent(vec![x.clone(), y.clone(), z.clone()])
        .unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(z.borrow().iter(), vec![1, 2, 3]);
    solver.assign(&x, 1).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(y.borrow().iter(), vec![2]);
    assert_domain(z.borrow().iter(), vec![3]);
    assert!(solver.check_solution());
}

#[test]
fn test_alldifferent_weak_detects_clash() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let x = new_var(&state, "x", vec![4]).unwrap();
    let y = new_var(&state, "y", vec![4]).unwrap();
    let mut p = AllDifferentWeakPropagator::new(vec![x, y]).unwrap();
    assert_eq!(p.run_propagator(root()), Err(Inconsistency::EmptyDomain { var: 1 }));
}

proptest! {
    #[test]
    fn prop_alldifferent_is_gac(masks in proptest::collection::vec(1u8..16, 4)) {
        let mut solver = checked_solver();
        let vars: Vec<_> = masks
            .iter()
            .enumerate()
            .map(|(i, &m)| solver.new_variable(&format!("x{i}"), values_of(m, 0)).unwrap())
            .collect();
        let expected = supported_values(&domains(&vars), |t| {
            (0..t.len()).all(|i| (i + 1..t.len()).all(|j| t[i] != t[j]))
        });
        solver.post_alldifferent(vars.clone()).unwrap();
        match expected {
            Some(expected) => {
                prop_assert_eq!(solver.propagate(), Ok(()));
                prop_assert_eq!(domains(&vars), expected);
            }
            None => prop_assert!(solver.propagate().is_err()),
        }
    }
}

#[test]
fn test_cardinality_exact_counts() {
    let mut solver = checked_solver();
    let vars: Vec<_> = (0..3)
        .map(|i| solver.new_range(&format!("x{i}"), 0, 2).unwrap())
        .collect();
    solver
        .post_cardinality(vars.clone(), vec![0, 1, 2], vec![0, 1, 2], vec![1, 1, 2])
        .unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    for var in &vars {
        assert_domain(var.borrow().iter(), vec![1, 2]);
    }
    let depth = solver.push_depth();
    solver.assign(&vars[0], 1).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(vars[1].borrow().iter(), vec![2]);
    assert_domain(vars[2].borrow().iter(), vec![2]);
    assert!(solver.check_solution());
    solver.backtrack_to(depth - 1);
    assert_domain(vars[2].borrow().iter(), vec![1, 2]);
}

#[test]
fn test_cardinality_leaves_unlisted_values_free() {
    let mut solver = checked_solver();
    let vars: Vec<_> = (0..3)
        .map(|i| solver.new_range(&format!("x{i}"), 0, 3).unwrap())
        .collect();
    solver
        .post_cardinality(vars.clone(), vec![0], vec![0], vec![0])
        .unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    for var in &vars {
        assert_domain(var.borrow().iter(), vec![1, 2, 3]);
    }
}

#[test]
fn test_cardinality_rejects_bad_arguments() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let x = new_var(&state, "x", vec![0, 1]).unwrap();
    let y = new_var(&state, "y", vec![0, 1]).unwrap();
    let vars = vec![x, y];
    assert!(matches!(
        CardinalityACPropagator::new(vars.clone(), vec![0, 1], vec![0], vec![1, 1]),
        Err(ModelError::LengthMismatch { what: "min_occs", expected: 2, found: 1, .. })
    ));
    assert!(matches!(
        CardinalityACPropagator::new(vars.clone(), vec![0], vec![2], vec![1]),
        Err(ModelError::InvalidArgument { constraint: "cardinality", .. })
    ));
    assert!(matches!(
        CardinalityCountingPropagator::new(vars, vec![0, 0], vec![0, 0], vec![1, 1]),
        Err(ModelError::InvalidArgument { constraint: "cardinality", .. })
    ));
}

#[test]
fn test_cardinality_counting() {
    let mut solver = Solver::new(Config {
        cardinality_level: PropagationLevel::Weak,
        ..Config::default()
    });
    let vars: Vec<_> = (0..4)
        .map(|i| solver.new_range(&format!("x{i}"), 0, 2).unwrap())
        .collect();
    solver
        .post_cardinality(vars.clone(), vec![0, 1], vec![0, 2], vec![1, 2])
        .unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    let depth = solver.push_depth();
    solver.assign(&vars[0], 0).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    for var in &vars[1..] {
        assert_domain(var.borrow().iter(), vec![1, 2]);
    }
    solver.remove_value(&vars[1], 1).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(vars[2].borrow().iter(), vec![1]);
    assert_domain(vars[3].borrow().iter(), vec![1]);
    solver.backtrack_to(depth - 1);
    for var in &vars {
        assert_domain(var.borrow().iter(), vec![0, 1, 2]);
    }
    solver.assign(&vars[0], 1).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
}

proptest! {
    #[test]
    fn prop_cardinality_is_gac(
        masks in proptest::collection::vec(1u8..8, 3),
        bounds in proptest::collection::vec((0usize..3, 0usize..3), 3),
    ) {
        let min_occs: Vec<usize> = bounds.iter().map(|b| b.0).collect();
        let max_occs: Vec<usize> = bounds.iter().map(|b| b.0 + b.1).collect();
        prop_assume!(min_occs.iter().sum::<usize>() <= 3);
        let mut solver = checked_solver();
        let vars: Vec<_> = masks
            .iter()
            .enumerate()
            .map(|(i, &m)| solver.new_variable(&format!("x{i}"), values_of(m, 0)).unwrap())
            .collect();
        let expected = supported_values(&domains(&vars), |t| {
            (0..3).all(|v| {
                let c = t.iter().filter(|&&w| w == v as i64).count();
                min_occs[v] <= c && c <= max_occs[v]
            })
        });
        solver
            .post_cardinality(vars.clone(), vec![0, 1, 2], min_occs, max_occs)
            .unwrap();
        match expected {
            Some(expected) => {
                prop_assert_eq!(solver.propagate(), Ok(()));
                prop_assert_eq!(domains(&vars), expected);
            }
            None => prop_assert!(solver.propagate().is_err()),
        }
    }

    #[test]
    fn prop_cardinality_counting_is_sound(
        masks in proptest::collection::vec(1u8..8, 3),
        bounds in proptest::collection::vec((0usize..3, 0usize..3), 3),
    ) {
        let min_occs: Vec<usize> = bounds.iter().map(|b| b.0).collect();
        let max_occs: Vec<usize> = bounds.iter().map(|b| b.0 + b.1).collect();
        prop_assume!(min_occs.iter().sum::<usize>() <= 3);
        let state = Rc::new(RefCell::new(SolverState::new()));
        let vars: Vec<_> = masks
            .iter()
            .enumerate()
            .map(|(i, &m)| new_var(&state, &format!("x{i}"), values_of(m, 0)).unwrap())
            .collect();
        let expected = supported_values(&domains(&vars), |t| {
            (0..3).all(|v| {
                let c = t.iter().filter(|&&w| w == v as i64).count();
                min_occs[v] <= c && c <= max_occs[v]
            })
        });
        let mut p = CardinalityCountingPropagator::new(vars.clone(), vec![0, 1, 2], min_occs, max_occs).unwrap();
        match (p.run_propagator(root()), expected) {
            (Ok(()), Some(expected)) => {
                for (x, values) in expected.iter().enumerate() {
                    for &v in values {
                        prop_assert!(vars[x].borrow().dom.contains_value(v));
                    }
                }
            }
            (Err(_), Some(_)) => prop_assert!(false, "failed on a satisfiable instance"),
            (_, None) => {}
        }
    }
}

#[test]
fn test_cumulative_two_tasks() {
    let mut solver = Solver::new(Config::default());
    let s0 = solver.new_range("s0", 0, 4).unwrap();
    let s1 = solver.new_range("s1", 0, 4).unwrap();
    let p = CumulativePropagator::new(vec![s0.clone(), s1.clone()], vec![2, 2], vec![2, 2], 3).unwrap();
    solver.post(Box::new(p));
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(s1.borrow().iter(), vec![0, 1, 2, 3, 4]);
    solver.push_depth();
    solver.assign(&s0, 0).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(s1.borrow().iter(), vec![2, 3, 4]);
}

#[test]
fn test_cumulative_profile_and_omega() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let s0 = new_var(&state, "s0", vec![0]).unwrap();
    let s1 = new_var(&state, "s1", (0..=6).collect()).unwrap();
    let s2 = new_var(&state, "s2", vec![8]).unwrap();
    let mut p = CumulativePropagator::new(
        vec![s0.clone(), s1.clone(), s2.clone()],
        vec![3, 2, 1],
        vec![1, 1, 1],
        1,
    )
    .unwrap();
    assert_eq!(p.run_propagator(root()), Ok(()));
    assert_domain(s1.borrow().iter(), vec![3, 4, 5, 6]);
    assert_eq!(p.slots().len(), 2);
    // Both fixed tasks lie outside every placement of s1.
    assert_eq!(p.relevant_tasks(), &[1]);
}

#[test]
fn test_cumulative_overflow_fails() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let s0 = new_var(&state, "s0", vec![1]).unwrap();
    let s1 = new_var(&state, "s1", vec![2]).unwrap();
    let mut p = CumulativePropagator::new(vec![s0, s1], vec![2, 2], vec![2, 2], 3).unwrap();
    assert_eq!(
        p.run_propagator(root()),
        Err(Inconsistency::NoSupport {
            constraint: "cumulative"
        })
    );
    assert!(!p.check_values(&[1, 2]));
    assert!(p.check_values(&[1, 3]));
}

#[test]
fn test_cumulative_rejects_mismatched_lengths() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let s0 = new_var(&state, "s0", vec![0, 1]).unwrap();
    assert!(matches!(
        CumulativePropagator::new(vec![s0], vec![1, 1], vec![1], 1),
        Err(ModelError::LengthMismatch { what: "lengths", .. })
    ));
}

#[test]
fn test_cumulative_omega_restored_on_backtrack() {
    let mut solver = Solver::new(Config::default());
    let starts: Vec<_> = (0..3)
        .map(|i| solver.new_range(&format!("s{i}"), 0, 6).unwrap())
        .collect();
    let p = CumulativePropagator::new(starts.clone(), vec![2, 2, 2], vec![1, 1, 1], 1).unwrap();
    solver.post(Box::new(p));
    assert_eq!(solver.propagate(), Ok(()));
    let depth = solver.push_depth();
    solver.assign(&starts[0], 0).unwrap();
    solver.assign(&starts[1], 2).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(starts[2].borrow().iter(), vec![4, 5, 6]);
    solver.backtrack_to(depth - 1);
    solver.push_depth();
    solver.assign(&starts[0], 5).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(starts[1].borrow().iter(), vec![0, 1, 2, 3]);
    assert_domain(starts[2].borrow().iter(), vec![0, 1, 2, 3]);
}

#[test]
fn test_cumulative_own_part_inside_equal_profile() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let a = new_var(&state, "a", vec![1, 2]).unwrap();
    let b = new_var(&state, "b", vec![4]).unwrap();
    let mut p = CumulativePropagator::new(vec![a.clone(), b.clone()], vec![3, 2], vec![1, 1], 1).unwrap();
    assert!(p.check_values(&[1, 4]));
    assert_eq!(p.run_propagator(root()), Ok(()));
    assert_domain(a.borrow().iter(), vec![1]);
    assert_domain(b.borrow().iter(), vec![4]);
    // [2, 4) belongs to a, [4, 6) to b.
    assert_eq!(p.slots().len(), 2);
}

proptest! {
    #[test]
    fn prop_cumulative_is_sound(
        tasks in proptest::collection::vec((1u8..=255, 1i64..4, 1i64..3), 2..4),
        limit in 1i64..4,
    ) {
        let mut solver = Solver::new(Config::default());
        let starts: Vec<VarRef> = tasks
            .iter()
            .enumerate()
            .map(|(i, &(m, _, _))| solver.new_variable(&format!("s{i}"), values_of(m, 0)).unwrap())
            .collect();
        let lengths: Vec<i64> = tasks.iter().map(|t| t.1).collect();
        let heights: Vec<i64> = tasks.iter().map(|t| t.2).collect();
        let checker =
            CumulativePropagator::new(starts.clone(), lengths.clone(), heights.clone(), limit).unwrap();
        solver.post(Box::new(
            CumulativePropagator::new(starts.clone(), lengths, heights, limit).unwrap(),
        ));

        let expected = supported_values(&domains(&starts), |t| checker.check_values(t));
        let result = solver.propagate();
        let Some(expected) = expected else {
            return Ok(());
        };
        prop_assert_eq!(result, Ok(()), "failed on a satisfiable instance");
        for (x, values) in expected.iter().enumerate() {
            for &v in values {
                prop_assert!(starts[x].borrow().dom.contains_value(v));
            }
        }
        let root_domains = domains(&starts);

        let depth = solver.push_depth();
        solver.assign(&starts[0], root_domains[0][0]).unwrap();
        let expected = supported_values(&domains(&starts), |t| checker.check_values(t));
        let result = solver.propagate();
        if let Some(expected) = expected {
            prop_assert_eq!(result, Ok(()), "failed on a satisfiable branch");
            for (x, values) in expected.iter().enumerate() {
                for &v in values {
                    prop_assert!(starts[x].borrow().dom.contains_value(v));
                }
            }
        }
        solver.backtrack_to(depth - 1);
        prop_assert_eq!(domains(&starts), root_domains.clone());

        // Once every start is fixed, only a feasible tuple may survive.
        solver.push_depth();
        let tuple: Vec<i64> = root_domains.iter().map(|d| d[d.len() - 1]).collect();
        for (s, &v) in starts.iter().zip(&tuple) {
            solver.assign(s, v).unwrap();
        }
        prop_assert_eq!(solver.propagate().is_ok(), checker.check_values(&tuple));
    }
}

fn relation(i: usize) -> Relation {
    [Relation::Le, Relation::Eq, Relation::Lt, Relation::Ne, Relation::True][i]
}

proptest! {
    #[test]
    fn prop_seqbin_check_values(
        tuple in proptest::collection::vec(0i64..3, 1..7),
        c in 0usize..5,
        b in 0usize..5,
        k in 0i64..9,
    ) {
        let (c, b) = (relation(c), relation(b));
        let state = Rc::new(RefCell::new(SolverState::new()));
        let xs: Vec<_> = (0..tuple.len())
            .map(|i| new_var(&state, &format!("x{i}"), (0..3).collect()).unwrap())
            .collect();
        let kv = new_var(&state, "k", (0..9).collect()).unwrap();
        let p = SeqBinPropagator::new(kv, xs, c, b).unwrap();
        let mut violations = 0;
        let mut gated = true;
        for i in 1..tuple.len() {
            gated &= b.holds(tuple[i - 1], tuple[i]);
            if !c.holds(tuple[i - 1], tuple[i]) {
                violations += 1;
            }
        }
        let mut full = tuple.clone();
        full.push(k);
        prop_assert_eq!(p.check_values(&full), gated && k == 1 + violations);
    }

    #[test]
    fn prop_seqbin_is_gac(
        masks in proptest::collection::vec(1u8..8, 3),
        k_mask in 1u8..8,
        c in 0usize..5,
        b in 0usize..5,
    ) {
        let (c, b) = (relation(c), relation(b));
        let mut solver = checked_solver();
        let xs: Vec<_> = masks
            .iter()
            .enumerate()
            .map(|(i, &m)| solver.new_variable(&format!("x{i}"), values_of(m, 0)).unwrap())
            .collect();
        let k = solver.new_variable("k", values_of(k_mask, 1)).unwrap();
        let mut scope = xs.clone();
        scope.push(k.clone());
        let p = SeqBinPropagator::new(k, xs, c, b).unwrap();
        let expected = supported_values(&domains(&scope), |t| p.check_values(t));
        solver.post(Box::new(p));
        match expected {
            Some(expected) => {
                prop_assert_eq!(solver.propagate(), Ok(()));
                prop_assert_eq!(domains(&scope), expected);
            }
            None => prop_assert!(solver.propagate().is_err()),
        }
    }
}

#[test]
fn test_seqbin_counts_stretches() {
    let mut solver = checked_solver();
    let xs: Vec<_> = (0..4)
        .map(|i| solver.new_range(&format!("x{i}"), 0, 3).unwrap())
        .collect();
    let k = solver.new_range("k", 1, 10).unwrap();
    // Strictly increasing over four positions and four values: one stretch only.
    let p = SeqBinPropagator::new(k.clone(), xs.clone(), Relation::Lt, Relation::True).unwrap();
    solver.post(Box::new(p));
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(k.borrow().iter(), vec![1, 2, 3, 4]);
    solver.assign(&k, 1).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    for (i, x) in xs.iter().enumerate() {
        assert_domain(x.borrow().iter(), vec![i as i64]);
    }
    assert!(solver.check_solution());
}

#[test]
fn test_seqbin_rejects_empty_sequence() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let k = new_var(&state, "k", vec![1]).unwrap();
    assert!(matches!(
        SeqBinPropagator::new(k, vec![], Relation::Eq, Relation::True),
        Err(ModelError::InvalidArgument { constraint: "seqbin", .. })
    ));
}

#[test]
fn test_circuit() {
    let mut solver = Solver::new(Config::default());
    let succ: Vec<_> = (0..3)
        .map(|i| solver.new_range(&format!("s{i}"), 0, 2).unwrap())
        .collect();
    solver.post(Box::new(CircuitPropagator::new(succ.clone(), 0).unwrap()));
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(succ[0].borrow().iter(), vec![1, 2]);
    assert_domain(succ[1].borrow().iter(), vec![0, 2]);
    assert_domain(succ[2].borrow().iter(), vec![0, 1]);
    solver.push_depth();
    solver.assign(&succ[0], 1).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(succ[1].borrow().iter(), vec![2]);
    assert_domain(succ[2].borrow().iter(), vec![0]);
    assert!(solver.check_solution());
}

#[test]
fn test_circuit_breaks_subtours() {
    let mut solver = Solver::new(Config::default());
    let succ: Vec<_> = (0..4)
        .map(|i| solver.new_range(&format!("s{i}"), 1, 4).unwrap())
        .collect();
    solver.post(Box::new(CircuitPropagator::new(succ.clone(), 1).unwrap()));
    assert_eq!(solver.propagate(), Ok(()));
    solver.push_depth();
    // 0 -> 1 -> 2 may not close back to 0.
    solver.assign(&succ[0], 2).unwrap();
    solver.assign(&succ[1], 3).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(succ[2].borrow().iter(), vec![4]);
    assert_domain(succ[3].borrow().iter(), vec![1]);
}

#[test]
fn test_circuit_check_values() {
    let state = Rc::new(RefCell::new(SolverState::new()));
    let succ: Vec<_> = (0..4)
        .map(|i| new_var(&state, &format!("s{i}"), (0..4).collect()).unwrap())
        .collect();
    let p = CircuitPropagator::new(succ, 0).unwrap();
    assert!(p.check_values(&[1, 2, 3, 0]));
    assert!(p.check_values(&[3, 0, 1, 2]));
    assert!(!p.check_values(&[1, 0, 3, 2]));
    assert!(!p.check_values(&[0, 2, 3, 1]));
    assert!(!p.check_values(&[1, 2, 3, 4]));
}

#[test]
fn test_less_equal_and_neq() {
    let mut solver = checked_solver();
    let x = solver.new_range("x", 0, 5).unwrap();
    let y = solver.new_range("y", 0, 5).unwrap();
    solver.post(Box::new(LessEqualPropagator::new(x.clone(), y.clone(), 2).unwrap()));
    solver.post(Box::new(NeqPropagator::new(x.clone(), y.clone()).unwrap()));
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(x.borrow().iter(), vec![0, 1, 2, 3]);
    assert_domain(y.borrow().iter(), vec![2, 3, 4, 5]);
    solver.push_depth();
    solver.remove_value(&y, 5).unwrap();
    solver.remove_value(&y, 4).unwrap();
    assert_eq!(solver.propagate(), Ok(()));
    assert_domain(x.borrow().iter(), vec![0, 1]);
}
