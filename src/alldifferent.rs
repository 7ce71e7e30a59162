use crate::constraint::Constraint;
use crate::domain::Domain;
use crate::error::{Inconsistency, ModelError, PropagationResult};
use crate::matching::Matcher;
use crate::propagator::{Consistency, PropagationContext, Propagator, PropagatorControlBlock};
use crate::variable::{check_distinct, VarRef};
use rustc_hash::FxHashSet;
use std::cell::Ref;
use tracing::trace;

pub(crate) fn all_distinct(tuple: &[i64]) -> bool {
    let mut vals = FxHashSet::default();
    tuple.iter().all(|v| vals.insert(*v))
}

/// Runs matching-based filtering over `vars`; shared with the circuit constraint.
pub(crate) fn filter_with_matching(
    vars: &[VarRef],
    matcher: &mut Matcher,
    constraint: &'static str,
) -> PropagationResult {
    let removals = {
        let refs: Vec<Ref<'_, _>> = vars.iter().map(|v| v.borrow()).collect();
        let doms: Vec<&Domain> = refs.iter().map(|v| &v.dom).collect();
        if !matcher.find_maximum_matching(&doms) {
            trace!(constraint, "no matching covers the scope");
            return Err(Inconsistency::NoSupport { constraint });
        }
        matcher.inconsistent_pairs(&doms).to_vec()
    };
    if !removals.is_empty() {
        trace!(constraint, removed = removals.len(), "values outside every maximum matching");
    }
    for (x, a) in removals {
        vars[x].borrow_mut().dom.remove(a)?;
    }
    Ok(())
}

/// All different, filtered to generalized arc consistency by matching.
pub struct AllDifferentACPropagator {
    pcb: PropagatorControlBlock,
    vars: Vec<VarRef>,
    matcher: Matcher,
}

impl AllDifferentACPropagator {
    pub fn new(vars: Vec<VarRef>) -> Result<Self, ModelError> {
        check_distinct(&vars, "alldifferent")?;
        let matcher = {
            let refs: Vec<_> = vars.iter().map(|v| v.borrow()).collect();
            let doms: Vec<&Domain> = refs.iter().map(|v| &v.dom).collect();
            Matcher::new(&doms)
        };
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            vars,
            matcher,
        })
    }

    /// Value currently matched to scope position `x`.
    pub fn matched_value(&self, x: usize) -> Option<i64> {
        self.matcher.matched_value(x)
    }
}

impl Constraint for AllDifferentACPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.vars
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        all_distinct(tuple)
    }
}

impl Propagator for AllDifferentACPropagator {
    fn name(&self) -> &'static str {
        "alldifferent"
    }

    fn consistency(&self) -> Consistency {
        Consistency::Gac
    }

    #[tracing::instrument(name = "alldifferent", level = "trace", skip(self))]
    fn run_propagator(&mut self, ctx: PropagationContext) -> PropagationResult {
        filter_with_matching(&self.vars, &mut self.matcher, "alldifferent")
    }

    fn get_cb(&self) -> &PropagatorControlBlock {
        &self.pcb
    }

    fn get_cb_mut(&mut self) -> &mut PropagatorControlBlock {
        &mut self.pcb
    }
}

/// All different, filtered only by removing fixed values from the other domains.
pub struct AllDifferentWeakPropagator {
    pcb: PropagatorControlBlock,
    vars: Vec<VarRef>,
}

impl AllDifferentWeakPropagator {
    pub fn new(vars: Vec<VarRef>) -> Result<Self, ModelError> {
        check_distinct(&vars, "alldifferent")?;
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            vars,
        })
    }
}

impl Constraint for AllDifferentWeakPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.vars
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        all_distinct(tuple)
    }
}

impl Propagator for AllDifferentWeakPropagator {
    fn name(&self) -> &'static str {
        "alldifferent_weak"
    }

    fn run_propagator(&mut self, _ctx: PropagationContext) -> PropagationResult {
        for (i, var) in self.vars.iter().enumerate() {
            let Some(v) = var.borrow().try_value() else {
                continue;
            };
            for (j, other) in self.vars.iter().enumerate() {
                if i != j {
                    other.borrow_mut().dom.remove_value(v)?;
                }
            }
        }
        Ok(())
    }

    fn get_cb(&self) -> &PropagatorControlBlock {
        &self.pcb
    }

    fn get_cb_mut(&mut self) -> &mut PropagatorControlBlock {
        &mut self.pcb
    }
}
