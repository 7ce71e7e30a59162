//! Binary relations along a sequence, counting where one of them breaks.
//!
//! `SeqBin(k, xs, c, b)` holds when `b(xs[i], xs[i + 1])` holds for every consecutive pair
//! and `k` equals one plus the number of consecutive pairs on which `c` does not hold,
//! i.e. the number of maximal stretches of `c`.
//!
//! Filtering works on the layered graph whose layer `i` holds the values of `xs[i]` and
//! whose arcs are the pairs accepted by `b`, weighted 0 when `c` holds and 1 otherwise.
//! For every value the set of path weights through it is the sum-set of the weights
//! reachable towards the end of the sequence and those reachable from its start.

use crate::constraint::Constraint;
use crate::error::{Inconsistency, ModelError, PropagationResult};
use crate::propagator::{Consistency, PropagationContext, Propagator, PropagatorControlBlock};
use crate::variable::{check_distinct, VarRef};
use tracing::trace;

const NO_RESIDUE: usize = usize::MAX;

/// A binary relation between consecutive values.
#[derive(Clone, Copy, Debug)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    True,
    Custom(fn(i64, i64) -> bool),
}

impl Relation {
    pub fn holds(self, a: i64, b: i64) -> bool {
        match self {
            Relation::Eq => a == b,
            Relation::Ne => a != b,
            Relation::Lt => a < b,
            Relation::Le => a <= b,
            Relation::Gt => a > b,
            Relation::Ge => a >= b,
            Relation::True => true,
            Relation::Custom(f) => f(a, b),
        }
    }
}

/// Number of stretches of `c` in `tuple`, or `None` if `b` breaks somewhere.
pub fn count_stretches(tuple: &[i64], c: Relation, b: Relation) -> Option<i64> {
    let mut stretches = 1;
    for w in tuple.windows(2) {
        if !b.holds(w[0], w[1]) {
            return None;
        }
        if !c.holds(w[0], w[1]) {
            stretches += 1;
        }
    }
    Some(stretches)
}

/// Flat per-(position, initial index) sets of violation counts in `[0, n)`.
struct CostSets {
    n: usize,
    base: Vec<usize>,
    bits: Vec<bool>,
}

impl CostSets {
    fn new(sizes: &[usize]) -> Self {
        let n = sizes.len();
        let mut base = Vec::with_capacity(n);
        let mut total = 0;
        for &s in sizes {
            base.push(total);
            total += s * n;
        }
        Self {
            n,
            base,
            bits: vec![false; total],
        }
    }

    fn clear(&mut self) {
        self.bits.fill(false);
    }

    fn offset(&self, i: usize, a: usize) -> usize {
        self.base[i] + a * self.n
    }

    fn get(&self, i: usize, a: usize) -> &[bool] {
        let o = self.offset(i, a);
        &self.bits[o..o + self.n]
    }

    fn insert(&mut self, i: usize, a: usize, cost: usize) {
        let o = self.offset(i, a);
        self.bits[o + cost] = true;
    }

    /// Adds `shift` to every count of `(from_i, from_a)` and merges them into `(i, a)`.
    fn merge_shifted(&mut self, i: usize, a: usize, from_i: usize, from_a: usize, shift: usize) {
        let src = self.offset(from_i, from_a);
        let dst = self.offset(i, a);
        for cost in 0..self.n - shift {
            if self.bits[src + cost] {
                self.bits[dst + cost + shift] = true;
            }
        }
    }
}

pub struct SeqBinPropagator {
    pcb: PropagatorControlBlock,
    /// `xs` followed by `k`.
    scope: Vec<VarRef>,
    c: Relation,
    b: Relation,
    /// Last support of each value in the next layer, by initial index.
    next_residue: Vec<Vec<usize>>,
    /// Last support of each value in the previous layer, by initial index.
    prev_residue: Vec<Vec<usize>>,
    forward: CostSets,
    backward: CostSets,
    feasible: Vec<bool>,
}

impl SeqBinPropagator {
    pub fn new(k: VarRef, xs: Vec<VarRef>, c: Relation, b: Relation) -> Result<Self, ModelError> {
        if xs.is_empty() {
            return Err(ModelError::InvalidArgument {
                constraint: "seqbin",
                reason: "empty sequence".to_owned(),
            });
        }
        let mut scope = xs;
        scope.push(k);
        check_distinct(&scope, "seqbin")?;
        let n = scope.len() - 1;
        let sizes: Vec<usize> = scope[..n].iter().map(|x| x.borrow().dom.init_size()).collect();
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            next_residue: sizes.iter().map(|&s| vec![NO_RESIDUE; s]).collect(),
            prev_residue: sizes.iter().map(|&s| vec![NO_RESIDUE; s]).collect(),
            forward: CostSets::new(&sizes),
            backward: CostSets::new(&sizes),
            feasible: vec![false; n],
            scope,
            c,
            b,
        })
    }

    fn len(&self) -> usize {
        self.scope.len() - 1
    }

    fn k(&self) -> &VarRef {
        &self.scope[self.len()]
    }

    /// Whether `xs[i]`'s value at index `a` still has a `b`-support in `xs[j]`, `j = i ± 1`.
    fn has_support(&mut self, i: usize, a: usize, j: usize) -> bool {
        let (xi, xj) = (self.scope[i].borrow(), self.scope[j].borrow());
        let residue = if j > i {
            &mut self.next_residue[i][a]
        } else {
            &mut self.prev_residue[i][a]
        };
        if *residue != NO_RESIDUE && xj.dom.contains(*residue) {
            return true;
        }
        let v = xi.dom.to_val(a);
        let found = xj.dom.iter().find(|&e| {
            let w = xj.dom.to_val(e);
            if j > i {
                self.b.holds(v, w)
            } else {
                self.b.holds(w, v)
            }
        });
        match found {
            Some(e) => {
                *residue = e;
                true
            }
            None => false,
        }
    }

    fn prune_unsupported(&mut self, i: usize, j: usize) -> PropagationResult {
        let present: Vec<usize> = self.scope[i].borrow().dom.iter().collect();
        let doomed: Vec<usize> = present
            .into_iter()
            .filter(|&a| !self.has_support(i, a, j))
            .collect();
        self.scope[i].borrow_mut().dom.remove_indices(doomed)
    }

    /// Removes values without a `b`-support in a neighbouring layer.
    fn filter_b(&mut self) -> PropagationResult {
        if matches!(self.b, Relation::True) {
            return Ok(());
        }
        let n = self.len();
        for i in (0..n - 1).rev() {
            self.prune_unsupported(i, i + 1)?;
        }
        for i in 1..n {
            self.prune_unsupported(i, i - 1)?;
        }
        Ok(())
    }

    fn arc_cost(&self, v: i64, w: i64) -> usize {
        usize::from(!self.c.holds(v, w))
    }

    /// Fills `forward` (suffix costs) and `backward` (prefix costs) from the current domains.
    fn compute_cost_sets(&mut self) {
        let n = self.len();
        self.forward.clear();
        self.backward.clear();
        let doms: Vec<_> = self.scope[..n].iter().map(|x| x.borrow()).collect();
        for a in doms[n - 1].dom.iter() {
            self.forward.insert(n - 1, a, 0);
        }
        for i in (0..n - 1).rev() {
            for a in doms[i].dom.iter() {
                let v = doms[i].dom.to_val(a);
                for e in doms[i + 1].dom.iter() {
                    let w = doms[i + 1].dom.to_val(e);
                    if self.b.holds(v, w) {
                        let shift = self.arc_cost(v, w);
                        self.forward.merge_shifted(i, a, i + 1, e, shift);
                    }
                }
            }
        }
        for a in doms[0].dom.iter() {
            self.backward.insert(0, a, 0);
        }
        for i in 1..n {
            for a in doms[i].dom.iter() {
                let v = doms[i].dom.to_val(a);
                for e in doms[i - 1].dom.iter() {
                    let w = doms[i - 1].dom.to_val(e);
                    if self.b.holds(w, v) {
                        let shift = self.arc_cost(w, v);
                        self.backward.merge_shifted(i, a, i - 1, e, shift);
                    }
                }
            }
        }
    }

    /// Whether some total violation count through `(i, a)` is `allowed`.
    fn total_cost_allowed(&self, i: usize, a: usize, allowed: &[bool]) -> bool {
        let fwd = self.forward.get(i, a);
        let bwd = self.backward.get(i, a);
        for (f, _) in fwd.iter().enumerate().filter(|(_, &x)| x) {
            for (g, _) in bwd.iter().enumerate().filter(|(_, &x)| x) {
                if f + g < allowed.len() && allowed[f + g] {
                    return true;
                }
            }
        }
        false
    }
}

impl Constraint for SeqBinPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.scope
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        let n = self.len();
        count_stretches(&tuple[..n], self.c, self.b) == Some(tuple[n])
    }
}

impl Propagator for SeqBinPropagator {
    fn name(&self) -> &'static str {
        "seqbin"
    }

    fn consistency(&self) -> Consistency {
        Consistency::Gac
    }

    #[tracing::instrument(name = "seqbin", level = "trace", skip(self))]
    fn run_propagator(&mut self, ctx: PropagationContext) -> PropagationResult {
        let n = self.len();
        self.filter_b()?;
        self.compute_cost_sets();

        // Counts realised by some full path; every path crosses layer 0.
        self.feasible.fill(false);
        {
            let x0 = self.scope[0].borrow();
            for a in x0.dom.iter() {
                for (cost, &f) in self.forward.get(0, a).iter().enumerate() {
                    self.feasible[cost] |= f;
                }
            }
        }
        let feasible = &self.feasible;
        self.k()
            .borrow_mut()
            .dom
            .remove_values_where(|v| !(1..=n as i64).contains(&v) || !feasible[(v - 1) as usize])?;

        // Violation counts `k` still allows.
        let mut allowed = vec![false; n];
        for v in self.k().borrow().iter() {
            allowed[(v - 1) as usize] = true;
        }
        if !allowed.iter().any(|&x| x) {
            return Err(Inconsistency::NoSupport { constraint: "seqbin" });
        }
        for i in 0..n {
            let present: Vec<usize> = self.scope[i].borrow().dom.iter().collect();
            let doomed: Vec<usize> = present
                .into_iter()
                .filter(|&a| !self.total_cost_allowed(i, a, &allowed))
                .collect();
            if doomed.is_empty() {
                continue;
            }
            trace!(position = i, removed = doomed.len(), "values off every allowed path");
            self.scope[i].borrow_mut().dom.remove_indices(doomed)?;
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
