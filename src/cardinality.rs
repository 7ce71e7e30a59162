use crate::constraint::Constraint;
use crate::domain::Domain;
use crate::error::{Inconsistency, ModelError, PropagationResult};
use crate::flow::FlowNetwork;
use crate::propagator::{Consistency, PropagationContext, Propagator, PropagatorControlBlock};
use crate::scc::Scc;
use crate::sparse_set::ReversibleSparseSet;
use crate::variable::{check_distinct, VarRef};
use crate::Depth;
use rustc_hash::FxHashMap;
use std::cell::Ref;
use tracing::trace;

/// Occurrence bounds shared by both cardinality propagators.
struct Occurrences {
    values: Vec<i64>,
    min_occs: Vec<usize>,
    max_occs: Vec<usize>,
}

impl Occurrences {
    fn new(
        n_vars: usize,
        values: Vec<i64>,
        min_occs: Vec<usize>,
        max_occs: Vec<usize>,
    ) -> Result<Self, ModelError> {
        for (what, found) in [("min_occs", min_occs.len()), ("max_occs", max_occs.len())] {
            if found != values.len() {
                return Err(ModelError::LengthMismatch {
                    constraint: "cardinality",
                    what,
                    expected: values.len(),
                    found,
                });
            }
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for (i, &v) in values.iter().enumerate() {
            if !seen.insert(v) {
                return Err(ModelError::InvalidArgument {
                    constraint: "cardinality",
                    reason: format!("value {v} is listed twice"),
                });
            }
            if min_occs[i] > max_occs[i] {
                return Err(ModelError::InvalidArgument {
                    constraint: "cardinality",
                    reason: format!(
                        "value {v} needs at least {} and at most {} occurrences",
                        min_occs[i], max_occs[i]
                    ),
                });
            }
        }
        let required: usize = min_occs.iter().sum();
        if required > n_vars {
            return Err(ModelError::InvalidArgument {
                constraint: "cardinality",
                reason: format!("{required} occurrences are required from {n_vars} variables"),
            });
        }
        Ok(Self {
            values,
            min_occs,
            max_occs,
        })
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        let mut counts = FxHashMap::<i64, usize>::default();
        for v in tuple {
            *counts.entry(*v).or_insert(0) += 1;
        }
        self.values.iter().enumerate().all(|(i, v)| {
            let c = counts.get(v).copied().unwrap_or(0);
            self.min_occs[i] <= c && c <= self.max_occs[i]
        })
    }
}

/// Global cardinality filtered to generalized arc consistency.
///
/// Every call computes a flow from positions to values that meets the lower bounds
/// first and then completes within the upper bounds. A value is kept for a position
/// iff the position and the value end up in the same strongly connected component of
/// the residual network, the sink included.
pub struct CardinalityACPropagator {
    pcb: PropagatorControlBlock,
    vars: Vec<VarRef>,
    occs: Occurrences,
    /// Value of every value node: the union of initial domains and listed values.
    val_of: Vec<i64>,
    node_of: Vec<Vec<usize>>,
    low: Vec<i32>,
    high: Vec<i32>,
    gr: Vec<Vec<usize>>,
    scc: Scc,
}

impl CardinalityACPropagator {
    pub fn new(
        vars: Vec<VarRef>,
        values: Vec<i64>,
        min_occs: Vec<usize>,
        max_occs: Vec<usize>,
    ) -> Result<Self, ModelError> {
        check_distinct(&vars, "cardinality")?;
        let n = vars.len();
        let occs = Occurrences::new(n, values, min_occs, max_occs)?;
        let mut val_of: Vec<i64> = vars
            .iter()
            .flat_map(|v| v.borrow().dom.initial_values().to_vec())
            .chain(occs.values.iter().copied())
            .collect();
        val_of.sort_unstable();
        val_of.dedup();
        let node: FxHashMap<i64, usize> = val_of.iter().enumerate().map(|(g, &v)| (v, g)).collect();
        let node_of = vars
            .iter()
            .map(|v| v.borrow().dom.initial_values().iter().map(|w| node[w]).collect())
            .collect();
        let mut low = vec![0; val_of.len()];
        let mut high = vec![n as i32; val_of.len()];
        for (i, v) in occs.values.iter().enumerate() {
            low[node[v]] = occs.min_occs[i] as i32;
            high[node[v]] = occs.max_occs[i].min(n) as i32;
        }
        let m = val_of.len();
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            vars,
            occs,
            val_of,
            node_of,
            low,
            high,
            gr: vec![Vec::new(); n + m + 1],
            scc: Scc::new(),
        })
    }

    /// `(position, domain index)` pairs outside every feasible flow, or `None` if no
    /// flow exists.
    fn inconsistent_pairs(&mut self, doms: &[&Domain]) -> Option<Vec<(usize, usize)>> {
        let n = doms.len();
        let m = self.val_of.len();
        let (s, t) = (n + m, n + m + 1);
        let mut net = FlowNetwork::new(n + m + 2);
        for x in 0..n {
            net.add_edge(s, x, 1);
        }
        let mut arcs = Vec::new();
        for (x, dom) in doms.iter().enumerate() {
            for a in dom.iter() {
                let g = self.node_of[x][a];
                arcs.push((x, a, g, net.add_edge(x, n + g, 1)));
            }
        }
        let sink_edges: Vec<usize> = (0..m).map(|g| net.add_edge(n + g, t, self.low[g])).collect();
        let required: i32 = self.low.iter().sum();
        let mut flow = net.max_flow(s, t);
        if flow < required {
            trace!(flow, required, "lower bounds cannot be met");
            return None;
        }
        for (g, &e) in sink_edges.iter().enumerate() {
            net.set_capacity(e, self.high[g]);
        }
        flow += net.max_flow(s, t);
        if flow < n as i32 {
            trace!(flow, n, "upper bounds leave a position unassigned");
            return None;
        }

        let sink = n + m;
        for adj in &mut self.gr {
            adj.clear();
        }
        for &(x, _, g, e) in &arcs {
            if net.flow(e) == 1 {
                self.gr[n + g].push(x);
            } else {
                self.gr[x].push(n + g);
            }
        }
        for (g, &e) in sink_edges.iter().enumerate() {
            let f = net.flow(e);
            if f < self.high[g] {
                self.gr[n + g].push(sink);
            }
            if f > self.low[g] {
                self.gr[sink].push(n + g);
            }
        }
        self.scc.compute(&self.gr);
        Some(
            arcs.into_iter()
                .filter(|&(x, _, g, e)| net.flow(e) == 0 && !self.scc.same_component(x, n + g))
                .map(|(x, a, _, _)| (x, a))
                .collect(),
        )
    }
}

impl Constraint for CardinalityACPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.vars
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        self.occs.check_values(tuple)
    }
}

impl Propagator for CardinalityACPropagator {
    fn name(&self) -> &'static str {
        "cardinality"
    }

    fn consistency(&self) -> Consistency {
        Consistency::Gac
    }

    #[tracing::instrument(name = "cardinality", level = "trace", skip(self))]
    fn run_propagator(&mut self, ctx: PropagationContext) -> PropagationResult {
        let vars = self.vars.clone();
        let removals = {
            let refs: Vec<Ref<'_, _>> = vars.iter().map(|v| v.borrow()).collect();
            let doms: Vec<&Domain> = refs.iter().map(|v| &v.dom).collect();
            self.inconsistent_pairs(&doms)
                .ok_or(Inconsistency::NoSupport { constraint: "cardinality" })?
        };
        for (x, a) in removals {
            vars[x].borrow_mut().dom.remove(a)?;
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

/// Global cardinality filtered by counting.
///
/// For each listed value: fail if it is fixed too often or can no longer be taken
/// often enough, remove it from the unfixed positions once it is saturated, and fix
/// every candidate to it once all of them are needed. Unfixed positions are kept in
/// a reversible sparse set.
pub struct CardinalityCountingPropagator {
    pcb: PropagatorControlBlock,
    vars: Vec<VarRef>,
    occs: Occurrences,
    unfixed: ReversibleSparseSet,
}

impl CardinalityCountingPropagator {
    pub fn new(
        vars: Vec<VarRef>,
        values: Vec<i64>,
        min_occs: Vec<usize>,
        max_occs: Vec<usize>,
    ) -> Result<Self, ModelError> {
        check_distinct(&vars, "cardinality")?;
        let occs = Occurrences::new(vars.len(), values, min_occs, max_occs)?;
        let unfixed = ReversibleSparseSet::new(vars.len());
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            vars,
            occs,
            unfixed,
        })
    }

    fn sweep_fixed(&mut self, depth: Depth) {
        let newly_fixed: Vec<usize> = self
            .unfixed
            .present()
            .iter()
            .copied()
            .filter(|&x| self.vars[x].borrow().is_assigned())
            .collect();
        for x in newly_fixed {
            self.unfixed.remove(x, depth);
        }
    }
}

impl Constraint for CardinalityCountingPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.vars
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        self.occs.check_values(tuple)
    }
}

impl Propagator for CardinalityCountingPropagator {
    fn name(&self) -> &'static str {
        "cardinality_counting"
    }

    fn run_propagator(&mut self, ctx: PropagationContext) -> PropagationResult {
        for i in 0..self.occs.values.len() {
            self.sweep_fixed(ctx.depth);
            let v = self.occs.values[i];
            let fixed = self
                .unfixed
                .absent()
                .iter()
                .filter(|&&x| self.vars[x].borrow().value() == v)
                .count();
            let candidates: Vec<usize> = self
                .unfixed
                .present()
                .iter()
                .copied()
                .filter(|&x| self.vars[x].borrow().dom.contains_value(v))
                .collect();
            let (min, max) = (self.occs.min_occs[i], self.occs.max_occs[i]);
            if fixed > max || fixed + candidates.len() < min {
                trace!(value = v, fixed, candidates = candidates.len(), min, max, "count out of bounds");
                return Err(Inconsistency::NoSupport {
                    constraint: "cardinality",
                });
            }
            if fixed == max {
                for x in candidates {
                    self.vars[x].borrow_mut().dom.remove_value(v)?;
                }
            } else if fixed + candidates.len() == min {
                for x in candidates {
                    self.vars[x].borrow_mut().dom.reduce_to_value(v)?;
                }
            }
        }
        self.sweep_fixed(ctx.depth);
        Ok(())
    }

    fn restore_before(&mut self, depth: Depth) {
        self.unfixed.restore_before(depth);
    }

    fn get_cb(&self) -> &PropagatorControlBlock {
        &self.pcb
    }

    fn get_cb_mut(&mut self) -> &mut PropagatorControlBlock {
        &mut self.pcb
    }
}
