use crate::alldifferent::filter_with_matching;
use crate::constraint::Constraint;
use crate::domain::Domain;
use crate::error::{Inconsistency, ModelError, PropagationResult};
use crate::matching::Matcher;
use crate::propagator::{PropagationContext, Propagator, PropagatorControlBlock};
use crate::variable::{check_distinct, VarRef};
use tracing::trace;

/// `succ[i] - offset` is the node visited after node `i`, and following successors from
/// any node visits all `n` nodes before coming back.
///
/// Filtering is all-different by matching followed by sub-tour elimination: for every
/// chain of fixed successors shorter than `n`, the last node of the chain may not point
/// back to its first node.
pub struct CircuitPropagator {
    pcb: PropagatorControlBlock,
    succ: Vec<VarRef>,
    offset: i64,
    matcher: Matcher,
    has_pred: Vec<bool>,
    visited: Vec<bool>,
}

impl CircuitPropagator {
    pub fn new(succ: Vec<VarRef>, offset: i64) -> Result<Self, ModelError> {
        if succ.is_empty() {
            return Err(ModelError::InvalidArgument {
                constraint: "circuit",
                reason: "no successor variables".to_owned(),
            });
        }
        check_distinct(&succ, "circuit")?;
        let n = succ.len();
        let matcher = {
            let refs: Vec<_> = succ.iter().map(|v| v.borrow()).collect();
            let doms: Vec<&Domain> = refs.iter().map(|v| &v.dom).collect();
            Matcher::new(&doms)
        };
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            succ,
            offset,
            matcher,
            has_pred: vec![false; n],
            visited: vec![false; n],
        })
    }

    /// Successor node of `i`, if fixed.
    fn fixed_succ(&self, i: usize) -> Option<usize> {
        let v = self.succ[i].borrow().try_value()?;
        Some((v - self.offset) as usize)
    }

    fn prune_domains(&mut self) -> PropagationResult {
        let n = self.succ.len() as i64;
        for (i, var) in self.succ.iter().enumerate() {
            let mut var = var.borrow_mut();
            var.dom.remove_values_lt(self.offset)?;
            var.dom.remove_values_ge(self.offset + n)?;
            if n > 1 {
                var.dom.remove_value(self.offset + i as i64)?;
            }
        }
        Ok(())
    }

    fn eliminate_subtours(&mut self) -> PropagationResult {
        let n = self.succ.len();
        self.has_pred.fill(false);
        self.visited.fill(false);
        for i in 0..n {
            if let Some(j) = self.fixed_succ(i) {
                self.has_pred[j] = true;
            }
        }
        for start in 0..n {
            if self.has_pred[start] {
                continue;
            }
            let mut end = start;
            let mut len = 1;
            self.visited[end] = true;
            while let Some(j) = self.fixed_succ(end) {
                end = j;
                len += 1;
                self.visited[end] = true;
            }
            if len < n {
                self.succ[end]
                    .borrow_mut()
                    .dom
                    .remove_value(self.offset + start as i64)?;
            }
        }
        // What is left unvisited lies on cycles of fixed successors.
        for start in 0..n {
            if self.visited[start] {
                continue;
            }
            let mut len = 0;
            let mut cur = start;
            while !self.visited[cur] {
                self.visited[cur] = true;
                len += 1;
                match self.fixed_succ(cur) {
                    Some(j) => cur = j,
                    None => break,
                }
            }
            if len < n {
                trace!(node = start, len, "closed sub-tour");
                return Err(Inconsistency::NoSupport {
                    constraint: "circuit",
                });
            }
        }
        Ok(())
    }
}

impl Constraint for CircuitPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.succ
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        let n = tuple.len();
        let mut seen = vec![false; n];
        let mut cur = 0;
        for _ in 0..n {
            if seen[cur] {
                return false;
            }
            seen[cur] = true;
            match usize::try_from(tuple[cur] - self.offset) {
                Ok(j) if j < n => cur = j,
                _ => return false,
            }
        }
        cur == 0
    }
}

impl Propagator for CircuitPropagator {
    fn name(&self) -> &'static str {
        "circuit"
    }

    fn run_propagator(&mut self, _ctx: PropagationContext) -> PropagationResult {
        self.prune_domains()?;
        filter_with_matching(&self.succ, &mut self.matcher, "circuit")?;
        self.eliminate_subtours()
    }

    fn get_cb(&self) -> &PropagatorControlBlock {
        &self.pcb
    }

    fn get_cb_mut(&mut self) -> &mut PropagatorControlBlock {
        &mut self.pcb
    }
}
