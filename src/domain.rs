use crate::error::{Inconsistency, PropagationResult};
use crate::index_set::{Iter, ReversibleIndexSet};
use crate::state::SolverState;
use crate::Depth;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Finite domain of one variable.
///
/// The initial values are fixed at construction and sorted; propagators work on their
/// indices, of which the present ones are kept in a [`ReversibleIndexSet`]. Every
/// removal is stamped with the current depth of the shared [`SolverState`] and
/// reported to it.
///
/// Removing the last present index never happens: the call returns
/// [`Inconsistency::EmptyDomain`] and leaves the domain as it was.
pub struct Domain {
    state: Rc<RefCell<SolverState>>,
    var: usize,
    values: Vec<i64>,
    /// `Some(values[0])` when the initial values form a range.
    offset: Option<i64>,
    set: ReversibleIndexSet,
}

impl Domain {
    /// `values` must not be empty; it is sorted and deduplicated here.
    pub fn new(state: Rc<RefCell<SolverState>>, var: usize, mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        values.dedup();
        assert!(!values.is_empty(), "a domain needs at least one value");
        let contiguous = values[values.len() - 1]
            .checked_sub(values[0])
            .is_some_and(|d| d == (values.len() - 1) as i64);
        Self {
            state,
            var,
            offset: contiguous.then_some(values[0]),
            set: ReversibleIndexSet::new(values.len()),
            values,
        }
    }

    pub fn var(&self) -> usize {
        self.var
    }

    pub fn init_size(&self) -> usize {
        self.values.len()
    }

    pub fn size(&self) -> usize {
        self.set.size()
    }

    pub fn is_assigned(&self) -> bool {
        self.set.size() == 1
    }

    /// Initial values, present or not.
    pub fn initial_values(&self) -> &[i64] {
        &self.values
    }

    pub fn to_idx(&self, v: i64) -> Option<usize> {
        match self.offset {
            Some(lb) => {
                let a = v.checked_sub(lb)?;
                (a >= 0 && (a as usize) < self.values.len()).then_some(a as usize)
            }
            None => self.values.binary_search(&v).ok(),
        }
    }

    pub fn to_val(&self, a: usize) -> i64 {
        self.values[a]
    }

    pub fn contains(&self, a: usize) -> bool {
        self.set.contains(a)
    }

    pub fn contains_value(&self, v: i64) -> bool {
        self.to_idx(v).is_some_and(|a| self.set.contains(a))
    }

    pub fn first(&self) -> usize {
        self.set.first().expect("domains are never empty")
    }

    pub fn last(&self) -> usize {
        self.set.last().expect("domains are never empty")
    }

    pub fn next(&self, a: usize) -> Option<usize> {
        self.set.next(a)
    }

    pub fn prev(&self, a: usize) -> Option<usize> {
        self.set.prev(a)
    }

    pub fn first_value(&self) -> i64 {
        self.values[self.first()]
    }

    pub fn last_value(&self) -> i64 {
        self.values[self.last()]
    }

    pub fn single_value(&self) -> Option<i64> {
        self.is_assigned().then(|| self.first_value())
    }

    pub fn value(&self) -> i64 {
        match self.single_value() {
            Some(v) => v,
            None => panic!("attempted to get value of unassigned variable {}", self.var),
        }
    }

    /// Depth at which index `a` was removed, `None` if present.
    pub fn removed_at(&self, a: usize) -> Option<Depth> {
        self.set.removed_at(a)
    }

    /// Present indices in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        self.set.iter()
    }

    /// Present values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.set.iter().map(|a| self.values[a])
    }

    fn wipe_out(&self) -> Inconsistency {
        trace!(var = self.var, "domain wipe-out");
        Inconsistency::EmptyDomain { var: self.var }
    }

    fn erase(&mut self, a: usize, state: &mut SolverState) {
        self.set.remove(a, state.depth());
        state.on_removal(self.var, a);
    }

    /// Removes index `a`, which must be present.
    pub fn remove(&mut self, a: usize) -> PropagationResult {
        assert!(
            self.set.contains(a),
            "index {a} is not in the domain of variable {}",
            self.var
        );
        if self.set.size() == 1 {
            return Err(self.wipe_out());
        }
        let state = Rc::clone(&self.state);
        self.erase(a, &mut state.borrow_mut());
        Ok(())
    }

    pub fn remove_value(&mut self, v: i64) -> PropagationResult {
        match self.to_idx(v) {
            Some(a) if self.set.contains(a) => self.remove(a),
            _ => Ok(()),
        }
    }

    /// Removes the `n` smallest present indices, failing first if that is all of them.
    fn remove_head(&mut self, n: usize) -> PropagationResult {
        if n == 0 {
            return Ok(());
        }
        if n >= self.set.size() {
            return Err(self.wipe_out());
        }
        let state = Rc::clone(&self.state);
        let mut state = state.borrow_mut();
        for _ in 0..n {
            let a = self.first();
            self.erase(a, &mut state);
        }
        Ok(())
    }

    /// Removes the `n` greatest present indices, failing first if that is all of them.
    fn remove_tail(&mut self, n: usize) -> PropagationResult {
        if n == 0 {
            return Ok(());
        }
        if n >= self.set.size() {
            return Err(self.wipe_out());
        }
        let state = Rc::clone(&self.state);
        let mut state = state.borrow_mut();
        for _ in 0..n {
            let a = self.last();
            self.erase(a, &mut state);
        }
        Ok(())
    }

    pub fn remove_values_lt(&mut self, v: i64) -> PropagationResult {
        let n = self.values().take_while(|&w| w < v).count();
        self.remove_head(n)
    }

    pub fn remove_values_le(&mut self, v: i64) -> PropagationResult {
        let n = self.values().take_while(|&w| w <= v).count();
        self.remove_head(n)
    }

    pub fn remove_values_gt(&mut self, v: i64) -> PropagationResult {
        let mut n = 0;
        let mut cur = self.set.last();
        while let Some(a) = cur {
            if self.values[a] <= v {
                break;
            }
            n += 1;
            cur = self.set.prev(a);
        }
        self.remove_tail(n)
    }

    pub fn remove_values_ge(&mut self, v: i64) -> PropagationResult {
        self.remove_values_gt(v.saturating_sub(1))
    }

    /// Removes every present index selected by `pred`, all or nothing.
    pub fn remove_indices_where(&mut self, mut pred: impl FnMut(usize) -> bool) -> PropagationResult {
        let doomed: Vec<usize> = self.set.iter().filter(|&a| pred(a)).collect();
        self.remove_indices(doomed)
    }

    /// Removes the present values in `[lo, hi]`.
    pub fn remove_values_in_range(&mut self, lo: i64, hi: i64) -> PropagationResult {
        if lo > hi || hi < self.first_value() || lo > self.last_value() {
            return Ok(());
        }
        let start = match self.values.partition_point(|&w| w < lo) {
            a if a < self.values.len() => a,
            _ => return Ok(()),
        };
        let mut doomed = Vec::new();
        for a in start..self.values.len() {
            if self.values[a] > hi {
                break;
            }
            if self.set.contains(a) {
                doomed.push(a);
            }
        }
        self.remove_indices(doomed)
    }

    /// Removes the values that are also present in `other`.
    pub fn remove_values_in(&mut self, other: &Domain) -> PropagationResult {
        let values = &self.values;
        let doomed: Vec<usize> = self
            .set
            .iter()
            .filter(|&a| other.contains_value(values[a]))
            .collect();
        self.remove_indices(doomed)
    }

    /// Removes the values that are not present in `other`.
    pub fn remove_values_not_in(&mut self, other: &Domain) -> PropagationResult {
        let values = &self.values;
        let doomed: Vec<usize> = self
            .set
            .iter()
            .filter(|&a| !other.contains_value(values[a]))
            .collect();
        self.remove_indices(doomed)
    }

    /// Removes every present value selected by `pred`, all or nothing.
    pub fn remove_values_where(&mut self, mut pred: impl FnMut(i64) -> bool) -> PropagationResult {
        let values = &self.values;
        let doomed: Vec<usize> = self.set.iter().filter(|&a| pred(values[a])).collect();
        self.remove_indices(doomed)
    }

    /// Removes the given present, distinct indices, all or nothing.
    pub fn remove_indices(&mut self, doomed: Vec<usize>) -> PropagationResult {
        if doomed.is_empty() {
            return Ok(());
        }
        if doomed.len() == self.set.size() {
            return Err(self.wipe_out());
        }
        let state = Rc::clone(&self.state);
        let mut state = state.borrow_mut();
        for a in doomed {
            self.erase(a, &mut state);
        }
        Ok(())
    }

    /// Keeps only index `a`. Fails if `a` is not present.
    pub fn reduce_to(&mut self, a: usize) -> PropagationResult {
        if !self.set.contains(a) {
            return Err(self.wipe_out());
        }
        if self.set.size() == 1 {
            return Ok(());
        }
        let state = Rc::clone(&self.state);
        let mut state = state.borrow_mut();
        let mut cur = self.set.first();
        while let Some(b) = cur {
            cur = self.set.next(b);
            if b != a {
                self.erase(b, &mut state);
            }
        }
        Ok(())
    }

    /// Keeps only value `v`. Fails if `v` is not present.
    pub fn reduce_to_value(&mut self, v: i64) -> PropagationResult {
        match self.to_idx(v) {
            Some(a) => self.reduce_to(a),
            None => Err(self.wipe_out()),
        }
    }

    /// Reinserts every index removed at `depth` or deeper.
    pub fn restore_before(&mut self, depth: Depth) -> usize {
        self.set.restore_before(depth)
    }
}
