use crate::alldifferent::{AllDifferentACPropagator, AllDifferentWeakPropagator};
use crate::cardinality::{CardinalityACPropagator, CardinalityCountingPropagator};
use crate::config::Config;
use crate::error::{ModelError, PropagationResult};
use crate::propagator::{Consistency, PropagationContext, PropagationLevel, Propagator};
use crate::state::{DomainListener, SolverState};
use crate::variable::{VarRef, Variable};
use crate::Depth;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropagationStats {
    pub propagator_calls: u64,
    pub fails: u64,
    pub backtracks: u64,
    pub max_depth: Depth,
}

/// Owns the variables and propagators of a problem and drives them to a fixpoint.
///
/// This is the contract a search engine relies on: push a depth, reduce some domain,
/// call [`Solver::propagate`], and on failure [`Solver::backtrack_to`] an earlier depth.
/// Choosing what to branch on is left to the caller.
pub struct Solver {
    config: Config,
    state: Rc<RefCell<SolverState>>,
    variables: Vec<VarRef>,
    /// Every variable seen so far, by id; used to restore stacked variables.
    by_id: Vec<Option<VarRef>>,
    vars_by_name: FxHashMap<String, VarRef>,
    propagators: Vec<Box<dyn Propagator>>,
    /// For each variable id, the propagators having it in scope.
    watchers: Vec<Vec<usize>>,
    triggers: Vec<Option<usize>>,
    queue: VecDeque<usize>,
    rng: Option<SmallRng>,
    stats: PropagationStats,
}

impl Solver {
    pub fn new(config: Config) -> Self {
        let rng = config.shuffle_seed.map(SmallRng::seed_from_u64);
        Self {
            config,
            state: Rc::new(RefCell::new(SolverState::new())),
            variables: Vec::new(),
            by_id: Vec::new(),
            vars_by_name: FxHashMap::default(),
            propagators: Vec::new(),
            watchers: Vec::new(),
            triggers: Vec::new(),
            queue: VecDeque::new(),
            rng,
            stats: PropagationStats::default(),
        }
    }

    pub fn state(&self) -> Rc<RefCell<SolverState>> {
        Rc::clone(&self.state)
    }

    /// Declares a variable over the given values. Names must be unique.
    pub fn new_variable(
        &mut self,
        name: &str,
        values: impl IntoIterator<Item = i64>,
    ) -> Result<VarRef, ModelError> {
        if self.vars_by_name.contains_key(name) {
            return Err(ModelError::DuplicateName(name.to_owned()));
        }
        let var = Rc::new(RefCell::new(Variable::new(
            Rc::clone(&self.state),
            name.to_owned(),
            values.into_iter().collect(),
        )?));
        self.variables.push(Rc::clone(&var));
        self.track(&var);
        self.vars_by_name.insert(name.to_owned(), Rc::clone(&var));
        Ok(var)
    }

    /// Declares a variable over `[lb, ub]`.
    pub fn new_range(&mut self, name: &str, lb: i64, ub: i64) -> Result<VarRef, ModelError> {
        if lb > ub {
            return Err(ModelError::InvalidRange {
                name: name.to_owned(),
                lb,
                ub,
            });
        }
        self.new_variable(name, lb..=ub)
    }

    fn track(&mut self, var: &VarRef) {
        let id = var.borrow().id;
        if self.by_id.len() <= id {
            self.by_id.resize(id + 1, None);
        }
        if self.by_id[id].is_none() {
            self.by_id[id] = Some(Rc::clone(var));
        }
    }

    pub fn variable_by_name(&self, name: &str) -> Option<VarRef> {
        self.vars_by_name.get(name).cloned()
    }

    pub fn variables(&self) -> &[VarRef] {
        &self.variables
    }

    pub fn propagators(&self) -> &[Box<dyn Propagator>] {
        &self.propagators
    }

    /// Registers a propagator and schedules its initial call.
    pub fn post(&mut self, mut p: Box<dyn Propagator>) -> usize {
        let id = self.propagators.len();
        let n_vars = self.state.borrow().n_variables();
        if self.watchers.len() < n_vars {
            self.watchers.resize_with(n_vars, Vec::new);
        }
        for var in p.scope() {
            self.watchers[var.borrow().id].push(id);
            self.track(var);
        }
        p.get_cb_mut().id = id;
        p.enqueue();
        debug!(propagator = p.name(), id, arity = p.scope().len(), "post");
        self.propagators.push(p);
        self.triggers.push(None);
        self.queue.push_back(id);
        id
    }

    /// Posts an all-different constraint with the filtering chosen in the [`Config`].
    pub fn post_alldifferent(&mut self, vars: Vec<VarRef>) -> Result<usize, ModelError> {
        let p: Box<dyn Propagator> = match self.config.alldifferent_level {
            PropagationLevel::AC => Box::new(AllDifferentACPropagator::new(vars)?),
            PropagationLevel::Weak => Box::new(AllDifferentWeakPropagator::new(vars)?),
        };
        Ok(self.post(p))
    }

    /// Posts a cardinality constraint with the filtering chosen in the [`Config`].
    pub fn post_cardinality(
        &mut self,
        vars: Vec<VarRef>,
        values: Vec<i64>,
        min_occs: Vec<usize>,
        max_occs: Vec<usize>,
    ) -> Result<usize, ModelError> {
        let p: Box<dyn Propagator> = match self.config.cardinality_level {
            PropagationLevel::AC => Box::new(CardinalityACPropagator::new(
                vars, values, min_occs, max_occs,
            )?),
            PropagationLevel::Weak => Box::new(CardinalityCountingPropagator::new(
                vars, values, min_occs, max_occs,
            )?),
        };
        Ok(self.post(p))
    }

    pub fn add_listener(&mut self, listener: Rc<RefCell<dyn DomainListener>>) {
        self.state.borrow_mut().add_listener(listener);
    }

    pub fn depth(&self) -> Depth {
        self.state.borrow().depth()
    }

    /// Opens a new depth; removals from now on are undone by `backtrack_to(depth - 1)`.
    pub fn push_depth(&mut self) -> Depth {
        let depth = self.depth() + 1;
        self.state.borrow_mut().set_depth(depth);
        self.stats.max_depth = self.stats.max_depth.max(depth);
        depth
    }

    /// Undoes every removal made deeper than `depth` and makes `depth` current.
    pub fn backtrack_to(&mut self, depth: Depth) {
        let current = self.depth();
        assert!(depth <= current, "cannot backtrack from depth {current} to {depth}");
        self.restore_before(depth + 1);
        self.state.borrow_mut().set_depth(depth);
        self.stats.backtracks += 1;
        debug!(from = current, to = depth, "backtrack");
    }

    /// Brings every domain and propagator back to its state at declaration and schedules
    /// every propagator again.
    pub fn reset(&mut self) {
        self.restore_before(0);
        self.state.borrow_mut().set_depth(0);
        for (id, p) in self.propagators.iter_mut().enumerate() {
            p.enqueue();
            self.queue.push_back(id);
        }
    }

    fn restore_before(&mut self, depth: Depth) {
        self.clear_queue();
        let touched = self.state.borrow_mut().unstack(depth);
        let mut restored = 0;
        for var in touched {
            if let Some(Some(v)) = self.by_id.get(var) {
                restored += v.borrow_mut().dom.restore_before(depth);
            }
        }
        for p in &mut self.propagators {
            p.restore_before(depth);
        }
        trace!(depth, restored, "restore");
    }

    fn clear_queue(&mut self) {
        for p in self.queue.drain(..) {
            self.propagators[p].dequeue();
            self.triggers[p] = None;
        }
        self.state.borrow_mut().clear_changed();
    }

    /// Decision helper: reduces `var` to `value`.
    pub fn assign(&mut self, var: &VarRef, value: i64) -> PropagationResult {
        var.borrow_mut().dom.reduce_to_value(value)
    }

    /// Decision helper: removes `value` from `var`.
    pub fn remove_value(&mut self, var: &VarRef, value: i64) -> PropagationResult {
        var.borrow_mut().dom.remove_value(value)
    }

    /// Runs queued propagators until none has anything left to remove.
    pub fn propagate(&mut self) -> PropagationResult {
        let calls = self.stats.propagator_calls;
        let result = self.run_fixpoint();
        match &result {
            Ok(()) => debug!(
                depth = self.depth(),
                calls = self.stats.propagator_calls - calls,
                "fixpoint reached"
            ),
            Err(e) => {
                self.stats.fails += 1;
                self.clear_queue();
                debug!(depth = self.depth(), error = %e, "propagation failed");
            }
        }
        result
    }

    fn run_fixpoint(&mut self) -> PropagationResult {
        loop {
            self.schedule_changed(None);
            let Some(p) = self.next_queued() else {
                return Ok(());
            };
            self.propagators[p].dequeue();
            let ctx = PropagationContext {
                depth: self.depth(),
                trigger: self.triggers[p].take(),
            };
            trace!(
                propagator = self.propagators[p].name(),
                id = p,
                trigger = ?ctx.trigger,
                "run"
            );
            self.stats.propagator_calls += 1;
            self.propagators[p].run_propagator(ctx)?;
            if self.config.check_idempotence && self.propagators[p].consistency() == Consistency::Gac {
                let before = self.state.borrow().removed_values();
                self.propagators[p].run_propagator(ctx)?;
                assert_eq!(
                    before,
                    self.state.borrow().removed_values(),
                    "propagator `{}' is tagged GAC but a second call removed values",
                    self.propagators[p].name()
                );
            }
            self.schedule_changed(Some(p));
        }
    }

    fn next_queued(&mut self) -> Option<usize> {
        match &mut self.rng {
            Some(rng) if !self.queue.is_empty() => {
                let i = rng.gen_range(0..self.queue.len());
                self.queue.swap_remove_back(i)
            }
            _ => self.queue.pop_front(),
        }
    }

    /// Enqueues the watchers of every changed variable. A GAC propagator is not
    /// rescheduled by its own removals.
    fn schedule_changed(&mut self, running: Option<usize>) {
        loop {
            let Some(var) = self.state.borrow_mut().pop_changed() else {
                break;
            };
            let Some(watchers) = self.watchers.get(var) else {
                continue;
            };
            for &p in watchers {
                if Some(p) == running && self.propagators[p].consistency() == Consistency::Gac {
                    continue;
                }
                self.triggers[p] = Some(var);
                if !self.propagators[p].is_queued() {
                    self.propagators[p].enqueue();
                    self.queue.push_back(p);
                }
            }
        }
    }

    /// Variables whose domain is a singleton.
    pub fn fixed_variables(&self) -> Vec<VarRef> {
        self.variables
            .iter()
            .filter(|v| v.borrow().is_assigned())
            .cloned()
            .collect()
    }

    /// Checks every constraint on the current assignment; `false` unless all is fixed.
    pub fn check_solution(&self) -> bool {
        self.propagators.iter().all(|p| p.satisfied())
    }

    pub fn removed_values(&self) -> u64 {
        self.state.borrow().removed_values()
    }

    pub fn stats(&self) -> &PropagationStats {
        &self.stats
    }
}
