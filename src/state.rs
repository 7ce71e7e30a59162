use crate::Depth;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Observer of individual value removals.
///
/// Listeners are called while the shared state is mutably borrowed, so they must not
/// reach back into the state or into the variable being reduced.
pub trait DomainListener {
    fn domain_reduced(&mut self, var: usize, index: usize, depth: Depth);
}

/// State shared by every domain of a problem: the current depth, the stack of
/// variables touched per depth, the queue of changed variables and the listeners.
#[derive(Default)]
pub struct SolverState {
    depth: Depth,
    removed_values: u64,
    stacked: Vec<(Depth, usize)>,
    last_stacked: Vec<Option<Depth>>,
    changed: VecDeque<usize>,
    pending: Vec<bool>,
    listeners: Vec<Rc<RefCell<dyn DomainListener>>>,
}

impl SolverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub(crate) fn set_depth(&mut self, depth: Depth) {
        self.depth = depth;
    }

    /// Total number of values removed so far, over all depths.
    pub fn removed_values(&self) -> u64 {
        self.removed_values
    }

    pub fn n_variables(&self) -> usize {
        self.pending.len()
    }

    /// Allocates the id of a new variable.
    pub fn register_variable(&mut self) -> usize {
        self.pending.push(false);
        self.last_stacked.push(None);
        self.pending.len() - 1
    }

    pub fn add_listener(&mut self, listener: Rc<RefCell<dyn DomainListener>>) {
        self.listeners.push(listener);
    }

    pub(crate) fn on_removal(&mut self, var: usize, index: usize) {
        self.removed_values += 1;
        if self.last_stacked[var] != Some(self.depth) {
            self.last_stacked[var] = Some(self.depth);
            self.stacked.push((self.depth, var));
        }
        if !self.pending[var] {
            self.pending[var] = true;
            self.changed.push_back(var);
        }
        for listener in &self.listeners {
            listener.borrow_mut().domain_reduced(var, index, self.depth);
        }
    }

    /// Next variable whose domain changed since it was last popped.
    pub fn pop_changed(&mut self) -> Option<usize> {
        let var = self.changed.pop_front()?;
        self.pending[var] = false;
        Some(var)
    }

    pub fn clear_changed(&mut self) {
        for var in self.changed.drain(..) {
            self.pending[var] = false;
        }
    }

    /// Pops the variables first touched at `depth` or deeper.
    pub(crate) fn unstack(&mut self, depth: Depth) -> Vec<usize> {
        let mut vars = Vec::new();
        while let Some(&(d, var)) = self.stacked.last() {
            if d < depth {
                break;
            }
            self.stacked.pop();
            self.last_stacked[var] = None;
            vars.push(var);
        }
        vars
    }
}
