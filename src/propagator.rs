use crate::constraint::Constraint;
use crate::error::PropagationResult;
use crate::Depth;

pub struct PropagatorControlBlock {
    pub queued: bool,
    pub id: usize,
}

impl PropagatorControlBlock {
    pub fn new() -> Self {
        Self {
            queued: false,
            id: usize::MAX,
        }
    }
}

/// Strength of the filtering a single call achieves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consistency {
    /// After one successful call every remaining value has a support.
    Gac,
    /// Sound filtering only; further calls may remove more.
    Partial,
}

/// This enum is to be used by constraints with more than one possible propagator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagationLevel {
    AC,
    Weak,
}

/// What a propagator is told when it is run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropagationContext {
    /// Depth that stamps every removal made during the call.
    pub depth: Depth,
    /// Id of the variable whose change scheduled this call, `None` for the initial call.
    pub trigger: Option<usize>,
}

pub trait Propagator: Constraint {
    fn name(&self) -> &'static str;

    /// Static property of the constraint kind.
    fn consistency(&self) -> Consistency {
        Consistency::Partial
    }

    /// Filters the scope domains. Returns `Err` only on a genuine wipe-out or when no
    /// completion exists; a call with nothing new to do is a no-op.
    fn run_propagator(&mut self, ctx: PropagationContext) -> PropagationResult;

    /// Undoes the private reversible state changed at `depth` or deeper.
    fn restore_before(&mut self, _depth: Depth) {}

    fn get_cb(&self) -> &PropagatorControlBlock;

    fn get_cb_mut(&mut self) -> &mut PropagatorControlBlock;

    fn enqueue(&mut self) {
        self.get_cb_mut().queued = true;
    }

    fn dequeue(&mut self) {
        self.get_cb_mut().queued = false;
    }

    fn is_queued(&self) -> bool {
        self.get_cb().queued
    }

    fn get_id(&self) -> usize {
        self.get_cb().id
    }
}
