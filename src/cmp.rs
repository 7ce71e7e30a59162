use crate::constraint::Constraint;
use crate::error::{ModelError, PropagationResult};
use crate::propagator::{Consistency, PropagationContext, Propagator, PropagatorControlBlock};
use crate::variable::{check_distinct, VarRef};

/// `x != y`, acting once either side is fixed.
pub struct NeqPropagator {
    pcb: PropagatorControlBlock,
    scope: [VarRef; 2],
}

impl NeqPropagator {
    pub fn new(x: VarRef, y: VarRef) -> Result<Self, ModelError> {
        let scope = [x, y];
        check_distinct(&scope, "neq")?;
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            scope,
        })
    }
}

impl Constraint for NeqPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.scope
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        tuple[0] != tuple[1]
    }
}

impl Propagator for NeqPropagator {
    fn name(&self) -> &'static str {
        "neq"
    }

    fn run_propagator(&mut self, _ctx: PropagationContext) -> PropagationResult {
        let [x, y] = &self.scope;
        if let Some(v) = x.borrow().try_value() {
            y.borrow_mut().dom.remove_value(v)?;
        }
        if let Some(v) = y.borrow().try_value() {
            x.borrow_mut().dom.remove_value(v)?;
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

/// `x + c <= y`, by bounds.
pub struct LessEqualPropagator {
    pcb: PropagatorControlBlock,
    scope: [VarRef; 2],
    c: i64,
}

impl LessEqualPropagator {
    pub fn new(x: VarRef, y: VarRef, c: i64) -> Result<Self, ModelError> {
        let scope = [x, y];
        check_distinct(&scope, "less_equal")?;
        Ok(Self {
            pcb: PropagatorControlBlock::new(),
            scope,
            c,
        })
    }
}

impl Constraint for LessEqualPropagator {
    fn scope(&self) -> &[VarRef] {
        &self.scope
    }

    fn check_values(&self, tuple: &[i64]) -> bool {
        tuple[0] + self.c <= tuple[1]
    }
}

impl Propagator for LessEqualPropagator {
    fn name(&self) -> &'static str {
        "less_equal"
    }

    fn consistency(&self) -> Consistency {
        Consistency::Gac
    }

    fn run_propagator(&mut self, _ctx: PropagationContext) -> PropagationResult {
        let [x, y] = &self.scope;
        let y_ub = y.borrow().get_ub();
        x.borrow_mut().dom.remove_values_gt(y_ub.saturating_sub(self.c))?;
        let x_lb = x.borrow().get_lb();
        y.borrow_mut().dom.remove_values_lt(x_lb.saturating_add(self.c))?;
        Ok(())
    }

    fn get_cb(&self) -> &PropagatorControlBlock {
        &self.pcb
    }

    fn get_cb_mut(&mut self) -> &mut PropagatorControlBlock {
        &mut self.pcb
    }
}
