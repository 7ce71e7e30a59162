use crate::variable::VarRef;

/// Declarative side of a constraint: what it ranges over and what it accepts.
pub trait Constraint {
    /// Ordered, duplicate-free scope.
    fn scope(&self) -> &[VarRef];

    /// Pure satisfaction test over a full tuple of values, one per scope position.
    /// Does not look at the domains.
    fn check_values(&self, tuple: &[i64]) -> bool;

    /// Whether every scope variable is fixed and the resulting tuple is accepted.
    fn satisfied(&self) -> bool {
        let mut tuple = Vec::with_capacity(self.scope().len());
        for var in self.scope() {
            match var.borrow().try_value() {
                Some(v) => tuple.push(v),
                None => return false,
            }
        }
        self.check_values(&tuple)
    }
}
