use crate::domain::Domain;
use crate::error::ModelError;
use crate::state::SolverState;
use std::cell::RefCell;
use std::rc::Rc;

pub type VarRef = Rc<RefCell<Variable>>;

pub struct Variable {
    pub id: usize,
    pub name: String,
    pub dom: Domain,
}

impl Variable {
    /// Declares a variable over the given values, registering it with `solver_state`.
    pub fn new(
        solver_state: Rc<RefCell<SolverState>>,
        name: String,
        values: Vec<i64>,
    ) -> Result<Self, ModelError> {
        if values.is_empty() {
            return Err(ModelError::EmptyInitialDomain(name));
        }
        let id = solver_state.borrow_mut().register_variable();
        Ok(Self {
            id,
            name,
            dom: Domain::new(solver_state, id, values),
        })
    }

    /// Declares a variable over `[lb, ub]`.
    pub fn with_range(
        solver_state: Rc<RefCell<SolverState>>,
        name: String,
        lb: i64,
        ub: i64,
    ) -> Result<Self, ModelError> {
        if lb > ub {
            return Err(ModelError::InvalidRange { name, lb, ub });
        }
        Self::new(solver_state, name, (lb..=ub).collect())
    }

    pub fn is_assigned(&self) -> bool {
        self.dom.is_assigned()
    }

    pub fn value(&self) -> i64 {
        self.dom.value()
    }

    pub fn try_value(&self) -> Option<i64> {
        self.dom.single_value()
    }

    pub fn get_lb(&self) -> i64 {
        self.dom.first_value()
    }

    pub fn get_ub(&self) -> i64 {
        self.dom.last_value()
    }

    pub fn size(&self) -> usize {
        self.dom.size()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.dom.values()
    }
}

/// Convenience used by constraint constructors: wraps a freshly declared variable.
pub fn new_var(
    solver_state: &Rc<RefCell<SolverState>>,
    name: &str,
    values: Vec<i64>,
) -> Result<VarRef, ModelError> {
    Ok(Rc::new(RefCell::new(Variable::new(
        Rc::clone(solver_state),
        name.to_owned(),
        values,
    )?)))
}

/// Checks that no variable occurs twice in `scope`.
pub(crate) fn check_distinct(scope: &[VarRef], constraint: &'static str) -> Result<(), ModelError> {
    let mut seen = rustc_hash::FxHashSet::default();
    for var in scope {
        let v = var.borrow();
        if !seen.insert(v.id) {
            return Err(ModelError::DuplicateVariable(v.name.clone(), constraint));
        }
    }
    Ok(())
}
