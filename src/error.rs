use thiserror::Error;

/// Outcome of a filtering step that proved the current node infeasible.
///
/// This is the only failure a propagator reports; the caller turns it into a
/// backtrack.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Inconsistency {
    #[error("the domain of variable {var} would become empty")]
    EmptyDomain { var: usize },
    #[error("constraint `{constraint}' has no solution in the current domains")]
    NoSupport { constraint: &'static str },
}

pub type PropagationResult<T = ()> = Result<T, Inconsistency>;

/// Errors raised while declaring variables and constraints.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("variable `{0}' is declared with an empty domain")]
    EmptyInitialDomain(String),
    #[error("invalid range [{lb}, {ub}] for variable `{name}'")]
    InvalidRange { name: String, lb: i64, ub: i64 },
    #[error("a variable named `{0}' already exists")]
    DuplicateName(String),
    #[error("variable `{0}' occurs more than once in the scope of {1}")]
    DuplicateVariable(String, &'static str),
    #[error("{constraint} expects {expected} {what}, found {found}")]
    LengthMismatch {
        constraint: &'static str,
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{constraint}: {reason}")]
    InvalidArgument {
        constraint: &'static str,
        reason: String,
    },
}
