use crate::propagator::PropagationLevel;

pub struct Config {
    /// Seed for picking queued propagators in random order. `None` runs them first in, first out.
    pub shuffle_seed: Option<u64>,
    /// Filtering used by [`Solver::post_alldifferent`](crate::solver::Solver::post_alldifferent).
    pub alldifferent_level: PropagationLevel,
    /// Filtering used by [`Solver::post_cardinality`](crate::solver::Solver::post_cardinality).
    pub cardinality_level: PropagationLevel,
    /// Re-runs every GAC propagator after it succeeds and panics if the second call removes
    /// anything. Meant for tests.
    pub check_idempotence: bool,
}

impl Config {
    pub fn new(
        shuffle_seed: Option<u64>,
        alldifferent_level: PropagationLevel,
        cardinality_level: PropagationLevel,
        check_idempotence: bool,
    ) -> Self {
        Self {
            shuffle_seed,
            alldifferent_level,
            cardinality_level,
            check_idempotence,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            shuffle_seed: Some(seed),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shuffle_seed: None,
            alldifferent_level: PropagationLevel::AC,
            cardinality_level: PropagationLevel::AC,
            check_idempotence: false,
        }
    }
}
