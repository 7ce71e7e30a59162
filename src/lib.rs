//! Propagation core for finite-domain constraint solving: reversible domains stamped
//! with the depth of every removal, and global constraints filtered by matching, flow,
//! time-tabling and dynamic programming over layered graphs.

pub mod alldifferent;
pub mod cardinality;
pub mod circuit;
pub mod cmp;
pub mod config;
pub mod constraint;
pub mod cumulative;
pub mod domain;
pub mod error;
pub mod flow;
pub mod index_set;
pub mod matching;
pub mod propagator;
pub mod scc;
pub mod seqbin;
pub mod solver;
pub mod sparse_set;
pub mod state;
pub mod variable;

/// Decision depth; every removal is stamped with the depth current when it happened.
pub type Depth = u32;
