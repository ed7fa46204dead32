use thiserror::Error;

/// Failures surfaced by bounded graph algorithms.
///
/// Malformed input (dangling edges, self loops, duplicates) is never an
/// error; cleanup drops it silently. Errors only signal that a safety
/// cap stopped an iteration that should have converged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{what} did not converge within {limit} iterations")]
    IterationLimit { what: &'static str, limit: usize },
}
