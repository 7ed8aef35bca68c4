use thiserror::Error;
use whatif_solver::{ProblemError, SolveError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangingError {
    #[error("{what} has {found} entries, expected {expected}")]
    Dimension {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Could not estimate sensitivity column for constraint {}: {}", .constraint + 1, .source)]
    Estimation {
        /// Zero-based index of the constraint whose perturbed solve failed
        constraint: usize,
        #[source]
        source: SolveError,
    },
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

impl RangingError {
    pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(RangingError::Dimension { what, expected, found })
        }
    }
}
