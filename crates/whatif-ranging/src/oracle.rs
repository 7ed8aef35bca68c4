use whatif_solver::{LpProblem, Solution, SolveError, Solver};

/// Anything that can solve a linear program to optimality.
///
/// The ranging engine never looks inside the solver: it only queries it at different
/// right-hand sides and compares the optimal points it gets back.
pub trait LpOracle {
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError>;
}

impl LpOracle for Solver {
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        Solver::solve(self, problem)
    }
}

/// Adapts a plain function or closure into an [`LpOracle`]
#[derive(Debug, Clone, Copy)]
pub struct FnOracle<F>(pub F);

impl<F> LpOracle for FnOracle<F>
where
    F: Fn(&LpProblem) -> Result<Solution, SolveError>,
{
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        (self.0)(problem)
    }
}
