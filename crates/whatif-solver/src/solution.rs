use thiserror::Error;

use crate::problem::ProblemError;

/// The result of solving an LP problem to optimality
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Optimal values for each variable
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Dual value for each constraint, in the sense of the objective:
    /// the change in `objective_value` per unit increase of the constraint's RHS
    pub shadow_prices: Vec<f64>,
    /// Slack (`<=`), surplus (`>=`) or zero (`=`) for each constraint, as held in the final tableau
    pub slacks: Vec<f64>,
    /// Tableau columns that are basic at the optimum, one per constraint row
    pub basis: Vec<usize>,
    /// Detailed analysis
    pub analysis: Analysis,
}

/// Why a problem could not be solved to optimality
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Problem is infeasible")]
    Infeasible,
    #[error("Problem is unbounded")]
    Unbounded,
    #[error("Iteration limit of {0} reached before optimality")]
    IterationLimit(usize),
    #[error("Invalid problem: {0}")]
    InvalidProblem(#[from] ProblemError),
}

/// Detailed analysis of the optimal solution
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// Which constraints are binding (tight) at optimum
    pub binding_constraints: Vec<String>,
}

impl Solution {
    pub fn num_variables(&self) -> usize {
        self.values.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.shadow_prices.len()
    }

    /// Human-readable meaning of a constraint's shadow price
    pub fn interpret_shadow_price(&self, index: usize, tolerance: f64) -> Option<String> {
        let value = *self.shadow_prices.get(index)?;
        Some(if value.abs() < tolerance {
            "Non-binding constraint".to_string()
        } else if value > 0.0 {
            format!("Increasing RHS by 1 unit would raise the objective by {:.4}", value)
        } else {
            format!("Increasing RHS by 1 unit would lower the objective by {:.4}", -value)
        })
    }
}
