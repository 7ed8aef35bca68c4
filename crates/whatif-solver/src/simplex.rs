use log::{debug, trace};

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, Solution, SolveError};

/// Slack below which a constraint is reported as binding
const BINDING_TOLERANCE: f64 = 1e-7;

/// Simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum iterations (per phase) before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        problem.validate()?;

        let mut tableau = self.build_tableau(problem);
        let mut iterations = 0;

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            iterations += self.phase1(&mut tableau)?;
        }

        // Phase 2: Optimize
        iterations += self.phase2(&mut tableau)?;

        debug!(
            "solved: num_vars={} num_constraints={} num_slack={} num_artificial={} iterations={}",
            tableau.n_vars,
            problem.num_constraints(),
            tableau.n_slack,
            tableau.n_artificial,
            iterations,
        );

        Ok(self.extract_solution(&tableau, problem))
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;

        for c in &problem.constraints {
            // A negative RHS flips the row, which changes whether the slack can start basic
            let flip = c.rhs < 0.0;
            match c.op {
                ConstraintOp::Le => {
                    n_slack += 1;
                    if flip {
                        n_artificial += 1;
                    }
                }
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    if !flip {
                        n_artificial += 1;
                    }
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            rows: Vec::with_capacity(n_constraints),
            n_vars,
            n_slack,
            n_artificial,
        };

        // Fill in constraint rows
        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, c) in problem.constraints.iter().enumerate() {
            // Original variables
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = coef;
            }

            // RHS (ensure non-negative)
            let mut rhs = c.rhs;
            let mut flip = false;
            if rhs < 0.0 {
                rhs = -rhs;
                flip = true;
                for j in 0..n_vars {
                    tableau.data[i][j] = -tableau.data[i][j];
                }
            }
            tableau.data[i][total_cols - 1] = rhs;

            // Add slack/surplus/artificial.
            // `dual_sign` is the dual column's coefficient in the row as written, before any flip.
            let row = match c.op {
                ConstraintOp::Le => {
                    let sign = if flip { -1.0 } else { 1.0 };
                    tableau.data[i][slack_idx] = sign;
                    slack_idx += 1;
                    if flip {
                        // Slack enters with -1 in the stored row, so it cannot start basic
                        tableau.data[i][artificial_idx] = 1.0;
                        tableau.basic_vars[i] = artificial_idx;
                        artificial_idx += 1;
                    } else {
                        tableau.basic_vars[i] = slack_idx - 1;
                    }
                    RowInfo {
                        dual_col: slack_idx - 1,
                        dual_sign: 1.0,
                        slack_col: Some(slack_idx - 1),
                    }
                }
                ConstraintOp::Ge => {
                    let sign = if flip { 1.0 } else { -1.0 };
                    tableau.data[i][slack_idx] = sign; // surplus
                    slack_idx += 1;
                    if flip {
                        tableau.basic_vars[i] = slack_idx - 1;
                    } else {
                        tableau.data[i][artificial_idx] = 1.0; // artificial
                        tableau.basic_vars[i] = artificial_idx;
                        artificial_idx += 1;
                    }
                    RowInfo {
                        dual_col: slack_idx - 1,
                        dual_sign: -1.0,
                        slack_col: Some(slack_idx - 1),
                    }
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                    RowInfo {
                        dual_col: artificial_idx - 1,
                        dual_sign: if flip { -1.0 } else { 1.0 },
                        slack_col: None,
                    }
                }
            };
            tableau.rows.push(row);
        }

        // Objective row (last row)
        // Simplex maximizes, so for minimization we negate the coefficients.
        // The row holds c_j - z_j: positive entries can still improve the objective.
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> Result<usize, SolveError> {
        // Create auxiliary objective: minimize sum of artificial variables
        // We negate to turn it into maximization (maximize -sum = minimize sum)
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.n_vars + tableau.n_slack;

        // Save original objective
        let orig_obj = tableau.data[n_constraints].clone();

        // Set phase 1 objective: maximize -artificials (= minimize artificials)
        for j in 0..n_cols {
            tableau.data[n_constraints][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0; // Negated for maximization
        }

        // Make objective row consistent with basic artificial variables
        // For each basic artificial, add its row to cancel the -1 coefficient
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        let iterations = self.iterate(tableau, n_cols - 1, "phase 1")?;

        // Check if all artificials are zero
        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return Err(SolveError::Infeasible);
            }
        }

        // Restore original objective and adjust for basic variables
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            if tableau.data[n_constraints][basic].abs() > self.tolerance {
                let ratio = tableau.data[n_constraints][basic];
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Ok(iterations)
    }

    fn phase2(&self, tableau: &mut Tableau) -> Result<usize, SolveError> {
        // Exclude artificial variable columns from pivoting
        let limit = tableau.n_vars + tableau.n_slack;
        match self.iterate(tableau, limit, "phase 2") {
            Err(SolveError::Infeasible) => Err(SolveError::Unbounded),
            other => other,
        }
    }

    /// Pivot until no column below `limit` can improve the objective.
    /// A column with no positive entry reports `Infeasible`; phase 2 maps it to `Unbounded`.
    fn iterate(&self, tableau: &mut Tableau, limit: usize, phase: &str) -> Result<usize, SolveError> {
        for iteration in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, limit) else {
                return Ok(iteration);
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return Err(SolveError::Infeasible);
            };
            trace!("{}: pivot row={} col={}", phase, pivot_row, pivot_col);
            self.pivot(tableau, pivot_row, pivot_col);
        }
        Err(SolveError::IterationLimit(self.max_iterations))
    }

    fn find_pivot_column(&self, tableau: &Tableau, limit: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;

        // Look for the most positive reduced cost (can improve objective)
        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..limit {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col] / val;
                if ratio >= 0.0 && ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        // Update basic variable
        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn column_value(&self, tableau: &Tableau, col: usize) -> f64 {
        let rhs_col = tableau.data[0].len() - 1;
        tableau
            .basic_vars
            .iter()
            .position(|&b| b == col)
            .map(|row| tableau.data[row][rhs_col])
            .unwrap_or(0.0)
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let obj_row = problem.num_constraints();
        let sense = if problem.objective.minimize { -1.0 } else { 1.0 };

        // Extract variable values
        let values: Vec<f64> = (0..n_vars).map(|j| self.column_value(tableau, j)).collect();

        // Calculate objective value
        let objective_value: f64 = problem
            .objective
            .coefficients
            .iter()
            .zip(&values)
            .map(|(c, x)| c * x)
            .sum();

        // An auxiliary column with coefficient `dual_sign` in row i and zero cost
        // has reduced cost -dual_sign * y_i
        let shadow_prices: Vec<f64> = tableau
            .rows
            .iter()
            .map(|row| {
                let y = -row.dual_sign * tableau.data[obj_row][row.dual_col];
                let y = sense * y;
                if y == 0.0 { 0.0 } else { y }
            })
            .collect();

        let slacks: Vec<f64> = tableau
            .rows
            .iter()
            .map(|row| row.slack_col.map(|col| self.column_value(tableau, col)).unwrap_or(0.0))
            .collect();

        let analysis = self.analyze(problem, &slacks);

        Solution {
            values,
            objective_value,
            shadow_prices,
            slacks,
            basis: tableau.basic_vars.clone(),
            analysis,
        }
    }

    fn analyze(&self, problem: &LpProblem, slacks: &[f64]) -> Analysis {
        // Binding constraints
        let binding_constraints = problem
            .constraints
            .iter()
            .zip(slacks)
            .filter(|(_, slack)| slack.abs() <= BINDING_TOLERANCE)
            .map(|(c, _)| c.name.clone())
            .collect();

        Analysis { binding_constraints }
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    rows: Vec<RowInfo>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

/// Where to read each constraint's dual value and slack in the final tableau
struct RowInfo {
    dual_col: usize,
    dual_sign: f64,
    slack_col: Option<usize>,
}
