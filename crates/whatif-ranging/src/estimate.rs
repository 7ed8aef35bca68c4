use std::num::NonZeroUsize;
use std::thread;

use log::{debug, warn};
use whatif_solver::LpProblem;

use crate::augment::augment;
use crate::error::RangingError;
use crate::oracle::LpOracle;

/// Finite-difference estimate of the basis-inverse columns of an optimal solution.
///
/// Column `j` holds the change of every tableau row value (decision variables, then
/// constraint residuals) per unit increase of constraint `j`'s right-hand side. Residuals
/// of both optima are measured against the unperturbed right-hand side.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityColumns {
    num_variables: usize,
    baseline: Vec<f64>,
    columns: Vec<Vec<f64>>,
    basis_shifts: Vec<usize>,
}

impl SensitivityColumns {
    /// Wrap columns obtained elsewhere, e.g. read off a final tableau.
    /// `baseline` and every column must have `num_variables + columns.len()` entries.
    pub fn new(num_variables: usize, baseline: Vec<f64>, columns: Vec<Vec<f64>>) -> Result<Self, RangingError> {
        let len = num_variables + columns.len();
        RangingError::check_len("baseline state", len, baseline.len())?;
        for column in &columns {
            RangingError::check_len("sensitivity column", len, column.len())?;
        }
        Ok(Self {
            num_variables,
            baseline,
            columns,
            basis_shifts: Vec::new(),
        })
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_constraints(&self) -> usize {
        self.columns.len()
    }

    /// Augmented state of the unperturbed optimum
    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn column(&self, constraint: usize) -> Option<&[f64]> {
        self.columns.get(constraint).map(Vec::as_slice)
    }

    /// Coefficients of one tableau row across all columns
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.columns.iter().map(|column| column[row]).collect()
    }

    /// Constraints whose perturbed optimum moved to a different set of non-zero
    /// variables. Their columns do not describe the baseline basis.
    pub fn basis_shifts(&self) -> &[usize] {
        &self.basis_shifts
    }
}

/// Estimates sensitivity columns by re-solving the problem once per constraint
#[derive(Debug, Clone)]
pub struct Estimator {
    /// RHS increment applied to each constraint
    step: f64,
    /// Issue the perturbed solves on worker threads
    parallel: bool,
    /// Magnitude above which a tableau value counts as non-zero when comparing supports
    support_tolerance: f64,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            step: 1.0,
            parallel: false,
            support_tolerance: 1e-7,
        }
    }
}

impl Estimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_support_tolerance(mut self, tol: f64) -> Self {
        self.support_tolerance = tol;
        self
    }

    /// Estimate one column per constraint around the optimum `baseline`.
    ///
    /// Costs one solve per constraint. Any failing solve aborts the whole estimate;
    /// the error names the lowest failing constraint.
    pub fn estimate<O>(&self, oracle: &O, problem: &LpProblem, baseline: &[f64]) -> Result<SensitivityColumns, RangingError>
    where
        O: LpOracle + Sync + ?Sized,
    {
        RangingError::check_len("baseline solution", problem.num_variables(), baseline.len())?;

        let m = problem.num_constraints();
        let orig = augment(problem, baseline);

        let perturbed: Vec<Result<Perturbed, RangingError>> = if self.parallel && m > 1 {
            let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get).min(m);
            let chunk = m.div_ceil(workers);
            thread::scope(|scope| {
                let handles: Vec<_> = (0..m)
                    .step_by(chunk)
                    .map(|first| {
                        let last = (first + chunk).min(m);
                        scope.spawn(move || {
                            (first..last)
                                .map(|j| self.perturbed_state(oracle, problem, j))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                    .collect()
            })
        } else {
            (0..m).map(|j| self.perturbed_state(oracle, problem, j)).collect()
        };

        let mut columns = Vec::with_capacity(m);
        let mut basis_shifts = Vec::new();
        for (j, state) in perturbed.into_iter().enumerate() {
            let state = state?;
            if self.support_differs(&orig, &state.own) {
                warn!(
                    "perturbing {} moved the optimum to a different basis; its sensitivity column is unreliable",
                    problem.constraints[j].name
                );
                basis_shifts.push(j);
            }
            columns.push(state.state.iter().zip(&orig).map(|(p, o)| (p - o) / self.step).collect());
        }

        Ok(SensitivityColumns {
            num_variables: problem.num_variables(),
            baseline: orig,
            columns,
            basis_shifts,
        })
    }

    /// Optimum of the problem with constraint `j`'s RHS raised by one step
    fn perturbed_state<O>(&self, oracle: &O, problem: &LpProblem, j: usize) -> Result<Perturbed, RangingError>
    where
        O: LpOracle + ?Sized,
    {
        let rhs = problem.constraints[j].rhs + self.step;
        let perturbed = problem.with_rhs(j, rhs)?;
        let solution = oracle
            .solve(&perturbed)
            .map_err(|source| RangingError::Estimation { constraint: j, source })?;
        RangingError::check_len("perturbed solution", problem.num_variables(), solution.values.len())?;

        debug!(
            "perturbed {}: rhs={} objective={}",
            problem.constraints[j].name, rhs, solution.objective_value
        );

        Ok(Perturbed {
            state: augment(problem, &solution.values),
            own: augment(&perturbed, &solution.values),
        })
    }

    fn support_differs(&self, orig: &[f64], perturbed: &[f64]) -> bool {
        orig.iter()
            .zip(perturbed)
            .any(|(o, p)| (o.abs() > self.support_tolerance) != (p.abs() > self.support_tolerance))
    }
}

/// Augmented optimum of one perturbed problem
struct Perturbed {
    /// Residuals against the unperturbed RHS; differenced into the column
    state: Vec<f64>,
    /// Residuals against the perturbed RHS; compared for basis shifts
    own: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::oracle::FnOracle;
    use whatif_solver::{ConstraintOp, SolveError, Solver};

    fn furniture() -> LpProblem {
        LpProblem::from_parts(
            vec![12.0, 60.0],
            vec![vec![2.0, 1.0], vec![1.0, 1.0]],
            vec![250.0, 180.0],
            vec![ConstraintOp::Le, ConstraintOp::Le],
            false,
        )
        .unwrap()
    }

    fn three_rows() -> LpProblem {
        // Maximize: 3x + 2y
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);
        problem
    }

    fn diet() -> LpProblem {
        let mut problem = LpProblem::new(vec!["corn".to_string(), "soy".to_string()]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("ration", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("corn_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("soy_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);
        problem
    }

    fn blend() -> LpProblem {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 1.0], false);
        problem.add_constraint("total", vec![1.0, 1.0], ConstraintOp::Eq, 5.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-6, "entry {}: {} (expected {})", i, a, e);
        }
    }

    #[test]
    fn test_furniture_columns() {
        let problem = furniture();
        let solver = Solver::new();
        let baseline = solver.solve(&problem).unwrap();

        let columns = Estimator::new().estimate(&solver, &problem, &baseline.values).unwrap();

        assert_eq!(columns.num_constraints(), 2);
        assert_close(columns.baseline(), &[0.0, 180.0, 70.0, 0.0]);
        // More wood leaves the optimum where it is
        assert_close(columns.column(0).unwrap(), &[0.0, 0.0, 0.0, 0.0]);
        // More hours go straight into x2, eating wood slack and overrunning the old hour limit
        assert_close(columns.column(1).unwrap(), &[0.0, 1.0, -1.0, -1.0]);
        assert_close(&columns.row(2), &[0.0, -1.0]);
        assert_close(&columns.row(3), &[0.0, -1.0]);
        assert!(columns.basis_shifts().is_empty());
    }

    #[test]
    fn test_own_residual_measured_against_original_rhs() {
        let problem = furniture();
        let solver = Solver::new();
        let baseline = solver.solve(&problem).unwrap();
        let hours = problem.with_rhs(1, 181.0).unwrap();
        let raised = solver.solve(&hours).unwrap();

        let columns = Estimator::new().estimate(&solver, &problem, &baseline.values).unwrap();

        let expected: Vec<f64> = augment(&problem, &raised.values)
            .iter()
            .zip(augment(&problem, &baseline.values))
            .map(|(p, o)| p - o)
            .collect();
        assert_close(columns.column(1).unwrap(), &expected);
        // Against its own raised limit the hours row stays tight
        assert!(augment(&hours, &raised.values)[3].abs() < 1e-6);
    }

    #[test]
    fn test_mixed_sense_columns() {
        // Minimize 2c + 3s: c + s >= 4, c <= 3, s <= 3. Optimal: c=3, s=1
        let problem = diet();
        let solver = Solver::new();
        let baseline = solver.solve(&problem).unwrap();

        let columns = Estimator::new().estimate(&solver, &problem, &baseline.values).unwrap();

        assert_close(columns.baseline(), &[3.0, 1.0, 0.0, 0.0, 2.0]);
        // A larger ration is met with soy; the surplus is counted against the old ration
        assert_close(columns.column(0).unwrap(), &[0.0, 1.0, 1.0, 0.0, -1.0]);
        // More corn allowed replaces all soy
        assert_close(columns.column(1).unwrap(), &[1.0, -1.0, 0.0, -1.0, 1.0]);
        assert_close(columns.column(2).unwrap(), &[0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(columns.basis_shifts(), &[1]);
    }

    #[test]
    fn test_equality_columns() {
        // Maximize 2x + y: x + y = 5, x <= 3. Optimal: x=3, y=2
        let problem = blend();
        let solver = Solver::new();
        let baseline = solver.solve(&problem).unwrap();

        let columns = Estimator::new().estimate(&solver, &problem, &baseline.values).unwrap();

        assert_close(columns.baseline(), &[3.0, 2.0, 0.0, 0.0]);
        assert_close(columns.column(0).unwrap(), &[0.0, 1.0, -1.0, 0.0]);
        assert_close(columns.column(1).unwrap(), &[1.0, -1.0, 0.0, -1.0]);
        assert!(columns.basis_shifts().is_empty());
    }

    #[test]
    fn test_step_is_divided_out() {
        let problem = furniture();
        let solver = Solver::new();
        let baseline = solver.solve(&problem).unwrap();

        let unit = Estimator::new().estimate(&solver, &problem, &baseline.values).unwrap();
        let scaled = Estimator::new()
            .with_step(5.0)
            .estimate(&solver, &problem, &baseline.values)
            .unwrap();

        for j in 0..2 {
            assert_close(scaled.column(j).unwrap(), unit.column(j).unwrap());
        }
    }

    #[test]
    fn test_basis_shift_is_reported() {
        let _ = env_logger::builder().is_test(true).try_init();

        let problem = three_rows();
        let solver = Solver::new();
        let baseline = solver.solve(&problem).unwrap();

        let columns = Estimator::new().estimate(&solver, &problem, &baseline.values).unwrap();

        // Raising x_max by one drives y to zero: the optimum lands on another vertex
        assert_eq!(columns.basis_shifts(), &[1]);
        assert_close(columns.column(0).unwrap(), &[0.0, 1.0, -1.0, 0.0, -1.0]);
        assert_close(columns.column(2).unwrap(), &[0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let problem = three_rows();
        let solver = Solver::new();
        let baseline = solver.solve(&problem).unwrap();

        let sequential = Estimator::new().estimate(&solver, &problem, &baseline.values).unwrap();
        let parallel = Estimator::new()
            .with_parallel(true)
            .estimate(&solver, &problem, &baseline.values)
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_parallel_workers_are_bounded() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], false);
        for i in 0..64 {
            problem.add_constraint(format!("cap{}", i), vec![1.0], ConstraintOp::Le, 10.0 + i as f64);
        }
        let baseline = Solver::new().solve(&problem).unwrap();
        let calls = AtomicUsize::new(0);
        let threads = Mutex::new(HashSet::new());
        let oracle = FnOracle(|p: &LpProblem| {
            calls.fetch_add(1, Ordering::SeqCst);
            threads.lock().unwrap().insert(thread::current().id());
            Solver::new().solve(p)
        });

        let parallel = Estimator::new()
            .with_parallel(true)
            .estimate(&oracle, &problem, &baseline.values)
            .unwrap();
        let sequential = Estimator::new().estimate(&Solver::new(), &problem, &baseline.values).unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(calls.load(Ordering::SeqCst), 64);
        let limit = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        assert!(threads.lock().unwrap().len() <= limit);
    }

    #[test]
    fn test_one_solve_per_constraint() {
        let problem = three_rows();
        let baseline = Solver::new().solve(&problem).unwrap();
        let calls = AtomicUsize::new(0);
        let oracle = FnOracle(|p: &LpProblem| {
            calls.fetch_add(1, Ordering::SeqCst);
            Solver::new().solve(p)
        });

        Estimator::new().estimate(&oracle, &problem, &baseline.values).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failed_solve_names_constraint() {
        let problem = three_rows();
        let baseline = Solver::new().solve(&problem).unwrap();
        let oracle = FnOracle(|p: &LpProblem| {
            if p.constraints[1].rhs != 3.0 {
                Err(SolveError::Unbounded)
            } else {
                Solver::new().solve(p)
            }
        });

        let err = Estimator::new().estimate(&oracle, &problem, &baseline.values).unwrap_err();

        assert_eq!(
            err,
            RangingError::Estimation {
                constraint: 1,
                source: SolveError::Unbounded,
            }
        );
        assert_eq!(
            err.to_string(),
            "Could not estimate sensitivity column for constraint 2: Problem is unbounded"
        );
    }

    #[test]
    fn test_parallel_failure_reports_lowest_index() {
        let problem = three_rows();
        let baseline = Solver::new().solve(&problem).unwrap();
        let oracle = FnOracle(|p: &LpProblem| {
            if p.constraints[0].rhs == 4.0 {
                Err(SolveError::Infeasible)
            } else {
                Solver::new().solve(p)
            }
        });

        // Every solve except the one perturbing `sum` fails
        let err = Estimator::new()
            .with_parallel(true)
            .estimate(&oracle, &problem, &baseline.values)
            .unwrap_err();

        assert!(matches!(err, RangingError::Estimation { constraint: 1, .. }), "{:?}", err);
    }

    #[test]
    fn test_baseline_length_checked() {
        let problem = furniture();
        let err = Estimator::new().estimate(&Solver::new(), &problem, &[0.0]).unwrap_err();
        assert!(matches!(err, RangingError::Dimension { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_new_checks_column_lengths() {
        assert!(SensitivityColumns::new(1, vec![1.0, 0.0], vec![vec![0.0, 1.0]]).is_ok());
        let err = SensitivityColumns::new(1, vec![1.0, 0.0], vec![vec![0.0]]).unwrap_err();
        assert!(matches!(err, RangingError::Dimension { what: "sensitivity column", .. }));
    }
}
