use log::debug;
use whatif_solver::{LpProblem, Solution};

use crate::analyze::{RangingCondition, Tolerances, analyze};
use crate::error::RangingError;
use crate::estimate::{Estimator, SensitivityColumns};
use crate::impact::{ProfitImpact, impact};
use crate::oracle::LpOracle;

/// Outcome of checking one right-hand-side perturbation against an optimal solution
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RangingResult {
    /// One feasibility condition per constraint row
    pub conditions: Vec<RangingCondition>,
    /// True when every condition holds
    pub viable: bool,
    /// Objective change, present only when viable
    pub impact: Option<ProfitImpact>,
    /// Constraints whose sensitivity column came from a different basis
    pub basis_shifts: Vec<usize>,
}

impl RangingResult {
    pub fn evaluations(&self) -> Vec<f64> {
        self.conditions.iter().map(|c| c.value).collect()
    }
}

/// What-if analysis around one optimal solution.
///
/// The problem and baseline are never modified, so one session can evaluate any
/// number of perturbations, and estimated columns can be shared between them.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    problem: &'a LpProblem,
    baseline: Solution,
    estimator: Estimator,
    tolerances: Tolerances,
}

impl<'a> Session<'a> {
    /// Start from an optimum the caller already has
    pub fn new(problem: &'a LpProblem, baseline: Solution) -> Result<Self, RangingError> {
        problem.validate()?;
        RangingError::check_len("baseline solution", problem.num_variables(), baseline.num_variables())?;
        RangingError::check_len("shadow prices", problem.num_constraints(), baseline.num_constraints())?;
        Ok(Self {
            problem,
            baseline,
            estimator: Estimator::default(),
            tolerances: Tolerances::default(),
        })
    }

    /// Solve the problem once to obtain the baseline optimum
    pub fn solve<O>(oracle: &O, problem: &'a LpProblem) -> Result<Self, RangingError>
    where
        O: LpOracle + ?Sized,
    {
        let baseline = oracle.solve(problem)?;
        debug!("baseline objective={}", baseline.objective_value);
        Self::new(problem, baseline)
    }

    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.estimator = self.estimator.with_parallel(parallel);
        self
    }

    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.tolerances.feasibility = tol;
        self
    }

    pub fn with_zero_tolerance(mut self, tol: f64) -> Self {
        self.tolerances.zero = tol;
        self
    }

    pub fn problem(&self) -> &LpProblem {
        self.problem
    }

    pub fn baseline(&self) -> &Solution {
        &self.baseline
    }

    pub fn check_delta(&self, delta: &[f64]) -> Result<(), RangingError> {
        RangingError::check_len("perturbation vector", self.problem.num_constraints(), delta.len())
    }

    /// Estimate the sensitivity columns around the baseline (one solve per constraint)
    pub fn estimate<O>(&self, oracle: &O) -> Result<SensitivityColumns, RangingError>
    where
        O: LpOracle + Sync + ?Sized,
    {
        self.estimator.estimate(oracle, self.problem, &self.baseline.values)
    }

    /// Check `delta` against previously estimated columns and price it if feasible
    pub fn evaluate(&self, columns: &SensitivityColumns, delta: &[f64]) -> Result<RangingResult, RangingError> {
        let feasibility = analyze(self.problem, &self.baseline.values, columns, delta, &self.tolerances)?;
        let profit = impact(
            &self.baseline.shadow_prices,
            delta,
            self.baseline.objective_value,
            feasibility.viable,
        );

        debug!(
            "evaluated delta={:?}: viable={} delta_z={}",
            delta, feasibility.viable, profit.delta_z
        );

        Ok(RangingResult {
            impact: feasibility.viable.then_some(profit),
            conditions: feasibility.conditions,
            viable: feasibility.viable,
            basis_shifts: columns.basis_shifts().to_vec(),
        })
    }

    /// Estimate and evaluate in one go. A malformed `delta` is rejected before any solve.
    pub fn run<O>(&self, oracle: &O, delta: &[f64]) -> Result<RangingResult, RangingError>
    where
        O: LpOracle + Sync + ?Sized,
    {
        self.check_delta(delta)?;
        let columns = self.estimate(oracle)?;
        self.evaluate(&columns, delta)
    }
}
