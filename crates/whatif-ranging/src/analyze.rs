use std::fmt;

use log::trace;
use whatif_solver::LpProblem;

use crate::augment::augment;
use crate::error::RangingError;
use crate::estimate::SensitivityColumns;
use crate::format::format_condition;

/// Absolute slack allowed below zero before a row counts as violated
pub const FEASIBILITY_TOLERANCE: f64 = 1e-8;

/// Coefficients smaller than this are printed as zero
pub const ZERO_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub feasibility: f64,
    pub zero: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            feasibility: FEASIBILITY_TOLERANCE,
            zero: ZERO_TOLERANCE,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Violated,
}

impl Verdict {
    /// The boundary is inclusive: `-tolerance` itself is still feasible
    pub fn classify(value: f64, tolerance: f64) -> Self {
        if value >= -tolerance {
            Verdict::Ok
        } else {
            Verdict::Violated
        }
    }

    pub fn is_ok(self) -> bool {
        self == Verdict::Ok
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => write!(f, "OK"),
            Verdict::Violated => write!(f, "VIOLATED"),
        }
    }
}

/// Feasibility inequality of one constraint's residual row:
/// `constant + Σ coefficients[j]·Δj ≥ 0`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RangingCondition {
    /// Zero-based constraint index
    pub constraint: usize,
    /// Constraint name
    pub name: String,
    /// Full-precision coefficients, one per perturbed constraint
    pub coefficients: Vec<f64>,
    /// Residual of the row at the baseline optimum
    pub constant: f64,
    /// The inequality's left-hand side evaluated at the proposed perturbation
    pub value: f64,
    pub verdict: Verdict,
    /// Printable form of the inequality
    pub condition: String,
}

impl fmt::Display for RangingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.condition)
    }
}

/// Per-row verdicts for one perturbation
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Feasibility {
    pub conditions: Vec<RangingCondition>,
    /// True when every row is satisfied
    pub viable: bool,
}

impl Feasibility {
    pub fn evaluations(&self) -> Vec<f64> {
        self.conditions.iter().map(|c| c.value).collect()
    }

    pub fn violations(&self) -> impl Iterator<Item = &RangingCondition> {
        self.conditions.iter().filter(|c| !c.verdict.is_ok())
    }
}

/// Build and evaluate the ranging condition of every constraint row for `delta`.
///
/// Only the residual rows of the augmented state are checked; the decision-variable
/// rows are not.
pub fn analyze(
    problem: &LpProblem,
    baseline: &[f64],
    columns: &SensitivityColumns,
    delta: &[f64],
    tolerances: &Tolerances,
) -> Result<Feasibility, RangingError> {
    let n = problem.num_variables();
    let m = problem.num_constraints();
    RangingError::check_len("perturbation vector", m, delta.len())?;
    RangingError::check_len("baseline solution", n, baseline.len())?;
    RangingError::check_len("sensitivity columns", m, columns.num_constraints())?;
    RangingError::check_len("sensitivity column variables", n, columns.num_variables())?;

    let orig = augment(problem, baseline);

    let conditions: Vec<RangingCondition> = problem
        .constraints
        .iter()
        .enumerate()
        .map(|(i, constraint)| {
            let row = n + i;
            let coefficients = columns.row(row);
            let constant = orig[row];
            let value = constant + coefficients.iter().zip(delta).map(|(c, d)| c * d).sum::<f64>();
            let verdict = Verdict::classify(value, tolerances.feasibility);
            trace!("row {}: value={} verdict={}", constraint.name, value, verdict);

            RangingCondition {
                constraint: i,
                name: constraint.name.clone(),
                condition: format_condition(&coefficients, constant, tolerances.zero),
                coefficients,
                constant,
                value,
                verdict,
            }
        })
        .collect();

    let viable = conditions.iter().all(|c| c.verdict.is_ok());

    Ok(Feasibility { conditions, viable })
}
