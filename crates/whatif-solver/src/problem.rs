use thiserror::Error;

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<=", alias = "le"))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">=", alias = "ge"))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "=", alias = "eq"))]
    Eq,
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("Problem has no constraints")]
    NoConstraints,
    #[error("Constraint index {index} out of range ({count} constraints)")]
    ConstraintOutOfRange { index: usize, count: usize },
}

impl Constraint {
    /// Left-hand side `A_i·x` for a given point
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(a, x)| a * x)
            .sum()
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Build a problem from its matrix form `(c, A, b, sense)`.
    /// Variables are named `x1..xn` and constraints `R1..Rm`.
    pub fn from_parts(
        objective: Vec<f64>,
        rows: Vec<Vec<f64>>,
        rhs: Vec<f64>,
        ops: Vec<ConstraintOp>,
        minimize: bool,
    ) -> Result<Self, ProblemError> {
        if rhs.len() != rows.len() {
            return Err(ProblemError::DimensionMismatch {
                what: "right-hand side".to_string(),
                expected: rows.len(),
                found: rhs.len(),
            });
        }
        if ops.len() != rows.len() {
            return Err(ProblemError::DimensionMismatch {
                what: "constraint operators".to_string(),
                expected: rows.len(),
                found: ops.len(),
            });
        }

        let variables = (1..=objective.len()).map(|j| format!("x{}", j)).collect();
        let mut problem = LpProblem::new(variables);
        problem.set_objective(objective, minimize);
        for (i, ((coefficients, rhs), op)) in rows.into_iter().zip(rhs).zip(ops).enumerate() {
            problem.add_constraint(format!("R{}", i + 1), coefficients, op, rhs);
        }
        problem.validate()?;
        Ok(problem)
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Right-hand side vector `b`
    pub fn rhs(&self) -> Vec<f64> {
        self.constraints.iter().map(|c| c.rhs).collect()
    }

    /// Copy of this problem with the right-hand side of one constraint replaced
    pub fn with_rhs(&self, index: usize, rhs: f64) -> Result<Self, ProblemError> {
        let count = self.num_constraints();
        let mut perturbed = self.clone();
        let constraint = perturbed
            .constraints
            .get_mut(index)
            .ok_or(ProblemError::ConstraintOutOfRange { index, count })?;
        constraint.rhs = rhs;
        Ok(perturbed)
    }

    /// Check that the objective and every constraint row have one entry per variable
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(ProblemError::DimensionMismatch {
                what: "objective".to_string(),
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.constraints.is_empty() {
            return Err(ProblemError::NoConstraints);
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(ProblemError::DimensionMismatch {
                    what: format!("constraint {}", c.name),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
        }
        Ok(())
    }
}
