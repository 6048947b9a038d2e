use crate::error::Result;
use crate::math::integer_linear::{BranchAndBoundSolver, ILPSolver, IntegerLinearProgram};
use crate::math::optimization::model::{LpModel, LpSolution, RowKind, Sense, VarKind};
use crate::math::optimization::simplex::{minimize, LinearProgram};
use crate::math::optimization::{OptimizationConfig, SolveStatus};

/// The optimization back end the ALP solvers talk to.
///
/// Any LP / mixed-binary solver can be plugged in; the solvers only rely on
/// the returned status, variable values and row slacks.
pub trait LpOracle {
    fn solve(&self, model: &LpModel) -> Result<LpSolution>;
}

/// Reference oracle built on the dense two-phase simplex, with branch and
/// bound on top when the model declares binary variables.
#[derive(Debug, Clone)]
pub struct SimplexOracle {
    pub config: OptimizationConfig<f64>,
    /// Node budget for branch and bound
    pub max_nodes: usize,
    /// Integrality tolerance for branch and bound
    pub integrality_tolerance: f64,
}

impl Default for SimplexOracle {
    fn default() -> Self {
        Self {
            config: OptimizationConfig::default(),
            max_nodes: 10_000,
            integrality_tolerance: 1e-6,
        }
    }
}

// How a model variable maps onto non-negative standard-form columns
#[derive(Debug, Clone, Copy)]
enum Column {
    // x = offset + y
    Shifted { col: usize, offset: f64 },
    // x = offset - y
    Mirrored { col: usize, offset: f64 },
    // x = y+ - y-
    Split { pos: usize, neg: usize },
}

struct StandardForm {
    program: LinearProgram<f64>,
    columns: Vec<Column>,
    integer_cols: Vec<usize>,
}

impl StandardForm {
    fn build(model: &LpModel) -> Option<Self> {
        let mut columns = Vec::with_capacity(model.variables().len());
        let mut integer_cols = Vec::new();
        let mut bound_rows: Vec<(usize, f64)> = Vec::new();
        let mut n = 0;

        for var in model.variables() {
            if var.lower > var.upper {
                return None;
            }
            let column = match (var.lower.is_finite(), var.upper.is_finite()) {
                (true, upper_finite) => {
                    if upper_finite {
                        bound_rows.push((n, var.upper - var.lower));
                    }
                    Column::Shifted {
                        col: n,
                        offset: var.lower,
                    }
                }
                (false, true) => Column::Mirrored {
                    col: n,
                    offset: var.upper,
                },
                (false, false) => {
                    n += 1;
                    Column::Split { pos: n - 1, neg: n }
                }
            };
            if var.kind == VarKind::Binary {
                if let Column::Shifted { col, .. } = column {
                    integer_cols.push(col);
                }
            }
            columns.push(column);
            n += 1;
        }

        let sign = match model.sense() {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        };
        let mut objective = vec![0.0; n];
        for &(var, c) in model.objective() {
            add_term(&mut objective, columns[var.index()], sign * c);
        }

        let mut constraints = Vec::with_capacity(model.rows().len() + bound_rows.len());
        let mut rhs = Vec::with_capacity(constraints.capacity());
        for row in model.rows() {
            let flip = match row.kind {
                RowKind::Le => 1.0,
                RowKind::Ge => -1.0,
            };
            let mut coeffs = vec![0.0; n];
            let mut bound = flip * row.rhs;
            for &(var, a) in &row.terms {
                let column = columns[var.index()];
                add_term(&mut coeffs, column, flip * a);
                bound -= flip * a * offset(column);
            }
            constraints.push(coeffs);
            rhs.push(bound);
        }
        for (col, width) in bound_rows {
            let mut coeffs = vec![0.0; n];
            coeffs[col] = 1.0;
            constraints.push(coeffs);
            rhs.push(width);
        }

        Some(Self {
            program: LinearProgram {
                objective,
                constraints,
                rhs,
            },
            columns,
            integer_cols,
        })
    }

    fn recover(&self, point: &[f64]) -> Vec<f64> {
        self.columns
            .iter()
            .map(|&column| match column {
                Column::Shifted { col, offset } => offset + point[col],
                Column::Mirrored { col, offset } => offset - point[col],
                Column::Split { pos, neg } => point[pos] - point[neg],
            })
            .collect()
    }
}

fn add_term(coeffs: &mut [f64], column: Column, a: f64) {
    match column {
        Column::Shifted { col, .. } => coeffs[col] += a,
        Column::Mirrored { col, .. } => coeffs[col] -= a,
        Column::Split { pos, neg } => {
            coeffs[pos] += a;
            coeffs[neg] -= a;
        }
    }
}

fn offset(column: Column) -> f64 {
    match column {
        Column::Shifted { offset, .. } | Column::Mirrored { offset, .. } => offset,
        Column::Split { .. } => 0.0,
    }
}

impl LpOracle for SimplexOracle {
    fn solve(&self, model: &LpModel) -> Result<LpSolution> {
        let standard = match StandardForm::build(model) {
            Some(standard) => standard,
            None => return Ok(LpSolution::failed(SolveStatus::Infeasible)),
        };

        let (status, point) = if standard.integer_cols.is_empty() {
            let result = minimize(&standard.program, &self.config);
            (result.status, result.optimal_point)
        } else {
            let solver = BranchAndBoundSolver::new(
                self.max_nodes,
                self.integrality_tolerance,
                self.config.clone(),
            );
            let problem = IntegerLinearProgram {
                program: standard.program.clone(),
                integer_vars: standard.integer_cols.clone(),
            };
            let solution = solver.solve(&problem)?;
            (solution.status, solution.values)
        };

        if status != SolveStatus::Optimal {
            return Ok(LpSolution::failed(status));
        }

        let values = standard.recover(&point);
        let slacks = model.rows().iter().map(|row| row.slack(&values)).collect();
        Ok(LpSolution {
            status,
            objective_value: model.objective_value(&values),
            values,
            slacks,
        })
    }
}
