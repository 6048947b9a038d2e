use num_traits::Float;
use std::fmt::Debug;

use crate::math::optimization::{OptimizationConfig, OptimizationResult, SolveStatus};

/// A linear programming problem in standard form.
#[derive(Debug, Clone)]
pub struct LinearProgram<T>
where
    T: Float + Debug,
{
    /// The objective function coefficients (c in min c^T x)
    pub objective: Vec<T>,
    /// The constraint matrix (A in Ax ≤ b)
    pub constraints: Vec<Vec<T>>,
    /// The right-hand side vector (b in Ax ≤ b), entries may be negative
    pub rhs: Vec<T>,
}

const EPSILON: f64 = 1e-9;

/// Minimizes a linear program using the two-phase Simplex Method.
///
/// The Simplex Method solves linear programming problems in standard form:
/// minimize c^T x
/// subject to Ax ≤ b
///           x ≥ 0
///
/// Rows with a negative right-hand side get an artificial variable and are
/// brought into the basis by phase one. Pivoting follows Bland's rule, so the
/// method terminates on the degenerate programs that Bellman constraints tend
/// to produce.
///
/// # Arguments
///
/// * `lp` - The linear program to solve
/// * `config` - Configuration options for the optimization process
///
/// # Returns
///
/// Returns an `OptimizationResult` whose `status` tells whether the program
/// was solved, infeasible, unbounded, or ran out of iterations.
///
/// # Examples
///
/// ```
/// use adp::math::optimization::{OptimizationConfig, SolveStatus};
/// use adp::math::optimization::simplex::{LinearProgram, minimize};
///
/// // Solve the linear program:
/// // minimize -x - y
/// // subject to:
/// //   x + y ≤ 1
/// //   x, y ≥ 0
///
/// let lp = LinearProgram {
///     objective: vec![-1.0_f64, -1.0],
///     constraints: vec![vec![1.0, 1.0]],
///     rhs: vec![1.0],
/// };
///
/// let config = OptimizationConfig::default();
/// let result = minimize(&lp, &config);
/// assert_eq!(result.status, SolveStatus::Optimal);
/// assert!((result.optimal_value + 1.0).abs() < 1e-9);
/// ```
pub fn minimize<T>(lp: &LinearProgram<T>, config: &OptimizationConfig<T>) -> OptimizationResult<T>
where
    T: Float + Debug,
{
    let n = lp.objective.len();
    let eps = T::from(EPSILON).unwrap_or_else(T::epsilon);
    let mut tableau = Tableau::new(lp);
    let mut iterations = 0;

    // Phase I: drive the artificial variables to zero
    if tableau.has_artificial() {
        let costs = tableau.phase_one_costs();
        let status = tableau.run(&costs, tableau.cols, eps, config, &mut iterations);
        if status == SolveStatus::MaxIterationsReached {
            log::warn!("simplex phase one stopped after {} pivots", iterations);
            return failed(status, iterations);
        }
        if tableau.artificial_sum() > config.tolerance {
            return failed(SolveStatus::Infeasible, iterations);
        }
        tableau.expel_artificial(eps);
    }

    // Phase II: optimize the real objective, artificial columns may not re-enter
    let mut costs = vec![T::zero(); tableau.cols];
    costs[..n].copy_from_slice(&lp.objective);
    let mut phase_two = 0;
    let status = tableau.run(
        &costs,
        tableau.artificial_start,
        eps,
        config,
        &mut phase_two,
    );
    iterations += phase_two;
    if status != SolveStatus::Optimal {
        if status == SolveStatus::MaxIterationsReached {
            log::warn!("simplex phase two stopped after {} pivots", phase_two);
        }
        return failed(status, iterations);
    }

    let optimal_point = tableau.extract_solution(n);
    let optimal_value = optimal_point
        .iter()
        .zip(lp.objective.iter())
        .fold(T::zero(), |acc, (&x, &c)| acc + c * x);

    OptimizationResult {
        optimal_point,
        optimal_value,
        iterations,
        status,
    }
}

fn failed<T>(status: SolveStatus, iterations: usize) -> OptimizationResult<T>
where
    T: Float + Debug,
{
    OptimizationResult {
        optimal_point: Vec::new(),
        optimal_value: T::nan(),
        iterations,
        status,
    }
}

/// Dense tableau: one row per constraint, `cols` variable columns followed by
/// the right-hand side.
struct Tableau<T> {
    rows: Vec<Vec<T>>,
    basis: Vec<usize>,
    cols: usize,
    artificial_start: usize,
}

impl<T> Tableau<T>
where
    T: Float + Debug,
{
    // Initialize the tableau with slack variables, plus an artificial
    // variable for every row whose right-hand side is negative
    fn new(lp: &LinearProgram<T>) -> Self {
        let m = lp.constraints.len();
        let n = lp.objective.len();
        let artificial_rows: Vec<usize> = (0..m).filter(|&i| lp.rhs[i] < T::zero()).collect();
        let artificial_start = n + m;
        let cols = artificial_start + artificial_rows.len();

        let mut rows = vec![vec![T::zero(); cols + 1]; m];
        let mut basis = vec![0; m];
        let mut next_artificial = artificial_start;
        for (i, row) in rows.iter_mut().enumerate() {
            let flip = lp.rhs[i] < T::zero();
            let sign = if flip { -T::one() } else { T::one() };
            for (j, &a) in lp.constraints[i].iter().enumerate().take(n) {
                row[j] = sign * a;
            }
            row[n + i] = sign;
            row[cols] = sign * lp.rhs[i];
            if flip {
                row[next_artificial] = T::one();
                basis[i] = next_artificial;
                next_artificial += 1;
            } else {
                basis[i] = n + i;
            }
        }

        Self {
            rows,
            basis,
            cols,
            artificial_start,
        }
    }

    fn has_artificial(&self) -> bool {
        self.cols > self.artificial_start
    }

    fn phase_one_costs(&self) -> Vec<T> {
        (0..self.cols)
            .map(|j| {
                if j >= self.artificial_start {
                    T::one()
                } else {
                    T::zero()
                }
            })
            .collect()
    }

    fn artificial_sum(&self) -> T {
        self.rows
            .iter()
            .zip(self.basis.iter())
            .filter(|&(_, &b)| b >= self.artificial_start)
            .fold(T::zero(), |acc, (row, _)| acc + row[self.cols])
    }

    fn reduced_costs(&self, costs: &[T]) -> Vec<T> {
        let mut reduced = costs.to_vec();
        for (row, &b) in self.rows.iter().zip(self.basis.iter()) {
            let cb = costs[b];
            if cb != T::zero() {
                for (r, &a) in reduced.iter_mut().zip(row.iter()) {
                    *r = *r - cb * a;
                }
            }
        }
        reduced
    }

    fn run(
        &mut self,
        costs: &[T],
        allowed: usize,
        eps: T,
        config: &OptimizationConfig<T>,
        iterations: &mut usize,
    ) -> SolveStatus {
        loop {
            if *iterations >= config.max_iterations {
                return SolveStatus::MaxIterationsReached;
            }

            // Entering variable: lowest index with negative reduced cost
            let reduced = self.reduced_costs(costs);
            let entering = match (0..allowed).find(|&j| reduced[j] < -eps) {
                Some(j) => j,
                None => return SolveStatus::Optimal,
            };

            // Leaving variable: minimum ratio, ties go to the lowest basic index
            let mut leaving: Option<(usize, T)> = None;
            for (i, row) in self.rows.iter().enumerate() {
                let coef = row[entering];
                if coef > eps {
                    let ratio = row[self.cols] / coef;
                    leaving = match leaving {
                        None => Some((i, ratio)),
                        Some((l, best)) => {
                            if ratio < best - eps
                                || ((ratio - best).abs() <= eps && self.basis[i] < self.basis[l])
                            {
                                Some((i, ratio))
                            } else {
                                Some((l, best))
                            }
                        }
                    };
                }
            }

            match leaving {
                Some((row, _)) => self.pivot(row, entering, eps),
                None => return SolveStatus::Unbounded,
            }
            *iterations += 1;
        }
    }

    // Pivot artificial variables sitting at zero out of the basis. Rows where
    // no real column can take over are redundant and keep their artificial.
    fn expel_artificial(&mut self, eps: T) {
        for i in 0..self.rows.len() {
            if self.basis[i] < self.artificial_start {
                continue;
            }
            self.rows[i][self.cols] = T::zero();
            if let Some(j) = (0..self.artificial_start).find(|&j| self.rows[i][j].abs() > eps) {
                self.pivot(i, j, eps);
            }
        }
    }

    // Perform pivot operation with numerical cleanup
    fn pivot(&mut self, leaving_row: usize, entering_col: usize, eps: T) {
        let pivot_scale = T::one() / self.rows[leaving_row][entering_col];
        for value in self.rows[leaving_row].iter_mut() {
            *value = *value * pivot_scale;
            if value.abs() < eps {
                *value = T::zero();
            }
        }
        self.rows[leaving_row][entering_col] = T::one();

        let pivot_row = self.rows[leaving_row].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if i == leaving_row {
                continue;
            }
            let factor = row[entering_col];
            if factor == T::zero() {
                continue;
            }
            for (value, &p) in row.iter_mut().zip(pivot_row.iter()) {
                *value = *value - factor * p;
                if value.abs() < eps {
                    *value = T::zero();
                }
            }
            row[entering_col] = T::zero();
        }

        self.basis[leaving_row] = entering_col;
    }

    fn extract_solution(&self, n: usize) -> Vec<T> {
        let mut solution = vec![T::zero(); n];
        for (row, &b) in self.rows.iter().zip(self.basis.iter()) {
            if b < n {
                solution[b] = row[self.cols].max(T::zero());
            }
        }
        solution
    }
}
