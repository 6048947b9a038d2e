//! Algebraic description of a linear / mixed-binary program.
//!
//! An [`LpModel`] is what the solvers hand to an [`LpOracle`](super::LpOracle):
//! bounded variables, `≤` / `≥` rows and a linear objective. The oracle answers
//! with an [`LpSolution`] carrying variable values and per-row slacks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::math::optimization::SolveStatus;

/// Handle to a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a declared constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(pub(crate) usize);

impl RowId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// `lhs ≤ rhs`
    Le,
    /// `lhs ≥ rhs`
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub kind: VarKind,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub terms: Vec<(VarId, f64)>,
    pub kind: RowKind,
    pub rhs: f64,
}

impl Row {
    /// Evaluates the left-hand side at `values`.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, a)| a * values[v.0]).sum()
    }

    /// Distance to the bound, positive when the row is satisfied with room.
    pub fn slack(&self, values: &[f64]) -> f64 {
        match self.kind {
            RowKind::Le => self.rhs - self.activity(values),
            RowKind::Ge => self.activity(values) - self.rhs,
        }
    }
}

/// A linear program with optional binary variables.
#[derive(Debug, Clone)]
pub struct LpModel {
    variables: Vec<Variable>,
    rows: Vec<Row>,
    objective: Vec<(VarId, f64)>,
    sense: Sense,
}

impl Default for LpModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LpModel {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            rows: Vec::new(),
            objective: Vec::new(),
            sense: Sense::Minimize,
        }
    }

    /// Declares a continuous variable in `[lower, upper]`; infinite bounds are allowed.
    pub fn add_var(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.push_var(name.into(), lower, upper, VarKind::Continuous)
    }

    pub fn add_free_var(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn add_binary_var(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), 0.0, 1.0, VarKind::Binary)
    }

    fn push_var(&mut self, name: String, lower: f64, upper: f64, kind: VarKind) -> VarId {
        self.variables.push(Variable {
            name,
            lower,
            upper,
            kind,
        });
        VarId(self.variables.len() - 1)
    }

    pub fn set_objective(&mut self, sense: Sense, terms: Vec<(VarId, f64)>) {
        self.sense = sense;
        self.objective = terms;
    }

    pub fn add_le(&mut self, terms: Vec<(VarId, f64)>, rhs: f64) -> RowId {
        self.push_row(terms, RowKind::Le, rhs)
    }

    pub fn add_ge(&mut self, terms: Vec<(VarId, f64)>, rhs: f64) -> RowId {
        self.push_row(terms, RowKind::Ge, rhs)
    }

    fn push_row(&mut self, terms: Vec<(VarId, f64)>, kind: RowKind, rhs: f64) -> RowId {
        self.rows.push(Row { terms, kind, rhs });
        RowId(self.rows.len() - 1)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn has_binary(&self) -> bool {
        self.variables.iter().any(|v| v.kind == VarKind::Binary)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.iter().map(|&(v, c)| c * values[v.0]).sum()
    }

    /// Writes the model to `path` in CPLEX LP format.
    pub fn export(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_lp(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Writes the model in CPLEX LP format.
    pub fn write_lp(&self, out: &mut dyn Write) -> Result<()> {
        match self.sense {
            Sense::Minimize => writeln!(out, "Minimize")?,
            Sense::Maximize => writeln!(out, "Maximize")?,
        }
        writeln!(out, " obj: {}", self.expression(&self.objective))?;

        writeln!(out, "Subject To")?;
        for (i, row) in self.rows.iter().enumerate() {
            let op = match row.kind {
                RowKind::Le => "<=",
                RowKind::Ge => ">=",
            };
            writeln!(out, " c{}: {} {} {}", i, self.expression(&row.terms), op, row.rhs)?;
        }

        writeln!(out, "Bounds")?;
        for var in self.variables.iter().filter(|v| v.kind == VarKind::Continuous) {
            let name = lp_name(&var.name);
            match (var.lower.is_finite(), var.upper.is_finite()) {
                (false, false) => writeln!(out, " {} free", name)?,
                (true, false) => writeln!(out, " {} >= {}", name, var.lower)?,
                (false, true) => writeln!(out, " -inf <= {} <= {}", name, var.upper)?,
                (true, true) => writeln!(out, " {} <= {} <= {}", var.lower, name, var.upper)?,
            }
        }

        if self.has_binary() {
            writeln!(out, "Binaries")?;
            for var in self.variables.iter().filter(|v| v.kind == VarKind::Binary) {
                writeln!(out, " {}", lp_name(&var.name))?;
            }
        }
        writeln!(out, "End")?;
        Ok(())
    }

    fn expression(&self, terms: &[(VarId, f64)]) -> String {
        if terms.is_empty() {
            return "0".to_string();
        }
        let mut expr = String::new();
        for (k, &(var, coef)) in terms.iter().enumerate() {
            let name = lp_name(&self.variables[var.0].name);
            if k == 0 {
                expr.push_str(&format!("{} {}", coef, name));
            } else if coef < 0.0 {
                expr.push_str(&format!(" - {} {}", -coef, name));
            } else {
                expr.push_str(&format!(" + {} {}", coef, name));
            }
        }
        expr
    }
}

fn lp_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Answer of an [`LpOracle`](super::LpOracle).
#[derive(Debug, Clone)]
pub struct LpSolution {
    pub status: SolveStatus,
    /// One value per declared variable, empty unless optimal
    pub values: Vec<f64>,
    pub objective_value: f64,
    /// One slack per row (see [`Row::slack`]), empty unless optimal
    pub slacks: Vec<f64>,
}

impl LpSolution {
    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::NAN,
            slacks: Vec::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(f64::NAN)
    }

    pub fn values_of(&self, vars: &[VarId]) -> Vec<f64> {
        vars.iter().map(|&v| self.value(v)).collect()
    }

    pub fn slack(&self, row: RowId) -> f64 {
        self.slacks.get(row.0).copied().unwrap_or(f64::NAN)
    }
}
