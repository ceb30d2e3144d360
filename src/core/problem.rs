use std::fmt::Write as _;
use std::io::{self, Write};

use crate::core::{
    filters::{is_pairable, is_pairing_preferred},
    matcher::MatchError,
    scoring::compatibility_score,
    variables::{CandidatePair, MatchVariableSpace, VarId},
};
use crate::models::{MatchParams, Person};

pub const PROBLEM_NAME: &str = "Date_Matching_Problem";

/// Sparse linear expression over decision variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Value of the expression under a full variable assignment
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    LessOrEqual,
}

impl Relation {
    fn symbol(self) -> &'static str {
        match self {
            Relation::Equal => "=",
            Relation::LessOrEqual => "<=",
        }
    }
}

/// `expr (= | <=) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::Equal => (lhs - self.rhs).abs() <= tolerance,
            Relation::LessOrEqual => lhs <= self.rhs + tolerance,
        }
    }
}

/// Per-pair inputs to the model, kept for reporting after the solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairTerms {
    pub reward: f64,
    pub preferred: bool,
    pub pairable: bool,
    pub coefficient: f64,
}

/// Turns compatibility and soft preferences into objective coefficients
///
/// coefficient = reward - penalty_multiplier * (1 - preferred)
///
/// Self-pairs carry no reward; they cost `unmatched_penalty`, zero by default.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveBuilder {
    params: MatchParams,
}

impl ObjectiveBuilder {
    pub fn new(params: MatchParams) -> Result<Self, MatchError> {
        let MatchParams {
            penalty_multiplier,
            unmatched_penalty,
        } = params;

        if !(0.0..=MatchParams::MAX_PENALTY_MULTIPLIER).contains(&penalty_multiplier) {
            return Err(MatchError::InvalidParameter(format!(
                "penalty_multiplier must be within [0, {}], got {}",
                MatchParams::MAX_PENALTY_MULTIPLIER,
                penalty_multiplier
            )));
        }
        if !(0.0..=MatchParams::MAX_UNMATCHED_PENALTY).contains(&unmatched_penalty) {
            return Err(MatchError::InvalidParameter(format!(
                "unmatched_penalty must be within [0, {}], got {}",
                MatchParams::MAX_UNMATCHED_PENALTY,
                unmatched_penalty
            )));
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> MatchParams {
        self.params
    }

    pub fn pair_terms(
        &self,
        pair: CandidatePair,
        a: &Person,
        b: &Person,
    ) -> Result<PairTerms, MatchError> {
        if pair.is_self() {
            return Ok(PairTerms {
                reward: 0.0,
                preferred: true,
                pairable: true,
                coefficient: -self.params.unmatched_penalty,
            });
        }

        let reward = compatibility_score(a, b)?;
        let preferred = is_pairing_preferred(a, b);
        let penalty = if preferred { 0.0 } else { 1.0 };

        Ok(PairTerms {
            reward,
            preferred,
            pairable: is_pairable(a, b),
            coefficient: reward - self.params.penalty_multiplier * penalty,
        })
    }

    /// Objective expression plus the per-variable terms it was built from
    pub fn build(
        &self,
        persons: &[Person],
        space: &MatchVariableSpace,
    ) -> Result<(LinearExpr, Vec<PairTerms>), MatchError> {
        let mut objective = LinearExpr::with_capacity(space.len());
        let mut terms = Vec::with_capacity(space.len());

        for (var, a, b) in space.with_people(persons) {
            let pair_terms = self.pair_terms(space.pair(var), a, b)?;
            if pair_terms.coefficient != 0.0 {
                objective.push(var, pair_terms.coefficient);
            }
            terms.push(pair_terms);
        }

        Ok((objective, terms))
    }
}

/// The assembled 0/1 assignment program, read-only once built
///
/// maximize   sum(coefficient[p] * x[p])
/// subject to sum(x[p] : p touches i) = 1   for every participant i
///            x[p] <= pairable[p]           for every candidate pair p
///            x binary
#[derive(Debug, Clone)]
pub struct MatchModel {
    name: String,
    space: MatchVariableSpace,
    objective: LinearExpr,
    constraints: Vec<LinearConstraint>,
    pair_terms: Vec<PairTerms>,
    params: MatchParams,
}

impl MatchModel {
    pub fn assemble(persons: &[Person], params: MatchParams) -> Result<Self, MatchError> {
        let builder = ObjectiveBuilder::new(params)?;
        let space = MatchVariableSpace::new(persons.len());
        let (objective, pair_terms) = builder.build(persons, &space)?;

        let mut constraints = Vec::with_capacity(persons.len() + space.len());

        // Every participant is matched exactly once, possibly to themself
        for idx in 0..persons.len() {
            let mut expr = LinearExpr::with_capacity(space.variables_for(idx).len());
            for var in space.variables_for(idx) {
                expr.push(*var, 1.0);
            }
            constraints.push(LinearConstraint {
                name: format!("assign_{}", idx),
                expr,
                relation: Relation::Equal,
                rhs: 1.0,
            });
        }

        // Unpairable pairs are pinned to zero
        for (var, pair) in space.iter() {
            let mut expr = LinearExpr::with_capacity(1);
            expr.push(var, 1.0);
            constraints.push(LinearConstraint {
                name: format!("pairable_{}_{}", pair.first, pair.second),
                expr,
                relation: Relation::LessOrEqual,
                rhs: if pair_terms[var.index()].pairable { 1.0 } else { 0.0 },
            });
        }

        let pairable_count = space
            .iter()
            .filter(|(var, pair)| !pair.is_self() && pair_terms[var.index()].pairable)
            .count();

        tracing::info!(
            "Assembled model for {} participants: {} variables, {} constraints, {} pairable pairs",
            persons.len(),
            space.len(),
            constraints.len(),
            pairable_count
        );

        Ok(Self {
            name: PROBLEM_NAME.to_string(),
            space,
            objective,
            constraints,
            pair_terms,
            params: builder.params(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space(&self) -> &MatchVariableSpace {
        &self.space
    }

    pub fn variable_count(&self) -> usize {
        self.space.len()
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn params(&self) -> MatchParams {
        self.params
    }

    pub fn pair_terms(&self, var: VarId) -> &PairTerms {
        &self.pair_terms[var.index()]
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Names of the constraints a variable assignment breaks
    pub fn violated_constraints(&self, values: &[f64], tolerance: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tolerance))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Write the model in CPLEX LP format for inspection
    pub fn write_lp<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\\* {} *\\", self.name)?;
        writeln!(out, "Maximize")?;
        writeln!(out, "OBJ: {}", self.format_expr(&self.objective))?;
        writeln!(out, "Subject To")?;
        for constraint in &self.constraints {
            writeln!(
                out,
                "{}: {} {} {}",
                constraint.name,
                self.format_expr(&constraint.expr),
                constraint.relation.symbol(),
                constraint.rhs
            )?;
        }
        writeln!(out, "Binaries")?;
        for (var, _) in self.space.iter() {
            writeln!(out, "{}", self.space.variable_name(var))?;
        }
        writeln!(out, "End")
    }

    fn format_expr(&self, expr: &LinearExpr) -> String {
        if expr.terms().is_empty() {
            return "0".to_string();
        }

        let mut line = String::new();
        for (pos, (var, coef)) in expr.terms().iter().enumerate() {
            let name = self.space.variable_name(*var);
            let sign = if *coef < 0.0 { "-" } else { "+" };
            let magnitude = coef.abs();
            if pos == 0 {
                if *coef < 0.0 {
                    line.push_str("- ");
                }
            } else {
                let _ = write!(line, " {} ", sign);
            }
            if magnitude == 1.0 {
                line.push_str(&name);
            } else {
                let _ = write!(line, "{} {}", magnitude, name);
            }
        }
        line
    }
}
