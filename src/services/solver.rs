use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::core::MatchModel;

/// Outcome category reported by a solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Optimal,
    /// A feasible assignment was found but optimality was not proven.
    /// `MicroLpSolver` never reports it; it is for backends with their own incumbents.
    Feasible,
    Infeasible,
    /// The time budget ran out. `MicroLpSolver` attaches the all-unmatched assignment.
    TimeLimit,
    Error,
}

impl SolverStatus {
    /// Whether variable values from this status can be read as an assignment
    pub fn has_solution(self) -> bool {
        matches!(
            self,
            SolverStatus::Optimal | SolverStatus::Feasible | SolverStatus::TimeLimit
        )
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolverStatus::Optimal => "Optimal",
            SolverStatus::Feasible => "Feasible",
            SolverStatus::Infeasible => "Infeasible",
            SolverStatus::TimeLimit => "Time limit reached",
            SolverStatus::Error => "Error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    pub time_limit: Option<Duration>,
}

impl SolveOptions {
    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit: Some(time_limit),
        }
    }
}

/// What a solver hands back: a status plus, when solved, one value per variable
#[derive(Debug, Clone)]
pub struct SolverOutput {
    pub status: SolverStatus,
    pub objective_value: Option<f64>,
    pub values: Option<Vec<f64>>,
    pub message: Option<String>,
}

impl SolverOutput {
    pub fn solved(status: SolverStatus, objective_value: f64, values: Vec<f64>) -> Self {
        Self {
            status,
            objective_value: Some(objective_value),
            values: Some(values),
            message: None,
        }
    }

    pub fn failed(status: SolverStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            values: None,
            message: Some(message.into()),
        }
    }
}

/// An opaque mixed-integer solver
///
/// Implementations receive a fully assembled model and never mutate it.
/// Failures are reported through `SolverOutput::status`, never by panicking.
pub trait MilpSolver {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &MatchModel, options: &SolveOptions) -> SolverOutput;
}
