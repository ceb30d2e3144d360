use std::collections::HashSet;
use thiserror::Error;
use validator::Validate;

use crate::core::{
    extract::{MatchStats, ResultExtractor, Solution},
    problem::MatchModel,
};
use crate::models::{MatchParams, ParticipantRow, Person};
use crate::services::solver::{MilpSolver, SolveOptions, SolverStatus};

/// Errors raised while building or interpreting a matching model
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid participant row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("Duplicate participant id: {0}")]
    DuplicateParticipant(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Compatibility between {first} and {second} is outside [0, 1]: {score}")]
    ScoreOutOfRange {
        first: String,
        second: String,
        score: f64,
    },

    #[error("Solver returned {actual} values for {expected} variables")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("Internal invariant violated: participant {participant} is matched {count} times")]
    InvariantViolation { participant: String, count: usize },
}

/// Result of one solve
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub status: SolverStatus,
    pub objective_value: Option<f64>,
    /// Present whenever the solver returned an assignment
    pub solution: Option<Solution>,
    pub stats: Option<MatchStats>,
    /// Solver diagnostic, if any
    pub message: Option<String>,
}

impl MatchOutcome {
    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Optimal
    }
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Participant registration (rows coerced into `Person`s)
/// 2. Candidate enumeration, scoring and constraint evaluation
/// 3. Model assembly
/// 4. Solving through a `MilpSolver` and extracting the assignment
#[derive(Debug, Clone)]
pub struct Matchmaker {
    persons: Vec<Person>,
    model: MatchModel,
}

impl Matchmaker {
    pub fn new(persons: Vec<Person>, params: MatchParams) -> Result<Self, MatchError> {
        let mut seen = HashSet::with_capacity(persons.len());
        for person in &persons {
            if !seen.insert(person.id.as_str()) {
                return Err(MatchError::DuplicateParticipant(person.id.clone()));
            }
        }

        tracing::info!("Registered {} persons for matching.", persons.len());

        let model = MatchModel::assemble(&persons, params)?;

        Ok(Self { persons, model })
    }

    /// Validate and coerce ingestion rows, then build the model
    pub fn from_rows(rows: &[ParticipantRow], params: MatchParams) -> Result<Self, MatchError> {
        let persons = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                row.validate().map_err(|e| MatchError::InvalidRow {
                    row: idx,
                    message: e.to_string(),
                })?;
                Ok(Person::from_row(row))
            })
            .collect::<Result<Vec<_>, MatchError>>()?;

        Self::new(persons, params)
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn model(&self) -> &MatchModel {
        &self.model
    }

    /// Solve the assembled model and read back the matches
    ///
    /// A solver that fails, times out or proves infeasibility yields an
    /// outcome carrying that status. Only a malformed assignment is an error.
    pub fn solve<S: MilpSolver + ?Sized>(
        &self,
        solver: &S,
        options: &SolveOptions,
    ) -> Result<MatchOutcome, MatchError> {
        tracing::info!(
            "Solving {} variables with {} (time limit: {:?})",
            self.model.variable_count(),
            solver.name(),
            options.time_limit
        );

        let output = solver.solve(&self.model, options);
        let outcome = ResultExtractor::new(&self.model, &self.persons).extract(output)?;

        tracing::info!("Status: {}", outcome.status);
        match &outcome.stats {
            Some(stats) => {
                tracing::info!("Mean Score per person: {:.4}", stats.mean_score_per_participant);
                tracing::info!(
                    "Number of people matched: {}/{}",
                    stats.matched_participants,
                    stats.participant_count
                );
            }
            None => tracing::warn!(
                "No assignment available ({})",
                outcome.message.as_deref().unwrap_or("no diagnostic")
            ),
        }

        Ok(outcome)
    }
}
