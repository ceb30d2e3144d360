use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use crate::core::{CandidatePair, LinearExpr, MatchModel, Relation};
use crate::services::solver::{MilpSolver, SolveOptions, SolverOutput, SolverStatus};

/// Pure-Rust branch-and-bound backend (`good_lp` + `microlp`)
///
/// `microlp` has no native time limit, so a bounded solve runs on a worker
/// thread and is abandoned when the budget elapses. The result then carries the
/// all-self-pair assignment as its incumbent.
///
/// An abandoned worker is not cancelled: it keeps a thread busy until its solve
/// finishes, and its result is discarded. Long-lived callers that hit the limit
/// repeatedly will accumulate such threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl MicroLpSolver {
    pub fn new() -> Self {
        Self
    }

    fn run(model: &MatchModel) -> SolverOutput {
        if model.variable_count() == 0 {
            return SolverOutput::solved(SolverStatus::Optimal, 0.0, Vec::new());
        }

        let mut vars = ProblemVariables::new();
        let decision: Vec<Variable> = (0..model.variable_count())
            .map(|_| vars.add(variable().binary()))
            .collect();

        let mut problem = vars
            .maximise(to_expression(model.objective(), &decision))
            .using(microlp);

        for c in model.constraints() {
            let lhs = to_expression(&c.expr, &decision);
            problem = problem.with(match c.relation {
                Relation::Equal => constraint::eq(lhs, c.rhs),
                Relation::LessOrEqual => constraint::leq(lhs, c.rhs),
            });
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = decision.iter().map(|v| solution.value(*v)).collect();
                let objective_value = model.objective_value(&values);
                SolverOutput::solved(SolverStatus::Optimal, objective_value, values)
            }
            Err(ResolutionError::Infeasible) => {
                SolverOutput::failed(SolverStatus::Infeasible, "problem is infeasible")
            }
            Err(ResolutionError::Unbounded) => {
                SolverOutput::failed(SolverStatus::Error, "problem is unbounded")
            }
            Err(e) => SolverOutput::failed(SolverStatus::Error, e.to_string()),
        }
    }

    /// Every participant paired with themselves: always satisfies the model
    fn unmatched_incumbent(model: &MatchModel) -> SolverOutput {
        let space = model.space();
        let mut values = vec![0.0; model.variable_count()];
        for idx in 0..space.participant_count() {
            if let Some(var) = space.var_of(CandidatePair::new(idx, idx)) {
                values[var.index()] = 1.0;
            }
        }
        let objective_value = model.objective_value(&values);
        SolverOutput::solved(SolverStatus::TimeLimit, objective_value, values)
    }
}

impl MilpSolver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, model: &MatchModel, options: &SolveOptions) -> SolverOutput {
        let started = Instant::now();

        let output = match options.time_limit {
            None => Self::run(model),
            Some(limit) => {
                let (tx, rx) = mpsc::channel();
                let owned = model.clone();
                let spawned = thread::Builder::new()
                    .name("microlp-solve".to_string())
                    .spawn(move || {
                        // The receiver is gone if the budget already elapsed
                        let _ = tx.send(Self::run(&owned));
                    });

                match spawned {
                    Err(e) => SolverOutput::failed(
                        SolverStatus::Error,
                        format!("failed to start solver thread: {}", e),
                    ),
                    Ok(_) => match rx.recv_timeout(limit) {
                        Ok(output) => output,
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            tracing::warn!(
                                "{} hit the {:?} time limit, falling back to the unmatched assignment",
                                self.name(),
                                limit
                            );
                            let mut output = Self::unmatched_incumbent(model);
                            output.message =
                                Some(format!("no optimal solution within {:?}", limit));
                            output
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => SolverOutput::failed(
                            SolverStatus::Error,
                            "solver thread terminated without a result",
                        ),
                    },
                }
            }
        };

        tracing::debug!(
            "{} finished in {:?} with status {}",
            self.name(),
            started.elapsed(),
            output.status
        );

        output
    }
}

fn to_expression(expr: &LinearExpr, decision: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .map(|(var, coef)| *coef * decision[var.index()])
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResultExtractor;
    use crate::models::{Day, Identity, MatchParams, Person, TraitVector, Year, YearPreference};
    use std::time::Duration;

    fn create_test_person(id: &str, gender: Identity, seeking: Identity) -> Person {
        Person {
            id: id.to_string(),
            name: format!("Person {}", id),
            gender,
            seeking,
            day: Day::Either,
            year: Year::First,
            year_preference: YearPreference::Any,
            traits: [("x".to_string(), 0.8), ("y".to_string(), 0.2)]
                .into_iter()
                .collect::<TraitVector>(),
        }
    }

    #[test]
    fn test_solves_two_person_pool() {
        let persons = vec![
            create_test_person("a", Identity::Woman, Identity::Man),
            create_test_person("b", Identity::Man, Identity::Woman),
        ];
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();

        let output = MicroLpSolver::new().solve(&model, &SolveOptions::default());

        assert_eq!(output.status, SolverStatus::Optimal);
        let values = output.values.unwrap();
        assert!(values[0] > 0.5);
        assert!((output.objective_value.unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_time_limited_solve_still_returns() {
        let persons = vec![
            create_test_person("a", Identity::Woman, Identity::Man),
            create_test_person("b", Identity::Man, Identity::Woman),
        ];
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();

        let output =
            MicroLpSolver::new().solve(&model, &SolveOptions::with_time_limit(Duration::from_secs(30)));

        assert_eq!(output.status, SolverStatus::Optimal);
    }

    #[test]
    fn test_time_limit_returns_unmatched_incumbent() {
        let persons: Vec<Person> = (0..40)
            .map(|i| {
                let mut person = create_test_person(&i.to_string(), Identity::Any, Identity::Any);
                person.traits = [
                    ("x".to_string(), (i % 7) as f64 / 7.0 + 0.05),
                    ("y".to_string(), (i % 5) as f64 / 5.0 + 0.05),
                    ("z".to_string(), (i % 3) as f64 / 3.0 + 0.05),
                ]
                .into_iter()
                .collect();
                person
            })
            .collect();
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();

        let output = MicroLpSolver::new()
            .solve(&model, &SolveOptions::with_time_limit(Duration::from_millis(1)));

        assert_eq!(output.status, SolverStatus::TimeLimit);
        assert!(output.message.is_some());

        let outcome = ResultExtractor::new(&model, &persons).extract(output).unwrap();
        let solution = outcome.solution.unwrap();
        assert_eq!(solution.unmatched().len(), persons.len());
        for idx in 0..persons.len() {
            assert_eq!(solution.partner_of(idx), Some(idx));
        }
        assert_eq!(outcome.objective_value, Some(0.0));
    }

    #[test]
    fn test_empty_model() {
        let model = MatchModel::assemble(&[], MatchParams::default()).unwrap();
        let output = MicroLpSolver::new().solve(&model, &SolveOptions::default());

        assert_eq!(output.status, SolverStatus::Optimal);
        assert_eq!(output.values.unwrap().len(), 0);
    }
}
