use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::{
    matcher::{MatchError, MatchOutcome},
    problem::MatchModel,
    variables::CandidatePair,
};
use crate::models::Person;
use crate::services::solver::SolverOutput;

/// The selected candidate pairs, covering every participant exactly once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pairs: Vec<CandidatePair>,
}

impl Solution {
    pub fn pairs(&self) -> &[CandidatePair] {
        &self.pairs
    }

    /// Pairs of two distinct participants
    pub fn matched_pairs(&self) -> impl Iterator<Item = CandidatePair> + '_ {
        self.pairs.iter().copied().filter(|p| !p.is_self())
    }

    /// Indices of participants left on their own
    pub fn unmatched(&self) -> Vec<usize> {
        self.pairs
            .iter()
            .filter(|p| p.is_self())
            .map(|p| p.first)
            .collect()
    }

    pub fn partner_of(&self, idx: usize) -> Option<usize> {
        self.pairs
            .iter()
            .find(|p| p.touches(idx))
            .map(|p| if p.first == idx { p.second } else { p.first })
    }
}

/// Aggregate figures derived from a solution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub participant_count: usize,
    pub objective_value: f64,
    /// `2 * objective / N`: every real pair credits both participants
    pub mean_score_per_participant: f64,
    pub matched_participants: usize,
    pub preferred_pairs: usize,
    /// Compatibility of each real pair, in solution order
    pub pair_scores: Vec<f64>,
    pub by_day: BTreeMap<String, Vec<CandidatePair>>,
    pub gender_pairs: BTreeMap<String, usize>,
}

/// Reads a solver's output back into pairs and statistics
pub struct ResultExtractor<'a> {
    model: &'a MatchModel,
    persons: &'a [Person],
}

impl<'a> ResultExtractor<'a> {
    pub fn new(model: &'a MatchModel, persons: &'a [Person]) -> Self {
        Self { model, persons }
    }

    /// Turn solver output into an outcome.
    ///
    /// Non-optimal statuses are passed through as data. A returned assignment
    /// that does not cover every participant exactly once is an error.
    pub fn extract(&self, output: SolverOutput) -> Result<MatchOutcome, MatchError> {
        let SolverOutput {
            status,
            objective_value,
            values,
            message,
        } = output;

        let values = match values {
            Some(values) if status.has_solution() => values,
            _ => {
                return Ok(MatchOutcome {
                    status,
                    objective_value: None,
                    solution: None,
                    stats: None,
                    message,
                })
            }
        };

        if values.len() != self.model.variable_count() {
            return Err(MatchError::ValueCountMismatch {
                expected: self.model.variable_count(),
                actual: values.len(),
            });
        }

        let solution = Solution {
            pairs: self.model.space().selected(&values),
        };
        self.check_coverage(&solution)?;

        let objective = objective_value.unwrap_or_else(|| self.model.objective_value(&values));
        let stats = self.stats(&solution, objective);

        Ok(MatchOutcome {
            status,
            objective_value: Some(objective),
            solution: Some(solution),
            stats: Some(stats),
            message,
        })
    }

    fn check_coverage(&self, solution: &Solution) -> Result<(), MatchError> {
        let mut counts = vec![0usize; self.persons.len()];
        for pair in solution.pairs() {
            counts[pair.first] += 1;
            if !pair.is_self() {
                counts[pair.second] += 1;
            }
        }

        match counts.iter().position(|count| *count != 1) {
            Some(idx) => {
                tracing::error!(
                    "Solution covers participant {} {} times",
                    self.persons[idx].id,
                    counts[idx]
                );
                Err(MatchError::InvariantViolation {
                    participant: self.persons[idx].id.clone(),
                    count: counts[idx],
                })
            }
            None => Ok(()),
        }
    }

    fn stats(&self, solution: &Solution, objective_value: f64) -> MatchStats {
        let n = self.persons.len();
        let mut pair_scores = Vec::new();
        let mut preferred_pairs = 0;
        let mut by_day: BTreeMap<String, Vec<CandidatePair>> = BTreeMap::new();
        let mut gender_pairs: BTreeMap<String, usize> = BTreeMap::new();
        let mut matched_participants = 0;

        for pair in solution.matched_pairs() {
            matched_participants += 2;
            let (a, b) = (&self.persons[pair.first], &self.persons[pair.second]);
            if let Some(var) = self.model.space().var_of(pair) {
                let terms = self.model.pair_terms(var);
                pair_scores.push(terms.reward);
                if terms.preferred {
                    preferred_pairs += 1;
                }
            }
            by_day.entry(day_key(a, b)).or_default().push(pair);
            *gender_pairs.entry(gender_pair_key(a, b)).or_default() += 1;
        }

        let mean_score_per_participant = if n == 0 {
            0.0
        } else {
            2.0 * objective_value / n as f64
        };

        MatchStats {
            participant_count: n,
            objective_value,
            mean_score_per_participant,
            matched_participants,
            preferred_pairs,
            pair_scores,
            by_day,
            gender_pairs,
        }
    }
}

/// Day the pair meets on: the first non-wildcard side
pub fn day_key(a: &Person, b: &Person) -> String {
    if a.day.is_wildcard() {
        b.day.label().to_string()
    } else {
        a.day.label().to_string()
    }
}

/// Order-independent label such as `Man/Woman`
pub fn gender_pair_key(a: &Person, b: &Person) -> String {
    let (g1, g2) = (a.gender.label(), b.gender.label());
    if g1 <= g2 {
        format!("{}/{}", g1, g2)
    } else {
        format!("{}/{}", g2, g1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, Identity, MatchParams, TraitVector, Year, YearPreference};
    use crate::services::solver::SolverStatus;

    fn create_test_person(id: &str, gender: Identity, seeking: Identity, day: Day) -> Person {
        Person {
            id: id.to_string(),
            name: format!("Person {}", id),
            gender,
            seeking,
            day,
            year: Year::First,
            year_preference: YearPreference::Any,
            traits: [("x".to_string(), 0.6), ("y".to_string(), 0.4)]
                .into_iter()
                .collect::<TraitVector>(),
        }
    }

    fn create_pool() -> Vec<Person> {
        vec![
            create_test_person("a", Identity::Woman, Identity::Man, Day::Either),
            create_test_person("b", Identity::Man, Identity::Woman, Day::On("Friday".to_string())),
            create_test_person("c", Identity::Woman, Identity::Woman, Day::Either),
            create_test_person("d", Identity::Woman, Identity::Woman, Day::Either),
        ]
    }

    fn assignment(model: &MatchModel, pairs: &[(usize, usize)]) -> Vec<f64> {
        let mut values = vec![0.0; model.variable_count()];
        for (i, j) in pairs {
            let var = model.space().var_of(CandidatePair::new(*i, *j)).unwrap();
            values[var.index()] = 1.0;
        }
        values
    }

    #[test]
    fn test_extract_stats() {
        let persons = create_pool();
        let model = MatchModel::assemble(&persons, MatchParams::new(0.0)).unwrap();
        let values = assignment(&model, &[(0, 1), (2, 3)]);
        let objective = model.objective_value(&values);

        let outcome = ResultExtractor::new(&model, &persons)
            .extract(SolverOutput::solved(SolverStatus::Optimal, objective, values))
            .unwrap();

        let stats = outcome.stats.unwrap();
        assert_eq!(stats.matched_participants, 4);
        assert!((stats.mean_score_per_participant - 1.0).abs() < 1e-9);
        assert_eq!(stats.by_day["Friday"], vec![CandidatePair::new(0, 1)]);
        assert_eq!(stats.by_day["Either"], vec![CandidatePair::new(2, 3)]);
        assert_eq!(stats.gender_pairs["Man/Woman"], 1);
        assert_eq!(stats.gender_pairs["Woman/Woman"], 1);
        assert!(outcome.solution.unwrap().unmatched().is_empty());
    }

    #[test]
    fn test_unmatched_participants() {
        let persons = create_pool();
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();
        let values = assignment(&model, &[(0, 1), (2, 2), (3, 3)]);

        let outcome = ResultExtractor::new(&model, &persons)
            .extract(SolverOutput::solved(SolverStatus::Feasible, 1.0, values))
            .unwrap();

        let solution = outcome.solution.unwrap();
        assert_eq!(solution.unmatched(), vec![2, 3]);
        assert_eq!(solution.partner_of(0), Some(1));
        assert_eq!(solution.partner_of(3), Some(3));

        let stats = outcome.stats.unwrap();
        assert_eq!(stats.matched_participants, 2 * solution.matched_pairs().count());
        assert_eq!(stats.matched_participants + solution.unmatched().len(), persons.len());
    }

    #[test]
    fn test_time_limit_with_incumbent_is_usable() {
        let persons = create_pool();
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();
        let values = assignment(&model, &[(0, 0), (1, 1), (2, 3)]);
        let objective = model.objective_value(&values);

        let outcome = ResultExtractor::new(&model, &persons)
            .extract(SolverOutput::solved(SolverStatus::TimeLimit, objective, values))
            .unwrap();

        assert_eq!(outcome.status, SolverStatus::TimeLimit);
        assert_eq!(outcome.solution.unwrap().unmatched(), vec![0, 1]);
        assert_eq!(outcome.stats.unwrap().matched_participants, 2);
    }

    #[test]
    fn test_double_cover_is_invariant_violation() {
        let persons = create_pool();
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();
        let values = assignment(&model, &[(0, 1), (1, 1), (2, 3)]);

        let result = ResultExtractor::new(&model, &persons)
            .extract(SolverOutput::solved(SolverStatus::Optimal, 1.0, values));

        match result {
            Err(MatchError::InvariantViolation { participant, count }) => {
                assert_eq!(participant, "b");
                assert_eq!(count, 2);
            }
            other => panic!("expected invariant violation, got {:?}", other),
        }
    }

    #[test]
    fn test_uncovered_is_invariant_violation() {
        let persons = create_pool();
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();
        let values = assignment(&model, &[(0, 1), (2, 2)]);

        let result = ResultExtractor::new(&model, &persons)
            .extract(SolverOutput::solved(SolverStatus::Optimal, 0.0, values));

        assert!(matches!(
            result,
            Err(MatchError::InvariantViolation { count: 0, .. })
        ));
    }

    #[test]
    fn test_failed_status_passes_through() {
        let persons = create_pool();
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();

        let outcome = ResultExtractor::new(&model, &persons)
            .extract(SolverOutput::failed(SolverStatus::TimeLimit, "out of time"))
            .unwrap();

        assert_eq!(outcome.status, SolverStatus::TimeLimit);
        assert!(outcome.solution.is_none());
        assert_eq!(outcome.message.as_deref(), Some("out of time"));
    }

    #[test]
    fn test_wrong_value_count() {
        let persons = create_pool();
        let model = MatchModel::assemble(&persons, MatchParams::default()).unwrap();

        let result = ResultExtractor::new(&model, &persons)
            .extract(SolverOutput::solved(SolverStatus::Optimal, 0.0, vec![1.0]));

        assert!(matches!(result, Err(MatchError::ValueCountMismatch { .. })));
    }

    #[test]
    fn test_gender_pair_key_is_symmetric() {
        let persons = create_pool();
        assert_eq!(gender_pair_key(&persons[0], &persons[1]), "Man/Woman");
        assert_eq!(gender_pair_key(&persons[1], &persons[0]), "Man/Woman");
    }
}
