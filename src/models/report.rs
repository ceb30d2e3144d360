use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::core::{CandidatePair, MatchModel, MatchOutcome};
use crate::models::Person;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedParticipant {
    pub id: String,
    pub name: String,
}

impl From<&Person> for ReportedParticipant {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            name: person.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedPair {
    pub first: ReportedParticipant,
    pub second: ReportedParticipant,
    pub compatibility: f64,
    #[serde(rename = "yearPreferenceMet")]
    pub preferred: bool,
}

/// Everything downstream consumers get from one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    #[serde(rename = "runId")]
    pub run_id: Uuid,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    pub solver: String,
    pub status: String,
    #[serde(rename = "objectiveValue")]
    pub objective_value: Option<f64>,
    #[serde(rename = "meanScorePerParticipant")]
    pub mean_score_per_participant: Option<f64>,
    #[serde(rename = "participantCount")]
    pub participant_count: usize,
    #[serde(rename = "matchedParticipants")]
    pub matched_participants: usize,
    #[serde(rename = "byDay")]
    pub by_day: BTreeMap<String, Vec<ReportedPair>>,
    pub unmatched: Vec<ReportedParticipant>,
    #[serde(rename = "genderPairs")]
    pub gender_pairs: BTreeMap<String, usize>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MatchReport {
    pub fn build(
        solver: &str,
        persons: &[Person],
        model: &MatchModel,
        outcome: &MatchOutcome,
    ) -> Self {
        let reported_pair = |pair: &CandidatePair| {
            let (compatibility, preferred) = model
                .space()
                .var_of(*pair)
                .map(|var| {
                    let terms = model.pair_terms(var);
                    (terms.reward, terms.preferred)
                })
                .unwrap_or((0.0, false));
            ReportedPair {
                first: ReportedParticipant::from(&persons[pair.first]),
                second: ReportedParticipant::from(&persons[pair.second]),
                compatibility,
                preferred,
            }
        };

        let (by_day, gender_pairs, matched_participants, mean_score): (
            BTreeMap<String, Vec<ReportedPair>>,
            BTreeMap<String, usize>,
            usize,
            Option<f64>,
        ) = match &outcome.stats {
            Some(stats) => (
                stats
                    .by_day
                    .iter()
                    .map(|(day, pairs)| (day.clone(), pairs.iter().map(&reported_pair).collect()))
                    .collect(),
                stats.gender_pairs.clone(),
                stats.matched_participants,
                Some(stats.mean_score_per_participant),
            ),
            None => (BTreeMap::new(), BTreeMap::new(), 0, None),
        };

        let unmatched: Vec<ReportedParticipant> = outcome
            .solution
            .as_ref()
            .map(|solution| {
                solution
                    .unmatched()
                    .into_iter()
                    .map(|idx| ReportedParticipant::from(&persons[idx]))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            solver: solver.to_string(),
            status: outcome.status.to_string(),
            objective_value: outcome.objective_value,
            mean_score_per_participant: mean_score,
            participant_count: persons.len(),
            matched_participants,
            by_day,
            unmatched,
            gender_pairs,
            message: outcome.message.clone(),
        }
    }
}
