// Core algorithm exports
pub mod extract;
pub mod filters;
pub mod matcher;
pub mod problem;
pub mod scoring;
pub mod variables;

pub use extract::{day_key, gender_pair_key, MatchStats, ResultExtractor, Solution};
pub use filters::{is_pairable, is_pairing_preferred, PairRule, HARD_RULES, SOFT_RULES};
pub use matcher::{MatchError, MatchOutcome, Matchmaker};
pub use problem::{LinearConstraint, LinearExpr, MatchModel, ObjectiveBuilder, PairTerms, Relation};
pub use scoring::compatibility_score;
pub use variables::{CandidatePair, MatchVariableSpace, VarId};
