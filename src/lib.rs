//! Date Matchmaker - optimal one-to-one pairing of a participant pool
//!
//! Participants are scored pairwise on their survey answers, filtered by
//! hard constraints (mutual interest, a shared day) and nudged by soft ones
//! (year-of-study preference). The resulting 0/1 assignment program is handed
//! to a MILP solver and its answer is read back into pairs and statistics.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{compatibility_score, is_pairable, is_pairing_preferred, MatchError, MatchModel, MatchOutcome, Matchmaker};
pub use models::{MatchParams, MatchReport, ParticipantRow, Person};
pub use services::{MicroLpSolver, MilpSolver, SolveOptions, SolverStatus};
