// Model exports
pub mod domain;
pub mod input;
pub mod report;

pub use domain::{Day, Identity, MatchParams, Person, TraitVector, Year, YearPreference};
pub use input::ParticipantRow;
pub use report::{MatchReport, ReportedPair, ReportedParticipant};
