use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::input::ParticipantRow;

/// Gender identity, used both for how a participant identifies and for
/// which gender(s) they are seeking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Identity {
    Man,
    Woman,
    Any,
    Undefined,
}

impl Identity {
    /// Map a free-form survey answer onto an identity, never failing
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "NON-BINARY" | "EVERYONE" | "ANYONE" | "ANY" | "ALL" => Identity::Any,
            "WOMAN" | "WOMEN" | "FEMALE" => Identity::Woman,
            "MAN" | "MEN" | "MALE" => Identity::Man,
            _ => Identity::Undefined,
        }
    }

    /// Whether someone seeking `self` would accept a partner identifying as `other`
    #[inline]
    pub fn accepts(self, other: Identity) -> bool {
        self == Identity::Any || self == other
    }

    pub fn label(self) -> &'static str {
        match self {
            Identity::Man => "Man",
            Identity::Woman => "Woman",
            Identity::Any => "Any",
            Identity::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Day availability: a specific day, the `Either` wildcard, or unknown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Day {
    On(String),
    Either,
    Undefined,
}

impl Day {
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim();
        if token.is_empty() {
            Day::Undefined
        } else if token.eq_ignore_ascii_case("either") {
            Day::Either
        } else {
            Day::On(token.to_string())
        }
    }

    /// Two availabilities overlap when either side is flexible or both name the same day.
    /// An undefined day only overlaps with the wildcard.
    pub fn overlaps(&self, other: &Day) -> bool {
        match (self, other) {
            (Day::Either, _) | (_, Day::Either) => true,
            (Day::On(a), Day::On(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Day::Either)
    }

    pub fn label(&self) -> &str {
        match self {
            Day::On(day) => day,
            Day::Either => "Either",
            Day::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Year of study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Year {
    First,
    Second,
    Third,
    Fourth,
    Postgrad,
    Undefined,
}

impl Year {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "1ST YEAR" | "1ST" | "1" | "FIRST" | "FIRST YEAR" => Year::First,
            "2ND YEAR" | "2ND" | "2" | "SECOND" | "SECOND YEAR" => Year::Second,
            "3RD YEAR" | "3RD" | "3" | "THIRD" | "THIRD YEAR" => Year::Third,
            "4TH YEAR" | "4TH" | "4" | "FOURTH" | "FOURTH YEAR" => Year::Fourth,
            "POSTGRADUATE" | "POSTGRAD" | "PG" => Year::Postgrad,
            _ => Year::Undefined,
        }
    }

    /// Undefined years are never considered equal to anything, themselves included
    #[inline]
    pub fn same_as(self, other: Year) -> bool {
        self != Year::Undefined && self == other
    }
}

/// Preference for the partner's year of study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YearPreference {
    Any,
    Same,
    Different,
    Undefined,
}

impl YearPreference {
    /// Survey answers are sentences ("Same year as me", "Open to any year"),
    /// so this matches on keywords rather than whole strings.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.to_uppercase();
        if upper.contains("SAME") {
            YearPreference::Same
        } else if upper.contains("DIFFERENT") {
            YearPreference::Different
        } else if upper.contains("OPEN") || upper.contains("ANY") {
            YearPreference::Any
        } else {
            YearPreference::Undefined
        }
    }

    #[inline]
    pub fn is_satisfied(self, same_year: bool) -> bool {
        match self {
            YearPreference::Any => true,
            YearPreference::Same => same_year,
            YearPreference::Different => !same_year,
            YearPreference::Undefined => false,
        }
    }
}

/// Named trait scores, nominally in [0, 1]. Keys differ between people.
pub type TraitVector = BTreeMap<String, f64>;

/// One participant in the matching pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub gender: Identity,
    pub seeking: Identity,
    pub day: Day,
    pub year: Year,
    pub year_preference: YearPreference,
    pub traits: TraitVector,
}

impl Person {
    /// Build a participant from a normalized input row.
    ///
    /// Unknown category strings degrade to their `Undefined` variant and
    /// non-finite trait values are dropped.
    pub fn from_row(row: &ParticipantRow) -> Self {
        let mut traits = TraitVector::new();
        for (key, value) in row.numeric_fields() {
            if !value.is_finite() {
                tracing::warn!("Dropping non-finite trait {:?} for participant {}", key, row.id);
                continue;
            }
            if !(0.0..=1.0).contains(&value) {
                tracing::warn!(
                    "Trait {:?} for participant {} is outside [0, 1]: {}",
                    key,
                    row.id,
                    value
                );
            }
            traits.insert(key.to_string(), value);
        }

        let person = Self {
            id: row.id.trim().to_string(),
            name: row.name.trim().to_string(),
            gender: Identity::parse(&row.identity),
            seeking: Identity::parse(&row.seeking),
            day: Day::parse(&row.day),
            year: Year::parse(&row.year),
            year_preference: YearPreference::parse(&row.year_preference),
            traits,
        };

        if person.gender == Identity::Undefined || person.seeking == Identity::Undefined {
            tracing::debug!(
                "Participant {} has an unrecognised identity ({:?}) or seeking ({:?}) answer",
                person.id,
                row.identity,
                row.seeking
            );
        }

        person
    }

    /// Whether `other` is this very participant
    #[inline]
    pub fn is_same_participant(&self, other: &Person) -> bool {
        std::ptr::eq(self, other) || self.id == other.id
    }
}

/// Tunable weights for the matching objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchParams {
    /// Subtracted from a pair's reward when the soft preference is not met.
    /// Zero disables the soft constraint; values near 1 make it a de facto hard one.
    pub penalty_multiplier: f64,
    /// Subtracted for every participant left unmatched
    pub unmatched_penalty: f64,
}

impl MatchParams {
    pub const MAX_PENALTY_MULTIPLIER: f64 = 0.9;
    pub const MAX_UNMATCHED_PENALTY: f64 = 1.0;

    pub fn new(penalty_multiplier: f64) -> Self {
        Self {
            penalty_multiplier,
            ..Self::default()
        }
    }
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            penalty_multiplier: 0.1,
            unmatched_penalty: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_aliases() {
        assert_eq!(Identity::parse("Women"), Identity::Woman);
        assert_eq!(Identity::parse("  men "), Identity::Man);
        assert_eq!(Identity::parse("Non-Binary"), Identity::Any);
        assert_eq!(Identity::parse("Everyone"), Identity::Any);
        assert_eq!(Identity::parse("prefer not to say"), Identity::Undefined);
        assert_eq!(Identity::parse(""), Identity::Undefined);
    }

    #[test]
    fn test_identity_accepts() {
        assert!(Identity::Any.accepts(Identity::Man));
        assert!(Identity::Woman.accepts(Identity::Woman));
        assert!(!Identity::Woman.accepts(Identity::Man));
        assert!(Identity::Any.accepts(Identity::Undefined));
        assert!(Identity::Undefined.accepts(Identity::Undefined));
        assert!(!Identity::Undefined.accepts(Identity::Woman));
    }

    #[test]
    fn test_day_overlap() {
        let thu = Day::parse("Thursday, 21st Nov");
        let fri = Day::parse("Friday, 22nd Nov");
        let either = Day::parse("Either");

        assert!(thu.overlaps(&Day::parse("thursday, 21st nov")));
        assert!(!thu.overlaps(&fri));
        assert!(thu.overlaps(&either));
        assert!(either.overlaps(&fri));
        assert!(Day::Undefined.overlaps(&either));
        assert!(!Day::Undefined.overlaps(&Day::Undefined));
    }

    #[test]
    fn test_year_parse() {
        assert_eq!(Year::parse("1st Year"), Year::First);
        assert_eq!(Year::parse("4"), Year::Fourth);
        assert_eq!(Year::parse("Postgraduate"), Year::Postgrad);
        assert_eq!(Year::parse("5th Year"), Year::Undefined);
        assert!(Year::First < Year::Postgrad);
        assert!(!Year::Undefined.same_as(Year::Undefined));
    }

    #[test]
    fn test_year_preference() {
        assert_eq!(YearPreference::parse("Same year as me"), YearPreference::Same);
        assert_eq!(YearPreference::parse("Different year as me"), YearPreference::Different);
        assert_eq!(YearPreference::parse("Open to any year"), YearPreference::Any);
        assert_eq!(YearPreference::parse("whatever"), YearPreference::Undefined);

        assert!(YearPreference::Any.is_satisfied(false));
        assert!(YearPreference::Same.is_satisfied(true));
        assert!(!YearPreference::Same.is_satisfied(false));
        assert!(YearPreference::Different.is_satisfied(false));
        assert!(!YearPreference::Undefined.is_satisfied(true));
    }

    #[test]
    fn test_default_params() {
        let params = MatchParams::default();
        assert_eq!(params.penalty_multiplier, 0.1);
        assert_eq!(params.unmatched_penalty, 0.0);
    }
}
